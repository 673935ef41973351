//! # Spec Loader Module / 规格加载模块
//!
//! Discovers declaration files under the project's specs root, attaches
//! provenance to every declaration and merges the defaults documents in.
//!
//! 发现项目规格根目录下的声明文件，为每个声明附加来源信息并合并默认值文档。

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

use crate::core::config::RunConfig;
use crate::core::document::{apply_defaults, override_shallow};
use crate::core::models::{AvailableSpec, Document, SpecError, keys};
use crate::infra::fs;

/// The process-level defaults shipped with the runner.
/// 随运行器提供的进程级默认值。
pub const BUILTIN_DEFAULTS: &str = include_str!("defaults.yaml");

/// Provenance attached to every declaration of one file.
/// 附加到一个文件中每个声明的来源信息。
#[derive(Debug, Clone)]
pub struct Provenance<'a> {
    pub project: &'a str,
    pub module: String,
    pub artifacts_dir: &'a Path,
}

/// Loads the defaults document: the configured defaults file (or the built-in
/// one), shallowly overridden by the project defaults file when it exists.
///
/// 加载默认值文档：配置的默认值文件（或内置文件），
/// 若存在项目默认值文件，则按键浅层覆盖。
pub fn load_defaults(config: &RunConfig) -> Result<Document> {
    let mut defaults = match &config.defaults_file {
        Some(path) => fs::read_yaml_document(path)
            .with_context(|| format!("Failed to load defaults file: {}", path.display()))?,
        None => fs::parse_yaml_document(BUILTIN_DEFAULTS)
            .context("Failed to parse built-in defaults")?,
    };

    let project_defaults = config.project_defaults_file();
    if project_defaults.is_file() {
        let overrides = fs::read_yaml_document(&project_defaults).with_context(|| {
            format!(
                "Failed to load project defaults: {}",
                project_defaults.display()
            )
        })?;
        override_shallow(&mut defaults, overrides);
    }

    Ok(defaults)
}

/// Turns the entries of one declaration document into available specs.
///
/// Entries whose name contains `defaults` are skipped. Each remaining entry
/// gets `template` (a snapshot taken before anything else touches it), `name`,
/// `project`, `module` and `artifacts_dir`, then the defaults are applied.
///
/// 将一个声明文档的条目转换为可用规格。
/// 名称包含 `defaults` 的条目会被跳过。其余每个条目获得 `template`
///（在其他任何修改之前获取的快照）、`name`、`project`、`module` 和 `artifacts_dir`，
/// 然后应用默认值。
pub fn specs_from_document(
    file_doc: Document,
    provenance: &Provenance<'_>,
    defaults: &Document,
) -> Result<Vec<AvailableSpec>, SpecError> {
    let mut specs = Vec::with_capacity(file_doc.len());
    for (name, declaration) in file_doc {
        if name.contains("defaults") {
            continue;
        }
        let Value::Object(mut spec) = declaration else {
            return Err(SpecError::InvalidDeclaration {
                name,
                reason: format!(
                    "declaration in module `{}` must be a mapping",
                    provenance.module
                ),
            });
        };

        let template = Value::Object(spec.clone());
        spec.insert(keys::TEMPLATE.to_string(), template);
        spec.insert(keys::NAME.to_string(), Value::String(name));
        spec.insert(
            keys::PROJECT.to_string(),
            Value::String(provenance.project.to_string()),
        );
        spec.insert(
            keys::MODULE.to_string(),
            Value::String(provenance.module.clone()),
        );
        spec.insert(
            keys::ARTIFACTS_DIR.to_string(),
            Value::String(provenance.artifacts_dir.display().to_string()),
        );

        apply_defaults(&mut spec, defaults);
        specs.push(AvailableSpec::new(spec));
    }
    Ok(specs)
}

/// Loads every available spec of the configured project.
/// A missing specs directory or an empty tree yields an empty list.
///
/// 加载所配置项目的所有可用规格。
/// 规格目录缺失或为空时返回空列表。
pub fn load_available_specs(config: &RunConfig) -> Result<Vec<AvailableSpec>> {
    let specs_root = config.specs_dir();
    let defaults = load_defaults(config)?;

    let mut available = Vec::new();
    for file in fs::discover_spec_files(&specs_root)? {
        let module = fs::module_path(&specs_root, &file)?;
        let file_doc = fs::read_yaml_document(&file)?;
        let provenance = Provenance {
            project: &config.project,
            module,
            artifacts_dir: &config.artifacts_dir,
        };
        let specs = specs_from_document(file_doc, &provenance, &defaults)
            .with_context(|| format!("Invalid declarations in {}", file.display()))?;
        available.extend(specs);
    }
    Ok(available)
}
