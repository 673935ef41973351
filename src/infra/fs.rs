//! # File System Operations Module / 文件系统操作模块
//!
//! This module provides the file system side of the pipeline: discovering
//! declaration files, deriving module paths, reading YAML/JSON documents and
//! writing result documents.
//!
//! 此模块提供管道的文件系统部分：发现声明文件、推导模块路径、
//! 读取 YAML/JSON 文档以及写入结果文档。

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::fs;
use std::path::{Component, Path, PathBuf};
use walkdir::WalkDir;

use crate::core::models::Document;

const SPEC_EXTENSIONS: &[&str] = &["yaml", "yml"];

fn has_spec_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| SPEC_EXTENSIONS.contains(&ext))
}

/// Recursively finds declaration files (`.yaml`/`.yml`) under `root`, sorted
/// by path. Files whose stem mentions `defaults` provide defaults and are left
/// out. A missing root yields an empty list.
///
/// 递归查找 `root` 下的声明文件（`.yaml`/`.yml`），按路径排序。
/// 文件名包含 `defaults` 的文件提供默认值，不包括在内。根目录不存在时返回空列表。
pub fn discover_spec_files(root: &Path) -> Result<Vec<PathBuf>> {
    if !is_directory(root) {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !e.file_name().to_string_lossy().starts_with('.'))
    {
        let entry = entry
            .with_context(|| format!("Failed to walk specs directory: {}", root.display()))?;
        let path = entry.path();
        if !entry.file_type().is_file() || !has_spec_extension(path) {
            continue;
        }
        let is_defaults = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .is_some_and(|stem| stem.contains("defaults"));
        if !is_defaults {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

/// Dotted module path of a declaration file relative to the specs root:
/// `<root>/net/ping.yaml` becomes `net.ping`.
///
/// 声明文件相对于规格根目录的点分模块路径：
/// `<root>/net/ping.yaml` 变为 `net.ping`。
pub fn module_path(specs_root: &Path, file: &Path) -> Result<String> {
    let relative = file.strip_prefix(specs_root).with_context(|| {
        format!(
            "Spec file {} is outside of specs root {}",
            file.display(),
            specs_root.display()
        )
    })?;
    let without_ext = relative.with_extension("");
    let segments: Vec<String> = without_ext
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if segments.is_empty() {
        bail!("Cannot derive a module path for {}", file.display());
    }
    Ok(segments.join("."))
}

/// Parses YAML text into a JSON value with `<<` merge keys resolved.
fn yaml_to_value(content: &str) -> Result<Value> {
    let mut yaml: serde_yaml::Value = serde_yaml::from_str(content)?;
    yaml.apply_merge()?;
    Ok(serde_json::to_value(yaml)?)
}

fn into_document(value: Value, origin: &str) -> Result<Document> {
    match value {
        Value::Null => Ok(Document::new()),
        Value::Object(map) => Ok(map),
        other => bail!("Root of {} must be a mapping, found {}", origin, kind_of(&other)),
    }
}

/// Reads a YAML file whose root is a mapping. An empty file is an empty mapping.
/// 读取根节点为映射的 YAML 文件。空文件视为空映射。
pub fn read_yaml_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read YAML file: {}", path.display()))?;
    let value = yaml_to_value(&content)
        .with_context(|| format!("Failed to parse YAML file: {}", path.display()))?;
    into_document(value, &path.display().to_string())
}

/// Parses YAML text whose root is a mapping.
pub fn parse_yaml_document(content: &str) -> Result<Document> {
    let value = yaml_to_value(content).context("Failed to parse YAML document")?;
    into_document(value, "YAML document")
}

/// Reads a JSON file whose root is a mapping.
pub fn read_json_document(path: &Path) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read JSON file: {}", path.display()))?;
    match serde_json::from_str::<Value>(&content)
        .with_context(|| format!("Failed to parse JSON file: {}", path.display()))?
    {
        Value::Object(map) => Ok(map),
        other => bail!(
            "Root of {} must be an object, found {}",
            path.display(),
            kind_of(&other)
        ),
    }
}

/// Writes `value` as pretty JSON to `path`, creating the parent directory.
pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    if let Some(parent) = path.parent() {
        ensure_dir(parent)?;
    }
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {}", path.display()))?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Creates `dir` and its parents; succeeds if it already exists.
pub fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory: {}", dir.display()))
}

/// Checks if a path exists and is a directory.
pub fn is_directory(path: &Path) -> bool {
    path.exists() && path.is_dir()
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a sequence",
        Value::Object(_) => "a mapping",
    }
}
