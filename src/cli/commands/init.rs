//! # Project Initialization Module / 项目初始化模块
//!
//! This module scaffolds a declaration tree through an interactive
//! command-line wizard: `tests/specs/defaults.yaml` plus an example
//! declaration file built from the templates the user picks.
//!
//! 此模块通过交互式命令行向导搭建声明树：
//! `tests/specs/defaults.yaml` 以及由用户所选模板构建的示例声明文件。
//!
//! ## Templates / 模板
//!
//! - **Shell command**: a single `shell.run` case
//! - **Parameter matrix**: a `params`/`values` cross product
//! - **Random sampling**: a `random` block drawing uniform and normal values
//!
//! - **Shell 命令**: 单个 `shell.run` 用例
//! - **参数矩阵**: `params`/`values` 组合
//! - **随机采样**: 抽取均匀分布和正态分布值的 `random` 块

use anyhow::{Context, Result};
use colored::*;
use dialoguer::{Confirm, Input, MultiSelect, theme::ColorfulTheme};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::RunConfig;
use crate::infra::t;

const DEFAULTS_TEMPLATE: &str = r#"# Values applied to every declaration of this project.
# 应用于本项目每个声明的值。
operation: shell.run
tags: [smoke]
timeout_secs: 60
"#;

const SHELL_TEMPLATE: &str = r#"hello:
  command: echo hello
"#;

const MATRIX_TEMPLATE: &str = r#"matrix:
  tags: [smoke, matrix]
  params: [size, mode]
  values:
    - [1, fast]
    - [10, fast]
    - [100, slow]
  command: echo "size=${size} mode=${mode}"
"#;

const RANDOM_TEMPLATE: &str = r#"sampled:
  tags: [random]
  random:
    count: 3
    params:
      load:
        min: 1
        max: 100
      jitter:
        type: normal
        min: 0
        max: 1
  command: echo "load=${load} jitter=${jitter}"
"#;

/// A template offered by the wizard.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Template {
    Shell,
    Matrix,
    Random,
}

impl Template {
    const ALL: [Template; 3] = [Template::Shell, Template::Matrix, Template::Random];

    fn body(self) -> &'static str {
        match self {
            Template::Shell => SHELL_TEMPLATE,
            Template::Matrix => MATRIX_TEMPLATE,
            Template::Random => RANDOM_TEMPLATE,
        }
    }

    fn label(self, language: &str) -> String {
        match self {
            Template::Shell => t!("init.template_shell", locale = language).to_string(),
            Template::Matrix => t!("init.template_matrix", locale = language).to_string(),
            Template::Random => t!("init.template_random", locale = language).to_string(),
        }
    }
}

/// Joins the chosen templates into one declaration document.
fn render_example(templates: &[Template]) -> String {
    templates
        .iter()
        .map(|template| template.body())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Runs the interactive wizard, or writes every template when
/// `non_interactive` is set.
///
/// 运行交互式向导；当设置 `non_interactive` 时写入所有模板。
pub fn run_init_wizard(config: &RunConfig, non_interactive: bool) -> Result<()> {
    let language = config.language.as_str();
    let theme = ColorfulTheme::default();

    if non_interactive {
        let specs_dir = config.specs_dir();
        return write_scaffold(&specs_dir, &render_example(&Template::ALL), language);
    }

    println!("\n{}", t!("init.welcome", locale = language).cyan().bold());
    println!("{}", t!("init.description", locale = language));

    let project: String = Input::with_theme(&theme)
        .with_prompt(t!("init.project_prompt", locale = language))
        .default(config.project.clone())
        .allow_empty(true)
        .interact_text()
        .context(t!("init.input_failed", locale = language).to_string())?;

    let specs_dir = if project.is_empty() {
        config.workspace.clone()
    } else {
        config.workspace.join(&project)
    }
    .join("tests")
    .join("specs");

    if specs_dir.join("example.yaml").exists() {
        let confirmation = Confirm::with_theme(&theme)
            .with_prompt(t!(
                "init.overwrite_prompt",
                locale = language,
                path = specs_dir.display()
            ))
            .default(false)
            .interact()
            .context(t!("init.input_failed", locale = language).to_string())?;
        if !confirmation {
            println!("{}", t!("init.aborted", locale = language));
            return Ok(());
        }
    }

    let labels: Vec<String> = Template::ALL.iter().map(|t| t.label(language)).collect();
    let selections = MultiSelect::with_theme(&theme)
        .with_prompt(t!("init.template_prompt", locale = language))
        .items(&labels)
        .defaults(&[true, false, false])
        .interact()
        .context(t!("init.input_failed", locale = language).to_string())?;

    let chosen: Vec<Template> = if selections.is_empty() {
        println!("{}", t!("init.no_template_selected", locale = language).yellow());
        vec![Template::Shell]
    } else {
        selections.into_iter().map(|i| Template::ALL[i]).collect()
    };

    write_scaffold(&specs_dir, &render_example(&chosen), language)
}

/// Writes `defaults.yaml` and `example.yaml` into `specs_dir`.
pub fn write_scaffold(specs_dir: &Path, example: &str, language: &str) -> Result<()> {
    fs::create_dir_all(specs_dir).with_context(|| {
        t!(
            "init.create_dir_failed",
            locale = language,
            path = specs_dir.display()
        )
        .to_string()
    })?;

    let files: [(PathBuf, &str); 2] = [
        (specs_dir.join("defaults.yaml"), DEFAULTS_TEMPLATE),
        (specs_dir.join("example.yaml"), example),
    ];
    for (path, content) in files {
        fs::write(&path, content).with_context(|| {
            t!("init.write_failed", locale = language, path = path.display()).to_string()
        })?;
        println!(
            "{}",
            t!("init.file_written", locale = language, path = path.display()).green()
        );
    }

    println!("{}", t!("init.next_steps", locale = language));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::fs::parse_yaml_document;

    fn parse(content: &str) -> crate::core::models::Document {
        parse_yaml_document(content).unwrap()
    }

    #[test]
    fn every_template_is_a_valid_declaration_document() {
        for template in Template::ALL {
            let doc = parse(template.body());
            assert_eq!(doc.len(), 1, "{template:?}");
        }
        assert_eq!(parse(&render_example(&Template::ALL)).len(), 3);
    }
}
