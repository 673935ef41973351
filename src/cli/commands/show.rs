//! # Show Command Module / 显示命令模块
//!
//! Pretty-prints the recorded `spec.json` of one case.
//!
//! 美化打印单个用例记录的 `spec.json`。

use anyhow::{Context, Result};
use colored::*;
use serde_json::Value;
use std::path::PathBuf;

use crate::{
    core::{config::RunConfig, models::RESULT_FILE_NAME},
    infra::{fs, t},
};

/// Location of the record of `spec_id` under the configured results root.
pub fn record_path(config: &RunConfig, spec_id: &str) -> PathBuf {
    config.results_dir.join(spec_id).join(RESULT_FILE_NAME)
}

/// Executes the show command.
/// 执行显示命令。
pub fn execute(config: &RunConfig, spec_id: &str) -> Result<()> {
    let path = record_path(config, spec_id);
    let doc = fs::read_json_document(&path).with_context(|| {
        t!(
            "show.not_found",
            locale = &config.language,
            id = spec_id,
            path = path.display()
        )
        .to_string()
    })?;

    println!("{}", path.display().to_string().dimmed());
    println!("{}", serde_json::to_string_pretty(&Value::Object(doc))?);
    Ok(())
}
