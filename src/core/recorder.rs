//! # Result Recorder Module / 结果记录模块
//!
//! Persists the outcome of a case exactly once, after its operation finished:
//! `results.passed`, `results.exception` on failure, and the whole case
//! document at `<output_dir>/spec.json`. Write failures are returned to the
//! caller; losing a result is never silent.
//!
//! 在操作完成后，恰好一次地持久化用例结果：`results.passed`、
//! 失败时的 `results.exception`，以及位于 `<output_dir>/spec.json` 的完整用例文档。
//! 写入失败会返回给调用方；丢失结果绝不会悄无声息。

use anyhow::{Context, Result, anyhow};
use serde_json::Value;
use std::path::PathBuf;

use crate::core::models::{
    Case, Document, Outcome, RECORD_KEYS, RESULT_FILE_NAME, ToSerializable, keys,
};
use crate::infra::fs;

/// Produces the plain document that is written for `case`: its own document
/// plus every attachment converted through [`ToSerializable`]. Attachments
/// named after one of [`RECORD_KEYS`] are skipped, so identity, params and
/// `results` always come from the case itself.
///
/// 生成为 `case` 写入的普通文档：其自身文档加上通过 [`ToSerializable`]
/// 转换的每个附件。与 [`RECORD_KEYS`] 同名的附件会被跳过。
pub fn normalize(case: &Case) -> Result<Document> {
    let Value::Object(mut doc) = case.to_serializable()? else {
        return Err(anyhow!("case `{}` did not serialize to a mapping", case.name()));
    };
    for (key, value) in case.attachments() {
        if RECORD_KEYS.contains(&key) {
            continue;
        }
        let converted = value
            .to_serializable()
            .with_context(|| format!("Failed to serialize attachment `{key}`"))?;
        doc.insert(key.to_string(), converted);
    }
    Ok(doc)
}

/// Writes the result record of `case` and returns the path of `spec.json`.
///
/// # Errors
/// Fails when the case has no output directory, when it cannot be created,
/// or when the record cannot be serialized or written.
///
/// 写入 `case` 的结果记录并返回 `spec.json` 的路径。
pub fn record(case: &mut Case, outcome: &Outcome) -> Result<PathBuf> {
    let output_dir = case
        .output_dir()
        .ok_or_else(|| anyhow!("case `{}` has no output directory", case.display_name()))?;
    fs::ensure_dir(&output_dir)?;

    let results = case.results_mut();
    results.insert(keys::PASSED.to_string(), Value::Bool(outcome.passed()));
    match outcome {
        Outcome::Passed => {
            results.remove(keys::EXCEPTION);
        }
        Outcome::Failed { exception } => {
            results.insert(
                keys::EXCEPTION.to_string(),
                Value::String(exception.clone()),
            );
        }
    }

    let doc = normalize(case)?;
    let path = output_dir.join(RESULT_FILE_NAME);
    fs::write_json(&path, &Value::Object(doc))?;
    Ok(path)
}
