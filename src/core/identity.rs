//! # Identity & Output Assigner Module / 标识与输出分配模块
//!
//! Stamps every expanded case with a unique id and an output directory under
//! the results root. Reproduction runs with a build number keep the identity
//! recorded in the reproduced document so results are overwritten in place.
//! Every case starts with an empty `results` mapping.
//!
//! 为每个展开的用例标记唯一 id 和结果根目录下的输出目录。
//! 带有构建号的复现运行保留被复现文档中记录的标识，以便就地覆盖结果。
//! 每个用例都以空的 `results` 映射开始。

use chrono::Local;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::path::Path;
use uuid::Uuid;

use crate::core::models::{Case, Document, SpecError, keys};

/// A fresh identity token: a compact `ddmmHHMMSS` timestamp followed by 32
/// random hex digits.
///
/// 新的标识令牌：紧凑的 `ddmmHHMMSS` 时间戳后跟 32 个随机十六进制数字。
pub fn new_case_id() -> String {
    format!(
        "{}{}",
        Local::now().format("%d%m%H%M%S"),
        Uuid::new_v4().simple()
    )
}

/// How identities are assigned for one batch of cases.
/// 一批用例的标识分配方式。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityMode {
    /// Every case gets a fresh id and output directory.
    Fresh,
    /// Recorded `id`/`output_dir` are kept; missing ones are filled in fresh.
    Preserve,
}

impl IdentityMode {
    pub fn for_run(reproduction: bool, has_build_number: bool) -> Self {
        if reproduction && has_build_number {
            IdentityMode::Preserve
        } else {
            IdentityMode::Fresh
        }
    }
}

fn has_string(doc: &Document, key: &str) -> bool {
    doc.get(key)
        .and_then(Value::as_str)
        .is_some_and(|s| !s.is_empty())
}

/// Assigns identities and output directories, and resets `results`.
///
/// Fresh ids are drawn until they are unique within the batch, so every case
/// owns an exclusive output directory before anything executes. A preserved id
/// that appears twice is an error.
///
/// 分配标识和输出目录，并重置 `results`。
/// 新 id 会反复抽取直到在批次内唯一，从而在任何执行之前，
/// 每个用例都拥有独占的输出目录。被保留的 id 出现两次则报错。
pub fn assign_identities(
    docs: Vec<Document>,
    results_root: &Path,
    mode: IdentityMode,
) -> Result<Vec<Case>, SpecError> {
    let mut seen: HashSet<String> = HashSet::with_capacity(docs.len());
    let mut cases = Vec::with_capacity(docs.len());

    for mut doc in docs {
        let keep = mode == IdentityMode::Preserve && has_string(&doc, keys::ID);
        if keep {
            let id = doc
                .get(keys::ID)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            if !seen.insert(id.clone()) {
                return Err(SpecError::DuplicateCaseId(id));
            }
            if !has_string(&doc, keys::OUTPUT_DIR) {
                let output_dir = results_root.join(&id);
                doc.insert(
                    keys::OUTPUT_DIR.to_string(),
                    Value::String(output_dir.display().to_string()),
                );
            }
        } else {
            let id = loop {
                let candidate = new_case_id();
                if seen.insert(candidate.clone()) {
                    break candidate;
                }
            };
            let output_dir = results_root.join(&id);
            doc.insert(keys::ID.to_string(), Value::String(id));
            doc.insert(
                keys::OUTPUT_DIR.to_string(),
                Value::String(output_dir.display().to_string()),
            );
        }

        doc.insert(keys::RESULTS.to_string(), Value::Object(Map::new()));
        cases.push(Case::new(doc));
    }

    Ok(cases)
}
