//! # Run Planner Module / 运行规划模块
//!
//! Chains the pipeline that runs before anything executes: load → defaults →
//! select → expand → identity. Recorded specs given for reproduction skip
//! loading, selection and expansion. A plan without cases is an error.
//!
//! 串联在任何执行之前运行的管道：加载 → 默认值 → 选择 → 展开 → 标识。
//! 为复现给出的已记录规格跳过加载、选择和展开。没有用例的计划是错误。

use anyhow::{Context, Result};
use rand::Rng;
use std::path::PathBuf;

use crate::core::config::RunConfig;
use crate::core::expander::expand_all;
use crate::core::identity::{IdentityMode, assign_identities};
use crate::core::loader::load_available_specs;
use crate::core::models::{Case, Document, SpecError, keys};
use crate::core::registry::Registry;
use crate::core::selector::{Selection, Strategy, select};
use crate::infra::fs;

/// Represents the complete, identified list of cases of one run.
/// 表示一次运行中完整的、已标识的用例列表。
#[derive(Debug)]
pub struct RunPlan {
    pub cases: Vec<Case>,
    /// Number of specs loaded from the declaration tree.
    pub available_count: usize,
    /// Number of specs left after selection (or recorded specs reproduced).
    pub selected_count: usize,
    pub reproduction: bool,
}

/// Loads recorded result documents for reproduction, dropping their `results`.
/// 加载用于复现的已记录结果文档，并丢弃其 `results`。
pub fn load_reproduction_specs(paths: &[PathBuf]) -> Result<Vec<Document>> {
    paths
        .iter()
        .map(|path| {
            let mut doc = fs::read_json_document(path)
                .with_context(|| format!("Failed to load recorded spec: {}", path.display()))?;
            doc.remove(keys::RESULTS);
            Ok(doc)
        })
        .collect()
}

/// Plans a run using the thread-local random source for sampling.
pub fn plan_run(config: &RunConfig, selection: &Selection, registry: &Registry) -> Result<RunPlan> {
    plan_run_with_rng(config, selection, registry, &mut rand::rng())
}

/// Plans a run.
///
/// # Errors
/// Configuration errors from loading or expansion, and
/// [`SpecError::NoCasesSelected`] when nothing is left to execute.
///
/// 规划一次运行。
pub fn plan_run_with_rng<R: Rng + ?Sized>(
    config: &RunConfig,
    selection: &Selection,
    registry: &Registry,
    rng: &mut R,
) -> Result<RunPlan> {
    let strategy = selection.strategy();
    let reproduction = matches!(strategy, Strategy::Reproduce(_));

    let (docs, available_count, selected_count) = match strategy {
        Strategy::Reproduce(paths) => {
            let docs = load_reproduction_specs(paths)?;
            let count = docs.len();
            (docs, 0, count)
        }
        _ => {
            let available = load_available_specs(config)?;
            let available_count = available.len();
            let selected = select(&strategy, available);
            let selected_count = selected.len();
            (
                expand_all(&selected, registry, rng)?,
                available_count,
                selected_count,
            )
        }
    };

    if docs.is_empty() {
        return Err(SpecError::NoCasesSelected.into());
    }

    let mode = IdentityMode::for_run(reproduction, config.has_build_number());
    let cases = assign_identities(docs, &config.results_dir, mode)?;

    Ok(RunPlan {
        cases,
        available_count,
        selected_count,
        reproduction,
    })
}
