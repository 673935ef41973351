//! # Run Command Module / 运行命令模块
//!
//! This module implements the `run` command, which plans the selected specs
//! into cases, executes them concurrently and records every outcome.
//!
//! 此模块实现 `run` 命令，它将所选规格规划为用例，
//! 并发执行它们并记录每个结果。

use anyhow::{Result, bail};
use colored::*;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;

use crate::{
    core::{
        config::RunConfig,
        execution::{run_cases, validate_operations},
        models::CaseResult,
        planner,
        registry::Registry,
        selector::{Selection, Strategy},
    },
    infra::t,
    reporting::{print_failure_details, print_summary},
};

/// Default concurrency when neither `--jobs` nor the settings file set one.
pub fn default_jobs() -> usize {
    num_cpus::get() / 2 + 1
}

/// Executes the run command.
///
/// # Errors
/// Planning errors, an unregistered operation, a result that could not be
/// written, any failed case, or a cancelled run.
///
/// 执行运行命令。
pub async fn execute(
    config: RunConfig,
    selection: Selection,
    jobs: Option<usize>,
    registry: Registry,
) -> Result<()> {
    let locale = config.language.clone();

    if matches!(selection.strategy(), Strategy::Inconsistent) {
        println!(
            "{}",
            t!("run.inconsistent_selection", locale = &locale).yellow()
        );
    }

    println!(
        "{}",
        t!(
            "run.results_root",
            locale = &locale,
            path = config.results_dir.display()
        )
    );

    let plan = planner::plan_run(&config, &selection, &registry)?;
    if plan.reproduction {
        println!(
            "{}",
            t!("run.reproducing", locale = &locale, count = plan.cases.len()).cyan()
        );
    } else {
        println!(
            "{}",
            t!(
                "run.plan_summary",
                locale = &locale,
                available = plan.available_count,
                selected = plan.selected_count,
                cases = plan.cases.len()
            )
            .cyan()
        );
    }

    validate_operations(&plan.cases, &registry)?;

    let jobs = jobs.or(config.jobs).unwrap_or_else(default_jobs);
    println!("{}", t!("run.jobs", locale = &locale, jobs = jobs).bold());

    let stop_token = setup_signal_handler(&locale);
    let results = run_cases(plan.cases, jobs, Arc::new(registry), stop_token.clone()).await?;

    finish(&results, stop_token.is_cancelled(), &locale)
}

/// Prints the summary and turns failures or cancellation into an error.
fn finish(results: &[CaseResult], cancelled: bool, locale: &str) -> Result<()> {
    print_summary(results, locale);

    let skipped = results.iter().filter(|r| r.is_skipped()).count();
    if skipped > 0 {
        println!(
            "{}",
            t!("run.skipped_cases", locale = locale, count = skipped).yellow()
        );
    }

    let failed = results.iter().filter(|r| r.is_failure()).count();
    if failed > 0 {
        print_failure_details(results, locale);
        bail!(t!("run.failed", locale = locale, count = failed).to_string());
    }
    if cancelled {
        bail!(t!("run.cancelled", locale = locale).to_string());
    }

    println!("\n{}", t!("run.all_passed", locale = locale).green().bold());
    Ok(())
}

/// Sets up a signal handler for graceful shutdown.
fn setup_signal_handler(locale: &str) -> CancellationToken {
    let token = CancellationToken::new();
    let token_clone = token.clone();
    let locale = locale.to_string();

    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                println!("\n{}", t!("run.shutdown_signal", locale = &locale).yellow());
                token_clone.cancel();
            }
            Err(e) => eprintln!(
                "{}",
                t!("run.signal_unavailable", locale = &locale, error = e).yellow()
            ),
        }
    });

    token
}
