//! # Case Execution Engine Module / 用例执行引擎模块
//!
//! This module runs planned cases against their registered operations and
//! hands every terminal outcome to the result recorder. A failing, panicking,
//! timed-out or cancelled operation fails only its own case; a result that
//! cannot be written aborts the whole run.
//!
//! 此模块针对已注册的操作运行已规划的用例，并将每个最终结果交给结果记录器。
//! 失败、崩溃、超时或被取消的操作只会使其自身用例失败；
//! 无法写入的结果会中止整个运行。

use anyhow::{Context, Result, anyhow};
use colored::*;
use futures::{FutureExt, StreamExt, stream};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use crate::core::models::{Case, CaseResult, Outcome};
use crate::core::recorder;
use crate::core::registry::Registry;
use crate::infra::t;

/// Checks that every case names a registered operation, before anything runs.
/// 在运行任何内容之前，检查每个用例是否都指定了已注册的操作。
pub fn validate_operations(cases: &[Case], registry: &Registry) -> Result<()> {
    for case in cases {
        let reference = case.operation()?;
        registry.operation(reference)?;
    }
    Ok(())
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Runs the operation of `case` and reduces whatever happens to an [`Outcome`].
async fn call_operation(
    case: &mut Case,
    registry: &Registry,
    timeout: Option<Duration>,
    stop_token: &CancellationToken,
) -> Outcome {
    let operation = match case.operation().and_then(|r| registry.operation(r)) {
        Ok(operation) => operation,
        Err(e) => return Outcome::failed(e.to_string()),
    };

    let call = AssertUnwindSafe(operation.call(case)).catch_unwind();
    let guarded = async {
        match timeout {
            Some(limit) => tokio::time::timeout(limit, call).await.ok(),
            None => Some(call.await),
        }
    };

    tokio::select! {
        biased;
        _ = stop_token.cancelled() => Outcome::failed(t!("run.cancelled_message").to_string()),
        result = guarded => match result {
            Some(Ok(Ok(()))) => Outcome::Passed,
            Some(Ok(Err(e))) => Outcome::failed(format!("{e:#}")),
            Some(Err(payload)) => Outcome::failed(format!(
                "operation panicked: {}",
                panic_message(payload.as_ref())
            )),
            None => Outcome::failed(
                t!(
                    "run.timeout_message",
                    timeout = timeout.map(|d| d.as_secs()).unwrap_or_default()
                )
                .to_string(),
            ),
        },
    }
}

/// The main entry point for running a single case.
/// Executes the operation, then records the outcome exactly once.
///
/// # Errors
/// Only when the result cannot be recorded.
///
/// 运行单个用例的主入口。执行操作，然后恰好记录一次结果。
pub async fn run_case(
    mut case: Case,
    registry: &Registry,
    stop_token: &CancellationToken,
) -> Result<CaseResult> {
    let display_name = case.display_name();
    if stop_token.is_cancelled() {
        return Ok(CaseResult::Skipped { display_name });
    }

    println!("{}", t!("run.running_case", name = &display_name).blue());

    let start_time = Instant::now();
    let outcome = match case.timeout() {
        Ok(timeout) => call_operation(&mut case, registry, timeout, stop_token).await,
        Err(e) => Outcome::failed(e.to_string()),
    };
    let duration = start_time.elapsed();

    let record = recorder::record(&mut case, &outcome)
        .with_context(|| format!("Failed to record result of {display_name}"))?;

    let seconds = format!("{:.2}", duration.as_secs_f64());
    Ok(match outcome {
        Outcome::Passed => {
            println!(
                "{}",
                t!("run.case_passed", name = &display_name, duration = &seconds).green()
            );
            CaseResult::Passed {
                display_name,
                duration,
                record,
            }
        }
        Outcome::Failed { exception } => {
            println!(
                "{}",
                t!("run.case_failed", name = &display_name, duration = &seconds).red()
            );
            CaseResult::Failed {
                display_name,
                exception,
                duration,
                record,
            }
        }
    })
}

/// Runs the cases with at most `jobs` in flight and returns their results in
/// plan order. The first recording failure cancels the remaining cases and is
/// returned once everything in flight has settled.
///
/// 以最多 `jobs` 个并发运行用例，并按计划顺序返回结果。
/// 第一次记录失败会取消剩余用例，并在所有进行中的用例结束后返回。
pub async fn run_cases(
    cases: Vec<Case>,
    jobs: usize,
    registry: Arc<Registry>,
    stop_token: CancellationToken,
) -> Result<Vec<CaseResult>> {
    let abort_token = stop_token.child_token();

    let outcomes: Vec<(usize, Result<CaseResult>)> =
        stream::iter(cases.into_iter().enumerate().map(|(index, case)| {
            let registry = Arc::clone(&registry);
            let abort_token = abort_token.clone();
            let display_name = case.display_name();

            async move {
                let handle = tokio::spawn(async move {
                    let result = run_case(case, &registry, &abort_token).await;
                    if result.is_err() {
                        abort_token.cancel();
                    }
                    result
                });
                let result = match handle.await {
                    Ok(result) => result,
                    Err(e) => Err(anyhow!("Critical error while running {display_name}: {e}")),
                };
                (index, result)
            }
        }))
        .buffer_unordered(jobs.max(1))
        .collect()
        .await;

    let mut ordered = outcomes;
    ordered.sort_by_key(|(index, _)| *index);
    ordered.into_iter().map(|(_, result)| result).collect()
}
