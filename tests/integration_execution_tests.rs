//! # Case Execution Integration Tests / 用例执行集成测试
//!
//! Executes planned cases against registered operations and checks what ends
//! up on disk: passes, failures, panics, timeouts, cancellation and the
//! built-in `shell.run` operation.
//!
//! 针对已注册的操作执行已规划的用例，并检查最终写入磁盘的内容：
//! 通过、失败、崩溃、超时、取消以及内置的 `shell.run` 操作。

mod common;

use anyhow::bail;
use common::{Workspace, read_record};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;
use spec_runner::Registry;
use spec_runner::core::builtins::builtin_registry;
use spec_runner::core::execution::{run_case, run_cases, validate_operations};
use spec_runner::core::planner::plan_run;
use spec_runner::core::registry::Operation;
use spec_runner::core::selector::Selection;
use spec_runner::models::{Case, CaseResult, SpecError};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Sleeps for the `delay_ms` param, then passes.
struct Sleeper;

impl Operation for Sleeper {
    fn call<'a>(&'a self, case: &'a mut Case) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            let delay = case.param("delay_ms").and_then(|v| v.as_u64()).unwrap_or(0);
            tokio::time::sleep(Duration::from_millis(delay)).await;
            case.results_mut().insert("slept_ms".to_string(), json!(delay));
            Ok(())
        }
        .boxed()
    }
}

fn registry() -> Registry {
    let mut registry = builtin_registry();
    registry
        .register_operation("test.sleep", Sleeper)
        .register_operation_fn("test.check_size", |case| {
            let size = case.param("size").and_then(|v| v.as_i64()).unwrap_or(0);
            if size > 2 {
                bail!("size {size} is too large");
            }
            case.attach("checked", true);
            Ok(())
        })
        .register_operation_fn("test.panic", |_case| panic!("operation exploded"));
    registry
}

async fn run_all(ws: &Workspace, jobs: usize) -> Vec<CaseResult> {
    let registry = registry();
    let plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();
    validate_operations(&plan.cases, &registry).unwrap();
    run_cases(plan.cases, jobs, Arc::new(registry), CancellationToken::new())
        .await
        .unwrap()
}

fn record_of(result: &CaseResult) -> serde_json::Value {
    read_record(result.record_path().expect("terminal result has a record"))
}

#[cfg(test)]
mod outcome_tests {
    use super::*;

    #[tokio::test]
    async fn test_every_case_is_recorded_with_its_outcome() {
        let ws = Workspace::new();
        ws.write_spec(
            "sizes.yaml",
            "sizes:\n  operation: test.check_size\n  params: [size]\n  values: [[1], [2], [3]]\n",
        );

        let results = run_all(&ws, 2).await;

        assert_eq!(results.len(), 3);
        let passed: Vec<bool> = results.iter().map(|r| !r.is_failure()).collect();
        assert_eq!(passed, vec![true, true, false]);

        let ok = record_of(&results[0]);
        assert_eq!(ok["results"], json!({"passed": true}));
        assert_eq!(ok["checked"], json!(true));

        let failed = record_of(&results[2]);
        assert_eq!(failed["results"]["passed"], json!(false));
        assert!(
            failed["results"]["exception"]
                .as_str()
                .unwrap()
                .contains("size 3 is too large")
        );
    }

    #[tokio::test]
    async fn test_panicking_operation_fails_only_its_case() {
        let ws = Workspace::new();
        ws.write_spec(
            "mixed.yaml",
            "boom:\n  operation: test.panic\nfine:\n  operation: builtin.noop\n",
        );

        let results = run_all(&ws, 2).await;

        assert!(results[0].is_failure());
        assert!(!results[1].is_failure());
        let record = record_of(&results[0]);
        assert!(
            record["results"]["exception"]
                .as_str()
                .unwrap()
                .contains("operation exploded")
        );
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_as_failure() {
        let ws = Workspace::new();
        ws.write_spec(
            "slow.yaml",
            "slow:\n  operation: test.sleep\n  timeout_secs: 1\n  params: [delay_ms]\n  values: [[3000]]\n",
        );

        let results = run_all(&ws, 1).await;

        assert!(results[0].is_failure());
        assert!(
            record_of(&results[0])["results"]["exception"]
                .as_str()
                .unwrap()
                .contains("timed out")
        );
    }

    #[tokio::test]
    async fn test_results_keep_plan_order_under_concurrency() {
        let ws = Workspace::new();
        ws.write_spec(
            "order.yaml",
            "order:\n  operation: test.sleep\n  params: [delay_ms]\n  values: [[120], [10], [60], [0]]\n",
        );

        let results = run_all(&ws, 4).await;

        let slept: Vec<serde_json::Value> = results
            .iter()
            .map(|r| record_of(r)["results"]["slept_ms"].clone())
            .collect();
        assert_eq!(slept, vec![json!(120), json!(10), json!(60), json!(0)]);
    }

    #[tokio::test]
    async fn test_unregistered_operation_fails_validation() {
        let ws = Workspace::new();
        ws.write_spec("ghost.yaml", "ghost:\n  operation: not.registered\n");
        let registry = registry();
        let plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();

        let err = validate_operations(&plan.cases, &registry).unwrap_err();
        match err.downcast_ref::<SpecError>() {
            Some(SpecError::UnregisteredReference { reference, registered, .. }) => {
                assert_eq!(reference, "not.registered");
                assert!(registered.contains("builtin.noop"));
                assert!(registered.contains("test.sleep"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_operation_fails_validation() {
        let ws = Workspace::new();
        ws.write_spec("bare.yaml", "bare: {}\n");
        let registry = registry();
        let plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();

        let err = validate_operations(&plan.cases, &registry).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SpecError>(),
            Some(SpecError::MissingOperation(_))
        ));
    }
}

#[cfg(test)]
mod cancellation_tests {
    use super::*;

    #[tokio::test]
    async fn test_cancelled_before_start_is_skipped_without_record() {
        let ws = Workspace::new();
        ws.write_spec("noop.yaml", "noop:\n  operation: builtin.noop\n");
        let registry = registry();
        let mut plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();
        let case = plan.cases.remove(0);
        let output_dir = case.output_dir().unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let result = run_case(case, &registry, &token).await.unwrap();

        assert!(result.is_skipped());
        assert!(result.record_path().is_none());
        assert!(!output_dir.exists());
    }

    #[tokio::test]
    async fn test_in_flight_case_is_recorded_as_cancelled() {
        let ws = Workspace::new();
        ws.write_spec(
            "long.yaml",
            "long:\n  operation: test.sleep\n  params: [delay_ms]\n  values: [[10000]]\n",
        );
        let registry = Arc::new(registry());
        let plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();

        let token = CancellationToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            canceller.cancel();
        });
        let results = run_cases(plan.cases, 1, registry, token).await.unwrap();

        assert!(results[0].is_failure());
        assert!(
            record_of(&results[0])["results"]["exception"]
                .as_str()
                .unwrap()
                .contains("cancelled")
        );
    }
}

#[cfg(test)]
mod registry_tests {
    use super::*;

    #[tokio::test]
    async fn test_custom_operations_see_the_expanded_params() {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let mut registry = Registry::new();
        registry.register_operation_fn("test.count", move |case| {
            assert!(case.param("n").is_some());
            seen.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        let ws = Workspace::new();
        ws.write_spec(
            "count.yaml",
            "count:\n  operation: test.count\n  params: [n]\n  values: [1, 2, 3, 4, 5]\n",
        );
        let plan = plan_run(&ws.config(), &Selection::default(), &registry).unwrap();
        let results = run_cases(plan.cases, 3, Arc::new(registry), CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(results.iter().all(|r| !r.is_failure()));
    }
}

#[cfg(all(test, unix))]
mod shell_operation_tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_run_exports_params_and_logs_output() {
        let ws = Workspace::new();
        ws.write_spec(
            "shell.yaml",
            r#"greet:
  operation: shell.run
  params: [who]
  values: [[world]]
  command: sh -c 'echo "hello ${who} $SPEC_PARAM_WHO"'
"#,
        );

        let results = run_all(&ws, 1).await;

        assert!(!results[0].is_failure(), "{:?}", results[0]);
        let record = record_of(&results[0]);
        assert!(
            record["operation_output"]
                .as_str()
                .unwrap()
                .contains("hello world world")
        );
        let output_dir = results[0].record_path().unwrap().parent().unwrap().to_path_buf();
        let log = std::fs::read_to_string(output_dir.join("operation.log")).unwrap();
        assert!(log.contains("hello world world"));
    }

    #[tokio::test]
    async fn test_shell_run_non_zero_exit_fails_with_output() {
        let ws = Workspace::new();
        ws.write_spec(
            "shell.yaml",
            "fail:\n  operation: shell.run\n  command: sh -c 'echo about to fail; exit 3'\n",
        );

        let results = run_all(&ws, 1).await;

        assert!(results[0].is_failure());
        let exception = record_of(&results[0])["results"]["exception"]
            .as_str()
            .unwrap()
            .to_string();
        assert!(exception.contains("code 3"));
        assert!(exception.contains("about to fail"));
    }

    #[tokio::test]
    async fn test_shell_run_without_command_fails() {
        let ws = Workspace::new();
        ws.write_spec("shell.yaml", "empty:\n  operation: shell.run\n");

        let results = run_all(&ws, 1).await;
        assert!(results[0].is_failure());
    }
}
