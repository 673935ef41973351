//! # Built-in Operations Module / 内置操作模块
//!
//! Operations available to every project without registering anything:
//!
//! - `shell.run` runs the case's `command` in its output directory,
//! - `builtin.noop` always passes.
//!
//! 无需注册即可供每个项目使用的操作：
//! `shell.run` 在用例的输出目录中运行其 `command`；`builtin.noop` 总是通过。

use anyhow::{Result, anyhow, bail};
use futures::future::BoxFuture;
use serde_json::Value;
use std::convert::Infallible;
use std::path::PathBuf;

use crate::core::models::{Case, Params};
use crate::core::registry::{Operation, Registry};
use crate::infra::{command, fs};

pub const SHELL_RUN: &str = "shell.run";
pub const NOOP: &str = "builtin.noop";

/// Key of the command string read by `shell.run`.
pub const COMMAND_KEY: &str = "command";
/// File, inside the case output directory, receiving the command output.
pub const OPERATION_LOG: &str = "operation.log";

const FAILURE_TAIL_LINES: usize = 40;

/// Renders a parameter for the command line and the environment: strings as
/// they are, everything else as JSON.
fn param_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn env_name(param: &str) -> String {
    let sanitized: String = param
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("SPEC_PARAM_{sanitized}")
}

/// Expands `${name}`/`$name` from the case params first, then the process
/// environment.
pub fn expand_command(command: &str, params: &Params) -> Result<String> {
    let expanded = shellexpand::env_with_context(command, |var: &str| {
        let value = params
            .get(var)
            .map(param_text)
            .or_else(|| std::env::var(var).ok());
        Ok::<_, Infallible>(value)
    })
    .map_err(|e| anyhow!("Failed to expand command `{command}`: {e}"))?;
    Ok(expanded.into_owned())
}

/// Runs the case's `command` through the shell-free argument splitter.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellOperation;

impl ShellOperation {
    async fn run(&self, case: &mut Case) -> Result<()> {
        let raw_command: String = case
            .field(COMMAND_KEY)?
            .ok_or_else(|| anyhow!("`{SHELL_RUN}` requires a `{COMMAND_KEY}` string"))?;
        let params = case.params();
        let expanded = expand_command(&raw_command, &params)?;

        let parts = shlex::split(&expanded)
            .ok_or_else(|| anyhow!("Failed to parse command: {}", expanded))?;
        let Some((program, args)) = parts.split_first() else {
            bail!("Empty command after parsing.");
        };

        let output_dir = case
            .output_dir()
            .ok_or_else(|| anyhow!("case has no output directory"))?;
        fs::ensure_dir(&output_dir)?;

        let mut cmd = tokio::process::Command::new(program);
        cmd.args(args)
            .kill_on_drop(true)
            .current_dir(&output_dir)
            .env("SPEC_ID", case.id())
            .env("SPEC_NAME", case.name())
            .env("SPEC_OUTPUT_DIR", &output_dir)
            .env(
                "SPEC_ARTIFACTS_DIR",
                case.artifacts_dir().unwrap_or_else(PathBuf::new),
            );
        for (name, value) in &params {
            cmd.env(env_name(name), param_text(value));
        }

        let command::CommandRun { status, output } =
            command::run_logged(cmd, &expanded, &output_dir.join(OPERATION_LOG)).await?;
        case.attach("operation_output", output.clone());

        if !status.success() {
            bail!(
                "command `{}` exited with {}\n{}",
                expanded,
                status
                    .code()
                    .map_or_else(|| "a signal".to_string(), |code| format!("code {code}")),
                command::tail_lines(&output, FAILURE_TAIL_LINES)
            );
        }
        Ok(())
    }
}

impl Operation for ShellOperation {
    fn call<'a>(&'a self, case: &'a mut Case) -> BoxFuture<'a, Result<()>> {
        Box::pin(self.run(case))
    }
}

/// Registry holding the built-in operations.
/// 包含内置操作的注册表。
pub fn builtin_registry() -> Registry {
    let mut registry = Registry::new();
    registry
        .register_operation(SHELL_RUN, ShellOperation)
        .register_operation_fn(NOOP, |_case| Ok(()));
    registry
}
