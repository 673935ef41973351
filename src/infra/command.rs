//! # Command Execution Module / 命令执行模块
//!
//! Runs a child process and streams its stdout and stderr, line by line, into
//! a log file while keeping the combined text for the case record.
//!
//! 运行子进程，将其 stdout 和 stderr 逐行写入日志文件，
//! 同时保留合并后的文本用于用例记录。

use anyhow::{Context, Result, bail};
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};

use crate::infra::t;

/// What a finished command left behind.
#[derive(Debug)]
pub struct CommandRun {
    pub status: ExitStatus,
    /// Interleaved stdout and stderr lines, in arrival order.
    pub output: String,
}

async fn forward_lines<R: AsyncRead + Unpin>(reader: R, sink: UnboundedSender<String>) {
    let mut lines = BufReader::new(reader).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        if sink.send(line).is_err() {
            break;
        }
    }
}

/// Runs `cmd` and writes `$ <shown>` followed by every output line to
/// `log_path`. The log is complete once this returns, whatever the exit status.
///
/// 运行 `cmd`，并将 `$ <shown>` 及之后的每一行输出写入 `log_path`。
/// 返回时日志已完整写入，与退出状态无关。
pub async fn run_logged(mut cmd: Command, shown: &str, log_path: &Path) -> Result<CommandRun> {
    let mut log = File::create(log_path)
        .await
        .with_context(|| format!("Failed to create {}", log_path.display()))?;
    log.write_all(format!("$ {shown}\n").as_bytes())
        .await
        .with_context(|| format!("Failed to write {}", log_path.display()))?;

    let mut child = cmd
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .with_context(|| format!("Failed to run `{shown}`"))?;
    let (Some(stdout), Some(stderr)) = (child.stdout.take(), child.stderr.take()) else {
        bail!(t!("command.capture_failed").to_string());
    };

    let (sink, mut lines) = unbounded_channel::<String>();
    let collect = async {
        let mut output = String::new();
        while let Some(line) = lines.recv().await {
            log.write_all(line.as_bytes()).await?;
            log.write_all(b"\n").await?;
            output.push_str(&line);
            output.push('\n');
        }
        log.flush().await?;
        Ok::<_, std::io::Error>(output)
    };
    let ((), (), output) = tokio::join!(
        forward_lines(stdout, sink.clone()),
        forward_lines(stderr, sink),
        collect
    );
    let output = output.with_context(|| format!("Failed to write {}", log_path.display()))?;

    let status = child
        .wait()
        .await
        .with_context(|| format!("Failed to wait for `{shown}`"))?;
    Ok(CommandRun { status, output })
}

/// Returns the last `max_lines` lines of `output`, for failure messages.
/// 返回 `output` 的最后 `max_lines` 行，用于失败消息。
pub fn tail_lines(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();
    let start = lines.len().saturating_sub(max_lines);
    lines[start..].join("\n")
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_both_streams_reach_the_log_and_the_output() {
        let dir = tempdir().unwrap();
        let log_path = dir.path().join("operation.log");
        let mut cmd = Command::new("sh");
        cmd.args(["-c", "echo out; echo err >&2; exit 4"]);

        let run = run_logged(cmd, "demo", &log_path).await.unwrap();

        assert_eq!(run.status.code(), Some(4));
        assert!(run.output.contains("out\n"));
        assert!(run.output.contains("err\n"));
        let log = std::fs::read_to_string(&log_path).unwrap();
        assert!(log.starts_with("$ demo\n"));
        assert!(log.contains("out") && log.contains("err"));
    }

    #[test]
    fn test_tail_keeps_the_last_lines() {
        assert_eq!(tail_lines("a\nb\nc\n", 2), "b\nc");
        assert_eq!(tail_lines("a", 5), "a");
    }
}
