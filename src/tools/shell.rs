//! Shell command execution tool

use std::process::Stdio;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tokio::process::Command;

use super::{Tool, ToolResult};

const MAX_OUTPUT: usize = 50_000;

/// Tool for executing shell commands
pub struct ShellTool {
    timeout_secs: u64,
}

impl ShellTool {
    pub const NAME: &'static str = "shell";
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    pub fn new() -> Self {
        Self::with_timeout(Self::DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self { timeout_secs }
    }
}

impl Default for ShellTool {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Deserialize)]
struct ShellParams {
    command: String,
    working_dir: Option<String>,
}

#[async_trait]
impl Tool for ShellTool {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn description(&self) -> &'static str {
        "Execute a bash command and return stdout/stderr. \
         Use for: ls, grep, git, cat, etc. \
         Commands are executed with a timeout."
    }

    fn parameters(&self) -> serde_json::Value {
        json!({"command": "ls -la", "working_dir": "(optional) /path/to/dir"})
    }

    async fn execute(&self, params: serde_json::Value) -> Result<ToolResult> {
        let params: ShellParams =
            serde_json::from_value(params).context("expected {\"command\": string}")?;

        let mut cmd = Command::new("bash");
        cmd.arg("-c").arg(&params.command);
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());
        cmd.kill_on_drop(true);

        if let Some(ref working_dir) = params.working_dir {
            let path = std::path::Path::new(working_dir);
            if !path.is_dir() {
                return Ok(ToolResult::error(format!(
                    "Working directory does not exist: {}",
                    working_dir
                )));
            }
            cmd.current_dir(path);
        }

        let output = match tokio::time::timeout(
            Duration::from_secs(self.timeout_secs),
            cmd.output(),
        )
        .await
        {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Ok(ToolResult::error(format!("Failed to execute command: {}", e)))
            },
            Err(_) => {
                return Ok(ToolResult::error(format!(
                    "Command timed out after {} seconds",
                    self.timeout_secs
                )))
            },
        };

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        let exit_code = output.status.code().unwrap_or(-1);

        let mut text = String::new();
        if !stdout.is_empty() {
            text.push_str(&stdout);
        }
        if !stderr.is_empty() {
            if !text.is_empty() {
                text.push_str("\n\n");
            }
            text.push_str("[stderr]\n");
            text.push_str(&stderr);
        }
        if text.is_empty() {
            text = "(no output)".to_string();
        }
        if exit_code != 0 {
            text.push_str(&format!("\n\n[exit code: {}]", exit_code));
        }

        if text.len() > MAX_OUTPUT {
            let total = text.len();
            let mut cut = MAX_OUTPUT;
            while !text.is_char_boundary(cut) {
                cut -= 1;
            }
            text.truncate(cut);
            text.push_str(&format!("\n\n[... output truncated ({} bytes total)]", total));
        }

        if output.status.success() {
            Ok(ToolResult::success(text))
        } else {
            Ok(ToolResult::error(text))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_shell_echo() {
        let result = ShellTool::new()
            .execute(json!({"command": "echo 'hello world'"}))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("hello world"));
    }

    #[tokio::test]
    async fn test_shell_with_working_dir() {
        let result = ShellTool::new()
            .execute(json!({"command": "pwd", "working_dir": "/tmp"}))
            .await
            .unwrap();

        assert!(!result.is_error);
        assert!(result.content.contains("tmp"));
    }

    #[tokio::test]
    async fn test_shell_exit_code() {
        let result = ShellTool::new()
            .execute(json!({"command": "echo oops >&2; exit 3"}))
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("[stderr]\noops"));
        assert!(result.content.contains("exit code: 3"));
    }

    #[tokio::test]
    async fn test_shell_timeout() {
        let result = ShellTool::with_timeout(1)
            .execute(json!({"command": "sleep 5"}))
            .await
            .unwrap();

        assert!(result.is_error);
        assert!(result.content.contains("timed out"));
    }

    #[tokio::test]
    async fn test_shell_missing_command() {
        assert!(ShellTool::new().execute(json!({})).await.is_err());
    }
}
