//! Out-of-process execution of client commands.

use std::process::Stdio;
use std::time::Instant;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::{find_executable, ShellCommand};
use crate::error::{GridError, Result};

/// Captured outcome of one client invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ExecutionResult {
    /// Creates a successful result with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Creates a failed result with the given exit code and stderr.
    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Returns true if the process exited with status zero.
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Runs shell commands and reports their outcome once they finish.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Runs the command to completion. No retries.
    async fn run(&self, command: &ShellCommand) -> Result<ExecutionResult>;

    /// Returns true if the client binary can be launched.
    fn executable_available(&self, executable: &str) -> bool {
        find_executable(executable).is_some()
    }
}

/// Runs commands through `sh -c` on the tokio runtime.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellRunner;

impl ShellRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for ShellRunner {
    async fn run(&self, command: &ShellCommand) -> Result<ExecutionResult> {
        let start = Instant::now();
        let output = tokio::process::Command::new("sh")
            .arg("-c")
            .arg(&command.command)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| GridError::internal(format!("Failed to launch shell: {e}")))?;

        let result = ExecutionResult {
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        debug!(
            exit_code = result.exit_code,
            stdout_bytes = result.stdout.len(),
            stderr_bytes = result.stderr.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Client process finished"
        );

        Ok(result)
    }
}
