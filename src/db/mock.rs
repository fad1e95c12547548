//! Scripted command runner for tests and headless mode.
//!
//! Hands out canned results in order instead of launching processes, and
//! records every command it was asked to run.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{CommandRunner, ExecutionResult, ShellCommand};
use crate::error::{GridError, Result};

/// A runner that returns predefined results.
#[derive(Debug, Default)]
pub struct MockRunner {
    queued: Mutex<VecDeque<ExecutionResult>>,
    fallback: ExecutionResult,
    commands: Mutex<Vec<ShellCommand>>,
}

impl MockRunner {
    /// Creates a runner that succeeds with empty output.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a runner that always succeeds with the given stdout.
    pub fn with_stdout(stdout: impl Into<String>) -> Self {
        Self {
            fallback: ExecutionResult::success(stdout),
            ..Self::default()
        }
    }

    /// Queues a result for the next run; queued results are used before the fallback.
    pub fn push_result(&self, result: ExecutionResult) {
        if let Ok(mut queued) = self.queued.lock() {
            queued.push_back(result);
        }
    }

    /// Returns the commands received so far.
    pub fn commands(&self) -> Vec<ShellCommand> {
        self.commands.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(&self, command: &ShellCommand) -> Result<ExecutionResult> {
        // Mirror the cleanup a real run would chain onto the command
        if let Some(path) = &command.temp_file {
            let _ = std::fs::remove_file(path);
        }

        self.commands
            .lock()
            .map_err(|_| GridError::internal("mock runner lock poisoned"))?
            .push(command.clone());

        let next = self
            .queued
            .lock()
            .map_err(|_| GridError::internal("mock runner lock poisoned"))?
            .pop_front();
        Ok(next.unwrap_or_else(|| self.fallback.clone()))
    }

    fn executable_available(&self, _executable: &str) -> bool {
        true
    }
}
