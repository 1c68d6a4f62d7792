//! Test utilities for unit tests.
//!
//! [`MockExecutor`] stands in for [`SystemExecutor`](crate::util::SystemExecutor):
//! it records every command it is asked to run and answers from a list of
//! expectations, so pipelines can be exercised without cmake, bazel or git.

pub mod fixtures;

use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{bail, Result};

use crate::util::process::{Executor, ProcessBuilder, ProcessOutcome};

pub use fixtures::*;

/// Mock process output.
#[derive(Debug, Clone)]
pub struct MockProcessOutput {
    /// Exit status code (0 = success).
    pub status: i32,
    /// Standard output.
    pub stdout: String,
    /// Standard error.
    pub stderr: String,
}

impl MockProcessOutput {
    /// Create a successful output with the given stdout.
    pub fn success(stdout: impl Into<String>) -> Self {
        MockProcessOutput {
            status: 0,
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Create a failure output with the given stderr and status code.
    pub fn failure(status: i32, stderr: impl Into<String>) -> Self {
        MockProcessOutput {
            status,
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    fn to_outcome(&self, command: &str) -> ProcessOutcome {
        ProcessOutcome::new(
            command,
            Some(self.status),
            self.stdout.clone().into_bytes(),
            self.stderr.clone().into_bytes(),
        )
    }
}

/// Pattern for matching commands in MockExecutor.
#[derive(Debug, Clone)]
pub enum CommandPattern {
    /// Exact match on full command string.
    Exact(String),
    /// Match if command starts with prefix.
    StartsWith(String),
    /// Match if command contains substring.
    Contains(String),
}

impl CommandPattern {
    /// Check if this pattern matches the given command.
    pub fn matches(&self, cmd: &str) -> bool {
        match self {
            CommandPattern::Exact(s) => cmd == s,
            CommandPattern::StartsWith(s) => cmd.starts_with(s),
            CommandPattern::Contains(s) => cmd.contains(s),
        }
    }
}

/// A command the mock was asked to run.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub command: String,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

#[derive(Debug, Default)]
struct MockState {
    expectations: Vec<(CommandPattern, MockProcessOutput)>,
    calls: Vec<RecordedCall>,
    default_output: Option<MockProcessOutput>,
}

/// Mock process executor.
#[derive(Debug, Default)]
pub struct MockExecutor {
    state: Mutex<MockState>,
}

impl MockExecutor {
    pub fn new() -> Self {
        MockExecutor::default()
    }

    /// A mock where every command succeeds with empty output.
    pub fn succeeding() -> Self {
        let mock = MockExecutor::new();
        mock.set_default(MockProcessOutput::success(""));
        mock
    }

    /// Answer commands containing `substring` with `output`.
    pub fn expect_contains(&self, substring: &str, output: MockProcessOutput) -> &Self {
        self.lock()
            .expectations
            .push((CommandPattern::Contains(substring.to_string()), output));
        self
    }

    /// Answer commands starting with `prefix` with `output`.
    pub fn expect_prefix(&self, prefix: &str, output: MockProcessOutput) -> &Self {
        self.lock()
            .expectations
            .push((CommandPattern::StartsWith(prefix.to_string()), output));
        self
    }

    /// Set a default output for commands that don't match any expectation.
    pub fn set_default(&self, output: MockProcessOutput) -> &Self {
        self.lock().default_output = Some(output);
        self
    }

    /// Command lines of all calls so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.iter().map(|c| c.command.clone()).collect()
    }

    /// Full records of all calls so far.
    pub fn recorded(&self) -> Vec<RecordedCall> {
        self.lock().calls.clone()
    }

    /// Whether any call contained `substring`.
    pub fn was_called_with(&self, substring: &str) -> bool {
        self.lock()
            .calls
            .iter()
            .any(|c| c.command.contains(substring))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn answer(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome> {
        let command = cmd.display_command();
        let mut state = self.lock();

        state.calls.push(RecordedCall {
            command: command.clone(),
            cwd: cmd.get_cwd().map(|p| p.to_path_buf()),
            env: cmd
                .get_env()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });

        if let Some((_, output)) = state
            .expectations
            .iter()
            .find(|(pattern, _)| pattern.matches(&command))
        {
            return Ok(output.to_outcome(&command));
        }

        if let Some(ref default) = state.default_output {
            return Ok(default.to_outcome(&command));
        }

        bail!("unexpected command: {}", command)
    }
}

impl Executor for MockExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome> {
        self.answer(cmd)
    }

    fn output(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome> {
        self.answer(cmd)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_executor_records_and_matches() {
        let mock = MockExecutor::new();
        mock.expect_contains("--cflags", MockProcessOutput::success("-O2"));

        let outcome = mock
            .output(&ProcessBuilder::new("emcc").arg("--cflags"))
            .unwrap();
        assert_eq!(outcome.stdout_lossy(), "-O2");

        assert!(mock.run(&ProcessBuilder::new("cmake")).is_err());
        assert_eq!(mock.calls(), ["emcc --cflags", "cmake"]);
    }

    #[test]
    fn test_mock_executor_default() {
        let mock = MockExecutor::succeeding();
        mock.expect_prefix("bazel", MockProcessOutput::failure(1, "boom"));

        assert!(mock.run(&ProcessBuilder::new("git")).unwrap().success());
        assert!(!mock.run(&ProcessBuilder::new("bazel")).unwrap().success());
        assert!(mock.was_called_with("bazel"));
    }
}
