//! Subprocess execution utilities.
//!
//! Every external command goes through an [`Executor`] and comes back as a
//! [`ProcessOutcome`]. Outcomes are `#[must_use]`: the caller either checks
//! them, or routes them through a [`FailurePolicy`] that decides whether a
//! non-zero exit aborts the pipeline or is only reported.

use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

/// Builder for subprocess execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessBuilder {
    program: PathBuf,
    args: Vec<String>,
    env: BTreeMap<String, String>,
    cwd: Option<PathBuf>,
}

impl ProcessBuilder {
    /// Create a new process builder for the given program.
    pub fn new(program: impl AsRef<Path>) -> Self {
        ProcessBuilder {
            program: program.as_ref().to_path_buf(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// Add a single argument.
    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_string_lossy().into_owned());
        self
    }

    /// Add multiple arguments.
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args.extend(
            args.into_iter()
                .map(|s| s.as_ref().to_string_lossy().into_owned()),
        );
        self
    }

    /// Set an environment variable.
    pub fn env(mut self, key: impl AsRef<str>, value: impl AsRef<str>) -> Self {
        self.env
            .insert(key.as_ref().to_string(), value.as_ref().to_string());
        self
    }

    /// Set the working directory.
    pub fn cwd(mut self, cwd: impl AsRef<Path>) -> Self {
        self.cwd = Some(cwd.as_ref().to_path_buf());
        self
    }

    /// Get the program path.
    pub fn get_program(&self) -> &Path {
        &self.program
    }

    /// Get the arguments.
    pub fn get_args(&self) -> &[String] {
        &self.args
    }

    /// Get the environment overrides.
    pub fn get_env(&self) -> &BTreeMap<String, String> {
        &self.env
    }

    /// Get the working directory, if one was set.
    pub fn get_cwd(&self) -> Option<&Path> {
        self.cwd.as_deref()
    }

    /// Build the Command.
    fn build_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);

        for (key, value) in &self.env {
            cmd.env(key, value);
        }

        if let Some(ref cwd) = self.cwd {
            cmd.current_dir(cwd);
        }

        cmd
    }

    /// Display the command for logs and error messages.
    pub fn display_command(&self) -> String {
        let mut parts = vec![self.program.display().to_string()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

impl fmt::Display for ProcessBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_command())
    }
}

/// Result of running an external command.
#[must_use = "a process outcome must be checked or handled with a FailurePolicy"]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOutcome {
    command: String,
    code: Option<i32>,
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl ProcessOutcome {
    /// Create an outcome from raw parts.
    pub fn new(command: impl Into<String>, code: Option<i32>, stdout: Vec<u8>, stderr: Vec<u8>) -> Self {
        ProcessOutcome {
            command: command.into(),
            code,
            stdout,
            stderr,
        }
    }

    /// Whether the process exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Exit code, or `None` if the process was terminated by a signal.
    pub fn code(&self) -> Option<i32> {
        self.code
    }

    /// The command line that produced this outcome.
    pub fn command(&self) -> &str {
        &self.command
    }

    /// Captured standard output (empty when output was streamed).
    pub fn stdout(&self) -> &[u8] {
        &self.stdout
    }

    /// Captured standard output as lossy UTF-8.
    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Require success.
    pub fn check(self) -> Result<Self> {
        if !self.success() {
            let stderr = String::from_utf8_lossy(&self.stderr);
            bail!(
                "`{}` failed with exit code {:?}\n{}",
                self.command,
                self.code,
                stderr.trim_end()
            );
        }
        Ok(self)
    }

    /// Apply a failure policy: abort with an error, or log and continue.
    pub fn handle(self, policy: FailurePolicy) -> Result<()> {
        match policy {
            FailurePolicy::Abort => self.check().map(drop),
            FailurePolicy::Continue => {
                if !self.success() {
                    tracing::warn!(
                        "`{}` failed with exit code {:?}; continuing",
                        self.command,
                        self.code
                    );
                }
                Ok(())
            }
        }
    }
}

/// What to do when a best-effort step exits with a non-zero status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Turn the failure into an error.
    #[default]
    Abort,
    /// Log a warning and keep going.
    Continue,
}

impl FailurePolicy {
    /// `Continue` when `keep_going` is set, `Abort` otherwise.
    pub fn from_keep_going(keep_going: bool) -> Self {
        if keep_going {
            FailurePolicy::Continue
        } else {
            FailurePolicy::Abort
        }
    }

    /// Apply the policy to a step that fails with an error rather than an exit code.
    ///
    /// Under `Continue` the error is logged and `None` is returned.
    pub fn tolerate<T>(&self, step: &str, result: Result<T>) -> Result<Option<T>> {
        match (self, result) {
            (_, Ok(value)) => Ok(Some(value)),
            (FailurePolicy::Abort, Err(e)) => Err(e.context(format!("{} failed", step))),
            (FailurePolicy::Continue, Err(e)) => {
                tracing::warn!("{} failed: {:#}; continuing", step, e);
                Ok(None)
            }
        }
    }
}

/// Runs external commands.
pub trait Executor {
    /// Run with inherited stdio, so long builds stream to the terminal.
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome>;

    /// Run and capture stdout/stderr.
    fn output(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome>;
}

/// Executor that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

impl Executor for SystemExecutor {
    fn run(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome> {
        tracing::debug!("> {}", cmd);

        let status = cmd
            .build_command()
            .status()
            .with_context(|| format!("failed to execute `{}`", cmd.get_program().display()))?;

        Ok(ProcessOutcome::new(
            cmd.display_command(),
            status.code(),
            Vec::new(),
            Vec::new(),
        ))
    }

    fn output(&self, cmd: &ProcessBuilder) -> Result<ProcessOutcome> {
        tracing::debug!("> {}", cmd);

        let output = cmd
            .build_command()
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("failed to spawn `{}`", cmd.get_program().display()))?;

        Ok(ProcessOutcome::new(
            cmd.display_command(),
            output.status.code(),
            output.stdout,
            output.stderr,
        ))
    }
}

/// Find an executable in PATH.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    which::which(name).ok()
}

/// Find CMake, falling back to the bare name so the spawn error is explicit.
pub fn cmake_program() -> PathBuf {
    find_executable("cmake").unwrap_or_else(|| PathBuf::from("cmake"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_command() {
        let pb = ProcessBuilder::new("cmake").args(["--build", "build", "-j8"]);

        assert_eq!(pb.display_command(), "cmake --build build -j8");
    }

    #[test]
    fn test_check_failure_includes_command() {
        let outcome = ProcessOutcome::new("git clone x", Some(128), Vec::new(), b"fatal".to_vec());
        let err = outcome.check().unwrap_err().to_string();
        assert!(err.contains("git clone x"));
        assert!(err.contains("128"));
    }

    #[test]
    fn test_continue_policy_tolerates_failure() {
        let outcome = ProcessOutcome::new("cmake", Some(1), Vec::new(), Vec::new());
        assert!(outcome.handle(FailurePolicy::Continue).is_ok());

        let outcome = ProcessOutcome::new("cmake", Some(1), Vec::new(), Vec::new());
        assert!(outcome.handle(FailurePolicy::Abort).is_err());
    }

    #[test]
    fn test_policy_from_keep_going() {
        assert_eq!(FailurePolicy::from_keep_going(true), FailurePolicy::Continue);
        assert_eq!(FailurePolicy::from_keep_going(false), FailurePolicy::Abort);
    }

    #[test]
    fn test_tolerate() {
        let failed: Result<()> = Err(anyhow::anyhow!("network down"));
        assert_eq!(FailurePolicy::Continue.tolerate("clone", failed).unwrap(), None);

        let failed: Result<()> = Err(anyhow::anyhow!("network down"));
        let err = FailurePolicy::Abort.tolerate("clone", failed).unwrap_err();
        assert_eq!(err.to_string(), "clone failed");

        assert_eq!(FailurePolicy::Abort.tolerate("clone", Ok(3)).unwrap(), Some(3));
    }

    #[cfg(unix)]
    #[test]
    fn test_system_executor_captures_stdout() {
        let pb = ProcessBuilder::new("echo").arg("hello");
        let outcome = SystemExecutor.output(&pb).unwrap();

        assert!(outcome.success());
        assert_eq!(outcome.stdout_lossy().trim(), "hello");
    }
}
