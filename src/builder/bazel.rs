//! Bazel binary management and build invocation.

use std::path::{Path, PathBuf};

use crate::core::platform::MediapipePlatform;
use crate::core::BuildConfiguration;
use crate::util::process::ProcessBuilder;

/// Release download URL of a Bazel binary.
pub fn release_url(version: &str, platform: &MediapipePlatform) -> String {
    format!(
        "https://github.com/bazelbuild/bazel/releases/download/{v}/bazel-{v}-{os}-{arch}{ext}",
        v = version,
        os = platform.os.as_str(),
        arch = platform.arch.bazel_name(),
        ext = platform.os.exe_suffix(),
    )
}

/// Where the downloaded binary lives inside `bazel_dir`.
pub fn binary_path(bazel_dir: &Path, platform: &MediapipePlatform) -> PathBuf {
    bazel_dir.join(format!("bazel{}", platform.os.exe_suffix()))
}

/// One `bazel build` invocation.
#[derive(Debug, Clone)]
pub struct BazelBuild {
    program: PathBuf,
    workspace: PathBuf,
    config: BuildConfiguration,
    copts: Vec<String>,
    action_env: Vec<(String, String)>,
    defines: Vec<(String, String)>,
    env: Vec<(String, String)>,
    target: String,
}

impl BazelBuild {
    pub fn new(
        program: impl Into<PathBuf>,
        workspace: impl Into<PathBuf>,
        config: BuildConfiguration,
        target: impl Into<String>,
    ) -> Self {
        BazelBuild {
            program: program.into(),
            workspace: workspace.into(),
            config,
            copts: Vec::new(),
            action_env: Vec::new(),
            defines: Vec::new(),
            env: Vec::new(),
            target: target.into(),
        }
    }

    /// Add a `--copt`.
    pub fn copt(mut self, copt: impl Into<String>) -> Self {
        self.copts.push(copt.into());
        self
    }

    /// Add an `--action_env KEY=VALUE`.
    pub fn action_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.action_env.push((key.into(), value.into()));
        self
    }

    /// Add a `--define KEY=VALUE`.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    /// Set an environment variable for the bazel process itself.
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    pub fn command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .cwd(&self.workspace)
            .arg("build")
            .args(["-c", self.config.bazel_mode()]);

        for copt in &self.copts {
            cmd = cmd.arg("--copt").arg(copt);
        }

        for (key, value) in &self.action_env {
            cmd = cmd.arg("--action_env").arg(format!("{}={}", key, value));
        }

        for (key, value) in &self.defines {
            cmd = cmd.arg("--define").arg(format!("{}={}", key, value));
        }

        for (key, value) in &self.env {
            cmd = cmd.env(key, value);
        }

        cmd.arg(&self.target)
    }
}
