//! Configuration file support.
//!
//! Two locations are read and merged:
//! - Global: `~/.prebuild/config.toml` - User-wide defaults
//! - Project: `<work-dir>/prebuild.toml` - Overrides for one working directory
//!
//! Project config takes precedence over global config. Every setting is
//! optional; unset values fall back to the pinned defaults below.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Default GLFW repository.
pub const GLFW_REPOSITORY: &str = "https://github.com/glfw/glfw.git";

/// Default MediaPipe repository.
pub const MEDIAPIPE_REPOSITORY: &str = "https://github.com/google/mediapipe.git";

/// Default OpenCV repository.
pub const OPENCV_REPOSITORY: &str = "https://github.com/opencv/opencv.git";

/// Default opencv_contrib repository.
pub const OPENCV_CONTRIB_REPOSITORY: &str = "https://github.com/opencv/opencv_contrib.git";

/// Pinned MediaPipe tag.
pub const MEDIAPIPE_VERSION: &str = "v0.10.9";

/// Pinned OpenCV tag.
pub const OPENCV_VERSION: &str = "4.7.0";

/// Pinned Bazel release.
pub const BAZEL_VERSION: &str = "6.4.0";

/// Parallel jobs used for the OpenCV build.
pub const OPENCV_JOBS: usize = 8;

/// Project config file name, looked up in the working directory.
pub const PROJECT_CONFIG_FILE: &str = "prebuild.toml";

/// Prebuild configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings shared by the builders
    pub build: BuildConfig,

    /// GLFW builder settings
    pub glfw: GlfwConfig,

    /// MediaPipe builder settings
    pub mediapipe: MediapipeConfig,
}

/// Settings shared by the builders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Parallel jobs for CMake builds (None = logical CPU count)
    pub jobs: Option<usize>,

    /// Keep going when a best-effort step fails (None = false)
    pub keep_going: Option<bool>,
}

/// GLFW builder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlfwConfig {
    pub repository: Option<String>,
}

/// MediaPipe builder settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MediapipeConfig {
    pub repository: Option<String>,
    pub version: Option<String>,
    pub opencv_repository: Option<String>,
    pub opencv_contrib_repository: Option<String>,
    pub opencv_version: Option<String>,
    pub opencv_jobs: Option<usize>,
    pub bazel_version: Option<String>,

    /// Expected SHA256 of the downloaded Bazel binary
    pub bazel_sha256: Option<String>,
}

impl GlfwConfig {
    pub fn repository(&self) -> &str {
        self.repository.as_deref().unwrap_or(GLFW_REPOSITORY)
    }
}

impl MediapipeConfig {
    pub fn repository(&self) -> &str {
        self.repository.as_deref().unwrap_or(MEDIAPIPE_REPOSITORY)
    }

    pub fn version(&self) -> &str {
        self.version.as_deref().unwrap_or(MEDIAPIPE_VERSION)
    }

    pub fn opencv_repository(&self) -> &str {
        self.opencv_repository.as_deref().unwrap_or(OPENCV_REPOSITORY)
    }

    pub fn opencv_contrib_repository(&self) -> &str {
        self.opencv_contrib_repository
            .as_deref()
            .unwrap_or(OPENCV_CONTRIB_REPOSITORY)
    }

    pub fn opencv_version(&self) -> &str {
        self.opencv_version.as_deref().unwrap_or(OPENCV_VERSION)
    }

    pub fn opencv_jobs(&self) -> usize {
        self.opencv_jobs.unwrap_or(OPENCV_JOBS)
    }

    pub fn bazel_version(&self) -> &str {
        self.bazel_version.as_deref().unwrap_or(BAZEL_VERSION)
    }
}

fn merge_opt<T>(dst: &mut Option<T>, src: Option<T>) {
    if src.is_some() {
        *dst = src;
    }
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        merge_opt(&mut self.build.jobs, other.build.jobs);
        merge_opt(&mut self.build.keep_going, other.build.keep_going);

        merge_opt(&mut self.glfw.repository, other.glfw.repository);

        let mp = other.mediapipe;
        merge_opt(&mut self.mediapipe.repository, mp.repository);
        merge_opt(&mut self.mediapipe.version, mp.version);
        merge_opt(&mut self.mediapipe.opencv_repository, mp.opencv_repository);
        merge_opt(
            &mut self.mediapipe.opencv_contrib_repository,
            mp.opencv_contrib_repository,
        );
        merge_opt(&mut self.mediapipe.opencv_version, mp.opencv_version);
        merge_opt(&mut self.mediapipe.opencv_jobs, mp.opencv_jobs);
        merge_opt(&mut self.mediapipe.bazel_version, mp.bazel_version);
        merge_opt(&mut self.mediapipe.bazel_sha256, mp.bazel_sha256);
    }

    /// Parallel jobs for CMake builds: configured value or the host's logical CPU count.
    pub fn jobs(&self) -> usize {
        self.build
            .jobs
            .unwrap_or_else(|| std::thread::available_parallelism().map_or(1, |n| n.get()))
    }

    /// Whether best-effort steps may fail without aborting.
    pub fn keep_going(&self) -> bool {
        self.build.keep_going.unwrap_or(false)
    }
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (`<work-dir>/prebuild.toml`)
/// 2. Global config (`~/.prebuild/config.toml`)
/// 3. Defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = Config::default();

    if let Some(global_path) = global_path {
        if global_path.exists() {
            config.merge(Config::load_or_default(global_path));
        }
    }

    if project_path.exists() {
        config.merge(Config::load_or_default(project_path));
    }

    config
}

/// Load the configuration that applies to a working directory.
pub fn load_for_work_dir(work_dir: &Path) -> Config {
    let global = global_config_path();
    load_config(global.as_deref(), &work_dir.join(PROJECT_CONFIG_FILE))
}

/// Get the global config directory (~/.prebuild).
pub fn global_config_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.home_dir().join(".prebuild"))
}

/// Get the global config path (~/.prebuild/config.toml).
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("config.toml"))
}
