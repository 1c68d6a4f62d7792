//! Build configurations.

use std::fmt;

/// A compilation mode. Both builders produce exactly these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildConfiguration {
    Debug,
    Release,
}

impl BuildConfiguration {
    /// Debug first, then release.
    pub const ALL: [BuildConfiguration; 2] = [BuildConfiguration::Debug, BuildConfiguration::Release];

    /// Lower-case label used in output paths.
    pub fn label(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "debug",
            BuildConfiguration::Release => "release",
        }
    }

    /// Value for `CMAKE_BUILD_TYPE` and `--config`.
    pub fn cmake_name(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "Debug",
            BuildConfiguration::Release => "Release",
        }
    }

    /// Bazel compilation mode (`-c`).
    pub fn bazel_mode(&self) -> &'static str {
        match self {
            BuildConfiguration::Debug => "dbg",
            BuildConfiguration::Release => "opt",
        }
    }
}

impl fmt::Display for BuildConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
