//! CMake command construction.

use std::path::{Path, PathBuf};

use crate::core::BuildConfiguration;
use crate::util::process::{cmake_program, ProcessBuilder};

/// A CMake project configured into one build directory.
///
/// Only builds commands; running them (and deciding what a failure means)
/// is up to the caller.
#[derive(Debug, Clone)]
pub struct CMakeProject {
    program: PathBuf,
    source_dir: PathBuf,
    build_dir: PathBuf,
    install_prefix: Option<PathBuf>,
    build_type: Option<BuildConfiguration>,
    defines: Vec<(String, String)>,
}

impl CMakeProject {
    /// Create a project using the `cmake` found in PATH.
    pub fn new(source_dir: impl Into<PathBuf>, build_dir: impl Into<PathBuf>) -> Self {
        CMakeProject {
            program: cmake_program(),
            source_dir: source_dir.into(),
            build_dir: build_dir.into(),
            install_prefix: None,
            build_type: None,
            defines: Vec::new(),
        }
    }

    /// Use a specific cmake executable.
    pub fn program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Set `CMAKE_INSTALL_PREFIX`.
    pub fn install_prefix(mut self, prefix: impl Into<PathBuf>) -> Self {
        self.install_prefix = Some(prefix.into());
        self
    }

    /// Set `CMAKE_BUILD_TYPE` (single-config generators only).
    pub fn build_type(mut self, config: Option<BuildConfiguration>) -> Self {
        self.build_type = config;
        self
    }

    /// Add a `-D<key>=<value>` cache entry.
    pub fn define(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.defines.push((key.into(), value.into()));
        self
    }

    pub fn build_dir(&self) -> &Path {
        &self.build_dir
    }

    /// `cmake -S<src> -B<build> [-DCMAKE_INSTALL_PREFIX=..] [-D...] [-DCMAKE_BUILD_TYPE=..]`
    pub fn configure_command(&self) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .arg(format!("-S{}", self.source_dir.display()))
            .arg(format!("-B{}", self.build_dir.display()));

        if let Some(ref prefix) = self.install_prefix {
            cmd = cmd.arg(format!("-DCMAKE_INSTALL_PREFIX={}", prefix.display()));
        }

        for (key, value) in &self.defines {
            cmd = cmd.arg(format!("-D{}={}", key, value));
        }

        if let Some(config) = self.build_type {
            cmd = cmd.arg(format!("-DCMAKE_BUILD_TYPE={}", config.cmake_name()));
        }

        cmd
    }

    /// `cmake --build <build> --target install [--config <C>] -j<jobs>`
    ///
    /// `config` selects the configuration for multi-config generators
    /// (Visual Studio); pass `None` when the build type was fixed at configure time.
    pub fn install_command(&self, config: Option<BuildConfiguration>, jobs: usize) -> ProcessBuilder {
        let mut cmd = ProcessBuilder::new(&self.program)
            .arg("--build")
            .arg(&self.build_dir)
            .args(["--target", "install"]);

        if let Some(config) = config {
            cmd = cmd.arg("--config").arg(config.cmake_name());
        }

        cmd.arg(format!("-j{}", jobs.max(1)))
    }
}
