//! Prebuild - bootstrap tools for third-party native libraries
//!
//! This crate provides the library behind three binaries: `build-glfw`
//! and `build-mediapipe`, which produce prebuilt library distributions, and
//! `configure-clangd`, which writes a `.clangd` file for a cross compiler.

pub mod builder;
pub mod core;
pub mod ops;
pub mod sources;
pub mod util;

/// Test utilities and mocks for unit tests.
///
/// Only available when running tests. Provides a mock process executor and
/// on-disk fixtures of the trees the external build tools leave behind.
#[cfg(test)]
pub mod test_support;

pub use crate::core::{BuildConfiguration, GlfwSystem, MediapipePlatform, PlatformError};
pub use util::{Executor, FailurePolicy, Shell, SystemExecutor};
