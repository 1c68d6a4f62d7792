//! Core types: platforms and build configurations.

pub mod platform;
pub mod profile;

pub use platform::{Arch, GlfwSystem, MediapipePlatform, Os, PlatformError};
pub use profile::BuildConfiguration;
