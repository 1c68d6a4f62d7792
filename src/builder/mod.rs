//! Drivers for the external build systems, plus text patches applied to
//! checkouts before building.

pub mod bazel;
pub mod cmake;
pub mod patch;
pub mod python;

pub use bazel::BazelBuild;
pub use cmake::CMakeProject;
pub use patch::{Location, Patch, PatchError};
pub use python::VirtualEnv;
