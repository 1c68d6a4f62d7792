//! High-level operations.
//!
//! One module per tool: each exposes an options struct and a function that
//! runs the whole pipeline against an [`Executor`](crate::util::Executor).

pub mod clangd;
pub mod glfw;
pub mod mediapipe;

pub use clangd::{configure_clangd, ClangdOptions, CompileDbError};
pub use glfw::{build_glfw, GlfwOptions};
pub use mediapipe::{build_mediapipe, MediapipeOptions};
