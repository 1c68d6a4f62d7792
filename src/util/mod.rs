//! Shared utilities

pub mod archive;
pub mod config;
pub mod download;
pub mod fs;
pub mod hash;
pub mod logging;
pub mod process;
pub mod prompt;
pub mod shell;

pub use config::Config;
pub use process::{Executor, FailurePolicy, ProcessBuilder, ProcessOutcome, SystemExecutor};
pub use shell::Shell;
