//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Build the MediaPipe vision C API (debug and release) for this host
#[derive(Parser)]
#[command(name = "build-mediapipe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Directory that holds mediapipe_build/ [default: current directory]
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Warn instead of failing when preparation steps fail (bazel failures always abort)
    #[arg(long)]
    pub keep_going: bool,
}
