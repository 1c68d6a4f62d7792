//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Build GLFW (debug and release) and package it as a zip archive
#[derive(Parser)]
#[command(name = "build-glfw")]
#[command(author, about, long_about = None, disable_version_flag = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// GLFW tag to build, e.g. 3.4 (prompted if omitted)
    #[arg(long)]
    pub version: Option<String>,

    /// Target system on macOS: mac64 or macArm64 (prompted if omitted)
    #[arg(long)]
    pub system: Option<String>,

    /// Directory holding the checkout and the archive [default: current directory]
    #[arg(long)]
    pub work_dir: Option<PathBuf>,

    /// Warn instead of failing when git or cmake steps fail
    #[arg(long)]
    pub keep_going: bool,
}
