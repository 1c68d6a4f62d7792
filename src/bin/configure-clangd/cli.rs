//! CLI definitions using clap.

use std::path::PathBuf;

use clap::Parser;

/// Write a .clangd file with the default flags of the project's compiler
#[derive(Parser)]
#[command(name = "configure-clangd")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Build directory containing compile_commands.json
    pub build_dir: PathBuf,

    /// Output file
    #[arg(short, long, default_value = ".clangd")]
    pub output: PathBuf,

    /// Flag that makes the compiler print its default flags
    #[arg(long, default_value = "--cflags", allow_hyphen_values = true)]
    pub query_flag: String,
}
