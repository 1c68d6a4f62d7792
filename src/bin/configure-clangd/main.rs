//! configure-clangd - .clangd from a compilation database

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;
use prebuild::ops::clangd::{configure_clangd, ClangdOptions};
use prebuild::util::{logging, Shell, SystemExecutor};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();
    logging::init(cli.verbose);
    let shell = Shell::from_flags(cli.verbose, cli.no_color);

    let opts = ClangdOptions {
        build_dir: cli.build_dir,
        output: cli.output,
        query_flag: cli.query_flag,
    };

    configure_clangd(&opts, &SystemExecutor, &shell)?;
    Ok(())
}
