//! build-mediapipe - prebuilt MediaPipe vision libraries

use anyhow::Result;
use clap::Parser;

mod cli;

use cli::Cli;
use prebuild::core::MediapipePlatform;
use prebuild::ops::mediapipe::{build_mediapipe, MediapipeOptions};
use prebuild::util::config::load_for_work_dir;
use prebuild::util::fs::absolute_dir;
use prebuild::util::{logging, FailurePolicy, Shell, SystemExecutor};

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

    // Before touching the filesystem or network.
    let platform = MediapipePlatform::host()?;

    let work_dir = absolute_dir(cli.work_dir.as_deref())?;
    let config = load_for_work_dir(&work_dir);

    let mut opts = MediapipeOptions::from_config(platform, work_dir, &config);
    if cli.keep_going {
        opts.policy = FailurePolicy::Continue;
    }

    let output = build_mediapipe(&opts, &SystemExecutor, &shell)?;
    println!("{}", output.display());

    Ok(())
}
