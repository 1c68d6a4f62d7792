//! build-glfw - prebuilt GLFW distributions

use anyhow::{bail, Result};
use clap::Parser;

mod cli;

use cli::Cli;
use prebuild::core::GlfwSystem;
use prebuild::ops::glfw::{build_glfw, GlfwOptions};
use prebuild::util::config::load_for_work_dir;
use prebuild::util::fs::absolute_dir;
use prebuild::util::prompt::prompt;
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

    let work_dir = absolute_dir(cli.work_dir.as_deref())?;
    let config = load_for_work_dir(&work_dir);

    let version = match cli.version {
        Some(version) => version,
        None => prompt("Version: ")?,
    };
    if version.is_empty() {
        bail!("a GLFW version is required");
    }

    let choice = match cli.system {
        Some(system) if !GlfwSystem::requires_choice(std::env::consts::OS) => {
            shell.warn(format!("ignoring --system {} on {}", system, std::env::consts::OS));
            None
        }
        Some(system) => Some(system),
        None if GlfwSystem::requires_choice(std::env::consts::OS) => {
            Some(prompt("System (mac64/macArm64): ")?)
        }
        None => None,
    };
    let system = GlfwSystem::host(choice.as_deref())?;

    let opts = GlfwOptions {
        version,
        system,
        work_dir,
        repository: config.glfw.repository().to_string(),
        jobs: config.jobs(),
        policy: FailurePolicy::from_keep_going(cli.keep_going || config.keep_going()),
    };

    let archive = build_glfw(&opts, &SystemExecutor, &shell)?;
    println!("{}", archive.display());

    Ok(())
}
