//! Generate a `.clangd` file from a compilation database.
//!
//! Cross compilers such as `emcc` know their sysroot and target flags, but
//! clangd only sees what is in `compile_commands.json`. The compiler of the
//! first record is asked for its default flags, which are then added to every
//! translation unit.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::fs::{read_to_string, write_string};
use crate::util::process::{Executor, ProcessBuilder};
use crate::util::shell::{Shell, Status};

pub const COMPILE_DB_FILE: &str = "compile_commands.json";

/// Flags removed from every command; `-s` settings are link-time only.
pub const REMOVED_FLAGS: [&str; 1] = ["-s*"];

#[derive(Debug, Error)]
pub enum CompileDbError {
    #[error("compilation database {} has no entries", path.display())]
    Empty { path: PathBuf },

    #[error("first entry of {} has neither `command` nor `arguments`", path.display())]
    MissingCommand { path: PathBuf },
}

/// compile_commands.json entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CompileCommand {
    pub directory: String,
    pub file: String,
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub arguments: Option<Vec<String>>,
}

impl CompileCommand {
    /// The compiler: first token of `command`, or first element of `arguments`.
    pub fn compiler(&self) -> Option<&str> {
        match (&self.command, &self.arguments) {
            (Some(command), _) => command.split_whitespace().next(),
            (None, Some(arguments)) => arguments.first().map(String::as_str),
            (None, None) => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClangdOptions {
    /// Directory containing `compile_commands.json`
    pub build_dir: PathBuf,
    /// Where to write the YAML, usually `.clangd`
    pub output: PathBuf,
    /// Flag that makes the compiler print its default flags
    pub query_flag: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClangdConfig {
    pub compile_flags: CompileFlags,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CompileFlags {
    pub add: Vec<String>,
    pub remove: Vec<String>,
}

impl ClangdConfig {
    pub fn new(flags: Vec<String>) -> Self {
        ClangdConfig {
            compile_flags: CompileFlags {
                add: flags,
                remove: REMOVED_FLAGS.iter().map(|f| f.to_string()).collect(),
            },
        }
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("failed to serialize clangd config")
    }
}

/// Read `<build_dir>/compile_commands.json`.
pub fn load_compile_commands(build_dir: &Path) -> Result<Vec<CompileCommand>> {
    let path = build_dir.join(COMPILE_DB_FILE);
    let contents = read_to_string(&path)?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse {}", path.display()))
}

/// Compiler of the first entry of the database in `build_dir`.
pub fn compiler_path(build_dir: &Path) -> Result<String> {
    let path = build_dir.join(COMPILE_DB_FILE);
    let commands = load_compile_commands(build_dir)?;

    let first = commands
        .first()
        .ok_or_else(|| CompileDbError::Empty { path: path.clone() })?;

    let compiler = first
        .compiler()
        .ok_or(CompileDbError::MissingCommand { path })?;

    Ok(compiler.to_string())
}

/// Split compiler output into flags, normalising path separators.
pub fn parse_flags(output: &str) -> Vec<String> {
    output
        .replace('\n', " ")
        .replace('\\', "/")
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Ask `compiler` for its default flags.
pub fn query_flags(compiler: &str, query_flag: &str, exec: &dyn Executor) -> Result<Vec<String>> {
    let cmd = ProcessBuilder::new(compiler).arg(query_flag);
    tracing::debug!("Querying flags: {}", cmd);

    let outcome = exec
        .output(&cmd)
        .with_context(|| format!("failed to run compiler `{}`", compiler))?
        .check()?;

    Ok(parse_flags(&outcome.stdout_lossy()))
}

/// Write the `.clangd` file. Returns the flags that were added.
pub fn configure_clangd(opts: &ClangdOptions, exec: &dyn Executor, shell: &Shell) -> Result<Vec<String>> {
    let compiler = compiler_path(&opts.build_dir)?;
    shell.note(format!("compiler: {}", compiler));

    let flags = query_flags(&compiler, &opts.query_flag, exec)?;
    tracing::info!("{} flags reported by {}", flags.len(), compiler);

    let yaml = ClangdConfig::new(flags.clone()).to_yaml()?;
    write_string(&opts.output, &yaml)?;
    shell.status(Status::Created, opts.output.display());

    Ok(flags)
}
