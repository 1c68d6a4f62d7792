//! Interactive prompts for values not given on the command line.

use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};

/// Print `label` and read one trimmed line from `input`.
pub fn prompt_from<R: BufRead, W: Write>(label: &str, input: &mut R, output: &mut W) -> Result<String> {
    write!(output, "{}", label)?;
    output.flush()?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .context("failed to read from stdin")?;
    if read == 0 {
        bail!("no input for prompt `{}`", label.trim_end_matches([':', ' ']));
    }

    Ok(line.trim().to_string())
}

/// Prompt on the terminal.
pub fn prompt(label: &str) -> Result<String> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    prompt_from(label, &mut input, &mut io::stderr())
}
