//! Text patches applied to third-party checkouts.
//!
//! A patch edits one file relative to a checkout root. Lines are located
//! either by zero-based index or by an anchor: a unique line that starts
//! (ignoring indentation) with a marker, optionally followed by the first
//! later line that starts with a needle. Anchors survive upstream edits that
//! shift line numbers; a missing or ambiguous anchor is an error instead of
//! a silent edit of the wrong line.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use thiserror::Error;

use crate::util::fs::{read_to_string, write_string};

/// Patch application failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("{file}: no line starts with `{marker}`")]
    AnchorNotFound { file: PathBuf, marker: String },

    #[error("{file}: `{marker}` matches {count} lines, expected exactly one")]
    AmbiguousAnchor {
        file: PathBuf,
        marker: String,
        count: usize,
    },

    #[error("{file}: no line starting with `{needle}` after `{marker}`")]
    NeedleNotFound {
        file: PathBuf,
        marker: String,
        needle: String,
    },

    #[error("{file}: line {line} is out of range ({len} lines)")]
    OutOfRange { file: PathBuf, line: usize, len: usize },
}

/// Where an edit applies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Location {
    /// Zero-based line index.
    Line(usize),
    /// Unique marker line, or the first line after it starting with `needle`.
    Anchor {
        marker: String,
        needle: Option<String>,
    },
}

impl Location {
    /// The unique line starting with `marker`.
    pub fn anchor(marker: impl Into<String>) -> Self {
        Location::Anchor {
            marker: marker.into(),
            needle: None,
        }
    }

    /// The first line starting with `needle` after the unique `marker` line.
    pub fn after(marker: impl Into<String>, needle: impl Into<String>) -> Self {
        Location::Anchor {
            marker: marker.into(),
            needle: Some(needle.into()),
        }
    }

    fn resolve(&self, file: &Path, lines: &[String]) -> Result<usize, PatchError> {
        match self {
            Location::Line(index) => {
                if *index < lines.len() {
                    Ok(*index)
                } else {
                    Err(PatchError::OutOfRange {
                        file: file.to_path_buf(),
                        line: *index,
                        len: lines.len(),
                    })
                }
            }
            Location::Anchor { marker, needle } => {
                let starts = |line: &str, prefix: &str| line.trim_start().starts_with(prefix);

                let matches: Vec<usize> = lines
                    .iter()
                    .enumerate()
                    .filter(|(_, line)| starts(line, marker))
                    .map(|(i, _)| i)
                    .collect();

                let marker_index = match matches.as_slice() {
                    [index] => *index,
                    [] => {
                        return Err(PatchError::AnchorNotFound {
                            file: file.to_path_buf(),
                            marker: marker.clone(),
                        })
                    }
                    _ => {
                        return Err(PatchError::AmbiguousAnchor {
                            file: file.to_path_buf(),
                            marker: marker.clone(),
                            count: matches.len(),
                        })
                    }
                };

                match needle {
                    None => Ok(marker_index),
                    Some(needle) => lines
                        .iter()
                        .enumerate()
                        .skip(marker_index + 1)
                        .find(|(_, line)| starts(line, needle))
                        .map(|(i, _)| i)
                        .ok_or_else(|| PatchError::NeedleNotFound {
                            file: file.to_path_buf(),
                            marker: marker.clone(),
                            needle: needle.clone(),
                        }),
                }
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Line(index) => write!(f, "line {}", index + 1),
            Location::Anchor {
                marker,
                needle: None,
            } => write!(f, "`{}`", marker),
            Location::Anchor {
                marker,
                needle: Some(needle),
            } => write!(f, "`{}` after `{}`", needle, marker),
        }
    }
}

/// The change made to a file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Edit {
    /// Replace the located line.
    ReplaceLine { at: Location, line: String },
    /// Overwrite consecutive lines starting at the location, one per line of `content`.
    ReplaceSection { at: Location, content: String },
    /// Append lines to the end of the file.
    Append { lines: Vec<String> },
}

/// A single edit to one file of a checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    /// Path relative to the checkout root
    pub file: PathBuf,
    pub edit: Edit,
}

impl Patch {
    pub fn replace_line(file: impl Into<PathBuf>, at: Location, line: impl Into<String>) -> Self {
        Patch {
            file: file.into(),
            edit: Edit::ReplaceLine {
                at,
                line: line.into(),
            },
        }
    }

    pub fn replace_section(
        file: impl Into<PathBuf>,
        at: Location,
        content: impl Into<String>,
    ) -> Self {
        Patch {
            file: file.into(),
            edit: Edit::ReplaceSection {
                at,
                content: content.into(),
            },
        }
    }

    pub fn append<I, S>(file: impl Into<PathBuf>, lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Patch {
            file: file.into(),
            edit: Edit::Append {
                lines: lines.into_iter().map(Into::into).collect(),
            },
        }
    }

    /// Apply the edit to the file under `root`.
    pub fn apply(&self, root: &Path) -> Result<()> {
        let path = root.join(&self.file);
        let contents = read_to_string(&path)?;
        let patched = self
            .apply_to_str(&contents)
            .with_context(|| format!("failed to patch {}", path.display()))?;
        write_string(&path, &patched)
    }

    /// Apply the edit to file contents, preserving the file's line endings.
    pub fn apply_to_str(&self, contents: &str) -> Result<String, PatchError> {
        let newline = if contents.contains("\r\n") { "\r\n" } else { "\n" };
        let mut lines: Vec<String> = contents.lines().map(str::to_string).collect();

        match &self.edit {
            Edit::ReplaceLine { at, line } => {
                let index = at.resolve(&self.file, &lines)?;
                lines[index] = line.clone();
            }
            Edit::ReplaceSection { at, content } => {
                let start = at.resolve(&self.file, &lines)?;
                let replacement: Vec<&str> = content.lines().collect();
                let end = start + replacement.len();
                if end > lines.len() {
                    return Err(PatchError::OutOfRange {
                        file: self.file.clone(),
                        line: end - 1,
                        len: lines.len(),
                    });
                }
                for (offset, new_line) in replacement.into_iter().enumerate() {
                    lines[start + offset] = new_line.to_string();
                }
            }
            Edit::Append { lines: appended } => {
                lines.extend(appended.iter().cloned());
            }
        }

        let mut out = lines.join(newline);
        out.push_str(newline);
        Ok(out)
    }
}

/// Apply patches in order, stopping at the first failure.
pub fn apply_all(root: &Path, patches: &[Patch]) -> Result<()> {
    for patch in patches {
        tracing::debug!("Patching {}", patch.file.display());
        patch.apply(root)?;
    }
    Ok(())
}
