//! HTTP downloads of release binaries.

use std::io;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tempfile::NamedTempFile;

use crate::util::fs::ensure_dir;
use crate::util::hash::verify_sha256;
use crate::util::shell::Shell;

/// Download `url` to `dest`.
///
/// The body is streamed into a temporary file next to `dest` and only moved
/// into place once complete, so an interrupted download never leaves a
/// truncated binary behind. When `sha256` is given the file is verified
/// before it is persisted.
pub fn download_file(shell: &Shell, url: &str, dest: &Path, sha256: Option<&str>) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response =
        reqwest::blocking::get(url).with_context(|| format!("failed to download {}", url))?;

    if !response.status().is_success() {
        bail!("failed to download {}: HTTP {}", url, response.status());
    }

    let parent = dest
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    ensure_dir(parent)?;

    let mut tmp = NamedTempFile::new_in(parent)
        .with_context(|| format!("failed to create temporary file in {}", parent.display()))?;

    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| url.to_string());
    let pb = shell.bytes_progress(name, response.content_length());

    let mut reader = pb.wrap_read(response);
    let written = io::copy(&mut reader, tmp.as_file_mut())
        .with_context(|| format!("failed to read response body from {}", url))?;
    pb.finish_and_clear();

    tracing::debug!("Downloaded {} bytes from {}", written, url);

    if let Some(expected) = sha256 {
        verify_sha256(tmp.path(), expected)?;
        tracing::debug!("Checksum verified for {}", url);
    }

    tmp.persist(dest)
        .with_context(|| format!("failed to write {}", dest.display()))?;

    Ok(())
}
