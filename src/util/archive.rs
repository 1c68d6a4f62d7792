//! Zip archive creation.

use std::fs::File;
use std::io;
use std::path::Path;

use anyhow::{Context, Result};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Zip the directory `src` into `dest`.
///
/// Entries are rooted at the directory's own name, so unpacking
/// `win64_glfw_3.4.zip` yields a single `win64_glfw_3.4/` folder.
pub fn zip_directory(src: &Path, dest: &Path) -> Result<()> {
    let root = src
        .file_name()
        .with_context(|| format!("cannot archive a path without a name: {}", src.display()))?
        .to_string_lossy()
        .into_owned();

    let file =
        File::create(dest).with_context(|| format!("failed to create {}", dest.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    // Sorted so archives of identical trees list entries identically.
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to walk {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;

        let mut name = root.clone();
        for component in relative.components() {
            name.push('/');
            name.push_str(&component.as_os_str().to_string_lossy());
        }

        if entry.file_type().is_dir() {
            zip.add_directory(name, options)?;
        } else {
            zip.start_file(name, options)?;
            let mut input = File::open(entry.path())
                .with_context(|| format!("failed to open {}", entry.path().display()))?;
            io::copy(&mut input, &mut zip)
                .with_context(|| format!("failed to archive {}", entry.path().display()))?;
        }
    }

    zip.finish()
        .with_context(|| format!("failed to finish {}", dest.display()))?;

    Ok(())
}
