//! Filesystem utilities.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use walkdir::WalkDir;

/// Recursively copy a directory.
pub fn copy_dir_all(src: &Path, dst: &Path) -> Result<()> {
    fs::create_dir_all(dst)
        .with_context(|| format!("failed to create directory: {}", dst.display()))?;

    for entry in WalkDir::new(src).min_depth(1) {
        let entry =
            entry.with_context(|| format!("failed to read directory: {}", src.display()))?;
        let relative = entry.path().strip_prefix(src)?;
        let dst_path = dst.join(relative);

        if entry.file_type().is_dir() {
            ensure_dir(&dst_path)?;
        } else {
            copy_file(entry.path(), &dst_path)?;
        }
    }
    Ok(())
}

/// Copy a single file, creating the destination's parent directories.
pub fn copy_file(src: &Path, dst: &Path) -> Result<()> {
    if let Some(parent) = dst.parent() {
        ensure_dir(parent)?;
    }
    fs::copy(src, dst)
        .with_context(|| format!("failed to copy {} to {}", src.display(), dst.display()))?;
    Ok(())
}

/// Copy a file into a directory, keeping its file name.
pub fn copy_into(src: &Path, dir: &Path) -> Result<()> {
    let name = src
        .file_name()
        .with_context(|| format!("not a file path: {}", src.display()))?;
    copy_file(src, &dir.join(name))
}

/// Remove a directory and all its contents, if it exists.
pub fn remove_dir_all_if_exists(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_dir_all(path)
            .with_context(|| format!("failed to remove directory: {}", path.display()))?;
    }
    Ok(())
}

/// Remove a directory if present and create it again, empty.
pub fn recreate_dir(path: &Path) -> Result<()> {
    remove_dir_all_if_exists(path)?;
    fs::create_dir_all(path)
        .with_context(|| format!("failed to create directory: {}", path.display()))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("failed to create directory: {}", path.display()))?;
    }
    Ok(())
}

/// Read a file to string, with nice error messages.
pub fn read_to_string(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read file: {}", path.display()))
}

/// Write a string to a file, creating parent directories if needed.
pub fn write_string(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            ensure_dir(parent)?;
        }
    }
    fs::write(path, contents).with_context(|| format!("failed to write file: {}", path.display()))
}

/// Mark a file as executable (`0o755`). No-op on Windows.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("failed to set permissions on {}", path.display()))
}

#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<()> {
    Ok(())
}

/// Resolve `path` against the current directory; `None` means the current directory.
pub fn absolute_dir(path: Option<&Path>) -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    Ok(match path {
        Some(p) if p.is_absolute() => p.to_path_buf(),
        Some(p) => cwd.join(p),
        None => cwd,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_copy_dir_all() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");

        fs::create_dir_all(src.join("GLFW")).unwrap();
        fs::write(src.join("GLFW/glfw3.h"), "content").unwrap();

        copy_dir_all(&src, &dst).unwrap();

        assert_eq!(
            fs::read_to_string(dst.join("GLFW/glfw3.h")).unwrap(),
            "content"
        );
    }

    #[test]
    fn test_recreate_dir_clears_contents() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("out");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("stale.txt"), "old").unwrap();

        recreate_dir(&dir).unwrap();

        assert!(dir.is_dir());
        assert!(!dir.join("stale.txt").exists());
    }

    #[test]
    fn test_copy_file_missing_source_fails() {
        let tmp = TempDir::new().unwrap();
        let err = copy_file(&tmp.path().join("nope"), &tmp.path().join("out/nope")).unwrap_err();
        assert!(err.to_string().contains("failed to copy"));
    }

    #[test]
    fn test_copy_into_keeps_name() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("LICENSE.md");
        fs::write(&src, "zlib").unwrap();

        copy_into(&src, &tmp.path().join("out")).unwrap();

        assert!(tmp.path().join("out/LICENSE.md").exists());
    }

    #[test]
    fn test_absolute_dir() {
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(absolute_dir(None).unwrap(), cwd);
        assert_eq!(absolute_dir(Some(Path::new("scripts"))).unwrap(), cwd.join("scripts"));

        let tmp = TempDir::new().unwrap();
        assert_eq!(absolute_dir(Some(tmp.path())).unwrap(), tmp.path());
    }
}
