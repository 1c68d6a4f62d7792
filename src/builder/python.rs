//! Isolated Python environment used by the Bazel build.

use std::path::{Path, PathBuf};

use crate::core::platform::Os;
use crate::util::process::ProcessBuilder;

/// A `venv` directory and the executables inside it.
#[derive(Debug, Clone)]
pub struct VirtualEnv {
    dir: PathBuf,
    os: Os,
}

impl VirtualEnv {
    pub fn new(dir: impl Into<PathBuf>, os: Os) -> Self {
        VirtualEnv {
            dir: dir.into(),
            os,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn exists(&self) -> bool {
        self.dir.exists()
    }

    fn scripts_dir(&self) -> PathBuf {
        if self.os.is_windows() {
            self.dir.join("Scripts")
        } else {
            self.dir.join("bin")
        }
    }

    pub fn python(&self) -> PathBuf {
        self.scripts_dir()
            .join(format!("python{}", self.os.exe_suffix()))
    }

    pub fn pip(&self) -> PathBuf {
        self.scripts_dir().join(format!("pip{}", self.os.exe_suffix()))
    }

    /// `python -m venv <dir>` using the host interpreter.
    pub fn create_command(&self) -> ProcessBuilder {
        let host_python = if self.os.is_windows() {
            "python"
        } else {
            "python3"
        };
        ProcessBuilder::new(host_python)
            .args(["-m", "venv"])
            .arg(&self.dir)
    }

    /// `<venv>/pip install <packages>`
    pub fn install_command<I, S>(&self, packages: I) -> ProcessBuilder
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        ProcessBuilder::new(self.pip()).arg("install").args(packages)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let mac = VirtualEnv::new("venv", Os::Darwin);
        assert_eq!(mac.python(), Path::new("venv").join("bin").join("python"));
        assert_eq!(mac.pip(), Path::new("venv").join("bin").join("pip"));

        let win = VirtualEnv::new("venv", Os::Windows);
        assert_eq!(
            win.python(),
            Path::new("venv").join("Scripts").join("python.exe")
        );
    }

    #[test]
    fn test_commands() {
        let env = VirtualEnv::new("venv", Os::Darwin);
        assert_eq!(env.create_command().display_command(), "python3 -m venv venv");

        let install = env.install_command(["numpy"]);
        assert_eq!(install.get_args(), ["install", "numpy"]);
        assert_eq!(install.get_program(), env.pip());
    }
}
