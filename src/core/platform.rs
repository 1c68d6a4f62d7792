//! Host platform descriptors.
//!
//! Both builders name their output after the platform they ran on, but they
//! disagree on the vocabulary: the GLFW distribution uses `win64`/`linux`/
//! `mac64`/`macArm64`, the MediaPipe tree uses `<arch>-<os>`. Neither falls
//! back to a default: anything unrecognized is a [`PlatformError`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Platform resolution failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlatformError {
    #[error("unknown target architecture `{0}`")]
    UnsupportedArch(String),

    #[error("unknown target system `{0}`")]
    UnsupportedOs(String),

    #[error("invalid system `{value}`; expected one of: {expected}")]
    InvalidSystem { value: String, expected: String },

    #[error("a system must be chosen on macOS; expected one of: mac64, macArm64")]
    SystemChoiceRequired,
}

fn normalize_os(os: &str) -> String {
    os.trim().to_ascii_lowercase()
}

/// Platform tag of a GLFW distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlfwSystem {
    Win64,
    Linux,
    Mac64,
    MacArm64,
}

impl GlfwSystem {
    /// The two choices offered on macOS.
    pub const MAC_CHOICES: [GlfwSystem; 2] = [GlfwSystem::Mac64, GlfwSystem::MacArm64];

    /// Whether the system for `os` has to be chosen by the user.
    pub fn requires_choice(os: &str) -> bool {
        matches!(normalize_os(os).as_str(), "macos" | "darwin")
    }

    /// Resolve the system tag for a host OS.
    ///
    /// Windows and Linux map directly; macOS needs `choice` to be one of
    /// `mac64`/`macArm64`.
    pub fn resolve(os: &str, choice: Option<&str>) -> Result<Self, PlatformError> {
        match normalize_os(os).as_str() {
            "windows" => Ok(GlfwSystem::Win64),
            "linux" => Ok(GlfwSystem::Linux),
            "macos" | "darwin" => {
                let choice = choice.ok_or(PlatformError::SystemChoiceRequired)?;
                let system: GlfwSystem = choice.parse()?;
                if !Self::MAC_CHOICES.contains(&system) {
                    return Err(PlatformError::InvalidSystem {
                        value: choice.to_string(),
                        expected: "mac64, macArm64".to_string(),
                    });
                }
                Ok(system)
            }
            other => Err(PlatformError::UnsupportedOs(other.to_string())),
        }
    }

    /// Resolve for the machine this process runs on.
    pub fn host(choice: Option<&str>) -> Result<Self, PlatformError> {
        Self::resolve(std::env::consts::OS, choice)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            GlfwSystem::Win64 => "win64",
            GlfwSystem::Linux => "linux",
            GlfwSystem::Mac64 => "mac64",
            GlfwSystem::MacArm64 => "macArm64",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, GlfwSystem::Win64)
    }

    /// Value for `CMAKE_OSX_ARCHITECTURES`, on macOS only.
    pub fn osx_architectures(&self) -> Option<&'static str> {
        match self {
            GlfwSystem::Mac64 => Some("x86_64"),
            GlfwSystem::MacArm64 => Some("arm64"),
            GlfwSystem::Win64 | GlfwSystem::Linux => None,
        }
    }

    /// File name of the installed static library.
    pub fn static_library(&self) -> &'static str {
        if self.is_windows() {
            "glfw3.lib"
        } else {
            "libglfw3.a"
        }
    }
}

impl FromStr for GlfwSystem {
    type Err = PlatformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "win64" => Ok(GlfwSystem::Win64),
            "linux" => Ok(GlfwSystem::Linux),
            "mac64" => Ok(GlfwSystem::Mac64),
            "macArm64" => Ok(GlfwSystem::MacArm64),
            other => Err(PlatformError::InvalidSystem {
                value: other.to_string(),
                expected: "win64, linux, mac64, macArm64".to_string(),
            }),
        }
    }
}

impl fmt::Display for GlfwSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// CPU family supported by the MediaPipe builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    X86_64,
    Aarch64,
}

impl Arch {
    /// Parse a machine name as reported by the OS (`amd64`, `arm64`, ...).
    pub fn parse(machine: &str) -> Result<Self, PlatformError> {
        match machine.trim().to_ascii_lowercase().as_str() {
            "x86_64" | "amd64" => Ok(Arch::X86_64),
            "aarch64" | "arm64" => Ok(Arch::Aarch64),
            _ => Err(PlatformError::UnsupportedArch(machine.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "aarch64",
        }
    }

    /// Architecture name used in Bazel release file names.
    pub fn bazel_name(&self) -> &'static str {
        match self {
            Arch::X86_64 => "x86_64",
            Arch::Aarch64 => "arm64",
        }
    }
}

/// Operating system supported by the MediaPipe builder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Os {
    Windows,
    Darwin,
}

impl Os {
    pub fn parse(os: &str) -> Result<Self, PlatformError> {
        match normalize_os(os).as_str() {
            "windows" => Ok(Os::Windows),
            "macos" | "darwin" => Ok(Os::Darwin),
            _ => Err(PlatformError::UnsupportedOs(os.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Os::Windows => "windows",
            Os::Darwin => "darwin",
        }
    }

    pub fn is_windows(&self) -> bool {
        matches!(self, Os::Windows)
    }

    /// Suffix of executables on this OS.
    pub fn exe_suffix(&self) -> &'static str {
        if self.is_windows() {
            ".exe"
        } else {
            ""
        }
    }
}

/// `(arch, os)` pair the MediaPipe distribution is built for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MediapipePlatform {
    pub arch: Arch,
    pub os: Os,
}

impl MediapipePlatform {
    /// Resolve from an OS name and a machine name. Architecture is checked first.
    pub fn resolve(os: &str, machine: &str) -> Result<Self, PlatformError> {
        let arch = Arch::parse(machine)?;
        let os = Os::parse(os)?;
        Ok(MediapipePlatform { arch, os })
    }

    /// Resolve for the machine this process runs on.
    pub fn host() -> Result<Self, PlatformError> {
        Self::resolve(std::env::consts::OS, std::env::consts::ARCH)
    }

    /// Name of the output directory, e.g. `mediapipe-aarch64-darwin`.
    pub fn output_dir_name(&self) -> String {
        format!("mediapipe-{}", self)
    }
}

impl fmt::Display for MediapipePlatform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.arch.as_str(), self.os.as_str())
    }
}
