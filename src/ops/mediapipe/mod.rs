//! Build a prebuilt MediaPipe vision C API distribution.
//!
//! Everything lives under `<work>/mediapipe_build/`:
//!
//! ```text
//! mediapipe/              patched checkout
//! bazel/bazel[.exe]       pinned Bazel binary
//! venv/                   Python with numpy, used by the Bazel build
//! opencv/ opencv_contrib/ OpenCV sources
//! opencv_build/           OpenCV CMake build tree
//! opencv_install/         OpenCV install prefix, referenced by the patches
//! mediapipe-<arch>-<os>/  the distribution
//! ```
//!
//! Each preparation step is skipped when its directory already exists (for
//! Bazel, when the binary exists), so a re-run only repeats the Bazel builds
//! and the copies.

pub mod headers;
pub mod patches;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::bazel::{self, BazelBuild};
use crate::builder::patch::apply_all;
use crate::builder::{CMakeProject, VirtualEnv};
use crate::core::{BuildConfiguration, MediapipePlatform};
use crate::sources::GitCheckout;
use crate::util::config::Config;
use crate::util::download::download_file;
use crate::util::fs::{copy_file, copy_into, ensure_dir, make_executable, recreate_dir};
use crate::util::process::{Executor, FailurePolicy};
use crate::util::shell::{Shell, Status};

pub use headers::{copy_headers, HEADERS};

/// Name of the environment directory inside the working directory.
pub const ENV_DIR: &str = "mediapipe_build";

const BAZEL_SH: &str = "C:/Program Files/Git/bin/sh.exe";
const DLL_EXPORT_COPT: &str = "/DMP_EXPORT=__declspec(dllexport)";
const VISION_PACKAGE: &str = "//mediapipe/tasks/c/vision";

/// Options for a MediaPipe build.
#[derive(Debug, Clone)]
pub struct MediapipeOptions {
    pub platform: MediapipePlatform,

    /// Directory that holds `mediapipe_build/`
    pub work_dir: PathBuf,

    pub repository: String,
    /// MediaPipe tag, e.g. `v0.10.9`
    pub version: String,

    pub opencv_repository: String,
    pub opencv_contrib_repository: String,
    pub opencv_version: String,
    pub opencv_jobs: usize,

    pub bazel_version: String,
    pub bazel_sha256: Option<String>,

    /// How failed preparation steps are treated. Bazel failures always abort.
    pub policy: FailurePolicy,
}

impl MediapipeOptions {
    pub fn from_config(platform: MediapipePlatform, work_dir: impl Into<PathBuf>, config: &Config) -> Self {
        let mp = &config.mediapipe;
        MediapipeOptions {
            platform,
            work_dir: work_dir.into(),
            repository: mp.repository().to_string(),
            version: mp.version().to_string(),
            opencv_repository: mp.opencv_repository().to_string(),
            opencv_contrib_repository: mp.opencv_contrib_repository().to_string(),
            opencv_version: mp.opencv_version().to_string(),
            opencv_jobs: mp.opencv_jobs(),
            bazel_version: mp.bazel_version().to_string(),
            bazel_sha256: mp.bazel_sha256.clone(),
            policy: FailurePolicy::from_keep_going(config.keep_going()),
        }
    }
}

/// Paths used by a MediaPipe build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediapipeLayout {
    pub env_dir: PathBuf,
    pub mediapipe: PathBuf,
    pub bazel_dir: PathBuf,
    pub venv: PathBuf,
    pub opencv: PathBuf,
    pub opencv_contrib: PathBuf,
    pub opencv_build: PathBuf,
    pub opencv_install: PathBuf,
    pub output_dir: PathBuf,
}

impl MediapipeLayout {
    pub fn new(work_dir: &Path, platform: &MediapipePlatform) -> Self {
        let env_dir = work_dir.join(ENV_DIR);
        MediapipeLayout {
            mediapipe: env_dir.join("mediapipe"),
            bazel_dir: env_dir.join("bazel"),
            venv: env_dir.join("venv"),
            opencv: env_dir.join("opencv"),
            opencv_contrib: env_dir.join("opencv_contrib"),
            opencv_build: env_dir.join("opencv_build"),
            opencv_install: env_dir.join("opencv_install"),
            output_dir: env_dir.join(platform.output_dir_name()),
            env_dir,
        }
    }

    /// Bazel output directory of the vision C API package.
    pub fn vision_outputs(&self) -> PathBuf {
        self.mediapipe
            .join("bazel-bin")
            .join(headers::C_API_ROOT)
            .join("vision")
    }
}

/// Run the whole pipeline. Returns the output directory.
pub fn build_mediapipe(opts: &MediapipeOptions, exec: &dyn Executor, shell: &Shell) -> Result<PathBuf> {
    let layout = MediapipeLayout::new(&opts.work_dir, &opts.platform);
    let venv = VirtualEnv::new(&layout.venv, opts.platform.os);

    shell.note(format!("platform: {}", opts.platform));
    ensure_dir(&layout.env_dir)?;

    ensure_mediapipe(opts, &layout, shell)?;
    ensure_bazel(opts, &layout, shell)?;
    ensure_venv(opts, &venv, exec, shell)?;
    ensure_opencv_sources(opts, &layout, shell)?;
    ensure_opencv_build(opts, &layout, exec, shell)?;

    recreate_dir(&layout.output_dir)?;
    shell.status(Status::Created, layout.output_dir.display());

    for config in BuildConfiguration::ALL {
        build_vision_library(opts, &layout, &venv, config, exec, shell)?;
    }

    copy_headers(&layout.mediapipe, &layout.output_dir)?;
    copy_into(&layout.mediapipe.join("LICENSE"), &layout.output_dir)?;

    shell.status(Status::Finished, layout.output_dir.display());
    Ok(layout.output_dir)
}

/// Clone, check out and patch MediaPipe. An existing checkout is left untouched.
fn ensure_mediapipe(opts: &MediapipeOptions, layout: &MediapipeLayout, shell: &Shell) -> Result<()> {
    let checkout = GitCheckout::new(&opts.repository, &layout.mediapipe);
    if checkout.exists() {
        shell.status(Status::Skipped, "mediapipe checkout exists");
        return Ok(());
    }

    shell.status(Status::Cloning, checkout.remote());
    if opts
        .policy
        .tolerate("clone mediapipe", checkout.clone_repo())?
        .is_none()
    {
        return Ok(());
    }
    opts.policy
        .tolerate("checkout mediapipe", checkout.checkout(&opts.version))?;

    shell.status(Status::Patching, format!("mediapipe for {}", opts.platform.os.as_str()));
    apply_all(
        checkout.path(),
        &patches::patches(opts.platform.os, &opts.opencv_version),
    )
}

/// Download Bazel unless the binary is already in place. A `bazel/` directory
/// left behind by a failed download does not count.
fn ensure_bazel(opts: &MediapipeOptions, layout: &MediapipeLayout, shell: &Shell) -> Result<()> {
    let binary = bazel::binary_path(&layout.bazel_dir, &opts.platform);
    if binary.is_file() {
        shell.status(Status::Skipped, "bazel exists");
        return Ok(());
    }

    ensure_dir(&layout.bazel_dir)?;
    let url = bazel::release_url(&opts.bazel_version, &opts.platform);

    shell.status(Status::Fetching, format!("bazel {}", opts.bazel_version));
    download_file(shell, &url, &binary, opts.bazel_sha256.as_deref())?;

    if !opts.platform.os.is_windows() {
        make_executable(&binary)?;
    }

    Ok(())
}

fn ensure_venv(opts: &MediapipeOptions, venv: &VirtualEnv, exec: &dyn Executor, shell: &Shell) -> Result<()> {
    if venv.exists() {
        shell.status(Status::Skipped, "venv exists");
        return Ok(());
    }

    shell.status(Status::Created, venv.dir().display());
    exec.run(&venv.create_command())?.handle(opts.policy)?;
    exec.run(&venv.install_command(["numpy"]))?
        .handle(opts.policy)?;

    Ok(())
}

fn ensure_opencv_sources(opts: &MediapipeOptions, layout: &MediapipeLayout, shell: &Shell) -> Result<()> {
    let sources = [
        (&opts.opencv_repository, &layout.opencv),
        (&opts.opencv_contrib_repository, &layout.opencv_contrib),
    ];

    for (remote, path) in sources {
        let checkout = GitCheckout::new(remote.as_str(), path.as_path());
        if checkout.exists() {
            tracing::debug!("Reusing checkout at {}", path.display());
            continue;
        }

        shell.status(Status::Cloning, checkout.remote());
        if opts
            .policy
            .tolerate("clone", checkout.clone_repo())?
            .is_some()
        {
            opts.policy
                .tolerate("checkout", checkout.checkout(&opts.opencv_version))?;
        }
    }

    Ok(())
}

/// The OpenCV CMake project, optionally with a fixed build type.
pub fn opencv_project(layout: &MediapipeLayout, build_type: Option<BuildConfiguration>) -> CMakeProject {
    CMakeProject::new(&layout.opencv, &layout.opencv_build)
        .install_prefix(&layout.opencv_install)
        .define("BUILD_ZLIB", "OFF")
        .define(
            "OPENCV_EXTRA_MODULES_PATH",
            layout.opencv_contrib.join("modules").display().to_string(),
        )
        .build_type(build_type)
}

fn ensure_opencv_build(
    opts: &MediapipeOptions,
    layout: &MediapipeLayout,
    exec: &dyn Executor,
    shell: &Shell,
) -> Result<()> {
    if layout.opencv_install.exists() {
        shell.status(Status::Skipped, "opencv install exists");
        return Ok(());
    }

    if opts.platform.os.is_windows() {
        let project = opencv_project(layout, None);
        shell.status(Status::Configuring, format!("OpenCV {}", opts.opencv_version));
        exec.run(&project.configure_command())?
            .handle(opts.policy)?;

        for config in BuildConfiguration::ALL {
            shell.status(Status::Building, format!("OpenCV {} ({})", opts.opencv_version, config));
            exec.run(&project.install_command(Some(config), opts.opencv_jobs))?
                .handle(opts.policy)?;
        }
    } else {
        for config in BuildConfiguration::ALL {
            let project = opencv_project(layout, Some(config));
            shell.status(Status::Configuring, format!("OpenCV {} ({})", opts.opencv_version, config));
            exec.run(&project.configure_command())?
                .handle(opts.policy)?;

            shell.status(Status::Building, format!("OpenCV {} ({})", opts.opencv_version, config));
            exec.run(&project.install_command(None, opts.opencv_jobs))?
                .handle(opts.policy)?;
        }
    }

    Ok(())
}

/// The Bazel invocation for one configuration.
pub fn vision_build(opts: &MediapipeOptions, layout: &MediapipeLayout, venv: &VirtualEnv, config: BuildConfiguration) -> BazelBuild {
    let program = bazel::binary_path(&layout.bazel_dir, &opts.platform);
    let python = venv.python();

    if opts.platform.os.is_windows() {
        BazelBuild::new(
            program,
            &layout.mediapipe,
            config,
            format!("{}:vision.dll", VISION_PACKAGE),
        )
        .copt(DLL_EXPORT_COPT)
        .action_env(
            "PYTHON_BIN_PATH",
            python.display().to_string().replace('\\', "/"),
        )
        .define("MEDIAPIPE_DISABLE_GPU", "1")
        .env("BAZEL_SH", BAZEL_SH)
    } else {
        BazelBuild::new(
            program,
            &layout.mediapipe,
            config,
            format!("{}:libvision.dylib", VISION_PACKAGE),
        )
        .action_env("PYTHON_BIN_PATH", python.display().to_string())
        .define("MEDIAPIPE_DISABLE_GPU", "1")
    }
}

/// Build the vision library for one configuration and copy it to the output.
pub fn build_vision_library(
    opts: &MediapipeOptions,
    layout: &MediapipeLayout,
    venv: &VirtualEnv,
    config: BuildConfiguration,
    exec: &dyn Executor,
    shell: &Shell,
) -> Result<()> {
    shell.status(Status::Building, format!("mediapipe vision ({})", config));
    exec.run(&vision_build(opts, layout, venv, config).command())?
        .handle(FailurePolicy::Abort)
        .with_context(|| format!("bazel build failed for {}", config))?;

    let outputs = layout.vision_outputs();
    let destination = layout.output_dir.join(config.label());

    if opts.platform.os.is_windows() {
        copy_file(
            &outputs.join("vision.dll"),
            &destination.join("bin").join("vision.dll"),
        )?;
        copy_file(
            &outputs.join("vision.dll.if.lib"),
            &destination.join("lib").join("vision.lib"),
        )?;
    } else {
        copy_file(
            &outputs.join("libvision.dylib"),
            &destination.join("lib").join("libvision.dylib"),
        )?;
    }

    shell.status(Status::Copied, format!("vision library ({})", config));
    Ok(())
}
