//! Build a prebuilt GLFW distribution.
//!
//! The result is `<system>_glfw_<version>.zip` in the working directory,
//! containing one `<system>_glfw_<version>/` folder with:
//!
//! ```text
//! include/GLFW/...        headers, from the debug install
//! debug/libglfw3.a        (glfw3.lib on Windows)
//! release/libglfw3.a
//! LICENSE.md
//! README.md
//! ```
//!
//! An unpacked copy of that folder is kept under `../prebuilt/`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::builder::CMakeProject;
use crate::core::{BuildConfiguration, GlfwSystem};
use crate::sources::GitCheckout;
use crate::util::archive::zip_directory;
use crate::util::fs::{copy_dir_all, copy_into, ensure_dir, recreate_dir};
use crate::util::process::{Executor, FailurePolicy};
use crate::util::shell::{Shell, Status};

/// Options for a GLFW build.
#[derive(Debug, Clone)]
pub struct GlfwOptions {
    /// Tag (or branch) to build, e.g. `3.4`
    pub version: String,

    pub system: GlfwSystem,

    /// Directory holding the checkout and receiving the archive
    pub work_dir: PathBuf,

    pub repository: String,

    /// Parallel jobs passed to `cmake --build`
    pub jobs: usize,

    /// How failed git/cmake steps are treated
    pub policy: FailurePolicy,
}

/// Paths used by a GLFW build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GlfwLayout {
    pub name: String,
    pub checkout: PathBuf,
    pub output_dir: PathBuf,
    pub archive: PathBuf,
}

impl GlfwLayout {
    pub fn new(work_dir: &Path, system: GlfwSystem, version: &str) -> Result<Self> {
        let name = format!("{}_glfw_{}", system, version);
        let prebuilt_dir = work_dir
            .parent()
            .with_context(|| {
                format!(
                    "working directory has no parent for `prebuilt`: {}",
                    work_dir.display()
                )
            })?
            .join("prebuilt");

        Ok(GlfwLayout {
            checkout: work_dir.join("glfw"),
            output_dir: prebuilt_dir.join(&name),
            archive: work_dir.join(format!("{}.zip", name)),
            name,
        })
    }

    pub fn build_dir(&self, config: BuildConfiguration) -> PathBuf {
        self.checkout.join("build").join(config.label())
    }

    pub fn install_dir(&self, config: BuildConfiguration) -> PathBuf {
        self.checkout.join("install").join(config.label())
    }
}

/// Run the whole pipeline. Returns the archive path.
pub fn build_glfw(opts: &GlfwOptions, exec: &dyn Executor, shell: &Shell) -> Result<PathBuf> {
    let layout = GlfwLayout::new(&opts.work_dir, opts.system, &opts.version)?;

    shell.note(format!("system: {}", opts.system));
    shell.note(format!("output directory: {}", layout.output_dir.display()));

    fetch_sources(opts, &layout, shell)?;

    recreate_dir(&layout.output_dir)?;
    shell.status(Status::Created, layout.output_dir.display());

    for config in BuildConfiguration::ALL {
        build_configuration(opts, &layout, config, exec, shell)?;
    }

    assemble(&layout)?;

    shell.status(Status::Packaging, format!("{}.zip", layout.name));
    zip_directory(&layout.output_dir, &layout.archive)?;
    shell.status(Status::Finished, layout.archive.display());

    Ok(layout.archive)
}

/// Clone if needed, then bring the checkout to the requested version.
fn fetch_sources(opts: &GlfwOptions, layout: &GlfwLayout, shell: &Shell) -> Result<()> {
    let checkout = GitCheckout::new(&opts.repository, &layout.checkout);

    if checkout.exists() {
        tracing::debug!("Reusing checkout at {}", checkout.path().display());
    } else {
        shell.status(Status::Cloning, checkout.remote());
        opts.policy.tolerate("clone", checkout.clone_repo())?;
    }

    shell.status(Status::Updating, format!("checking out {}", opts.version));
    opts.policy
        .tolerate("fetch", checkout.fetch(&opts.version))?;
    opts.policy
        .tolerate("checkout", checkout.checkout(&opts.version))?;

    Ok(())
}

/// Describe the CMake project for one configuration.
pub fn cmake_project(opts: &GlfwOptions, layout: &GlfwLayout, config: BuildConfiguration) -> CMakeProject {
    let project = CMakeProject::new(&layout.checkout, layout.build_dir(config))
        .install_prefix(layout.install_dir(config))
        .define("GLFW_BUILD_EXAMPLES", "OFF")
        .define("GLFW_BUILD_TESTS", "OFF")
        .define("GLFW_BUILD_DOCS", "OFF")
        // Visual Studio is multi-config; the configuration is chosen at build time.
        .build_type((!opts.system.is_windows()).then_some(config));

    match opts.system.osx_architectures() {
        Some(arch) => project.define("CMAKE_OSX_ARCHITECTURES", arch),
        None => project,
    }
}

/// Configure, build and install one configuration, then copy its library.
pub fn build_configuration(
    opts: &GlfwOptions,
    layout: &GlfwLayout,
    config: BuildConfiguration,
    exec: &dyn Executor,
    shell: &Shell,
) -> Result<()> {
    let project = cmake_project(opts, layout, config);

    shell.status(Status::Configuring, format!("GLFW {} ({})", opts.version, config));
    exec.run(&project.configure_command())?
        .handle(opts.policy)?;

    shell.status(Status::Building, format!("GLFW {} ({})", opts.version, config));
    let multi_config = opts.system.is_windows().then_some(config);
    exec.run(&project.install_command(multi_config, opts.jobs))?
        .handle(opts.policy)?;

    let destination = layout.output_dir.join(config.label());
    ensure_dir(&destination)?;

    let library = layout
        .install_dir(config)
        .join("lib")
        .join(opts.system.static_library());
    copy_into(&library, &destination)?;

    Ok(())
}

/// Copy headers (once, from the debug install), license and readme.
pub fn assemble(layout: &GlfwLayout) -> Result<()> {
    let headers = layout.install_dir(BuildConfiguration::Debug).join("include");
    copy_dir_all(&headers, &layout.output_dir.join("include"))?;

    for file in ["LICENSE.md", "README.md"] {
        copy_into(&layout.checkout.join(file), &layout.output_dir)?;
    }

    Ok(())
}
