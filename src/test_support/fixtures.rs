//! On-disk fixtures for pipeline tests.
//!
//! Each fixture lays out the directories a pipeline expects to find after
//! its external tools have run, so the copy and packaging stages can be
//! tested with a [`MockExecutor`](super::MockExecutor) in place of cmake or bazel.

use std::path::{Path, PathBuf};

use crate::core::{BuildConfiguration, GlfwSystem, Os};
use crate::ops::mediapipe::headers::{C_API_ROOT, HEADERS};

fn write(path: &Path, contents: &str) {
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

/// Turn `dir` into a git repository with a single commit of everything in it,
/// tagged `tag`, for use as a local clone source.
pub fn init_upstream(dir: &Path, tag: &str) {
    let repo = git2::Repository::init(dir).unwrap();
    let mut index = repo.index().unwrap();
    index
        .add_all(["*"].iter(), git2::IndexAddOption::FORCE, None)
        .unwrap();
    index.write().unwrap();

    let tree = repo.find_tree(index.write_tree().unwrap()).unwrap();
    let sig = git2::Signature::now("test", "test@example.com").unwrap();
    let commit = repo
        .commit(Some("HEAD"), &sig, &sig, "import", &tree, &[])
        .unwrap();
    repo.tag_lightweight(tag, &repo.find_object(commit, None).unwrap(), false)
        .unwrap();
}

/// A GLFW checkout with both configurations already installed.
#[derive(Debug, Clone)]
pub struct GlfwFixture {
    /// `<root>/scripts`, so that `../prebuilt` stays inside the temp dir.
    pub work_dir: PathBuf,
    pub checkout: PathBuf,
}

impl GlfwFixture {
    pub fn create(root: &Path, system: GlfwSystem) -> Self {
        let work_dir = root.join("scripts");
        let checkout = work_dir.join("glfw");

        write(&checkout.join("LICENSE.md"), "zlib/libpng license");
        write(&checkout.join("README.md"), "# GLFW");
        write(&checkout.join("CMakeLists.txt"), "project(GLFW C)");

        for config in BuildConfiguration::ALL {
            let install = checkout.join("install").join(config.label());
            write(
                &install.join("lib").join(system.static_library()),
                config.label(),
            );
            write(
                &install.join("include/GLFW/glfw3.h"),
                &format!("// {} install", config.label()),
            );
            write(
                &install.join("include/GLFW/glfw3native.h"),
                &format!("// {} install", config.label()),
            );
        }

        GlfwFixture { work_dir, checkout }
    }
}

const WORKSPACE: &str = r#"workspace(name = "mediapipe")

load("@bazel_tools//tools/build_defs/repo:http.bzl", "http_archive")

new_local_repository(
    name = "linux_opencv",
    build_file = "@//third_party:opencv_linux.BUILD",
    path = "/usr",
)

new_local_repository(
    name = "macos_opencv",
    build_file = "@//third_party:opencv_macos.BUILD",
    # For local MacOS builds, the path should point to an opencv@3 installation.
    # If you edit the path here, you will also need to update the corresponding
    # prefix in "opencv_macos.BUILD".
    path = "/usr/local",
)

new_local_repository(
    name = "windows_opencv",
    build_file = "@//third_party:opencv_windows.BUILD",
    path = "C:\\opencv\\build",
)
"#;

const OPENCV_WINDOWS_BUILD: &str = r#"# Description:
#   OpenCV libraries for video/image processing on Windows

licenses(["notice"])  # BSD license

exports_files(["LICENSE"])

OPENCV_VERSION = "3410"  # 3.4.10

config_setting(
    name = "opt_build",
    values = {"compilation_mode": "opt"},
)

config_setting(
    name = "dbg_build",
    values = {"compilation_mode": "dbg"},
)

# The following build rule assumes that the executable "opencv-3.4.10-vc14_vc15.exe"
# is downloaded and the files are extracted to local.
# If you install OpenCV separately, please modify the build rule accordingly.
cc_library(
    name = "opencv",
    srcs = select({
        ":opt_build": [
            "x64/vc15/lib/opencv_world" + OPENCV_VERSION + ".lib",
            "x64/vc15/bin/opencv_world" + OPENCV_VERSION + ".dll",
        ],
        ":dbg_build": [
            "x64/vc15/lib/opencv_world" + OPENCV_VERSION + "d.lib",
            "x64/vc15/bin/opencv_world" + OPENCV_VERSION + "d.dll",
        ],
    }),
    hdrs = glob(["include/opencv2/**/*.h*"]),
    includes = ["include/"],
    linkstatic = 1,
    visibility = ["//visibility:public"],
)
"#;

const OPENCV_MACOS_BUILD: &str = r#"# Description:
#   OpenCV libraries for video/image processing on MacOS

load("@bazel_skylib//lib:paths.bzl", "paths")

licenses(["notice"])  # BSD license

exports_files(["LICENSE"])

# The path to OpenCV is a combination of the path set for "macos_opencv"
# in the WORKSPACE file and the prefix here.
PREFIX = "opt/opencv@3"

cc_library(
    name = "opencv",
    srcs = glob(
        [
            paths.join(PREFIX, "lib/libopencv_core.dylib"),
            paths.join(PREFIX, "lib/libopencv_calib3d.dylib"),
            paths.join(PREFIX, "lib/libopencv_features2d.dylib"),
            paths.join(PREFIX, "lib/libopencv_highgui.dylib"),
            paths.join(PREFIX, "lib/libopencv_imgcodecs.dylib"),
            paths.join(PREFIX, "lib/libopencv_imgproc.dylib"),
            paths.join(PREFIX, "lib/libopencv_video.dylib"),
            paths.join(PREFIX, "lib/libopencv_videoio.dylib"),
        ],
    ),
    hdrs = glob([paths.join(PREFIX, "include/opencv2/**/*.h*")]),
    includes = [paths.join(PREFIX, "include/")],
    linkstatic = 1,
    visibility = ["//visibility:public"],
)
"#;

const VISION_BUILD: &str = r#"package(default_visibility = ["//mediapipe/tasks:internal"])

licenses(["notice"])

VISION_LIBRARIES = [
    "//mediapipe/tasks/c/vision/image_classifier:image_classifier_lib",
    "//mediapipe/tasks/c/vision/image_embedder:image_embedder_lib",
    "//mediapipe/tasks/c/vision/object_detector:object_detector_lib",
]

cc_library(
    name = "vision",
    deps = VISION_LIBRARIES,
)
"#;

fn image_frame_source(task: &str) -> String {
    format!(
        r#"#include "mediapipe/tasks/c/vision/{task}/{task}.h"

namespace mediapipe::tasks::c::vision::{task} {{

namespace {{

MpImage ToMpImage(const Image& image) {{
  auto image_frame = image.GetImageFrameSharedPtr();
  MpImage mp_image = {{
          .type = MpImage::IMAGE_FRAME,
          .image_frame = {{
              .format = static_cast<::ImageFormat>(image_frame->Format()),
              .image_buffer = image_frame->PixelData(),
              .width = image_frame->Width(),
              .height = image_frame->Height()}}}};
  return mp_image;
}}

}}  // namespace

}}  // namespace mediapipe::tasks::c::vision::{task}
"#
    )
}

/// An unpatched MediaPipe checkout containing the files the patches touch.
#[derive(Debug, Clone)]
pub struct MediapipeCheckoutFixture {
    root: PathBuf,
}

impl MediapipeCheckoutFixture {
    pub const WORKSPACE: &'static str = WORKSPACE;

    pub fn create(dir: &Path) -> Self {
        let root = dir.join("mediapipe");

        write(&root.join("WORKSPACE"), WORKSPACE);
        write(&root.join("LICENSE"), "Apache License 2.0");
        write(&root.join("third_party/opencv_windows.BUILD"), OPENCV_WINDOWS_BUILD);
        write(&root.join("third_party/opencv_macos.BUILD"), OPENCV_MACOS_BUILD);
        write(&root.join("mediapipe/tasks/c/vision/BUILD"), VISION_BUILD);

        for task in [
            "image_embedder",
            "image_classifier",
            "hand_landmarker",
            "object_detector",
        ] {
            write(
                &root
                    .join("mediapipe/tasks/c/vision")
                    .join(task)
                    .join(format!("{}.cc", task)),
                &image_frame_source(task),
            );
        }

        for header in HEADERS {
            write(
                &root.join(C_API_ROOT).join(header),
                &format!("// {}", header),
            );
        }

        MediapipeCheckoutFixture { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read a file relative to the checkout root.
    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.root.join(relative)).unwrap()
    }
}

/// A fully prepared `mediapipe_build/` directory, as left by a previous run,
/// with Bazel outputs for `os` already in `bazel-bin`.
#[derive(Debug, Clone)]
pub struct MediapipeEnvFixture {
    pub env_dir: PathBuf,
    checkout: MediapipeCheckoutFixture,
}

impl MediapipeEnvFixture {
    pub const WORKSPACE: &'static str = WORKSPACE;

    pub fn create(work_dir: &Path, os: Os) -> Self {
        let env_dir = work_dir.join("mediapipe_build");
        let checkout = MediapipeCheckoutFixture::create(&env_dir);

        let outputs = checkout.root().join("bazel-bin").join(C_API_ROOT).join("vision");
        if os.is_windows() {
            write(&outputs.join("vision.dll"), "dll");
            write(&outputs.join("vision.dll.if.lib"), "import library");
        } else {
            write(&outputs.join("libvision.dylib"), "dylib");
        }

        let bazel = format!("bazel/bazel{}", os.exe_suffix());
        write(&env_dir.join(bazel), "");
        write(&env_dir.join("venv/pyvenv.cfg"), "home = /usr/bin");
        write(&env_dir.join("opencv/CMakeLists.txt"), "");
        write(&env_dir.join("opencv_contrib/modules/README.md"), "");
        write(&env_dir.join("opencv_install/include/opencv4/opencv2/core.hpp"), "");

        MediapipeEnvFixture { env_dir, checkout }
    }

    pub fn mediapipe(&self) -> PathBuf {
        self.checkout.root().to_path_buf()
    }

    pub fn read_workspace(&self) -> String {
        self.checkout.read("WORKSPACE")
    }
}
