//! Source patches that adapt a MediaPipe checkout to a local OpenCV install.
//!
//! On Windows the vision C API additionally gets a `vision.dll` target, and
//! the C++20 designated initializers of `MpImage` are rewritten positionally
//! so MSVC in C++17 mode accepts them.

use crate::builder::{Location, Patch};
use crate::core::Os;

const VISION_BUILD: &str = "mediapipe/tasks/c/vision/BUILD";
const WORKSPACE: &str = "WORKSPACE";
const OPENCV_WINDOWS_BUILD: &str = "third_party/opencv_windows.BUILD";
const OPENCV_MACOS_BUILD: &str = "third_party/opencv_macos.BUILD";

/// OpenCV install location, relative to the MediaPipe checkout.
const OPENCV_INSTALL_PATH: &str = "    path = \"../opencv_install\"";

/// Sources that build an `MpImage` from an `ImageFrame`.
const IMAGE_FRAME_SOURCES: [&str; 4] = [
    "mediapipe/tasks/c/vision/image_embedder/image_embedder.cc",
    "mediapipe/tasks/c/vision/image_classifier/image_classifier.cc",
    "mediapipe/tasks/c/vision/hand_landmarker/hand_landmarker.cc",
    "mediapipe/tasks/c/vision/object_detector/object_detector.cc",
];

const IMAGE_FRAME_INITIALIZER: &str = "\
              MpImage::IMAGE_FRAME,
              {
                  static_cast<::ImageFormat>(image_frame->Format()),
                  image_frame->PixelData(),
                  image_frame->Width(),
                  image_frame->Height()}};";

const OPENCV_WINDOWS_SOURCES: &str = r#"        ":opt_build": glob([
            "x64/vc17/lib/opencv_*" + OPENCV_VERSION + ".lib",
            "x64/vc17/bin/opencv_*" + OPENCV_VERSION + ".dll",
        ]),
        ":dbg_build": glob([
            "x64/vc17/lib/opencv_*" + OPENCV_VERSION + "d.lib",
            "x64/vc17/bin/opencv_*" + OPENCV_VERSION + "d.dll",
        ]),
    }),
    hdrs = glob(["include/opencv4/opencv2/**/*.h*"]),"#;

/// The `vision.dll` shared-library target appended to the vision BUILD file.
fn vision_dll_target() -> Vec<&'static str> {
    vec![
        "",
        "cc_binary(",
        "    name = \"vision.dll\",",
        "    linkshared = True,",
        "    tags = [",
        "        \"manual\",",
        "        \"nobuilder\",",
        "        \"notap\",",
        "    ],",
        "    deps = VISION_LIBRARIES,",
        ")",
    ]
}

/// Patches for a fresh checkout on `os`, in application order.
pub fn patches(os: Os, opencv_version: &str) -> Vec<Patch> {
    match os {
        Os::Windows => windows_patches(opencv_version),
        Os::Darwin => macos_patches(),
    }
}

fn windows_patches(opencv_version: &str) -> Vec<Patch> {
    let version_suffix = opencv_version.replace('.', "");

    let mut patches = vec![
        Patch::append(VISION_BUILD, vision_dll_target()),
        Patch::replace_line(
            WORKSPACE,
            Location::after("name = \"windows_opencv\"", "path ="),
            OPENCV_INSTALL_PATH,
        ),
        Patch::replace_line(
            OPENCV_WINDOWS_BUILD,
            Location::anchor("OPENCV_VERSION = "),
            format!("OPENCV_VERSION = \"{}\"", version_suffix),
        ),
        Patch::replace_section(
            OPENCV_WINDOWS_BUILD,
            Location::anchor("\":opt_build\":"),
            OPENCV_WINDOWS_SOURCES,
        ),
    ];

    patches.extend(IMAGE_FRAME_SOURCES.iter().map(|source| {
        Patch::replace_section(
            *source,
            Location::anchor(".type = MpImage::IMAGE_FRAME"),
            IMAGE_FRAME_INITIALIZER,
        )
    }));

    patches
}

fn macos_patches() -> Vec<Patch> {
    vec![
        Patch::replace_line(
            WORKSPACE,
            Location::after("name = \"macos_opencv\"", "path ="),
            OPENCV_INSTALL_PATH,
        ),
        Patch::replace_line(
            OPENCV_MACOS_BUILD,
            Location::anchor("PREFIX = "),
            "PREFIX = \"\"",
        ),
        Patch::replace_line(
            OPENCV_MACOS_BUILD,
            Location::anchor("hdrs = glob([paths.join(PREFIX,"),
            "    hdrs = glob([paths.join(PREFIX, \"include/opencv4/opencv2/**/*.h*\")]),",
        ),
        Patch::replace_line(
            OPENCV_MACOS_BUILD,
            Location::anchor("includes = [paths.join(PREFIX,"),
            "    includes = [paths.join(PREFIX, \"include/opencv4\")],",
        ),
    ]
}
