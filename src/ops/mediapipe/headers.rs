//! Public headers of the MediaPipe Tasks C API shipped in the distribution.

use std::path::Path;

use anyhow::Result;

use crate::util::fs::copy_file;

/// Root of the C API inside the checkout, and inside `include/` of the output.
pub const C_API_ROOT: &str = "mediapipe/tasks/c";

/// Headers relative to [`C_API_ROOT`].
pub const HEADERS: [&str; 21] = [
    "components/containers/category.h",
    "components/containers/classification_result.h",
    "components/containers/detection_result.h",
    "components/containers/embedding_result.h",
    "components/containers/keypoint.h",
    "components/containers/landmark.h",
    "components/containers/rect.h",
    "components/processors/classifier_options.h",
    "components/processors/embedder_options.h",
    "core/base_options.h",
    "text/language_detector/language_detector.h",
    "text/text_classifier/text_classifier.h",
    "text/text_embedder/text_embedder.h",
    "vision/core/common.h",
    "vision/gesture_recognizer/gesture_recognizer_result.h",
    "vision/gesture_recognizer/gesture_recognizer.h",
    "vision/hand_landmarker/hand_landmarker_result.h",
    "vision/hand_landmarker/hand_landmarker.h",
    "vision/image_classifier/image_classifier.h",
    "vision/image_embedder/image_embedder.h",
    "vision/object_detector/object_detector.h",
];

/// Copy [`HEADERS`] from `checkout` to `<output>/include/`, keeping sub-paths.
pub fn copy_headers(checkout: &Path, output_dir: &Path) -> Result<()> {
    let src_root = checkout.join(C_API_ROOT);
    let dst_root = output_dir.join("include").join(C_API_ROOT);

    for header in HEADERS {
        copy_file(&src_root.join(header), &dst_root.join(header))?;
    }

    Ok(())
}
