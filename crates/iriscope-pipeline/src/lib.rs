//! iriscope-pipeline: Pure pupil/iris detection pipeline (sans-IO).
//!
//! Converts eye-image bytes into fitted pupil and iris circles
//! through: decode/normalize -> segmentation inference -> argmax mask
//! -> per-class circle fitting -> coordinate rescaling -> assembly.
//!
//! This crate has **no I/O dependencies** -- it operates on in-memory
//! byte slices and a caller-supplied [`Segmenter`]. Model loading and
//! HTTP handling live in `iriscope-onnx` and `iriscope-server`.

pub mod assemble;
pub mod fit;
pub mod mask;
pub mod preprocess;
pub mod rescale;
pub mod segment;
pub mod types;

pub use segment::Segmenter;
pub use types::{
    Circle, Confidence, Detection, DetectError, Dimensions, EyeClass, InferenceError, MODEL_SIZE,
    NUM_CLASSES,
};

use std::time::Instant;

/// Run the full detection pipeline on one image.
///
/// Takes raw image bytes (PNG, JPEG) and a segmentation model, and
/// produces a [`Detection`] with the pupil and iris circles in
/// original-image coordinates, per-class confidences, and the
/// pupil/iris radius ratio when both circles are present.
///
/// A healthy image where one or both structures are simply not
/// visible is not an error: the corresponding circles are absent and
/// their confidences are 0.
///
/// # Pipeline steps
///
/// 1. Decode, resize to 256x256, normalize to [0, 1]
/// 2. Segmentation inference (3 class probabilities per pixel)
/// 3. Per-pixel argmax class mask
/// 4. Circle fit per class (largest region, moment centroid,
///    effective radius)
/// 5. Rescale circles to original image coordinates
/// 6. Assemble: confidences, ratio, rounding, timing
///
/// # Errors
///
/// Returns [`DetectError::EmptyInput`] if `image_bytes` is empty.
/// Returns [`DetectError::ImageDecode`] if the bytes are not a valid
/// raster image.
/// Returns [`DetectError::Inference`] if the model fails or returns a
/// malformed output tensor.
pub fn detect<S: Segmenter + ?Sized>(
    image_bytes: &[u8],
    model: &S,
) -> Result<Detection, DetectError> {
    let start = Instant::now();

    // 1. Decode and normalize.
    let (tensor, original) = preprocess::preprocess(image_bytes)?;

    // 2. Inference.
    let probs = model.infer(&tensor)?;

    // 3. Argmax mask.
    let mask = mask::class_mask(&probs);

    // 4-5. Fit a circle per class and map it back to image coordinates.
    let pupil = rescale::rescale(fit::fit_circle(&mask, EyeClass::Pupil), original);
    let iris = rescale::rescale(fit::fit_circle(&mask, EyeClass::Iris), original);

    // 6. Confidences over mask membership, then assembly.
    let pupil_confidence = mask::class_confidence(&probs, &mask, EyeClass::Pupil);
    let iris_confidence = mask::class_confidence(&probs, &mask, EyeClass::Iris);

    Ok(assemble::assemble(
        pupil,
        iris,
        pupil_confidence,
        iris_confidence,
        start.elapsed(),
    ))
}
