//! Image decoding, resizing, and normalization.
//!
//! Accepts raw image bytes (PNG, JPEG) and produces the fixed-shape
//! normalized tensor the segmentation model expects, plus the original
//! image dimensions needed to rescale results back.

// Pixel/tensor index conversions.
#![allow(clippy::cast_possible_truncation)]

use image::imageops::FilterType;
use ndarray::Array3;

use crate::types::{DetectError, Dimensions, NormalizedTensor, MODEL_SIZE};

/// Model-space side length for the `image` crate's u32 APIs.
const SIZE_PX: u32 = MODEL_SIZE as u32;

/// Decode raw image bytes into a normalized model input tensor.
///
/// The image is converted to RGB (the model's channel contract),
/// stretched to exactly 256x256 with bilinear interpolation, and
/// normalized to [0, 1] by dividing by 255. Aspect ratio is
/// intentionally not preserved; the rescaler compensates with
/// independent x/y scale factors.
///
/// Returns the tensor together with the original image dimensions.
///
/// # Errors
///
/// Returns [`DetectError::EmptyInput`] if `bytes` is empty.
/// Returns [`DetectError::ImageDecode`] if the bytes are not a valid
/// raster image.
pub fn preprocess(bytes: &[u8]) -> Result<(NormalizedTensor, Dimensions), DetectError> {
    if bytes.is_empty() {
        return Err(DetectError::EmptyInput);
    }

    let decoded = image::load_from_memory(bytes)?;
    let original = Dimensions {
        width: decoded.width(),
        height: decoded.height(),
    };

    let rgb = decoded.to_rgb8();
    let resized = image::imageops::resize(&rgb, SIZE_PX, SIZE_PX, FilterType::Triangle);

    let mut tensor = Array3::<f32>::zeros((MODEL_SIZE, MODEL_SIZE, 3));
    for (x, y, pixel) in resized.enumerate_pixels() {
        for (c, &value) in pixel.0.iter().enumerate() {
            tensor[[y as usize, x as usize, c]] = f32::from(value) / 255.0;
        }
    }

    Ok((NormalizedTensor::new(tensor), original))
}
