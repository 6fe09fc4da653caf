//! Shared types for the iriscope detection pipeline.

use ndarray::{Array2, Array3, Array4, ArrayViewD, Axis, Ix3};
use serde::{Deserialize, Serialize};

/// Model-space resolution in pixels per side. The segmentation model
/// accepts and produces fixed 256x256 tensors; all geometry before
/// rescaling is expressed in this coordinate frame.
pub const MODEL_SIZE: usize = 256;

/// Number of segmentation classes: background, iris, pupil.
pub const NUM_CLASSES: usize = 3;

/// Segmentation class ids produced by the model.
///
/// The mapping is fixed by the trained model and must not change:
/// 0 = background, 1 = iris, 2 = pupil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EyeClass {
    /// Everything that is neither iris nor pupil.
    Background,
    /// The colored ring around the pupil.
    Iris,
    /// The dark central aperture.
    Pupil,
}

impl EyeClass {
    /// The integer class id as emitted by per-pixel argmax.
    #[must_use]
    pub const fn id(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Iris => 1,
            Self::Pupil => 2,
        }
    }

    /// The probability-tensor channel index for this class.
    #[must_use]
    pub const fn channel(self) -> usize {
        self.id() as usize
    }
}

/// Image dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

/// A fitted circle: center and radius in pixel units.
///
/// Before rescaling the coordinates are model-space; after rescaling
/// they are original-image pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Circle {
    /// Center, horizontal pixels from the left edge.
    pub x: f64,
    /// Center, vertical pixels from the top edge.
    pub y: f64,
    /// Radius of the disk with area equal to the detected region's
    /// pixel area. Not a boundary fit.
    pub radius: f64,
}

/// Per-class confidence scores: mean predicted probability over the
/// pixels argmax assigned to that class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Confidence {
    /// Pupil confidence, 0.0 when no pixel was classified as pupil.
    pub pupil: f64,
    /// Iris confidence, 0.0 when no pixel was classified as iris.
    pub iris: f64,
}

/// The result of running the full detection pipeline on one image.
///
/// Circles are in original-image coordinates. `ratio` is present only
/// when both circles exist and the iris radius is positive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    /// Fitted pupil circle, absent when no pupil region was found.
    pub pupil: Option<Circle>,
    /// Fitted iris circle, absent when no iris region was found.
    pub iris: Option<Circle>,
    /// Per-class confidence scores, rounded to 3 decimals.
    pub confidence: Confidence,
    /// Pupil radius over iris radius, rounded to 4 decimals.
    pub ratio: Option<f64>,
    /// Wall-clock pipeline time in milliseconds, rounded to 1 decimal.
    pub inference_ms: f64,
}

/// A per-pixel class-id map: argmax over the probability channels.
pub type ClassMask = Array2<u8>;

/// Fixed-shape (256, 256, 3) float tensor with values in [0, 1] and
/// RGB channel order. Created per request by the preprocessor and
/// discarded after inference.
#[derive(Debug, Clone)]
pub struct NormalizedTensor(Array3<f32>);

impl NormalizedTensor {
    /// Wrap a tensor the preprocessor built. The preprocessor always
    /// produces the right shape, so this stays crate-internal.
    pub(crate) const fn new(data: Array3<f32>) -> Self {
        Self(data)
    }

    /// An all-zero tensor, used for model warmup.
    #[must_use]
    pub fn zeros() -> Self {
        Self(Array3::zeros((MODEL_SIZE, MODEL_SIZE, 3)))
    }

    /// Borrow the underlying (256, 256, 3) array.
    #[must_use]
    pub const fn as_array(&self) -> &Array3<f32> {
        &self.0
    }

    /// Copy into a batch-of-one (1, 256, 256, 3) array for the
    /// inference adapter's wire shape.
    #[must_use]
    pub fn to_batch(&self) -> Array4<f32> {
        self.0.clone().insert_axis(Axis(0))
    }
}

/// Per-pixel class probability map of shape (256, 256, 3) over
/// {background, iris, pupil}. The values are assumed to form a
/// probability distribution over the last axis; this is not enforced.
#[derive(Debug, Clone)]
pub struct ClassProbabilityMap(Array3<f32>);

impl ClassProbabilityMap {
    /// Build a probability map from a (256, 256, 3) array.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::OutputShape`] when the shape is wrong.
    pub fn from_array(data: Array3<f32>) -> Result<Self, InferenceError> {
        if data.shape() != [MODEL_SIZE, MODEL_SIZE, NUM_CLASSES] {
            return Err(InferenceError::OutputShape {
                got: data.shape().to_vec(),
            });
        }
        Ok(Self(data))
    }

    /// Strip the batch axis off a (1, 256, 256, 3) adapter output.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError::OutputShape`] when the output tensor
    /// does not have the expected batch-of-one shape.
    pub fn from_batch(batch: &ArrayViewD<'_, f32>) -> Result<Self, InferenceError> {
        let bad_shape = || InferenceError::OutputShape {
            got: batch.shape().to_vec(),
        };
        if batch.shape() != [1, MODEL_SIZE, MODEL_SIZE, NUM_CLASSES] {
            return Err(bad_shape());
        }
        let map = batch
            .index_axis(Axis(0), 0)
            .to_owned()
            .into_dimensionality::<Ix3>()
            .map_err(|_| bad_shape())?;
        Ok(Self(map))
    }

    /// Borrow the underlying (256, 256, 3) array.
    #[must_use]
    pub const fn as_array(&self) -> &Array3<f32> {
        &self.0
    }
}

/// Errors produced by the inference adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    /// The backend engine failed to execute the model.
    #[error("inference backend error: {0}")]
    Backend(String),

    /// The model returned a tensor of an unexpected shape.
    #[error("model output has shape {got:?}, expected [1, 256, 256, 3]")]
    OutputShape {
        /// The shape actually returned.
        got: Vec<usize>,
    },
}

/// Errors that can occur during a detection run.
///
/// Absence of a detected region is never an error; it is encoded as an
/// absent [`Circle`] in the [`Detection`].
#[derive(Debug, thiserror::Error)]
pub enum DetectError {
    /// The input image bytes were empty.
    #[error("input image data is empty")]
    EmptyInput,

    /// Failed to decode the input image.
    #[error("failed to decode image: {0}")]
    ImageDecode(#[from] image::ImageError),

    /// The inference adapter failed.
    #[error(transparent)]
    Inference(#[from] InferenceError),
}
