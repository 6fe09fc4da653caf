//! The inference adapter boundary.
//!
//! The trained segmentation model is an external collaborator: the
//! pipeline only sees the [`Segmenter`] trait, a fixed-shape function
//! from normalized image tensor to per-pixel class probabilities.
//! Production uses the ONNX-backed implementation in `iriscope-onnx`;
//! tests inject stand-ins that return hand-built probability maps.

use crate::types::{ClassProbabilityMap, InferenceError, NormalizedTensor};

/// A 3-class eye segmentation model.
///
/// Implementations must be shareable across concurrent requests after
/// warmup; if the underlying engine is not reentrant, the
/// implementation is responsible for serializing calls.
pub trait Segmenter {
    /// Run the model on one normalized image tensor.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] when the backend fails or returns a
    /// tensor of an unexpected shape.
    fn infer(&self, input: &NormalizedTensor) -> Result<ClassProbabilityMap, InferenceError>;

    /// Run one zero-tensor inference to pay first-call costs up front.
    ///
    /// Called once at process startup, before serving traffic. A
    /// warmup failure is fatal to startup, never a per-request
    /// condition.
    ///
    /// # Errors
    ///
    /// Returns [`InferenceError`] when the warmup inference fails.
    fn warmup(&self) -> Result<(), InferenceError> {
        self.infer(&NormalizedTensor::zeros()).map(|_| ())
    }
}
