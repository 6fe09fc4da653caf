//! iriscope-onnx: ONNX Runtime backend for the detection pipeline.
//!
//! Wraps an `ort` session behind the pipeline's [`Segmenter`] trait.
//! The session is loaded once at startup and shared across requests;
//! `ort` sessions require exclusive access to run, so calls are
//! serialized with a mutex.

use std::path::Path;
use std::sync::{Mutex, PoisonError};

use ort::session::Session;
use ort::session::builder::GraphOptimizationLevel;
use ort::value::Tensor;
use thiserror::Error;

use iriscope_pipeline::types::{ClassProbabilityMap, NormalizedTensor};
use iriscope_pipeline::{InferenceError, Segmenter};

/// Failure to bring a model file into a servable state.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The model file could not be read or parsed by ONNX Runtime.
    #[error("failed to load model: {0}")]
    Load(#[from] ort::Error),
    /// The model loaded but its warmup inference failed.
    #[error("model warmup failed: {0}")]
    Warmup(#[from] InferenceError),
}

/// A [`Segmenter`] backed by an ONNX Runtime session.
pub struct OnnxSegmenter {
    session: Mutex<Session>,
}

impl OnnxSegmenter {
    /// Load a model from an ONNX file.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] if the file is missing or not a
    /// valid ONNX graph.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let session = Session::builder()?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;
        Ok(Self {
            session: Mutex::new(session),
        })
    }

    /// Load a model and immediately run a zero-tensor warmup.
    ///
    /// This is the startup entry point: it surfaces broken models
    /// before the process starts accepting traffic.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::Load`] if loading fails and
    /// [`ModelError::Warmup`] if the warmup inference fails.
    pub fn load_and_warmup(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let model = Self::load(path)?;
        model.warmup()?;
        Ok(model)
    }
}

impl Segmenter for OnnxSegmenter {
    fn infer(&self, input: &NormalizedTensor) -> Result<ClassProbabilityMap, InferenceError> {
        let tensor = Tensor::from_array(input.to_batch())
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        // A poisoned lock means another inference panicked; the
        // session itself holds no partial state, so keep serving.
        let mut session = self
            .session
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| InferenceError::Backend(e.to_string()))?;
        let output = outputs[0]
            .try_extract_array::<f32>()
            .map_err(|e| InferenceError::Backend(e.to_string()))?;

        ClassProbabilityMap::from_batch(&output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_file_is_a_load_error() {
        let result = OnnxSegmenter::load("/nonexistent/model.onnx");
        assert!(matches!(result, Err(ModelError::Load(_))));
    }
}
