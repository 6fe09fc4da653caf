//! Shared application state.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use iriscope_pipeline::Segmenter;

/// State shared by all request handlers.
///
/// Cloning is cheap; the model and the request counter are behind
/// `Arc`s.
#[derive(Clone)]
pub struct AppState {
    /// The segmentation model, behind the pipeline's adapter trait so
    /// tests can inject stand-ins.
    pub model: Arc<dyn Segmenter + Send + Sync>,
    /// Where the model was loaded from, reported by the health
    /// endpoint.
    pub model_path: String,
    requests: Arc<AtomicU64>,
}

impl AppState {
    /// Build state around a warmed-up model.
    pub fn new(model: Arc<dyn Segmenter + Send + Sync>, model_path: impl Into<String>) -> Self {
        Self {
            model,
            model_path: model_path.into(),
            requests: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Count one served request and return the new total.
    pub fn count_request(&self) -> u64 {
        self.requests.fetch_add(1, Ordering::Relaxed) + 1
    }

    /// Total requests served so far.
    #[must_use]
    pub fn requests_served(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}
