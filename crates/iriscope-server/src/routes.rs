//! Request handlers for the detection endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Multipart, State};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use serde_json::json;

use iriscope_pipeline::{Detection, detect};

use crate::error::AppError;
use crate::state::AppState;

/// Largest accepted image payload after any base64 decoding.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Version tag of the trained segmentation model.
const MODEL_VERSION: &str = "1.0.0";

/// Version tag of the HTTP API, reported by the health endpoint.
const API_VERSION: &str = "2.0.0";

/// A detection result plus the model version that produced it.
#[derive(Debug, Serialize)]
pub struct DetectionResponse {
    #[serde(flatten)]
    detection: Detection,
    model_version: &'static str,
}

/// Body of `POST /detect/base64`.
#[derive(Debug, Deserialize)]
pub struct Base64Request {
    /// Base64-encoded image bytes, with or without a data-URL prefix.
    image: String,
}

/// `POST /detect`: multipart upload with the image under the `image`
/// field.
///
/// # Errors
///
/// Returns a 400 for a missing field or undecodable image, 413 over
/// the size limit, and 500 when inference fails.
pub async fn detect_upload(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<DetectionResponse>, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() == Some("image") {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("failed to read image field: {e}")))?;
            return run_detection(&state, bytes.to_vec()).await.map(Json);
        }
    }
    Err(AppError::BadRequest(
        "missing multipart field 'image'".to_owned(),
    ))
}

/// `POST /detect/base64`: JSON body with a base64-encoded image.
///
/// Accepts both bare base64 and data URLs
/// (`data:image/png;base64,...`); the prefix is stripped before
/// decoding.
///
/// # Errors
///
/// Returns a 400 for malformed base64 or an undecodable image, 413
/// over the size limit, and 500 when inference fails.
pub async fn detect_base64(
    State(state): State<AppState>,
    Json(request): Json<Base64Request>,
) -> Result<Json<DetectionResponse>, AppError> {
    let trimmed = request.image.trim();
    let encoded = if trimmed.starts_with("data:") {
        trimmed.split_once(',').map_or(trimmed, |(_, rest)| rest)
    } else {
        trimmed
    };
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|e| AppError::BadRequest(format!("invalid base64 image data: {e}")))?;
    run_detection(&state, bytes).await.map(Json)
}

/// `GET /health`: liveness plus basic service facts.
pub async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "model_loaded": true,
        "model_path": state.model_path,
        "requests_served": state.requests_served(),
        "version": API_VERSION,
    }))
}

/// Size-check the payload, then run the pipeline off the async
/// runtime.
async fn run_detection(state: &AppState, bytes: Vec<u8>) -> Result<DetectionResponse, AppError> {
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::PayloadTooLarge(
            "image exceeds the 10 MiB limit".to_owned(),
        ));
    }

    // The pipeline is CPU-bound (decode, inference, contour tracing);
    // keep it off the async worker threads.
    let model = Arc::clone(&state.model);
    let detection = tokio::task::spawn_blocking(move || detect(&bytes, model.as_ref()))
        .await
        .map_err(|e| AppError::Internal(format!("detection task failed: {e}")))??;

    Ok(DetectionResponse {
        detection,
        model_version: MODEL_VERSION,
    })
}
