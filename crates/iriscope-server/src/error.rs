//! HTTP error mapping.
//!
//! All error responses share one body shape: `{"detail": "<message>"}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use iriscope_pipeline::DetectError;

/// A request-scoped failure with an HTTP status.
#[derive(Debug)]
pub enum AppError {
    /// The client sent something unusable: missing field, undecodable
    /// image, malformed base64.
    BadRequest(String),
    /// The image exceeds the size limit.
    PayloadTooLarge(String),
    /// The pipeline failed for reasons the client cannot fix.
    Internal(String),
}

impl From<DetectError> for AppError {
    fn from(err: DetectError) -> Self {
        match err {
            DetectError::EmptyInput | DetectError::ImageDecode(_) => {
                Self::BadRequest(err.to_string())
            }
            DetectError::Inference(_) => Self::Internal(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            Self::BadRequest(detail) => (StatusCode::BAD_REQUEST, detail),
            Self::PayloadTooLarge(detail) => (StatusCode::PAYLOAD_TOO_LARGE, detail),
            Self::Internal(detail) => {
                tracing::error!(detail = %detail, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, detail)
            }
        };
        (status, Json(json!({ "detail": detail }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use iriscope_pipeline::InferenceError;

    #[test]
    fn empty_input_maps_to_bad_request() {
        let err = AppError::from(DetectError::EmptyInput);
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn inference_failure_maps_to_internal() {
        let err = AppError::from(DetectError::Inference(InferenceError::Backend(
            "engine offline".to_owned(),
        )));
        assert!(matches!(err, AppError::Internal(_)));
    }

    #[test]
    fn response_carries_detail_body() {
        let response = AppError::BadRequest("bad image".to_owned()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
