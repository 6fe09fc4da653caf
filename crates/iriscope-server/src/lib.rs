//! iriscope-server: HTTP surface for the detection pipeline.
//!
//! Exposes three endpoints: `POST /detect` (multipart upload),
//! `POST /detect/base64` (JSON body), and `GET /health`. All pipeline
//! work happens in `iriscope-pipeline`; this crate only adapts HTTP
//! to it.

use std::time::Instant;

use axum::Router;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, Method, header};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::routing::{get, post};
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;

/// Raw body cap. Larger than the image limit because a maximal image
/// arrives base64-inflated by 4/3 inside a JSON envelope.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

/// Build the service router.
///
/// `origins` is the CORS allowlist; entries that do not parse as
/// header values are logged and skipped.
#[must_use]
pub fn app(state: AppState, origins: &[String]) -> Router {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    let cors = CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/detect", post(routes::detect_upload))
        .route("/detect/base64", post(routes::detect_base64))
        .route("/health", get(routes::health))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            track_requests,
        ))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

/// Count the request and emit one structured log line per response.
async fn track_requests(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let start = Instant::now();

    let response = next.run(request).await;

    let total = state.count_request();
    tracing::info!(
        %method,
        path = %path,
        status = response.status().as_u16(),
        elapsed_ms = start.elapsed().as_secs_f64() * 1000.0,
        requests_served = total,
        "request",
    );
    response
}
