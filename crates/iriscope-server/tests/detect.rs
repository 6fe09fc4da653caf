//! End-to-end tests for the HTTP surface, with the model stubbed out.

#![allow(clippy::unwrap_used, clippy::cast_precision_loss)]

use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use http_body_util::BodyExt as _;
use ndarray::Array3;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use iriscope_pipeline::types::{ClassProbabilityMap, NormalizedTensor};
use iriscope_pipeline::{EyeClass, InferenceError, MODEL_SIZE, NUM_CLASSES, Segmenter};
use iriscope_server::{AppState, app};

/// A segmenter that returns one fixed probability map.
struct FakeModel(Array3<f32>);

impl FakeModel {
    /// One-hot map with a pupil disk (radius 40) inside an iris disk
    /// (radius 90), both centered in model space.
    fn eye() -> Self {
        Self(one_hot(|x, y| {
            let d = (x as f64 - 128.0).hypot(y as f64 - 128.0);
            if d <= 40.0 {
                EyeClass::Pupil
            } else if d <= 90.0 {
                EyeClass::Iris
            } else {
                EyeClass::Background
            }
        }))
    }

    fn blank() -> Self {
        Self(one_hot(|_, _| EyeClass::Background))
    }
}

impl Segmenter for FakeModel {
    fn infer(&self, _input: &NormalizedTensor) -> Result<ClassProbabilityMap, InferenceError> {
        ClassProbabilityMap::from_array(self.0.clone())
    }
}

/// A segmenter whose backend always fails.
struct BrokenModel;

impl Segmenter for BrokenModel {
    fn infer(&self, _input: &NormalizedTensor) -> Result<ClassProbabilityMap, InferenceError> {
        Err(InferenceError::Backend("engine offline".to_owned()))
    }
}

fn one_hot(painter: impl Fn(usize, usize) -> EyeClass) -> Array3<f32> {
    let mut probs = Array3::<f32>::zeros((MODEL_SIZE, MODEL_SIZE, NUM_CLASSES));
    for y in 0..MODEL_SIZE {
        for x in 0..MODEL_SIZE {
            probs[[y, x, painter(x, y).channel()]] = 1.0;
        }
    }
    probs
}

fn service(model: impl Segmenter + Send + Sync + 'static) -> Router {
    let state = AppState::new(Arc::new(model), "/models/test.onnx");
    app(state, &["http://localhost:8000".to_owned()])
}

fn eye_png() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(256, 256, image::Rgb([80, 60, 50]));
    let mut buf = Vec::new();
    let encoder = image::codecs::png::PngEncoder::new(&mut buf);
    image::ImageEncoder::write_image(
        encoder,
        img.as_raw(),
        img.width(),
        img.height(),
        image::ExtendedColorType::Rgb8,
    )
    .unwrap();
    buf
}

const BOUNDARY: &str = "iriscope-test-boundary";

fn multipart_request(field_name: &str, bytes: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
    body.extend_from_slice(
        format!(
            "Content-Disposition: form-data; name=\"{field_name}\"; filename=\"eye.png\"\r\n",
        )
        .as_bytes(),
    );
    body.extend_from_slice(b"Content-Type: image/png\r\n\r\n");
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

fn base64_request(image: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/detect/base64")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::to_vec(&json!({ "image": image })).unwrap(),
        ))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn multipart_detect_returns_circles() {
    let response = service(FakeModel::eye())
        .oneshot(multipart_request("image", &eye_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    // 256x256 input: model-space coordinates pass through unscaled.
    assert!((body["pupil"]["x"].as_f64().unwrap() - 128.0).abs() < 4.0);
    assert!((body["pupil"]["radius"].as_f64().unwrap() - 40.0).abs() < 4.0);
    assert!(body["iris"]["radius"].as_f64().unwrap() > 80.0);
    assert_eq!(body["confidence"]["pupil"].as_f64().unwrap(), 1.0);
    assert!(body["ratio"].as_f64().unwrap() > 0.0);
    assert_eq!(body["model_version"], "1.0.0");
    assert!(body["inference_ms"].as_f64().unwrap() >= 0.0);
}

#[tokio::test]
async fn multipart_missing_image_field_is_rejected() {
    let response = service(FakeModel::eye())
        .oneshot(multipart_request("photo", &eye_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("image"));
}

#[tokio::test]
async fn multipart_corrupt_image_is_rejected() {
    let response = service(FakeModel::eye())
        .oneshot(multipart_request("image", b"definitely not a png"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn base64_detect_accepts_bare_encoding() {
    let encoded = STANDARD.encode(eye_png());
    let response = service(FakeModel::eye())
        .oneshot(base64_request(&encoded))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["pupil"].is_object());
}

#[tokio::test]
async fn base64_detect_strips_data_url_prefix() {
    let encoded = format!("data:image/png;base64,{}", STANDARD.encode(eye_png()));
    let response = service(FakeModel::eye())
        .oneshot(base64_request(&encoded))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn base64_invalid_payload_is_rejected() {
    let response = service(FakeModel::eye())
        .oneshot(base64_request("!!! not base64 !!!"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("base64"));
}

#[tokio::test]
async fn oversized_image_is_rejected() {
    // 11 MiB of zeros is over the decoded-image cap but under the raw
    // body cap once base64-inflated.
    let encoded = STANDARD.encode(vec![0u8; 11 * 1024 * 1024]);
    let response = service(FakeModel::eye())
        .oneshot(base64_request(&encoded))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn blank_segmentation_yields_null_fields() {
    let response = service(FakeModel::blank())
        .oneshot(multipart_request("image", &eye_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert!(body["pupil"].is_null());
    assert!(body["iris"].is_null());
    assert!(body["ratio"].is_null());
    assert_eq!(body["confidence"]["pupil"].as_f64().unwrap(), 0.0);
}

#[tokio::test]
async fn model_failure_is_an_internal_error() {
    let response = service(BrokenModel)
        .oneshot(multipart_request("image", &eye_png()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert!(body["detail"].as_str().unwrap().contains("backend"));
}

#[tokio::test]
async fn cors_preflight_reflects_narrow_allowlist() {
    let response = service(FakeModel::blank())
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/detect")
                .header(header::ORIGIN, "http://localhost:8000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "content-type")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let headers = response.headers();
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_ALLOW_ORIGIN).unwrap(),
        "http://localhost:8000",
    );
    let methods = headers
        .get(header::ACCESS_CONTROL_ALLOW_METHODS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(methods.contains("POST"), "methods = {methods}");
    assert!(!methods.contains("DELETE"), "methods = {methods}");
    let allow_headers = headers
        .get(header::ACCESS_CONTROL_ALLOW_HEADERS)
        .unwrap()
        .to_str()
        .unwrap();
    assert!(
        allow_headers.eq_ignore_ascii_case("content-type"),
        "headers = {allow_headers}",
    );
}

#[tokio::test]
async fn health_reports_service_facts() {
    let service = service(FakeModel::blank());

    let first = service
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::OK);
    let body = json_body(first).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["model_loaded"], true);
    assert_eq!(body["model_path"], "/models/test.onnx");
    assert_eq!(body["version"], "2.0.0");

    // The counter increments after each response, so a second call
    // observes the first.
    let second = service
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body = json_body(second).await;
    assert!(body["requests_served"].as_u64().unwrap() >= 1);
}
