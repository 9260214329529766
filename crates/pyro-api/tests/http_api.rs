//! End-to-end tests against the router with in-memory detector backends.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use image::RgbImage;
use ndarray::ArrayD;
use serde_json::Value;
use tower::ServiceExt;

use pyro_api::{create_router, ApiConfig, AppState};
use pyro_detect::{
    ClassifierBackend, DetectorAdapter, DetectorRegistry, InferenceError, InferenceResult,
};
use pyro_engine::{Conjunction, Orchestrator};
use pyro_models::{DetectorConfig, DetectorKind, Normalization, TargetSize};

const BOUNDARY: &str = "pyrowatch-test-boundary";

fn png_bytes() -> Vec<u8> {
    let img = RgbImage::from_pixel(16, 16, image::Rgb([200, 90, 40]));
    let mut buf = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut buf, image::ImageOutputFormat::Png)
        .unwrap();
    buf.into_inner()
}

fn multipart_body(field: &str, payload: &[u8]) -> Vec<u8> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; \
             filename=\"frame.png\"\r\nContent-Type: image/png\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(payload);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
    body
}

fn upload(uri: &str, field: &str, payload: &[u8]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(multipart_body(field, payload)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

struct Fixed {
    score: f32,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl ClassifierBackend for Fixed {
    async fn score(&self, _input: ArrayD<f32>) -> InferenceResult<f32> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.score)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

struct Failing;

#[async_trait]
impl ClassifierBackend for Failing {
    async fn score(&self, _input: ArrayD<f32>) -> InferenceResult<f32> {
        Err(InferenceError::Unavailable("backend offline".to_string()))
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn config(name: &str, threshold: f32, flip: bool) -> DetectorConfig {
    DetectorConfig {
        name: name.to_string(),
        kind: DetectorKind::Classifier,
        target_size: TargetSize::square(16),
        normalization: Normalization {
            polarity_flip: flip,
            ..Normalization::default()
        },
        threshold,
        box_floor: 0.25,
        deadline_ms: 1_000,
    }
}

fn fixed(score: f32) -> (DetectorAdapter, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let adapter = DetectorAdapter::Classifier(Arc::new(Fixed {
        score,
        calls: Arc::clone(&calls),
    }));
    (adapter, calls)
}

fn app_with(detectors: Vec<(DetectorConfig, DetectorAdapter)>) -> axum::Router {
    let mut builder = DetectorRegistry::builder();
    for (cfg, adapter) in detectors {
        builder = builder.register(cfg, adapter);
    }
    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(builder.build().unwrap()),
        Arc::new(Conjunction),
    ));
    let state = AppState::with_orchestrator(ApiConfig::default(), orchestrator);
    create_router(state, None)
}

#[tokio::test]
async fn test_detect_alerts_when_both_hazards_present() {
    // Fire raw 0.02 under polarity flip -> 0.98; human 0.80.
    let (fire, _) = fixed(0.02);
    let (human, _) = fixed(0.80);
    let app = app_with(vec![
        (config("fire", 0.90, true), fire),
        (config("human", 0.50, false), human),
    ]);

    let response = app
        .oneshot(upload("/detect", "image", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["fire_detected"], Value::Bool(true));
    assert_eq!(body["fire_confidence"].as_f64().unwrap(), 98.00);
    assert_eq!(body["human_detected"], Value::Bool(true));
    assert_eq!(body["human_confidence"].as_f64().unwrap(), 80.00);
    assert_eq!(body["alert"], Value::Bool(true));
}

#[tokio::test]
async fn test_detect_reports_flipped_confidence_when_fire_absent() {
    // Fire raw 0.95 under polarity flip -> reported 5.00 and not detected.
    let (fire, _) = fixed(0.95);
    let (human, _) = fixed(0.97);
    let app = app_with(vec![
        (config("fire", 0.90, true), fire),
        (config("human", 0.50, false), human),
    ]);

    let response = app
        .oneshot(upload("/detect", "image", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["fire_detected"], Value::Bool(false));
    assert_eq!(body["fire_confidence"].as_f64().unwrap(), 5.00);
    assert_eq!(body["alert"], Value::Bool(false));
}

#[tokio::test]
async fn test_missing_image_field_is_bad_request() {
    let (fire, fire_calls) = fixed(0.95);
    let app = app_with(vec![(config("fire", 0.90, false), fire)]);

    let response = app
        .oneshot(upload("/detect", "file", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert_eq!(body["error"], Value::String("No image uploaded".into()));
    assert_eq!(fire_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_undecodable_upload_is_bad_request_and_runs_no_detectors() {
    let (fire, fire_calls) = fixed(0.95);
    let (human, human_calls) = fixed(0.80);
    let app = app_with(vec![
        (config("fire", 0.90, false), fire),
        (config("human", 0.50, false), human),
    ]);

    let response = app
        .oneshot(upload("/detect", "image", b"definitely not an image"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("Invalid image"));
    assert_eq!(fire_calls.load(Ordering::SeqCst), 0);
    assert_eq!(human_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_failing_detector_degrades_to_error_field() {
    let (human, _) = fixed(0.80);
    let app = app_with(vec![
        (
            config("fire", 0.90, false),
            DetectorAdapter::Classifier(Arc::new(Failing)),
        ),
        (config("human", 0.50, false), human),
    ]);

    let response = app
        .oneshot(upload("/detect", "image", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["fire_detected"], Value::Bool(false));
    assert_eq!(body["fire_confidence"].as_f64().unwrap(), 0.0);
    assert!(body["fire_error"].as_str().unwrap().contains("offline"));
    assert_eq!(body["human_detected"], Value::Bool(true));
    assert_eq!(body["alert"], Value::Bool(false));
}

#[tokio::test]
async fn test_single_hazard_endpoint() {
    let (fire, _) = fixed(0.95);
    let (human, human_calls) = fixed(0.80);
    let app = app_with(vec![
        (config("fire", 0.90, false), fire),
        (config("human", 0.50, false), human),
    ]);

    let response = app
        .oneshot(upload("/fire-model", "image", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["fire_detected"], Value::Bool(true));
    assert_eq!(body["fire_confidence"].as_f64().unwrap(), 95.00);
    assert!(body.get("alert").is_none());
    // The sibling detector never runs on a single-hazard request.
    assert_eq!(human_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn test_single_hazard_unknown_detector_is_not_found() {
    let (fire, _) = fixed(0.95);
    let app = app_with(vec![(config("fire", 0.90, false), fire)]);

    // /human-model is routed but the registry has no "human" entry.
    let response = app
        .oneshot(upload("/human-model", "image", &png_bytes()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let body = json_body(response).await;
    assert!(body["error"].as_str().unwrap().contains("human"));
}

#[tokio::test]
async fn test_health_endpoints() {
    let (fire, _) = fixed(0.95);
    let app = app_with(vec![(config("fire", 0.90, false), fire)]);

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], Value::String("healthy".into()));
    assert!(body["version"].is_string());

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], Value::String("ready".into()));
    assert_eq!(body["detectors"][0], Value::String("fire".into()));
}
