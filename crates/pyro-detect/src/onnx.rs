//! ONNX Runtime scoring backends.
//!
//! Sessions are loaded once at startup and shared process-wide. An ORT
//! session is not safe for concurrent `run` calls, so each backend holds
//! its session behind a mutex — this is the per-detector invocation guard;
//! concurrent requests against one detector queue rather than race.
//! Scoring runs under `spawn_blocking` so per-detector deadlines stay
//! effective while inference occupies a CPU.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ndarray::ArrayD;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use pyro_imaging::Frame;
use pyro_models::BoundingBox;

use crate::backend::{BoxBackend, ClassifierBackend};
use crate::error::{ConfigError, ConfigResult, InferenceError, InferenceResult};

/// Classifier backend: one ONNX model producing a scalar probability.
#[derive(Debug)]
pub struct OnnxClassifier {
    session: Arc<Mutex<Session>>,
    output_name: String,
}

impl OnnxClassifier {
    /// Load the model once; fails startup if the file is missing or not a
    /// valid ONNX graph.
    pub fn load(model_path: &str, output_name: impl Into<String>) -> ConfigResult<Self> {
        let session = create_session(Path::new(model_path))?;
        info!(model_path, "Classifier model loaded");
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            output_name: output_name.into(),
        })
    }
}

#[async_trait]
impl ClassifierBackend for OnnxClassifier {
    async fn score(&self, input: ArrayD<f32>) -> InferenceResult<f32> {
        let session = Arc::clone(&self.session);
        let output_name = self.output_name.clone();

        tokio::task::spawn_blocking(move || {
            let data = run_model(&session, &output_name, input)?;
            data.first()
                .copied()
                .ok_or_else(|| InferenceError::backend("Model returned an empty output tensor"))
        })
        .await
        .map_err(|e| InferenceError::backend(format!("Scoring task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "onnx_classifier"
    }
}

/// Box-detector backend: a YOLO-format ONNX model.
///
/// Expects the usual `[1, 4 + num_classes, num_boxes]` output layout with
/// center-format coordinates in model input space. Only the configured
/// class channel is read; candidates surviving the raw pruning floor and
/// NMS are returned in original-image pixel coordinates.
#[derive(Debug)]
pub struct OnnxBoxDetector {
    session: Arc<Mutex<Session>>,
    output_name: String,
    /// COCO class channel to read (0 = person).
    class_id: usize,
    num_classes: usize,
    input_size: u32,
    /// Raw-candidate pruning floor applied before NMS. Distinct from the
    /// adapter's configured per-candidate floor, which is the contractual
    /// filter; this one only keeps NMS tractable.
    candidate_floor: f32,
    nms_threshold: f32,
}

impl OnnxBoxDetector {
    pub fn load(
        model_path: &str,
        output_name: impl Into<String>,
        class_id: usize,
        num_classes: usize,
        input_size: u32,
    ) -> ConfigResult<Self> {
        let session = create_session(Path::new(model_path))?;
        info!(model_path, class_id, input_size, "Box detector model loaded");
        Ok(Self {
            session: Arc::new(Mutex::new(session)),
            output_name: output_name.into(),
            class_id,
            num_classes,
            input_size,
            candidate_floor: 0.05,
            nms_threshold: 0.45,
        })
    }
}

#[async_trait]
impl BoxBackend for OnnxBoxDetector {
    async fn detect(
        &self,
        frame: Arc<Frame>,
        input: ArrayD<f32>,
    ) -> InferenceResult<Vec<BoundingBox>> {
        let session = Arc::clone(&self.session);
        let output_name = self.output_name.clone();
        let class_id = self.class_id;
        let num_classes = self.num_classes;
        let input_size = self.input_size as f32;
        let candidate_floor = self.candidate_floor;
        let nms_threshold = self.nms_threshold;
        let (orig_width, orig_height) = (frame.width() as f32, frame.height() as f32);

        tokio::task::spawn_blocking(move || {
            let data = run_model(&session, &output_name, input)?;
            let candidates = parse_candidates(
                &data,
                class_id,
                num_classes,
                input_size,
                orig_width,
                orig_height,
                candidate_floor,
            )?;
            Ok(non_maximum_suppression(candidates, nms_threshold))
        })
        .await
        .map_err(|e| InferenceError::backend(format!("Scoring task failed: {e}")))?
    }

    fn name(&self) -> &'static str {
        "onnx_box_detector"
    }
}

/// Create an ONNX Runtime session (CPU execution provider).
fn create_session(model_path: &Path) -> ConfigResult<Session> {
    if !model_path.exists() {
        return Err(ConfigError::ModelNotFound(
            model_path.display().to_string(),
        ));
    }

    let model_bytes = std::fs::read(model_path)?;

    Session::builder()
        .map_err(|e| ConfigError::Model(format!("Failed to create session builder: {e}")))?
        .with_optimization_level(GraphOptimizationLevel::Level3)
        .map_err(|e| ConfigError::Model(format!("Failed to set optimization level: {e}")))?
        .commit_from_memory(&model_bytes)
        .map_err(|e| ConfigError::Model(format!("Failed to load ONNX model: {e}")))
}

/// Run the session on one input tensor and return the named output as f32.
fn run_model(
    session: &Mutex<Session>,
    output_name: &str,
    input: ArrayD<f32>,
) -> InferenceResult<Vec<f32>> {
    let shape: Vec<usize> = input.shape().to_vec();
    let data = input.into_raw_vec().into_boxed_slice();

    let tensor = Tensor::from_array((shape, data))
        .map::<Value, _>(Value::from)
        .map_err(|e| InferenceError::backend(format!("Failed to create input tensor: {e}")))?;

    let mut session = session
        .lock()
        .map_err(|_| InferenceError::backend("ORT session poisoned"))?;

    let outputs = session
        .run(ort::inputs![tensor])
        .map_err(|e| InferenceError::backend(format!("ORT run failed: {e}")))?;

    let output = outputs
        .get(output_name)
        .ok_or_else(|| InferenceError::backend(format!("Missing output tensor {output_name}")))?;

    let extracted = output
        .try_extract_tensor::<f32>()
        .map_err(|e| InferenceError::backend(format!("Failed to extract output tensor: {e}")))?;

    Ok(extracted.1.to_vec())
}

/// Parse YOLO-format output for one class channel.
///
/// Layout is `[1, 4 + num_classes, num_boxes]` flattened row-major: feature
/// `f` for box `i` lives at `f * num_boxes + i`.
fn parse_candidates(
    data: &[f32],
    class_id: usize,
    num_classes: usize,
    input_size: f32,
    orig_width: f32,
    orig_height: f32,
    candidate_floor: f32,
) -> InferenceResult<Vec<BoundingBox>> {
    let num_features = 4 + num_classes;
    if class_id >= num_classes || data.is_empty() || data.len() % num_features != 0 {
        return Err(InferenceError::ShapeMismatch {
            expected: format!("[1, {num_features}, N]"),
            got: format!("{} values", data.len()),
        });
    }
    let num_boxes = data.len() / num_features;

    let scale_w = orig_width / input_size;
    let scale_h = orig_height / input_size;

    let mut candidates = Vec::new();
    for i in 0..num_boxes {
        let score = data[(4 + class_id) * num_boxes + i];
        if score < candidate_floor {
            continue;
        }

        let cx = data[i];
        let cy = data[num_boxes + i];
        let w = data[2 * num_boxes + i];
        let h = data[3 * num_boxes + i];

        // Center format in model space -> corner format in image pixels.
        let x = ((cx - w / 2.0) * scale_w).clamp(0.0, orig_width);
        let y = ((cy - h / 2.0) * scale_h).clamp(0.0, orig_height);
        let width = (w * scale_w).min(orig_width - x);
        let height = (h * scale_h).min(orig_height - y);

        candidates.push(BoundingBox::new(x, y, width, height, score));
    }

    debug!(
        raw = num_boxes,
        kept = candidates.len(),
        "Parsed box candidates"
    );
    Ok(candidates)
}

/// Drop candidates overlapping a higher-confidence one (single class).
fn non_maximum_suppression(mut candidates: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    if candidates.is_empty() {
        return candidates;
    }

    candidates.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep = Vec::new();
    let mut suppressed = vec![false; candidates.len()];

    for i in 0..candidates.len() {
        if suppressed[i] {
            continue;
        }
        keep.push(candidates[i]);

        for j in (i + 1)..candidates.len() {
            if !suppressed[j] && candidates[i].iou(&candidates[j]) > iou_threshold {
                suppressed[j] = true;
            }
        }
    }

    keep
}
