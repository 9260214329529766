//! The uniform invocation contract over heterogeneous detectors.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::debug;

use pyro_imaging::{normalize, Frame};
use pyro_models::{BoundingBox, DetectionResult, DetectorConfig, DetectorKind};

use crate::backend::{BoxBackend, ClassifierBackend};
use crate::error::InferenceResult;

/// Polymorphic wrapper giving every hazard detector a single `infer`
/// contract, tagged by the shape of its backend's output.
///
/// Each variant owns only the result-shaping logic specific to its backend
/// kind; input normalization is shared and driven by the detector's config.
pub enum DetectorAdapter {
    Classifier(Arc<dyn ClassifierBackend>),
    BoxDetector(Arc<dyn BoxBackend>),
}

impl DetectorAdapter {
    pub fn kind(&self) -> DetectorKind {
        match self {
            DetectorAdapter::Classifier(_) => DetectorKind::Classifier,
            DetectorAdapter::BoxDetector(_) => DetectorKind::BoxDetector,
        }
    }

    /// Name of the wrapped backend, for logging.
    pub fn backend_name(&self) -> &'static str {
        match self {
            DetectorAdapter::Classifier(b) => b.name(),
            DetectorAdapter::BoxDetector(b) => b.name(),
        }
    }

    /// Score one frame and shape the backend's raw output into a canonical
    /// `DetectionResult`.
    ///
    /// The frame is re-normalized to this detector's input requirements
    /// first; the raw output is then brought into canonical "hazard
    /// present" polarity. Errors propagate to the orchestrator, which
    /// records them as degraded sentinels.
    pub async fn infer(
        &self,
        frame: &Arc<Frame>,
        config: &DetectorConfig,
    ) -> InferenceResult<DetectionResult> {
        let input = normalize(frame, config.target_size, &config.normalization);

        match self {
            DetectorAdapter::Classifier(backend) => {
                let raw = backend.score(input).await?.clamp(0.0, 1.0);
                let confidence = if config.normalization.polarity_flip {
                    1.0 - raw
                } else {
                    raw
                };

                debug!(
                    detector = %config.name,
                    raw,
                    confidence,
                    flipped = config.normalization.polarity_flip,
                    "Classifier scored"
                );

                Ok(DetectionResult::classifier(
                    &config.name,
                    confidence,
                    config.threshold,
                ))
            }
            DetectorAdapter::BoxDetector(backend) => {
                let candidates = backend.detect(Arc::clone(frame), input).await?;
                let boxes = filter_candidates(candidates, config.box_floor);

                debug!(
                    detector = %config.name,
                    kept = boxes.len(),
                    "Box detector scored"
                );

                Ok(DetectionResult::from_boxes(&config.name, boxes))
            }
        }
    }
}

/// Keep candidates at or above the per-candidate floor, ordered by
/// descending confidence. Ties keep their original detection order (stable
/// sort).
fn filter_candidates(candidates: Vec<BoundingBox>, floor: f32) -> Vec<BoundingBox> {
    let mut kept: Vec<BoundingBox> = candidates
        .into_iter()
        .filter(|c| c.confidence >= floor)
        .collect();
    kept.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(Ordering::Equal)
    });
    kept
}
