//! Scoring-backend traits.
//!
//! A backend wraps one trained, opaque scoring function with a uniform
//! interface so the adapter layer can treat every hazard model the same
//! way. Implementations document their own concurrency story: a backend
//! must either be safe for concurrent read-only use or serialize its
//! invocations internally (the ONNX backends hold their session behind a
//! mutex).

use std::sync::Arc;

use async_trait::async_trait;
use ndarray::ArrayD;

use pyro_imaging::Frame;
use pyro_models::BoundingBox;

use crate::error::InferenceResult;

/// Backend producing one scalar probability per image.
///
/// The returned score is the model's raw output in [0, 1], in the model's
/// own polarity; the adapter applies any configured polarity flip.
#[async_trait]
pub trait ClassifierBackend: Send + Sync {
    async fn score(&self, input: ArrayD<f32>) -> InferenceResult<f32>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}

/// Backend producing zero or more candidate boxes per image.
///
/// Candidates are returned in detection order, in pixel coordinates of the
/// original frame, unfiltered: the adapter applies the configured
/// per-candidate floor and ordering.
#[async_trait]
pub trait BoxBackend: Send + Sync {
    async fn detect(
        &self,
        frame: Arc<Frame>,
        input: ArrayD<f32>,
    ) -> InferenceResult<Vec<BoundingBox>>;

    /// Backend name for logging.
    fn name(&self) -> &'static str;
}
