//! Per-request detector orchestration.

use std::collections::BTreeMap;
use std::sync::Arc;

use metrics::counter;
use tokio::time::timeout;
use tracing::{debug, warn};

use pyro_detect::{DetectorEntry, DetectorRegistry, InferenceError};
use pyro_imaging::Frame;
use pyro_models::{AlertDecision, DetectionResult};

use crate::error::{EngineError, EngineResult};
use crate::fusion::FusionPolicy;

const DETECTOR_FAILURES: &str = "pyrowatch_detector_failures_total";
const DETECTOR_TIMEOUTS: &str = "pyrowatch_detector_timeouts_total";

/// Drives one request from raw upload bytes to a fused alert decision.
///
/// Holds only immutable, process-wide state (the registry and the policy),
/// so one instance serves all requests concurrently.
pub struct Orchestrator {
    registry: Arc<DetectorRegistry>,
    policy: Arc<dyn FusionPolicy>,
}

impl Orchestrator {
    pub fn new(registry: Arc<DetectorRegistry>, policy: Arc<dyn FusionPolicy>) -> Self {
        Self { registry, policy }
    }

    pub fn registry(&self) -> &DetectorRegistry {
        &self.registry
    }

    /// Run every registered detector against the upload and fuse.
    ///
    /// Decode happens exactly once; the frame fans out read-only to all
    /// detectors concurrently, each bound to its own deadline. A detector
    /// failure or timeout degrades to an error-flagged sentinel while the
    /// siblings still contribute, so the fused output never silently
    /// conflates "model failed" with "no hazard". Decode failure is the
    /// only path that fails the whole request, before any detector runs.
    pub async fn assess(&self, raw: &[u8]) -> EngineResult<AlertDecision> {
        let frame = Arc::new(Frame::decode(raw)?);

        let mut pending = Vec::with_capacity(self.registry.len());
        for entry in self.registry.iter() {
            let entry = Arc::clone(entry);
            let frame = Arc::clone(&frame);
            let name = entry.name().to_string();
            let handle = tokio::spawn(async move { run_detector(&entry, &frame).await });
            pending.push((name, handle));
        }

        let mut results = BTreeMap::new();
        for (name, handle) in pending {
            let result = match handle.await {
                Ok(result) => result,
                Err(e) => {
                    warn!(detector = %name, error = %e, "Detector task failed");
                    counter!(DETECTOR_FAILURES, "detector" => name.clone()).increment(1);
                    DetectionResult::failed(&name, format!("Scoring task failed: {e}"))
                }
            };
            results.insert(name, result);
        }

        let decision = self.policy.decide(results);
        debug!(
            alert = decision.alert,
            policy = self.policy.name(),
            degraded = decision.any_degraded(),
            "Request fused"
        );
        Ok(decision)
    }

    /// Run a single named detector against the upload, with the same
    /// degrade-on-failure semantics as the full fan-out.
    pub async fn assess_single(&self, hazard: &str, raw: &[u8]) -> EngineResult<DetectionResult> {
        let entry = self
            .registry
            .get(hazard)
            .ok_or_else(|| EngineError::UnknownHazard(hazard.to_string()))?;

        let frame = Arc::new(Frame::decode(raw)?);
        Ok(run_detector(entry, &frame).await)
    }
}

/// Invoke one detector under its deadline, degrading failure and timeout to
/// a sentinel result.
async fn run_detector(entry: &DetectorEntry, frame: &Arc<Frame>) -> DetectionResult {
    let deadline = entry.config().deadline();
    let name = entry.name();

    match timeout(deadline, entry.infer(frame)).await {
        Ok(Ok(result)) => result,
        Ok(Err(err)) => {
            warn!(detector = %name, error = %err, "Detector inference failed");
            counter!(DETECTOR_FAILURES, "detector" => name.to_string()).increment(1);
            DetectionResult::failed(name, err.to_string())
        }
        Err(_) => {
            let err = InferenceError::Timeout(deadline.as_millis() as u64);
            warn!(detector = %name, deadline_ms = deadline.as_millis() as u64, "Detector timed out");
            counter!(DETECTOR_TIMEOUTS, "detector" => name.to_string()).increment(1);
            DetectionResult::failed(name, err.to_string())
        }
    }
}
