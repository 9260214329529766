//! Fusion policies.
//!
//! A policy is a pure function over the per-hazard result map; it sees
//! neither detector wiring nor completion order, so safety-policy changes
//! stay reviewable in isolation. The shipped default is conjunction: an
//! alert requires every configured hazard present in the same frame.

use std::collections::BTreeMap;
use std::sync::Arc;

use pyro_models::{AlertDecision, DetectionResult};

use crate::error::{EngineError, EngineResult};

/// Strategy combining per-hazard results into one alert verdict.
pub trait FusionPolicy: Send + Sync {
    fn fuse(&self, results: &BTreeMap<String, DetectionResult>) -> bool;

    /// Policy name for logging.
    fn name(&self) -> &'static str;

    /// Assemble the final decision. Provided once here so every policy
    /// produces the same `AlertDecision` shape.
    fn decide(&self, results: BTreeMap<String, DetectionResult>) -> AlertDecision {
        let alert = self.fuse(&results);
        AlertDecision::new(alert, results)
    }
}

/// Alert only when every hazard is present.
pub struct Conjunction;

impl FusionPolicy for Conjunction {
    fn fuse(&self, results: &BTreeMap<String, DetectionResult>) -> bool {
        !results.is_empty() && results.values().all(|r| r.present)
    }

    fn name(&self) -> &'static str {
        "all"
    }
}

/// Alert when any hazard is present.
pub struct Disjunction;

impl FusionPolicy for Disjunction {
    fn fuse(&self, results: &BTreeMap<String, DetectionResult>) -> bool {
        results.values().any(|r| r.present)
    }

    fn name(&self) -> &'static str {
        "any"
    }
}

/// Alert when at least N hazards are present.
pub struct AtLeast(pub usize);

impl FusionPolicy for AtLeast {
    fn fuse(&self, results: &BTreeMap<String, DetectionResult>) -> bool {
        results.values().filter(|r| r.present).count() >= self.0
    }

    fn name(&self) -> &'static str {
        "at-least"
    }
}

/// Parse a policy selector from configuration: `all`, `any`, or
/// `at-least:N`.
pub fn policy_from_str(spec: &str) -> EngineResult<Arc<dyn FusionPolicy>> {
    match spec {
        "all" => Ok(Arc::new(Conjunction)),
        "any" => Ok(Arc::new(Disjunction)),
        other => {
            if let Some(n) = other.strip_prefix("at-least:") {
                let n: usize = n
                    .parse()
                    .map_err(|_| EngineError::UnknownPolicy(other.to_string()))?;
                Ok(Arc::new(AtLeast(n)))
            } else {
                Err(EngineError::UnknownPolicy(other.to_string()))
            }
        }
    }
}
