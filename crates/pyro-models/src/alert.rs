//! Fused alert decision.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::detection::DetectionResult;

/// Final fused output for one request.
///
/// Aggregates exactly one `DetectionResult` per registered detector and the
/// alert verdict the fusion policy derived from them. Created fresh per
/// request and never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertDecision {
    pub alert: bool,
    /// Hazard name -> result. A BTreeMap keeps iteration order stable
    /// regardless of detector completion order.
    pub per_hazard: BTreeMap<String, DetectionResult>,
}

impl AlertDecision {
    pub fn new(alert: bool, per_hazard: BTreeMap<String, DetectionResult>) -> Self {
        Self { alert, per_hazard }
    }

    pub fn hazard(&self, name: &str) -> Option<&DetectionResult> {
        self.per_hazard.get(name)
    }

    /// Whether any detector degraded to an error sentinel this request.
    pub fn any_degraded(&self) -> bool {
        self.per_hazard.values().any(|r| r.is_degraded())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hazard_lookup() {
        let mut per_hazard = BTreeMap::new();
        per_hazard.insert(
            "fire".to_string(),
            DetectionResult::classifier("fire", 0.95, 0.9),
        );
        let decision = AlertDecision::new(false, per_hazard);
        assert!(decision.hazard("fire").unwrap().present);
        assert!(decision.hazard("human").is_none());
        assert!(!decision.any_degraded());
    }

    #[test]
    fn test_any_degraded() {
        let mut per_hazard = BTreeMap::new();
        per_hazard.insert(
            "fire".to_string(),
            DetectionResult::failed("fire", "timeout"),
        );
        per_hazard.insert(
            "human".to_string(),
            DetectionResult::classifier("human", 0.8, 0.5),
        );
        let decision = AlertDecision::new(false, per_hazard);
        assert!(decision.any_degraded());
    }
}
