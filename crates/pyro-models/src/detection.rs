//! Per-detector detection results.

use serde::{Deserialize, Serialize};

/// Detected region in image pixel coordinates.
///
/// Meaningful only for box-detector results; classifier results carry an
/// empty box list.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    /// X coordinate of the top-left corner.
    pub x: f32,
    /// Y coordinate of the top-left corner.
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Per-candidate confidence [0, 1].
    pub confidence: f32,
}

impl BoundingBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32, confidence: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            confidence,
        }
    }

    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Intersection-over-union with another box.
    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.width).min(other.x + other.width);
        let y2 = (self.y + self.height).min(other.y + other.height);

        let intersection = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
        let union = self.area() + other.area() - intersection;
        if union <= 0.0 {
            0.0
        } else {
            intersection / union
        }
    }
}

/// Output of one detector for one image.
///
/// `confidence` is always reported in the canonical "hazard present"
/// polarity; raw backend polarity never leaves the adapter. A failed
/// invocation is recorded as `present=false, confidence=0.0` with `error`
/// set, so "model failed" is always distinguishable from "no hazard".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectionResult {
    /// Name of the detector that produced this result.
    pub detector: String,
    pub present: bool,
    /// Canonical-polarity confidence [0, 1].
    pub confidence: f32,
    /// Filtered candidate boxes, confidence-descending. Empty for
    /// classifier-kind detectors.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub boxes: Vec<BoundingBox>,
    /// Set when the backend failed or timed out and this result is a
    /// degraded sentinel rather than a genuine negative.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DetectionResult {
    /// Result for a classifier-kind detector from a canonical-polarity
    /// confidence.
    pub fn classifier(detector: impl Into<String>, confidence: f32, threshold: f32) -> Self {
        Self {
            detector: detector.into(),
            present: confidence >= threshold,
            confidence,
            boxes: Vec::new(),
            error: None,
        }
    }

    /// Result for a box-detector from already-filtered, confidence-ordered
    /// candidates.
    pub fn from_boxes(detector: impl Into<String>, boxes: Vec<BoundingBox>) -> Self {
        let confidence = boxes.first().map(|b| b.confidence).unwrap_or(0.0);
        Self {
            detector: detector.into(),
            present: !boxes.is_empty(),
            confidence,
            boxes,
            error: None,
        }
    }

    /// Degraded sentinel for a backend failure or timeout.
    pub fn failed(detector: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            detector: detector.into(),
            present: false,
            confidence: 0.0,
            boxes: Vec::new(),
            error: Some(reason.into()),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.error.is_some()
    }

    /// Confidence as a percentage rounded to two decimals, the wire format
    /// used by the serving boundary.
    pub fn confidence_percent(&self) -> f64 {
        (self.confidence as f64 * 100.0 * 100.0).round() / 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classifier_threshold_boundary() {
        let at = DetectionResult::classifier("fire", 0.90, 0.90);
        assert!(at.present);
        let below = DetectionResult::classifier("fire", 0.8999, 0.90);
        assert!(!below.present);
    }

    #[test]
    fn test_from_boxes_takes_max_confidence() {
        let boxes = vec![
            BoundingBox::new(0.0, 0.0, 10.0, 10.0, 0.9),
            BoundingBox::new(5.0, 5.0, 10.0, 10.0, 0.6),
        ];
        let result = DetectionResult::from_boxes("human", boxes);
        assert!(result.present);
        assert_eq!(result.confidence, 0.9);
        assert_eq!(result.boxes.len(), 2);
    }

    #[test]
    fn test_from_boxes_empty_is_absent() {
        let result = DetectionResult::from_boxes("human", Vec::new());
        assert!(!result.present);
        assert_eq!(result.confidence, 0.0);
        assert!(!result.is_degraded());
    }

    #[test]
    fn test_failed_sentinel() {
        let result = DetectionResult::failed("fire", "backend unavailable");
        assert!(!result.present);
        assert_eq!(result.confidence, 0.0);
        assert!(result.is_degraded());
    }

    #[test]
    fn test_confidence_percent_rounding() {
        let result = DetectionResult::classifier("fire", 0.056789, 0.9);
        assert_eq!(result.confidence_percent(), 5.68);
        let result = DetectionResult::classifier("human", 0.97, 0.5);
        assert_eq!(result.confidence_percent(), 97.00);
    }

    #[test]
    fn test_iou_disjoint_and_identical() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = BoundingBox::new(20.0, 20.0, 10.0, 10.0, 1.0);
        assert_eq!(a.iou(&b), 0.0);
        assert!((a.iou(&a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_serialization_skips_empty_fields() {
        let result = DetectionResult::classifier("fire", 0.95, 0.9);
        let json = serde_json::to_value(&result).unwrap();
        assert!(json.get("boxes").is_none());
        assert!(json.get("error").is_none());
    }
}
