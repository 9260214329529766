//! Static detector configuration.
//!
//! One `DetectorConfig` is registered per hazard category at startup and is
//! immutable for the process lifetime. Re-thresholding a detector means
//! rebuilding the registry, never mutating it under live traffic.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What shape of output a detector's trained backend produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetectorKind {
    /// Single scalar probability per image.
    Classifier,
    /// Zero or more candidate bounding boxes, each with its own confidence.
    BoxDetector,
}

impl DetectorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::Classifier => "classifier",
            DetectorKind::BoxDetector => "box_detector",
        }
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error)]
#[error("Unknown detector kind: {0}")]
pub struct ParseKindError(String);

impl FromStr for DetectorKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "classifier" => Ok(DetectorKind::Classifier),
            "box_detector" => Ok(DetectorKind::BoxDetector),
            other => Err(ParseKindError(other.to_string())),
        }
    }
}

/// Model input dimensions a frame is resized to before scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetSize {
    pub width: u32,
    pub height: u32,
}

impl TargetSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Square input, the common case for CNN classifiers and YOLO models.
    pub fn square(side: u32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }
}

/// Input scaling scheme plus output polarity for one detector.
///
/// `polarity_flip` records whether the trained artifact encodes its positive
/// class opposite to the canonical "hazard present" meaning. Which artifacts
/// need the flip is a property of the individual training run and must be
/// set per deployment, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Normalization {
    /// Pixel divisor applied before mean subtraction (255.0 for `/255`
    /// training pipelines, 1.0 for raw-pixel models).
    pub scale: f32,
    /// Per-channel offset subtracted after scaling (RGB order). All zeros
    /// for plain `/255` pipelines, ImageNet means for transfer-learning
    /// backbones trained with mean centering.
    pub mean_offset: [f32; 3],
    /// Invert the raw classifier score (`1 - raw`) so the reported
    /// confidence always means "hazard present". Applied to the output
    /// only, never to the input tensor.
    #[serde(default)]
    pub polarity_flip: bool,
}

impl Default for Normalization {
    fn default() -> Self {
        Self {
            scale: 255.0,
            mean_offset: [0.0, 0.0, 0.0],
            polarity_flip: false,
        }
    }
}

fn default_box_floor() -> f32 {
    0.25
}

fn default_deadline_ms() -> u64 {
    5_000
}

/// Static configuration for one registered detector.
///
/// Loaded once at process start from the detector spec file and immutable
/// for the process lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Hazard name ("fire", "human"). Keys the registry and the response
    /// fields; must be unique across the registered set.
    pub name: String,
    pub kind: DetectorKind,
    pub target_size: TargetSize,
    pub normalization: Normalization,
    /// Detector-level alert threshold on the canonical-polarity confidence.
    pub threshold: f32,
    /// Per-candidate floor for box detectors; boxes below it are dropped
    /// before the detector-level decision. Always <= `threshold`.
    #[serde(default = "default_box_floor")]
    pub box_floor: f32,
    /// Per-invocation deadline. A detector exceeding it degrades like an
    /// inference failure rather than stalling the request.
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
}

impl DetectorConfig {
    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_roundtrip() {
        assert_eq!(
            "classifier".parse::<DetectorKind>().unwrap(),
            DetectorKind::Classifier
        );
        assert_eq!(
            "box_detector".parse::<DetectorKind>().unwrap(),
            DetectorKind::BoxDetector
        );
        assert!("yolo".parse::<DetectorKind>().is_err());
        assert_eq!(DetectorKind::BoxDetector.as_str(), "box_detector");
    }

    #[test]
    fn test_config_defaults_from_json() {
        let json = r#"{
            "name": "fire",
            "kind": "classifier",
            "target_size": { "width": 224, "height": 224 },
            "normalization": { "scale": 255.0, "mean_offset": [0.0, 0.0, 0.0] },
            "threshold": 0.9
        }"#;

        let config: DetectorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.name, "fire");
        assert!(!config.normalization.polarity_flip);
        assert_eq!(config.box_floor, 0.25);
        assert_eq!(config.deadline(), Duration::from_millis(5_000));
    }

    #[test]
    fn test_target_size_square() {
        let size = TargetSize::square(640);
        assert_eq!(size.width, 640);
        assert_eq!(size.height, 640);
    }
}
