//! Shared data models for the pyrowatch backend.
//!
//! This crate provides Serde-serializable types for:
//! - Detector configuration (kind, input normalization, thresholds)
//! - Per-detector detection results and bounding boxes
//! - The fused alert decision returned to the serving boundary

pub mod alert;
pub mod detection;
pub mod detector;

// Re-export common types
pub use alert::AlertDecision;
pub use detection::{BoundingBox, DetectionResult};
pub use detector::{DetectorConfig, DetectorKind, Normalization, TargetSize};
