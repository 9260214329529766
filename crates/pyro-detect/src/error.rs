//! Error types for detector invocation and registry construction.

use thiserror::Error;

/// Result type for detector invocations.
pub type InferenceResult<T> = Result<T, InferenceError>;

/// Result type for registry and startup configuration.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// A scoring-function failure for one detector on one request.
///
/// Never silently converted to "no hazard": the orchestrator records it as
/// an error-flagged sentinel result so a failed model is always
/// distinguishable from a genuine negative.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("Backend failure: {0}")]
    Backend(String),

    #[error("Backend output shape mismatch: expected {expected}, got {got}")]
    ShapeMismatch { expected: String, got: String },

    #[error("Detector timed out after {0} ms")]
    Timeout(u64),

    #[error("Backend unavailable: {0}")]
    Unavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl InferenceError {
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }
}

/// Invalid detector configuration at startup.
///
/// Fatal: the process must not start serving with a broken registry.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Detector name must not be empty")]
    EmptyName,

    #[error("Duplicate detector name: {0}")]
    DuplicateDetector(String),

    #[error("Detector {name}: threshold {value} outside [0, 1]")]
    InvalidThreshold { name: String, value: f32 },

    #[error("Detector {name}: target size {width}x{height} has a zero dimension")]
    InvalidTargetSize {
        name: String,
        width: u32,
        height: u32,
    },

    #[error("Detector {name}: box floor {floor} exceeds threshold {threshold}")]
    BoxFloorAboveThreshold {
        name: String,
        floor: f32,
        threshold: f32,
    },

    #[error("Detector {name}: configured as {configured} but adapter is {adapter}")]
    KindMismatch {
        name: String,
        configured: String,
        adapter: String,
    },

    #[error("No detectors configured")]
    NoDetectors,

    #[error("Model not found: {0}")]
    ModelNotFound(String),

    #[error("Failed to load model: {0}")]
    Model(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Manifest parse error: {0}")]
    Json(#[from] serde_json::Error),
}
