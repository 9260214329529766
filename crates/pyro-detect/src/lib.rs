//! Detector adapters and registry.
//!
//! Every hazard detector, whatever its trained backend produces, is invoked
//! through the same contract: a [`DetectorAdapter`] takes the request's
//! decoded frame plus its static [`DetectorConfig`] and returns a canonical
//! `DetectionResult`. The [`DetectorRegistry`] holds the configured set of
//! adapters, built once at startup and immutable at request time.

pub mod adapter;
pub mod backend;
pub mod error;
pub mod manifest;
pub mod onnx;
pub mod registry;
pub mod spool;

pub use adapter::DetectorAdapter;
pub use backend::{BoxBackend, ClassifierBackend};
pub use error::{ConfigError, ConfigResult, InferenceError, InferenceResult};
pub use manifest::{registry_from_file, ManifestEntry};
pub use onnx::{OnnxBoxDetector, OnnxClassifier};
pub use registry::{DetectorEntry, DetectorRegistry, RegistryBuilder};
pub use spool::SpooledFrame;
