//! Image ingestion and normalization.
//!
//! An upload is decoded exactly once per request into an immutable [`Frame`]
//! shared read-only across every detector invocation. Each detector then
//! re-normalizes the frame to its own model's input shape and scale through
//! the pure [`normalize`] step.

pub mod error;
pub mod frame;
pub mod tensor;

pub use error::{DecodeError, ImagingResult};
pub use frame::Frame;
pub use tensor::normalize;
