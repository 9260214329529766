//! Request orchestration and alert fusion.
//!
//! The orchestrator drives one request end to end: decode once, fan the
//! frame out to every registered detector concurrently, join, then hand the
//! per-hazard results to the fusion policy. A single detector's failure
//! degrades that detector's result instead of failing the request.

pub mod error;
pub mod fusion;
pub mod orchestrator;

pub use error::{EngineError, EngineResult};
pub use fusion::{policy_from_str, AtLeast, Conjunction, Disjunction, FusionPolicy};
pub use orchestrator::Orchestrator;
