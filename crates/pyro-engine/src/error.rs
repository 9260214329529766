//! Engine error types.

use thiserror::Error;

use pyro_imaging::DecodeError;

pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Debug, Error)]
pub enum EngineError {
    /// Upload could not be decoded; surfaces as a client error before any
    /// detector runs.
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Unknown hazard: {0}")]
    UnknownHazard(String),

    #[error("Unknown fusion policy: {0}")]
    UnknownPolicy(String),
}
