//! Application state.

use std::sync::Arc;

use pyro_detect::registry_from_file;
use pyro_engine::{policy_from_str, Orchestrator};

use crate::config::ApiConfig;

/// Shared application state.
///
/// The orchestrator holds the loaded models and fusion policy as immutable
/// process-wide state; nothing here mutates after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create new application state.
    ///
    /// Builds the detector registry from the configured manifest. Any
    /// configuration failure here is fatal; the caller must not start
    /// serving.
    pub fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let registry = registry_from_file(&config.detectors_manifest)?;
        let policy = policy_from_str(&config.fusion_policy)?;
        let orchestrator = Arc::new(Orchestrator::new(Arc::new(registry), policy));

        Ok(Self {
            config,
            orchestrator,
        })
    }

    /// Assemble state from already-built components, used by tests and
    /// embedders that wire their own backends.
    pub fn with_orchestrator(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}
