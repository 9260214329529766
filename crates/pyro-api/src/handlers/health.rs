//! Health check endpoints.

use axum::extract::State;
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

/// GET /health - liveness check.
pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// GET /ready - readiness check.
///
/// Reports the loaded detectors; the registry is built before the server
/// starts listening, so a responding server is a ready server.
pub async fn ready(State(state): State<AppState>) -> Json<Value> {
    let detectors = state.orchestrator.registry().names();
    Json(json!({
        "status": "ready",
        "detectors": detectors,
        "fusion_policy": state.config.fusion_policy,
    }))
}
