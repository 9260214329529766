//! Axum HTTP API server.
//!
//! This crate provides:
//! - `POST /detect` multipart upload scoring with fused alert output
//! - `POST /fire-model` and `POST /human-model` single-hazard variants
//! - Health/readiness endpoints and Prometheus metrics
//! - Request-id, logging, CORS, and security-header middleware

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
