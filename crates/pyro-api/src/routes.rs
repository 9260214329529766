//! Route definitions.

use axum::extract::DefaultBodyLimit;
use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::limit::RequestBodyLimitLayer;

use crate::handlers;
use crate::metrics::metrics_middleware;
use crate::middleware::{cors_layer, request_id, request_logging, security_headers};
use crate::state::AppState;

/// Create the application router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let max_body_size = state.config.max_body_size;
    let cors = cors_layer(&state.config.cors_origins);

    let mut router = Router::new()
        .route("/detect", post(handlers::detect))
        .route("/fire-model", post(handlers::fire_model))
        .route("/human-model", post(handlers::human_model))
        .route("/health", get(handlers::health))
        .route("/healthz", get(handlers::health))
        .route("/ready", get(handlers::ready));

    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        // Multipart uploads need both limits raised in lockstep.
        .layer(DefaultBodyLimit::max(max_body_size))
        .layer(RequestBodyLimitLayer::new(max_body_size))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(middleware::from_fn(security_headers))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors)
        .with_state(state)
}
