//! Route definitions for the GeoSync HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(health_routes())
        .merge(job_routes())
        .merge(delta_routes());

    Router::new()
        .nest("/api", api_routes)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Liveness and aggregated status.
fn health_routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/status", get(handlers::status::get_status))
}

/// Job submission, polling, and cancellation.
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs", post(handlers::jobs::submit_job))
        .route("/jobs/{id}", get(handlers::jobs::get_job))
        .route("/jobs/{id}/cancel", post(handlers::jobs::cancel_job))
        .route(
            "/projects/{id}/jobs",
            get(handlers::jobs::list_project_jobs),
        )
}

/// Delta submission, listing, and apply.
fn delta_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/projects/{id}/deltas",
            post(handlers::deltas::submit_delta).get(handlers::deltas::list_project_deltas),
        )
        .route(
            "/projects/{id}/deltas/apply",
            post(handlers::deltas::apply_deltas),
        )
}
