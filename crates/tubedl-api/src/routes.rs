//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::{health, job_log, job_status, list_jobs, start_download};
use crate::middleware::cors_layer;
use crate::state::AppState;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let job_routes = Router::new()
        .route("/download", post(start_download))
        .route("/status/:job_id", get(job_status))
        .route("/logs/:job_id", get(job_log))
        .route("/jobs", get(list_jobs));

    let health_routes = Router::new().route("/health", get(health));

    Router::new()
        .merge(job_routes)
        .merge(health_routes)
        .layer(RequestBodyLimitLayer::new(state.config.max_body_size))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
