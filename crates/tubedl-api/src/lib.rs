//! Axum HTTP API server.
//!
//! This crate provides:
//! - Job submission, status polling, log retrieval and listing endpoints
//! - Error mapping from the job core to HTTP status codes
//! - CORS for the browser UI, request tracing and body limits

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
