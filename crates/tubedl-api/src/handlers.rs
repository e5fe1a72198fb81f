//! HTTP request handlers.

pub mod health;
pub mod jobs;

pub use health::health;
pub use jobs::{job_log, job_status, list_jobs, start_download};
