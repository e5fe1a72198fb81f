//! Shared data models for the tubedl backend.
//!
//! This crate provides Serde-serializable types for:
//! - Job identifiers and durable job metadata records
//! - Status reports returned by the HTTP API

pub mod job;
pub mod status;

// Re-export common types
pub use job::{JobId, JobMeta};
pub use status::JobStatus;
