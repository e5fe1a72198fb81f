//! Error types for job lifecycle operations.

use thiserror::Error;

/// Result type for job operations.
pub type JobResult<T> = Result<T, JobError>;

/// Errors that can occur while managing jobs.
#[derive(Debug, Error)]
pub enum JobError {
    /// No job directory exists for the given id.
    #[error("job not found: {0}")]
    NotFound(String),

    /// The job directory exists but its metadata record is gone.
    ///
    /// Distinct from a *corrupt* record, which degrades to an empty one
    /// instead of erroring.
    #[error("job metadata missing: {0}")]
    MetaMissing(String),

    /// The OS refused to create the downloader process, or the executable
    /// could not be located. Always reported synchronously to the creator.
    #[error("failed to spawn job process: {0}")]
    Spawn(#[source] std::io::Error),

    /// No log file has been written for the job yet.
    #[error("log not found: {0}")]
    LogMissing(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl JobError {
    /// Create a not-found error.
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }
}
