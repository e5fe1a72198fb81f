//! Status reconciliation: one authoritative answer per query.
//!
//! A status query merges three sources, in priority order: the live
//! in-memory handle, the durable metadata record, and an OS-level pid
//! probe for jobs that lost their handle across a restart. When a query
//! observes termination before the waiter does, it persists the exit code
//! opportunistically; both writers write the same value, so the race is
//! harmless.

use std::path::Path;

use tracing::warn;

use tubedl_models::{JobId, JobMeta, JobStatus};

use crate::error::{JobError, JobResult};
use crate::registry::JobRegistry;
use crate::{logs, meta, process};

/// Default log tail length for single-job status queries.
pub const STATUS_TAIL_LINES: usize = 200;

/// Default log tail length for the bulk job listing.
pub const LIST_TAIL_LINES: usize = 50;

/// Resolve the authoritative status of one job.
///
/// Errors with [`JobError::NotFound`] for an unknown id and
/// [`JobError::MetaMissing`] when the job directory exists but its
/// metadata record is gone entirely.
pub async fn resolve(
    registry: &JobRegistry,
    job_id: &JobId,
    tail_lines: usize,
) -> JobResult<JobStatus> {
    let job_dir = registry.job_dir(job_id);
    match tokio::fs::metadata(&job_dir).await {
        Ok(m) if m.is_dir() => {}
        _ => return Err(JobError::not_found(job_id.as_str())),
    }

    let job_meta = meta::try_load(&job_dir)
        .await
        .ok_or_else(|| JobError::MetaMissing(job_id.to_string()))?;

    Ok(reconcile(registry, job_id, &job_dir, job_meta, tail_lines).await)
}

/// List all jobs, sorted by job id, with short log tails.
///
/// Lenient counterpart of [`resolve`]: jobs with missing or corrupt
/// metadata still show up with whatever is known about them.
pub async fn list(registry: &JobRegistry, tail_lines: usize) -> JobResult<Vec<JobStatus>> {
    let mut ids = Vec::new();
    let mut entries = match tokio::fs::read_dir(registry.jobs_dir()).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_dir() {
            ids.push(JobId::from_string(entry.file_name().to_string_lossy()));
        }
    }
    ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));

    let mut jobs = Vec::with_capacity(ids.len());
    for job_id in &ids {
        let job_dir = registry.job_dir(job_id);
        let job_meta = meta::load_or_default(&job_dir).await;
        jobs.push(reconcile(registry, job_id, &job_dir, job_meta, tail_lines).await);
    }
    Ok(jobs)
}

/// Merge handle state, metadata and the pid probe into one status view.
async fn reconcile(
    registry: &JobRegistry,
    job_id: &JobId,
    job_dir: &Path,
    mut job_meta: JobMeta,
    tail_lines: usize,
) -> JobStatus {
    let running = match registry.get_handle(job_id).await {
        Some(handle) => match handle.poll() {
            None => true,
            Some(code) => {
                // Termination observed under a query before the waiter got
                // to it: persist and release, same effect as the waiter.
                job_meta.returncode = Some(code);
                if let Err(e) = meta::record_exit(job_dir, code).await {
                    warn!(job_id = %job_id, error = %e, "failed to persist exit code");
                }
                registry.forget(job_id).await;
                false
            }
        },
        // Handle-less jobs only exist after a restart; fall back to the
        // process table.
        None => match (job_meta.returncode, job_meta.pid) {
            (Some(_), _) => false,
            (None, Some(pid)) => process::pid_alive(pid),
            (None, None) => false,
        },
    };

    let log_tail = match logs::tail(&logs::log_path(job_dir), tail_lines).await {
        Ok(tail) => tail,
        Err(e) => {
            warn!(job_id = %job_id, error = %e, "failed to read log tail");
            String::new()
        }
    };

    JobStatus {
        job_id: job_id.to_string(),
        pid: job_meta.pid,
        running,
        returncode: job_meta.returncode,
        log_tail,
    }
}
