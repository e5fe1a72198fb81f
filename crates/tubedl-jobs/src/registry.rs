//! Central job registry: the lifecycle owner of job state.
//!
//! Maps job ids to live process handles. The map is the single piece of
//! mutable shared state in the subsystem; creation, the per-job waiter task
//! and concurrent status queries all go through it.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::fs;
use tokio::sync::RwLock;
use tracing::{info, warn};

use tubedl_models::{JobId, JobMeta};

use crate::error::JobResult;
use crate::process::{self, JobHandle};
use crate::{logs, meta};

/// Registry of all jobs, live and finished.
///
/// Finished jobs keep their directory (log + metadata) but lose their
/// in-memory handle once the waiter has durably recorded the exit status.
pub struct JobRegistry {
    jobs_dir: PathBuf,
    handles: RwLock<HashMap<JobId, JobHandle>>,
}

impl JobRegistry {
    /// Create a registry rooted at `jobs_dir`. The directory itself is
    /// created lazily on first job creation.
    pub fn new(jobs_dir: impl Into<PathBuf>) -> Self {
        Self {
            jobs_dir: jobs_dir.into(),
            handles: RwLock::new(HashMap::new()),
        }
    }

    /// Root directory holding one subdirectory per job.
    pub fn jobs_dir(&self) -> &Path {
        &self.jobs_dir
    }

    /// Directory belonging to one job.
    pub fn job_dir(&self, job_id: &JobId) -> PathBuf {
        self.jobs_dir.join(job_id.as_str())
    }

    /// Create a new job: allocate an id, set up its directory and log,
    /// spawn `argv` detached, persist the initial metadata record and start
    /// the waiter task.
    ///
    /// Fail-fast policy: a spawn failure is returned before any job id is
    /// exposed, and the directory created for the attempt is removed.
    pub async fn create(self: &Arc<Self>, argv: Vec<String>) -> JobResult<(JobId, u32)> {
        let job_id = JobId::new();
        let job_dir = self.job_dir(&job_id);
        fs::create_dir_all(&job_dir).await?;

        let log = logs::create(&job_dir)?;
        let spawned = match process::spawn(&argv, log) {
            Ok(spawned) => spawned,
            Err(e) => {
                let _ = fs::remove_dir_all(&job_dir).await;
                return Err(e);
            }
        };

        let pid = spawned.pid;
        if let Err(e) = meta::store(&job_dir, &JobMeta::started(pid, argv)).await {
            // Fail fast on this path too: without a metadata record the job
            // would be invisible to pollers, so don't leave the process
            // running behind an id that was never exposed.
            self.abort_create(&job_dir, spawned.child).await;
            return Err(e.into());
        }

        self.handles
            .write()
            .await
            .insert(job_id.clone(), spawned.handle);

        let registry = Arc::clone(self);
        let waiter_id = job_id.clone();
        tokio::spawn(async move {
            registry
                .wait_for_exit(waiter_id, spawned.child, spawned.exit_tx)
                .await;
        });

        info!(job_id = %job_id, pid, "job started");
        Ok((job_id, pid))
    }

    /// Tear down a half-created job whose id was never exposed: kill the
    /// spawned process and drop its directory.
    async fn abort_create(&self, job_dir: &Path, mut child: tokio::process::Child) {
        if let Err(e) = child.kill().await {
            warn!(error = %e, "failed to kill process of aborted job");
        }
        let _ = fs::remove_dir_all(job_dir).await;
    }

    /// Waiter task body: block on the child, publish and persist the exit
    /// code, then release the handle. Every failure here is swallowed; a
    /// waiter must never take the service down.
    async fn wait_for_exit(
        self: Arc<Self>,
        job_id: JobId,
        mut child: tokio::process::Child,
        exit_tx: tokio::sync::watch::Sender<Option<i32>>,
    ) {
        match child.wait().await {
            Ok(status) => {
                let code = process::exit_code(status);
                exit_tx.send_replace(Some(code));

                if let Err(e) = meta::record_exit(&self.job_dir(&job_id), code).await {
                    warn!(job_id = %job_id, error = %e, "failed to persist exit code");
                }
                info!(job_id = %job_id, code, "job finished");
            }
            Err(e) => {
                // Could not reap; leave the metadata untouched and let the
                // pid probe answer liveness questions.
                warn!(job_id = %job_id, error = %e, "failed to wait on job process");
            }
        }

        self.forget(&job_id).await;
    }

    /// Look up the live handle for a job, if one exists.
    pub async fn get_handle(&self, job_id: &JobId) -> Option<JobHandle> {
        self.handles.read().await.get(job_id).cloned()
    }

    /// Drop the in-memory handle for a job. Metadata and log persist.
    /// Idempotent: forgetting an unknown or already-forgotten id is a no-op.
    pub async fn forget(&self, job_id: &JobId) {
        self.handles.write().await.remove(job_id);
    }

    /// Number of jobs with a live handle.
    pub async fn live_count(&self) -> usize {
        self.handles.read().await.len()
    }
}
