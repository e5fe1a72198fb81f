//! Durable per-job metadata records.
//!
//! `meta.json` is the crash-tolerance boundary: it is written right after a
//! successful spawn and updated with the terminal exit code once the process
//! is reaped. A corrupt or truncated record degrades to an empty one and
//! never propagates as an error to pollers.

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::warn;

use tubedl_models::JobMeta;

/// Metadata file name inside a job directory.
pub const META_FILE: &str = "meta.json";

/// Path of the metadata record inside a job directory.
pub fn meta_path(job_dir: &Path) -> PathBuf {
    job_dir.join(META_FILE)
}

/// Load the metadata record for a job.
///
/// Returns `None` when no record exists at all. A record that exists but
/// cannot be parsed yields an empty `JobMeta` instead of an error.
pub async fn try_load(job_dir: &Path) -> Option<JobMeta> {
    let path = meta_path(job_dir);
    let raw = match fs::read_to_string(&path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "failed to read job metadata");
            return Some(JobMeta::default());
        }
    };

    match serde_json::from_str(&raw) {
        Ok(meta) => Some(meta),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "corrupt job metadata, treating as empty");
            Some(JobMeta::default())
        }
    }
}

/// Load the metadata record, treating a missing file like a corrupt one.
/// Used by writers that must never lose an exit code over a transiently
/// unreadable record.
pub async fn load_or_default(job_dir: &Path) -> JobMeta {
    try_load(job_dir).await.unwrap_or_default()
}

/// Persist the metadata record for a job.
///
/// Writes to a temp file in the job directory and renames it into place so
/// a reader never observes a half-written record.
pub async fn store(job_dir: &Path, meta: &JobMeta) -> std::io::Result<()> {
    let path = meta_path(job_dir);
    let tmp = path.with_extension("json.tmp");

    let body = serde_json::to_vec(meta).map_err(std::io::Error::other)?;
    fs::write(&tmp, &body).await?;
    fs::rename(&tmp, &path).await
}

/// Merge the terminal exit code into the job's metadata record.
///
/// Read-merge-write: previously recorded fields (pid, cmd) are kept. If the
/// record is unreadable the code is written over an empty base rather than
/// being dropped. Both the waiter and the status reconciler call this with
/// the same value, so racing writers converge.
pub async fn record_exit(job_dir: &Path, code: i32) -> std::io::Result<()> {
    let mut meta = load_or_default(job_dir).await;
    meta.returncode = Some(code);
    store(job_dir, &meta).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_record_is_none() {
        let dir = TempDir::new().unwrap();
        assert!(try_load(dir.path()).await.is_none());
    }

    #[tokio::test]
    async fn test_store_and_load() {
        let dir = TempDir::new().unwrap();
        let meta = JobMeta::started(99, vec!["yt-dlp".into(), "url".into()]);

        store(dir.path(), &meta).await.unwrap();
        assert_eq!(try_load(dir.path()).await.unwrap(), meta);
    }

    #[tokio::test]
    async fn test_corrupt_record_degrades_to_empty() {
        let dir = TempDir::new().unwrap();
        fs::write(meta_path(dir.path()), b"{\"pid\": 12, tr")
            .await
            .unwrap();

        let meta = try_load(dir.path()).await.unwrap();
        assert_eq!(meta, JobMeta::default());
    }

    #[tokio::test]
    async fn test_record_exit_merges_existing_fields() {
        let dir = TempDir::new().unwrap();
        let meta = JobMeta::started(7, vec!["yt-dlp".into()]);
        store(dir.path(), &meta).await.unwrap();

        record_exit(dir.path(), 0).await.unwrap();

        let merged = try_load(dir.path()).await.unwrap();
        assert_eq!(merged.pid, Some(7));
        assert_eq!(merged.cmd, vec!["yt-dlp".to_string()]);
        assert_eq!(merged.returncode, Some(0));
    }

    #[tokio::test]
    async fn test_record_exit_survives_corrupt_base() {
        let dir = TempDir::new().unwrap();
        fs::write(meta_path(dir.path()), b"not json at all")
            .await
            .unwrap();

        record_exit(dir.path(), 1).await.unwrap();

        let meta = try_load(dir.path()).await.unwrap();
        assert_eq!(meta.returncode, Some(1));
    }

    #[tokio::test]
    async fn test_record_exit_is_idempotent() {
        let dir = TempDir::new().unwrap();
        store(dir.path(), &JobMeta::started(1, vec![])).await.unwrap();

        record_exit(dir.path(), 3).await.unwrap();
        record_exit(dir.path(), 3).await.unwrap();

        assert_eq!(try_load(dir.path()).await.unwrap().returncode, Some(3));
    }
}
