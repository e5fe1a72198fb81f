//! Status reports served to pollers.

use serde::{Deserialize, Serialize};

/// Authoritative point-in-time view of one job, merged from the live
/// process handle, the durable metadata record, and the log tail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatus {
    /// Job ID
    pub job_id: String,
    /// OS process id, if the spawn recorded one
    pub pid: Option<u32>,
    /// Whether the underlying process is still alive
    pub running: bool,
    /// Terminal exit code once known; negative values encode signals
    pub returncode: Option<i32>,
    /// Bounded tail of the captured downloader output
    pub log_tail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_null_returncode() {
        let status = JobStatus {
            job_id: "abc".into(),
            pid: Some(7),
            running: true,
            returncode: None,
            log_tail: String::new(),
        };

        let json = serde_json::to_value(&status).unwrap();
        // Pollers rely on the key being present while the job runs.
        assert!(json.get("returncode").unwrap().is_null());
        assert_eq!(json.get("running").unwrap(), true);
    }
}
