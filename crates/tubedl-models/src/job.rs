//! Job identity and durable metadata.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Unique identifier for a job.
///
/// Generated once at creation and never reused; doubles as the name of the
/// job's on-disk directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub String);

impl JobId {
    /// Generate a new random job ID.
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Create from an existing string.
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the inner string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Durable per-job metadata record, mirrored to `meta.json` in the job
/// directory.
///
/// Written once at spawn time with `pid` and `cmd`, then updated at most
/// twice after that with the terminal `returncode` (waiter and status
/// reconciler both write the same value, so the update is idempotent).
/// Every field is optional on the wire so a partial record still parses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobMeta {
    /// OS process id assigned at spawn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,

    /// Full command line the job was started with.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cmd: Vec<String>,

    /// Terminal exit code; negative values encode death by signal.
    /// Absent while the process is still running.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub returncode: Option<i32>,
}

impl JobMeta {
    /// Create the initial record written right after a successful spawn.
    pub fn started(pid: u32, cmd: Vec<String>) -> Self {
        Self {
            pid: Some(pid),
            cmd,
            returncode: None,
        }
    }

    /// Whether a terminal exit status has been recorded.
    pub fn is_finished(&self) -> bool {
        self.returncode.is_some()
    }
}
