//! Append-only per-job logs with bounded tail reads.
//!
//! The downloader's combined stdout/stderr is redirected into `job.log`
//! inside the job directory at spawn time. Nothing in this crate interprets
//! the bytes; they are captured verbatim and served back to pollers.

use std::io::SeekFrom;
use std::path::{Path, PathBuf};

use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};

use crate::error::JobResult;

/// Log file name inside a job directory.
pub const LOG_FILE: &str = "job.log";

/// Block size for backward tail reads.
const TAIL_BLOCK: u64 = 1024;

/// Path of the log file inside a job directory.
pub fn log_path(job_dir: &Path) -> PathBuf {
    job_dir.join(LOG_FILE)
}

/// Create the log file for a job and return it opened for appending.
/// The returned handle is handed straight to the spawned child
/// as its stdout/stderr, so this uses a blocking `std::fs::File`.
pub fn create(job_dir: &Path) -> std::io::Result<std::fs::File> {
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path(job_dir))
}

/// Read the entire log file. `None` when no log exists yet.
pub async fn read_all(job_dir: &Path) -> JobResult<Option<Vec<u8>>> {
    match tokio::fs::read(log_path(job_dir)).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Read the last `max_lines` lines of `path` as a lossily-decoded string.
///
/// A missing log is treated as empty, since the child may not have produced
/// output yet when the first status poll arrives.
pub async fn tail(path: &Path, max_lines: usize) -> JobResult<String> {
    let bytes = tail_bytes(path, max_lines).await?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Read the last `max_lines` lines of `path`, byte-identical to the file's
/// trailing content.
///
/// Reads backward from the end in fixed-size blocks, accumulating until
/// enough newlines have been seen or the start of the file is reached.
/// Handles files smaller than one block and files without a trailing
/// newline (the unterminated fragment counts as a line).
pub async fn tail_bytes(path: &Path, max_lines: usize) -> JobResult<Vec<u8>> {
    let mut file = match File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    let mut remaining = file.seek(SeekFrom::End(0)).await?;
    let mut data: Vec<u8> = Vec::new();

    // One extra newline so the oldest retained line is complete, not a
    // fragment cut mid-block; trim_to_lines drops the excess.
    while remaining > 0 && newline_count(&data) <= max_lines {
        let step = remaining.min(TAIL_BLOCK);
        remaining -= step;
        file.seek(SeekFrom::Start(remaining)).await?;

        let mut chunk = vec![0u8; step as usize];
        file.read_exact(&mut chunk).await?;
        chunk.extend_from_slice(&data);
        data = chunk;
    }

    Ok(trim_to_lines(data, max_lines))
}

fn newline_count(data: &[u8]) -> usize {
    data.iter().filter(|&&b| b == b'\n').count()
}

/// Keep only the last `max_lines` lines of `data`. A trailing newline
/// terminates the final line rather than starting an empty one.
fn trim_to_lines(data: Vec<u8>, max_lines: usize) -> Vec<u8> {
    if max_lines == 0 {
        return Vec::new();
    }

    let mut seen = 0;
    for i in (0..data.len()).rev() {
        if data[i] != b'\n' {
            continue;
        }
        if i == data.len() - 1 {
            continue;
        }
        seen += 1;
        if seen == max_lines {
            return data[i + 1..].to_vec();
        }
    }

    data
}
