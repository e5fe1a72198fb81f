//! Process supervision: spawning detached downloader processes and
//! observing their termination.
//!
//! The spawned child gets its own process group so it is not reaped by
//! terminal signals sent to the server and keeps running across a server
//! shutdown. The child itself is owned by the per-job waiter task; everyone
//! else observes the process through a cheap, cloneable [`JobHandle`]
//! backed by a watch channel the waiter publishes the exit code on.

use std::os::unix::process::ExitStatusExt;
use std::process::{ExitStatus, Stdio};

use nix::errno::Errno;
use nix::sys::signal::kill;
use nix::unistd::Pid;
use tokio::process::{Child, Command};
use tokio::sync::watch;
use tracing::debug;

use crate::error::{JobError, JobResult};

/// In-memory live reference to a spawned job process.
///
/// `poll` never blocks; `wait` suspends until the waiter task reports the
/// exit code, and is never called on a request-serving path.
#[derive(Debug, Clone)]
pub struct JobHandle {
    pid: u32,
    exit: watch::Receiver<Option<i32>>,
}

impl JobHandle {
    /// OS process id of the child.
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Non-blocking status check: `None` while the process runs, the exit
    /// code once the waiter has reaped it.
    pub fn poll(&self) -> Option<i32> {
        *self.exit.borrow()
    }

    /// Wait for the process to terminate. Returns `None` only if the
    /// supervising task died without ever reporting an exit code.
    pub async fn wait(&mut self) -> Option<i32> {
        loop {
            if let Some(code) = *self.exit.borrow() {
                return Some(code);
            }
            if self.exit.changed().await.is_err() {
                return *self.exit.borrow();
            }
        }
    }
}

/// A freshly spawned job: the child (to be moved into the waiter task), the
/// sender the waiter publishes the exit code on, and the shareable handle.
#[derive(Debug)]
pub struct SpawnedJob {
    pub pid: u32,
    pub child: Child,
    pub exit_tx: watch::Sender<Option<i32>>,
    pub handle: JobHandle,
}

/// Spawn `argv` in its own process group with combined stdout/stderr
/// appended to `log`.
///
/// Failures to locate the executable or create the process surface here,
/// synchronously; exactly one OS process exists per `Ok` return.
pub fn spawn(argv: &[String], log: std::fs::File) -> JobResult<SpawnedJob> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| JobError::Spawn(std::io::Error::other("empty command")))?;

    let stderr_log = log.try_clone().map_err(JobError::Spawn)?;

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::from(log))
        .stderr(Stdio::from(stderr_log))
        .process_group(0);

    let child = cmd.spawn().map_err(JobError::Spawn)?;
    let pid = child
        .id()
        .ok_or_else(|| JobError::Spawn(std::io::Error::other("child exited before pid read")))?;

    debug!(pid, program = %program, "spawned job process");

    let (exit_tx, exit_rx) = watch::channel(None);
    Ok(SpawnedJob {
        pid,
        child,
        exit_tx,
        handle: JobHandle { pid, exit: exit_rx },
    })
}

/// Translate an [`ExitStatus`] into the recorded exit code: the plain code
/// on normal exit, `-(signal)` when the process was killed by a signal.
pub fn exit_code(status: ExitStatus) -> i32 {
    match status.code() {
        Some(code) => code,
        None => -status.signal().unwrap_or(0),
    }
}

/// OS-level liveness probe for a pid, used for jobs that lost their handle
/// across a server restart.
///
/// Known limitation: the OS may have reused the pid for an unrelated
/// process, in which case a finished job reads as running until its real
/// exit is never observed. Accepted tradeoff for restart visibility.
pub fn pid_alive(pid: u32) -> bool {
    // Signal 0 probes existence without delivering anything; EPERM still
    // means the process exists.
    matches!(
        kill(Pid::from_raw(pid as i32), None),
        Ok(()) | Err(Errno::EPERM)
    )
}
