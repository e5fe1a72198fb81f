//! Job lifecycle management for background downloader processes.
//!
//! This crate provides:
//! - Spawning external downloader commands detached from the server session
//! - An in-memory registry of live process handles
//! - Durable per-job metadata records that survive restarts
//! - Append-only per-job logs with efficient tail reads
//! - A status reconciler merging handle, metadata and OS-level liveness
//!
//! The crate knows nothing about HTTP; `tubedl-api` drives it.

pub mod error;
pub mod logs;
pub mod meta;
pub mod process;
pub mod registry;
pub mod status;

pub use error::{JobError, JobResult};
pub use process::{pid_alive, JobHandle};
pub use registry::JobRegistry;
pub use status::{list, resolve, LIST_TAIL_LINES, STATUS_TAIL_LINES};
