//! Worker pool with dedicated worker threads.
//!
//! This module provides a `WorkerPool` that executes jobs away from the async
//! runtime serving requests. Each worker is an OS thread with its own
//! single-threaded tokio runtime, fed by a bounded channel.
//!
//! # Key Features
//!
//! - **Non-blocking submit**: a full queue is reported, never waited on
//! - **Registry dispatch**: workers resolve the handler by job name
//! - **Failure isolation**: handler errors and panics are counted, the worker survives
//!
//! # Example
//!
//! ```rust,ignore
//! use deferred_jobs::core::{Job, JobRegistry, WorkerPool};
//! use deferred_jobs::config::WorkerPoolConfig;
//!
//! let pool = WorkerPool::new(
//!     WorkerPoolConfig::new().with_worker_count(4),
//!     Arc::new(JobRegistry::new().register("HelloJob", hello)),
//! )?;
//! pool.submit(Job::new("HelloJob", vec![json!("hi")]))?;
//! ```

mod native;

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use super::EnqueueError;

/// Errors that can occur when using a `WorkerPool`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The job queue is full; no more jobs can be accepted.
    QueueFull,

    /// The pool has been shut down.
    PoolShutdown,

    /// Configuration validation failed.
    InvalidConfig(String),

    /// Internal error (worker thread spawn failure, channel closed, etc.).
    Internal(String),
}

impl fmt::Display for PoolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::QueueFull => write!(f, "job queue is full"),
            Self::PoolShutdown => write!(f, "pool has been shut down"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for PoolError {}

impl From<PoolError> for EnqueueError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::QueueFull => Self::QueueFull("worker queue is full".into()),
            PoolError::PoolShutdown => Self::Shutdown,
            other => Self::Backend(other.to_string()),
        }
    }
}

/// Statistics about pool utilization.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Number of worker threads.
    pub worker_count: usize,

    /// Currently executing jobs.
    pub active_jobs: u64,

    /// Jobs waiting for a worker.
    pub queued_jobs: u64,

    /// Total jobs that ran to completion.
    pub completed_jobs: u64,

    /// Total jobs that failed, panicked or had no handler.
    pub failed_jobs: u64,

    /// Total jobs accepted by `submit`.
    pub submitted_jobs: u64,
}

/// Internal counters for pool statistics (thread-safe).
#[derive(Debug, Default)]
pub(crate) struct PoolCounters {
    pub active_jobs: AtomicU64,
    pub queued_jobs: AtomicU64,
    pub completed_jobs: AtomicU64,
    pub failed_jobs: AtomicU64,
    pub submitted_jobs: AtomicU64,
}

impl PoolCounters {
    /// Get a snapshot of current statistics.
    pub fn snapshot(&self, worker_count: usize) -> PoolStats {
        PoolStats {
            worker_count,
            active_jobs: self.active_jobs.load(Ordering::Relaxed),
            queued_jobs: self.queued_jobs.load(Ordering::Relaxed),
            completed_jobs: self.completed_jobs.load(Ordering::Relaxed),
            failed_jobs: self.failed_jobs.load(Ordering::Relaxed),
            submitted_jobs: self.submitted_jobs.load(Ordering::Relaxed),
        }
    }
}

pub use native::WorkerPool;
