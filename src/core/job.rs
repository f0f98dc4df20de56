//! Job descriptors, dispatch modes and acknowledgments.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::util::clock;

/// Unique job identifier assigned at creation time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(Uuid);

impl JobId {
    /// Generate a fresh random identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

/// A named unit of deferred work with its arguments.
///
/// Arguments are owned copies taken at enqueue time; the job shares nothing
/// with the code that created it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    /// Job identifier.
    pub jid: JobId,
    /// Registered handler name, e.g. `HelloJob`.
    pub name: String,
    /// Ordered positional arguments.
    pub args: Vec<Value>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Job {
    /// Create a job with a fresh identifier.
    pub fn new(name: impl Into<String>, args: Vec<Value>) -> Self {
        Self {
            jid: JobId::new(),
            name: name.into(),
            args,
            created_at: clock::now(),
        }
    }
}

/// When a job becomes eligible to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// As soon as a worker is free.
    Immediate,
    /// No earlier than the given interval after enqueue.
    DelayBy(Duration),
    /// No earlier than the given instant.
    RunAt(DateTime<Utc>),
}

impl DispatchMode {
    /// Resolve the earliest eligible run time relative to `now`.
    ///
    /// Returns `None` when the job is eligible immediately, which includes
    /// zero delays and instants that are not in the future.
    #[must_use]
    pub fn run_at(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match *self {
            Self::Immediate => None,
            Self::DelayBy(delay) if delay.is_zero() => None,
            Self::DelayBy(delay) => Some(clock::add_duration(now, delay)),
            Self::RunAt(at) if at <= now => None,
            Self::RunAt(at) => Some(at),
        }
    }
}

/// A job paired with its dispatch mode.
#[derive(Debug, Clone, PartialEq)]
pub struct EnqueueRequest {
    /// The job to run.
    pub job: Job,
    /// When it may run.
    pub mode: DispatchMode,
}

impl EnqueueRequest {
    /// Pair a job with a dispatch mode.
    #[must_use]
    pub const fn new(job: Job, mode: DispatchMode) -> Self {
        Self { job, mode }
    }
}

/// Confirmation that an enqueue request was accepted.
///
/// It says nothing about whether the job has run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    /// Identifier of the accepted job.
    pub jid: JobId,
    /// Job name.
    pub job: String,
    /// Scheduled run time; `None` for immediate dispatch.
    pub run_at: Option<DateTime<Utc>>,
}

/// Metadata handed to a handler alongside the arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobContext {
    /// Job identifier.
    pub jid: JobId,
    /// Job name.
    pub name: String,
    /// When the job was created.
    pub created_at: DateTime<Utc>,
    /// When a worker started running the job.
    pub started_at: DateTime<Utc>,
}

impl JobContext {
    /// Build the context for a job a worker is about to run.
    #[must_use]
    pub fn for_job(job: &Job) -> Self {
        Self {
            jid: job.jid,
            name: job.name.clone(),
            created_at: job.created_at,
            started_at: clock::now(),
        }
    }
}
