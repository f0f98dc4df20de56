//! Error types for enqueue and job execution.

use thiserror::Error;

/// Errors raised when the queue cannot accept a job.
///
/// These are surfaced synchronously to whoever called `enqueue`; nothing here
/// is retried automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EnqueueError {
    /// No handler is registered under the job name.
    #[error("unknown job: {0}")]
    UnknownJob(String),
    /// The target queue has reached its configured depth.
    #[error("queue full: {0}")]
    QueueFull(String),
    /// The queue has been shut down and no longer accepts work.
    #[error("queue is shut down")]
    Shutdown,
    /// The job arguments could not be accepted.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
    /// Backend-specific failure with context.
    #[error("backend error: {0}")]
    Backend(String),
}

impl EnqueueError {
    /// Whether the failure is transient capacity pressure rather than a bad request.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::QueueFull(_) | Self::Shutdown | Self::Backend(_))
    }
}

/// Errors raised while a worker executes a job.
///
/// The originating request has already completed by the time these occur, so
/// they are only logged and counted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The handler reported a failure.
    #[error("job failed: {0}")]
    Failed(String),
    /// No handler is registered under the job name.
    #[error("no handler registered for {0}")]
    UnknownJob(String),
    /// The handler panicked.
    #[error("job panicked: {0}")]
    Panicked(String),
}

/// Configuration parsing and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// JSON input could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] serde_json::Error),
    /// An environment variable held a value of the wrong shape.
    #[error("invalid value for {key}: {value}")]
    InvalidEnv {
        /// Variable name.
        key: String,
        /// Offending value.
        value: String,
    },
    /// A value failed validation.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
