//! Job handler trait.

use async_trait::async_trait;
use serde_json::Value;

use super::{JobContext, JobError};

/// The single entry point of a job type.
///
/// A handler is invoked by a worker, never by the code that enqueued the job.
/// It receives an owned copy of the arguments and may be invoked any number
/// of times, so implementations should keep no per-invocation state on `self`.
///
/// # Example
///
/// ```rust,ignore
/// use async_trait::async_trait;
/// use deferred_jobs::core::{JobContext, JobError, JobHandler};
///
/// struct Noop;
///
/// #[async_trait]
/// impl JobHandler for Noop {
///     async fn perform(&self, args: Vec<serde_json::Value>, ctx: JobContext) -> Result<(), JobError> {
///         tracing::info!(jid = %ctx.jid, count = args.len(), "noop");
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait JobHandler: Send + Sync + 'static {
    /// Run the job with its arguments.
    ///
    /// # Threading
    ///
    /// Called from a dedicated worker thread with its own single-threaded
    /// tokio runtime, so blocking for the duration of the job only occupies
    /// that worker.
    async fn perform(&self, args: Vec<Value>, ctx: JobContext) -> Result<(), JobError>;
}
