//! `HelloJob`: reports its arguments, simulates work, reports completion.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::core::{
    build_job_event, EventSink, JobAction, JobContext, JobError, JobHandler, TracingEventSink,
};
use crate::util::clock;

/// Sample job that sleeps for a fixed duration and logs around it.
///
/// Holds only its configuration and sink, so invocations never share state.
#[derive(Clone)]
pub struct HelloJob {
    work: Duration,
    sink: Arc<dyn EventSink>,
}

impl HelloJob {
    /// Registered name.
    pub const NAME: &'static str = "HelloJob";

    /// Default simulated work duration.
    pub const DEFAULT_WORK: Duration = Duration::from_secs(5);

    /// Create the job with the default duration, logging through `tracing`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_sink(Self::DEFAULT_WORK, Arc::new(TracingEventSink))
    }

    /// Create the job with an explicit duration and sink.
    #[must_use]
    pub fn with_sink(work: Duration, sink: Arc<dyn EventSink>) -> Self {
        Self { work, sink }
    }
}

impl Default for HelloJob {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobHandler for HelloJob {
    async fn perform(&self, args: Vec<Value>, ctx: JobContext) -> Result<(), JobError> {
        let rendered = Value::Array(args).to_string();
        self.sink.record(build_job_event(
            ctx.jid,
            ctx.name.as_str(),
            JobAction::Start,
            format!("HelloJob started with args {rendered}"),
        ));

        // Occupies this worker for the duration; other workers keep running.
        tokio::time::sleep(self.work).await;

        let mut done = build_job_event(ctx.jid, ctx.name, JobAction::Complete, String::new());
        done.message = format!("HelloJob {}", clock::format_timestamp(done.at));
        self.sink.record(done);
        Ok(())
    }
}
