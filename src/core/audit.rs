//! Observation sinks for job lifecycle records.
//!
//! Handlers report what they did through an [`EventSink`]; the tracing sink
//! is the default, and the in-memory sink lets tests inspect the records.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::core::JobId;
use crate::util::clock;

/// Lifecycle stage of an observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    /// The handler started.
    Start,
    /// The handler finished.
    Complete,
}

impl JobAction {
    /// Lowercase name used in log fields.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::Complete => "complete",
        }
    }
}

/// A single observation emitted by a job handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEvent {
    /// Job identifier.
    pub jid: JobId,
    /// Job name.
    pub job: String,
    /// Lifecycle stage.
    pub action: JobAction,
    /// When the observation was taken.
    pub at: DateTime<Utc>,
    /// Human-readable message.
    pub message: String,
}

/// Destination for job observations.
pub trait EventSink: Send + Sync {
    /// Record an observation.
    fn record(&self, event: JobEvent);
}

/// Sink that writes observations as structured `tracing` events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingEventSink;

impl EventSink for TracingEventSink {
    fn record(&self, event: JobEvent) {
        tracing::info!(
            jid = %event.jid,
            job = %event.job,
            action = event.action.as_str(),
            "{}",
            event.message
        );
    }
}

/// In-memory sink for testing and dev.
pub struct InMemoryEventSink {
    events: Mutex<VecDeque<JobEvent>>,
    max_events: usize,
}

impl InMemoryEventSink {
    /// Create a new in-memory sink with a bounded buffer.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Retrieve a snapshot of stored events.
    #[must_use]
    pub fn events(&self) -> Vec<JobEvent> {
        self.events.lock().iter().cloned().collect()
    }

    /// Stored events for one job.
    #[must_use]
    pub fn events_for(&self, jid: JobId) -> Vec<JobEvent> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.jid == jid)
            .cloned()
            .collect()
    }

    /// Number of stored events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    /// Whether no events are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for InMemoryEventSink {
    fn record(&self, event: JobEvent) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event);
    }
}

/// Helper to build an event stamped with the current time.
pub fn build_job_event(
    jid: JobId,
    job: impl Into<String>,
    action: JobAction,
    message: impl Into<String>,
) -> JobEvent {
    JobEvent {
        jid,
        job: job.into(),
        action,
        at: clock::now(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounded_buffer_drops_oldest() {
        let sink = InMemoryEventSink::new(2);
        let jid = JobId::new();
        sink.record(build_job_event(jid, "HelloJob", JobAction::Start, "one"));
        sink.record(build_job_event(jid, "HelloJob", JobAction::Complete, "two"));
        sink.record(build_job_event(jid, "HelloJob", JobAction::Start, "three"));

        let messages: Vec<_> = sink.events().into_iter().map(|e| e.message).collect();
        assert_eq!(messages, vec!["two", "three"]);
    }

    #[test]
    fn test_filters_by_job() {
        let sink = InMemoryEventSink::new(10);
        let a = JobId::new();
        let b = JobId::new();
        sink.record(build_job_event(a, "HelloJob", JobAction::Start, "a"));
        sink.record(build_job_event(b, "HelloJob", JobAction::Start, "b"));
        assert_eq!(sink.events_for(a).len(), 1);
        assert_eq!(sink.len(), 2);
    }
}
