//! Scheduled-set abstraction for jobs whose run time lies in the future.

use chrono::{DateTime, Utc};

use super::{EnqueueError, Job};

/// A job waiting in the scheduled set.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduledJob {
    /// Earliest time the job may run.
    pub run_at: DateTime<Utc>,
    /// The job itself.
    pub job: Job,
}

/// Abstraction for scheduled-set backends.
pub trait ScheduleStore: Send {
    /// Store a job until its run time, if space permits.
    fn schedule(&mut self, entry: ScheduledJob) -> Result<(), EnqueueError>;
    /// Remove and return every job due at or before `now`, earliest first.
    fn pop_due(&mut self, now: DateTime<Utc>) -> Vec<ScheduledJob>;
    /// Run time of the earliest stored job.
    fn next_run_at(&self) -> Option<DateTime<Utc>>;
    /// Maximum depth allowed for this store.
    fn max_depth(&self) -> usize;
    /// Current depth.
    fn len(&self) -> usize;
    /// Whether nothing is stored.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
