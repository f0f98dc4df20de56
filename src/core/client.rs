//! Enqueue boundary and the in-process client behind it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;

use super::{
    Ack, DispatchMode, EnqueueError, EnqueueRequest, Job, JobRegistry, PoolStats, ScheduledJob,
    SharedScheduleStore, WorkerPool,
};
use crate::util::clock;

/// The queue as seen by code that enqueues work.
///
/// Every method returns as soon as the request is accepted or rejected; none
/// of them waits for the job to run.
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Submit a job with its dispatch mode.
    async fn enqueue(&self, request: EnqueueRequest) -> Result<Ack, EnqueueError>;

    /// Run `name` as soon as a worker is free.
    async fn enqueue_now(&self, name: &str, args: Vec<Value>) -> Result<Ack, EnqueueError> {
        self.enqueue(EnqueueRequest::new(Job::new(name, args), DispatchMode::Immediate))
            .await
    }

    /// Run `name` no earlier than `delay` from now.
    async fn enqueue_after(
        &self,
        name: &str,
        args: Vec<Value>,
        delay: Duration,
    ) -> Result<Ack, EnqueueError> {
        self.enqueue(EnqueueRequest::new(
            Job::new(name, args),
            DispatchMode::DelayBy(delay),
        ))
        .await
    }

    /// Run `name` no earlier than `at`.
    async fn enqueue_at(
        &self,
        name: &str,
        args: Vec<Value>,
        at: DateTime<Utc>,
    ) -> Result<Ack, EnqueueError> {
        self.enqueue(EnqueueRequest::new(Job::new(name, args), DispatchMode::RunAt(at)))
            .await
    }
}

/// In-process queue client.
///
/// Immediate jobs go straight to the worker pool; future jobs wait in the
/// scheduled set until the poller releases them.
#[derive(Clone)]
pub struct Client {
    registry: Arc<JobRegistry>,
    pool: Arc<WorkerPool>,
    scheduled: SharedScheduleStore,
}

impl Client {
    /// Create a client over an existing registry, pool and scheduled set.
    #[must_use]
    pub fn new(
        registry: Arc<JobRegistry>,
        pool: Arc<WorkerPool>,
        scheduled: SharedScheduleStore,
    ) -> Self {
        Self {
            registry,
            pool,
            scheduled,
        }
    }

    /// Number of jobs waiting in the scheduled set.
    #[must_use]
    pub fn scheduled_len(&self) -> usize {
        self.scheduled.lock().len()
    }

    /// Worker pool statistics.
    #[must_use]
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Synchronous form of [`JobQueue::enqueue`].
    ///
    /// # Errors
    ///
    /// - `EnqueueError::UnknownJob` if no handler is registered for the job
    /// - `EnqueueError::Shutdown` if the worker pool has been shut down
    /// - `EnqueueError::QueueFull` if the worker queue or scheduled set is full
    pub fn push(&self, request: EnqueueRequest) -> Result<Ack, EnqueueError> {
        let EnqueueRequest { job, mode } = request;
        if !self.registry.contains(&job.name) {
            tracing::warn!(job = %job.name, "rejecting job with no registered handler");
            return Err(EnqueueError::UnknownJob(job.name));
        }
        if self.pool.is_shutdown() {
            return Err(EnqueueError::Shutdown);
        }

        let jid = job.jid;
        let name = job.name.clone();
        match mode.run_at(clock::now()) {
            None => {
                self.pool.submit(job)?;
                tracing::info!(jid = %jid, job = %name, "job enqueued");
                Ok(Ack {
                    jid,
                    job: name,
                    run_at: None,
                })
            }
            Some(run_at) => {
                self.scheduled.lock().schedule(ScheduledJob { run_at, job })?;
                tracing::info!(jid = %jid, job = %name, run_at = %run_at, "job scheduled");
                Ok(Ack {
                    jid,
                    job: name,
                    run_at: Some(run_at),
                })
            }
        }
    }
}

#[async_trait]
impl JobQueue for Client {
    async fn enqueue(&self, request: EnqueueRequest) -> Result<Ack, EnqueueError> {
        self.push(request)
    }
}
