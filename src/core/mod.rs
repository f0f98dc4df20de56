//! Job model, enqueue boundary, registry, scheduling and execution.

pub mod audit;
pub mod client;
pub mod error;
pub mod executor;
pub mod job;
pub mod registry;
pub mod schedule;
pub mod scheduler;
pub mod worker_pool;

pub use audit::{
    build_job_event, EventSink, InMemoryEventSink, JobAction, JobEvent, TracingEventSink,
};
pub use client::{Client, JobQueue};
pub use error::{AppResult, ConfigError, EnqueueError, JobError};
pub use executor::JobHandler;
pub use job::{Ack, DispatchMode, EnqueueRequest, Job, JobContext, JobId};
pub use registry::JobRegistry;
pub use schedule::{ScheduleStore, ScheduledJob};
pub use scheduler::{PollerHandle, SchedulePoller, SharedScheduleStore};
pub use worker_pool::{PoolError, PoolStats, WorkerPool};
