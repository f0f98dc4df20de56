//! Builds the job service (worker pool, scheduled set, poller, client) from configuration.

use std::sync::Arc;

use anyhow::Context;
use parking_lot::Mutex;

use crate::config::ServiceConfig;
use crate::core::{
    AppResult, Client, JobRegistry, PollerHandle, PoolStats, SchedulePoller, SharedScheduleStore,
    WorkerPool,
};
use crate::infra::queue::InMemoryScheduledSet;
use crate::jobs::HelloJob;

/// A running in-process job service.
pub struct JobService {
    client: Arc<Client>,
    pool: Arc<WorkerPool>,
    poller: Option<PollerHandle>,
}

impl JobService {
    /// Client used to enqueue jobs.
    #[must_use]
    pub fn client(&self) -> Arc<Client> {
        Arc::clone(&self.client)
    }

    /// Current worker pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.pool.stats()
    }

    /// Stop the poller, then join the worker pool once it has run the jobs
    /// already accepted for immediate execution.
    ///
    /// Jobs still in the scheduled set are discarded with a warning.
    pub async fn shutdown(mut self) {
        if let Some(poller) = self.poller.take() {
            poller.stop().await;
        }
        let pending = self.client.scheduled_len();
        if pending > 0 {
            tracing::warn!(pending, "discarding scheduled jobs on shutdown");
        }
        let pool = Arc::clone(&self.pool);
        if let Err(e) = tokio::task::spawn_blocking(move || pool.shutdown()).await {
            tracing::error!(error = %e, "worker pool shutdown task failed");
        }
    }
}

/// Registry with the jobs shipped in this crate, tuned by `cfg`.
#[must_use]
pub fn default_registry(cfg: &ServiceConfig) -> JobRegistry {
    JobRegistry::new().register(
        HelloJob::NAME,
        HelloJob::with_sink(cfg.hello_job_work(), Arc::new(crate::core::TracingEventSink)),
    )
}

/// Build and start the job service. Must be called from within a tokio runtime.
///
/// # Errors
///
/// Fails if the configuration is invalid or the worker pool cannot start.
pub fn build_service(cfg: &ServiceConfig, registry: JobRegistry) -> AppResult<JobService> {
    cfg.validate().context("invalid service configuration")?;

    let registry = Arc::new(registry);
    let pool = Arc::new(
        WorkerPool::new(cfg.pool.clone(), Arc::clone(&registry))
            .context("failed to start worker pool")?,
    );
    let scheduled: SharedScheduleStore =
        Arc::new(Mutex::new(InMemoryScheduledSet::new(cfg.max_scheduled)));

    let poller = SchedulePoller::new(Arc::clone(&scheduled), Arc::clone(&pool), cfg.poll_interval())
        .spawn();
    let client = Arc::new(Client::new(registry, Arc::clone(&pool), scheduled));

    tracing::info!(
        workers = cfg.pool.worker_count,
        max_scheduled = cfg.max_scheduled,
        poll_interval_ms = cfg.poll_interval_ms,
        "job service started"
    );

    Ok(JobService {
        client,
        pool,
        poller: Some(poller),
    })
}
