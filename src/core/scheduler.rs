//! Poller that moves due jobs from the scheduled set to the worker pool.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{PoolError, ScheduleStore, ScheduledJob, WorkerPool};
use crate::util::clock;

/// Scheduled set shared between the client and the poller.
pub type SharedScheduleStore = Arc<Mutex<dyn ScheduleStore>>;

/// Releases due jobs from a scheduled set into a worker pool.
///
/// A job is never released before its run time; how late it runs is bounded
/// by the poll interval plus worker availability.
#[derive(Clone)]
pub struct SchedulePoller {
    store: SharedScheduleStore,
    pool: Arc<WorkerPool>,
    interval: Duration,
}

/// Handle to a running poller task.
pub struct PollerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
    join: JoinHandle<()>,
}

impl PollerHandle {
    /// Stop the poller and wait for its task to finish.
    pub async fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.join).await {
            tracing::warn!(error = %e, "schedule poller task ended abnormally");
        }
    }

    /// Whether the poller task has finished.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        // A dropped handle stops the loop without waiting for it.
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl SchedulePoller {
    /// Create a poller over `store` feeding `pool` every `interval`.
    #[must_use]
    pub fn new(store: SharedScheduleStore, pool: Arc<WorkerPool>, interval: Duration) -> Self {
        Self {
            store,
            pool,
            interval,
        }
    }

    /// Release every job due at `now`. Returns how many reached the pool.
    ///
    /// If the pool is full, the job and everything still pending are put back
    /// into the scheduled set for the next tick.
    pub fn tick(&self, now: DateTime<Utc>) -> usize {
        let due = {
            let mut store = self.store.lock();
            match store.next_run_at() {
                Some(next) if next <= now => store.pop_due(now),
                _ => return 0,
            }
        };

        let mut released = 0;
        let mut pending = due.into_iter();
        while let Some(entry) = pending.next() {
            match self.pool.submit(entry.job.clone()) {
                Ok(()) => {
                    released += 1;
                    tracing::debug!(jid = %entry.job.jid, job = %entry.job.name, "released scheduled job");
                }
                Err(PoolError::QueueFull) => {
                    tracing::warn!(
                        jid = %entry.job.jid,
                        "worker queue full, deferring scheduled jobs to next poll"
                    );
                    self.reschedule(std::iter::once(entry).chain(pending));
                    break;
                }
                Err(e) => {
                    tracing::error!(jid = %entry.job.jid, job = %entry.job.name, error = %e, "dropping scheduled job");
                }
            }
        }
        released
    }

    fn reschedule(&self, entries: impl Iterator<Item = ScheduledJob>) {
        let mut store = self.store.lock();
        for entry in entries {
            let jid = entry.job.jid;
            if let Err(e) = store.schedule(entry) {
                tracing::error!(jid = %jid, error = %e, "failed to reschedule job, dropping it");
            }
        }
    }

    /// Run the poll loop on the current tokio runtime until stopped.
    #[must_use]
    pub fn spawn(self) -> PollerHandle {
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            tracing::info!(interval = ?self.interval, "schedule poller started");
            loop {
                tokio::select! {
                    _ = &mut stop_rx => break,
                    _ = ticker.tick() => {
                        if self.pool.is_shutdown() {
                            break;
                        }
                        let released = self.tick(clock::now());
                        if released > 0 {
                            tracing::debug!(released, "scheduled jobs released");
                        }
                    }
                }
            }
            tracing::info!("schedule poller stopped");
        });
        PollerHandle {
            stop_tx: Some(stop_tx),
            join,
        }
    }
}
