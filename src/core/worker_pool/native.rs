//! Native implementation of `WorkerPool` using OS threads.
//!
//! This implementation spawns dedicated OS threads that each have their own
//! single-threaded tokio runtime, so a job that sleeps or computes occupies
//! one worker and never the runtime serving requests.
//!
//! # Design Principles
//!
//! - **No polling**: workers block on channel recv
//! - **Clean shutdown**: dropping the sender unblocks workers naturally

use std::any::Any;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::WorkerPoolConfig;
use crate::core::{Job, JobContext, JobError, JobRegistry};

use super::{PoolCounters, PoolError, PoolStats};

/// Worker pool with dedicated OS threads for job execution.
///
/// # Design
///
/// - **No polling**: workers block on the channel until a job or shutdown arrives
/// - **Clean shutdown**: dropping the sender naturally unblocks all workers
/// - **Lock-free fast path**: atomic counters, a brief mutex only to reach the sender
pub struct WorkerPool {
    /// Pool configuration.
    config: WorkerPoolConfig,

    /// Job sender (to workers). Option allows clean shutdown by dropping.
    job_tx: Mutex<Option<Sender<Job>>>,

    /// Pool statistics counters (lock-free atomics).
    counters: Arc<PoolCounters>,

    /// Shutdown flag (lock-free atomic).
    shutdown: Arc<AtomicBool>,

    /// Worker thread handles.
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl WorkerPool {
    /// Create a new worker pool with the given configuration and registry.
    ///
    /// This spawns `config.worker_count` OS threads, each with its own
    /// single-threaded tokio runtime for executing jobs.
    ///
    /// # Errors
    ///
    /// Returns `PoolError::InvalidConfig` if the configuration is invalid and
    /// `PoolError::Internal` if a worker thread cannot be spawned.
    pub fn new(config: WorkerPoolConfig, registry: Arc<JobRegistry>) -> Result<Self, PoolError> {
        config.validate().map_err(PoolError::InvalidConfig)?;

        let (job_tx, job_rx) = bounded::<Job>(config.max_queue_depth);
        let counters = Arc::new(PoolCounters::default());
        let shutdown = Arc::new(AtomicBool::new(false));

        let mut workers = Vec::with_capacity(config.worker_count);
        for worker_id in 0..config.worker_count {
            let worker = spawn_worker(
                worker_id,
                job_rx.clone(),
                Arc::clone(&registry),
                Arc::clone(&counters),
                config.thread_stack_size,
            )
            .map_err(|e| PoolError::Internal(format!("failed to spawn worker {worker_id}: {e}")))?;
            workers.push(worker);
        }

        info!(
            worker_count = config.worker_count,
            max_queue_depth = config.max_queue_depth,
            jobs = ?registry.names(),
            "WorkerPool initialized"
        );

        Ok(Self {
            config,
            job_tx: Mutex::new(Some(job_tx)),
            counters,
            shutdown,
            workers: Mutex::new(workers),
        })
    }

    /// Hand a job to the workers.
    ///
    /// Never blocks: fails immediately if the queue is full.
    ///
    /// # Errors
    ///
    /// - `PoolError::QueueFull` if the job queue is full
    /// - `PoolError::PoolShutdown` if the pool has been shut down
    pub fn submit(&self, job: Job) -> Result<(), PoolError> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(PoolError::PoolShutdown);
        }

        let job_tx_guard = self.job_tx.lock();
        let Some(job_tx) = job_tx_guard.as_ref() else {
            return Err(PoolError::PoolShutdown);
        };

        let jid = job.jid;
        // Counted before the send so a fast worker never decrements below zero.
        self.counters.queued_jobs.fetch_add(1, Ordering::Relaxed);
        match job_tx.try_send(job) {
            Ok(()) => {
                self.counters.submitted_jobs.fetch_add(1, Ordering::Relaxed);
                debug!(jid = %jid, "Job submitted to worker pool");
                Ok(())
            }
            Err(crossbeam_channel::TrySendError::Full(_)) => {
                self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                warn!(jid = %jid, "Worker pool queue is full");
                Err(PoolError::QueueFull)
            }
            Err(crossbeam_channel::TrySendError::Disconnected(_)) => {
                self.counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                Err(PoolError::PoolShutdown)
            }
        }
    }

    /// Get current pool statistics.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.counters.snapshot(self.config.worker_count)
    }

    /// Whether `shutdown` has been called or the pool dropped.
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::Acquire)
    }

    /// Shut down the pool gracefully with timeout.
    ///
    /// New submissions are rejected at once. Jobs already accepted into the
    /// queue are still run: dropping the sender lets workers empty the channel
    /// and then exit. Each worker is joined for up to `shutdown_timeout_secs`.
    ///
    /// Workers that don't exit within the timeout are detached, and the jobs
    /// they still hold are reported with a warning.
    pub fn shutdown(&self) {
        if self.shutdown.swap(true, Ordering::AcqRel) {
            return;
        }

        info!("Shutting down worker pool");

        {
            let mut job_tx = self.job_tx.lock();
            *job_tx = None;
        }

        let timeout = Duration::from_secs(self.config.shutdown_timeout_secs);
        let mut workers = self.workers.lock();
        let worker_count = workers.len();

        for (idx, worker) in workers.drain(..).enumerate() {
            // Join through a helper thread so the wait can time out.
            let (tx, rx) = std::sync::mpsc::channel();
            let join_thread = thread::spawn(move || {
                let result = worker.join();
                let _ = tx.send(result.is_ok());
            });

            match rx.recv_timeout(timeout) {
                Ok(true) => {
                    debug!(worker_id = idx, "Worker joined successfully");
                }
                Ok(false) => {
                    warn!(worker_id = idx, "Worker panicked");
                }
                Err(_) => {
                    warn!(worker_id = idx, "Worker did not exit within timeout - detaching");
                    continue;
                }
            }

            let _ = join_thread.join();
        }

        let stats = self.stats();
        let outstanding = stats.queued_jobs + stats.active_jobs;
        if outstanding > 0 {
            warn!(
                outstanding = outstanding,
                queued = stats.queued_jobs,
                active = stats.active_jobs,
                "Worker pool shut down with jobs still outstanding on detached workers"
            );
        }

        info!(
            worker_count = worker_count,
            completed = stats.completed_jobs,
            failed = stats.failed_jobs,
            "Worker pool shut down complete"
        );
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        // Signal shutdown but don't join workers in Drop; detached workers
        // still run whatever is buffered. Explicit shutdown() waits for them.
        if !self.shutdown.swap(true, Ordering::AcqRel) {
            let mut job_tx = self.job_tx.lock();
            *job_tx = None;
            debug!("WorkerPool dropped without explicit shutdown - workers will be detached");
        }
    }
}

/// Spawn a worker thread.
fn spawn_worker(
    worker_id: usize,
    job_rx: Receiver<Job>,
    registry: Arc<JobRegistry>,
    counters: Arc<PoolCounters>,
    stack_size: usize,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name(format!("job-worker-{worker_id}"))
        .stack_size(stack_size)
        .spawn(move || {
            debug!(worker_id = worker_id, "Worker thread started");

            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    error!(
                        worker_id = worker_id,
                        error = %e,
                        "Failed to create worker runtime"
                    );
                    return;
                }
            };

            // Buffered jobs are still delivered after the sender is dropped;
            // recv() only fails once the channel is empty.
            while let Ok(job) = job_rx.recv() {
                counters.queued_jobs.fetch_sub(1, Ordering::Relaxed);
                counters.active_jobs.fetch_add(1, Ordering::Relaxed);

                let jid = job.jid;
                let name = job.name.clone();
                debug!(worker_id = worker_id, jid = %jid, job = %name, "Worker executing job");

                match rt.block_on(run_job(&registry, job)) {
                    Ok(()) => {
                        counters.completed_jobs.fetch_add(1, Ordering::Relaxed);
                        debug!(worker_id = worker_id, jid = %jid, job = %name, "Worker completed job");
                    }
                    Err(e) => {
                        counters.failed_jobs.fetch_add(1, Ordering::Relaxed);
                        error!(worker_id = worker_id, jid = %jid, job = %name, error = %e, "Job failed");
                    }
                }

                counters.active_jobs.fetch_sub(1, Ordering::Relaxed);
            }

            debug!(worker_id = worker_id, "Worker thread exiting");
        })
}

/// Resolve the handler and run it, turning a panic into `JobError::Panicked`.
async fn run_job(registry: &JobRegistry, job: Job) -> Result<(), JobError> {
    let handler = registry
        .get(&job.name)
        .ok_or_else(|| JobError::UnknownJob(job.name.clone()))?;
    let ctx = JobContext::for_job(&job);

    match tokio::spawn(async move { handler.perform(job.args, ctx).await }).await {
        Ok(result) => result,
        Err(join_err) if join_err.is_panic() => {
            Err(JobError::Panicked(panic_message(join_err.into_panic())))
        }
        Err(join_err) => Err(JobError::Failed(join_err.to_string())),
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::{json, Value};
    use std::sync::atomic::AtomicUsize;
    use std::time::Instant;

    use crate::core::JobHandler;

    /// Test handler that counts invocations and fails on demand.
    #[derive(Clone)]
    struct CountingHandler {
        executions: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl JobHandler for CountingHandler {
        async fn perform(&self, args: Vec<Value>, _ctx: JobContext) -> Result<(), JobError> {
            self.executions.fetch_add(1, Ordering::Relaxed);
            tokio::time::sleep(Duration::from_millis(10)).await;
            match args.first().and_then(Value::as_str) {
                Some("fail") => Err(JobError::Failed("asked to fail".into())),
                Some("panic") => panic!("asked to panic"),
                _ => Ok(()),
            }
        }
    }

    fn pool_with(handler: CountingHandler, workers: usize, depth: usize) -> WorkerPool {
        let registry = Arc::new(JobRegistry::new().register("Counting", handler));
        let config = WorkerPoolConfig::new()
            .with_worker_count(workers)
            .with_max_queue_depth(depth);
        WorkerPool::new(config, registry).unwrap()
    }

    fn wait_for<F: Fn(&PoolStats) -> bool>(pool: &WorkerPool, predicate: F) -> PoolStats {
        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let stats = pool.stats();
            if predicate(&stats) || Instant::now() > deadline {
                return stats;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_worker_pool_runs_jobs() {
        let handler = CountingHandler {
            executions: Arc::new(AtomicUsize::new(0)),
        };
        let pool = pool_with(handler.clone(), 2, 10);

        for i in 0..5 {
            pool.submit(Job::new("Counting", vec![json!(i)])).unwrap();
        }

        let stats = wait_for(&pool, |s| s.completed_jobs == 5);
        assert_eq!(stats.completed_jobs, 5);
        assert_eq!(stats.submitted_jobs, 5);
        assert_eq!(stats.failed_jobs, 0);
        assert_eq!(handler.executions.load(Ordering::Relaxed), 5);
        pool.shutdown();
    }

    #[test]
    fn test_failures_and_panics_are_counted() {
        let handler = CountingHandler {
            executions: Arc::new(AtomicUsize::new(0)),
        };
        let pool = pool_with(handler, 1, 10);

        pool.submit(Job::new("Counting", vec![json!("fail")])).unwrap();
        pool.submit(Job::new("Counting", vec![json!("panic")])).unwrap();
        pool.submit(Job::new("Missing", vec![])).unwrap();
        pool.submit(Job::new("Counting", vec![json!("ok")])).unwrap();

        let stats = wait_for(&pool, |s| s.completed_jobs + s.failed_jobs == 4);
        assert_eq!(stats.failed_jobs, 3);
        // The single worker survived the panic and ran the last job.
        assert_eq!(stats.completed_jobs, 1);
        pool.shutdown();
    }

    #[test]
    fn test_submit_after_shutdown() {
        let handler = CountingHandler {
            executions: Arc::new(AtomicUsize::new(0)),
        };
        let pool = pool_with(handler, 1, 10);
        pool.shutdown();

        assert!(pool.is_shutdown());
        assert_eq!(
            pool.submit(Job::new("Counting", vec![])),
            Err(PoolError::PoolShutdown)
        );
    }

    #[test]
    fn test_shutdown_runs_buffered_jobs() {
        let handler = CountingHandler {
            executions: Arc::new(AtomicUsize::new(0)),
        };
        let registry = Arc::new(JobRegistry::new().register("Counting", handler.clone()));
        let config = WorkerPoolConfig::new()
            .with_worker_count(1)
            .with_max_queue_depth(10)
            .with_shutdown_timeout_secs(5);
        let pool = WorkerPool::new(config, registry).unwrap();

        for _ in 0..3 {
            pool.submit(Job::new("Counting", vec![])).unwrap();
        }
        pool.shutdown();

        let stats = pool.stats();
        assert_eq!(stats.submitted_jobs, 3);
        assert_eq!(stats.completed_jobs, 3);
        assert_eq!(stats.queued_jobs, 0);
        assert_eq!(stats.active_jobs, 0);
        assert_eq!(handler.executions.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_invalid_config() {
        let registry = Arc::new(JobRegistry::new());
        let result = WorkerPool::new(WorkerPoolConfig::new().with_worker_count(0), registry);
        assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("static")), "static");
        assert_eq!(panic_message(Box::new(String::from("owned"))), "owned");
        assert_eq!(panic_message(Box::new(42_u8)), "unknown panic");
    }
}
