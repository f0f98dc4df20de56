//! Recording queue double: accepts or rejects enqueue requests, never runs them.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::{Ack, EnqueueError, EnqueueRequest, JobQueue};
use crate::util::clock;

/// A `JobQueue` that records every request synchronously.
///
/// Jobs are never executed, so a caller's response is always produced before
/// any `perform` could run. Failures can be injected per call index.
#[derive(Default)]
pub struct RecordingQueue {
    requests: Mutex<Vec<EnqueueRequest>>,
    fail_on: Mutex<Option<(usize, EnqueueError)>>,
    calls: AtomicUsize,
}

impl RecordingQueue {
    /// Create a queue that accepts everything.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject the `index`-th call (zero-based) with `error`.
    #[must_use]
    pub fn failing_on(index: usize, error: EnqueueError) -> Self {
        let queue = Self::default();
        *queue.fail_on.lock() = Some((index, error));
        queue
    }

    /// Snapshot of accepted requests, in call order.
    #[must_use]
    pub fn requests(&self) -> Vec<EnqueueRequest> {
        self.requests.lock().clone()
    }

    /// Total calls, accepted or rejected.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Acquire)
    }
}

#[async_trait]
impl JobQueue for RecordingQueue {
    async fn enqueue(&self, request: EnqueueRequest) -> Result<Ack, EnqueueError> {
        let index = self.calls.fetch_add(1, Ordering::AcqRel);
        if let Some((fail_index, error)) = self.fail_on.lock().as_ref() {
            if *fail_index == index {
                return Err(error.clone());
            }
        }
        let ack = Ack {
            jid: request.job.jid,
            job: request.job.name.clone(),
            run_at: request.mode.run_at(clock::now()),
        };
        self.requests.lock().push(request);
        Ok(ack)
    }
}
