//! End-to-end tests over the in-process job service.
//!
//! These tests validate:
//! 1. `POST /jobs` over a real socket returns 202 before any job completes
//! 2. Immediate jobs run on a worker and report start and completion
//! 3. Delayed and absolute-time jobs never run before their time
//! 4. Shutdown stops the poller and joins the workers

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use deferred_jobs::builders::build_service;
use deferred_jobs::config::{ServiceConfig, WorkerPoolConfig};
use deferred_jobs::core::{
    InMemoryEventSink, JobAction, JobContext, JobError, JobHandler, JobQueue, JobRegistry,
};
use deferred_jobs::jobs::HelloJob;
use deferred_jobs::runtime::{build_router, AppState};
use deferred_jobs::util::clock;
use parking_lot::Mutex;
use serde_json::{json, Value};
use tokio::net::TcpListener;

fn test_config() -> ServiceConfig {
    ServiceConfig {
        bind_addr: "127.0.0.1:0".into(),
        pool: WorkerPoolConfig::new()
            .with_worker_count(2)
            .with_max_queue_depth(16),
        max_scheduled: 16,
        poll_interval_ms: 10,
        hello_job_work_ms: 300,
    }
}

async fn wait_until<F: Fn() -> bool>(timeout: Duration, predicate: F) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if predicate() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    predicate()
}

/// Handler that records when each invocation started.
#[derive(Clone, Default)]
struct StampingHandler {
    runs: Arc<Mutex<Vec<(String, DateTime<Utc>)>>>,
}

#[async_trait]
impl JobHandler for StampingHandler {
    async fn perform(&self, args: Vec<Value>, _ctx: JobContext) -> Result<(), JobError> {
        let label = args
            .first()
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        self.runs.lock().push((label, clock::now()));
        Ok(())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_post_jobs_over_http() {
    let cfg = test_config();
    let sink = Arc::new(InMemoryEventSink::new(100));
    let registry = JobRegistry::new().register(
        HelloJob::NAME,
        HelloJob::with_sink(cfg.hello_job_work(), sink.clone()),
    );
    let service = build_service(&cfg, registry).unwrap();

    let listener = TcpListener::bind(&cfg.bind_addr).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(AppState::with_client(service.client()));
    let server = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let http = reqwest::Client::new();
    let resp = http
        .post(format!("http://{addr}/jobs"))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 202);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Accepted" }));

    // Acknowledged while the immediate job is still sleeping.
    assert!(sink
        .events()
        .iter()
        .all(|e| e.action != JobAction::Complete));

    let stats: Value = http
        .get(format!("http://{addr}/stats"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stats["scheduled"], 2);
    assert_eq!(stats["pool"]["submitted_jobs"], 1);

    let completed = wait_until(Duration::from_secs(3), || {
        sink.events().iter().any(|e| e.action == JobAction::Complete)
    })
    .await;
    assert!(completed);

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "HelloJob started with args [\"perform_async job\"]");
    assert!(events[1].at > events[0].at);

    server.abort();
    service.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_delayed_jobs_run_no_earlier_than_requested() {
    let cfg = test_config();
    let handler = StampingHandler::default();
    let runs = Arc::clone(&handler.runs);
    let service = build_service(&cfg, JobRegistry::new().register("Stamp", handler)).unwrap();
    let client = service.client();

    let enqueued = clock::now();
    let at = enqueued + chrono::Duration::milliseconds(400);
    client.enqueue_now("Stamp", vec![json!("now")]).await.unwrap();
    client
        .enqueue_after("Stamp", vec![json!("after")], Duration::from_millis(200))
        .await
        .unwrap();
    client.enqueue_at("Stamp", vec![json!("at")], at).await.unwrap();

    let all_ran = wait_until(Duration::from_secs(3), || runs.lock().len() == 3).await;
    assert!(all_ran);

    let runs = runs.lock().clone();
    let ran_at = |label: &str| {
        runs.iter()
            .find(|(l, _)| l == label)
            .map(|(_, t)| *t)
            .unwrap()
    };
    assert!(ran_at("after") >= enqueued + chrono::Duration::milliseconds(200));
    assert!(ran_at("at") >= at);
    assert_eq!(client.scheduled_len(), 0);

    service.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_shutdown_rejects_new_work() {
    let cfg = test_config();
    let service = build_service(
        &cfg,
        JobRegistry::new().register("Stamp", StampingHandler::default()),
    )
    .unwrap();
    let client = service.client();
    client
        .enqueue_after("Stamp", vec![], Duration::from_secs(60))
        .await
        .unwrap();

    service.shutdown().await;

    let err = client.enqueue_now("Stamp", vec![]).await.unwrap_err();
    assert_eq!(err, deferred_jobs::core::EnqueueError::Shutdown);
}
