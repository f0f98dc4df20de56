//! # Deferred Jobs
//!
//! Trigger background work from a web request without waiting for it.
//!
//! A request handler enqueues jobs in one of three dispatch modes and returns
//! an acknowledgment immediately; workers run the jobs later, on their own
//! threads, fully decoupled from the request that created them.
//!
//! ## Dispatch Modes
//!
//! - **Immediate**: eligible as soon as a worker is free
//! - **DelayBy**: eligible no earlier than a fixed interval after enqueue
//! - **RunAt**: eligible no earlier than an absolute time
//!
//! ## Components
//!
//! - **`JobQueue`**: the enqueue boundary a handler talks to
//! - **`JobRegistry`**: explicit job-name to handler map, built at startup
//! - **`WorkerPool`**: dedicated OS threads, each with its own tokio runtime
//! - **`SchedulePoller`**: releases delayed jobs from the scheduled set when due
//! - **`HelloJob`**: sample job that sleeps and logs
//!
//! ```rust,ignore
//! use deferred_jobs::builders::{build_service, default_registry};
//! use deferred_jobs::config::ServiceConfig;
//! use deferred_jobs::core::JobQueue;
//!
//! let cfg = ServiceConfig::default();
//! let service = build_service(&cfg, default_registry(&cfg))?;
//! let client = service.client();
//! client.enqueue_now("HelloJob", vec![json!("now")]).await?;
//! client.enqueue_after("HelloJob", vec![json!("later")], Duration::from_secs(10)).await?;
//! service.shutdown().await;
//! ```
//!
//! For complete examples, see:
//! - `tests/jobs_endpoint_test.rs` - handler behavior against a recording queue
//! - `tests/end_to_end_test.rs` - full flow over a real socket

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Job model, enqueue boundary, registry, scheduling and execution.
pub mod core;
/// Configuration models for the worker pool and the service.
pub mod config;
/// Builders to assemble a running service from configuration.
pub mod builders;
/// Infrastructure adapters for the scheduled set and queue doubles.
pub mod infra;
/// Job definitions.
pub mod jobs;
/// HTTP surface.
pub mod runtime;
/// Shared utilities.
pub mod util;
