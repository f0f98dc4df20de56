//! HTTP request/response models and handlers.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::core::{Client, EnqueueError, JobQueue, PoolStats};
use crate::jobs::HelloJob;
use crate::util::clock;

/// Delay used for the `perform_in` dispatch.
pub const PERFORM_IN_DELAY: Duration = Duration::from_secs(10);

/// Offset from now used for the `perform_at` dispatch.
pub const PERFORM_AT_OFFSET: Duration = Duration::from_secs(20);

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    queue: Arc<dyn JobQueue>,
    client: Option<Arc<Client>>,
}

impl AppState {
    /// State over any queue implementation; `/stats` reports unavailable.
    #[must_use]
    pub fn new(queue: Arc<dyn JobQueue>) -> Self {
        Self {
            queue,
            client: None,
        }
    }

    /// State over the in-process client, with statistics.
    #[must_use]
    pub fn with_client(client: Arc<Client>) -> Self {
        Self {
            queue: client.clone(),
            client: Some(client),
        }
    }
}

/// Plain message body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageResponse {
    /// Message text.
    pub message: String,
}

/// Health response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Health {
    /// Healthy flag.
    pub ok: bool,
}

/// Queue statistics response.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Worker pool counters.
    pub pool: PoolStats,
    /// Jobs waiting in the scheduled set.
    pub scheduled: usize,
}

/// An enqueue failure rendered as a non-2xx JSON response.
#[derive(Debug)]
pub struct ApiError(pub EnqueueError);

impl From<EnqueueError> for ApiError {
    fn from(err: EnqueueError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = if self.0.is_unavailable() {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        tracing::warn!(status = status.as_u16(), error = %self.0, "enqueue rejected");
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

/// `POST /jobs`: enqueue `HelloJob` once per dispatch mode and acknowledge.
///
/// Stops at the first rejected enqueue and reports it; jobs accepted before
/// the failure stay queued.
///
/// # Errors
///
/// Returns [`ApiError`] wrapping the first enqueue failure.
pub async fn create_jobs(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let queue = &state.queue;
    queue
        .enqueue_now(HelloJob::NAME, vec![json!("perform_async job")])
        .await?;
    queue
        .enqueue_after(HelloJob::NAME, vec![json!("perform_in job")], PERFORM_IN_DELAY)
        .await?;
    queue
        .enqueue_at(
            HelloJob::NAME,
            vec![json!("perform_at job")],
            clock::add_duration(clock::now(), PERFORM_AT_OFFSET),
        )
        .await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(MessageResponse {
            message: "Accepted".into(),
        }),
    ))
}

async fn health() -> Json<Health> {
    Json(Health { ok: true })
}

async fn stats(State(state): State<AppState>) -> Response {
    match state.client {
        Some(client) => Json(StatsResponse {
            pool: client.pool_stats(),
            scheduled: client.scheduled_len(),
        })
        .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "error": "statistics unavailable" })),
        )
            .into_response(),
    }
}

/// Build the HTTP router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/jobs", post(create_jobs))
        .route("/health", get(health))
        .route("/stats", get(stats))
        .with_state(state)
}
