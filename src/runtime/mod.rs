//! HTTP surface: router, handlers and response models.

pub mod api;

pub use api::{build_router, create_jobs, ApiError, AppState, Health, MessageResponse, StatsResponse};
