//! Builders that wire configuration into a running job service.

pub mod service_builder;

pub use service_builder::{build_service, default_registry, JobService};
