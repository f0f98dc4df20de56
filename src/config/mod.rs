//! Configuration models for the worker pool and the service.

pub mod pool;
pub mod service;

pub use pool::WorkerPoolConfig;
pub use service::ServiceConfig;
