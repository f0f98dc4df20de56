//! Job definitions shipped with the service.

pub mod hello_job;

pub use hello_job::HelloJob;
