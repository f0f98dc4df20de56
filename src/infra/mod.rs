//! Infrastructure adapters for the scheduled set and queue doubles.

pub mod queue;

pub use queue::InMemoryScheduledSet;
pub use queue::RecordingQueue;
