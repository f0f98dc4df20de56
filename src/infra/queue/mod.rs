//! Queue backends.

pub mod memory;
pub mod recording;

pub use memory::InMemoryScheduledSet;
pub use recording::RecordingQueue;
