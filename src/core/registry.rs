//! Explicit job-name to handler registry.
//!
//! Built once at startup and shared as `Arc<JobRegistry>` with the client
//! (to reject unknown names at enqueue time) and the worker pool (to dispatch).

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::JobHandler;

/// Mapping from job name to handler.
#[derive(Default, Clone)]
pub struct JobRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl JobRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler under `name`, replacing any previous one.
    #[must_use]
    pub fn register(mut self, name: impl Into<String>, handler: impl JobHandler) -> Self {
        self.insert(name, Arc::new(handler));
        self
    }

    /// Register an already shared handler.
    pub fn insert(&mut self, name: impl Into<String>, handler: Arc<dyn JobHandler>) {
        let name = name.into();
        if self.handlers.insert(name.clone(), handler).is_some() {
            tracing::warn!(job = %name, "replacing previously registered handler");
        }
    }

    /// Look up the handler for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn JobHandler>> {
        self.handlers.get(name).cloned()
    }

    /// Whether a handler is registered under `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of registered handlers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for JobRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobRegistry")
            .field("handlers", &self.names())
            .finish()
    }
}
