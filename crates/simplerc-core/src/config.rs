//! Configuration types for resource managers.

use crate::error::{ResourceError, ResourceResult};

/// Scope name used when none is configured.
pub const DEFAULT_SCOPE: &str = "default";

/// Configuration for a [`ResourceManager`](crate::ResourceManager).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Name of this manager, carried in log fields and events.
    ///
    /// Useful when several managers form a hierarchy of scopes.
    pub scope: String,

    /// Number of entries to reserve space for up front.
    pub initial_capacity: usize,

    /// Whether to deliver events to subscribers.
    pub emit_events: bool,

    /// Whether to count operations in the manager's metrics.
    pub collect_metrics: bool,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            scope: DEFAULT_SCOPE.to_string(),
            initial_capacity: 0,
            emit_events: true,
            collect_metrics: true,
        }
    }
}

impl ManagerConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the scope name.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = scope.into();
        self
    }

    /// Set the initial capacity.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Enable or disable event delivery.
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.emit_events = enabled;
        self
    }

    /// Enable or disable metrics collection.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.collect_metrics = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ResourceResult<()> {
        if self.scope.trim().is_empty() {
            return Err(ResourceError::InvalidConfig(
                "scope must not be empty".to_string(),
            ));
        }
        if self.scope.chars().any(char::is_control) {
            return Err(ResourceError::InvalidConfig(format!(
                "scope {:?} contains control characters",
                self.scope
            )));
        }
        Ok(())
    }
}
