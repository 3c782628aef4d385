//! # simplerc - Named Resources with Immutability Enforcement
//!
//! simplerc is a thread-safe, in-process store of named resources. Each
//! resource carries a mutability flag: once a resource is stored as
//! immutable, later writes, overwrites and deletions of that name are
//! rejected unless the caller explicitly forces a deletion.
//!
//! ## Quick Start
//!
//! Use the process-wide default manager through free functions:
//!
//! ```ignore
//! simplerc::set("config", serde_json::json!({"debug": true}), false)?;
//! assert!(simplerc::set("config", 1, true).unwrap_err().is_immutable());
//!
//! simplerc::delete_forced("config")?;
//! ```
//!
//! Or build an isolated, typed manager:
//!
//! ```ignore
//! use simplerc::prelude::*;
//!
//! let manager: ResourceManager<Vec<u8>> = Simplerc::builder()
//!     .with_scope("plugins")
//!     .with_logging()
//!     .build()?;
//!
//! manager.set("blob", vec![1, 2, 3], true)?;
//! manager.update("blob", |blob| blob.push(4))?;
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                    Your Application                     │
//! ├─────────────────────────────────────────────────────────┤
//! │          simplerc (facade, default manager)             │
//! │  ┌──────────────────────────┬────────────────────────┐  │
//! │  │ simplerc-core            │ simplerc-observe       │  │
//! │  │ (Resource, manager,      │ (events, metrics)      │  │
//! │  │  mutability gate)        │                        │  │
//! │  └──────────────────────────┴────────────────────────┘  │
//! └─────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use simplerc_core::{ManagerConfig, ResourceManager, ResourceResult};
use simplerc_observe::{EventSubscriber, LoggingSubscriber};

pub mod global;

// Re-export from sub-crates
pub use simplerc_core;
pub use simplerc_observe;

pub use global::{
    GLOBAL_SCOPE, ManagerHandle, Value, as_map, clear, contains, delete, delete_forced, get,
    get_mut_value, get_mutable, get_or, get_resource, is_empty, items, keys, len, lookup,
    manager, pop, pop_or, pop_resource, set, set_resource, update, values,
};
pub use simplerc_core::{Resource, ResourceError};

/// Main entry point for simplerc.
pub struct Simplerc;

impl Simplerc {
    /// Create a new manager builder.
    pub fn builder() -> SimplercBuilder {
        SimplercBuilder::new()
    }

    /// Get a handle to the process-wide default manager.
    pub fn global() -> ManagerHandle<'static, Value> {
        global::manager()
    }
}

/// Builder for configuring resource managers.
pub struct SimplercBuilder {
    config: ManagerConfig,
    event_subscribers: Vec<Arc<dyn EventSubscriber>>,
}

impl SimplercBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            config: ManagerConfig::default(),
            event_subscribers: Vec::new(),
        }
    }

    /// Set the scope name.
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.config.scope = scope.into();
        self
    }

    /// Reserve space for `capacity` entries.
    pub fn with_initial_capacity(mut self, capacity: usize) -> Self {
        self.config.initial_capacity = capacity;
        self
    }

    /// Enable or disable metrics collection.
    pub fn with_metrics(mut self, enabled: bool) -> Self {
        self.config.collect_metrics = enabled;
        self
    }

    /// Enable or disable event delivery.
    pub fn with_events(mut self, enabled: bool) -> Self {
        self.config.emit_events = enabled;
        self
    }

    /// Use a complete configuration.
    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    // Observability

    /// Add an event subscriber.
    pub fn with_event_subscriber(mut self, subscriber: Arc<dyn EventSubscriber>) -> Self {
        self.event_subscribers.push(subscriber);
        self
    }

    /// Forward events to `tracing` at the default level.
    pub fn with_logging(self) -> Self {
        self.with_event_subscriber(Arc::new(LoggingSubscriber::new()))
    }

    /// Build the manager.
    pub fn build<T: Clone>(self) -> ResourceResult<ResourceManager<T>> {
        let manager = ResourceManager::with_config(self.config)?;
        for subscriber in self.event_subscribers {
            manager.subscribe(subscriber);
        }
        Ok(manager)
    }

    /// Build the manager behind an `Arc` for sharing between threads.
    pub fn build_shared<T: Clone>(self) -> ResourceResult<Arc<ResourceManager<T>>> {
        self.build().map(Arc::new)
    }
}

impl Default for SimplercBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for SimplercBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimplercBuilder")
            .field("config", &self.config)
            .field("event_subscribers", &self.event_subscribers.len())
            .finish()
    }
}

/// Prelude module for convenient imports.
pub mod prelude {
    // Main types
    pub use crate::{ManagerHandle, Simplerc, SimplercBuilder, Value};

    // Core types
    pub use simplerc_core::{ManagerConfig, Resource, ResourceError, ResourceManager, ResourceResult};

    // Observability
    pub use simplerc_observe::{EventSubscriber, LoggingSubscriber, ManagerEvent, MetricsSnapshot};
}
