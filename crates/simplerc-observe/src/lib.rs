//! simplerc Observability
//!
//! This crate provides observability features for simplerc resource
//! managers:
//!
//! - [`EventDispatcher`]: Observable event system
//! - [`OperationMetrics`]: Per-manager operation counters
//!
//! # Event Subscription
//!
//! ```ignore
//! use simplerc_observe::{EventDispatcher, LoggingSubscriber};
//! use std::sync::Arc;
//!
//! let dispatcher = EventDispatcher::new();
//! dispatcher.subscribe(Arc::new(LoggingSubscriber::new()));
//! ```
//!
//! # Metrics
//!
//! ```ignore
//! let snapshot = manager.metrics().snapshot();
//! println!("denied mutations: {}", snapshot.denials);
//! ```

pub mod events;
pub mod metrics;

// Re-export main types
pub use events::{
    CollectingSubscriber, EventDispatcher, EventSubscriber, LoggingSubscriber, ManagerEvent,
};
pub use metrics::{MetricsSnapshot, OperationMetrics};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::events::{EventDispatcher, EventSubscriber, ManagerEvent};
    pub use crate::metrics::{MetricsSnapshot, OperationMetrics};
}
