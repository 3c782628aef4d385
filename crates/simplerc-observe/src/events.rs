//! Observable events emitted by resource managers.

use std::sync::Arc;
use std::time::Instant;

use parking_lot::RwLock;

/// Events that can be observed on a resource manager.
///
/// Every event carries the `scope` of the manager that emitted it, so a
/// single subscriber can be shared between several managers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ManagerEvent {
    /// A resource was created or overwritten.
    ResourceSet {
        /// Scope of the emitting manager.
        scope: String,
        /// Resource name.
        name: String,
        /// Mutability flag after the write.
        mutable: bool,
        /// Whether the key already existed.
        replaced: bool,
    },
    /// A resource was removed through a checked operation.
    ResourceRemoved {
        /// Scope of the emitting manager.
        scope: String,
        /// Resource name.
        name: String,
    },
    /// A resource was removed by bypassing the mutability check.
    ResourceForceRemoved {
        /// Scope of the emitting manager.
        scope: String,
        /// Resource name.
        name: String,
        /// Whether the removed resource was immutable.
        was_immutable: bool,
    },
    /// A mutating operation was rejected because the resource is immutable.
    MutationDenied {
        /// Scope of the emitting manager.
        scope: String,
        /// Resource name.
        name: String,
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// Entries were cleared in bulk.
    Cleared {
        /// Scope of the emitting manager.
        scope: String,
        /// Number of removed entries.
        removed: usize,
        /// Whether immutable entries were removed as well.
        forced: bool,
    },
}

impl ManagerEvent {
    /// Get the event type name.
    pub fn event_type(&self) -> &'static str {
        match self {
            ManagerEvent::ResourceSet { .. } => "resource_set",
            ManagerEvent::ResourceRemoved { .. } => "resource_removed",
            ManagerEvent::ResourceForceRemoved { .. } => "resource_force_removed",
            ManagerEvent::MutationDenied { .. } => "mutation_denied",
            ManagerEvent::Cleared { .. } => "cleared",
        }
    }

    /// Get the scope of the manager that emitted this event.
    pub fn scope(&self) -> &str {
        match self {
            ManagerEvent::ResourceSet { scope, .. }
            | ManagerEvent::ResourceRemoved { scope, .. }
            | ManagerEvent::ResourceForceRemoved { scope, .. }
            | ManagerEvent::MutationDenied { scope, .. }
            | ManagerEvent::Cleared { scope, .. } => scope,
        }
    }

    /// Get the resource name, if the event concerns a single resource.
    pub fn resource_name(&self) -> Option<&str> {
        match self {
            ManagerEvent::ResourceSet { name, .. }
            | ManagerEvent::ResourceRemoved { name, .. }
            | ManagerEvent::ResourceForceRemoved { name, .. }
            | ManagerEvent::MutationDenied { name, .. } => Some(name),
            ManagerEvent::Cleared { .. } => None,
        }
    }
}

/// Subscriber for manager events.
///
/// Subscribers are invoked after the manager has finished touching its
/// entries, on the calling thread, so implementations may call back into the
/// manager that emitted the event.
pub trait EventSubscriber: Send + Sync {
    /// Called when an event occurs.
    fn on_event(&self, event: &ManagerEvent);

    /// Filter for event types this subscriber is interested in.
    /// Returns `None` to receive all events.
    fn event_filter(&self) -> Option<Vec<&'static str>> {
        None
    }
}

/// A subscriber that forwards events to `tracing`.
pub struct LoggingSubscriber {
    /// Level used for routine events. Denials and forced removals are
    /// always logged at `WARN`.
    pub log_level: tracing::Level,
}

impl LoggingSubscriber {
    /// Create a new logging subscriber.
    pub fn new() -> Self {
        Self {
            log_level: tracing::Level::DEBUG,
        }
    }

    /// Set the log level.
    pub fn with_level(mut self, level: tracing::Level) -> Self {
        self.log_level = level;
        self
    }

    fn routine(&self, event: &ManagerEvent) {
        let name = event.resource_name().unwrap_or("*");
        match self.log_level {
            tracing::Level::TRACE => {
                tracing::trace!(event = event.event_type(), scope = event.scope(), resource = name, "Manager event");
            }
            tracing::Level::DEBUG => {
                tracing::debug!(event = event.event_type(), scope = event.scope(), resource = name, "Manager event");
            }
            tracing::Level::INFO => {
                tracing::info!(event = event.event_type(), scope = event.scope(), resource = name, "Manager event");
            }
            tracing::Level::WARN => {
                tracing::warn!(event = event.event_type(), scope = event.scope(), resource = name, "Manager event");
            }
            _ => {
                tracing::error!(event = event.event_type(), scope = event.scope(), resource = name, "Manager event");
            }
        }
    }
}

impl Default for LoggingSubscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSubscriber for LoggingSubscriber {
    fn on_event(&self, event: &ManagerEvent) {
        match event {
            ManagerEvent::MutationDenied {
                scope,
                name,
                operation,
            } => {
                tracing::warn!(
                    event = "mutation_denied",
                    scope = scope,
                    resource = name,
                    operation = operation,
                    "Mutation of immutable resource denied"
                );
            }
            ManagerEvent::ResourceForceRemoved {
                scope,
                name,
                was_immutable,
            } => {
                tracing::warn!(
                    event = "resource_force_removed",
                    scope = scope,
                    resource = name,
                    was_immutable = was_immutable,
                    "Resource force removed"
                );
            }
            _ => self.routine(event),
        }
    }
}

/// A subscriber that collects events for later analysis.
pub struct CollectingSubscriber {
    events: RwLock<Vec<(Instant, ManagerEvent)>>,
    max_events: usize,
}

impl CollectingSubscriber {
    /// Create a new collecting subscriber.
    pub fn new(max_events: usize) -> Self {
        Self {
            events: RwLock::new(Vec::new()),
            max_events,
        }
    }

    /// Get collected events.
    pub fn events(&self) -> Vec<(Instant, ManagerEvent)> {
        self.events.read().clone()
    }

    /// Get the collected event type names, in arrival order.
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events
            .read()
            .iter()
            .map(|(_, event)| event.event_type())
            .collect()
    }

    /// Clear collected events.
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Get event count.
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.events.read().is_empty()
    }
}

impl EventSubscriber for CollectingSubscriber {
    fn on_event(&self, event: &ManagerEvent) {
        let mut events = self.events.write();
        if events.len() < self.max_events {
            events.push((Instant::now(), event.clone()));
        }
    }
}

/// Event dispatcher that manages subscribers.
#[derive(Default)]
pub struct EventDispatcher {
    subscribers: RwLock<Vec<Arc<dyn EventSubscriber>>>,
}

impl EventDispatcher {
    /// Create a new event dispatcher.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a subscriber.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.subscribers.write().push(subscriber);
    }

    /// Remove all subscribers.
    pub fn clear_subscribers(&self) {
        self.subscribers.write().clear();
    }

    /// Get subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }

    /// Check if any subscriber is registered.
    pub fn has_subscribers(&self) -> bool {
        !self.subscribers.read().is_empty()
    }

    /// Emit an event to all subscribers.
    ///
    /// The subscriber list is snapshotted before delivery; subscribers added
    /// from inside a callback only see subsequent events.
    pub fn emit(&self, event: ManagerEvent) {
        let subscribers: Vec<Arc<dyn EventSubscriber>> = self.subscribers.read().clone();
        for subscriber in &subscribers {
            if let Some(filter) = subscriber.event_filter() {
                if !filter.contains(&event.event_type()) {
                    continue;
                }
            }
            subscriber.on_event(&event);
        }
    }
}

impl std::fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventDispatcher")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_event(name: &str) -> ManagerEvent {
        ManagerEvent::ResourceSet {
            scope: "test".to_string(),
            name: name.to_string(),
            mutable: true,
            replaced: false,
        }
    }

    #[test]
    fn test_manager_event_type() {
        assert_eq!(set_event("a").event_type(), "resource_set");

        let event = ManagerEvent::Cleared {
            scope: "test".to_string(),
            removed: 3,
            forced: false,
        };
        assert_eq!(event.event_type(), "cleared");
        assert_eq!(event.resource_name(), None);
        assert_eq!(event.scope(), "test");
    }

    #[test]
    fn test_collecting_subscriber() {
        let subscriber = CollectingSubscriber::new(100);

        subscriber.on_event(&set_event("config"));

        assert_eq!(subscriber.len(), 1);

        let events = subscriber.events();
        match &events[0].1 {
            ManagerEvent::ResourceSet { name, .. } => assert_eq!(name, "config"),
            _ => panic!("Wrong event type"),
        }
    }

    #[test]
    fn test_collecting_subscriber_max_events() {
        let subscriber = CollectingSubscriber::new(2);

        for i in 0..5 {
            subscriber.on_event(&set_event(&format!("key_{}", i)));
        }

        assert_eq!(subscriber.len(), 2);
    }

    #[test]
    fn test_event_dispatcher() {
        let dispatcher = EventDispatcher::new();
        let collector = Arc::new(CollectingSubscriber::new(100));

        dispatcher.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);
        dispatcher.emit(set_event("a"));

        assert_eq!(collector.len(), 1);
        assert!(dispatcher.has_subscribers());
    }

    struct DenialsOnly(CollectingSubscriber);

    impl EventSubscriber for DenialsOnly {
        fn on_event(&self, event: &ManagerEvent) {
            self.0.on_event(event);
        }

        fn event_filter(&self) -> Option<Vec<&'static str>> {
            Some(vec!["mutation_denied"])
        }
    }

    #[test]
    fn test_event_dispatcher_filter() {
        let dispatcher = EventDispatcher::new();
        let denials = Arc::new(DenialsOnly(CollectingSubscriber::new(100)));
        dispatcher.subscribe(Arc::clone(&denials) as Arc<dyn EventSubscriber>);

        dispatcher.emit(set_event("a"));
        dispatcher.emit(ManagerEvent::MutationDenied {
            scope: "test".to_string(),
            name: "a".to_string(),
            operation: "set",
        });

        assert_eq!(denials.0.event_types(), vec!["mutation_denied"]);
    }

    struct Resubscriber {
        dispatcher: Arc<EventDispatcher>,
        hits: CollectingSubscriber,
    }

    impl EventSubscriber for Resubscriber {
        fn on_event(&self, event: &ManagerEvent) {
            self.hits.on_event(event);
            self.dispatcher
                .subscribe(Arc::new(CollectingSubscriber::new(1)));
        }
    }

    #[test]
    fn test_subscribe_from_callback_does_not_deadlock() {
        let dispatcher = Arc::new(EventDispatcher::new());
        let sub = Arc::new(Resubscriber {
            dispatcher: Arc::clone(&dispatcher),
            hits: CollectingSubscriber::new(10),
        });
        dispatcher.subscribe(Arc::clone(&sub) as Arc<dyn EventSubscriber>);

        dispatcher.emit(set_event("a"));

        assert_eq!(sub.hits.len(), 1);
        assert_eq!(dispatcher.subscriber_count(), 2);
    }
}
