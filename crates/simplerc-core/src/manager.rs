//! The resource manager.
//!
//! [`ResourceManager`] guards a single insertion-ordered mapping of names to
//! [`Resource`] entries with a reentrant lock, and enforces the mutability
//! flag of every entry on each mutating operation.
//!
//! # Mutability contract
//!
//! Every operation that writes or removes an entry first passes through one
//! gate (the check behind [`ResourceManager::get_mutable`]). The gate rejects
//! the operation with [`ResourceError::Immutable`] when the entry exists and
//! was stored with `mutable = false`. An absent key is treated as if it held
//! a mutable default, so writing a new key never fails on mutability grounds,
//! and the default is never inserted.
//!
//! Only [`ResourceManager::delete_forced`] and
//! [`ResourceManager::clear_forced`] skip the gate.
//!
//! # Copies
//!
//! Every read returns an owned clone of the stored payload, whether the
//! entry is mutable or not, so callers can never alias protected state.
//! In-place mutation of a mutable entry goes through
//! [`ResourceManager::update`], which runs the caller's closure under the
//! manager's lock.
//!
//! Entries are held behind an [`Arc`], so payload `Clone` and `Drop` impls
//! always run after the entry map borrow has been released. Such impls may
//! call back into the same manager.

use std::cell::RefCell;
use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::{ReentrantMutex, ReentrantMutexGuard};
use tracing::{debug, info, warn};

use simplerc_observe::{EventDispatcher, EventSubscriber, ManagerEvent, OperationMetrics};

use crate::config::ManagerConfig;
use crate::error::{ResourceError, ResourceResult};
use crate::resource::Resource;

type Entries<T> = IndexMap<String, Arc<Resource<T>>>;

/// A thread-safe store of named resources with per-entry mutability.
///
/// `ResourceManager<T>` is `Sync` whenever `T: Send + Sync`; share it between
/// threads behind an `Arc` or a `static`.
///
/// # Example
///
/// ```ignore
/// use simplerc_core::{ResourceError, ResourceManager};
///
/// let manager = ResourceManager::new();
/// manager.set("a", 1, false)?;
/// assert_eq!(manager.get("a"), Some(1));
///
/// assert!(matches!(manager.set("a", 2, false), Err(ResourceError::Immutable { .. })));
///
/// manager.delete_forced("a")?;
/// assert_eq!(manager.get("a"), None);
/// ```
pub struct ResourceManager<T> {
    config: ManagerConfig,
    entries: ReentrantMutex<RefCell<Entries<T>>>,
    events: EventDispatcher,
    metrics: OperationMetrics,
}

impl<T: Clone> ResourceManager<T> {
    /// Create an empty manager with the default configuration.
    pub fn new() -> Self {
        Self::build(ManagerConfig::default())
    }

    /// Create an empty manager with the given configuration.
    pub fn with_config(config: ManagerConfig) -> ResourceResult<Self> {
        config.validate()?;
        Ok(Self::build(config))
    }

    fn build(config: ManagerConfig) -> Self {
        info!(scope = %config.scope, "Resource manager created");
        Self {
            entries: ReentrantMutex::new(RefCell::new(IndexMap::with_capacity(
                config.initial_capacity,
            ))),
            config,
            events: EventDispatcher::new(),
            metrics: OperationMetrics::new(),
        }
    }

    /// Get the scope name of this manager.
    pub fn scope(&self) -> &str {
        &self.config.scope
    }

    /// Get the configuration.
    pub fn config(&self) -> &ManagerConfig {
        &self.config
    }

    /// Get the event dispatcher.
    pub fn events(&self) -> &EventDispatcher {
        &self.events
    }

    /// Subscribe to events emitted by this manager.
    pub fn subscribe(&self, subscriber: Arc<dyn EventSubscriber>) {
        self.events.subscribe(subscriber);
    }

    /// Get the operation counters.
    pub fn metrics(&self) -> &OperationMetrics {
        &self.metrics
    }

    fn lock(&self) -> ReentrantMutexGuard<'_, RefCell<Entries<T>>> {
        self.entries.lock()
    }

    // Lookups

    /// Get a copy of the value stored under `name`.
    pub fn get(&self, name: &str) -> Option<T> {
        self.get_resource(name).map(Resource::into_value)
    }

    /// Get a copy of the value stored under `name`, or `default` if absent.
    pub fn get_or(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    /// Get a copy of the resource stored under `name`.
    pub fn get_resource(&self, name: &str) -> Option<Resource<T>> {
        let found = {
            let guard = self.lock();
            let entries = guard.borrow();
            entries.get(name).map(Arc::clone)
        };
        if self.config.collect_metrics {
            self.metrics.record_read(found.is_some());
        }
        found.map(|rc| Resource::clone(&rc))
    }

    /// Get a copy of the resource stored under `name`.
    ///
    /// An absent key yields `default` wrapped as a mutable resource.
    pub fn get_resource_or(&self, name: &str, default: T) -> Resource<T> {
        self.get_resource(name)
            .unwrap_or_else(|| Resource::mutable(default))
    }

    /// Strict lookup: get a copy of the resource stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingKey`] if `name` is absent.
    pub fn lookup(&self, name: &str) -> ResourceResult<Resource<T>> {
        self.get_resource(name)
            .ok_or_else(|| ResourceError::missing(name))
    }

    /// Get the resource stored under `name`, requiring it to be mutable.
    ///
    /// Returns `Ok(None)` if `name` is absent.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Immutable`] if the entry is immutable. Nothing
    /// is written, so the rejection is not counted as a denied mutation.
    pub fn get_mutable(&self, name: &str) -> ResourceResult<Option<Resource<T>>> {
        let _guard = self.lock();
        self.check_mutable(name)?;
        Ok(self.get_resource(name))
    }

    /// Like [`get_mutable`](Self::get_mutable), but an absent key yields
    /// `default` wrapped as a mutable resource. The default is not stored.
    pub fn get_mutable_or(&self, name: &str, default: T) -> ResourceResult<Resource<T>> {
        Ok(self
            .get_mutable(name)?
            .unwrap_or_else(|| Resource::mutable(default)))
    }

    /// Get a copy of the value stored under `name`, requiring it to be mutable.
    pub fn get_mut_value(&self, name: &str) -> ResourceResult<Option<T>> {
        Ok(self.get_mutable(name)?.map(Resource::into_value))
    }

    /// The mutability gate.
    ///
    /// Returns whether `name` is present. Fails if it is present and
    /// immutable. Every mutating operation calls this while holding the lock.
    fn check_mutable(&self, name: &str) -> ResourceResult<bool> {
        let guard = self.lock();
        let entries = guard.borrow();
        match entries.get(name) {
            None => Ok(false),
            Some(rc) if rc.mutable => Ok(true),
            Some(_) => Err(ResourceError::immutable(name)),
        }
    }

    /// Record a rejection by the gate. Runs after the entry map borrow is released.
    fn settle<R>(
        &self,
        name: &str,
        operation: &'static str,
        result: ResourceResult<R>,
    ) -> ResourceResult<R> {
        if let Err(ResourceError::Immutable { .. }) = &result {
            warn!(
                scope = %self.config.scope,
                resource = name,
                operation,
                "Mutation of immutable resource denied"
            );
            if self.config.collect_metrics {
                self.metrics.record_denial();
            }
            self.emit(|scope| ManagerEvent::MutationDenied {
                scope,
                name: name.to_string(),
                operation,
            });
        }
        result
    }

    fn emit(&self, event: impl FnOnce(String) -> ManagerEvent) {
        if self.config.emit_events && self.events.has_subscribers() {
            self.events.emit(event(self.config.scope.clone()));
        }
    }

    // Writes

    /// Store `value` under `name` with the given mutability flag.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Immutable`] if `name` holds an immutable resource.
    pub fn set(&self, name: &str, value: T, mutable: bool) -> ResourceResult<()> {
        self.set_resource(name, Resource::new(value, mutable))
    }

    /// Store `resource` verbatim under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Immutable`] if `name` holds an immutable resource.
    pub fn set_resource(&self, name: &str, resource: Resource<T>) -> ResourceResult<()> {
        let mutable = resource.mutable;
        let result = self.store(name, resource);
        let replaced = self.settle(name, "set", result)?;

        debug!(scope = %self.config.scope, resource = name, mutable, replaced, "Resource set");
        if self.config.collect_metrics {
            self.metrics.record_write();
        }
        self.emit(|scope| ManagerEvent::ResourceSet {
            scope,
            name: name.to_string(),
            mutable,
            replaced,
        });
        Ok(())
    }

    fn store(&self, name: &str, resource: Resource<T>) -> ResourceResult<bool> {
        let guard = self.lock();
        let existed = self.check_mutable(name)?;
        let displaced = guard.borrow_mut().insert(name.to_string(), Arc::new(resource));
        drop(displaced);
        Ok(existed)
    }

    /// Store `value` as an immutable resource, like item assignment on a map.
    pub fn insert(&self, name: &str, value: T) -> ResourceResult<()> {
        self.set(name, value, false)
    }

    /// Mutate a mutable resource in place and return the closure's result.
    ///
    /// The closure runs while this thread holds the manager's lock, so other
    /// threads cannot observe a partial update. Calls back into the manager
    /// from inside the closure do not deadlock; they see the entry as it was
    /// before the closure ran, and the closure's value is written back
    /// afterwards through the gate again.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingKey`] if `name` is absent (before or
    /// after the closure runs), or [`ResourceError::Immutable`] if the entry
    /// is immutable.
    pub fn update<R>(&self, name: &str, f: impl FnOnce(&mut T) -> R) -> ResourceResult<R> {
        let result = self.update_locked(name, f);
        let out = self.settle(name, "update", result)?;

        debug!(scope = %self.config.scope, resource = name, "Resource updated in place");
        if self.config.collect_metrics {
            self.metrics.record_write();
        }
        self.emit(|scope| ManagerEvent::ResourceSet {
            scope,
            name: name.to_string(),
            mutable: true,
            replaced: true,
        });
        Ok(out)
    }

    fn update_locked<R>(&self, name: &str, f: impl FnOnce(&mut T) -> R) -> ResourceResult<R> {
        let guard = self.lock();
        if !self.check_mutable(name)? {
            return Err(ResourceError::missing(name));
        }
        let current = guard
            .borrow()
            .get(name)
            .map(Arc::clone)
            .ok_or_else(|| ResourceError::missing(name))?;
        let mut value = current.value.clone();
        drop(current);

        let out = f(&mut value);

        if !self.check_mutable(name)? {
            return Err(ResourceError::missing(name));
        }
        // Key is present, so this replaces in place and keeps its position.
        let fresh = Arc::new(Resource::mutable(value));
        let displaced = guard.borrow_mut().insert(name.to_string(), fresh);
        drop(displaced);
        Ok(out)
    }

    // Removals

    /// Remove a mutable resource and return its value.
    ///
    /// Returns `Ok(None)` if `name` is absent; nothing is inserted.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Immutable`] if the entry is immutable.
    pub fn pop(&self, name: &str) -> ResourceResult<Option<T>> {
        Ok(self.pop_resource(name)?.map(Resource::into_value))
    }

    /// Remove a mutable resource and return its value, or `default` if absent.
    pub fn pop_or(&self, name: &str, default: T) -> ResourceResult<T> {
        Ok(self.pop(name)?.unwrap_or(default))
    }

    /// Remove a mutable resource and return it.
    pub fn pop_resource(&self, name: &str) -> ResourceResult<Option<Resource<T>>> {
        let result = self.take(name);
        let removed = self.settle(name, "pop", result)?;
        if removed.is_some() {
            self.removed(name);
        }
        Ok(removed)
    }

    /// Remove a mutable resource and return it; an absent key yields
    /// `default` wrapped as a mutable resource.
    pub fn pop_resource_or(&self, name: &str, default: T) -> ResourceResult<Resource<T>> {
        Ok(self
            .pop_resource(name)?
            .unwrap_or_else(|| Resource::mutable(default)))
    }

    /// Remove a mutable resource.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Immutable`] if the entry is immutable, or
    /// [`ResourceError::MissingKey`] if it is absent.
    pub fn delete(&self, name: &str) -> ResourceResult<()> {
        let result = self.take(name);
        match self.settle(name, "delete", result)? {
            Some(_) => {
                self.removed(name);
                Ok(())
            }
            None => Err(ResourceError::missing(name)),
        }
    }

    /// Remove a resource, like item deletion on a map. Same as [`delete`](Self::delete).
    pub fn remove(&self, name: &str) -> ResourceResult<()> {
        self.delete(name)
    }

    fn take(&self, name: &str) -> ResourceResult<Option<Resource<T>>> {
        let guard = self.lock();
        if !self.check_mutable(name)? {
            return Ok(None);
        }
        let removed = guard.borrow_mut().shift_remove(name);
        Ok(removed.map(Self::unshare))
    }

    fn unshare(rc: Arc<Resource<T>>) -> Resource<T> {
        Arc::try_unwrap(rc).unwrap_or_else(|shared| Resource::clone(&shared))
    }

    fn snapshot(&self) -> Vec<(String, Arc<Resource<T>>)> {
        self.lock()
            .borrow()
            .iter()
            .map(|(name, rc)| (name.clone(), Arc::clone(rc)))
            .collect()
    }

    fn removed(&self, name: &str) {
        debug!(scope = %self.config.scope, resource = name, "Resource removed");
        if self.config.collect_metrics {
            self.metrics.record_removals(1);
        }
        self.emit(|scope| ManagerEvent::ResourceRemoved {
            scope,
            name: name.to_string(),
        });
    }

    /// Remove a resource regardless of its mutability flag.
    ///
    /// This deliberately bypasses the immutability contract. Prefer
    /// [`delete`](Self::delete) unless overriding a protected entry is
    /// really required.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingKey`] if `name` is absent.
    pub fn delete_forced(&self, name: &str) -> ResourceResult<()> {
        let removed = {
            let guard = self.lock();
            let mut entries = guard.borrow_mut();
            entries.shift_remove(name)
        };
        let rc = removed.ok_or_else(|| ResourceError::missing(name))?;

        warn!(
            scope = %self.config.scope,
            resource = name,
            was_immutable = rc.is_immutable(),
            "Resource force deleted"
        );
        if self.config.collect_metrics {
            self.metrics.record_forced_removals(1);
        }
        self.emit(|scope| ManagerEvent::ResourceForceRemoved {
            scope,
            name: name.to_string(),
            was_immutable: rc.is_immutable(),
        });
        Ok(())
    }

    /// Remove every mutable resource, keeping immutable ones.
    ///
    /// Returns the number of removed entries.
    pub fn clear(&self) -> usize {
        let doomed = {
            let guard = self.lock();
            let mut entries = guard.borrow_mut();
            let (kept, doomed): (Entries<T>, Entries<T>) = std::mem::take(&mut *entries)
                .into_iter()
                .partition(|(_, rc)| rc.is_immutable());
            *entries = kept;
            doomed
        };
        let removed = doomed.len();
        drop(doomed);

        info!(scope = %self.config.scope, removed, "Mutable resources cleared");
        if self.config.collect_metrics {
            self.metrics.record_removals(removed as u64);
        }
        self.emit(|scope| ManagerEvent::Cleared {
            scope,
            removed,
            forced: false,
        });
        removed
    }

    /// Remove every resource regardless of its mutability flag.
    ///
    /// Returns the number of removed entries.
    pub fn clear_forced(&self) -> usize {
        let doomed = {
            let guard = self.lock();
            let mut entries = guard.borrow_mut();
            std::mem::take(&mut *entries)
        };
        let removed = doomed.len();
        drop(doomed);

        warn!(scope = %self.config.scope, removed, "All resources force cleared");
        if self.config.collect_metrics {
            self.metrics.record_forced_removals(removed as u64);
        }
        self.emit(|scope| ManagerEvent::Cleared {
            scope,
            removed,
            forced: true,
        });
        removed
    }

    // Introspection

    /// Check if a resource is stored under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.lock().borrow().contains_key(name)
    }

    /// Check whether the resource under `name` is mutable, or `None` if absent.
    pub fn is_mutable(&self, name: &str) -> Option<bool> {
        self.lock().borrow().get(name).map(|rc| rc.mutable)
    }

    /// Get the number of stored resources.
    pub fn len(&self) -> usize {
        self.lock().borrow().len()
    }

    /// Check if the manager is empty.
    pub fn is_empty(&self) -> bool {
        self.lock().borrow().is_empty()
    }

    /// Get the stored names, in insertion order.
    pub fn keys(&self) -> Vec<String> {
        self.lock().borrow().keys().cloned().collect()
    }

    /// Get copies of the stored resources, in insertion order.
    pub fn values(&self) -> Vec<Resource<T>> {
        self.snapshot()
            .into_iter()
            .map(|(_, rc)| Resource::clone(&rc))
            .collect()
    }

    /// Get copies of the stored name/resource pairs, in insertion order.
    pub fn items(&self) -> Vec<(String, Resource<T>)> {
        self.snapshot()
            .into_iter()
            .map(|(name, rc)| (name, Resource::clone(&rc)))
            .collect()
    }

    /// Get a deep copy of the whole mapping.
    pub fn as_map(&self) -> IndexMap<String, Resource<T>> {
        self.snapshot()
            .into_iter()
            .map(|(name, rc)| (name, Resource::clone(&rc)))
            .collect()
    }
}

impl<T: Clone> Default for ResourceManager<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: Clone> IntoIterator for &'a ResourceManager<T> {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    /// Iterate over a snapshot of the stored names.
    fn into_iter(self) -> Self::IntoIter {
        self.keys().into_iter()
    }
}

impl<T> std::fmt::Debug for ResourceManager<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.entries.lock();
        let names: Vec<String> = match guard.try_borrow() {
            Ok(entries) => entries.keys().cloned().collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("ResourceManager")
            .field("scope", &self.config.scope)
            .field("resources", &names)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::OnceLock;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use simplerc_observe::CollectingSubscriber;

    #[test]
    fn test_absent_key_returns_default() {
        let manager: ResourceManager<i32> = ResourceManager::new();

        assert_eq!(manager.get("missing"), None);
        assert_eq!(manager.get_or("missing", 7), 7);
        assert!(!manager.contains("missing"));
        assert_eq!(manager.get_resource_or("missing", 7), Resource::mutable(7));
        assert!(manager.is_empty());
    }

    #[test]
    fn test_mutable_set_can_be_overwritten() {
        let manager = ResourceManager::new();
        manager.set("k", 1, true).unwrap();
        assert_eq!(manager.get("k"), Some(1));

        manager.set("k", 2, false).unwrap();
        assert_eq!(manager.get_resource("k"), Some(Resource::immutable(2)));
    }

    #[test]
    fn test_immutable_blocks_standard_mutation() {
        let manager = ResourceManager::new();
        manager.set("k", 1, false).unwrap();

        assert!(manager.set("k", 2, true).unwrap_err().is_immutable());
        assert!(manager.set_resource("k", Resource::mutable(3)).unwrap_err().is_immutable());
        assert!(manager.pop("k").unwrap_err().is_immutable());
        assert!(manager.delete("k").unwrap_err().is_immutable());
        assert!(manager.update("k", |v| *v += 1).unwrap_err().is_immutable());
        assert!(manager.get_mutable("k").unwrap_err().is_immutable());
        assert_eq!(manager.get("k"), Some(1));

        manager.delete_forced("k").unwrap();
        assert!(!manager.contains("k"));
    }

    #[test]
    fn test_immutable_scenario() {
        let manager = ResourceManager::new();
        manager.set("a", 1, false).unwrap();
        assert_eq!(manager.get("a"), Some(1));

        let err = manager.set("a", 2, false).unwrap_err();
        assert_eq!(
            err,
            ResourceError::Immutable {
                name: "a".to_string()
            }
        );

        manager.delete_forced("a").unwrap();
        assert_eq!(manager.get("a"), None);
    }

    #[test]
    fn test_mutable_pop_scenario() {
        let manager = ResourceManager::new();
        manager.set("b", vec![1, 2], true).unwrap();

        assert_eq!(manager.pop("b").unwrap(), Some(vec![1, 2]));
        assert!(!manager.contains("b"));
    }

    #[test]
    fn test_defaults_never_persist() {
        let manager = ResourceManager::new();

        assert_eq!(manager.pop_or("x", 5).unwrap(), 5);
        assert_eq!(manager.pop_resource_or("x", 5).unwrap(), Resource::mutable(5));
        assert_eq!(manager.get_mutable_or("x", 5).unwrap(), Resource::mutable(5));
        assert_eq!(manager.get_mutable("x").unwrap(), None);
        assert_eq!(manager.get_mut_value("x").unwrap(), None);

        assert!(!manager.contains("x"));
        assert_eq!(manager.len(), 0);
    }

    #[test]
    fn test_delete_missing_key() {
        let manager: ResourceManager<i32> = ResourceManager::new();

        assert!(manager.delete("nope").unwrap_err().is_missing());
        assert!(manager.delete_forced("nope").unwrap_err().is_missing());
        assert!(manager.lookup("nope").unwrap_err().is_missing());
    }

    #[test]
    fn test_copy_isolation() {
        let manager = ResourceManager::new();
        manager.set("frozen", vec![1, 2, 3], false).unwrap();
        manager.set("open", vec![1, 2, 3], true).unwrap();

        let mut frozen = manager.get("frozen").unwrap();
        frozen.push(4);
        let mut rc = manager.lookup("frozen").unwrap();
        rc.value.clear();
        assert_eq!(manager.get("frozen"), Some(vec![1, 2, 3]));

        // Mutable entries follow the same policy: reads are copies.
        let mut open = manager.get("open").unwrap();
        open.push(4);
        assert_eq!(manager.get("open"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn test_update_in_place() {
        let manager = ResourceManager::new();
        manager.set("counter", 1, true).unwrap();

        let seen = manager
            .update("counter", |v| {
                *v += 10;
                *v
            })
            .unwrap();

        assert_eq!(seen, 11);
        assert_eq!(manager.get("counter"), Some(11));
        assert!(manager.update("absent", |v| *v += 1).unwrap_err().is_missing());
    }

    #[test]
    fn test_update_reentrant_call() {
        let manager = ResourceManager::new();
        manager.set("a", 1, true).unwrap();
        manager.set("b", 100, true).unwrap();

        manager
            .update("a", |v| {
                let b = manager.get("b").unwrap();
                manager.set("b", b + 1, true).unwrap();
                *v += b;
            })
            .unwrap();

        assert_eq!(manager.get("a"), Some(101));
        assert_eq!(manager.get("b"), Some(101));
    }

    #[test]
    fn test_update_fails_when_entry_deleted_inside_closure() {
        let manager = ResourceManager::new();
        manager.set("a", 1, true).unwrap();

        let err = manager
            .update("a", |_| manager.delete("a").unwrap())
            .unwrap_err();

        assert!(err.is_missing());
        assert!(!manager.contains("a"));
    }

    #[test]
    fn test_clear_keeps_immutable() {
        let manager = ResourceManager::new();
        manager.set("keep", 1, false).unwrap();
        manager.set("drop1", 2, true).unwrap();
        manager.set("drop2", 3, true).unwrap();

        assert_eq!(manager.clear(), 2);
        assert_eq!(manager.keys(), vec!["keep".to_string()]);

        assert_eq!(manager.clear_forced(), 1);
        assert!(manager.is_empty());
    }

    #[test]
    fn test_insertion_order() {
        let manager = ResourceManager::new();
        for name in ["c", "a", "b"] {
            manager.set(name, 0, true).unwrap();
        }
        manager.set("a", 1, true).unwrap();
        assert_eq!(manager.keys(), vec!["c", "a", "b"]);

        manager.delete("c").unwrap();
        manager.set("c", 2, true).unwrap();
        assert_eq!(manager.keys(), vec!["a", "b", "c"]);

        let iterated: Vec<String> = (&manager).into_iter().collect();
        assert_eq!(iterated, manager.keys());
    }

    #[test]
    fn test_container_style_access() {
        let manager = ResourceManager::new();
        manager.insert("x", "one".to_string()).unwrap();

        assert!(manager.contains("x"));
        assert_eq!(manager.len(), 1);
        assert_eq!(manager.is_mutable("x"), Some(false));
        assert!(manager.remove("x").unwrap_err().is_immutable());

        manager.set("y", "two".to_string(), true).unwrap();
        manager.remove("y").unwrap();
        assert_eq!(manager.is_mutable("y"), None);
    }

    #[test]
    fn test_snapshot_unaffected_by_later_mutation() {
        let manager = ResourceManager::new();
        manager.set("a", 1, true).unwrap();
        manager.set("b", 2, false).unwrap();

        let snapshot = manager.as_map();
        let items = manager.items();
        let values = manager.values();

        manager.set("a", 10, true).unwrap();
        manager.set("c", 3, true).unwrap();
        manager.delete_forced("b").unwrap();

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot["a"], Resource::mutable(1));
        assert_eq!(snapshot["b"], Resource::immutable(2));
        assert_eq!(items[0], ("a".to_string(), Resource::mutable(1)));
        assert_eq!(values, vec![Resource::mutable(1), Resource::immutable(2)]);
    }

    #[test]
    fn test_with_config_validates() {
        let result: ResourceResult<ResourceManager<i32>> =
            ResourceManager::with_config(ManagerConfig::new().with_scope(""));
        assert!(matches!(result, Err(ResourceError::InvalidConfig(_))));

        let manager: ResourceManager<i32> =
            ResourceManager::with_config(ManagerConfig::new().with_scope("plugins")).unwrap();
        assert_eq!(manager.scope(), "plugins");
    }

    #[test]
    fn test_events_emitted() {
        let manager = ResourceManager::new();
        let collector = Arc::new(CollectingSubscriber::new(100));
        manager.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);

        manager.set("a", 1, false).unwrap();
        let _ = manager.delete("a");
        manager.delete_forced("a").unwrap();
        manager.set("b", 2, true).unwrap();
        manager.clear();

        assert_eq!(
            collector.event_types(),
            vec![
                "resource_set",
                "mutation_denied",
                "resource_force_removed",
                "resource_set",
                "cleared",
            ]
        );
    }

    #[test]
    fn test_events_disabled() {
        let manager =
            ResourceManager::with_config(ManagerConfig::new().with_events(false)).unwrap();
        let collector = Arc::new(CollectingSubscriber::new(100));
        manager.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);

        manager.set("a", 1, true).unwrap();

        assert!(collector.is_empty());
    }

    #[test]
    fn test_metrics_counted() {
        let manager = ResourceManager::new();
        manager.set("a", 1, false).unwrap();
        manager.get("a");
        manager.get("b");
        let _ = manager.pop("a");
        manager.delete_forced("a").unwrap();

        let snapshot = manager.metrics().snapshot();
        assert_eq!(snapshot.writes, 1);
        assert_eq!(snapshot.reads, 2);
        assert_eq!(snapshot.misses, 1);
        assert_eq!(snapshot.denials, 1);
        assert_eq!(snapshot.forced_removals, 1);
    }

    #[test]
    fn test_read_of_immutable_is_not_a_denied_mutation() {
        let manager = ResourceManager::new();
        let collector = Arc::new(CollectingSubscriber::new(100));
        manager.subscribe(Arc::clone(&collector) as Arc<dyn EventSubscriber>);
        manager.set("a", 1, false).unwrap();

        assert!(manager.get_mutable("a").unwrap_err().is_immutable());
        assert!(manager.get_mut_value("a").unwrap_err().is_immutable());
        assert!(manager.get_mutable_or("a", 0).unwrap_err().is_immutable());

        assert_eq!(manager.metrics().denials(), 0);
        assert_eq!(collector.event_types(), vec!["resource_set"]);

        let _ = manager.set("a", 2, true);
        assert_eq!(manager.metrics().denials(), 1);
    }

    static DROP_AWARE: OnceLock<ResourceManager<DropAware>> = OnceLock::new();
    static DROPS_SEEN: AtomicUsize = AtomicUsize::new(0);

    #[derive(Debug, Clone)]
    struct DropAware(u32);

    impl Drop for DropAware {
        fn drop(&mut self) {
            if let Some(manager) = DROP_AWARE.get() {
                let _ = manager.contains("watched");
                DROPS_SEEN.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    #[test]
    fn test_payload_drop_may_call_back_into_manager() {
        let manager = DROP_AWARE.get_or_init(ResourceManager::new);

        manager.set("watched", DropAware(1), true).unwrap();
        manager.set("watched", DropAware(2), true).unwrap();
        manager.update("watched", |v| v.0 += 1).unwrap();
        assert_eq!(manager.get("watched").map(|v| v.0), Some(3));

        manager.set("popped", DropAware(4), true).unwrap();
        assert_eq!(manager.pop("popped").unwrap().map(|v| v.0), Some(4));
        manager.set("deleted", DropAware(5), true).unwrap();
        manager.delete("deleted").unwrap();

        manager.set("kept", DropAware(6), false).unwrap();
        assert_eq!(manager.clear(), 1);
        assert_eq!(manager.keys(), vec!["kept".to_string()]);
        manager.delete_forced("kept").unwrap();

        manager.set("last", DropAware(7), false).unwrap();
        assert_eq!(manager.clear_forced(), 1);
        assert!(manager.is_empty());

        assert!(DROPS_SEEN.load(Ordering::Relaxed) >= 8);
    }

    static CLONE_AWARE: OnceLock<ResourceManager<WritesOnClone>> = OnceLock::new();

    #[derive(Debug)]
    struct WritesOnClone(u32);

    impl Clone for WritesOnClone {
        fn clone(&self) -> Self {
            if let Some(manager) = CLONE_AWARE.get() {
                manager.set("last_clone", WritesOnClone(self.0), true).unwrap();
            }
            WritesOnClone(self.0)
        }
    }

    #[test]
    fn test_payload_clone_may_write_into_manager() {
        let manager = CLONE_AWARE.get_or_init(ResourceManager::new);
        manager.set("a", WritesOnClone(7), true).unwrap();

        assert_eq!(manager.get("a").map(|v| v.0), Some(7));
        assert!(manager.contains("last_clone"));

        assert_eq!(manager.items().len(), 2);
        assert_eq!(manager.values().len(), 2);
        assert_eq!(manager.as_map().len(), 2);

        manager.update("a", |v| v.0 += 1).unwrap();
        assert_eq!(manager.get_resource("a").map(|rc| rc.value.0), Some(8));
    }

    struct Reentrant {
        manager: OnceLock<Arc<ResourceManager<i32>>>,
        observed: parking_lot::Mutex<Vec<usize>>,
    }

    impl EventSubscriber for Reentrant {
        fn on_event(&self, _event: &ManagerEvent) {
            if let Some(manager) = self.manager.get() {
                self.observed.lock().push(manager.len());
            }
        }
    }

    #[test]
    fn test_subscriber_may_call_back_into_manager() {
        let manager = Arc::new(ResourceManager::new());
        let subscriber = Arc::new(Reentrant {
            manager: OnceLock::new(),
            observed: parking_lot::Mutex::new(Vec::new()),
        });
        let _ = subscriber.manager.set(Arc::clone(&manager));
        manager.subscribe(Arc::clone(&subscriber) as Arc<dyn EventSubscriber>);

        manager.set("a", 1, true).unwrap();
        manager.set("b", 2, true).unwrap();

        assert_eq!(*subscriber.observed.lock(), vec![1, 2]);
    }

    #[test]
    fn test_concurrent_distinct_keys() {
        const THREADS: usize = 64;
        const PER_THREAD: usize = 50;

        let manager = Arc::new(ResourceManager::new());
        let handles: Vec<_> = (0..THREADS)
            .map(|t| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for i in 0..PER_THREAD {
                        let name = format!("t{}-{}", t, i);
                        manager.set(&name, t * PER_THREAD + i, true).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.len(), THREADS * PER_THREAD);
        for t in 0..THREADS {
            for i in 0..PER_THREAD {
                let name = format!("t{}-{}", t, i);
                assert_eq!(manager.get(&name), Some(t * PER_THREAD + i));
            }
        }
    }

    #[test]
    fn test_concurrent_updates_are_not_lost() {
        let manager = Arc::new(ResourceManager::new());
        manager.set("counter", 0u64, true).unwrap();

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                thread::spawn(move || {
                    for _ in 0..500 {
                        manager.update("counter", |v| *v += 1).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(manager.get("counter"), Some(16 * 500));
    }

    #[test]
    fn test_racing_immutable_set_and_delete() {
        for round in 0..200 {
            let manager = Arc::new(ResourceManager::new());
            let setter = {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.set("k", round, false))
            };
            let deleter = {
                let manager = Arc::clone(&manager);
                thread::spawn(move || manager.delete("k"))
            };

            setter.join().unwrap().unwrap();
            let deleted = deleter.join().unwrap();

            // Whichever ran first, the immutable entry survives the checked delete.
            match deleted {
                Err(ResourceError::MissingKey { .. }) | Err(ResourceError::Immutable { .. }) => {}
                other => panic!("unexpected delete outcome: {:?}", other),
            }
            assert_eq!(manager.get_resource("k"), Some(Resource::immutable(round)));

            manager.delete_forced("k").unwrap();
            assert!(!manager.contains("k"));
        }
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;
        use std::collections::HashMap;

        #[derive(Debug, Clone)]
        enum Op {
            Set(u8, i32, bool),
            Delete(u8),
            Pop(u8),
            Forced(u8),
        }

        fn op_strategy() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u8..4, any::<i32>(), any::<bool>()).prop_map(|(k, v, m)| Op::Set(k, v, m)),
                (0u8..4).prop_map(Op::Delete),
                (0u8..4).prop_map(Op::Pop),
                (0u8..4).prop_map(Op::Forced),
            ]
        }

        #[derive(Debug, PartialEq)]
        enum Outcome {
            Ok,
            Popped(Option<i32>),
            Immutable,
            Missing,
        }

        fn outcome<R>(result: ResourceResult<R>, ok: impl FnOnce(R) -> Outcome) -> Outcome {
            match result {
                Ok(r) => ok(r),
                Err(ResourceError::Immutable { .. }) => Outcome::Immutable,
                Err(ResourceError::MissingKey { .. }) => Outcome::Missing,
                Err(e) => panic!("unexpected error: {}", e),
            }
        }

        proptest! {
            #[test]
            fn prop_gate_matches_model(ops in proptest::collection::vec(op_strategy(), 0..64)) {
                let manager = ResourceManager::with_config(
                    ManagerConfig::new().with_events(false).with_metrics(false),
                ).unwrap();
                let mut model: HashMap<String, (i32, bool)> = HashMap::new();

                for op in ops {
                    match op {
                        Op::Set(k, v, m) => {
                            let name = k.to_string();
                            let expected = match model.get(&name) {
                                Some((_, false)) => Outcome::Immutable,
                                _ => {
                                    model.insert(name.clone(), (v, m));
                                    Outcome::Ok
                                }
                            };
                            prop_assert_eq!(outcome(manager.set(&name, v, m), |_| Outcome::Ok), expected);
                        }
                        Op::Delete(k) => {
                            let name = k.to_string();
                            let expected = match model.get(&name) {
                                None => Outcome::Missing,
                                Some((_, false)) => Outcome::Immutable,
                                Some(_) => {
                                    model.remove(&name);
                                    Outcome::Ok
                                }
                            };
                            prop_assert_eq!(outcome(manager.delete(&name), |_| Outcome::Ok), expected);
                        }
                        Op::Pop(k) => {
                            let name = k.to_string();
                            let expected = match model.get(&name) {
                                None => Outcome::Popped(None),
                                Some((_, false)) => Outcome::Immutable,
                                Some((v, _)) => {
                                    let v = *v;
                                    model.remove(&name);
                                    Outcome::Popped(Some(v))
                                }
                            };
                            prop_assert_eq!(outcome(manager.pop(&name), Outcome::Popped), expected);
                        }
                        Op::Forced(k) => {
                            let name = k.to_string();
                            let expected = match model.remove(&name) {
                                None => Outcome::Missing,
                                Some(_) => Outcome::Ok,
                            };
                            prop_assert_eq!(outcome(manager.delete_forced(&name), |_| Outcome::Ok), expected);
                        }
                    }
                }

                prop_assert_eq!(manager.len(), model.len());
                for (name, (value, mutable)) in &model {
                    prop_assert_eq!(manager.get_resource(name), Some(Resource::new(*value, *mutable)));
                }
            }
        }
    }
}
