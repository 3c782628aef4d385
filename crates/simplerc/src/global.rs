//! The process-wide default manager.
//!
//! Callers that want one shared namespace without passing a manager around
//! can use the free functions in this module. They all delegate to a single
//! [`ResourceManager`] holding dynamically typed [`Value`] payloads, created
//! lazily on first use and never replaced afterwards.
//!
//! Code that needs isolation (tests, plugins, nested scopes) should create
//! its own [`ResourceManager`] and pass it explicitly instead.

use std::ops::Deref;
use std::sync::OnceLock;

use indexmap::IndexMap;
use tracing::warn;

use simplerc_core::{ManagerConfig, Resource, ResourceManager, ResourceResult};

/// Payload type of the default manager.
pub use serde_json::Value;

/// Scope name of the default manager.
pub const GLOBAL_SCOPE: &str = "global";

static DEFAULT_MANAGER: OnceLock<ResourceManager<Value>> = OnceLock::new();

fn default_manager() -> &'static ResourceManager<Value> {
    DEFAULT_MANAGER.get_or_init(|| {
        ResourceManager::with_config(ManagerConfig::new().with_scope(GLOBAL_SCOPE))
            .unwrap_or_else(|err| {
                warn!(error = %err, "Falling back to unscoped default manager");
                ResourceManager::new()
            })
    })
}

/// A read-only handle to a resource manager.
///
/// The handle forwards every call to the manager it was created from but
/// offers no way to replace that manager. It is `Copy`, so it can be handed
/// out freely.
pub struct ManagerHandle<'a, T> {
    manager: &'a ResourceManager<T>,
}

impl<'a, T> ManagerHandle<'a, T> {
    /// Create a handle to `manager`.
    pub fn new(manager: &'a ResourceManager<T>) -> Self {
        Self { manager }
    }

    /// Check whether two handles point to the same manager.
    pub fn ptr_eq(&self, other: &ManagerHandle<'_, T>) -> bool {
        std::ptr::eq(self.manager, other.manager)
    }
}

impl<T> Clone for ManagerHandle<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ManagerHandle<'_, T> {}

impl<T> Deref for ManagerHandle<'_, T> {
    type Target = ResourceManager<T>;

    fn deref(&self) -> &Self::Target {
        self.manager
    }
}

impl<T> std::fmt::Debug for ManagerHandle<'_, T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("ManagerHandle").field(self.manager).finish()
    }
}

/// Get a handle to the default manager.
pub fn manager() -> ManagerHandle<'static, Value> {
    ManagerHandle::new(default_manager())
}

/// Get a copy of the value stored under `name`.
pub fn get(name: &str) -> Option<Value> {
    default_manager().get(name)
}

/// Get a copy of the value stored under `name`, or `default` if absent.
pub fn get_or(name: &str, default: impl Into<Value>) -> Value {
    default_manager().get_or(name, default.into())
}

/// Get a copy of the resource stored under `name`.
pub fn get_resource(name: &str) -> Option<Resource<Value>> {
    default_manager().get_resource(name)
}

/// Strict lookup of the resource stored under `name`.
pub fn lookup(name: &str) -> ResourceResult<Resource<Value>> {
    default_manager().lookup(name)
}

/// Get the resource stored under `name`, requiring it to be mutable.
pub fn get_mutable(name: &str) -> ResourceResult<Option<Resource<Value>>> {
    default_manager().get_mutable(name)
}

/// Get a copy of the value stored under `name`, requiring it to be mutable.
pub fn get_mut_value(name: &str) -> ResourceResult<Option<Value>> {
    default_manager().get_mut_value(name)
}

/// Store `value` under `name`.
pub fn set(name: &str, value: impl Into<Value>, mutable: bool) -> ResourceResult<()> {
    default_manager().set(name, value.into(), mutable)
}

/// Store `resource` verbatim under `name`.
pub fn set_resource(name: &str, resource: Resource<Value>) -> ResourceResult<()> {
    default_manager().set_resource(name, resource)
}

/// Mutate a mutable resource in place.
pub fn update<R>(name: &str, f: impl FnOnce(&mut Value) -> R) -> ResourceResult<R> {
    default_manager().update(name, f)
}

/// Remove a mutable resource and return its value.
pub fn pop(name: &str) -> ResourceResult<Option<Value>> {
    default_manager().pop(name)
}

/// Remove a mutable resource and return its value, or `default` if absent.
pub fn pop_or(name: &str, default: impl Into<Value>) -> ResourceResult<Value> {
    default_manager().pop_or(name, default.into())
}

/// Remove a mutable resource and return it.
pub fn pop_resource(name: &str) -> ResourceResult<Option<Resource<Value>>> {
    default_manager().pop_resource(name)
}

/// Remove a mutable resource.
pub fn delete(name: &str) -> ResourceResult<()> {
    default_manager().delete(name)
}

/// Remove a resource regardless of its mutability flag.
///
/// See [`ResourceManager::delete_forced`].
pub fn delete_forced(name: &str) -> ResourceResult<()> {
    default_manager().delete_forced(name)
}

/// Check if a resource is stored under `name`.
pub fn contains(name: &str) -> bool {
    default_manager().contains(name)
}

/// Get the number of stored resources.
pub fn len() -> usize {
    default_manager().len()
}

/// Check if the default manager is empty.
pub fn is_empty() -> bool {
    default_manager().is_empty()
}

/// Get the stored names, in insertion order.
pub fn keys() -> Vec<String> {
    default_manager().keys()
}

/// Get copies of the stored resources, in insertion order.
pub fn values() -> Vec<Resource<Value>> {
    default_manager().values()
}

/// Get copies of the stored name/resource pairs, in insertion order.
pub fn items() -> Vec<(String, Resource<Value>)> {
    default_manager().items()
}

/// Get a deep copy of the whole mapping.
pub fn as_map() -> IndexMap<String, Resource<Value>> {
    default_manager().as_map()
}

/// Remove every mutable resource, keeping immutable ones.
pub fn clear() -> usize {
    default_manager().clear()
}
