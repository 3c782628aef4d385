//! The stored entry type.

use serde::{Deserialize, Serialize};

/// A stored value together with its mutability flag.
///
/// Equality and ordering compare `value` first, then `mutable`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Resource<T> {
    /// The payload.
    pub value: T,
    /// Whether standard operations may overwrite or remove this resource.
    #[serde(default)]
    pub mutable: bool,
}

impl<T> Resource<T> {
    /// Create a resource with an explicit mutability flag.
    pub fn new(value: T, mutable: bool) -> Self {
        Self { value, mutable }
    }

    /// Create a resource that may later be overwritten or removed.
    pub fn mutable(value: T) -> Self {
        Self::new(value, true)
    }

    /// Create a resource that is protected from standard writes and removal.
    pub fn immutable(value: T) -> Self {
        Self::new(value, false)
    }

    /// Check if this resource is immutable.
    pub fn is_immutable(&self) -> bool {
        !self.mutable
    }

    /// Consume the resource, returning its payload.
    pub fn into_value(self) -> T {
        self.value
    }

    /// Map the payload, keeping the mutability flag.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Resource<U> {
        Resource {
            value: f(self.value),
            mutable: self.mutable,
        }
    }
}
