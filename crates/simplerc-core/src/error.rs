//! Error types for resource management.

use thiserror::Error;

/// Errors returned by resource manager operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// A mutating operation targeted a resource that was set as immutable.
    #[error("Cannot complete operation: resource '{name}' was set as immutable")]
    Immutable {
        /// Name of the protected resource.
        name: String,
    },

    /// A strict lookup or deletion targeted an absent key.
    #[error("Resource not found: '{name}'")]
    MissingKey {
        /// Name that was looked up.
        name: String,
    },

    /// Configuration error.
    #[error("Invalid manager configuration: {0}")]
    InvalidConfig(String),
}

impl ResourceError {
    pub(crate) fn immutable(name: &str) -> Self {
        Self::Immutable {
            name: name.to_string(),
        }
    }

    pub(crate) fn missing(name: &str) -> Self {
        Self::MissingKey {
            name: name.to_string(),
        }
    }

    /// Check if this error was raised by the mutability check.
    pub fn is_immutable(&self) -> bool {
        matches!(self, Self::Immutable { .. })
    }

    /// Check if this error was raised for an absent key.
    pub fn is_missing(&self) -> bool {
        matches!(self, Self::MissingKey { .. })
    }
}

/// Result type for resource operations.
pub type ResourceResult<T> = std::result::Result<T, ResourceError>;
