//! simplerc Core
//!
//! This crate provides the resource manager at the heart of simplerc:
//!
//! - [`Resource`]: a stored value plus its mutability flag
//! - [`ResourceManager`]: a thread-safe, insertion-ordered store of named
//!   resources that refuses to overwrite or remove immutable entries
//! - [`ManagerConfig`]: per-manager configuration
//!
//! # Mutability
//!
//! A resource is created by the first `set` for its name. Resources stored
//! with `mutable = false` are protected: `set`, `pop`, `delete`, `update`
//! and `clear` leave them untouched and report [`ResourceError::Immutable`].
//! Only [`ResourceManager::delete_forced`] and
//! [`ResourceManager::clear_forced`] remove them.
//!
//! ```ignore
//! use simplerc_core::ResourceManager;
//!
//! let manager = ResourceManager::new();
//! manager.set("b", vec![1, 2], true)?;
//! assert_eq!(manager.pop("b")?, Some(vec![1, 2]));
//! assert!(!manager.contains("b"));
//! ```
//!
//! # Scopes
//!
//! Managers are independent of one another. Give each one a scope name to
//! tell them apart in logs and events:
//!
//! ```ignore
//! use simplerc_core::{ManagerConfig, ResourceManager};
//!
//! let plugins = ResourceManager::<String>::with_config(
//!     ManagerConfig::new().with_scope("plugins"),
//! )?;
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod resource;

// Re-export main types
pub use config::{DEFAULT_SCOPE, ManagerConfig};
pub use error::{ResourceError, ResourceResult};
pub use manager::ResourceManager;
pub use resource::Resource;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::config::ManagerConfig;
    pub use crate::error::{ResourceError, ResourceResult};
    pub use crate::manager::ResourceManager;
    pub use crate::resource::Resource;
}
