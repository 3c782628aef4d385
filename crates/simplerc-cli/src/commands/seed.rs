//! TOML seed files.
//!
//! A seed file lists resources under a `resources` table:
//!
//! ```toml
//! [resources.greeting]
//! value = "hello"
//!
//! [resources.retries]
//! value = 3
//! mutable = true
//! ```
//!
//! `mutable` defaults to `false`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use simplerc::{Resource, ResourceError, Simplerc, Value};
use simplerc_core::ResourceManager;

/// Scope used when none is given on the command line.
pub const SEED_SCOPE: &str = "seed";

/// Parsed contents of a seed file.
#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub resources: IndexMap<String, Resource<Value>>,
}

/// A resource that could not be applied.
#[derive(Debug, Clone, Serialize)]
pub struct Rejection {
    pub source: String,
    pub name: String,
    pub reason: String,
}

/// Result of applying one or more seed files.
#[derive(Debug, Default, Serialize)]
pub struct LoadOutcome {
    pub loaded: usize,
    pub rejected: Vec<Rejection>,
}

/// Parse seed file contents.
pub fn parse_seed(text: &str) -> Result<SeedFile> {
    toml::from_str(text).context("Invalid seed file")
}

/// Read and parse a seed file.
pub fn read_seed(path: &Path) -> Result<SeedFile> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file {}", path.display()))?;
    parse_seed(&text).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Create the manager seed files are loaded into.
pub fn build_manager(scope: Option<&str>) -> Result<ResourceManager<Value>> {
    Simplerc::builder()
        .with_scope(scope.unwrap_or(SEED_SCOPE))
        .with_logging()
        .build()
        .context("Failed to create resource manager")
}

/// Apply one parsed seed file. Immutable entries from earlier files win.
pub fn apply_seed(
    manager: &ResourceManager<Value>,
    source: &str,
    seed: SeedFile,
    outcome: &mut LoadOutcome,
) -> Result<()> {
    for (name, resource) in seed.resources {
        match manager.set_resource(&name, resource) {
            Ok(()) => {
                debug!(source, resource = %name, "Seed resource applied");
                outcome.loaded += 1;
            }
            Err(err @ ResourceError::Immutable { .. }) => {
                outcome.rejected.push(Rejection {
                    source: source.to_string(),
                    name,
                    reason: err.to_string(),
                });
            }
            Err(err) => return Err(err).context("Failed to apply seed resource"),
        }
    }
    Ok(())
}

/// Read every seed file in order and apply it to `manager`.
pub fn load_all(manager: &ResourceManager<Value>, paths: &[PathBuf]) -> Result<LoadOutcome> {
    let mut outcome = LoadOutcome::default();
    for path in paths {
        let seed = read_seed(path)?;
        apply_seed(manager, &path.display().to_string(), seed, &mut outcome)?;
    }
    info!(
        loaded = outcome.loaded,
        rejected = outcome.rejected.len(),
        "Seed files applied"
    );
    Ok(outcome)
}
