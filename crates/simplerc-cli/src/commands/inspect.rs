//! Inspect command - Show resources loaded from seed files.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use super::ResourceDisplay;
use super::seed;
use crate::OutputFormat;

/// Arguments for the inspect command.
#[derive(Args)]
pub struct InspectArgs {
    /// Seed files, applied in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Show only this resource
    #[arg(short, long)]
    pub key: Option<String>,

    /// Show only immutable resources
    #[arg(long, conflicts_with = "key")]
    pub immutable: bool,
}

#[derive(Debug, Serialize)]
struct InspectionResult {
    scope: String,
    total: usize,
    immutable: usize,
    resources: Vec<ResourceDisplay>,
}

/// Execute the inspect command.
pub fn execute(args: InspectArgs, scope: Option<&str>, format: OutputFormat) -> Result<()> {
    let manager = seed::build_manager(scope)?;
    seed::load_all(&manager, &args.files)?;

    let resources: Vec<ResourceDisplay> = match &args.key {
        Some(key) => {
            let rc = manager
                .lookup(key)
                .with_context(|| format!("No resource named '{}'", key))?;
            vec![ResourceDisplay::new(key, rc)]
        }
        None => manager
            .items()
            .into_iter()
            .filter(|(_, rc)| !args.immutable || rc.is_immutable())
            .map(|(name, rc)| ResourceDisplay::new(&name, rc))
            .collect(),
    };

    let result = InspectionResult {
        scope: manager.scope().to_string(),
        total: manager.len(),
        immutable: manager
            .values()
            .iter()
            .filter(|rc| rc.is_immutable())
            .count(),
        resources,
    };

    match format {
        OutputFormat::Human => {
            println!("Scope: {}", result.scope);
            println!(
                "Resources: {} ({} immutable)",
                result.total, result.immutable
            );
            println!();
            for display in &result.resources {
                println!("  {}", display.line());
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&result)?);
        }
    }

    Ok(())
}
