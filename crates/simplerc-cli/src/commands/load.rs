//! Load command - Apply seed files to a manager and report the outcome.

use std::path::PathBuf;

use anyhow::{Result, bail};
use clap::Args;
use serde::Serialize;

use simplerc_observe::MetricsSnapshot;

use super::ResourceDisplay;
use super::seed::{self, Rejection};
use crate::OutputFormat;

/// Arguments for the load command.
#[derive(Args)]
pub struct LoadArgs {
    /// Seed files, applied in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Fail if any resource was rejected
    #[arg(long)]
    pub strict: bool,
}

#[derive(Debug, Serialize)]
struct LoadReport {
    scope: String,
    loaded: usize,
    rejected: Vec<Rejection>,
    resources: Vec<ResourceDisplay>,
    metrics: MetricsSnapshot,
}

/// Execute the load command.
pub fn execute(args: LoadArgs, scope: Option<&str>, format: OutputFormat, quiet: bool) -> Result<()> {
    let manager = seed::build_manager(scope)?;
    let outcome = seed::load_all(&manager, &args.files)?;

    let report = LoadReport {
        scope: manager.scope().to_string(),
        loaded: outcome.loaded,
        rejected: outcome.rejected,
        resources: manager
            .items()
            .into_iter()
            .map(|(name, rc)| ResourceDisplay::new(&name, rc))
            .collect(),
        metrics: manager.metrics().snapshot(),
    };

    match format {
        OutputFormat::Human => {
            if !quiet {
                println!(
                    "Loaded {} resource(s) from {} file(s) into scope '{}'",
                    report.loaded,
                    args.files.len(),
                    report.scope
                );
                for display in &report.resources {
                    println!("  {}", display.line());
                }
            }
            if !report.rejected.is_empty() {
                println!("\nRejected ({}):", report.rejected.len());
                for rejection in &report.rejected {
                    println!("  {} [{}]: {}", rejection.name, rejection.source, rejection.reason);
                }
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    if args.strict && !report.rejected.is_empty() {
        bail!(
            "{} resource(s) rejected because they were set as immutable",
            report.rejected.len()
        );
    }

    Ok(())
}
