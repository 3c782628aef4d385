//! simplerc CLI - Seed, inspect and demo resource managers from the shell.

use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

/// Crates whose logs the verbosity flags control.
const LOG_TARGETS: [&str; 3] = ["simplerc_core", "simplerc_observe", "simplerc"];

/// Named resources with per-entry mutability
#[derive(Parser)]
#[command(name = "simplerc")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Scope name for the manager built from seed files (load, inspect)
    #[arg(short, long, global = true)]
    pub scope: Option<String>,

    /// How results are printed
    #[arg(short = 'f', long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only print errors and rejections
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,
}

/// Output format options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    #[default]
    Human,
    /// JSON output
    Json,
    /// Compact JSON (single line)
    JsonCompact,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Populate the default manager with demo resources and print it
    Demo(commands::demo::DemoArgs),
    /// Load seed files into a manager, later files overriding earlier ones
    Load(commands::load::LoadArgs),
    /// Inspect resources loaded from seed files
    Inspect(commands::inspect::InspectArgs),
}

impl Cli {
    fn log_directives(&self) -> String {
        let level = match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            _ => "trace",
        };
        LOG_TARGETS
            .iter()
            .map(|target| format!("{}={}", target, level))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn run(self) -> Result<()> {
        let scope = self.scope.as_deref();
        match self.command {
            Commands::Demo(args) => commands::demo::execute(args, self.format),
            Commands::Load(args) => commands::load::execute(args, scope, self.format, self.quiet),
            Commands::Inspect(args) => commands::inspect::execute(args, scope, self.format),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // RUST_LOG wins over -v/-q
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(cli.log_directives()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let quiet = cli.quiet;
    match cli.run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !quiet {
                eprintln!("Error: {:#}", e);
            }
            ExitCode::FAILURE
        }
    }
}
