//! Demo command - Populate the default manager and walk through its views.

use anyhow::{Context, Result};
use clap::Args;
use rand::Rng;
use serde::Serialize;
use serde_json::json;

use simplerc::Value;
use simplerc_observe::MetricsSnapshot;

use super::ResourceDisplay;
use crate::OutputFormat;

/// Arguments for the demo command.
#[derive(Args)]
pub struct DemoArgs {
    /// Number of immutable and of mutable demo resources to create
    #[arg(short = 'n', long, default_value = "5")]
    pub count: usize,
}

#[derive(Debug, Serialize)]
struct DemoReport {
    scope: String,
    keys: Vec<String>,
    resources: Vec<ResourceDisplay>,
    protected: usize,
    metrics: MetricsSnapshot,
}

/// A random demo record with a float, a small integer and a hex string.
fn demo_record(rng: &mut impl Rng) -> Value {
    let b: usize = rng.gen_range(0..16);
    let c: String = (0..b).map(|_| format!("{:02x}", rng.r#gen::<u8>())).collect();
    json!({
        "a": rng.r#gen::<f64>(),
        "b": b,
        "c": c,
    })
}

/// Execute the demo command.
pub fn execute(args: DemoArgs, format: OutputFormat) -> Result<()> {
    let mut rng = rand::thread_rng();

    for i in 0..args.count {
        simplerc::set(&format!("immutable_demo{}", i), demo_record(&mut rng), false)
            .context("Failed to store immutable demo resource")?;
    }
    for i in 0..args.count {
        simplerc::set(&format!("demo{}", i), demo_record(&mut rng), true)
            .context("Failed to store mutable demo resource")?;
    }

    let manager = simplerc::manager();
    let protected = manager
        .keys()
        .iter()
        .filter(|name| manager.is_mutable(name) == Some(false))
        .count();

    let report = DemoReport {
        scope: manager.scope().to_string(),
        keys: simplerc::keys(),
        resources: simplerc::items()
            .into_iter()
            .map(|(name, rc)| ResourceDisplay::new(&name, rc))
            .collect(),
        protected,
        metrics: manager.metrics().snapshot(),
    };

    match format {
        OutputFormat::Human => {
            println!("Manager: {:?}", manager);
            println!();

            println!("Snapshot:");
            for (name, rc) in simplerc::as_map() {
                println!("  {} => {:?}", name, rc);
            }
            println!();

            println!("Keys:");
            for name in &*manager {
                println!("  {}", name);
            }
            println!();

            println!("Values:");
            for rc in simplerc::values() {
                println!("  {}", rc.value);
            }
            println!();

            println!("Items:");
            for display in &report.resources {
                println!("  {}", display.line());
            }
            println!();

            println!(
                "Protected from overwrite: {} of {}",
                report.protected,
                report.keys.len()
            );
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        OutputFormat::JsonCompact => {
            println!("{}", serde_json::to_string(&report)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_record_shape() {
        let mut rng = rand::thread_rng();
        let record = demo_record(&mut rng);

        let b = record["b"].as_u64().unwrap() as usize;
        assert!(b < 16);
        assert_eq!(record["c"].as_str().unwrap().len(), b * 2);
        assert!((0.0..1.0).contains(&record["a"].as_f64().unwrap()));
    }
}
