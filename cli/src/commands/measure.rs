//! Measure command implementation

use super::ConfigArgs;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct MeasureArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Output file for the kernel timing dataset
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Minimum samples per kernel
    #[arg(long)]
    pub min_iterations: Option<usize>,

    /// Maximum profiler runs per benchmark
    #[arg(long)]
    pub max_iterations: Option<usize>,

    /// Target relative uncertainty (e.g. 0.01 for 1%)
    #[arg(long)]
    pub max_rel_uncertainty: Option<f64>,

    /// Time budget per benchmark (e.g. "30s", "10m")
    #[arg(long)]
    pub max_duration: Option<String>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run(args: MeasureArgs) -> Result<()> {
    let mut config = args.config.load()?;

    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(n) = args.min_iterations {
        config.min_iterations = n;
    }
    if let Some(n) = args.max_iterations {
        config.max_iterations = n;
    }
    if let Some(rel) = args.max_rel_uncertainty {
        config.max_rel_uncertainty = rel;
    }
    if let Some(duration) = &args.max_duration {
        config.max_duration = kerntime_shared::utils::parse_duration(duration)
            .context("Failed to parse duration")?;
    }

    let report = kerntime_collector::run_measurement(config)
        .await
        .context("Measurement failed")?;

    output::print_run_report(&report);
    Ok(())
}
