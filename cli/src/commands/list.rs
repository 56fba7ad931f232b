//! List command implementation

use super::ConfigArgs;
use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct ListArgs {
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: ListArgs) -> Result<()> {
    let config = args.config.load()?;
    let benchmarks =
        kerntime_collector::list_benchmarks(&config).context("Failed to discover benchmarks")?;

    if benchmarks.is_empty() {
        output::warning(&format!(
            "No benchmark is common to suites {:?} under {}",
            config.suites,
            config.root.display()
        ));
        return Ok(());
    }

    let mut cached = 0;
    for (benchmark, is_cached) in &benchmarks {
        let state = if *is_cached {
            cached += 1;
            "cached".blue()
        } else {
            "pending".yellow()
        };
        println!("  {:<12} {:<16} {}", benchmark.suite(), benchmark.name(), state);
    }

    output::info(&format!(
        "{} benchmarks, {} cached, {} to measure",
        benchmarks.len(),
        cached,
        benchmarks.len() - cached
    ));
    Ok(())
}
