//! Summary command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use kerntime_collector::accuracy::{is_accurate, summarize, AccuracyCriteria};
use kerntime_collector::output::csv::read_records;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SummaryArgs {
    /// Dataset or cache file to summarize
    pub input: PathBuf,

    /// Relative uncertainty at or above which a kernel is highlighted
    #[arg(long, default_value = "0.01")]
    pub max_rel_uncertainty: f64,

    /// Samples per kernel required for the set to count as accurate
    #[arg(long, default_value = "10")]
    pub min_iterations: usize,
}

pub fn run(args: SummaryArgs) -> Result<()> {
    let records = read_records(&args.input)
        .with_context(|| format!("Failed to read {}", args.input.display()))?;

    if records.is_empty() {
        output::warning(&format!("{} holds no records", args.input.display()));
        return Ok(());
    }

    let summaries = summarize(&records);
    output::print_summaries(&summaries, args.max_rel_uncertainty);

    let above = summaries
        .iter()
        .filter(|s| s.rel_uncertainty >= args.max_rel_uncertainty)
        .count();
    output::info(&format!(
        "{} records, {} kernels, {} at or above {:.2}% relative uncertainty",
        records.len(),
        summaries.len(),
        above,
        args.max_rel_uncertainty * 100.0
    ));

    let criteria = AccuracyCriteria {
        min_iterations: args.min_iterations,
        max_rel_uncertainty: args.max_rel_uncertainty,
    };
    if is_accurate(&records, &criteria) {
        output::success(&format!(
            "Every kernel has at least {} samples below the threshold",
            args.min_iterations
        ));
    } else {
        output::warning("Not every kernel meets the accuracy criteria");
    }
    Ok(())
}
