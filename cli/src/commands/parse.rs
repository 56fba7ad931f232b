//! Parse command implementation

use crate::output;
use anyhow::{Context, Result};
use clap::Args;
use kerntime_collector::collector::trace::parse_trace;
use kerntime_collector::output::csv::write_records_to;
use kerntime_collector::Config;
use kerntime_shared::BenchmarkId;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Profiler trace file
    pub trace: PathBuf,

    /// Benchmark label; also selects the ambiguous-kernel entries
    #[arg(short, long)]
    pub benchmark: String,

    /// Suite label of the records
    #[arg(short, long, default_value = "unknown")]
    pub suite: String,

    /// Configuration file holding the ambiguous-kernel table
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

pub fn run(args: ParseArgs) -> Result<()> {
    let config = Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    let id = BenchmarkId::new(args.suite.as_str(), args.benchmark.as_str());

    let records = parse_trace(&args.trace, &id)
        .with_context(|| format!("Failed to parse {}", args.trace.display()))?;

    match records {
        Some(records) => {
            let records = config.disambiguator().apply(&id.benchmark, records);
            write_records_to(&records, std::io::stdout().lock())
                .context("Failed to write records")?;
        }
        None => output::info(&format!("{} holds no kernel data", args.trace.display())),
    }
    Ok(())
}
