//! GPU kernel timing collector
//!
//! This library provides the measurement pipeline behind `kerntime`:
//! profiler trace parsing, kernel name disambiguation, the profiler runner,
//! accuracy evaluation and the orchestrator that repeats profiling runs
//! until the samples are precise enough.

pub mod accuracy;
pub mod collector;
pub mod config;
pub mod discovery;
pub mod error;
pub mod orchestrator;
pub mod output;
pub mod runner;

pub use crate::config::{Config, ProfilerConfig};
pub use crate::error::{MeasureError, Result};
pub use crate::orchestrator::{Orchestrator, RunReport, StopReason};
pub use crate::runner::{BenchmarkRunner, NvprofRunner};

use kerntime_shared::types::record::Benchmark;
use tracing::info;

/// Measure the corpus described by `config` with nvprof and write the final dataset.
pub async fn run_measurement(config: Config) -> Result<RunReport> {
    let runner = NvprofRunner::from_config(&config);
    let orchestrator = Orchestrator::new(config, runner)?;

    info!(
        "Measuring suites {:?} under {}",
        orchestrator.config().suites,
        orchestrator.config().root.display()
    );

    orchestrator.run().await
}

/// Cache state of every benchmark that a run would measure
pub fn list_benchmarks(config: &Config) -> Result<Vec<(Benchmark, bool)>> {
    config.validate()?;

    Ok(discovery::corpus(config)?
        .into_iter()
        .map(|benchmark| {
            let cached = config.cache_path(&benchmark.id).exists();
            (benchmark, cached)
        })
        .collect())
}
