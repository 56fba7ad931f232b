//! Measurement orchestration
//!
//! Drives a [`BenchmarkRunner`] over every benchmark common to the configured
//! suites. Per benchmark:
//!
//! - a cache entry, if present, is loaded and trusted as-is;
//! - otherwise the runner is invoked repeatedly, one invocation at a time,
//!   until the accumulated samples are accurate or the iteration or time
//!   budget runs out, and the samples become the new cache entry.
//!
//! All record sets are then concatenated into the final dataset. Any runner
//! error aborts the whole run before the dataset is written.

use crate::accuracy::{evaluate, AccuracyCriteria};
use crate::config::Config;
use crate::discovery::corpus;
use crate::error::{MeasureError, Result};
use crate::output::csv::{read_records, write_records};
use crate::runner::BenchmarkRunner;
use kerntime_shared::types::record::{Benchmark, BenchmarkId, MeasurementRecord};
use kerntime_shared::utils::format_duration;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Why a benchmark's measurement finished
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// Loaded from an existing cache entry
    Cached,
    /// Every kernel met the accuracy criteria
    Accurate,
    /// `max_iterations` invocations were performed
    IterationBudget,
    /// `max_duration` elapsed since the first invocation
    TimeBudget,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StopReason::Cached => "cached",
            StopReason::Accurate => "accurate",
            StopReason::IterationBudget => "iteration budget",
            StopReason::TimeBudget => "time budget",
        };
        f.write_str(s)
    }
}

/// Measurement result of one benchmark
#[derive(Debug, Clone)]
pub struct BenchmarkOutcome {
    pub id: BenchmarkId,
    pub stop: StopReason,
    /// Profiler invocations performed in this run (0 when cached)
    pub invocations: usize,
    pub records: Vec<MeasurementRecord>,
    pub elapsed: Duration,
}

/// Per-benchmark line of a [`RunReport`]
#[derive(Debug, Clone, PartialEq)]
pub struct BenchmarkReport {
    pub id: BenchmarkId,
    pub stop: StopReason,
    pub invocations: usize,
    pub records: usize,
    pub elapsed: Duration,
}

/// Summary of a completed corpus run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    pub benchmarks: Vec<BenchmarkReport>,
    pub total_records: usize,
    pub output: PathBuf,
}

impl RunReport {
    /// Number of benchmarks served from cache
    pub fn cached(&self) -> usize {
        self.benchmarks
            .iter()
            .filter(|b| b.stop == StopReason::Cached)
            .count()
    }

    /// Total profiler invocations across all benchmarks
    pub fn invocations(&self) -> usize {
        self.benchmarks.iter().map(|b| b.invocations).sum()
    }
}

/// Sequential measurement driver
pub struct Orchestrator<R> {
    config: Config,
    runner: R,
}

impl<R: BenchmarkRunner> Orchestrator<R> {
    /// Validate `config` and bind it to `runner`
    pub fn new(config: Config, runner: R) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Benchmarks to measure, suite by suite
    pub fn benchmarks(&self) -> Result<Vec<Benchmark>> {
        corpus(&self.config)
    }

    /// Measure the whole corpus and write the final dataset
    pub async fn run(&self) -> Result<RunReport> {
        let benchmarks = self.benchmarks()?;

        let mut dataset = Vec::new();
        let mut reports = Vec::with_capacity(benchmarks.len());
        for benchmark in &benchmarks {
            let outcome = self.measure_benchmark(benchmark).await?;
            reports.push(BenchmarkReport {
                id: outcome.id,
                stop: outcome.stop,
                invocations: outcome.invocations,
                records: outcome.records.len(),
                elapsed: outcome.elapsed,
            });
            dataset.extend(outcome.records);
        }

        let output = &self.config.output;
        if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| MeasureError::io(parent, e))?;
        }
        write_records(&dataset, output)?;

        Ok(RunReport {
            benchmarks: reports,
            total_records: dataset.len(),
            output: output.clone(),
        })
    }

    /// Load the cache entry of `benchmark`, or measure it and write one
    pub async fn measure_benchmark(&self, benchmark: &Benchmark) -> Result<BenchmarkOutcome> {
        let cache_path = self.config.cache_path(&benchmark.id);

        if cache_path.exists() {
            let records = read_records(&cache_path)?;
            info!(
                "{}: using {} cached records from {}",
                benchmark.id,
                records.len(),
                cache_path.display()
            );
            return Ok(BenchmarkOutcome {
                id: benchmark.id.clone(),
                stop: StopReason::Cached,
                invocations: 0,
                records,
                elapsed: Duration::ZERO,
            });
        }

        let outcome = self.accumulate(benchmark).await?;
        write_records(&outcome.records, &cache_path)?;
        Ok(outcome)
    }

    /// Invoke the runner until the samples are accurate or a budget is spent
    pub async fn accumulate(&self, benchmark: &Benchmark) -> Result<BenchmarkOutcome> {
        let criteria: AccuracyCriteria = self.config.accuracy_criteria();
        let start = Instant::now();

        info!("{}: profiling (iteration 1)", benchmark.id);
        let mut records = self.runner.run(benchmark).await?;
        let mut invocations = 1;

        let stop = loop {
            let evaluation = evaluate(&records, &criteria);
            if let Some(worst) = evaluation.worst() {
                debug!(
                    "{}: {} kernels, worst {} at {:.4} relative uncertainty, fewest samples {}",
                    benchmark.id,
                    evaluation.summaries.len(),
                    worst.key.kernel,
                    worst.rel_uncertainty,
                    evaluation.min_iterations()
                );
            }

            if evaluation.accurate {
                break StopReason::Accurate;
            }
            if invocations >= self.config.max_iterations {
                break StopReason::IterationBudget;
            }
            if start.elapsed() >= self.config.max_duration {
                break StopReason::TimeBudget;
            }

            invocations += 1;
            info!(
                "{}: profiling (iteration {}, {} elapsed)",
                benchmark.id,
                invocations,
                format_duration(start.elapsed())
            );
            records.extend(self.runner.run(benchmark).await?);
        };

        let elapsed = start.elapsed();
        info!(
            "{}: done after {} invocations in {} ({})",
            benchmark.id,
            invocations,
            format_duration(elapsed),
            stop
        );

        Ok(BenchmarkOutcome {
            id: benchmark.id.clone(),
            stop,
            invocations,
            records,
            elapsed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    type Script = dyn Fn(&Benchmark, usize) -> Vec<MeasurementRecord> + Send + Sync;

    /// Runner returning scripted records and counting its invocations
    #[derive(Clone)]
    struct ScriptedRunner {
        calls: Arc<AtomicUsize>,
        script: Arc<Script>,
    }

    impl ScriptedRunner {
        fn new(script: impl Fn(&Benchmark, usize) -> Vec<MeasurementRecord> + Send + Sync + 'static) -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                script: Arc::new(script),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl BenchmarkRunner for ScriptedRunner {
        async fn run(&self, benchmark: &Benchmark) -> Result<Vec<MeasurementRecord>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            Ok((self.script)(benchmark, n))
        }
    }

    fn steady(benchmark: &Benchmark, _call: usize) -> Vec<MeasurementRecord> {
        vec![MeasurementRecord::new(
            benchmark.suite(),
            benchmark.name(),
            "k",
            10.0,
        )]
    }

    fn noisy(benchmark: &Benchmark, call: usize) -> Vec<MeasurementRecord> {
        let duration = if call % 2 == 0 { 1.0 } else { 100.0 };
        vec![MeasurementRecord::new(
            benchmark.suite(),
            benchmark.name(),
            "k",
            duration,
        )]
    }

    fn corpus(root: &Path, suites: &[&str], benchmarks: &[&str]) {
        for suite in suites {
            for name in benchmarks {
                let dir = root.join(suite).join(name);
                std::fs::create_dir_all(&dir).unwrap();
                std::fs::write(dir.join("run"), "").unwrap();
            }
        }
    }

    fn config(root: &Path, suites: &[&str], min: usize, max: usize) -> Config {
        Config {
            root: root.to_path_buf(),
            suites: suites.iter().map(|s| s.to_string()).collect(),
            output: root.join("kernel_times.csv"),
            min_iterations: min,
            max_iterations: max,
            max_rel_uncertainty: 0.01,
            max_duration: Duration::from_secs(3600),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn test_stops_when_accuracy_reached() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw"]);

        let runner = ScriptedRunner::new(steady);
        let orchestrator = Orchestrator::new(config(tmp.path(), &["cuda"], 3, 5), runner.clone()).unwrap();
        let report = orchestrator.run().await.unwrap();

        assert_eq!(runner.calls(), 3);
        assert_eq!(report.benchmarks[0].stop, StopReason::Accurate);
        assert_eq!(report.benchmarks[0].invocations, 3);
        assert_eq!(report.total_records, 3);
    }

    #[tokio::test]
    async fn test_stops_at_iteration_budget() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw"]);

        let runner = ScriptedRunner::new(noisy);
        let orchestrator = Orchestrator::new(config(tmp.path(), &["cuda"], 3, 5), runner.clone()).unwrap();
        let report = orchestrator.run().await.unwrap();

        assert_eq!(runner.calls(), 5);
        assert_eq!(report.benchmarks[0].stop, StopReason::IterationBudget);
        assert_eq!(read_records(&tmp.path().join("kernel_times.csv")).unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_stops_at_time_budget() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw"]);

        let runner = ScriptedRunner::new(noisy);
        let cfg = Config {
            max_duration: Duration::ZERO,
            ..config(tmp.path(), &["cuda"], 3, 5)
        };
        let orchestrator = Orchestrator::new(cfg, runner.clone()).unwrap();
        let report = orchestrator.run().await.unwrap();

        assert_eq!(runner.calls(), 1);
        assert_eq!(report.benchmarks[0].stop, StopReason::TimeBudget);
    }

    #[tokio::test]
    async fn test_cache_short_circuits_runner() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw", "bfs"]);

        // These two samples fail the criteria; the cache is used anyway.
        let cached = vec![
            MeasurementRecord::new("cuda", "bfs", "Kernel_0", 1.0),
            MeasurementRecord::new("cuda", "bfs", "Kernel_0", 50.0),
        ];
        write_records(&cached, &tmp.path().join("cuda/bfs/measurements.csv")).unwrap();

        let runner = ScriptedRunner::new(|b: &Benchmark, n: usize| {
            assert_eq!(b.name(), "nw", "runner invoked for cached benchmark");
            steady(b, n)
        });
        let orchestrator = Orchestrator::new(config(tmp.path(), &["cuda"], 1, 5), runner.clone()).unwrap();
        let report = orchestrator.run().await.unwrap();

        assert_eq!(runner.calls(), 1);
        assert_eq!(report.cached(), 1);
        let bfs = report.benchmarks.iter().find(|b| b.id.benchmark == "bfs").unwrap();
        assert_eq!(bfs.stop, StopReason::Cached);
        assert_eq!(bfs.invocations, 0);

        let dataset = read_records(&tmp.path().join("kernel_times.csv")).unwrap();
        assert_eq!(&dataset[..2], &cached[..]);
    }

    #[tokio::test]
    async fn test_fresh_measurement_is_cached() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw"]);

        let runner = ScriptedRunner::new(steady);
        let orchestrator = Orchestrator::new(config(tmp.path(), &["cuda"], 2, 5), runner.clone()).unwrap();
        orchestrator.run().await.unwrap();
        orchestrator.run().await.unwrap();

        assert_eq!(runner.calls(), 2);
        let cache = read_records(&tmp.path().join("cuda/nw/measurements.csv")).unwrap();
        assert_eq!(cache.len(), 2);
    }

    #[tokio::test]
    async fn test_dataset_order_is_suite_then_benchmark() {
        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["julia", "cuda"], &["nw", "bfs"]);

        let runner = ScriptedRunner::new(steady);
        let orchestrator =
            Orchestrator::new(config(tmp.path(), &["julia", "cuda"], 1, 1), runner).unwrap();
        let report = orchestrator.run().await.unwrap();

        let order: Vec<_> = report.benchmarks.iter().map(|b| b.id.to_string()).collect();
        assert_eq!(order, ["julia/bfs", "julia/nw", "cuda/bfs", "cuda/nw"]);
    }

    #[tokio::test]
    async fn test_runner_error_aborts_without_dataset() {
        struct Failing;

        #[async_trait]
        impl BenchmarkRunner for Failing {
            async fn run(&self, benchmark: &Benchmark) -> Result<Vec<MeasurementRecord>> {
                Err(MeasureError::NoTraceData {
                    benchmark: benchmark.id.to_string(),
                    output: String::new(),
                })
            }
        }

        let tmp = tempfile::tempdir().unwrap();
        corpus(tmp.path(), &["cuda"], &["nw"]);

        let orchestrator = Orchestrator::new(config(tmp.path(), &["cuda"], 1, 5), Failing).unwrap();
        let err = orchestrator.run().await.unwrap_err();

        assert!(matches!(err, MeasureError::NoTraceData { .. }));
        assert!(!tmp.path().join("kernel_times.csv").exists());
        assert!(!tmp.path().join("cuda/nw/measurements.csv").exists());
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let tmp = tempfile::tempdir().unwrap();
        let result = Orchestrator::new(config(tmp.path(), &[], 1, 5), ScriptedRunner::new(steady));
        assert!(matches!(result, Err(MeasureError::InvalidConfig(_))));
    }
}
