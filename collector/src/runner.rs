//! Benchmark runner
//!
//! Runs the external profiler once against a benchmark executable and turns
//! the trace it leaves behind into measurement records. Each invocation is a
//! clean setup / execute / collect sequence: stale traces are removed first,
//! then the profiler runs in the benchmark directory, then every trace it
//! wrote is parsed.

use crate::collector::disambiguate::Disambiguator;
use crate::collector::trace::parse_trace_str;
use crate::config::{Config, ProfilerConfig};
use crate::error::{MeasureError, Result};
use async_trait::async_trait;
use kerntime_shared::types::record::{Benchmark, MeasurementRecord};
use std::path::{Path, PathBuf};
use std::process::{Output, Stdio};
use tokio::process::Command;
use tracing::{debug, info};

/// Produces one sample set per call.
///
/// Implementations must not retry: a failure is reported to the caller and
/// aborts the corpus run.
#[async_trait]
pub trait BenchmarkRunner: Send + Sync {
    /// Profile `benchmark` once
    async fn run(&self, benchmark: &Benchmark) -> Result<Vec<MeasurementRecord>>;
}

/// Flags that make nvprof write a per-process CSV GPU trace in microseconds,
/// starting at the application's explicit profiler start marker.
const PROFILER_FLAGS: &[&str] = &[
    "--profile-from-start",
    "off",
    "--profile-child-processes",
    "--unified-memory-profiling",
    "off",
    "--print-gpu-trace",
    "--normalized-time-unit",
    "us",
    "--csv",
];

/// Runs benchmarks under nvprof
#[derive(Debug, Clone)]
pub struct NvprofRunner {
    profiler: ProfilerConfig,
    disambiguator: Disambiguator,
}

impl NvprofRunner {
    pub fn new(profiler: ProfilerConfig, disambiguator: Disambiguator) -> Self {
        Self {
            profiler,
            disambiguator,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.profiler.clone(), config.disambiguator())
    }

    /// Build the profiler command for one benchmark
    pub fn build_command(&self, benchmark: &Benchmark) -> Command {
        let mut cmd = Command::new(&self.profiler.command);
        cmd.args(&self.profiler.extra_args)
            .args(PROFILER_FLAGS)
            .arg("--log-file")
            .arg(format!("{}%p.log", self.profiler.log_prefix))
            .arg(format!("./{}", self.profiler.artifact))
            .current_dir(benchmark.dir())
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    /// Trace files currently present in `dir`, sorted by path
    pub fn find_traces(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        let pattern = format!(
            "{}/{}*.log",
            glob::Pattern::escape(&dir.to_string_lossy()),
            glob::Pattern::escape(&self.profiler.log_prefix)
        );

        let paths = glob::glob(&pattern)
            .map_err(|e| MeasureError::InvalidConfig(format!("bad trace pattern {:?}: {}", pattern, e)))?;

        let mut traces = Vec::new();
        for entry in paths {
            let path = entry.map_err(|e| {
                let path = e.path().to_path_buf();
                MeasureError::io(path, std::io::Error::from(e))
            })?;
            if path.is_file() {
                traces.push(path);
            }
        }
        traces.sort();
        Ok(traces)
    }

    /// Delete traces left behind by an earlier invocation
    pub async fn remove_stale_traces(&self, dir: &Path) -> Result<usize> {
        let stale = self.find_traces(dir)?;
        for path in &stale {
            tokio::fs::remove_file(path)
                .await
                .map_err(|e| MeasureError::io(path, e))?;
            debug!("Removed stale trace {}", path.display());
        }
        Ok(stale.len())
    }

    /// Parse one trace and disambiguate its records
    async fn read_trace(
        &self,
        path: &Path,
        benchmark: &Benchmark,
    ) -> Result<Option<Vec<MeasurementRecord>>> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| MeasureError::io(path, e))?;
        let records = parse_trace_str(&text, path, &benchmark.id)?;
        Ok(records.map(|r| self.disambiguator.apply(benchmark.name(), r)))
    }
}

#[async_trait]
impl BenchmarkRunner for NvprofRunner {
    async fn run(&self, benchmark: &Benchmark) -> Result<Vec<MeasurementRecord>> {
        let dir = benchmark.dir();

        // 1. Setup
        self.remove_stale_traces(dir).await?;

        // 2. Execute
        debug!("Running {} in {}", self.profiler.command, dir.display());
        let output = self
            .build_command(benchmark)
            .output()
            .await
            .map_err(|e| MeasureError::io(&self.profiler.command, e))?;
        let captured = combined_output(&output);

        // 3. Collect
        let traces = self.find_traces(dir)?;
        let mut parsed = Vec::with_capacity(traces.len());
        for path in traces {
            let result = self.read_trace(&path, benchmark).await;
            parsed.push((path, result));
        }

        if !output.status.success() {
            return Err(MeasureError::ProfilerFailed {
                benchmark: benchmark.id.to_string(),
                status: output.status,
                output: captured,
            });
        }

        let mut data_bearing = Vec::new();
        for (path, result) in parsed {
            match result? {
                Some(records) => data_bearing.push((path, records)),
                None => debug!("{} carries no kernel records", path.display()),
            }
        }

        match data_bearing.len() {
            0 => Err(MeasureError::NoTraceData {
                benchmark: benchmark.id.to_string(),
                output: captured,
            }),
            1 => {
                let (path, records) = data_bearing.remove(0);
                info!(
                    "{}: {} kernel records from {}",
                    benchmark.id,
                    records.len(),
                    path.display()
                );
                Ok(records)
            }
            _ => Err(MeasureError::AmbiguousTraces {
                benchmark: benchmark.id.to_string(),
                files: data_bearing.into_iter().map(|(path, _)| path).collect(),
            }),
        }
    }
}

/// stdout followed by stderr, lossily decoded
fn combined_output(output: &Output) -> String {
    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !text.is_empty() && !stderr.is_empty() && !text.ends_with('\n') {
        text.push('\n');
    }
    text.push_str(&stderr);
    text
}
