//! Measurement record definitions
//!
//! A [`MeasurementRecord`] is one profiled kernel invocation. Records are the
//! rows of both the per-benchmark cache files and the final dataset, so the
//! serialized field names double as the CSV column names.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Duration of a kernel invocation in microseconds
pub type Micros = f64;

/// One profiled kernel invocation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    /// Suite the benchmark implementation belongs to
    pub suite: String,

    /// Benchmark identifier, shared across suites
    pub benchmark: String,

    /// Canonicalized (and possibly disambiguated) kernel name
    pub kernel: String,

    /// Kernel duration in microseconds
    #[serde(rename = "time")]
    pub duration: Micros,
}

impl MeasurementRecord {
    /// Create a new record
    pub fn new(
        suite: impl Into<String>,
        benchmark: impl Into<String>,
        kernel: impl Into<String>,
        duration: Micros,
    ) -> Self {
        Self {
            suite: suite.into(),
            benchmark: benchmark.into(),
            kernel: kernel.into(),
            duration,
        }
    }

    /// Aggregation key of this record
    pub fn kernel_key(&self) -> KernelKey {
        KernelKey {
            suite: self.suite.clone(),
            benchmark: self.benchmark.clone(),
            kernel: self.kernel.clone(),
        }
    }
}

/// (suite, benchmark) pair
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BenchmarkId {
    pub suite: String,
    pub benchmark: String,
}

impl BenchmarkId {
    pub fn new(suite: impl Into<String>, benchmark: impl Into<String>) -> Self {
        Self {
            suite: suite.into(),
            benchmark: benchmark.into(),
        }
    }
}

impl fmt::Display for BenchmarkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.suite, self.benchmark)
    }
}

/// A benchmark resolved to its working directory on disk
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Benchmark {
    pub id: BenchmarkId,

    /// Directory holding the benchmark's executable artifact
    pub dir: PathBuf,
}

impl Benchmark {
    pub fn new(id: BenchmarkId, dir: impl Into<PathBuf>) -> Self {
        Self {
            id,
            dir: dir.into(),
        }
    }

    pub fn suite(&self) -> &str {
        &self.id.suite
    }

    pub fn name(&self) -> &str {
        &self.id.benchmark
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// (suite, benchmark, kernel) aggregation key
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct KernelKey {
    pub suite: String,
    pub benchmark: String,
    pub kernel: String,
}

impl fmt::Display for KernelKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.suite, self.benchmark, self.kernel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_serializes_duration_as_time() {
        let record = MeasurementRecord::new("cuda", "bfs", "Kernel_0", 12.5);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["time"], 12.5);
        assert!(json.get("duration").is_none());
    }

    #[test]
    fn test_kernel_key() {
        let record = MeasurementRecord::new("julia", "bfs", "Kernel2", 3.0);
        let key = record.kernel_key();

        assert_eq!(key.to_string(), "julia/bfs:Kernel2");
        assert_eq!(key.kernel, "Kernel2");
    }

    #[test]
    fn test_benchmark_id_ordering() {
        let mut ids = vec![
            BenchmarkId::new("julia", "nw"),
            BenchmarkId::new("cuda", "nw"),
            BenchmarkId::new("cuda", "bfs"),
        ];
        ids.sort();

        assert_eq!(ids[0].to_string(), "cuda/bfs");
        assert_eq!(ids[2].to_string(), "julia/nw");
    }
}
