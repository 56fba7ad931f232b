//! Configuration types for a measurement run
//!
//! A [`Config`] is assembled once at start-up from built-in defaults, an
//! optional TOML file and `KERNTIME_*` environment variables, then handed to
//! the orchestrator and never modified.

use crate::accuracy::AccuracyCriteria;
use crate::collector::disambiguate::{AmbiguousKernels, Disambiguator};
use crate::error::{MeasureError, Result};
use kerntime_shared::types::record::BenchmarkId;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File looked up in the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "kerntime.toml";

/// Prefix of environment overrides, e.g. `KERNTIME_MIN_ITERATIONS=5`
pub const ENV_PREFIX: &str = "KERNTIME";

/// Measurement run configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Common root; suite `s` lives in `root/s`
    pub root: PathBuf,

    /// Suites whose common benchmarks are measured
    pub suites: Vec<String>,

    /// Final dataset path
    pub output: PathBuf,

    /// Cache file name inside each benchmark directory
    pub cache_file: String,

    /// Minimum samples per kernel before a benchmark counts as accurate
    pub min_iterations: usize,

    /// Profiler invocations per benchmark before giving up on accuracy
    pub max_iterations: usize,

    /// Relative uncertainty every kernel must stay strictly below
    pub max_rel_uncertainty: f64,

    /// Wall-clock budget per benchmark, measured from the first invocation
    #[serde(with = "duration_str")]
    pub max_duration: Duration,

    /// Profiler invocation settings
    pub profiler: ProfilerConfig,

    /// Ambiguous-kernel table
    pub disambiguate: Vec<AmbiguousKernels>,
}

/// How the external profiler is invoked
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Profiler executable
    pub command: String,

    /// Executable name inside each benchmark directory
    pub artifact: String,

    /// Trace files are written as `<log_prefix><pid>.log`
    pub log_prefix: String,

    /// Extra arguments placed right after the profiler command
    pub extra_args: Vec<String>,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            command: "nvprof".to_string(),
            artifact: "run".to_string(),
            log_prefix: "nvprof_".to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            suites: Vec::new(),
            output: PathBuf::from("kernel_times.csv"),
            cache_file: "measurements.csv".to_string(),
            min_iterations: 10,
            max_iterations: 100,
            max_rel_uncertainty: 0.01,
            max_duration: Duration::from_secs(10 * 60),
            profiler: ProfilerConfig::default(),
            disambiguate: AmbiguousKernels::defaults(),
        }
    }
}

impl Config {
    /// Load defaults, then `path` (or `kerntime.toml` if present), then the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, environment())
    }

    fn load_with_env(path: Option<&Path>, env: config::Environment) -> Result<Self> {
        let file = match path {
            Some(p) => config::File::from(p).required(true),
            None => config::File::from(Path::new(DEFAULT_CONFIG_FILE)).required(false),
        };

        let settings = config::Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Directory of one suite
    pub fn suite_dir(&self, suite: &str) -> PathBuf {
        self.root.join(suite)
    }

    /// Working directory of one benchmark
    pub fn benchmark_dir(&self, id: &BenchmarkId) -> PathBuf {
        self.suite_dir(&id.suite).join(&id.benchmark)
    }

    /// Cache file of one benchmark
    pub fn cache_path(&self, id: &BenchmarkId) -> PathBuf {
        self.benchmark_dir(id).join(&self.cache_file)
    }

    /// Stopping criteria for the accuracy evaluator
    pub fn accuracy_criteria(&self) -> AccuracyCriteria {
        AccuracyCriteria {
            min_iterations: self.min_iterations,
            max_rel_uncertainty: self.max_rel_uncertainty,
        }
    }

    /// Disambiguator built from the ambiguous-kernel table
    pub fn disambiguator(&self) -> Disambiguator {
        Disambiguator::from_entries(&self.disambiguate)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.suites.is_empty() {
            return Err(invalid("At least one suite must be configured"));
        }

        if self.min_iterations == 0 {
            return Err(invalid("min_iterations must be greater than 0"));
        }

        if self.max_iterations < self.min_iterations {
            return Err(invalid(format!(
                "max_iterations ({}) must not be below min_iterations ({})",
                self.max_iterations, self.min_iterations
            )));
        }

        if !self.max_rel_uncertainty.is_finite() || self.max_rel_uncertainty <= 0.0 {
            return Err(invalid("max_rel_uncertainty must be a positive number"));
        }

        if self.cache_file.trim().is_empty() {
            return Err(invalid("cache_file must not be empty"));
        }

        let profiler = &self.profiler;
        if profiler.command.trim().is_empty()
            || profiler.artifact.trim().is_empty()
            || profiler.log_prefix.trim().is_empty()
        {
            return Err(invalid(
                "profiler command, artifact and log_prefix must not be empty",
            ));
        }

        Ok(())
    }
}

/// `KERNTIME_*` overrides; `__` nests, list keys split on commas
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
        .list_separator(",")
        .with_list_parse_key("suites")
        .with_list_parse_key("profiler.extra_args")
}

fn invalid(msg: impl Into<String>) -> MeasureError {
    MeasureError::InvalidConfig(msg.into())
}

/// `Duration` as a human string ("90s", "10m"); plain integers are seconds
mod duration_str {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Secs(u64),
        Text(String),
    }

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        if d.subsec_millis() == 0 {
            s.serialize_str(&format!("{}s", d.as_secs()))
        } else {
            s.serialize_str(&format!("{}ms", d.as_millis()))
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        match Raw::deserialize(d)? {
            Raw::Secs(secs) => Ok(Duration::from_secs(secs)),
            Raw::Text(text) => kerntime_shared::utils::parse_duration(&text)
                .map_err(|e| serde::de::Error::custom(format!("invalid duration {:?}: {}", text, e))),
        }
    }
}
