//! Error taxonomy for the measurement pipeline
//!
//! Every variant is fatal for a corpus run. An empty trace is not an error;
//! the parser reports it as `None`.

use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MeasureError>;

#[derive(Debug, Error)]
pub enum MeasureError {
    /// The profiler exited unsuccessfully
    #[error("profiler failed for {benchmark} ({status}):\n{output}")]
    ProfilerFailed {
        benchmark: String,
        status: ExitStatus,
        output: String,
    },

    /// The profiler succeeded but no trace file carried kernel records
    #[error("profiling {benchmark} produced no kernel records:\n{output}")]
    NoTraceData { benchmark: String, output: String },

    /// More than one trace file from a single invocation carried records
    #[error("profiling {benchmark} produced {} data-bearing traces: {files:?}", files.len())]
    AmbiguousTraces {
        benchmark: String,
        files: Vec<PathBuf>,
    },

    /// A trace file did not have the expected structure
    #[error("malformed trace {}: {reason}", path.display())]
    MalformedTrace { path: PathBuf, reason: String },

    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl MeasureError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::MalformedTrace {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
