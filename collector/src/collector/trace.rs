//! Profiler trace parsing
//!
//! Converts one CSV log written by `nvprof --csv --print-gpu-trace` into
//! measurement records. A log looks like:
//!
//! ```text
//! ==4242== NVPROF is profiling process 4242, command: ./run
//! ==4242== Profiling application: ./run
//! ==4242== Profiling result:
//! "Start","Duration",...,"Name"
//! us,us,...,
//! 1.5,12.25,...,"Kernel(Node*, bool*, int)"
//! ```
//!
//! The banner is dropped, the units row below the column header is skipped,
//! and the header is glued back onto the data rows before handing the text
//! to the CSV reader.

use crate::error::{MeasureError, Result};
use kerntime_shared::types::record::{BenchmarkId, MeasurementRecord};
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;
use symbolic_common::Name;
use symbolic_demangle::{Demangle, DemangleOptions};
use tracing::debug;

/// Leading non-data lines written by the profiler
pub const BANNER_LINES: usize = 3;

/// Rows between the column header and the first data row (the units row)
const UNITS_ROWS: usize = 1;

/// Names of host-side runtime calls (memcpy, memset) start with this marker
pub const API_CALL_PREFIX: &str = "[CUDA";

const NAME_COLUMN: &str = "Name";
const DURATION_COLUMN: &str = "Duration";

/// Compiled-kernel wrapper: `ptxcall_<name>_<digits> ...`
static WRAPPER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^ptxcall_(.+)_\d+(?:\s.*)?$").expect("wrapper regex"));

/// Call-like signature: `<name>(...)`
static CALL_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^(]+)\(.*\)$").expect("call regex"));

/// Parse one trace file.
///
/// Returns `Ok(None)` when the trace holds no kernel rows, which is what
/// auxiliary processes spawned by the profiled run produce.
pub fn parse_trace(path: &Path, id: &BenchmarkId) -> Result<Option<Vec<MeasurementRecord>>> {
    let text = std::fs::read_to_string(path).map_err(|e| MeasureError::io(path, e))?;
    parse_trace_str(&text, path, id)
}

/// Parse trace text; `path` is only used for error reporting.
pub fn parse_trace_str(
    text: &str,
    path: &Path,
    id: &BenchmarkId,
) -> Result<Option<Vec<MeasurementRecord>>> {
    let lines: Vec<&str> = text.lines().collect();

    if lines.len() <= BANNER_LINES {
        return Err(MeasureError::malformed(
            path,
            format!(
                "expected {} banner lines and a column header, found {} lines",
                BANNER_LINES,
                lines.len()
            ),
        ));
    }
    if let Some(line) = lines[..BANNER_LINES].iter().find(|l| !l.starts_with("==")) {
        return Err(MeasureError::malformed(
            path,
            format!("unexpected banner line: {:?}", line),
        ));
    }

    let header = lines[BANNER_LINES];
    let data = lines
        .iter()
        .skip(BANNER_LINES + 1 + UNITS_ROWS)
        .filter(|l| !l.trim().is_empty() && !l.starts_with("=="));

    let mut table = String::from(header);
    table.push('\n');
    for line in data {
        table.push_str(line);
        table.push('\n');
    }

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(table.as_bytes());

    let rows = reader
        .records()
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|e| MeasureError::malformed(path, e.to_string()))?;

    if rows.is_empty() {
        debug!("{} carries no data rows", path.display());
        return Ok(None);
    }

    let headers = reader
        .headers()
        .map_err(|e| MeasureError::malformed(path, e.to_string()))?;
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| MeasureError::malformed(path, format!("missing {:?} column", name)))
    };
    let name_idx = column(NAME_COLUMN)?;
    let duration_idx = column(DURATION_COLUMN)?;

    let mut records = Vec::with_capacity(rows.len());
    for row in &rows {
        let name = row.get(name_idx).unwrap_or_default().trim();
        if name.starts_with(API_CALL_PREFIX) {
            continue;
        }

        let raw_duration = row.get(duration_idx).unwrap_or_default().trim();
        let duration: f64 = raw_duration.parse().map_err(|_| {
            MeasureError::malformed(path, format!("invalid duration {:?} for {}", raw_duration, name))
        })?;

        records.push(MeasurementRecord::new(
            id.suite.as_str(),
            id.benchmark.as_str(),
            canonicalize_kernel_name(name),
            duration,
        ));
    }

    if records.is_empty() {
        debug!("{} only carries runtime API rows", path.display());
        return Ok(None);
    }

    Ok(Some(records))
}

/// Reduce a profiler-reported kernel name to the name used in the source.
///
/// Mangled symbols are demangled first; then a `ptxcall_` wrapper is
/// unwrapped, or else a call-like signature is cut at its argument list.
/// Applying this to its own output returns the same name.
pub fn canonicalize_kernel_name(name: &str) -> String {
    let name = name.trim();
    let demangled = if name.starts_with("_Z") {
        Name::from(name)
            .try_demangle(DemangleOptions::name_only())
            .into_owned()
    } else {
        name.to_string()
    };

    if let Some(inner) = WRAPPER_REGEX.captures(&demangled).and_then(|c| c.get(1)) {
        return inner.as_str().trim().to_string();
    }

    if let Some(callee) = CALL_REGEX.captures(&demangled).and_then(|c| c.get(1)) {
        return callee.as_str().trim().to_string();
    }

    demangled
}
