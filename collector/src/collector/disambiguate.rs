//! Kernel name disambiguation
//!
//! Some benchmarks launch the same kernel several times with very different
//! amounts of work per launch. Pooling those launches under one name would
//! mix unrelated costs, so every launch of a listed kernel gets its own
//! identity: `<name>_<row index>`.

use kerntime_shared::types::record::MeasurementRecord;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// One entry of the ambiguous-kernel table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AmbiguousKernels {
    /// Benchmark identifier (matched in every suite)
    pub benchmark: String,

    /// Kernel names whose launches must not be pooled
    pub kernels: Vec<String>,
}

impl AmbiguousKernels {
    pub fn new(benchmark: impl Into<String>, kernels: &[&str]) -> Self {
        Self {
            benchmark: benchmark.into(),
            kernels: kernels.iter().map(|k| k.to_string()).collect(),
        }
    }

    /// Built-in table
    pub fn defaults() -> Vec<Self> {
        vec![Self::new("bfs", &["Kernel", "Kernel2"])]
    }
}

/// Lookup table from benchmark identifier to its ambiguous kernel names
#[derive(Debug, Clone, Default)]
pub struct Disambiguator {
    table: HashMap<String, HashSet<String>>,
}

impl Disambiguator {
    /// Create an empty disambiguator that leaves every record unchanged
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the lookup table. Entries for the same benchmark are merged.
    pub fn from_entries(entries: &[AmbiguousKernels]) -> Self {
        let mut table: HashMap<String, HashSet<String>> = HashMap::new();
        for entry in entries {
            table
                .entry(entry.benchmark.clone())
                .or_default()
                .extend(entry.kernels.iter().cloned());
        }
        Self { table }
    }

    /// Rename every record of a listed kernel to `<kernel>_<index>`, where
    /// `index` is the record's position within this run's record set.
    pub fn apply(&self, benchmark: &str, mut records: Vec<MeasurementRecord>) -> Vec<MeasurementRecord> {
        let Some(ambiguous) = self.table.get(benchmark) else {
            return records;
        };

        let mut renamed = 0usize;
        for (index, record) in records.iter_mut().enumerate() {
            if ambiguous.contains(&record.kernel) {
                record.kernel = format!("{}_{}", record.kernel, index);
                renamed += 1;
            }
        }

        debug!("Disambiguated {} launches of {}", renamed, benchmark);
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(names: &[&str]) -> Vec<MeasurementRecord> {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| MeasurementRecord::new("cuda", "bfs", *n, i as f64 + 1.0))
            .collect()
    }

    #[test]
    fn test_listed_kernels_get_row_index() {
        let disambiguator = Disambiguator::from_entries(&AmbiguousKernels::defaults());
        let out = disambiguator.apply("bfs", run(&["Kernel", "Kernel2", "Kernel", "Kernel2"]));

        let names: Vec<_> = out.iter().map(|r| r.kernel.as_str()).collect();
        assert_eq!(names, ["Kernel_0", "Kernel2_1", "Kernel_2", "Kernel2_3"]);
    }

    #[test]
    fn test_unlisted_kernels_are_untouched() {
        let disambiguator = Disambiguator::from_entries(&AmbiguousKernels::defaults());
        let input = run(&["Kernel", "memset_kernel", "Kernel"]);
        let out = disambiguator.apply("bfs", input.clone());

        assert_eq!(out[1], input[1]);
        assert_eq!(out[0].duration, input[0].duration);
        assert_eq!(out[0].kernel, "Kernel_0");
    }

    #[test]
    fn test_unlisted_benchmark_is_untouched() {
        let disambiguator = Disambiguator::from_entries(&AmbiguousKernels::defaults());
        let input = run(&["Kernel", "Kernel2"]);

        assert_eq!(disambiguator.apply("nw", input.clone()), input);
        assert_eq!(Disambiguator::new().apply("bfs", input.clone()), input);
    }

    #[test]
    fn test_entries_merge_per_benchmark() {
        let disambiguator = Disambiguator::from_entries(&[
            AmbiguousKernels::new("lud", &["lud_diagonal"]),
            AmbiguousKernels::new("lud", &["lud_perimeter"]),
        ]);

        let names: Vec<_> = disambiguator
            .apply("lud", run(&["lud_diagonal", "lud_internal", "lud_perimeter"]))
            .into_iter()
            .map(|r| r.kernel)
            .collect();

        assert_eq!(names, ["lud_diagonal_0", "lud_internal", "lud_perimeter_2"]);
        assert_eq!(disambiguator.apply("bfs", run(&["Kernel"]))[0].kernel, "Kernel");
    }
}
