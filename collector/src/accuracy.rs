//! Accuracy evaluation
//!
//! Groups accumulated records per (suite, benchmark, kernel) and decides
//! whether the sample set is precise enough to stop profiling.

use kerntime_shared::types::record::{KernelKey, MeasurementRecord};
use kerntime_shared::types::summary::AccuracySummary;
use std::collections::BTreeMap;

/// Stopping thresholds
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AccuracyCriteria {
    /// Every kernel needs at least this many samples
    pub min_iterations: usize,

    /// Every kernel's relative uncertainty must be strictly below this
    pub max_rel_uncertainty: f64,
}

impl AccuracyCriteria {
    /// Whether one group meets both thresholds
    pub fn is_met_by(&self, summary: &AccuracySummary) -> bool {
        summary.iterations >= self.min_iterations
            && summary.rel_uncertainty < self.max_rel_uncertainty
    }
}

/// Summaries of every kernel in `records`, sorted by key
pub fn summarize(records: &[MeasurementRecord]) -> Vec<AccuracySummary> {
    let mut groups: BTreeMap<KernelKey, Vec<f64>> = BTreeMap::new();
    for record in records {
        groups
            .entry(record.kernel_key())
            .or_default()
            .push(record.duration);
    }

    groups
        .into_iter()
        .map(|(key, durations)| AccuracySummary::from_durations(key, &durations))
        .collect()
}

/// Outcome of evaluating one sample set
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub summaries: Vec<AccuracySummary>,
    pub accurate: bool,
}

impl Evaluation {
    /// Group with the highest relative uncertainty, if any
    pub fn worst(&self) -> Option<&AccuracySummary> {
        self.summaries
            .iter()
            .max_by(|a, b| a.rel_uncertainty.total_cmp(&b.rel_uncertainty))
    }

    /// Smallest sample count over all groups
    pub fn min_iterations(&self) -> usize {
        self.summaries.iter().map(|s| s.iterations).min().unwrap_or(0)
    }
}

/// Evaluate `records` against `criteria`.
///
/// The set is accurate only if every group satisfies both thresholds.
pub fn evaluate(records: &[MeasurementRecord], criteria: &AccuracyCriteria) -> Evaluation {
    let summaries = summarize(records);
    let accurate = summaries.iter().all(|s| criteria.is_met_by(s));
    Evaluation {
        summaries,
        accurate,
    }
}

/// Shorthand for `evaluate(..).accurate`
pub fn is_accurate(records: &[MeasurementRecord], criteria: &AccuracyCriteria) -> bool {
    evaluate(records, criteria).accurate
}
