//! Accuracy summary data structures
//!
//! Derived statistics over the repeated samples of one kernel. Summaries are
//! never persisted; they are recomputed from the records whenever needed.

use super::record::{KernelKey, Micros};
use serde::{Deserialize, Serialize};

/// Spread statistics for one (suite, benchmark, kernel) group
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracySummary {
    pub key: KernelKey,

    /// Number of samples in the group
    pub iterations: usize,

    /// Sample standard deviation of the durations
    pub abs_uncertainty: Micros,

    /// Minimum observed duration
    pub best: Micros,

    /// `abs_uncertainty / |best|`
    pub rel_uncertainty: f64,
}

impl AccuracySummary {
    /// Summarize the durations of one group.
    ///
    /// A single sample has zero spread. A zero spread is reported as zero
    /// relative uncertainty even when `best` is zero.
    pub fn from_durations(key: KernelKey, durations: &[Micros]) -> Self {
        let iterations = durations.len();
        let best = durations.iter().copied().fold(f64::INFINITY, f64::min);
        let best = if best.is_finite() { best } else { 0.0 };
        let abs_uncertainty = sample_std_dev(durations);

        let rel_uncertainty = if abs_uncertainty == 0.0 {
            0.0
        } else {
            abs_uncertainty / best.abs()
        };

        Self {
            key,
            iterations,
            abs_uncertainty,
            best,
            rel_uncertainty,
        }
    }
}

/// Sample (n - 1) standard deviation; zero for fewer than two samples.
///
/// Welford's running update, so identical samples give exactly zero.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }

    let mut mean = 0.0;
    let mut m2 = 0.0;
    for (i, &v) in values.iter().enumerate() {
        let delta = v - mean;
        mean += delta / (i + 1) as f64;
        m2 += delta * (v - mean);
    }
    (m2 / (n - 1) as f64).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key() -> KernelKey {
        KernelKey {
            suite: "cuda".to_string(),
            benchmark: "bfs".to_string(),
            kernel: "Kernel_0".to_string(),
        }
    }

    #[test]
    fn test_identical_samples_have_zero_uncertainty() {
        let summary = AccuracySummary::from_durations(key(), &[4.0, 4.0, 4.0]);

        assert_eq!(summary.iterations, 3);
        assert_eq!(summary.best, 4.0);
        assert_eq!(summary.abs_uncertainty, 0.0);
        assert_eq!(summary.rel_uncertainty, 0.0);
    }

    #[test]
    fn test_identical_inexact_samples_have_zero_uncertainty() {
        let summary = AccuracySummary::from_durations(key(), &[0.1, 0.1, 0.1]);

        assert_eq!(summary.best, 0.1);
        assert_eq!(summary.abs_uncertainty, 0.0);
        assert_eq!(summary.rel_uncertainty, 0.0);

        let durations = [12.345; 17];
        assert_eq!(sample_std_dev(&durations), 0.0);
    }

    #[test]
    fn test_single_sample() {
        let summary = AccuracySummary::from_durations(key(), &[7.5]);

        assert_eq!(summary.iterations, 1);
        assert_eq!(summary.best, 7.5);
        assert_eq!(summary.rel_uncertainty, 0.0);
    }

    #[test]
    fn test_spread_relative_to_best() {
        // mean 3, sample variance ((1 + 0 + 1) / 2) = 1
        let summary = AccuracySummary::from_durations(key(), &[2.0, 3.0, 4.0]);

        assert_eq!(summary.best, 2.0);
        assert!((summary.abs_uncertainty - 1.0).abs() < 1e-12);
        assert!((summary.rel_uncertainty - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_zero_best_with_spread_is_infinite() {
        let summary = AccuracySummary::from_durations(key(), &[0.0, 1.0]);
        assert!(summary.rel_uncertainty.is_infinite());
    }

    #[test]
    fn test_sample_std_dev_small_inputs() {
        assert_eq!(sample_std_dev(&[]), 0.0);
        assert_eq!(sample_std_dev(&[1.0]), 0.0);
    }
}
