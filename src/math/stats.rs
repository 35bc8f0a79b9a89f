//! Distribution summaries over per-trial metric arrays.
//!
//! Implemented statistics:
//! - nearest-rank percentiles over a sorted ascending sample (no
//!   interpolation),
//! - mean and Bessel-corrected sample variance / standard deviation,
//! - skewness and excess kurtosis as standardized third/fourth moments,
//! - normal-approximation confidence bands `[mean +/- k stddev]`.
//!
//! Numerical notes: the confidence bands understate risk for the skewed
//! distributions this domain produces; percentile bands are the more accurate
//! reporting choice and both are returned. Every assembled distribution is
//! finiteness-checked after computation; a non-finite mean or deviation is an
//! upstream defect and surfaces as `NonConvergentResult`, never as a silent
//! NaN in a report.

use serde::{Deserialize, Serialize};

use crate::core::error::{SimError, SimResult};
use crate::core::validate::require_finite_result;

/// Dispersion below this is treated as degenerate when standardizing moments.
pub const MIN_DISPERSION: f64 = 1.0e-12;

/// Arithmetic mean. Callers guarantee a non-empty sample.
#[inline]
pub fn mean_of(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

/// Bessel-corrected sample variance; requires at least two observations.
pub fn sample_variance(values: &[f64]) -> SimResult<f64> {
    if values.len() < 2 {
        return Err(SimError::InsufficientSamples {
            required: 2,
            actual: values.len(),
        });
    }
    let mean = mean_of(values);
    let sum_sq = values.iter().map(|x| (x - mean) * (x - mean)).sum::<f64>();
    Ok(sum_sq / (values.len() - 1) as f64)
}

/// Square root of the Bessel-corrected sample variance.
pub fn sample_std_dev(values: &[f64]) -> SimResult<f64> {
    sample_variance(values).map(f64::sqrt)
}

/// Nearest-rank percentile on a sorted ascending sample:
/// `index = floor((p / 100) * (n - 1))`.
#[inline]
pub fn percentile(sorted: &[f64], p: f64) -> f64 {
    debug_assert!(!sorted.is_empty(), "percentile over empty sample");
    debug_assert!((0.0..=100.0).contains(&p), "percentile p out of [0, 100]");
    let index = ((p / 100.0) * (sorted.len() as f64 - 1.0)).floor() as usize;
    sorted[index.min(sorted.len() - 1)]
}

/// Standardized third and fourth moments `(skewness, excess kurtosis)`.
///
/// Returns `(0, 0)` when dispersion is degenerate rather than dividing by a
/// vanishing standard deviation.
pub fn standardized_moments(values: &[f64], mean: f64, std_dev: f64) -> (f64, f64) {
    if std_dev <= MIN_DISPERSION {
        return (0.0, 0.0);
    }
    let n = values.len() as f64;
    let mut m3 = 0.0;
    let mut m4 = 0.0;
    for &x in values {
        let z = (x - mean) / std_dev;
        let z2 = z * z;
        m3 += z2 * z;
        m4 += z2 * z2;
    }
    (m3 / n, m4 / n - 3.0)
}

/// Reporting percentiles of one metric's trial distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Moment summary of one metric's trial distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SummaryStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub min: f64,
    pub max: f64,
    pub skewness: f64,
    pub excess_kurtosis: f64,
}

/// Symmetric normal-approximation band around the mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

/// The one- and two-sigma bands.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceIntervals {
    pub ci68: ConfidenceInterval,
    pub ci95: ConfidenceInterval,
}

/// Full summary of one metric across all trials of a run.
///
/// `sorted_values` retains the raw per-trial sample (ascending) so downstream
/// consumers can re-slice the distribution instead of working from the
/// summary alone. Percentiles are monotonically non-decreasing by
/// construction over the sorted array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceDistribution {
    pub sorted_values: Vec<f64>,
    pub percentiles: Percentiles,
    pub statistics: SummaryStatistics,
    pub confidence_intervals: ConfidenceIntervals,
}

impl PerformanceDistribution {
    /// Sorts the sample and computes the full summary.
    ///
    /// Post-condition: mean and standard deviation are finite, otherwise
    /// `NonConvergentResult` (an upstream defect, not an input error).
    pub fn from_values(mut values: Vec<f64>) -> SimResult<Self> {
        if values.len() < 2 {
            return Err(SimError::InsufficientSamples {
                required: 2,
                actual: values.len(),
            });
        }
        values.sort_by(|a, b| a.total_cmp(b));

        let mean = mean_of(&values);
        let std_dev = sample_std_dev(&values)?;
        let mean = require_finite_result("mean", mean)?;
        let std_dev = require_finite_result("std_dev", std_dev)?;
        let (skewness, excess_kurtosis) = standardized_moments(&values, mean, std_dev);

        Ok(Self {
            percentiles: Percentiles {
                p5: percentile(&values, 5.0),
                p25: percentile(&values, 25.0),
                p50: percentile(&values, 50.0),
                p75: percentile(&values, 75.0),
                p95: percentile(&values, 95.0),
            },
            statistics: SummaryStatistics {
                mean,
                std_dev,
                min: values[0],
                max: values[values.len() - 1],
                skewness,
                excess_kurtosis,
            },
            confidence_intervals: ConfidenceIntervals {
                ci68: ConfidenceInterval {
                    lower: mean - std_dev,
                    upper: mean + std_dev,
                },
                ci95: ConfidenceInterval {
                    lower: mean - 2.0 * std_dev,
                    upper: mean + 2.0 * std_dev,
                },
            },
            sorted_values: values,
        })
    }
}
