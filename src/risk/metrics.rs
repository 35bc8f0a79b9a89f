//! Tail-risk measures over the per-trial rate-of-return sample.
//!
//! Implemented analytics:
//! - index-based VaR at the 5% and 10% levels over the sorted sample,
//! - CVaR as the mean of the worst alpha-fraction of outcomes,
//! - probability of loss,
//! - downside deviation over the below-mean subset,
//! - Sharpe and Sortino ratios against a configurable risk-free rate,
//! - sampled maximum drawdown (see `drawdown`).
//!
//! Values are returns, not positivized losses: VaR here is the return at the
//! tail threshold and is typically negative for a risky portfolio.
//!
//! Numerical notes: every output passes a finiteness post-check before it is
//! returned; degenerate dispersion produces flagged zeros rather than a
//! division by a vanishing denominator.

use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use crate::core::error::{SimError, SimResult};
use crate::core::validate::require_finite_result;
use crate::math::stats::{MIN_DISPERSION, mean_of, sample_std_dev};
use crate::risk::drawdown::sampled_max_drawdown;
use crate::sample::sampler::stream_seed;

/// Documented default risk-free rate.
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.02;

/// Documented cap on drawdown sample paths.
pub const DEFAULT_DRAWDOWN_PATHS: usize = 1_000;

// Reserved stream index for the drawdown walk; trial streams use indices
// below `TRIALS_MAX`, so the two never collide.
const DRAWDOWN_STREAM_INDEX: usize = 1 << 20;

/// Tail-risk summary of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RiskMetrics {
    /// Return at the 5th-percentile tail threshold.
    pub var_5: f64,
    /// Return at the 10th-percentile tail threshold.
    pub var_10: f64,
    /// Mean return of the worst 5% of trials. Never exceeds `var_5`.
    pub cvar_5: f64,
    /// Mean return of the worst 10% of trials.
    pub cvar_10: f64,
    /// Fraction of trials with a negative rate of return.
    pub probability_of_loss: f64,
    /// Root-mean-square deviation below the mean, over the below-mean subset.
    pub downside_risk: f64,
    /// True when no trial fell below the mean (downside risk is a flagged 0).
    pub downside_degenerate: bool,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    /// Largest sampled peak-to-trough decline, in `[0, 1]`.
    pub max_drawdown: f64,
}

/// Value-at-risk: the element at `floor(alpha * n)` of the sorted ascending
/// sample.
pub fn value_at_risk(sorted: &[f64], alpha: f64) -> SimResult<f64> {
    if sorted.is_empty() {
        return Err(SimError::InsufficientSamples {
            required: 1,
            actual: 0,
        });
    }
    let index = (alpha * sorted.len() as f64).floor() as usize;
    Ok(sorted[index.min(sorted.len() - 1)])
}

/// Conditional value-at-risk: the mean of the worst `alpha` fraction,
/// indices `[0, floor(alpha * n))`. Requires that slice to be non-empty.
pub fn conditional_value_at_risk(sorted: &[f64], alpha: f64) -> SimResult<f64> {
    let cut = (alpha * sorted.len() as f64).floor() as usize;
    if cut == 0 {
        return Err(SimError::InsufficientSamples {
            required: (1.0 / alpha).ceil() as usize,
            actual: sorted.len(),
        });
    }
    Ok(mean_of(&sorted[..cut]))
}

/// Fraction of outcomes strictly below zero.
pub fn probability_of_loss(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&x| x < 0.0).count() as f64 / values.len() as f64
}

/// Downside deviation result; `degenerate` marks the no-below-mean case.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DownsideRisk {
    pub value: f64,
    pub degenerate: bool,
}

/// Root-mean-square deviation below the mean.
///
/// The divisor is the count of below-mean observations, not the total sample
/// size. This is deliberately not the textbook Sortino denominator (which
/// counts above-mean observations as zero deviations); figures here are
/// therefore larger, and Sortino ratios correspondingly more conservative.
pub fn downside_risk(values: &[f64], mean: f64) -> DownsideRisk {
    let mut sum_sq = 0.0;
    let mut count = 0usize;
    for &x in values {
        if x < mean {
            let d = x - mean;
            sum_sq += d * d;
            count += 1;
        }
    }
    if count == 0 {
        return DownsideRisk {
            value: 0.0,
            degenerate: true,
        };
    }
    DownsideRisk {
        value: (sum_sq / count as f64).sqrt(),
        degenerate: false,
    }
}

/// Computes the full tail-risk summary for a run.
#[derive(Debug, Clone, Copy)]
pub struct RiskMetricsEngine {
    pub risk_free_rate: f64,
    pub drawdown_paths: usize,
}

impl Default for RiskMetricsEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskMetricsEngine {
    pub fn new() -> Self {
        Self {
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            drawdown_paths: DEFAULT_DRAWDOWN_PATHS,
        }
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_drawdown_paths(mut self, paths: usize) -> Self {
        self.drawdown_paths = paths;
        self
    }

    /// Computes all metrics from the per-trial rate-of-return sample.
    ///
    /// `base_seed` derives the drawdown walk's own stream so the headline
    /// trial streams stay untouched.
    pub fn compute(
        &self,
        returns: &[f64],
        time_horizon_years: f64,
        base_seed: u64,
    ) -> SimResult<RiskMetrics> {
        // CVaR at 5% needs a non-empty tail slice
        if returns.len() < 20 {
            return Err(SimError::InsufficientSamples {
                required: 20,
                actual: returns.len(),
            });
        }

        let mut sorted = returns.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let mean = require_finite_result("mean return", mean_of(&sorted))?;
        let std_dev = require_finite_result("return deviation", sample_std_dev(&sorted)?)?;

        let var_5 = value_at_risk(&sorted, 0.05)?;
        let var_10 = value_at_risk(&sorted, 0.10)?;
        let cvar_5 = conditional_value_at_risk(&sorted, 0.05)?;
        let cvar_10 = conditional_value_at_risk(&sorted, 0.10)?;

        let downside = downside_risk(&sorted, mean);
        let excess = mean - self.risk_free_rate;
        let sharpe_ratio = if std_dev > MIN_DISPERSION {
            excess / std_dev
        } else {
            0.0
        };
        let sortino_ratio = if downside.value > MIN_DISPERSION {
            excess / downside.value
        } else {
            0.0
        };

        let paths = self.drawdown_paths.min(returns.len());
        let mut drawdown_rng = StdRng::seed_from_u64(stream_seed(base_seed, DRAWDOWN_STREAM_INDEX));
        let max_drawdown =
            sampled_max_drawdown(mean, std_dev, time_horizon_years, paths, &mut drawdown_rng)?;

        let metrics = RiskMetrics {
            var_5: require_finite_result("var_5", var_5)?,
            var_10: require_finite_result("var_10", var_10)?,
            cvar_5: require_finite_result("cvar_5", cvar_5)?,
            cvar_10: require_finite_result("cvar_10", cvar_10)?,
            probability_of_loss: probability_of_loss(&sorted),
            downside_risk: require_finite_result("downside_risk", downside.value)?,
            downside_degenerate: downside.degenerate,
            sharpe_ratio: require_finite_result("sharpe_ratio", sharpe_ratio)?,
            sortino_ratio: require_finite_result("sortino_ratio", sortino_ratio)?,
            max_drawdown,
        };
        Ok(metrics)
    }
}
