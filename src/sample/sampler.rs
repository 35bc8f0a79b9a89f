//! Per-company return sampling.
//!
//! One `ReturnSample` is drawn per company per trial: a uniform variate
//! selects an outcome bucket by cumulative probability, a second draws the
//! multiple within the bucket (uniform, or bounded-Pareto for the extreme
//! tail), and the global cap applies last. Every input combination produces
//! a finite sample by construction; edge cases collapse into the total-loss
//! sentinel rather than raising errors.
//!
//! Determinism: the sampler never touches process-wide random state. The rng
//! is owned by the enclosing run and passed into every call; per-trial
//! streams are derived with `stream_seed`, so an identical seed and call
//! sequence always reproduces the identical sample sequence.

use std::collections::HashMap;

use rand::Rng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::core::error::{SimError, SimResult};
use crate::core::types::Stage;
use crate::core::validate::{self, Bounds};
use crate::sample::profile::{BucketDraw, StageReturnProfile, default_profile};

/// Rate-of-return sentinel for a total loss (`multiple <= 0`).
pub const TOTAL_LOSS_RATE: f64 = -1.0;

/// Central tendency and volatility of the calibrated growth model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DistributionParameters {
    pub mean: f64,
    pub volatility: f64,
}

impl DistributionParameters {
    pub fn validate(&self) -> SimResult<()> {
        validate::require_in_range("mean", self.mean, Bounds::closed(-1.0, 5.0))?;
        validate::require_in_range("volatility", self.volatility, Bounds::closed(0.0, 5.0))?;
        Ok(())
    }
}

/// One sampled outcome for one company in one trial.
///
/// Invariant: `rate_of_return == -1.0` exactly when `multiple <= 0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReturnSample {
    pub multiple: f64,
    pub rate_of_return: f64,
}

impl ReturnSample {
    #[inline]
    pub fn is_total_loss(&self) -> bool {
        self.multiple <= 0.0
    }
}

/// Annualized rate of return implied by a multiple over a holding period.
///
/// The sentinel branch exists to avoid a fractional power of a non-positive
/// base, which would be non-finite.
#[inline]
pub fn annualized_return(multiple: f64, years: f64) -> f64 {
    debug_assert!(years > 0.0, "holding period must be positive");
    if multiple > 0.0 {
        multiple.powf(1.0 / years) - 1.0
    } else {
        TOTAL_LOSS_RATE
    }
}

/// Deterministic sub-stream seed for trial `index` of a run.
#[inline]
pub fn stream_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add((index as u64).wrapping_mul(7_919))
}

/// Maps `[0, 1)` into the open unit interval for safe inverse-CDF draws.
#[inline]
fn uniform_open01(u: f64) -> f64 {
    u.clamp(f64::EPSILON, 1.0 - f64::EPSILON)
}

/// Bounded-Pareto inverse CDF on `[low, high]` with shape `alpha`.
#[inline]
fn bounded_pareto_inv_cdf(u: f64, low: f64, high: f64, alpha: f64) -> f64 {
    let ratio_pow = (low / high).powf(alpha);
    low / (1.0 - u * (1.0 - ratio_pow)).powf(1.0 / alpha)
}

#[derive(Debug, Clone, Copy)]
enum Mode {
    StageProfile,
    Calibrated { growth: Normal<f64> },
}

/// Draws one return sample per company per trial.
#[derive(Debug, Clone)]
pub struct ReturnSampler {
    profiles: HashMap<Stage, StageReturnProfile>,
    mode: Mode,
    holding_years: f64,
}

impl ReturnSampler {
    /// Sampler over the static industry stage profiles.
    pub fn stage_profile(holding_years: f64) -> SimResult<Self> {
        Self::build(Mode::StageProfile, holding_years)
    }

    /// Sampler over calibrated fund-specific growth parameters.
    pub fn calibrated(params: DistributionParameters, holding_years: f64) -> SimResult<Self> {
        params.validate()?;
        let growth = Normal::new(params.mean, params.volatility)
            .map_err(|_| SimError::NonFiniteValue {
                name: "volatility",
                value: params.volatility,
            })?;
        Self::build(Mode::Calibrated { growth }, holding_years)
    }

    fn build(mode: Mode, holding_years: f64) -> SimResult<Self> {
        validate::require_in_range("holding_years", holding_years, Bounds::open_min(0.0, 50.0))?;
        let mut profiles = HashMap::with_capacity(Stage::ALL.len());
        for stage in Stage::ALL {
            let profile = default_profile(stage);
            profile.validate()?;
            profiles.insert(stage, profile);
        }
        Ok(Self {
            profiles,
            mode,
            holding_years,
        })
    }

    /// Replaces the profile for one stage (custom calibrations, tests).
    pub fn with_profile(mut self, profile: StageReturnProfile) -> SimResult<Self> {
        profile.validate()?;
        self.profiles.insert(profile.stage, profile);
        Ok(self)
    }

    pub fn profile(&self, stage: Stage) -> &StageReturnProfile {
        &self.profiles[&stage]
    }

    /// Draws one sample for a company at `stage`. Never fails: every draw
    /// yields a finite multiple in `[0, cap]` and a matching rate of return.
    pub fn sample(&self, stage: Stage, rng: &mut StdRng) -> ReturnSample {
        let profile = &self.profiles[&stage];
        let multiple = match self.mode {
            Mode::StageProfile => Self::draw_from_profile(profile, rng),
            Mode::Calibrated { growth } => {
                let gross = 1.0 + growth.sample(rng);
                gross.clamp(0.0, profile.multiple_cap)
            }
        };
        ReturnSample {
            multiple,
            rate_of_return: annualized_return(multiple, self.holding_years),
        }
    }

    /// Draws the company's years-until-realization (exponential around the
    /// stage's mean years to exit).
    pub fn sample_exit_years(&self, stage: Stage, rng: &mut StdRng) -> f64 {
        let mean = self.profiles[&stage].mean_years_to_exit;
        let u = uniform_open01(rng.random::<f64>());
        -mean * (1.0 - u).ln()
    }

    fn draw_from_profile(profile: &StageReturnProfile, rng: &mut StdRng) -> f64 {
        let selector: f64 = rng.random();
        let in_bucket: f64 = rng.random();

        let mut cumulative = 0.0;
        let mut chosen = profile.buckets.last();
        for bucket in &profile.buckets {
            cumulative += bucket.probability;
            if selector < cumulative {
                chosen = Some(bucket);
                break;
            }
        }
        // probabilities sum to 1, so `chosen` is always set; the fallback to
        // the last bucket covers selector values at the rounding boundary
        let bucket = match chosen {
            Some(b) => b,
            None => return 0.0,
        };

        let raw = match bucket.draw {
            BucketDraw::ParetoTail if bucket.min_multiple > 0.0 => bounded_pareto_inv_cdf(
                uniform_open01(in_bucket),
                bucket.min_multiple,
                bucket.max_multiple,
                profile.tail_shape,
            ),
            _ => bucket.min_multiple + in_bucket * (bucket.max_multiple - bucket.min_multiple),
        };
        raw.clamp(0.0, profile.multiple_cap)
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    use super::*;
    use crate::sample::profile::GLOBAL_MULTIPLE_CAP;

    #[test]
    fn annualized_return_inverts_the_multiple() {
        assert_relative_eq!(annualized_return(2.0, 1.0), 1.0, epsilon = 1.0e-12);
        // 1.08^10 over ten years annualizes back to 8%
        let multiple = 1.08_f64.powi(10);
        assert_relative_eq!(annualized_return(multiple, 10.0), 0.08, epsilon = 1.0e-12);
    }

    #[test]
    fn total_loss_uses_the_exact_sentinel() {
        assert_eq!(annualized_return(0.0, 10.0), TOTAL_LOSS_RATE);
        assert_eq!(annualized_return(-0.5, 10.0), TOTAL_LOSS_RATE);
    }

    #[test]
    fn sentinel_holds_iff_multiple_is_non_positive() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..20_000 {
            let s = sampler.sample(Stage::Seed, &mut rng);
            assert_eq!(
                s.rate_of_return == TOTAL_LOSS_RATE,
                s.multiple <= 0.0,
                "sentinel mismatch: {s:?}"
            );
        }
    }

    #[test]
    fn samples_respect_the_global_cap() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..50_000 {
            let s = sampler.sample(Stage::Preseed, &mut rng);
            assert!(s.multiple >= 0.0);
            assert!(s.multiple <= GLOBAL_MULTIPLE_CAP);
            assert!(s.rate_of_return.is_finite());
        }
    }

    #[test]
    fn identical_seed_reproduces_the_sample_sequence() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut a = StdRng::seed_from_u64(42);
        let mut b = StdRng::seed_from_u64(42);
        for _ in 0..256 {
            assert_eq!(
                sampler.sample(Stage::SeriesA, &mut a),
                sampler.sample(Stage::SeriesA, &mut b)
            );
        }
    }

    #[test]
    fn seed_stage_failure_and_outlier_rates_match_calibration() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;
        let mut failures = 0;
        let mut outliers = 0;
        for _ in 0..trials {
            let s = sampler.sample(Stage::Seed, &mut rng);
            if s.multiple <= 1.0 {
                failures += 1;
            }
            if s.multiple > 50.0 {
                outliers += 1;
            }
        }
        let failure_rate = failures as f64 / trials as f64;
        let outlier_rate = outliers as f64 / trials as f64;
        assert!(
            failure_rate > 0.68 && failure_rate < 0.72,
            "failure rate {failure_rate}"
        );
        assert!(
            outlier_rate > 0.007 && outlier_rate < 0.013,
            "outlier rate {outlier_rate}"
        );
    }

    #[test]
    fn series_a_fails_less_often_than_seed() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let trials = 10_000;
        let mut seed_failures = 0;
        let mut series_a_failures = 0;
        for _ in 0..trials {
            if sampler.sample(Stage::Seed, &mut rng).multiple <= 1.0 {
                seed_failures += 1;
            }
            if sampler.sample(Stage::SeriesA, &mut rng).multiple <= 1.0 {
                series_a_failures += 1;
            }
        }
        assert!(series_a_failures < seed_failures);
    }

    #[test]
    fn calibrated_mode_centers_on_the_given_mean() {
        let params = DistributionParameters {
            mean: 0.15,
            volatility: 0.30,
        };
        let sampler = ReturnSampler::calibrated(params, 10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(42);
        let n = 20_000;
        let mean: f64 = (0..n)
            .map(|_| sampler.sample(Stage::Seed, &mut rng).multiple)
            .sum::<f64>()
            / n as f64;
        assert!((mean - 1.15).abs() < 0.05, "mean multiple {mean}");
    }

    #[test]
    fn bounded_pareto_stays_within_bucket_range() {
        for i in 0..1_000 {
            let u = i as f64 / 1_000.0;
            let x = bounded_pareto_inv_cdf(uniform_open01(u), 50.0, 200.0, 2.0);
            assert!((50.0..=200.0 + 1.0e-9).contains(&x), "u={u} x={x}");
        }
    }

    #[test]
    fn pareto_tail_concentrates_near_the_lower_bound() {
        // median of the bounded Pareto should sit well below the midpoint
        let median = bounded_pareto_inv_cdf(0.5, 50.0, 200.0, 2.0);
        assert!(median < 125.0, "median {median}");
    }

    #[test]
    fn exit_years_are_positive_and_average_near_the_stage_mean() {
        let sampler = ReturnSampler::stage_profile(10.0).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let n = 50_000;
        let mut sum = 0.0;
        for _ in 0..n {
            let years = sampler.sample_exit_years(Stage::Seed, &mut rng);
            assert!(years > 0.0);
            sum += years;
        }
        let mean = sum / n as f64;
        assert!((mean - 7.0).abs() < 0.15, "mean exit years {mean}");
    }

    #[test]
    fn stream_seeds_differ_per_trial() {
        let a = stream_seed(42, 0);
        let b = stream_seed(42, 1);
        let c = stream_seed(42, 2);
        assert_ne!(a, b);
        assert_ne!(b, c);
        assert_eq!(stream_seed(42, 1), b);
    }
}
