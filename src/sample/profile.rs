//! Stage-conditioned return profiles.
//!
//! A profile is an ordered set of outcome buckets whose probabilities sum to
//! one: a large failure mass at or below cost, a thin band of meaningful
//! winners, and a rare extreme bucket sampled from a bounded Pareto tail. A
//! global multiple cap (default 200x) applies after any in-bucket draw.
//!
//! The static defaults below encode the industry base rates the simulator is
//! calibrated against: seed-stage failure mass (multiple <= 1x) of 0.70 and
//! extreme-outlier mass (multiple > 50x) of 0.01, with both masses falling
//! as stages mature. `mean_years_to_exit` drives the harvest-period timing
//! used to split distributed from unrealized value.

use serde::{Deserialize, Serialize};

use crate::core::error::SimResult;
use crate::core::types::Stage;
use crate::core::validate::{self, Bounds};

/// Hard ceiling on any sampled multiple, applied after the in-bucket draw.
pub const GLOBAL_MULTIPLE_CAP: f64 = 200.0;

/// Default Pareto shape for the extreme bucket. Must exceed 1 so the tail
/// keeps a finite mean.
pub const DEFAULT_TAIL_SHAPE: f64 = 2.0;

/// How values are drawn within a bucket's `[min, max]` range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketDraw {
    /// Uniform over the bucket range.
    Uniform,
    /// Bounded Pareto over the bucket range (the extreme tail).
    ParetoTail,
}

/// One outcome bucket of a stage profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeBucket {
    pub label: String,
    pub min_multiple: f64,
    pub max_multiple: f64,
    pub probability: f64,
    pub draw: BucketDraw,
}

impl OutcomeBucket {
    fn uniform(label: &str, min: f64, max: f64, probability: f64) -> Self {
        Self {
            label: label.to_string(),
            min_multiple: min,
            max_multiple: max,
            probability,
            draw: BucketDraw::Uniform,
        }
    }

    fn pareto(label: &str, min: f64, max: f64, probability: f64) -> Self {
        Self {
            label: label.to_string(),
            min_multiple: min,
            max_multiple: max,
            probability,
            draw: BucketDraw::ParetoTail,
        }
    }
}

/// Calibrated outcome distribution for one investment stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StageReturnProfile {
    pub stage: Stage,
    pub buckets: Vec<OutcomeBucket>,
    pub multiple_cap: f64,
    /// Pareto shape parameter for `ParetoTail` buckets; domain `(1, 10]`.
    pub tail_shape: f64,
    /// Mean years until the holding realizes (exit or write-off).
    pub mean_years_to_exit: f64,
}

impl StageReturnProfile {
    pub fn validate(&self) -> SimResult<()> {
        validate::require_in_range("multiple_cap", self.multiple_cap, Bounds::positive())?;
        validate::require_in_range("tail_shape", self.tail_shape, Bounds::open_min(1.0, 10.0))?;
        validate::require_in_range(
            "mean_years_to_exit",
            self.mean_years_to_exit,
            Bounds::open_min(0.0, 30.0),
        )?;

        let mut total = 0.0;
        for bucket in &self.buckets {
            validate::require_in_range(
                "bucket.probability",
                bucket.probability,
                Bounds::closed(0.0, 1.0),
            )?;
            validate::require_in_range("bucket.min_multiple", bucket.min_multiple, Bounds::at_least(0.0))?;
            validate::require_in_range(
                "bucket.max_multiple",
                bucket.max_multiple,
                Bounds::closed(bucket.min_multiple, GLOBAL_MULTIPLE_CAP),
            )?;
            total += bucket.probability;
        }
        validate::require_in_range(
            "bucket probability sum",
            total,
            Bounds::closed(1.0 - 1.0e-9, 1.0 + 1.0e-9),
        )?;
        Ok(())
    }

    /// Probability mass at or below cost (multiple <= 1x).
    pub fn failure_mass(&self) -> f64 {
        self.buckets
            .iter()
            .filter(|b| b.max_multiple <= 1.0)
            .map(|b| b.probability)
            .sum()
    }
}

/// Static industry-default profile for a stage.
///
/// Bucket masses sum to exactly 1 per stage; failure mass declines
/// monotonically from preseed (0.75) to series D+ (0.30).
pub fn default_profile(stage: Stage) -> StageReturnProfile {
    let (buckets, mean_years_to_exit) = match stage {
        Stage::Preseed => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.42),
                OutcomeBucket::uniform("below_cost", 0.05, 1.0, 0.33),
                OutcomeBucket::uniform("modest", 1.0, 3.0, 0.12),
                OutcomeBucket::uniform("strong", 3.0, 10.0, 0.08),
                OutcomeBucket::uniform("fund_returner", 10.0, 60.0, 0.038),
                OutcomeBucket::pareto("outlier", 60.0, 200.0, 0.012),
            ],
            8.0,
        ),
        Stage::Seed => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.35),
                OutcomeBucket::uniform("below_cost", 0.10, 1.0, 0.35),
                OutcomeBucket::uniform("modest", 1.0, 3.0, 0.15),
                OutcomeBucket::uniform("strong", 3.0, 10.0, 0.10),
                OutcomeBucket::uniform("fund_returner", 10.0, 50.0, 0.04),
                OutcomeBucket::pareto("outlier", 50.0, 200.0, 0.01),
            ],
            7.0,
        ),
        Stage::SeriesA => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.28),
                OutcomeBucket::uniform("below_cost", 0.15, 1.0, 0.30),
                OutcomeBucket::uniform("modest", 1.0, 3.0, 0.22),
                OutcomeBucket::uniform("strong", 3.0, 8.0, 0.13),
                OutcomeBucket::uniform("fund_returner", 8.0, 40.0, 0.062),
                OutcomeBucket::pareto("outlier", 40.0, 200.0, 0.008),
            ],
            6.0,
        ),
        Stage::SeriesB => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.20),
                OutcomeBucket::uniform("below_cost", 0.20, 1.0, 0.28),
                OutcomeBucket::uniform("modest", 1.0, 2.5, 0.27),
                OutcomeBucket::uniform("strong", 2.5, 6.0, 0.17),
                OutcomeBucket::uniform("fund_returner", 6.0, 25.0, 0.075),
                OutcomeBucket::pareto("outlier", 25.0, 120.0, 0.005),
            ],
            5.0,
        ),
        Stage::SeriesC => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.14),
                OutcomeBucket::uniform("below_cost", 0.25, 1.0, 0.24),
                OutcomeBucket::uniform("modest", 1.0, 2.0, 0.32),
                OutcomeBucket::uniform("strong", 2.0, 5.0, 0.21),
                OutcomeBucket::uniform("fund_returner", 5.0, 15.0, 0.087),
                OutcomeBucket::pareto("outlier", 15.0, 80.0, 0.003),
            ],
            4.0,
        ),
        Stage::SeriesDplus => (
            vec![
                OutcomeBucket::uniform("write_off", 0.0, 0.0, 0.10),
                OutcomeBucket::uniform("below_cost", 0.30, 1.0, 0.20),
                OutcomeBucket::uniform("modest", 1.0, 1.8, 0.38),
                OutcomeBucket::uniform("strong", 1.8, 4.0, 0.24),
                OutcomeBucket::uniform("fund_returner", 4.0, 10.0, 0.078),
                OutcomeBucket::pareto("outlier", 10.0, 50.0, 0.002),
            ],
            3.0,
        ),
    };

    StageReturnProfile {
        stage,
        buckets,
        multiple_cap: GLOBAL_MULTIPLE_CAP,
        tail_shape: DEFAULT_TAIL_SHAPE,
        mean_years_to_exit,
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::core::error::SimError;

    #[test]
    fn all_default_profiles_validate() {
        for stage in Stage::ALL {
            default_profile(stage).validate().unwrap();
        }
    }

    #[test]
    fn default_probabilities_sum_to_one() {
        for stage in Stage::ALL {
            let total: f64 = default_profile(stage)
                .buckets
                .iter()
                .map(|b| b.probability)
                .sum();
            assert_relative_eq!(total, 1.0, epsilon = 1.0e-12);
        }
    }

    #[test]
    fn failure_mass_declines_with_stage_maturity() {
        let masses: Vec<f64> = Stage::ALL
            .iter()
            .map(|&s| default_profile(s).failure_mass())
            .collect();
        for pair in masses.windows(2) {
            assert!(pair[1] < pair[0], "failure mass not decreasing: {masses:?}");
        }
    }

    #[test]
    fn seed_profile_matches_calibration_targets() {
        let seed = default_profile(Stage::Seed);
        assert_relative_eq!(seed.failure_mass(), 0.70, epsilon = 1.0e-12);
        let extreme: f64 = seed
            .buckets
            .iter()
            .filter(|b| b.min_multiple >= 50.0)
            .map(|b| b.probability)
            .sum();
        assert_relative_eq!(extreme, 0.01, epsilon = 1.0e-12);
    }

    #[test]
    fn tail_shape_at_one_is_out_of_range() {
        let mut profile = default_profile(Stage::Seed);
        profile.tail_shape = 1.0;
        assert!(matches!(
            profile.validate(),
            Err(SimError::OutOfRange {
                name: "tail_shape",
                ..
            })
        ));
    }

    #[test]
    fn probability_sum_off_by_one_percent_is_rejected() {
        let mut profile = default_profile(Stage::Seed);
        profile.buckets[0].probability += 0.01;
        assert!(profile.validate().is_err());
    }
}
