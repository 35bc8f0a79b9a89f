//! Sampled maximum drawdown.
//!
//! A deliberately sampled secondary simulation, not a full population
//! statistic: for a capped number of paths, a quarterly random-walk value
//! path is simulated over the fund horizon with per-step shock standard
//! deviation equal to the annual volatility de-annualized by sqrt(4). The
//! running peak is tracked and the largest `(peak - current) / peak` across
//! all steps of all paths is returned. The cap trades tail resolution for
//! run time and is documented on the engine default.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::core::error::{SimError, SimResult};
use crate::core::validate::require_finite_result;

/// Steps per simulated year.
pub const QUARTERS_PER_YEAR: f64 = 4.0;

/// Largest peak-to-trough decline across `paths` simulated quarterly value
/// paths. Result lies in `[0, 1]`.
pub fn sampled_max_drawdown(
    mean_annual: f64,
    std_annual: f64,
    horizon_years: f64,
    paths: usize,
    rng: &mut StdRng,
) -> SimResult<f64> {
    let steps = ((horizon_years * QUARTERS_PER_YEAR).ceil() as usize).max(1);
    let drift = mean_annual / QUARTERS_PER_YEAR;
    let shock_sd = std_annual / QUARTERS_PER_YEAR.sqrt();
    let shocks = Normal::new(0.0, shock_sd).map_err(|_| SimError::NonConvergentResult {
        what: "drawdown shock deviation",
    })?;

    let mut worst: f64 = 0.0;
    for _ in 0..paths {
        let mut value = 1.0_f64;
        let mut peak = 1.0_f64;
        for _ in 0..steps {
            value *= 1.0 + drift + shocks.sample(rng);
            value = value.max(0.0);
            if value > peak {
                peak = value;
            }
            let drawdown = (peak - value) / peak;
            if drawdown > worst {
                worst = drawdown;
            }
        }
    }
    require_finite_result("max_drawdown", worst)
}
