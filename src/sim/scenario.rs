//! Portfolio scenario generation.
//!
//! Runs `trials` independent portfolio simulations. Each trial draws one
//! stage-conditioned return sample and one exit-timing draw per company,
//! independent across companies and across trials, then aggregates to
//! fund-level metrics: total value, multiple, distributions-to-paid-in,
//! total-value-to-paid-in, and the annualized rate of return over the
//! deployment-adjusted holding period.
//!
//! Per-trial numeric edge cases (a company's total loss, zero distributable
//! proceeds) are valid domain outcomes, represented by the sentinel and by
//! ratio clamps; no trial can raise an error. Validation failures abort
//! before the first trial, so an invalid configuration never produces a
//! partial result.
//!
//! Every trial owns a derived random sub-stream (`stream_seed`), which makes
//! the sequential and rayon execution paths bit-identical for the same seed
//! and trial count, regardless of how the trial space is partitioned.

use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
#[cfg(feature = "parallel")]
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::error::{SimError, SimResult};
use crate::core::types::{PortfolioCompany, SimulationConfig, TRIALS_MAX, TRIALS_MIN};
use crate::core::validate::{self, Bounds};
use crate::sample::sampler::{ReturnSampler, annualized_return, stream_seed};
use crate::sim::sink::MetricsSink;

/// Floor on the effective holding period after deployment adjustment.
pub const MIN_EFFECTIVE_YEARS: f64 = 0.25;

/// Trials per batch between deadline checks and progress callbacks.
const TRIAL_CHUNK: usize = 256;

/// One aggregated fund-level outcome.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PortfolioTrial {
    pub rate_of_return: f64,
    pub multiple: f64,
    /// Distributions to paid-in (DPI). Clamped to `>= 0`.
    pub distribution_ratio: f64,
    /// Total value to paid-in (TVPI). Clamped to `>= 0`.
    pub total_value_ratio: f64,
    pub total_value: f64,
}

/// Runs the trial loop for one simulation.
#[derive(Debug, Clone)]
pub struct ScenarioGenerator {
    trials: usize,
    time_horizon_years: f64,
    deployment_schedule_months: f64,
    base_seed: u64,
    sampler: ReturnSampler,
    time_budget: Option<Duration>,
}

impl ScenarioGenerator {
    pub fn new(trials: usize, time_horizon_years: f64, base_seed: u64, sampler: ReturnSampler) -> Self {
        Self {
            trials,
            time_horizon_years,
            deployment_schedule_months: 0.0,
            base_seed,
            sampler,
            time_budget: None,
        }
    }

    /// Builds a generator from a validated run configuration.
    pub fn from_config(config: &SimulationConfig, sampler: ReturnSampler) -> SimResult<Self> {
        config.validate()?;
        Ok(Self {
            trials: config.trials,
            time_horizon_years: config.time_horizon_years,
            deployment_schedule_months: config.deployment_schedule_months,
            base_seed: config.random_seed,
            sampler,
            time_budget: config.time_budget_ms.map(Duration::from_millis),
        })
    }

    pub fn with_deployment_schedule_months(mut self, months: f64) -> Self {
        self.deployment_schedule_months = months;
        self
    }

    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    /// Holding period after the deployment adjustment: capital deployed
    /// uniformly over the schedule has an average age shortened by half the
    /// schedule length.
    pub fn effective_holding_years(&self) -> f64 {
        (self.time_horizon_years - self.deployment_schedule_months / 24.0).max(MIN_EFFECTIVE_YEARS)
    }

    /// Runs all trials and returns one `PortfolioTrial` per trial, in trial
    /// order.
    pub fn run(
        &self,
        portfolio: &[PortfolioCompany],
        sink: &dyn MetricsSink,
    ) -> SimResult<Vec<PortfolioTrial>> {
        validate::require_count("trials", self.trials, TRIALS_MIN, TRIALS_MAX)?;
        validate::require_in_range(
            "time_horizon_years",
            self.time_horizon_years,
            Bounds::open_min(0.0, 50.0),
        )?;
        validate::require_count("portfolio_size", portfolio.len(), 1, 10_000)?;
        for company in portfolio {
            company.validate()?;
        }
        let total_invested: f64 = portfolio.iter().map(|c| c.invested).sum();
        let total_invested = validate::require_in_range(
            "total_invested",
            total_invested,
            Bounds::positive(),
        )?;

        let deadline = self.time_budget.map(|budget| Instant::now() + budget);
        let mut trials = Vec::with_capacity(self.trials);
        let mut start = 0usize;
        while start < self.trials {
            if let Some(deadline) = deadline {
                if Instant::now() > deadline {
                    return Err(SimError::Cancelled {
                        completed_trials: trials.len(),
                    });
                }
            }
            let end = (start + TRIAL_CHUNK).min(self.trials);

            #[cfg(feature = "parallel")]
            let chunk: Vec<PortfolioTrial> = (start..end)
                .into_par_iter()
                .map(|i| self.run_trial(i, portfolio, total_invested))
                .collect();
            #[cfg(not(feature = "parallel"))]
            let chunk: Vec<PortfolioTrial> = (start..end)
                .map(|i| self.run_trial(i, portfolio, total_invested))
                .collect();

            trials.extend(chunk);
            sink.on_trials_completed(trials.len(), self.trials);
            start = end;
        }
        Ok(trials)
    }

    fn run_trial(
        &self,
        index: usize,
        portfolio: &[PortfolioCompany],
        total_invested: f64,
    ) -> PortfolioTrial {
        let mut rng = StdRng::seed_from_u64(stream_seed(self.base_seed, index));
        let holding_years = self.effective_holding_years();

        let mut total_value = 0.0;
        let mut distributed = 0.0;
        for company in portfolio {
            let sample = self.sampler.sample(company.stage, &mut rng);
            let value = company.invested * sample.multiple;
            total_value += value;

            let exit_years = self.sampler.sample_exit_years(company.stage, &mut rng);
            if exit_years <= holding_years {
                distributed += value;
            }
        }

        let multiple = total_value / total_invested;
        PortfolioTrial {
            rate_of_return: annualized_return(multiple, holding_years),
            multiple,
            distribution_ratio: (distributed / total_invested).max(0.0),
            total_value_ratio: multiple.max(0.0),
            total_value,
        }
    }
}
