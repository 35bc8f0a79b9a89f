//! Domain types shared across the simulation pipeline.
//!
//! These are stable serde payloads: the surrounding platform delivers fund,
//! portfolio, and configuration data as JSON, and consumes results the same
//! way. Field names follow the wire convention of the upstream service
//! (snake_case, stages spelled `preseed` .. `series_dplus`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::error::{SimError, SimResult};
use crate::core::validate::{self, Bounds};

/// Investment stage of a portfolio company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Preseed,
    Seed,
    SeriesA,
    SeriesB,
    SeriesC,
    SeriesDplus,
}

impl Stage {
    pub const ALL: [Stage; 6] = [
        Stage::Preseed,
        Stage::Seed,
        Stage::SeriesA,
        Stage::SeriesB,
        Stage::SeriesC,
        Stage::SeriesDplus,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Preseed => "preseed",
            Self::Seed => "seed",
            Self::SeriesA => "series_a",
            Self::SeriesB => "series_b",
            Self::SeriesC => "series_c",
            Self::SeriesDplus => "series_dplus",
        }
    }
}

/// One portfolio holding as delivered by the portfolio input provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioCompany {
    pub id: String,
    pub name: String,
    pub stage: Stage,
    /// Capital invested into the company, in fund currency units.
    pub invested: f64,
    /// Ownership fraction in `(0, 1]`.
    pub ownership: f64,
}

impl PortfolioCompany {
    pub fn validate(&self) -> SimResult<()> {
        validate::require_in_range("invested", self.invested, Bounds::positive())?;
        validate::require_in_range("ownership", self.ownership, Bounds::open_min(0.0, 1.0))?;
        Ok(())
    }
}

/// A fund's active baseline metrics, read from an external collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundBaseline {
    pub baseline_id: String,
    pub fund_id: String,
    /// The baseline's current value of the tracked return metric.
    pub metric_value: f64,
}

/// One historical variance report for a `(fund, baseline)` pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VarianceReport {
    pub as_of: NaiveDate,
    pub variance: f64,
}

/// Which return model drives the per-company draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SamplerKind {
    /// Heavy-tailed stage outcome buckets (industry defaults).
    #[default]
    StageProfile,
    /// Normal growth around calibrated fund-specific parameters.
    Calibrated,
}

fn default_risk_free_rate() -> f64 {
    0.02
}

pub const TRIALS_MIN: usize = 100;
pub const TRIALS_MAX: usize = 50_000;

/// Configuration of one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub fund_id: String,
    pub trials: usize,
    pub time_horizon_years: f64,
    pub portfolio_size: usize,
    pub deployment_schedule_months: f64,
    pub random_seed: u64,
    #[serde(default)]
    pub sampler: SamplerKind,
    #[serde(default = "default_risk_free_rate")]
    pub risk_free_rate: f64,
    /// Optional wall-clock budget for the sampling phase, in milliseconds.
    #[serde(default)]
    pub time_budget_ms: Option<u64>,
}

impl SimulationConfig {
    pub fn new(fund_id: impl Into<String>, trials: usize, time_horizon_years: f64) -> Self {
        Self {
            fund_id: fund_id.into(),
            trials,
            time_horizon_years,
            portfolio_size: 1,
            deployment_schedule_months: 0.0,
            random_seed: 0,
            sampler: SamplerKind::StageProfile,
            risk_free_rate: default_risk_free_rate(),
            time_budget_ms: None,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.random_seed = seed;
        self
    }

    pub fn with_portfolio_size(mut self, size: usize) -> Self {
        self.portfolio_size = size;
        self
    }

    pub fn with_deployment_schedule_months(mut self, months: f64) -> Self {
        self.deployment_schedule_months = months;
        self
    }

    pub fn with_sampler(mut self, sampler: SamplerKind) -> Self {
        self.sampler = sampler;
        self
    }

    pub fn with_risk_free_rate(mut self, rate: f64) -> Self {
        self.risk_free_rate = rate;
        self
    }

    pub fn with_time_budget_ms(mut self, budget_ms: u64) -> Self {
        self.time_budget_ms = Some(budget_ms);
        self
    }

    /// Domain validation of every externally supplied parameter.
    ///
    /// Runs before calibration or sampling; a failure means no work at all
    /// has been performed.
    pub fn validate(&self) -> SimResult<()> {
        validate::require_count("trials", self.trials, TRIALS_MIN, TRIALS_MAX)?;
        validate::require_in_range(
            "time_horizon_years",
            self.time_horizon_years,
            Bounds::open_min(0.0, 50.0),
        )?;
        validate::require_count("portfolio_size", self.portfolio_size, 1, 10_000)?;
        validate::require_in_range(
            "deployment_schedule_months",
            self.deployment_schedule_months,
            Bounds::closed(0.0, self.time_horizon_years * 12.0),
        )?;
        validate::require_in_range(
            "risk_free_rate",
            self.risk_free_rate,
            Bounds::closed(-0.10, 0.25),
        )?;
        Ok(())
    }

    /// Builds a config from an untyped JSON payload, routing every numeric
    /// field through the validation gate so type mismatches surface as typed
    /// errors rather than deserialization noise.
    pub fn from_json(value: &serde_json::Value) -> SimResult<Self> {
        let fund_id = match value.get("fund_id").and_then(|v| v.as_str()) {
            Some(s) => s.to_string(),
            None => {
                return Err(SimError::TypeMismatch {
                    name: "fund_id",
                    actual: "missing or non-string".to_string(),
                });
            }
        };

        let trials = json_count(value, "trials")?;
        let time_horizon_years = json_field(value, "time_horizon_years")?;
        let portfolio_size = json_count(value, "portfolio_size")?;
        let deployment_schedule_months = value
            .get("deployment_schedule_months")
            .map(|v| validate::json_number("deployment_schedule_months", v))
            .transpose()?
            .unwrap_or(0.0);
        let random_seed = json_count(value, "random_seed")? as u64;

        let config = Self {
            fund_id,
            trials,
            time_horizon_years,
            portfolio_size,
            deployment_schedule_months,
            random_seed,
            sampler: SamplerKind::default(),
            risk_free_rate: default_risk_free_rate(),
            time_budget_ms: None,
        };
        config.validate()?;
        Ok(config)
    }
}

fn json_field(value: &serde_json::Value, name: &'static str) -> SimResult<f64> {
    match value.get(name) {
        Some(v) => validate::json_number(name, v),
        None => Err(SimError::TypeMismatch {
            name,
            actual: "missing".to_string(),
        }),
    }
}

fn json_count(value: &serde_json::Value, name: &'static str) -> SimResult<usize> {
    let v = json_field(value, name)?;
    if v.fract() != 0.0 || v < 0.0 {
        return Err(SimError::TypeMismatch {
            name,
            actual: format!("non-integral number {v}"),
        });
    }
    Ok(v as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_config() -> SimulationConfig {
        SimulationConfig::new("fund-1", 1_000, 10.0)
            .with_seed(42)
            .with_portfolio_size(25)
    }

    #[test]
    fn valid_config_passes() {
        base_config().validate().unwrap();
    }

    #[test]
    fn trial_bounds_are_inclusive() {
        let mut config = base_config();
        config.trials = 100;
        config.validate().unwrap();
        config.trials = 50_000;
        config.validate().unwrap();

        config.trials = 99;
        assert!(matches!(
            config.validate(),
            Err(SimError::OutOfRange { name: "trials", .. })
        ));
        config.trials = 50_001;
        assert!(matches!(
            config.validate(),
            Err(SimError::OutOfRange { name: "trials", .. })
        ));
    }

    #[test]
    fn deployment_schedule_cannot_outlast_horizon() {
        let config = base_config().with_deployment_schedule_months(121.0);
        assert!(matches!(
            config.validate(),
            Err(SimError::OutOfRange {
                name: "deployment_schedule_months",
                ..
            })
        ));
    }

    #[test]
    fn horizon_must_be_strictly_positive() {
        let mut config = base_config();
        config.time_horizon_years = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn from_json_accepts_a_well_formed_payload() {
        let payload = serde_json::json!({
            "fund_id": "fund-9",
            "trials": 2_500,
            "time_horizon_years": 10.0,
            "portfolio_size": 30,
            "deployment_schedule_months": 36.0,
            "random_seed": 7,
        });
        let config = SimulationConfig::from_json(&payload).unwrap();
        assert_eq!(config.trials, 2_500);
        assert_eq!(config.random_seed, 7);
        assert_eq!(config.sampler, SamplerKind::StageProfile);
    }

    #[test]
    fn from_json_rejects_non_numeric_trials_as_type_mismatch() {
        let payload = serde_json::json!({
            "fund_id": "fund-9",
            "trials": "lots",
            "time_horizon_years": 10.0,
            "portfolio_size": 30,
            "random_seed": 7,
        });
        assert!(matches!(
            SimulationConfig::from_json(&payload),
            Err(SimError::TypeMismatch { name: "trials", .. })
        ));
    }

    #[test]
    fn stage_wire_names_round_trip() {
        for stage in Stage::ALL {
            let json = serde_json::to_string(&stage).unwrap();
            assert_eq!(json, format!("\"{}\"", stage.as_str()));
            let back: Stage = serde_json::from_str(&json).unwrap();
            assert_eq!(back, stage);
        }
    }

    #[test]
    fn company_validation_rejects_zero_investment() {
        let company = PortfolioCompany {
            id: "c1".into(),
            name: "Acme".into(),
            stage: Stage::Seed,
            invested: 0.0,
            ownership: 0.1,
        };
        assert!(company.validate().is_err());
    }
}
