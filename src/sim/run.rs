//! Simulation run orchestration.
//!
//! One `SimulationRun` walks the state machine
//! `Configuring -> Calibrating -> Sampling -> Aggregating -> Complete`,
//! with `Failed` and `Cancelled` as the terminal error states. No partial
//! result ever escapes a non-`Complete` run.
//!
//! The run owns its seeded random base and its trial array; nothing is
//! shared across concurrent runs. All collaborator I/O (baseline and
//! variance-history reads) happens during `Calibrating`, before sampling
//! starts; the sampling and statistics hot path is I/O-free.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::calibration::service::{
    CalibrationService, FundBaselineProvider, PortfolioInputProvider, VarianceHistoryProvider,
};
use crate::core::error::{SimError, SimResult};
use crate::core::types::{SamplerKind, SimulationConfig};
use crate::core::validate;
use crate::math::stats::PerformanceDistribution;
use crate::risk::metrics::{RiskMetrics, RiskMetricsEngine};
use crate::sample::sampler::ReturnSampler;
use crate::sim::scenario::{PortfolioTrial, ScenarioGenerator};
use crate::sim::sink::{MetricsSink, NoopSink};

/// Lifecycle of one simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunPhase {
    Configuring,
    Calibrating,
    Sampling,
    Aggregating,
    Complete,
    Failed,
    Cancelled,
}

/// Immutable outcome of one completed run.
///
/// `trials` keeps the raw per-trial outcomes in trial order, and every
/// distribution retains its sorted raw sample, so downstream consumers (a
/// reserve-allocation optimizer, a report layer) can re-slice the data
/// instead of working from summaries alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub simulation_id: String,
    pub config: SimulationConfig,
    pub created_at: DateTime<Utc>,
    pub trials: Vec<PortfolioTrial>,
    pub rate_of_return: PerformanceDistribution,
    pub multiple: PerformanceDistribution,
    pub distribution_ratio: PerformanceDistribution,
    pub total_value_ratio: PerformanceDistribution,
    pub total_value: PerformanceDistribution,
    pub risk_metrics: RiskMetrics,
}

impl SimulationResult {
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// One simulation execution with explicit phase tracking.
#[derive(Debug, Clone)]
pub struct SimulationRun {
    config: SimulationConfig,
    phase: RunPhase,
}

impl SimulationRun {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            phase: RunPhase::Configuring,
        }
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Executes the run against the given data source, reporting phase
    /// transitions and sampling progress through `sink`.
    pub fn execute<D>(&mut self, data: &D, sink: &dyn MetricsSink) -> SimResult<SimulationResult>
    where
        D: FundBaselineProvider + VarianceHistoryProvider + PortfolioInputProvider + ?Sized,
    {
        match self.execute_phases(data, sink) {
            Ok(result) => {
                self.transition(RunPhase::Complete, sink);
                Ok(result)
            }
            Err(err) => {
                let terminal = match err {
                    SimError::Cancelled { .. } => RunPhase::Cancelled,
                    _ => RunPhase::Failed,
                };
                self.transition(terminal, sink);
                Err(err)
            }
        }
    }

    fn transition(&mut self, phase: RunPhase, sink: &dyn MetricsSink) {
        self.phase = phase;
        sink.on_phase(phase);
    }

    fn execute_phases<D>(
        &mut self,
        data: &D,
        sink: &dyn MetricsSink,
    ) -> SimResult<SimulationResult>
    where
        D: FundBaselineProvider + VarianceHistoryProvider + PortfolioInputProvider + ?Sized,
    {
        self.transition(RunPhase::Configuring, sink);
        self.config.validate()?;

        let portfolio = data.portfolio_companies(&self.config.fund_id);
        validate::require_count("portfolio_size", portfolio.len(), 1, 10_000)?;
        for company in &portfolio {
            company.validate()?;
        }

        self.transition(RunPhase::Calibrating, sink);
        let holding_years = self.config.time_horizon_years;
        let sampler = match self.config.sampler {
            SamplerKind::StageProfile => ReturnSampler::stage_profile(holding_years)?,
            SamplerKind::Calibrated => {
                let params = CalibrationService::new(data, data)
                    .derive_parameters(&self.config.fund_id)?;
                ReturnSampler::calibrated(params, holding_years)?
            }
        };

        self.transition(RunPhase::Sampling, sink);
        let generator = ScenarioGenerator::from_config(&self.config, sampler)?;
        let trials = generator.run(&portfolio, sink)?;

        self.transition(RunPhase::Aggregating, sink);
        let rates: Vec<f64> = trials.iter().map(|t| t.rate_of_return).collect();
        let rate_of_return = PerformanceDistribution::from_values(rates.clone())?;
        let multiple =
            PerformanceDistribution::from_values(trials.iter().map(|t| t.multiple).collect())?;
        let distribution_ratio = PerformanceDistribution::from_values(
            trials.iter().map(|t| t.distribution_ratio).collect(),
        )?;
        let total_value_ratio = PerformanceDistribution::from_values(
            trials.iter().map(|t| t.total_value_ratio).collect(),
        )?;
        let total_value =
            PerformanceDistribution::from_values(trials.iter().map(|t| t.total_value).collect())?;

        let risk_metrics = RiskMetricsEngine::new()
            .with_risk_free_rate(self.config.risk_free_rate)
            .compute(&rates, self.config.time_horizon_years, self.config.random_seed)?;

        Ok(SimulationResult {
            simulation_id: format!(
                "sim-{}-{:016x}",
                self.config.fund_id, self.config.random_seed
            ),
            config: self.config.clone(),
            created_at: Utc::now(),
            trials,
            rate_of_return,
            multiple,
            distribution_ratio,
            total_value_ratio,
            total_value,
            risk_metrics,
        })
    }
}

/// Runs a simulation with the default (discarding) telemetry sink.
pub fn run_simulation<D>(config: SimulationConfig, data: &D) -> SimResult<SimulationResult>
where
    D: FundBaselineProvider + VarianceHistoryProvider + PortfolioInputProvider + ?Sized,
{
    SimulationRun::new(config).execute(data, &NoopSink)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::calibration::service::InMemoryDataSource;
    use crate::core::types::{PortfolioCompany, Stage};

    fn data_source() -> InMemoryDataSource {
        let companies: Vec<PortfolioCompany> = (0..10)
            .map(|i| PortfolioCompany {
                id: format!("c{i}"),
                name: format!("Company {i}"),
                stage: if i % 2 == 0 { Stage::Seed } else { Stage::SeriesA },
                invested: 2_000_000.0,
                ownership: 0.1,
            })
            .collect();
        InMemoryDataSource::new().with_portfolio("fund-1", companies)
    }

    fn config() -> SimulationConfig {
        SimulationConfig::new("fund-1", 500, 10.0)
            .with_seed(42)
            .with_portfolio_size(10)
    }

    #[test]
    fn complete_run_ends_in_the_complete_phase() {
        let data = data_source();
        let mut run = SimulationRun::new(config());
        let result = run.execute(&data, &NoopSink).unwrap();
        assert_eq!(run.phase(), RunPhase::Complete);
        assert_eq!(result.trials.len(), 500);
        assert_eq!(result.rate_of_return.sorted_values.len(), 500);
    }

    #[test]
    fn invalid_config_fails_without_sampling() {
        let data = data_source();
        let mut bad = config();
        bad.trials = 99;
        let mut run = SimulationRun::new(bad);
        assert!(run.execute(&data, &NoopSink).is_err());
        assert_eq!(run.phase(), RunPhase::Failed);
    }

    #[test]
    fn missing_portfolio_fails_during_configuration() {
        let data = InMemoryDataSource::new();
        let mut run = SimulationRun::new(config());
        assert!(matches!(
            run.execute(&data, &NoopSink),
            Err(SimError::OutOfRange {
                name: "portfolio_size",
                ..
            })
        ));
    }

    #[test]
    fn exhausted_budget_ends_in_the_cancelled_phase() {
        let data = data_source();
        let mut run = SimulationRun::new(config().with_time_budget_ms(0));
        assert!(matches!(
            run.execute(&data, &NoopSink),
            Err(SimError::Cancelled { .. })
        ));
        assert_eq!(run.phase(), RunPhase::Cancelled);
    }

    #[test]
    fn phases_are_reported_in_lifecycle_order() {
        struct Recorder(Mutex<Vec<RunPhase>>);
        impl MetricsSink for Recorder {
            fn on_phase(&self, phase: RunPhase) {
                self.0.lock().unwrap().push(phase);
            }
        }

        let data = data_source();
        let sink = Recorder(Mutex::new(Vec::new()));
        SimulationRun::new(config()).execute(&data, &sink).unwrap();
        let phases = sink.0.into_inner().unwrap();
        assert_eq!(
            phases,
            vec![
                RunPhase::Configuring,
                RunPhase::Calibrating,
                RunPhase::Sampling,
                RunPhase::Aggregating,
                RunPhase::Complete,
            ]
        );
    }

    #[test]
    fn result_serializes_to_json() {
        let data = data_source();
        let result = run_simulation(config(), &data).unwrap();
        let json = result.to_json_pretty().unwrap();
        assert!(json.contains("\"simulation_id\""));
        assert!(json.contains("\"risk_metrics\""));
        let back: SimulationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
