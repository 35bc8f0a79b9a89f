//! Vencast models uncertain venture-portfolio outcomes by running many
//! independent randomized trials and summarizing the resulting distribution
//! of fund performance metrics.
//!
//! The crate is the simulation core only: a calibrated heavy-tailed return
//! sampler keyed by investment stage, a scenario generator that aggregates
//! per-company draws to fund-level trials, a statistics engine for
//! percentile/moment/confidence summaries, a risk engine for tail measures
//! (VaR, CVaR, downside deviation, Sharpe/Sortino, sampled max drawdown),
//! and a calibration service that derives sampler parameters from a fund's
//! own variance history. Persistence, HTTP, and scheduling live outside;
//! this core consumes read-only portfolio and history data through the
//! `calibration` ports and returns pure in-memory results.
//!
//! Design invariants:
//! - No process-wide random state. Every run owns a seeded base; every trial
//!   derives its own sub-stream, so identical configurations reproduce
//!   bit-identical distributions regardless of execution partitioning.
//! - No non-finite value ever reaches a report: inputs pass a three-tier
//!   validation gate before any work, and computed outputs pass finiteness
//!   post-checks that surface defects as `NonConvergentResult`.
//! - Per-trial edge cases (total loss, zero distributable proceeds) are
//!   domain outcomes expressed by the `-1.0` sentinel and ratio clamps,
//!   never errors caught mid-run.
//!
//! # Feature Flags
//! - `parallel`: enables rayon-sharded trial generation (default on). The
//!   sequential path produces bit-identical results.
//!
//! # Quick Start
//! Draw a stage-conditioned return sample:
//! ```rust
//! use rand::SeedableRng;
//! use rand::rngs::StdRng;
//! use vencast::core::Stage;
//! use vencast::sample::ReturnSampler;
//!
//! let sampler = ReturnSampler::stage_profile(10.0).unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//! let sample = sampler.sample(Stage::Seed, &mut rng);
//! assert!(sample.multiple >= 0.0 && sample.multiple <= 200.0);
//! ```
//!
//! Run a full simulation against an in-memory data source:
//! ```rust
//! use vencast::calibration::InMemoryDataSource;
//! use vencast::core::{PortfolioCompany, SimulationConfig, Stage};
//! use vencast::sim::run_simulation;
//!
//! let companies = vec![PortfolioCompany {
//!     id: "c1".into(),
//!     name: "Acme Robotics".into(),
//!     stage: Stage::Seed,
//!     invested: 1_000_000.0,
//!     ownership: 0.10,
//! }];
//! let data = InMemoryDataSource::new().with_portfolio("fund-1", companies);
//! let config = SimulationConfig::new("fund-1", 250, 10.0).with_seed(7);
//!
//! let result = run_simulation(config, &data).unwrap();
//! let p = &result.multiple.percentiles;
//! assert!(p.p5 <= p.p50 && p.p50 <= p.p95);
//! ```
//!
//! Summarize an arbitrary metric sample:
//! ```rust
//! use vencast::math::PerformanceDistribution;
//!
//! let dist =
//!     PerformanceDistribution::from_values((0..100).map(f64::from).collect()).unwrap();
//! assert_eq!(dist.percentiles.p50, 49.0);
//! ```

pub mod calibration;
pub mod core;
pub mod math;
pub mod risk;
pub mod sample;
pub mod sim;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::calibration::{
        CalibrationService, FundBaselineProvider, InMemoryDataSource, PortfolioInputProvider,
        VarianceHistoryProvider,
    };
    pub use crate::core::{
        FundBaseline, PortfolioCompany, SamplerKind, SimError, SimResult, SimulationConfig, Stage,
        VarianceReport,
    };
    pub use crate::math::PerformanceDistribution;
    pub use crate::risk::{RiskMetrics, RiskMetricsEngine};
    pub use crate::sample::{DistributionParameters, ReturnSample, ReturnSampler};
    pub use crate::sim::{
        MetricsSink, NoopSink, PortfolioTrial, RunPhase, ScenarioGenerator, SimulationResult,
        SimulationRun, run_simulation,
    };
}
