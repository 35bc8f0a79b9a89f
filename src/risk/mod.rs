//! Tail-risk analytics over per-trial outcome arrays.
//!
//! This module wires and re-exports:
//! - `metrics`: VaR/CVaR, probability of loss, downside deviation, and
//!   risk-adjusted ratios,
//! - `drawdown`: the sampled maximum-drawdown secondary simulation.

pub mod drawdown;
pub mod metrics;

pub use drawdown::{QUARTERS_PER_YEAR, sampled_max_drawdown};
pub use metrics::{
    DEFAULT_DRAWDOWN_PATHS, DEFAULT_RISK_FREE_RATE, DownsideRisk, RiskMetrics, RiskMetricsEngine,
    conditional_value_at_risk, downside_risk, probability_of_loss, value_at_risk,
};
