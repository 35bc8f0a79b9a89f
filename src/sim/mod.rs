//! Scenario generation and run orchestration.
//!
//! This module wires and re-exports:
//! - `scenario`: the trial loop (`ScenarioGenerator`, `PortfolioTrial`),
//! - `run`: the run state machine and result assembly (`SimulationRun`,
//!   `SimulationResult`, `run_simulation`),
//! - `sink`: the injected telemetry port (`MetricsSink`, `NoopSink`).

pub mod run;
pub mod scenario;
pub mod sink;

pub use run::{RunPhase, SimulationResult, SimulationRun, run_simulation};
pub use scenario::{MIN_EFFECTIVE_YEARS, PortfolioTrial, ScenarioGenerator};
pub use sink::{MetricsSink, NoopSink};
