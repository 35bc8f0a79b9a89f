//! Shared domain types, library-wide errors, and the input validation gate.
//!
//! This module wires and re-exports:
//! - `error`: typed failure kinds and the `SimResult` alias,
//! - `validate`: the three-tier validation gate applied at every public
//!   entry point, plus post-computation finiteness checks,
//! - `types`: stable serde payloads (stages, companies, config, collaborator
//!   records).
//!
//! It is intentionally a facade: domain logic lives in submodules, while this
//! file defines the public import surface (`vencast::core::*`).

pub mod error;
pub mod types;
pub mod validate;

pub use error::{SimError, SimResult};
pub use types::{
    FundBaseline, PortfolioCompany, SamplerKind, SimulationConfig, Stage, TRIALS_MAX, TRIALS_MIN,
    VarianceReport,
};
pub use validate::Bounds;
