//! Calibration of sampler parameters from fund history.
//!
//! Defines the read-only collaborator ports (`FundBaselineProvider`,
//! `VarianceHistoryProvider`, `PortfolioInputProvider`), the
//! `CalibrationService` that turns variance history into
//! `DistributionParameters`, and an in-memory data source for tests and
//! embedding callers.

pub mod service;

pub use service::{
    CalibrationService, DEFAULT_MEAN_RETURN, DEFAULT_VOLATILITY, FundBaselineProvider,
    InMemoryDataSource, MAX_VARIANCE_REPORTS, MIN_REPORTS_FOR_CALIBRATION, PortfolioInputProvider,
    VarianceHistoryProvider, industry_default_parameters,
};
