//! Numerical building blocks for the simulation pipeline.
//!
//! Currently a single concern: `stats`, the distribution-summary engine
//! (percentiles, moments, confidence bands) that both the reporting layer
//! and the risk engine are built on.

pub mod stats;

pub use stats::{
    ConfidenceInterval, ConfidenceIntervals, MIN_DISPERSION, Percentiles,
    PerformanceDistribution, SummaryStatistics, mean_of, percentile, sample_std_dev,
    sample_variance, standardized_moments,
};
