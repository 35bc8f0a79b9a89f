//! Fund-specific distribution calibration.
//!
//! Derives `DistributionParameters` from a fund's own variance history
//! instead of static industry defaults whenever enough history exists:
//! - fewer than `MIN_REPORTS_FOR_CALIBRATION` reports: conservative industry
//!   defaults,
//! - otherwise: volatility is the sample standard deviation of the variance
//!   series, and the mean is the fund's current baseline metric value.
//!
//! Reads go through read-only collaborator ports; nothing here performs I/O
//! itself, so calibration is safe under concurrent access from independent
//! runs. Parameters are derived fresh on every invocation; there is no
//! cross-run cache to go stale.

use std::collections::HashMap;

use crate::core::error::SimResult;
use crate::core::types::{FundBaseline, PortfolioCompany, VarianceReport};
use crate::core::validate::require_finite;
use crate::math::stats::sample_std_dev;
use crate::sample::sampler::DistributionParameters;

/// Maximum number of most-recent variance reports consulted per derivation.
pub const MAX_VARIANCE_REPORTS: usize = 30;

/// Below this report count the service falls back to industry defaults.
pub const MIN_REPORTS_FOR_CALIBRATION: usize = 3;

/// Conservative industry-default mean annual return.
pub const DEFAULT_MEAN_RETURN: f64 = 0.15;

/// Conservative industry-default annual volatility.
pub const DEFAULT_VOLATILITY: f64 = 0.30;

/// Returns a fund's active baseline metrics.
pub trait FundBaselineProvider {
    fn active_baseline(&self, fund_id: &str) -> Option<FundBaseline>;
}

/// Returns up to `limit` most recent variance reports for a
/// `(fund, baseline)` pair, ordered descending by date.
pub trait VarianceHistoryProvider {
    fn recent_reports(&self, fund_id: &str, baseline_id: &str, limit: usize) -> Vec<VarianceReport>;
}

/// Returns the fund's portfolio companies.
pub trait PortfolioInputProvider {
    fn portfolio_companies(&self, fund_id: &str) -> Vec<PortfolioCompany>;
}

/// Static industry-default parameters.
pub fn industry_default_parameters() -> DistributionParameters {
    DistributionParameters {
        mean: DEFAULT_MEAN_RETURN,
        volatility: DEFAULT_VOLATILITY,
    }
}

/// Derives distribution parameters for one run.
pub struct CalibrationService<'a, B: ?Sized, V: ?Sized> {
    baselines: &'a B,
    history: &'a V,
}

impl<'a, B, V> CalibrationService<'a, B, V>
where
    B: FundBaselineProvider + ?Sized,
    V: VarianceHistoryProvider + ?Sized,
{
    pub fn new(baselines: &'a B, history: &'a V) -> Self {
        Self { baselines, history }
    }

    /// Resolves parameters for `fund_id`, falling back to industry defaults
    /// when no baseline exists or history is too thin.
    pub fn derive_parameters(&self, fund_id: &str) -> SimResult<DistributionParameters> {
        let baseline = match self.baselines.active_baseline(fund_id) {
            Some(b) => b,
            None => return Ok(industry_default_parameters()),
        };
        let mean = require_finite("baseline.metric_value", baseline.metric_value)?;

        let reports =
            self.history
                .recent_reports(fund_id, &baseline.baseline_id, MAX_VARIANCE_REPORTS);
        if reports.len() < MIN_REPORTS_FOR_CALIBRATION {
            return Ok(industry_default_parameters());
        }

        let series = reports
            .iter()
            .map(|r| require_finite("report.variance", r.variance))
            .collect::<SimResult<Vec<f64>>>()?;
        let volatility = sample_std_dev(&series)?;

        let params = DistributionParameters { mean, volatility };
        params.validate()?;
        Ok(params)
    }
}

/// In-memory data source implementing all three collaborator ports.
///
/// Used as the test double and as the adapter target for embedding callers
/// that already hold their data in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryDataSource {
    baselines: HashMap<String, FundBaseline>,
    reports: HashMap<(String, String), Vec<VarianceReport>>,
    portfolios: HashMap<String, Vec<PortfolioCompany>>,
}

impl InMemoryDataSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_baseline(mut self, baseline: FundBaseline) -> Self {
        self.baselines.insert(baseline.fund_id.clone(), baseline);
        self
    }

    pub fn with_reports(
        mut self,
        fund_id: &str,
        baseline_id: &str,
        reports: Vec<VarianceReport>,
    ) -> Self {
        self.reports
            .insert((fund_id.to_string(), baseline_id.to_string()), reports);
        self
    }

    pub fn with_portfolio(mut self, fund_id: &str, companies: Vec<PortfolioCompany>) -> Self {
        self.portfolios.insert(fund_id.to_string(), companies);
        self
    }
}

impl FundBaselineProvider for InMemoryDataSource {
    fn active_baseline(&self, fund_id: &str) -> Option<FundBaseline> {
        self.baselines.get(fund_id).cloned()
    }
}

impl VarianceHistoryProvider for InMemoryDataSource {
    fn recent_reports(&self, fund_id: &str, baseline_id: &str, limit: usize) -> Vec<VarianceReport> {
        let mut reports = self
            .reports
            .get(&(fund_id.to_string(), baseline_id.to_string()))
            .cloned()
            .unwrap_or_default();
        reports.sort_by(|a, b| b.as_of.cmp(&a.as_of));
        reports.truncate(limit);
        reports
    }
}

impl PortfolioInputProvider for InMemoryDataSource {
    fn portfolio_companies(&self, fund_id: &str) -> Vec<PortfolioCompany> {
        self.portfolios.get(fund_id).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use chrono::NaiveDate;

    use super::*;
    use crate::core::error::SimError;

    fn report(year: i32, month: u32, variance: f64) -> VarianceReport {
        VarianceReport {
            as_of: NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
            variance,
        }
    }

    fn baseline() -> FundBaseline {
        FundBaseline {
            baseline_id: "bl-1".into(),
            fund_id: "fund-1".into(),
            metric_value: 0.18,
        }
    }

    #[test]
    fn missing_baseline_falls_back_to_defaults() {
        let source = InMemoryDataSource::new();
        let service = CalibrationService::new(&source, &source);
        let params = service.derive_parameters("fund-1").unwrap();
        assert_eq!(params, industry_default_parameters());
    }

    #[test]
    fn fewer_than_three_reports_falls_back_to_defaults() {
        let source = InMemoryDataSource::new()
            .with_baseline(baseline())
            .with_reports(
                "fund-1",
                "bl-1",
                vec![report(2026, 1, 0.02), report(2026, 2, 0.03)],
            );
        let service = CalibrationService::new(&source, &source);
        let params = service.derive_parameters("fund-1").unwrap();
        assert_eq!(params, industry_default_parameters());
    }

    #[test]
    fn sufficient_history_derives_fund_specific_parameters() {
        let source = InMemoryDataSource::new()
            .with_baseline(baseline())
            .with_reports(
                "fund-1",
                "bl-1",
                vec![
                    report(2026, 1, 0.10),
                    report(2026, 2, 0.20),
                    report(2026, 3, 0.30),
                    report(2026, 4, 0.40),
                ],
            );
        let service = CalibrationService::new(&source, &source);
        let params = service.derive_parameters("fund-1").unwrap();
        assert_relative_eq!(params.mean, 0.18, epsilon = 1.0e-12);
        // sample std dev of {0.1, 0.2, 0.3, 0.4}
        assert_relative_eq!(
            params.volatility,
            (0.05_f64 / 3.0).sqrt(),
            epsilon = 1.0e-12
        );
    }

    #[test]
    fn non_finite_history_is_rejected_before_derivation() {
        let source = InMemoryDataSource::new()
            .with_baseline(baseline())
            .with_reports(
                "fund-1",
                "bl-1",
                vec![
                    report(2026, 1, 0.10),
                    report(2026, 2, f64::NAN),
                    report(2026, 3, 0.30),
                ],
            );
        let service = CalibrationService::new(&source, &source);
        assert!(matches!(
            service.derive_parameters("fund-1"),
            Err(SimError::NonFiniteValue { .. })
        ));
    }

    #[test]
    fn report_window_caps_at_thirty_most_recent() {
        let reports: Vec<VarianceReport> = (0..40)
            .map(|i| report(2020 + (i / 12), 1 + (i % 12) as u32, 0.01 * i as f64))
            .collect();
        let source = InMemoryDataSource::new().with_reports("fund-1", "bl-1", reports);
        let recent = source.recent_reports("fund-1", "bl-1", MAX_VARIANCE_REPORTS);
        assert_eq!(recent.len(), 30);
        // descending by date
        for pair in recent.windows(2) {
            assert!(pair[0].as_of >= pair[1].as_of);
        }
    }
}
