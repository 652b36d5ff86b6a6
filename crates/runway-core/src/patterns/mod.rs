//! Pattern analyzer
//!
//! Runs the deterministic analyses over a normalized history:
//!
//! - **Seasonality** - calendar-month income/expense indices
//! - **Recurring** - transactions repeating at a steady interval and amount
//! - **Trend** - monthly net flow with a confidence interval
//!
//! Each analysis degrades independently: an analysis that lacks data is
//! reported as an issue and left empty, the others still run.

pub mod recurring;
pub mod seasonality;
pub mod trend;

pub use recurring::{group_key, mine_recurring, normalize_description};
pub use seasonality::detect_seasonality;
pub use trend::{estimate_trend, monthly_net_flows, MonthlyFlow, TREND_STRENGTH_CAP};

use serde::Serialize;

use crate::config::ForecastConfig;
use crate::error::Error;
use crate::models::{RecurringPattern, SeasonalProfile, Transaction, TrendEstimate};

/// Combined output of the deterministic analyses
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PatternAnalysis {
    pub seasonality: SeasonalProfile,
    pub recurring: Vec<RecurringPattern>,
    pub trend: Option<TrendEstimate>,
    pub monthly_flows: Vec<MonthlyFlow>,
}

impl PatternAnalysis {
    /// Net monthly amount contributed by all recurring patterns
    pub fn recurring_monthly_net(&self) -> f64 {
        self.recurring.iter().map(|p| p.monthly_amount).sum()
    }

    pub fn trend_strength(&self) -> f64 {
        self.trend.as_ref().map(|t| t.strength).unwrap_or(0.0)
    }
}

/// Pattern analysis plus the analyses that had to be skipped
#[derive(Debug)]
pub struct PatternReport {
    pub analysis: PatternAnalysis,
    pub issues: Vec<Error>,
}

/// Runs seasonality, recurring and trend analysis with one configuration
pub struct PatternAnalyzer<'a> {
    config: &'a ForecastConfig,
}

impl<'a> PatternAnalyzer<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Analyze date-sorted transactions
    pub fn analyze(&self, transactions: &[Transaction]) -> PatternReport {
        let mut issues = Vec::new();

        let seasonality =
            match detect_seasonality(transactions, self.config.seasonality.threshold) {
                Ok(profile) => profile,
                Err(e) => {
                    tracing::debug!(error = %e, "Seasonality skipped");
                    issues.push(e);
                    SeasonalProfile::neutral()
                }
            };

        let recurring = mine_recurring(transactions, &self.config.recurring);

        let monthly_flows = monthly_net_flows(transactions);
        let trend = match trend::estimate_from_flows(&monthly_flows, self.config.confidence_level)
        {
            Ok(t) => Some(t),
            Err(e) => {
                tracing::debug!(error = %e, "Trend estimation skipped");
                issues.push(e);
                None
            }
        };

        PatternReport {
            analysis: PatternAnalysis {
                seasonality,
                recurring,
                trend,
                monthly_flows,
            },
            issues,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrendDirection;
    use chrono::NaiveDate;

    #[test]
    fn test_analyze_linear_growth() {
        let config = ForecastConfig::default();
        let mut txs = Vec::new();
        for m in 1..=6 {
            txs.push(Transaction::new(
                NaiveDate::from_ymd_opt(2024, m, 1).unwrap(),
                "PAYROLL",
                3000.0,
                "Salary",
            ));
            txs.push(Transaction::new(
                NaiveDate::from_ymd_opt(2024, m, 10).unwrap(),
                "RENT",
                -2900.0,
                "Housing",
            ));
        }

        let report = PatternAnalyzer::new(&config).analyze(&txs);
        assert!(report.issues.is_empty());
        let analysis = report.analysis;
        assert!(!analysis.seasonality.detected);
        assert_eq!(
            analysis.trend.as_ref().unwrap().direction,
            TrendDirection::Increasing
        );
        assert_eq!(analysis.recurring.len(), 2);
        assert!((analysis.recurring_monthly_net() - 100.0).abs() < 5.0);
    }

    #[test]
    fn test_analyze_empty_reports_issues() {
        let config = ForecastConfig::default();
        let report = PatternAnalyzer::new(&config).analyze(&[]);
        assert_eq!(report.issues.len(), 2);
        assert!(report.analysis.trend.is_none());
        assert!(report.analysis.recurring.is_empty());
        assert!(!report.analysis.seasonality.detected);
    }
}
