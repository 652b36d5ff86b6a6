//! Projection engine
//!
//! Builds one balance projection per configured horizon:
//!
//! 1. A deterministic month-by-month walk from the current balance. Each
//!    month adds the base monthly net flow scaled by a trend multiplier and
//!    the seasonal multiplier of that calendar month.
//! 2. A Monte Carlo uncertainty model around the walk's end point.
//! 3. A statistical band from the trend's confidence interval.
//! 4. A heuristic confidence score.
//!
//! The base monthly net flow is the recurring patterns' monthly net plus the
//! average residual flow of everything else. Without recurring patterns it
//! falls back to a twelfth of the history's net income.

pub mod monte_carlo;

use std::collections::HashSet;

use chrono::{Datelike, NaiveDate};
use tracing::{debug, warn};

use crate::config::{ForecastConfig, ProjectionConfig};
use crate::error::{Error, Result};
use crate::models::{
    Projection, ScenarioVariant, StatisticalBand, Summary, Transaction, TrendEstimate,
};
use crate::normalize::summarize;
use crate::patterns::{group_key, PatternAnalysis, PatternAnalyzer};

pub use monte_carlo::{derive_seed, horizon_rng, simulate};

/// How the base monthly net flow was derived
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BaseFlow {
    pub monthly: f64,
    pub recurring: f64,
    pub residual: f64,
    /// True when no recurring patterns were available
    pub fallback: bool,
}

/// Projections for the horizons that succeeded plus the ones that failed
#[derive(Debug)]
pub struct ProjectionReport {
    pub projections: Vec<Projection>,
    pub issues: Vec<Error>,
}

/// Projects balances over the configured horizons
pub struct ProjectionEngine<'a> {
    config: &'a ForecastConfig,
}

impl<'a> ProjectionEngine<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self { config }
    }

    /// Project every configured horizon
    ///
    /// A horizon that cannot be projected is reported in `issues` and the
    /// others are kept. Only an empty history is an error.
    pub fn project(
        &self,
        summary: &Summary,
        transactions: &[Transaction],
        analysis: &PatternAnalysis,
    ) -> Result<ProjectionReport> {
        let last_date = match (summary.date_range, transactions.is_empty()) {
            (Some(range), false) => range.end,
            _ => {
                return Err(Error::InsufficientData(
                    "no transactions to project from".into(),
                ))
            }
        };

        let base = self.base_flow(summary, transactions, analysis);
        let trend_shift = trend_shift(
            analysis.trend.as_ref(),
            base.monthly,
            self.config.projection.max_monthly_trend_shift,
        );
        debug!(
            base = base.monthly,
            recurring = base.recurring,
            residual = base.residual,
            trend_shift,
            "Projection inputs"
        );

        let mut horizons = self.config.horizons.clone();
        horizons.sort_unstable();
        horizons.dedup();

        let mut report = ProjectionReport {
            projections: Vec::with_capacity(horizons.len()),
            issues: Vec::new(),
        };
        for h in horizons {
            match self.project_horizon(h, summary, last_date, &base, trend_shift, analysis) {
                Ok(projection) => report.projections.push(projection),
                Err(e) => {
                    warn!(horizon = h, error = %e, "Horizon skipped");
                    report.issues.push(e);
                }
            }
        }
        Ok(report)
    }

    fn project_horizon(
        &self,
        horizon: u32,
        summary: &Summary,
        last_date: NaiveDate,
        base: &BaseFlow,
        trend_shift: f64,
        analysis: &PatternAnalysis,
    ) -> Result<Projection> {
        if horizon == 0 {
            return Err(Error::Computation(
                "horizon must be at least one month".into(),
            ));
        }
        let increments = walk(
            base.monthly,
            trend_shift,
            horizon,
            last_date,
            |month0| analysis.seasonality.multiplier_for(month0),
        );
        let projected_balance = summary.current_balance + increments.iter().sum::<f64>();

        let p = &self.config.projection;
        let volatility = p.base_volatility + p.volatility_per_month * horizon as f64;
        let mut rng = horizon_rng(self.config.seed, horizon);
        let uncertainty_model = simulate(
            projected_balance,
            volatility,
            self.config.monte_carlo_samples,
            &mut rng,
        )?;

        let statistical_band = match analysis.trend {
            Some(ref trend) => {
                let half = trend.confidence_interval.half_width() * horizon as f64;
                StatisticalBand {
                    lower: projected_balance - half,
                    upper: projected_balance + half,
                }
            }
            None => StatisticalBand {
                lower: uncertainty_model.percentiles.p5,
                upper: uncertainty_model.percentiles.p95,
            },
        };

        let confidence = confidence_score(
            p,
            horizon,
            analysis.recurring.len(),
            analysis.seasonality.detected,
            analysis.trend_strength(),
        );

        Ok(Projection {
            horizon_months: horizon,
            projected_balance,
            monthly_change: (projected_balance - summary.current_balance) / horizon as f64,
            monthly_increments: increments,
            uncertainty_model,
            statistical_band,
            confidence,
            assumptions: self.assumptions(base, trend_shift, analysis, volatility),
        })
    }

    /// Base monthly net flow for a history
    pub fn base_flow(
        &self,
        summary: &Summary,
        transactions: &[Transaction],
        analysis: &PatternAnalysis,
    ) -> BaseFlow {
        if analysis.recurring.is_empty() {
            return BaseFlow {
                monthly: summary.net_income / 12.0,
                recurring: 0.0,
                residual: 0.0,
                fallback: true,
            };
        }

        let recurring_keys: HashSet<&str> = analysis
            .recurring
            .iter()
            .map(|p| p.group_key.as_str())
            .collect();
        let residual_total: f64 = transactions
            .iter()
            .filter(|tx| !recurring_keys.contains(group_key(tx, &self.config.recurring).as_str()))
            .map(|tx| tx.amount)
            .sum();
        let residual = residual_total / summary.months_covered.max(1) as f64;
        let recurring = analysis.recurring_monthly_net();

        BaseFlow {
            monthly: recurring + residual,
            recurring,
            residual,
            fallback: false,
        }
    }

    /// Expected net flow of the month after a history
    ///
    /// Runs the analyses on `transactions` alone; used by the back-tester.
    pub fn expected_monthly_flow(&self, transactions: &[Transaction]) -> Result<f64> {
        let summary = summarize(transactions);
        let last_date = summary
            .date_range
            .map(|r| r.end)
            .ok_or_else(|| Error::InsufficientData("no transactions to project from".into()))?;

        let analysis = PatternAnalyzer::new(self.config).analyze(transactions).analysis;
        let base = self.base_flow(&summary, transactions, &analysis);
        let shift = trend_shift(
            analysis.trend.as_ref(),
            base.monthly,
            self.config.projection.max_monthly_trend_shift,
        );
        let increments = walk(base.monthly, shift, 1, last_date, |month0| {
            analysis.seasonality.multiplier_for(month0)
        });
        Ok(increments.iter().sum())
    }

    fn assumptions(
        &self,
        base: &BaseFlow,
        trend_shift: f64,
        analysis: &PatternAnalysis,
        volatility: f64,
    ) -> Vec<String> {
        let mut out = Vec::new();
        if base.fallback {
            out.push(format!(
                "No recurring patterns found; base monthly net flow of ${:.2} is the historical net income spread over 12 months",
                base.monthly
            ));
        } else {
            out.push(format!(
                "Base monthly net flow of ${:.2} from {} recurring patterns (${:.2}) and other activity (${:.2})",
                base.monthly,
                analysis.recurring.len(),
                base.recurring,
                base.residual
            ));
        }
        if trend_shift != 0.0 {
            out.push(format!(
                "Trend adjustment reaches {:+.1}% by the end of the horizon",
                trend_shift * 100.0
            ));
        } else if analysis.trend.is_none() {
            out.push("Not enough months of history for a trend adjustment".to_string());
        }
        if analysis.seasonality.detected {
            out.push("Calendar-month seasonal multipliers applied".to_string());
        } else {
            out.push("No seasonal adjustment".to_string());
        }
        out.push(format!(
            "Monte Carlo: {} samples with {:.0}% relative volatility",
            self.config.monte_carlo_samples,
            volatility * 100.0
        ));
        out
    }

    /// Percentile-based variants at the scenario horizon
    pub fn scenario_variants(&self, projections: &[Projection]) -> Vec<ScenarioVariant> {
        let horizon = self.config.effective_scenario_horizon();
        let Some(base) = projections.iter().find(|p| p.horizon_months == horizon) else {
            return Vec::new();
        };
        let pct = &base.uncertainty_model.percentiles;
        let variant = |name: &str, balance: f64, factor: f64| ScenarioVariant {
            name: name.to_string(),
            horizon_months: horizon,
            projected_balance: balance,
            confidence: base.confidence * factor,
        };
        vec![
            variant("optimistic", pct.p75, 0.8),
            variant("pessimistic", pct.p25, 0.8),
            variant("bestCase", pct.p95, 0.6),
            variant("worstCase", pct.p5, 0.6),
        ]
    }
}

/// Relative gap between the trend mean and the base flow, clamped
///
/// Zero when there is no trend or the base flow is zero.
pub fn trend_shift(trend: Option<&TrendEstimate>, base_monthly: f64, max_shift: f64) -> f64 {
    match trend {
        Some(t) if base_monthly.abs() > f64::EPSILON => {
            let r = (t.mean - base_monthly) / base_monthly.abs();
            if r.is_finite() {
                r.clamp(-max_shift, max_shift)
            } else {
                0.0
            }
        }
        _ => 0.0,
    }
}

/// Monthly increments for `horizon` months after `last_date`
fn walk<F>(base_monthly: f64, trend_shift: f64, horizon: u32, last_date: NaiveDate, seasonal: F) -> Vec<f64>
where
    F: Fn(u32) -> f64,
{
    let start = last_date.month0();
    (1..=horizon)
        .map(|m| {
            let trend = 1.0 + trend_shift * (m as f64 / horizon as f64);
            let month0 = (start + m) % 12;
            base_monthly * trend * seasonal(month0)
        })
        .collect()
}

/// Heuristic confidence for a horizon
pub fn confidence_score(
    config: &ProjectionConfig,
    horizon: u32,
    pattern_count: usize,
    seasonality_detected: bool,
    trend_strength: f64,
) -> f64 {
    let mut score = config.base_confidence - config.confidence_decay_per_month * horizon as f64;
    score += (config.pattern_confidence_bonus * pattern_count as f64).min(config.pattern_confidence_cap);
    if seasonality_detected {
        score += config.seasonality_bonus;
    }
    if trend_strength > config.trend_strength_threshold {
        score += config.trend_bonus;
    }
    score.clamp(config.min_confidence, config.max_confidence)
}
