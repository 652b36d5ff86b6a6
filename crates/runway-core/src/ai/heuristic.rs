//! Local rule-based insight generator
//!
//! Produces commentary from the structured summary without any network
//! call. Used when no LLM server is configured but insights are wanted.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::TrendDirection;

use super::types::{InsightBundle, InsightContext};
use super::InsightGenerator;

/// Savings rate at or above which the history counts as healthy
const HEALTHY_SAVINGS_RATE: f64 = 0.20;
/// Savings rate below which a recommendation is emitted
const LOW_SAVINGS_RATE: f64 = 0.10;
/// Share of income taken by recurring outflows that counts as a risk
const RECURRING_BURDEN_LIMIT: f64 = 0.5;

#[derive(Clone, Default)]
pub struct HeuristicBackend;

impl HeuristicBackend {
    pub fn new() -> Self {
        Self
    }

    /// Apply the rules to a context
    pub fn analyze(context: &InsightContext) -> InsightBundle {
        let mut bundle = InsightBundle::default();
        let summary = &context.summary;

        if summary.net_income < 0.0 {
            bundle.financial_risks.push(format!(
                "Spending exceeded income by ${:.0} over the analyzed period",
                summary.net_income.abs()
            ));
        }

        if summary.total_income > 0.0 {
            let savings_rate = summary.net_income / summary.total_income;
            if savings_rate >= HEALTHY_SAVINGS_RATE {
                bundle.strategic_insights.push(format!(
                    "You keep {:.0}% of income, a healthy savings rate",
                    savings_rate * 100.0
                ));
            } else if savings_rate < LOW_SAVINGS_RATE {
                bundle.recommendations.push(format!(
                    "Savings rate is {:.0}%; aim to keep 10-20% of income",
                    savings_rate.max(0.0) * 100.0
                ));
            }
        }

        if let Some(ref trend) = context.trend {
            match trend.direction {
                TrendDirection::Decreasing => bundle.financial_risks.push(format!(
                    "Monthly net flow is negative, averaging ${:.0} per month",
                    trend.monthly_mean.abs()
                )),
                TrendDirection::Increasing if trend.strength > 2.0 => {
                    bundle.strategic_insights.push(format!(
                        "Consistent positive net flow averaging ${:.0} per month",
                        trend.monthly_mean
                    ))
                }
                TrendDirection::Increasing => {}
            }
        }

        let recurring_outflow: f64 = context
            .recurring
            .iter()
            .filter(|r| r.monthly_amount < 0.0)
            .map(|r| r.monthly_amount.abs())
            .sum();
        let outflow_count = context
            .recurring
            .iter()
            .filter(|r| r.monthly_amount < 0.0)
            .count();

        if outflow_count > 0 {
            bundle.strategic_insights.push(format!(
                "{} recurring charges total about ${:.0} per month",
                outflow_count, recurring_outflow
            ));
            bundle.opportunities.push(
                "Review recurring charges for services you no longer use".to_string(),
            );
            if context.average_monthly_income > 0.0
                && recurring_outflow / context.average_monthly_income > RECURRING_BURDEN_LIMIT
            {
                bundle.financial_risks.push(format!(
                    "Recurring charges take {:.0}% of monthly income",
                    recurring_outflow / context.average_monthly_income * 100.0
                ));
            }
        }

        if context.seasonality_detected && !context.peak_expense_months.is_empty() {
            let months = context.peak_expense_months.join(", ");
            bundle
                .strategic_insights
                .push(format!("Spending peaks in {}", months));
            bundle
                .recommendations
                .push(format!("Set money aside ahead of {}", months));
        }

        if let Some(top) = context.top_expense_categories.first() {
            let months = summary.months_covered.max(1) as f64;
            bundle.opportunities.push(format!(
                "{} is the largest spending category; a 10% cut saves about ${:.0} per month",
                top.category,
                top.total / months * 0.1
            ));
        }

        if summary.months_covered < 6 {
            bundle.recommendations.push(
                "Add at least six months of history for more reliable projections".to_string(),
            );
        }

        bundle
    }
}

#[async_trait]
impl InsightGenerator for HeuristicBackend {
    async fn generate_insights(&self, context: &InsightContext) -> Result<InsightBundle> {
        Ok(Self::analyze(context))
    }

    async fn health_check(&self) -> bool {
        true
    }

    fn name(&self) -> &str {
        "heuristic"
    }
}
