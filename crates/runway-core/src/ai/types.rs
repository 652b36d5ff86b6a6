//! Insight generator request/response types
//!
//! These types are backend-agnostic and used across all implementations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::models::{Frequency, Summary, Transaction, TrendDirection};
use crate::patterns::PatternAnalysis;

const MONTH_NAMES: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Name of a zero-based calendar month
pub fn month_name(month0: u32) -> &'static str {
    MONTH_NAMES.get(month0 as usize).copied().unwrap_or("Unknown")
}

/// Structured financial summary sent to the insight generator
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightContext {
    pub summary: Summary,
    pub average_monthly_income: f64,
    pub average_monthly_expenses: f64,
    pub seasonality_detected: bool,
    pub peak_income_months: Vec<String>,
    pub peak_expense_months: Vec<String>,
    pub recurring: Vec<RecurringSummary>,
    pub trend: Option<TrendSummary>,
    pub top_expense_categories: Vec<CategoryTotal>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringSummary {
    pub description: String,
    pub monthly_amount: f64,
    pub frequency: Frequency,
    pub confidence: f64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub monthly_mean: f64,
    pub direction: TrendDirection,
    pub strength: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

impl InsightContext {
    /// Assemble the context from the normalized history and its patterns
    pub fn build(summary: &Summary, transactions: &[Transaction], analysis: &PatternAnalysis) -> Self {
        let months = summary.months_covered.max(1) as f64;

        let mut by_category: HashMap<&str, f64> = HashMap::new();
        for tx in transactions.iter().filter(|t| t.amount < 0.0) {
            *by_category.entry(tx.category.as_str()).or_insert(0.0) += tx.amount.abs();
        }
        let mut top_expense_categories: Vec<CategoryTotal> = by_category
            .into_iter()
            .map(|(category, total)| CategoryTotal {
                category: category.to_string(),
                total,
            })
            .collect();
        top_expense_categories.sort_by(|a, b| {
            b.total
                .total_cmp(&a.total)
                .then_with(|| a.category.cmp(&b.category))
        });
        top_expense_categories.truncate(5);

        let recurring = analysis
            .recurring
            .iter()
            .map(|p| RecurringSummary {
                description: p
                    .transactions
                    .first()
                    .map(|t| t.description.clone())
                    .unwrap_or_else(|| p.group_key.clone()),
                monthly_amount: p.monthly_amount,
                frequency: p.frequency,
                confidence: p.confidence,
            })
            .collect();

        let names = |months: &[u32]| months.iter().map(|m| month_name(*m).to_string()).collect();

        Self {
            summary: summary.clone(),
            average_monthly_income: summary.total_income / months,
            average_monthly_expenses: summary.total_expenses / months,
            seasonality_detected: analysis.seasonality.detected,
            peak_income_months: names(&analysis.seasonality.peak_income_months),
            peak_expense_months: names(&analysis.seasonality.peak_expense_months),
            recurring,
            trend: analysis.trend.as_ref().map(|t| TrendSummary {
                monthly_mean: t.mean,
                direction: t.direction,
                strength: t.strength,
            }),
            top_expense_categories,
        }
    }
}

/// Qualitative commentary returned by an insight generator
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightBundle {
    #[serde(default)]
    pub strategic_insights: Vec<String>,
    #[serde(default)]
    pub financial_risks: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl InsightBundle {
    pub fn total_count(&self) -> usize {
        self.strategic_insights.len()
            + self.financial_risks.len()
            + self.opportunities.len()
            + self.recommendations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }
}
