//! Domain models for Runway

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A raw transaction record as received from the history provider
///
/// Every field is optional and loosely typed; the normalizer decides
/// which records are usable.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawTransaction {
    #[serde(default)]
    pub date: Option<Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

impl RawTransaction {
    /// Convenience constructor for well-formed records
    pub fn new(date: &str, description: &str, amount: f64, category: &str) -> Self {
        Self {
            date: Some(Value::String(date.to_string())),
            description: Some(description.to_string()),
            amount: serde_json::Number::from_f64(amount).map(Value::Number),
            category: Some(category.to_string()),
            kind: None,
        }
    }
}

/// Transaction type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Income,
    Expense,
    Transfer,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
            Self::Transfer => "transfer",
        }
    }

    /// Derive the type from the sign of an amount (income positive)
    pub fn from_amount(amount: f64) -> Self {
        if amount >= 0.0 {
            Self::Income
        } else {
            Self::Expense
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "income" | "credit" | "deposit" => Ok(Self::Income),
            "expense" | "debit" | "sale" | "payment" => Ok(Self::Expense),
            "transfer" => Ok(Self::Transfer),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A validated transaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    /// Signed amount, income positive
    pub amount: f64,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn new(date: NaiveDate, description: &str, amount: f64, category: &str) -> Self {
        Self {
            date,
            description: description.to_string(),
            amount,
            category: category.to_string(),
            kind: TransactionType::from_amount(amount),
        }
    }

    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }
}

/// Inclusive date range
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Baseline summary statistics over the normalized history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub total_income: f64,
    /// Absolute value of all outflows
    pub total_expenses: f64,
    pub net_income: f64,
    /// Sum of all signed amounts
    pub current_balance: f64,
    pub date_range: Option<DateRange>,
    pub transaction_count: usize,
    /// Distinct calendar months spanned by the date range
    pub months_covered: u32,
}

impl Summary {
    pub fn is_empty(&self) -> bool {
        self.transaction_count == 0
    }
}

/// Classification of a calendar month in the seasonal profile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonthClassification {
    Peak,
    Normal,
    Low,
    NoData,
}

/// Seasonal indices for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthlySeasonality {
    /// 0 = January
    pub month: u32,
    pub income_index: f64,
    pub expense_index: f64,
    pub classification: MonthClassification,
}

impl MonthlySeasonality {
    /// Multiplier applied to a projected month
    pub fn multiplier(&self) -> f64 {
        (self.income_index + self.expense_index) / 2.0
    }
}

/// Seasonal profile across the twelve calendar months
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonalProfile {
    pub months: Vec<MonthlySeasonality>,
    pub detected: bool,
    pub peak_income_months: Vec<u32>,
    pub peak_expense_months: Vec<u32>,
}

impl SeasonalProfile {
    /// A profile with every index at 1.0
    pub fn neutral() -> Self {
        Self {
            months: (0..12)
                .map(|month| MonthlySeasonality {
                    month,
                    income_index: 1.0,
                    expense_index: 1.0,
                    classification: MonthClassification::NoData,
                })
                .collect(),
            detected: false,
            peak_income_months: Vec::new(),
            peak_expense_months: Vec::new(),
        }
    }

    /// Seasonal multiplier for a zero-based calendar month
    pub fn multiplier_for(&self, month0: u32) -> f64 {
        if !self.detected {
            return 1.0;
        }
        self.months
            .iter()
            .find(|m| m.month == month0)
            .map(|m| m.multiplier())
            .filter(|m| m.is_finite())
            .unwrap_or(1.0)
    }
}

/// Cadence of a recurring pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    Yearly,
    Irregular,
}

impl Frequency {
    /// Classify an average interval in days
    pub fn from_interval(days: f64) -> Self {
        match days {
            d if (5.0..10.0).contains(&d) => Self::Weekly,
            d if (10.0..20.0).contains(&d) => Self::Biweekly,
            d if (20.0..45.0).contains(&d) => Self::Monthly,
            d if (75.0..110.0).contains(&d) => Self::Quarterly,
            d if (330.0..400.0).contains(&d) => Self::Yearly,
            _ => Self::Irregular,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Weekly => "weekly",
            Self::Biweekly => "biweekly",
            Self::Monthly => "monthly",
            Self::Quarterly => "quarterly",
            Self::Yearly => "yearly",
            Self::Irregular => "irregular",
        }
    }
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A cluster of transactions recurring at a near-constant interval and amount
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurringPattern {
    pub group_key: String,
    pub transactions: Vec<Transaction>,
    pub average_interval_days: f64,
    /// Signed average amount
    pub average_amount: f64,
    pub confidence: f64,
    pub frequency: Frequency,
    /// Signed amount normalized to an average month
    pub monthly_amount: f64,
}

/// Direction of the monthly net-flow trend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Increasing => "increasing",
            Self::Decreasing => "decreasing",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceInterval {
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceInterval {
    pub fn half_width(&self) -> f64 {
        (self.upper - self.lower) / 2.0
    }
}

/// Monthly net-flow trend with confidence bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendEstimate {
    pub mean: f64,
    pub standard_error: f64,
    pub confidence_interval: ConfidenceInterval,
    pub confidence_level: f64,
    pub direction: TrendDirection,
    /// |mean| / standard error, capped
    pub strength: f64,
    pub months_observed: usize,
}

/// Percentiles of the simulated balance distribution
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentiles {
    pub p5: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
    pub p95: f64,
}

/// Monte Carlo uncertainty model for one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UncertaintyModel {
    pub percentiles: Percentiles,
    pub mean: f64,
    /// Noise standard deviation used for the simulation
    pub volatility: f64,
    pub samples: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatisticalBand {
    pub lower: f64,
    pub upper: f64,
}

/// Balance projection for one horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projection {
    pub horizon_months: u32,
    pub projected_balance: f64,
    /// Average change per month over the horizon
    pub monthly_change: f64,
    pub monthly_increments: Vec<f64>,
    pub uncertainty_model: UncertaintyModel,
    pub statistical_band: StatisticalBand,
    pub confidence: f64,
    pub assumptions: Vec<String>,
}

/// Named percentile-based variant at the scenario horizon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioVariant {
    pub name: String,
    pub horizon_months: u32,
    pub projected_balance: f64,
    pub confidence: f64,
}

/// Composite reliability score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityScore {
    pub data_quality: f64,
    pub algorithmic_strength: f64,
    pub ai_insight_quality: f64,
    pub forecast_reliability: f64,
    pub overall: f64,
    pub grade: String,
    pub recommendations: Vec<String>,
}
