//! Composite quality score
//!
//! Combines data sufficiency, pattern strength, insight richness and
//! back-tested accuracy into one reliability figure with guidance on how to
//! improve it.

use crate::models::QualityScore;

pub const DATA_QUALITY_WEIGHT: f64 = 0.30;
pub const ALGORITHMIC_STRENGTH_WEIGHT: f64 = 0.25;
pub const AI_INSIGHT_WEIGHT: f64 = 0.20;
pub const FORECAST_RELIABILITY_WEIGHT: f64 = 0.25;

/// Transactions needed for full data quality
const FULL_DATA_TRANSACTIONS: f64 = 100.0;
/// Insights needed for full insight quality
const FULL_INSIGHT_COUNT: f64 = 10.0;
/// Trend strength treated as fully significant
const FULL_TREND_STRENGTH: f64 = 3.0;

/// Everything the scorer looks at
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct QualityInputs {
    pub transaction_count: usize,
    pub recurring_count: usize,
    pub seasonality_detected: bool,
    pub trend_strength: f64,
    pub insight_count: usize,
    /// Confidence of the scenario-horizon projection
    pub base_confidence: f64,
    /// Back-test accuracy fraction, None when no period was evaluated
    pub backtest_accuracy: Option<f64>,
}

/// Score a forecast run
pub fn score(inputs: &QualityInputs) -> QualityScore {
    let data_quality = (inputs.transaction_count as f64 / FULL_DATA_TRANSACTIONS).min(1.0);

    let trend = (inputs.trend_strength / FULL_TREND_STRENGTH).clamp(0.0, 1.0);
    let seasonal = if inputs.seasonality_detected { 1.0 } else { 0.0 };
    let algorithmic_strength =
        (inputs.recurring_count as f64 * 0.1 + seasonal * 0.5 + trend * 0.4).min(1.0);

    let ai_insight_quality = (inputs.insight_count as f64 / FULL_INSIGHT_COUNT).min(1.0);

    let base_confidence = inputs.base_confidence.clamp(0.0, 1.0);
    let forecast_reliability = match inputs.backtest_accuracy {
        Some(accuracy) => (base_confidence + accuracy.clamp(0.0, 1.0)) / 2.0,
        None => base_confidence * 0.5,
    };

    let overall = DATA_QUALITY_WEIGHT * data_quality
        + ALGORITHMIC_STRENGTH_WEIGHT * algorithmic_strength
        + AI_INSIGHT_WEIGHT * ai_insight_quality
        + FORECAST_RELIABILITY_WEIGHT * forecast_reliability;

    let mut recommendations = Vec::new();
    if data_quality < 0.7 {
        recommendations.push(format!(
            "Add more transaction history: {} records loaded, {} or more gives the best results",
            inputs.transaction_count, FULL_DATA_TRANSACTIONS as usize
        ));
    }
    if algorithmic_strength < 0.5 {
        recommendations.push(
            "Use consistent descriptions and categories so recurring patterns can be detected"
                .to_string(),
        );
    }
    if ai_insight_quality < 0.5 {
        recommendations
            .push("Enable an insight generator for qualitative commentary".to_string());
    }
    if forecast_reliability < 0.6 {
        if inputs.backtest_accuracy.is_none() {
            recommendations.push(
                "Provide at least four months of history so projections can be back-tested"
                    .to_string(),
            );
        } else {
            recommendations.push(
                "Back-tested accuracy is low; treat projections as rough estimates".to_string(),
            );
        }
    }

    QualityScore {
        data_quality,
        algorithmic_strength,
        ai_insight_quality,
        forecast_reliability,
        overall,
        grade: grade(overall).to_string(),
        recommendations,
    }
}

/// Letter-style label for an overall score
pub fn grade(overall: f64) -> &'static str {
    match overall {
        x if x >= 0.8 => "excellent",
        x if x >= 0.6 => "good",
        x if x >= 0.4 => "fair",
        _ => "poor",
    }
}
