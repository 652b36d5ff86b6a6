//! Trend estimation over monthly net flow

use std::collections::BTreeMap;

use chrono::Datelike;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::models::{ConfidenceInterval, Transaction, TrendDirection, TrendEstimate};
use crate::stats::{critical_value, mean, sample_variance};

/// Upper bound on reported strength; zero-variance histories would otherwise be infinite
pub const TREND_STRENGTH_CAP: f64 = 10.0;

/// Net flow for one calendar month
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyFlow {
    pub year: i32,
    /// 1-based month
    pub month: u32,
    pub net: f64,
}

/// Aggregate net flow per calendar month, oldest first
///
/// Only months that contain transactions are included.
pub fn monthly_net_flows(transactions: &[Transaction]) -> Vec<MonthlyFlow> {
    let mut by_month: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for tx in transactions {
        *by_month.entry((tx.date.year(), tx.date.month())).or_insert(0.0) += tx.amount;
    }
    by_month
        .into_iter()
        .map(|((year, month), net)| MonthlyFlow { year, month, net })
        .collect()
}

/// Estimate the monthly net-flow trend with a two-sided confidence interval
pub fn estimate_trend(transactions: &[Transaction], confidence_level: f64) -> Result<TrendEstimate> {
    let flows = monthly_net_flows(transactions);
    estimate_from_flows(&flows, confidence_level)
}

/// Estimate the trend from pre-aggregated monthly flows
pub fn estimate_from_flows(flows: &[MonthlyFlow], confidence_level: f64) -> Result<TrendEstimate> {
    if flows.len() < 2 {
        return Err(Error::InsufficientData(format!(
            "trend estimation needs at least 2 months of data, found {}",
            flows.len()
        )));
    }

    let values: Vec<f64> = flows.iter().map(|f| f.net).collect();
    let n = values.len() as f64;
    let m = mean(&values);
    let standard_error = (sample_variance(&values) / n).sqrt();
    let z = critical_value(confidence_level);

    let strength = if standard_error > f64::EPSILON {
        (m.abs() / standard_error).min(TREND_STRENGTH_CAP)
    } else if m.abs() > f64::EPSILON {
        TREND_STRENGTH_CAP
    } else {
        0.0
    };

    let direction = if m >= 0.0 {
        TrendDirection::Increasing
    } else {
        TrendDirection::Decreasing
    };

    tracing::debug!(
        mean = m,
        standard_error,
        strength,
        months = flows.len(),
        "Trend estimation complete"
    );

    Ok(TrendEstimate {
        mean: m,
        standard_error,
        confidence_interval: ConfidenceInterval {
            lower: m - z * standard_error,
            upper: m + z * standard_error,
        },
        confidence_level,
        direction,
        strength,
        months_observed: flows.len(),
    })
}
