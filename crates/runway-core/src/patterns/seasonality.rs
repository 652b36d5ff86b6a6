//! Seasonality detection
//!
//! Buckets every transaction by calendar month across all years and compares
//! each bucket's per-year income and expense to the per-month average.

use std::collections::HashSet;

use chrono::Datelike;

use crate::error::{Error, Result};
use crate::models::{MonthClassification, MonthlySeasonality, SeasonalProfile, Transaction};

/// Build the seasonal profile for date-sorted transactions
///
/// Each bucket is divided by the number of years it has data in, so a month
/// that appears twice in a 13-month history is not counted double. The
/// per-month average is taken over calendar months that contain data;
/// months without data keep neutral indices. Fewer than two populated
/// calendar months cannot show seasonality and return `InsufficientData`.
pub fn detect_seasonality(transactions: &[Transaction], threshold: f64) -> Result<SeasonalProfile> {
    let mut income = [0.0_f64; 12];
    let mut expense = [0.0_f64; 12];
    let mut years: [HashSet<i32>; 12] = Default::default();

    for tx in transactions {
        let m = tx.date.month0() as usize;
        years[m].insert(tx.date.year());
        if tx.amount >= 0.0 {
            income[m] += tx.amount;
        } else {
            expense[m] += tx.amount.abs();
        }
    }

    let populated: Vec<bool> = years.iter().map(|y| !y.is_empty()).collect();
    for m in 0..12 {
        if populated[m] {
            let occurrences = years[m].len() as f64;
            income[m] /= occurrences;
            expense[m] /= occurrences;
        }
    }

    let observed = populated.iter().filter(|p| **p).count();
    if observed < 2 {
        return Err(Error::InsufficientData(format!(
            "seasonality needs at least 2 calendar months of data, found {}",
            observed
        )));
    }

    let avg_income = income.iter().sum::<f64>() / observed as f64;
    let avg_expense = expense.iter().sum::<f64>() / observed as f64;

    let lower = 1.0 - threshold;
    let upper = 1.0 + threshold;

    let mut months = Vec::with_capacity(12);
    let mut peak_income_months = Vec::new();
    let mut peak_expense_months = Vec::new();
    let mut detected = false;

    for m in 0..12 {
        if !populated[m] {
            months.push(MonthlySeasonality {
                month: m as u32,
                income_index: 1.0,
                expense_index: 1.0,
                classification: MonthClassification::NoData,
            });
            continue;
        }

        let income_index = seasonal_index(income[m], avg_income);
        let expense_index = seasonal_index(expense[m], avg_expense);

        if income_index > upper {
            peak_income_months.push(m as u32);
        }
        if expense_index > upper {
            peak_expense_months.push(m as u32);
        }

        let outside = |i: f64| i < lower || i > upper;
        if outside(income_index) || outside(expense_index) {
            detected = true;
        }

        let classification = if income_index > upper || expense_index > upper {
            MonthClassification::Peak
        } else if income_index < lower || expense_index < lower {
            MonthClassification::Low
        } else {
            MonthClassification::Normal
        };

        months.push(MonthlySeasonality {
            month: m as u32,
            income_index,
            expense_index,
            classification,
        });
    }

    tracing::debug!(
        detected,
        observed_months = observed,
        "Seasonality analysis complete"
    );

    Ok(SeasonalProfile {
        months,
        detected,
        peak_income_months,
        peak_expense_months,
    })
}

/// Ratio of a bucket to the average, 1.0 when the average is zero
fn seasonal_index(bucket: f64, average: f64) -> f64 {
    if average.abs() < f64::EPSILON {
        return 1.0;
    }
    let index = bucket / average;
    if index.is_finite() {
        index
    } else {
        1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn tx(y: i32, m: u32, d: u32, amount: f64) -> Transaction {
        Transaction::new(NaiveDate::from_ymd_opt(y, m, d).unwrap(), "TEST", amount, "Misc")
    }

    #[test]
    fn test_flat_history_not_detected() {
        let mut txs = Vec::new();
        for m in 1..=6 {
            txs.push(tx(2024, m, 1, 3000.0));
            txs.push(tx(2024, m, 15, -2900.0));
        }

        let profile = detect_seasonality(&txs, 0.2).unwrap();
        assert!(!profile.detected);
        for month in &profile.months {
            assert!(month.income_index >= 0.8 && month.income_index <= 1.2);
            assert!(month.expense_index >= 0.8 && month.expense_index <= 1.2);
        }
        assert_eq!(profile.months[8].classification, MonthClassification::NoData);
        assert_eq!(profile.months[0].classification, MonthClassification::Normal);
    }

    #[test]
    fn test_december_spike_detected() {
        let mut txs = Vec::new();
        for m in 1..=12 {
            txs.push(tx(2024, m, 1, 3000.0));
            let spend = if m == 12 { -6000.0 } else { -2000.0 };
            txs.push(tx(2024, m, 20, spend));
        }

        let profile = detect_seasonality(&txs, 0.2).unwrap();
        assert!(profile.detected);
        assert_eq!(profile.peak_expense_months, vec![11]);
        assert!(profile.peak_income_months.is_empty());
        assert_eq!(profile.months[11].classification, MonthClassification::Peak);
        assert!(profile.multiplier_for(11) > 1.0);
    }

    #[test]
    fn test_zero_average_defaults_to_one() {
        // Only expenses: income average is zero
        let txs = vec![tx(2024, 1, 5, -100.0), tx(2024, 2, 5, -100.0)];
        let profile = detect_seasonality(&txs, 0.2).unwrap();
        assert_eq!(profile.months[0].income_index, 1.0);
        assert!(!profile.detected);
    }

    #[test]
    fn test_single_month_is_insufficient() {
        let txs = vec![tx(2024, 3, 1, 10.0), tx(2024, 3, 2, -5.0)];
        let result = detect_seasonality(&txs, 0.2);
        assert!(matches!(result, Err(Error::InsufficientData(_))));
    }

    #[test]
    fn test_buckets_merge_across_years() {
        let txs = vec![
            tx(2023, 1, 1, 100.0),
            tx(2023, 2, 1, 100.0),
            tx(2024, 1, 1, 100.0),
            tx(2024, 2, 1, 100.0),
        ];
        let profile = detect_seasonality(&txs, 0.2).unwrap();
        assert_eq!(profile.months[0].income_index, 1.0);
        assert_eq!(profile.months[1].income_index, 1.0);
    }

    #[test]
    fn test_partial_second_year_not_detected() {
        // 2023-01 through 2024-03: January to March appear twice
        let mut txs = Vec::new();
        for i in 0..15u32 {
            let (y, m) = (2023 + (i / 12) as i32, i % 12 + 1);
            txs.push(tx(y, m, 1, 3000.0));
            txs.push(tx(y, m, 5, -2000.0));
        }

        let profile = detect_seasonality(&txs, 0.2).unwrap();
        assert!(!profile.detected);
        assert!(profile.peak_income_months.is_empty());
        for month in &profile.months {
            assert!((month.income_index - 1.0).abs() < 1e-9);
            assert!((month.expense_index - 1.0).abs() < 1e-9);
            assert_eq!(month.classification, MonthClassification::Normal);
        }
    }
}
