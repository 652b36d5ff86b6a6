//! Accuracy validator
//!
//! Back-tests a projection function against held-out history. For each of
//! the most recent one-month periods, the history is split at the period
//! start: the function sees only the earlier records and its predicted net
//! flow is compared with what actually happened in the period.

use chrono::{Months, NaiveDate};
use serde::Serialize;
use tracing::debug;

use crate::config::BacktestConfig;
use crate::error::Result;
use crate::models::Transaction;
use crate::stats::mean;

/// One evaluated back-test period
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestPeriod {
    /// Last day of training data
    pub cutoff: NaiveDate,
    pub period_end: NaiveDate,
    pub train_count: usize,
    pub test_count: usize,
    pub predicted: f64,
    pub actual: f64,
    pub absolute_error: f64,
    pub percentage_error: f64,
}

/// A period that could not be evaluated
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPeriod {
    pub cutoff: Option<NaiveDate>,
    pub reason: String,
}

/// Aggregate back-test outcome
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BacktestReport {
    pub periods: Vec<BacktestPeriod>,
    pub skipped: Vec<SkippedPeriod>,
    pub mean_absolute_error: Option<f64>,
    pub mean_percentage_error: Option<f64>,
    pub is_reliable: bool,
}

impl BacktestReport {
    /// Accuracy fraction `max(0, 1 - meanError/100)`, None without evaluated periods
    pub fn accuracy(&self) -> Option<f64> {
        self.mean_percentage_error
            .map(|e| (1.0 - e / 100.0).max(0.0))
    }

    pub fn evaluated(&self) -> bool {
        !self.periods.is_empty()
    }
}

/// Back-test `project` over the most recent periods of date-sorted history
///
/// `project` receives the training slice and returns the predicted net flow
/// of the following month.
pub fn backtest<F>(transactions: &[Transaction], config: &BacktestConfig, project: F) -> BacktestReport
where
    F: Fn(&[Transaction]) -> Result<f64>,
{
    let mut report = BacktestReport::default();
    let Some(last) = transactions.last().map(|t| t.date) else {
        report.skipped.push(SkippedPeriod {
            cutoff: None,
            reason: "no transactions".to_string(),
        });
        return report;
    };

    // Oldest period first
    for offset in (0..config.periods).rev() {
        let window = last
            .checked_sub_months(Months::new(offset))
            .and_then(|end| end.checked_sub_months(Months::new(1)).map(|start| (start, end)));
        let Some((cutoff, period_end)) = window else {
            report.skipped.push(SkippedPeriod {
                cutoff: None,
                reason: "period falls outside the calendar".to_string(),
            });
            continue;
        };

        let split = transactions.partition_point(|t| t.date <= cutoff);
        let train = &transactions[..split];
        let test: Vec<&Transaction> = transactions[split..]
            .iter()
            .filter(|t| t.date <= period_end)
            .collect();

        if train.len() < config.min_train || test.len() < config.min_test {
            report.skipped.push(SkippedPeriod {
                cutoff: Some(cutoff),
                reason: format!(
                    "need {} training and {} test records, have {} and {}",
                    config.min_train,
                    config.min_test,
                    train.len(),
                    test.len()
                ),
            });
            continue;
        }

        let predicted = match project(train) {
            Ok(p) => p,
            Err(e) => {
                report.skipped.push(SkippedPeriod {
                    cutoff: Some(cutoff),
                    reason: format!("projection failed: {}", e),
                });
                continue;
            }
        };
        let actual: f64 = test.iter().map(|t| t.amount).sum();
        let absolute_error = (predicted - actual).abs();

        debug!(%cutoff, predicted, actual, "Back-test period evaluated");
        report.periods.push(BacktestPeriod {
            cutoff,
            period_end,
            train_count: train.len(),
            test_count: test.len(),
            predicted,
            actual,
            absolute_error,
            percentage_error: percentage_error(predicted, actual),
        });
    }

    if report.evaluated() {
        let abs: Vec<f64> = report.periods.iter().map(|p| p.absolute_error).collect();
        let pct: Vec<f64> = report.periods.iter().map(|p| p.percentage_error).collect();
        let mean_pct = mean(&pct);
        report.mean_absolute_error = Some(mean(&abs));
        report.mean_percentage_error = Some(mean_pct);
        report.is_reliable = mean_pct < config.reliability_threshold_pct;
    }
    report
}

/// Percentage error against the actual value
///
/// A zero actual counts as 0% when the prediction is also zero, 100% otherwise.
fn percentage_error(predicted: f64, actual: f64) -> f64 {
    if actual.abs() < f64::EPSILON {
        if predicted.abs() < f64::EPSILON {
            0.0
        } else {
            100.0
        }
    } else {
        (predicted - actual).abs() / actual.abs() * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    fn steady_history(months: u32) -> Vec<Transaction> {
        let mut txs = Vec::new();
        for i in 0..months {
            let (y, m) = (2023 + (i / 12) as i32, i % 12 + 1);
            for (day, desc, amount) in [
                (1, "PAYROLL", 4000.0),
                (3, "RENT", -1800.0),
                (8, "POWER", -120.0),
                (15, "GROCER", -400.0),
                (22, "FUEL", -80.0),
            ] {
                txs.push(Transaction::new(
                    NaiveDate::from_ymd_opt(y, m, day).unwrap(),
                    desc,
                    amount,
                    "Misc",
                ));
            }
        }
        txs
    }

    #[test]
    fn test_perfect_projection_is_reliable() {
        let txs = steady_history(12);
        let report = backtest(&txs, &BacktestConfig::default(), |_| Ok(1600.0));
        assert_eq!(report.periods.len(), 3);
        assert!(report.periods.iter().all(|p| p.test_count == 5));
        assert_eq!(report.mean_percentage_error, Some(0.0));
        assert_eq!(report.accuracy(), Some(1.0));
        assert!(report.is_reliable);
    }

    #[test]
    fn test_training_data_precedes_test_period() {
        let txs = steady_history(12);
        let report = backtest(&txs, &BacktestConfig::default(), |train| {
            let last = train.last().map(|t| t.date).unwrap();
            assert!(last <= NaiveDate::from_ymd_opt(2023, 11, 22).unwrap());
            Ok(train.len() as f64)
        });
        assert!(report.periods.windows(2).all(|w| w[0].cutoff < w[1].cutoff));
        assert!(report.periods.iter().all(|p| p.train_count >= 10));
    }

    #[test]
    fn test_poor_projection_is_unreliable() {
        let txs = steady_history(12);
        let report = backtest(&txs, &BacktestConfig::default(), |_| Ok(800.0));
        assert_eq!(report.mean_percentage_error, Some(50.0));
        assert_eq!(report.accuracy(), Some(0.5));
        assert!(!report.is_reliable);
    }

    #[test]
    fn test_short_history_skips_periods() {
        let txs = steady_history(2);
        let report = backtest(&txs, &BacktestConfig::default(), |_| Ok(0.0));
        assert!(!report.evaluated());
        assert!(!report.is_reliable);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.accuracy(), None);
    }

    #[test]
    fn test_failing_projection_skips_period() {
        let txs = steady_history(12);
        let report = backtest(&txs, &BacktestConfig::default(), |_| {
            Err(Error::InsufficientData("nope".into()))
        });
        assert!(!report.evaluated());
        assert!(report.skipped[0].reason.contains("projection failed"));
    }

    #[test]
    fn test_empty_history() {
        let report = backtest(&[], &BacktestConfig::default(), |_| Ok(0.0));
        assert!(!report.evaluated());
        assert_eq!(report.skipped.len(), 1);
    }

    #[test]
    fn test_percentage_error_zero_actual() {
        assert_eq!(percentage_error(0.0, 0.0), 0.0);
        assert_eq!(percentage_error(5.0, 0.0), 100.0);
        assert_eq!(percentage_error(90.0, 100.0), 10.0);
    }
}
