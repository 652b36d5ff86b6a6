//! Scenario composer
//!
//! Applies an ordered list of what-if adjustments to the base projections.
//! Each scenario is a pure transform of a projected balance. Scenarios are
//! applied in the order given and every intermediate state is kept, so the
//! effect of each step can be inspected.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::Projection;

/// A scenario as supplied by the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDescriptor {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub parameters: Value,
}

impl ScenarioDescriptor {
    pub fn new(kind: &str, parameters: Value) -> Self {
        Self {
            kind: kind.to_string(),
            parameters,
        }
    }
}

/// A validated scenario transform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Scenario {
    /// Scale balances by `1 + percent/100`
    SalaryChange { percent: f64 },
    /// Scale balances by `1 - percent/100`
    ExpenseChange { percent: f64 },
    /// Subtract a fixed amount from every horizon
    OneTimeExpense { amount: f64 },
    /// Add a fixed amount to every horizon
    OneTimeIncome { amount: f64 },
}

impl Scenario {
    /// Apply the transform to one projected balance
    pub fn apply(&self, balance: f64) -> f64 {
        match *self {
            Scenario::SalaryChange { percent } => balance * (1.0 + percent / 100.0),
            Scenario::ExpenseChange { percent } => balance * (1.0 - percent / 100.0),
            Scenario::OneTimeExpense { amount } => balance - amount,
            Scenario::OneTimeIncome { amount } => balance + amount,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Scenario::SalaryChange { .. } => "salary_change",
            Scenario::ExpenseChange { .. } => "expense_change",
            Scenario::OneTimeExpense { .. } => "one_time_expense",
            Scenario::OneTimeIncome { .. } => "one_time_income",
        }
    }
}

impl TryFrom<&ScenarioDescriptor> for Scenario {
    type Error = Error;

    fn try_from(descriptor: &ScenarioDescriptor) -> Result<Self> {
        let kind = descriptor.kind.trim().to_lowercase();
        match kind.as_str() {
            "salary_change" => Ok(Scenario::SalaryChange {
                percent: number_param(descriptor, "percent")?,
            }),
            "expense_change" => Ok(Scenario::ExpenseChange {
                percent: number_param(descriptor, "percent")?,
            }),
            "one_time_expense" => Ok(Scenario::OneTimeExpense {
                amount: number_param(descriptor, "amount")?,
            }),
            "one_time_income" => Ok(Scenario::OneTimeIncome {
                amount: number_param(descriptor, "amount")?,
            }),
            _ => Err(Error::Validation(format!(
                "unknown scenario type '{}'",
                descriptor.kind
            ))),
        }
    }
}

fn number_param(descriptor: &ScenarioDescriptor, name: &str) -> Result<f64> {
    descriptor
        .parameters
        .get(name)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
        .ok_or_else(|| {
            Error::Validation(format!(
                "scenario '{}' needs a numeric '{}' parameter",
                descriptor.kind, name
            ))
        })
}

/// Balance at one horizon
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HorizonBalance {
    pub horizon_months: u32,
    pub balance: f64,
}

/// Balances after one scenario was applied
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioStep {
    /// Position in the supplied list
    pub index: usize,
    pub scenario: Scenario,
    pub balances: Vec<HorizonBalance>,
}

/// Result of composing scenarios over the base projections
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioComposition {
    pub base: Vec<HorizonBalance>,
    pub steps: Vec<ScenarioStep>,
    /// Balances after the last applied scenario
    pub final_balances: Vec<HorizonBalance>,
}

/// Composition plus the scenarios that were skipped
#[derive(Debug)]
pub struct CompositionReport {
    pub composition: ScenarioComposition,
    pub issues: Vec<Error>,
}

/// Apply scenarios in order to base projections
///
/// Invalid descriptors are reported and skipped; the rest still apply.
pub fn compose(projections: &[Projection], descriptors: &[ScenarioDescriptor]) -> CompositionReport {
    let base: Vec<HorizonBalance> = projections
        .iter()
        .map(|p| HorizonBalance {
            horizon_months: p.horizon_months,
            balance: p.projected_balance,
        })
        .collect();

    let mut current = base.clone();
    let mut steps = Vec::new();
    let mut issues = Vec::new();

    for (index, descriptor) in descriptors.iter().enumerate() {
        let scenario = match Scenario::try_from(descriptor) {
            Ok(s) => s,
            Err(e) => {
                debug!(index, error = %e, "Skipping scenario");
                issues.push(e);
                continue;
            }
        };

        for hb in &mut current {
            hb.balance = scenario.apply(hb.balance);
        }
        steps.push(ScenarioStep {
            index,
            scenario,
            balances: current.clone(),
        });
    }

    CompositionReport {
        composition: ScenarioComposition {
            base,
            steps,
            final_balances: current,
        },
        issues,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Percentiles, StatisticalBand, UncertaintyModel};
    use serde_json::json;

    fn projection(horizon: u32, balance: f64) -> Projection {
        let pct = Percentiles {
            p5: balance,
            p25: balance,
            p50: balance,
            p75: balance,
            p95: balance,
        };
        Projection {
            horizon_months: horizon,
            projected_balance: balance,
            monthly_change: 0.0,
            monthly_increments: vec![0.0; horizon as usize],
            uncertainty_model: UncertaintyModel {
                percentiles: pct,
                mean: balance,
                volatility: 0.0,
                samples: 1,
            },
            statistical_band: StatisticalBand {
                lower: balance,
                upper: balance,
            },
            confidence: 0.5,
            assumptions: vec![],
        }
    }

    #[test]
    fn test_apply_each_kind() {
        assert_eq!(Scenario::SalaryChange { percent: 10.0 }.apply(1000.0), 1100.0);
        assert_eq!(Scenario::ExpenseChange { percent: 20.0 }.apply(1000.0), 800.0);
        assert_eq!(Scenario::OneTimeExpense { amount: 250.0 }.apply(1000.0), 750.0);
        assert_eq!(Scenario::OneTimeIncome { amount: 250.0 }.apply(1000.0), 1250.0);
    }

    #[test]
    fn test_order_is_honored() {
        let projections = vec![projection(12, 10_000.0)];
        let raise = ScenarioDescriptor::new("salary_change", json!({"percent": 10}));
        let expense = ScenarioDescriptor::new("one_time_expense", json!({"amount": 500}));

        let a = compose(&projections, &[raise.clone(), expense.clone()]);
        let b = compose(&projections, &[expense, raise]);

        assert_eq!(a.composition.final_balances[0].balance, 10_500.0);
        assert_eq!(b.composition.final_balances[0].balance, 10_450.0);
        assert_ne!(
            a.composition.final_balances[0].balance,
            b.composition.final_balances[0].balance
        );
    }

    #[test]
    fn test_steps_record_intermediate_balances() {
        let projections = vec![projection(3, 1000.0), projection(6, 2000.0)];
        let report = compose(
            &projections,
            &[
                ScenarioDescriptor::new("one_time_income", json!({"amount": 100})),
                ScenarioDescriptor::new("expense_change", json!({"percent": 50})),
            ],
        );
        let steps = &report.composition.steps;
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].balances[1].balance, 2100.0);
        assert_eq!(steps[1].balances[1].balance, 1050.0);
        assert_eq!(report.composition.base[0].balance, 1000.0);
    }

    #[test]
    fn test_invalid_scenarios_are_skipped() {
        let projections = vec![projection(12, 1000.0)];
        let report = compose(
            &projections,
            &[
                ScenarioDescriptor::new("lottery_win", json!({"amount": 1e6})),
                ScenarioDescriptor::new("salary_change", json!({})),
                ScenarioDescriptor::new("salary_change", json!({"percent": "ten"})),
                ScenarioDescriptor::new("one_time_income", json!({"amount": 1})),
            ],
        );
        assert_eq!(report.issues.len(), 3);
        assert!(report
            .issues
            .iter()
            .all(|e| matches!(e, Error::Validation(_))));
        assert_eq!(report.composition.steps.len(), 1);
        assert_eq!(report.composition.steps[0].index, 3);
        assert_eq!(report.composition.final_balances[0].balance, 1001.0);
    }

    #[test]
    fn test_descriptor_deserializes() {
        let d: ScenarioDescriptor =
            serde_json::from_value(json!({"type": "expense_change", "parameters": {"percent": 5}}))
                .unwrap();
        assert_eq!(
            Scenario::try_from(&d).unwrap(),
            Scenario::ExpenseChange { percent: 5.0 }
        );
    }

    #[test]
    fn test_no_scenarios_keeps_base() {
        let report = compose(&[projection(6, 42.0)], &[]);
        assert!(report.composition.steps.is_empty());
        assert_eq!(report.composition.final_balances, report.composition.base);
    }
}
