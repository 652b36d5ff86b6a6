//! Patterns command implementation

use std::path::Path;

use anyhow::Result;
use runway_core::ai::month_name;
use runway_core::models::MonthClassification;
use runway_core::{normalize_value, ForecastConfig, PatternAnalyzer};

use super::{load_transactions, money, truncate};

pub fn cmd_patterns(config: &ForecastConfig, file: &Path, json: bool) -> Result<()> {
    let input = load_transactions(file)?;
    let data = normalize_value(&input)?;
    if data.is_empty() {
        anyhow::bail!("No usable transactions in {}", file.display());
    }

    let report = PatternAnalyzer::new(config).analyze(&data.transactions);
    let analysis = &report.analysis;

    if json {
        println!("{}", serde_json::to_string_pretty(analysis)?);
        return Ok(());
    }

    println!();
    println!("🔍 Pattern Analysis");
    println!(
        "   {} transactions over {} months ({} dropped)",
        data.summary.transaction_count,
        data.summary.months_covered,
        data.dropped.len()
    );
    println!("   ─────────────────────────────────────────────────────────────");

    println!();
    if analysis.seasonality.detected {
        println!("📅 Seasonality detected");
        println!(
            "   {:10} │ {:>7} │ {:>7} │ {}",
            "Month", "Income", "Expense", "Class"
        );
        for m in &analysis.seasonality.months {
            if m.classification == MonthClassification::NoData {
                continue;
            }
            println!(
                "   {:10} │ {:>7.2} │ {:>7.2} │ {:?}",
                month_name(m.month),
                m.income_index,
                m.expense_index,
                m.classification
            );
        }
    } else {
        println!("📅 No seasonality detected");
    }

    println!();
    if analysis.recurring.is_empty() {
        println!("🔁 No recurring transactions found");
    } else {
        println!("🔁 Recurring ({} found)", analysis.recurring.len());
        for p in &analysis.recurring {
            let name = p
                .transactions
                .first()
                .map(|t| t.description.as_str())
                .unwrap_or(&p.group_key);
            println!(
                "   {:30} {:>12} every {:>5.1}d  {:9} {:>3.0}%  ({} seen)",
                truncate(name, 30),
                money(p.average_amount),
                p.average_interval_days,
                p.frequency.as_str(),
                p.confidence * 100.0,
                p.transactions.len()
            );
        }
    }

    println!();
    match analysis.trend {
        Some(ref t) => {
            println!(
                "📈 Trend: {} {}/mo (±{} at {:.0}%, strength {:.1}, {} months)",
                t.direction.as_str(),
                money(t.mean),
                money(t.confidence_interval.half_width()),
                t.confidence_level * 100.0,
                t.strength,
                t.months_observed
            );
        }
        None => println!("📈 Trend: not enough months of history"),
    }

    for issue in &report.issues {
        println!("   ⚠️  {}", issue);
    }
    println!();
    Ok(())
}
