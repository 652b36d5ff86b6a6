//! Backtest command implementation

use std::path::Path;

use anyhow::Result;
use runway_core::{backtest, normalize_value, ForecastConfig, ProjectionEngine};

use super::{load_transactions, money};

pub fn cmd_backtest(config: &ForecastConfig, file: &Path) -> Result<()> {
    let input = load_transactions(file)?;
    let data = normalize_value(&input)?;
    if data.is_empty() {
        anyhow::bail!("No usable transactions in {}", file.display());
    }

    let engine = ProjectionEngine::new(config);
    let report = backtest(&data.transactions, &config.backtest, |train| {
        engine.expected_monthly_flow(train)
    });

    println!();
    println!("🧪 Back-test ({} most recent months)", config.backtest.periods);
    println!("   ─────────────────────────────────────────────────────────────");

    if report.evaluated() {
        println!(
            "   {:10} │ {:>12} │ {:>12} │ {:>7}",
            "Cutoff", "Predicted", "Actual", "Error"
        );
        for p in &report.periods {
            println!(
                "   {:10} │ {:>12} │ {:>12} │ {:>6.1}%",
                p.cutoff.to_string(),
                money(p.predicted),
                money(p.actual),
                p.percentage_error
            );
        }
    }

    for skipped in &report.skipped {
        match skipped.cutoff {
            Some(cutoff) => println!("   ⏭️  {}: {}", cutoff, skipped.reason),
            None => println!("   ⏭️  {}", skipped.reason),
        }
    }

    println!();
    match (report.mean_percentage_error, report.accuracy()) {
        (Some(err), Some(acc)) => {
            println!("   Mean error: {:.1}%  Accuracy: {:.0}%", err, acc * 100.0);
            if report.is_reliable {
                println!("   ✅ Reliable (under {:.0}% error)", config.backtest.reliability_threshold_pct);
            } else {
                println!("   ⚠️  Unreliable (over {:.0}% error)", config.backtest.reliability_threshold_pct);
            }
        }
        _ => println!("   ⚠️  No period had enough data to evaluate"),
    }
    println!();
    Ok(())
}
