//! Forecast command implementation

use std::path::Path;

use anyhow::{Context, Result};
use runway_core::pipeline::ForecastResult;
use runway_core::{ForecastConfig, ForecastPipeline, InsightClient, InsightGenerator};
use tracing::info;

use super::{load_scenarios, load_transactions, money, truncate};

pub async fn cmd_forecast(
    config: &ForecastConfig,
    file: &Path,
    scenarios_file: Option<&Path>,
    seed: Option<u64>,
    no_insights: bool,
    json: bool,
) -> Result<()> {
    let input = load_transactions(file)?;
    let scenarios = match scenarios_file {
        Some(path) => load_scenarios(path)?,
        None => Vec::new(),
    };

    let mut config = config.clone();
    if seed.is_some() {
        config.seed = seed;
    }

    let client = if no_insights {
        None
    } else {
        InsightClient::from_config(&config.insights)
    };
    if let Some(ref c) = client {
        info!("Using {} insight generator", c.name());
    }

    let mut pipeline = ForecastPipeline::new(&config);
    if let Some(ref c) = client {
        pipeline = pipeline.with_insights(c);
    }

    let result = pipeline
        .run(&input, &scenarios)
        .await
        .context("Forecast failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_report(&result);
    }
    Ok(())
}

fn print_report(result: &ForecastResult) {
    let s = &result.summary;

    println!();
    println!("💰 Balance Forecast");
    if let Some(range) = s.date_range {
        println!(
            "   History: {} to {} ({} months, {} transactions)",
            range.start, range.end, s.months_covered, s.transaction_count
        );
    }
    println!("   Current balance: {}", money(s.current_balance));
    println!(
        "   Income {}  Expenses {}  Net {}",
        money(s.total_income),
        money(s.total_expenses),
        money(s.net_income)
    );
    println!("   ─────────────────────────────────────────────────────────────");

    if result.projections.is_empty() {
        println!("   No projections could be produced.");
    } else {
        println!(
            "   {:>7} │ {:>14} │ {:>14} │ {:>14} │ {:>5}",
            "Horizon", "Projected", "P5", "P95", "Conf"
        );
        for p in &result.projections {
            let pct = &p.uncertainty_model.percentiles;
            println!(
                "   {:>6}m │ {:>14} │ {:>14} │ {:>14} │ {:>4.0}%",
                p.horizon_months,
                money(p.projected_balance),
                money(pct.p5),
                money(pct.p95),
                p.confidence * 100.0
            );
        }
    }

    if !result.scenario_variants.is_empty() {
        println!();
        println!("🎯 Variants");
        for v in &result.scenario_variants {
            println!(
                "   {:12} {} ({}m, {:.0}% confidence)",
                v.name,
                money(v.projected_balance),
                v.horizon_months,
                v.confidence * 100.0
            );
        }
    }

    if let Some(ref composition) = result.scenarios {
        println!();
        println!("🔀 Scenarios");
        for step in &composition.steps {
            let balances: Vec<String> = step
                .balances
                .iter()
                .map(|b| format!("{}m {}", b.horizon_months, money(b.balance)))
                .collect();
            println!(
                "   {}. {:18} {}",
                step.index + 1,
                step.scenario.kind(),
                balances.join("  ")
            );
        }
    }

    if let Some(ref patterns) = result.patterns {
        if !patterns.recurring.is_empty() {
            println!();
            println!("🔁 Recurring ({} found)", patterns.recurring.len());
            for p in patterns.recurring.iter().take(8) {
                let name = p
                    .transactions
                    .first()
                    .map(|t| t.description.as_str())
                    .unwrap_or(&p.group_key);
                println!(
                    "   {:30} {:>12}/mo  {:9} {:.0}%",
                    truncate(name, 30),
                    money(p.monthly_amount),
                    p.frequency.as_str(),
                    p.confidence * 100.0
                );
            }
        }
    }

    print_list("💡 Insights", &result.insights);
    print_list("⚠️  Risks", &result.risks);
    print_list("📈 Opportunities", &result.opportunities);
    print_list("📝 Recommendations", &result.recommendations);

    if let Some(ref q) = result.quality {
        println!();
        println!(
            "⭐ Quality: {:.0}% ({}){}",
            q.overall * 100.0,
            q.grade,
            if result.is_reliable {
                ""
            } else {
                " - advisory only"
            }
        );
        for r in &q.recommendations {
            println!("   • {}", r);
        }
    }

    if result.has_errors {
        println!();
        println!("⚠️  {} issue(s):", result.errors.len());
        for e in &result.errors {
            println!("   [{}] {}: {}", e.stage, e.kind, truncate(&e.message, 90));
        }
    }
    println!();
}

fn print_list(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!();
    println!("{}", title);
    for item in items {
        println!("   • {}", item);
    }
}
