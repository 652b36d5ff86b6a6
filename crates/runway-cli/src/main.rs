//! Runway CLI - Balance forecaster
//!
//! Usage:
//!   runway forecast --file history.csv     Project balances over the configured horizons
//!   runway patterns --file history.json    Show recurring transactions, seasonality and trend
//!   runway backtest --file history.csv     Check projection accuracy against recent months
//!   runway config                          Print the effective configuration

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::{Context, Result};
use clap::Parser;
use runway_core::ForecastConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    let config = ForecastConfig::load(cli.config.as_deref()).context("Failed to load config")?;

    match cli.command {
        Commands::Forecast {
            file,
            scenarios,
            seed,
            no_insights,
            json,
        } => {
            commands::cmd_forecast(
                &config,
                &file,
                scenarios.as_deref(),
                seed,
                no_insights,
                json,
            )
            .await
        }
        Commands::Patterns { file, json } => commands::cmd_patterns(&config, &file, json),
        Commands::Backtest { file } => commands::cmd_backtest(&config, &file),
        Commands::Config => commands::cmd_config(&config, cli.config.as_deref()),
    }
}
