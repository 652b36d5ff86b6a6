//! CLI argument definitions using clap
//!
//! This module contains all the clap structs and enums for parsing CLI arguments.
//! The actual command implementations are in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Runway - See how far your money goes
#[derive(Parser)]
#[command(name = "runway")]
#[command(about = "Balance forecaster for personal transaction history", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Forecast config file (overrides RUNWAY_CONFIG and the user config dir)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full forecast pipeline
    Forecast {
        /// Transaction history (JSON array or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// JSON file with an ordered list of scenarios
        #[arg(short, long)]
        scenarios: Option<PathBuf>,

        /// Fixed Monte Carlo seed for reproducible output
        #[arg(long)]
        seed: Option<u64>,

        /// Skip the insight generator even if one is configured
        #[arg(long)]
        no_insights: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show detected seasonality, recurring transactions and trend
    Patterns {
        /// Transaction history (JSON array or CSV)
        #[arg(short, long)]
        file: PathBuf,

        /// Print the analysis as JSON
        #[arg(long)]
        json: bool,
    },

    /// Back-test the projection against recent history
    Backtest {
        /// Transaction history (JSON array or CSV)
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the effective configuration
    Config,
}
