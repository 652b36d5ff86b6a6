//! Runway Core Library
//!
//! Forecasting pipeline for the Runway balance projector:
//! - Data normalization of loosely-typed transaction records
//! - Pattern analysis (seasonality, recurring transactions, trend)
//! - Per-horizon projections with Monte Carlo uncertainty
//! - Ordered what-if scenario composition
//! - Back-testing and a composite quality score
//! - Pluggable insight generators (Ollama, heuristic, mock)
//! - Pipeline orchestrator with partial-failure reporting

pub mod ai;
pub mod config;
pub mod error;
pub mod models;
pub mod normalize;
pub mod patterns;
pub mod pipeline;
pub mod projection;
pub mod quality;
pub mod scenario;
pub mod stats;
pub mod validation;

/// Test utilities including mock Ollama server
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use ai::{
    generate_with_timeout, HeuristicBackend, InsightBundle, InsightClient, InsightContext,
    InsightGenerator, InsightOutcome, MockBackend, OllamaBackend,
};
pub use config::ForecastConfig;
pub use error::{Error, ErrorKind, Result};
pub use models::{
    Projection, QualityScore, RawTransaction, RecurringPattern, SeasonalProfile, Summary,
    Transaction, TrendEstimate,
};
pub use normalize::{normalize, normalize_value, NormalizedData};
pub use patterns::{PatternAnalysis, PatternAnalyzer};
pub use pipeline::{ForecastPipeline, ForecastResult, Stage, StageError, StageOutcome};
pub use projection::{ProjectionEngine, ProjectionReport};
pub use scenario::{Scenario, ScenarioComposition, ScenarioDescriptor};
pub use validation::{backtest, BacktestReport};
