//! Forecast pipeline orchestrator
//!
//! Runs the stages strictly in order against one `ForecastState`:
//!
//! normalize -> patterns -> insights -> projection -> scenarios -> validation -> quality
//!
//! A stage that fails records `{stage, kind, message}` and leaves the state
//! as it was; later stages check what is available and degrade. The only
//! condition that aborts a run is an input that is not a list or holds no
//! usable records. An invalid configuration is rejected before any stage
//! runs.

use std::future::Future;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::ai::{generate_with_timeout, InsightBundle, InsightContext, InsightGenerator};
use crate::config::ForecastConfig;
use crate::error::{Error, ErrorKind, Result};
use crate::models::{Projection, QualityScore, RawTransaction, ScenarioVariant, Summary};
use crate::normalize::{normalize, normalize_value, DroppedRecord, NormalizedData};
use crate::patterns::{PatternAnalysis, PatternAnalyzer};
use crate::projection::ProjectionEngine;
use crate::quality::{self, QualityInputs};
use crate::scenario::{compose, ScenarioComposition, ScenarioDescriptor};
use crate::validation::{backtest, BacktestReport};

/// Pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Normalize,
    Patterns,
    Insights,
    Projection,
    Scenarios,
    Validation,
    Quality,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Normalize => "normalize",
            Stage::Patterns => "patterns",
            Stage::Insights => "insights",
            Stage::Projection => "projection",
            Stage::Scenarios => "scenarios",
            Stage::Validation => "validation",
            Stage::Quality => "quality",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// How a stage finished
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageOutcome {
    Success,
    /// Finished with degraded output; errors were recorded
    Partial,
    /// Halts the run
    Fatal,
}

/// An error captured during a run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageError {
    pub stage: Stage,
    pub kind: ErrorKind,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageTiming {
    pub stage: Stage,
    pub outcome: StageOutcome,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Timing {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub total_ms: u64,
    pub stages: Vec<StageTiming>,
}

/// Mutable state threaded through the stages of one run
#[derive(Debug, Default)]
pub struct ForecastState {
    pub data: NormalizedData,
    pub analysis: Option<PatternAnalysis>,
    pub insights: InsightBundle,
    pub insight_backend: Option<String>,
    pub projections: Vec<Projection>,
    pub variants: Vec<ScenarioVariant>,
    pub scenarios: Option<ScenarioComposition>,
    pub backtest: Option<BacktestReport>,
    pub quality: Option<QualityScore>,
    pub errors: Vec<StageError>,
    pub timings: Vec<StageTiming>,
}

impl ForecastState {
    fn record(&mut self, stage: Stage, error: &Error) {
        self.errors.push(StageError {
            stage,
            kind: error.kind(),
            message: error.to_string(),
        });
    }

    fn finish(&mut self, stage: Stage, outcome: StageOutcome, started: Instant) {
        let duration_ms = started.elapsed().as_millis() as u64;
        debug!(stage = %stage, ?outcome, duration_ms, "Stage finished");
        self.timings.push(StageTiming {
            stage,
            outcome,
            duration_ms,
        });
    }
}

/// Final output of a forecast run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForecastResult {
    pub summary: Summary,
    pub projections: Vec<Projection>,
    pub scenario_variants: Vec<ScenarioVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scenarios: Option<ScenarioComposition>,
    pub patterns: Option<PatternAnalysis>,
    pub insights: Vec<String>,
    pub risks: Vec<String>,
    pub opportunities: Vec<String>,
    pub recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub insight_backend: Option<String>,
    pub quality: Option<QualityScore>,
    pub backtest: Option<BacktestReport>,
    pub dropped_records: Vec<DroppedRecord>,
    pub errors: Vec<StageError>,
    pub has_errors: bool,
    pub is_reliable: bool,
    pub timing: Timing,
}

impl ForecastResult {
    /// Projection for a horizon, if it was produced
    pub fn projection(&self, horizon_months: u32) -> Option<&Projection> {
        self.projections
            .iter()
            .find(|p| p.horizon_months == horizon_months)
    }
}

/// Sequences the forecast stages
///
/// Borrows the configuration and insight generator immutably, so one
/// pipeline can serve concurrent runs.
#[derive(Clone, Copy)]
pub struct ForecastPipeline<'a> {
    config: &'a ForecastConfig,
    insights: Option<&'a dyn InsightGenerator>,
}

impl<'a> ForecastPipeline<'a> {
    pub fn new(config: &'a ForecastConfig) -> Self {
        Self {
            config,
            insights: None,
        }
    }

    /// Use an insight generator for qualitative commentary
    pub fn with_insights(mut self, generator: &'a dyn InsightGenerator) -> Self {
        self.insights = Some(generator);
        self
    }

    /// Run over a JSON document that should hold a list of records
    pub async fn run(
        &self,
        input: &Value,
        scenarios: &[ScenarioDescriptor],
    ) -> Result<ForecastResult> {
        self.config.validate()?;
        let started_at = Utc::now();
        let clock = Instant::now();
        let data = normalize_value(input).map_err(|e| {
            warn!(error = %e, "Forecast input rejected");
            e
        })?;
        self.execute(data, scenarios, started_at, clock).await
    }

    /// Run over already-decoded records
    pub async fn run_records(
        &self,
        records: &[RawTransaction],
        scenarios: &[ScenarioDescriptor],
    ) -> Result<ForecastResult> {
        self.config.validate()?;
        let started_at = Utc::now();
        let clock = Instant::now();
        self.execute(normalize(records), scenarios, started_at, clock)
            .await
    }

    /// Run until `cancel` resolves; a cancelled run returns no partial output
    pub async fn run_with_cancel<C>(
        &self,
        input: &Value,
        scenarios: &[ScenarioDescriptor],
        cancel: C,
    ) -> Result<ForecastResult>
    where
        C: Future<Output = ()>,
    {
        tokio::select! {
            biased;
            _ = cancel => {
                info!("Forecast run cancelled");
                Err(Error::Cancelled)
            }
            result = self.run(input, scenarios) => result,
        }
    }

    async fn execute(
        &self,
        data: NormalizedData,
        scenarios: &[ScenarioDescriptor],
        started_at: DateTime<Utc>,
        clock: Instant,
    ) -> Result<ForecastResult> {
        let mut state = ForecastState::default();

        // Normalize
        let t = Instant::now();
        if data.is_empty() {
            state.finish(Stage::Normalize, StageOutcome::Fatal, t);
            let message = if data.dropped.is_empty() {
                "no transactions supplied".to_string()
            } else {
                format!(
                    "no usable transactions: all {} records were invalid",
                    data.dropped.len()
                )
            };
            warn!(%message, "Forecast aborted");
            return Err(Error::Validation(message));
        }
        for dropped in &data.dropped {
            state.record(
                Stage::Normalize,
                &Error::Validation(format!(
                    "record {} dropped: {}",
                    dropped.index, dropped.reason
                )),
            );
        }
        let outcome = if data.dropped.is_empty() {
            StageOutcome::Success
        } else {
            StageOutcome::Partial
        };
        state.data = data;
        state.finish(Stage::Normalize, outcome, t);

        self.analyze_patterns(&mut state);
        self.generate_insights(&mut state).await;
        self.project(&mut state);
        self.compose_scenarios(&mut state, scenarios);
        self.validate(&mut state);
        self.score(&mut state);

        let finished_at = Utc::now();
        let total_ms = clock.elapsed().as_millis() as u64;
        let is_reliable = state.backtest.as_ref().is_some_and(|b| b.is_reliable);
        info!(
            transactions = state.data.transactions.len(),
            horizons = state.projections.len(),
            errors = state.errors.len(),
            is_reliable,
            total_ms,
            "Forecast complete"
        );

        let ForecastState {
            data,
            analysis,
            insights,
            insight_backend,
            projections,
            variants,
            scenarios,
            backtest,
            quality,
            errors,
            timings,
        } = state;

        Ok(ForecastResult {
            summary: data.summary,
            projections,
            scenario_variants: variants,
            scenarios,
            patterns: analysis,
            insights: insights.strategic_insights,
            risks: insights.financial_risks,
            opportunities: insights.opportunities,
            recommendations: insights.recommendations,
            insight_backend,
            quality,
            backtest,
            dropped_records: data.dropped,
            has_errors: !errors.is_empty(),
            errors,
            is_reliable,
            timing: Timing {
                started_at,
                finished_at,
                total_ms,
                stages: timings,
            },
        })
    }

    fn analyze_patterns(&self, state: &mut ForecastState) {
        let t = Instant::now();
        let report = PatternAnalyzer::new(self.config).analyze(&state.data.transactions);
        for issue in &report.issues {
            state.record(Stage::Patterns, issue);
        }
        let outcome = if report.issues.is_empty() {
            StageOutcome::Success
        } else {
            StageOutcome::Partial
        };
        debug!(
            recurring = report.analysis.recurring.len(),
            seasonal = report.analysis.seasonality.detected,
            trend = report.analysis.trend.is_some(),
            "Patterns analyzed"
        );
        state.analysis = Some(report.analysis);
        state.finish(Stage::Patterns, outcome, t);
    }

    async fn generate_insights(&self, state: &mut ForecastState) {
        let (Some(generator), Some(analysis)) = (self.insights, state.analysis.as_ref()) else {
            return;
        };
        let t = Instant::now();
        let context =
            InsightContext::build(&state.data.summary, &state.data.transactions, analysis);
        let outcome =
            generate_with_timeout(generator, &context, self.config.insights.timeout()).await;

        state.insight_backend = Some(generator.name().to_string());
        let stage_outcome = match outcome.error() {
            Some(e) => {
                state.record(Stage::Insights, &e);
                StageOutcome::Partial
            }
            None => StageOutcome::Success,
        };
        state.insights = outcome.into_bundle();
        state.finish(Stage::Insights, stage_outcome, t);
    }

    fn project(&self, state: &mut ForecastState) {
        let Some(analysis) = state.analysis.as_ref() else {
            return;
        };
        let t = Instant::now();
        let engine = ProjectionEngine::new(self.config);
        match engine.project(&state.data.summary, &state.data.transactions, analysis) {
            Ok(report) => {
                for issue in &report.issues {
                    state.record(Stage::Projection, issue);
                }
                let outcome = if report.issues.is_empty() {
                    StageOutcome::Success
                } else {
                    StageOutcome::Partial
                };
                state.variants = engine.scenario_variants(&report.projections);
                state.projections = report.projections;
                state.finish(Stage::Projection, outcome, t);
            }
            Err(e) => {
                warn!(error = %e, "Projection failed");
                state.record(Stage::Projection, &e);
                state.finish(Stage::Projection, StageOutcome::Partial, t);
            }
        }
    }

    fn compose_scenarios(&self, state: &mut ForecastState, scenarios: &[ScenarioDescriptor]) {
        if scenarios.is_empty() {
            return;
        }
        let t = Instant::now();
        if state.projections.is_empty() {
            state.record(
                Stage::Scenarios,
                &Error::InsufficientData("no projections to apply scenarios to".into()),
            );
            state.finish(Stage::Scenarios, StageOutcome::Partial, t);
            return;
        }

        let report = compose(&state.projections, scenarios);
        for issue in &report.issues {
            state.record(Stage::Scenarios, issue);
        }
        let outcome = if report.issues.is_empty() {
            StageOutcome::Success
        } else {
            StageOutcome::Partial
        };
        state.scenarios = Some(report.composition);
        state.finish(Stage::Scenarios, outcome, t);
    }

    fn validate(&self, state: &mut ForecastState) {
        let t = Instant::now();
        let engine = ProjectionEngine::new(self.config);
        let report = backtest(&state.data.transactions, &self.config.backtest, |train| {
            engine.expected_monthly_flow(train)
        });

        let outcome = if report.evaluated() {
            StageOutcome::Success
        } else {
            state.record(
                Stage::Validation,
                &Error::InsufficientData(format!(
                    "no back-test period had enough data ({} skipped)",
                    report.skipped.len()
                )),
            );
            StageOutcome::Partial
        };
        debug!(
            evaluated = report.periods.len(),
            mean_error = ?report.mean_percentage_error,
            "Back-test finished"
        );
        state.backtest = Some(report);
        state.finish(Stage::Validation, outcome, t);
    }

    fn score(&self, state: &mut ForecastState) {
        let t = Instant::now();
        let horizon = self.config.effective_scenario_horizon();
        let base_confidence = state
            .projections
            .iter()
            .find(|p| p.horizon_months == horizon)
            .map(|p| p.confidence)
            .unwrap_or(0.0);
        let (recurring_count, seasonality_detected, trend_strength) = state
            .analysis
            .as_ref()
            .map(|a| (a.recurring.len(), a.seasonality.detected, a.trend_strength()))
            .unwrap_or((0, false, 0.0));

        let inputs = QualityInputs {
            transaction_count: state.data.transactions.len(),
            recurring_count,
            seasonality_detected,
            trend_strength,
            insight_count: state.insights.total_count(),
            base_confidence,
            backtest_accuracy: state.backtest.as_ref().and_then(|b| b.accuracy()),
        };
        state.quality = Some(quality::score(&inputs));
        state.finish(Stage::Quality, StageOutcome::Success, t);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::{InsightClient, MockBackend};
    use serde_json::json;

    fn config() -> ForecastConfig {
        ForecastConfig {
            seed: Some(7),
            ..ForecastConfig::default()
        }
    }

    fn records(months: u32) -> Value {
        let mut out = Vec::new();
        for i in 0..months {
            let (y, m) = (2023 + (i / 12) as i32, i % 12 + 1);
            out.push(json!({"date": format!("{}-{:02}-01", y, m), "description": "PAYROLL", "amount": 4200, "category": "Salary"}));
            out.push(json!({"date": format!("{}-{:02}-05", y, m), "description": "RENT", "amount": -1500, "category": "Housing"}));
            out.push(json!({"date": format!("{}-{:02}-12", y, m), "description": "UTILITIES", "amount": -180, "category": "Bills"}));
            out.push(json!({"date": format!("{}-{:02}-18", y, m), "description": "GROCERIES", "amount": -450, "category": "Food"}));
            out.push(json!({"date": format!("{}-{:02}-25", y, m), "description": "PHONE", "amount": -60, "category": "Bills"}));
        }
        Value::Array(out)
    }

    #[tokio::test]
    async fn test_full_run() {
        let config = config();
        let result = ForecastPipeline::new(&config)
            .run(&records(12), &[])
            .await
            .unwrap();

        assert_eq!(result.summary.transaction_count, 60);
        assert_eq!(result.projections.len(), 5);
        assert_eq!(result.scenario_variants.len(), 4);
        assert!(result.backtest.as_ref().unwrap().evaluated());
        assert!(result.is_reliable);
        assert!(!result.has_errors, "{:?}", result.errors);
        assert!(result.insights.is_empty());
        assert!(result.insight_backend.is_none());
        assert!(result.scenarios.is_none());
        assert_eq!(result.timing.stages.len(), 5);
        assert!(result.timing.finished_at >= result.timing.started_at);
    }

    #[tokio::test]
    async fn test_non_list_input_is_fatal() {
        let config = config();
        let pipeline = ForecastPipeline::new(&config);
        let err = pipeline
            .run(&json!({"date": "2024-01-01"}), &[])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_empty_after_filtering_is_fatal() {
        let config = config();
        let pipeline = ForecastPipeline::new(&config);
        assert!(pipeline.run(&json!([]), &[]).await.is_err());
        let err = pipeline
            .run(&json!([{"date": "soon", "amount": 5}, {"amount": "abc"}]), &[])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("all 2 records"));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected() {
        let config = ForecastConfig {
            horizons: vec![0, 12],
            ..config()
        };
        let pipeline = ForecastPipeline::new(&config);
        let err = pipeline.run(&records(6), &[]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        let err = pipeline.run_records(&[], &[]).await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_dropped_records_are_errors_not_fatal() {
        let config = config();
        let mut input = records(6);
        input
            .as_array_mut()
            .unwrap()
            .push(json!({"date": "not a date", "amount": 10}));
        let result = ForecastPipeline::new(&config)
            .run(&input, &[])
            .await
            .unwrap();
        assert_eq!(result.dropped_records.len(), 1);
        assert!(result.has_errors);
        assert!(result
            .errors
            .iter()
            .any(|e| e.stage == Stage::Normalize && e.kind == ErrorKind::Validation));
    }

    #[tokio::test]
    async fn test_single_month_degrades() {
        let config = config();
        let result = ForecastPipeline::new(&config)
            .run(&records(1), &[])
            .await
            .unwrap();
        assert!(result.patterns.as_ref().unwrap().trend.is_none());
        assert!(!result.projections.is_empty());
        assert!(!result.is_reliable);
        assert!(result
            .errors
            .iter()
            .any(|e| e.kind == ErrorKind::InsufficientData));
    }

    #[tokio::test]
    async fn test_insights_and_scenarios() {
        let config = config();
        let client = InsightClient::mock();
        let scenarios = vec![
            ScenarioDescriptor::new("salary_change", json!({"percent": 5})),
            ScenarioDescriptor::new("unknown", json!({})),
        ];
        let result = ForecastPipeline::new(&config)
            .with_insights(&client)
            .run(&records(12), &scenarios)
            .await
            .unwrap();

        assert_eq!(result.insight_backend.as_deref(), Some("mock"));
        assert_eq!(result.insights.len(), 2);
        assert_eq!(result.recommendations.len(), 2);
        let composition = result.scenarios.as_ref().unwrap();
        assert_eq!(composition.steps.len(), 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].stage, Stage::Scenarios);
    }

    #[tokio::test]
    async fn test_failed_insights_degrade() {
        let config = config();
        let client = InsightClient::Mock(MockBackend::failing());
        let result = ForecastPipeline::new(&config)
            .with_insights(&client)
            .run(&records(12), &[])
            .await
            .unwrap();
        assert!(result.insights.is_empty());
        assert!(result.errors.iter().any(|e| e.stage == Stage::Insights));
        assert_eq!(result.projections.len(), 5);
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let config = config();
        let client = InsightClient::Mock(MockBackend::slow(std::time::Duration::from_secs(60)));
        let pipeline = ForecastPipeline::new(&config).with_insights(&client);
        let result = pipeline
            .run_with_cancel(&records(6), &[], std::future::ready(()))
            .await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_seeded_runs_match() {
        let config = config();
        let pipeline = ForecastPipeline::new(&config);
        let a = pipeline.run(&records(12), &[]).await.unwrap();
        let b = pipeline.run(&records(12), &[]).await.unwrap();
        assert_eq!(a.projections, b.projections);
    }
}
