//! Pluggable insight generator abstraction
//!
//! Qualitative commentary (insights, risks, opportunities, recommendations)
//! comes from an optional collaborator. The pipeline only sees the
//! `InsightGenerator` trait, so a local LLM, a rule-based heuristic or a
//! mock can be swapped without touching the forecast stages.
//!
//! # Architecture
//!
//! - `InsightGenerator` trait: the interface for all backends
//! - `InsightClient` enum: concrete wrapper providing Clone + compile-time dispatch
//! - Backend implementations: `OllamaBackend`, `HeuristicBackend`, `MockBackend`
//! - `generate_with_timeout`: the guarded call the pipeline makes
//!
//! # Configuration
//!
//! Environment variables:
//! - `INSIGHT_BACKEND`: ollama, heuristic, mock or none. Default: config file value
//! - `OLLAMA_HOST`: Ollama server URL (required for ollama backend)
//! - `OLLAMA_MODEL`: Model name (default: llama3.2)

mod heuristic;
mod mock;
mod ollama;
pub mod parsing;
pub mod types;

pub use heuristic::HeuristicBackend;
pub use mock::{MockBackend, MockBehavior};
pub use ollama::OllamaBackend;
pub use types::*;

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::InsightsConfig;
use crate::error::{Error, Result};

/// Trait defining the interface for insight generators
///
/// Backends should be Send + Sync so concurrent forecast runs can share one.
#[async_trait]
pub trait InsightGenerator: Send + Sync {
    /// Produce qualitative commentary for a financial summary
    async fn generate_insights(&self, context: &InsightContext) -> Result<InsightBundle>;

    /// Check if the backend is available
    async fn health_check(&self) -> bool;

    /// Backend name (for logging and result metadata)
    fn name(&self) -> &str;
}

/// Concrete insight client enum
#[derive(Clone)]
pub enum InsightClient {
    /// Ollama backend (HTTP API)
    Ollama(OllamaBackend),
    /// Rule-based local commentary
    Heuristic(HeuristicBackend),
    /// Mock backend for testing
    Mock(MockBackend),
}

impl InsightClient {
    /// Create a client from environment variables
    ///
    /// Returns None when `INSIGHT_BACKEND` is unset or `none`, or when the
    /// selected backend lacks its required variables.
    pub fn from_env() -> Option<Self> {
        let backend = std::env::var("INSIGHT_BACKEND").ok()?;
        let model = std::env::var("OLLAMA_MODEL").ok();
        Self::select(&backend, std::env::var("OLLAMA_HOST").ok(), model.as_deref())
    }

    /// Create a client from the `[insights]` config section
    ///
    /// `INSIGHT_BACKEND` and `OLLAMA_HOST`/`OLLAMA_MODEL` override the file.
    pub fn from_config(config: &InsightsConfig) -> Option<Self> {
        let backend =
            std::env::var("INSIGHT_BACKEND").unwrap_or_else(|_| config.backend.clone());
        let host = std::env::var("OLLAMA_HOST")
            .ok()
            .or_else(|| config.host.clone());
        let model = std::env::var("OLLAMA_MODEL").unwrap_or_else(|_| config.model.clone());
        Self::select(&backend, host, Some(&model))
    }

    fn select(backend: &str, host: Option<String>, model: Option<&str>) -> Option<Self> {
        match backend.to_lowercase().as_str() {
            "" | "none" | "off" => None,
            "ollama" => match host {
                Some(host) => Some(InsightClient::Ollama(OllamaBackend::new(
                    &host,
                    model.unwrap_or("llama3.2"),
                ))),
                None => {
                    tracing::warn!("Ollama insight backend selected but no host configured");
                    None
                }
            },
            "heuristic" | "local" => Some(InsightClient::Heuristic(HeuristicBackend::new())),
            "mock" => Some(InsightClient::Mock(MockBackend::new())),
            other => {
                tracing::warn!(backend = %other, "Unknown insight backend, insights disabled");
                None
            }
        }
    }

    /// Create a mock backend for testing
    pub fn mock() -> Self {
        InsightClient::Mock(MockBackend::new())
    }

    /// Create a heuristic backend
    pub fn heuristic() -> Self {
        InsightClient::Heuristic(HeuristicBackend::new())
    }
}

#[async_trait]
impl InsightGenerator for InsightClient {
    async fn generate_insights(&self, context: &InsightContext) -> Result<InsightBundle> {
        match self {
            InsightClient::Ollama(b) => b.generate_insights(context).await,
            InsightClient::Heuristic(b) => b.generate_insights(context).await,
            InsightClient::Mock(b) => b.generate_insights(context).await,
        }
    }

    async fn health_check(&self) -> bool {
        match self {
            InsightClient::Ollama(b) => b.health_check().await,
            InsightClient::Heuristic(b) => b.health_check().await,
            InsightClient::Mock(b) => b.health_check().await,
        }
    }

    fn name(&self) -> &str {
        match self {
            InsightClient::Ollama(b) => b.name(),
            InsightClient::Heuristic(b) => b.name(),
            InsightClient::Mock(b) => b.name(),
        }
    }
}

/// Result of a guarded insight call
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightOutcome {
    Generated { bundle: InsightBundle },
    TimedOut { after_secs: u64 },
    Failed { message: String },
}

impl InsightOutcome {
    /// The bundle, or empty lists when the call did not succeed
    pub fn into_bundle(self) -> InsightBundle {
        match self {
            InsightOutcome::Generated { bundle } => bundle,
            _ => InsightBundle::default(),
        }
    }

    /// The error to record when the call did not succeed
    pub fn error(&self) -> Option<Error> {
        match self {
            InsightOutcome::Generated { .. } => None,
            InsightOutcome::TimedOut { after_secs } => {
                Some(Error::CollaboratorTimeout(*after_secs))
            }
            InsightOutcome::Failed { message } => Some(Error::InvalidData(message.clone())),
        }
    }
}

/// Call the generator under a timeout; never returns an error
pub async fn generate_with_timeout<G>(
    generator: &G,
    context: &InsightContext,
    timeout: Duration,
) -> InsightOutcome
where
    G: InsightGenerator + ?Sized,
{
    match tokio::time::timeout(timeout, generator.generate_insights(context)).await {
        Ok(Ok(bundle)) => {
            tracing::debug!(
                backend = generator.name(),
                count = bundle.total_count(),
                "Insights generated"
            );
            InsightOutcome::Generated { bundle }
        }
        Ok(Err(e)) => {
            tracing::warn!(backend = generator.name(), error = %e, "Insight generation failed");
            InsightOutcome::Failed {
                message: e.to_string(),
            }
        }
        Err(_) => {
            tracing::warn!(
                backend = generator.name(),
                timeout_secs = timeout.as_secs(),
                "Insight generation timed out"
            );
            InsightOutcome::TimedOut {
                after_secs: timeout.as_secs(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summary;

    fn context() -> InsightContext {
        InsightContext {
            summary: Summary::default(),
            average_monthly_income: 0.0,
            average_monthly_expenses: 0.0,
            seasonality_detected: false,
            peak_income_months: vec![],
            peak_expense_months: vec![],
            recurring: vec![],
            trend: None,
            top_expense_categories: vec![],
        }
    }

    #[test]
    fn test_select_backends() {
        assert!(InsightClient::select("none", None, None).is_none());
        assert!(InsightClient::select("ollama", None, None).is_none());
        assert!(InsightClient::select("bogus", None, None).is_none());
        assert!(matches!(
            InsightClient::select("Heuristic", None, None),
            Some(InsightClient::Heuristic(_))
        ));
        match InsightClient::select("ollama", Some("http://h:1/".into()), Some("m")) {
            Some(InsightClient::Ollama(b)) => {
                assert_eq!(b.host(), "http://h:1");
                assert_eq!(b.model(), "m");
            }
            _ => panic!("expected ollama backend"),
        }
    }

    // The only test that touches these variables, so it runs them in sequence
    #[test]
    fn test_env_selection() {
        std::env::set_var("INSIGHT_BACKEND", "ollama");
        std::env::set_var("OLLAMA_HOST", "http://gpu-box:11434");
        std::env::set_var("OLLAMA_MODEL", "qwen2.5");
        match InsightClient::from_env() {
            Some(InsightClient::Ollama(b)) => {
                assert_eq!(b.host(), "http://gpu-box:11434");
                assert_eq!(b.model(), "qwen2.5");
            }
            _ => panic!("expected ollama backend"),
        }

        // Environment wins over the config file
        let file = InsightsConfig::default();
        assert!(matches!(
            InsightClient::from_config(&file),
            Some(InsightClient::Ollama(_))
        ));

        std::env::remove_var("OLLAMA_HOST");
        assert!(InsightClient::from_env().is_none());

        std::env::set_var("INSIGHT_BACKEND", "heuristic");
        assert!(matches!(
            InsightClient::from_env(),
            Some(InsightClient::Heuristic(_))
        ));

        std::env::remove_var("INSIGHT_BACKEND");
        std::env::remove_var("OLLAMA_MODEL");
        assert!(InsightClient::from_env().is_none());
    }

    #[tokio::test]
    async fn test_mock_client() {
        let client = InsightClient::mock();
        assert_eq!(client.name(), "mock");
        assert!(client.health_check().await);
        let outcome = generate_with_timeout(&client, &context(), Duration::from_secs(1)).await;
        assert_eq!(
            outcome.clone().into_bundle(),
            MockBackend::canned_bundle()
        );
        assert!(outcome.error().is_none());
    }

    #[tokio::test]
    async fn test_failing_backend_degrades() {
        let client = InsightClient::Mock(MockBackend::failing());
        let outcome = generate_with_timeout(&client, &context(), Duration::from_secs(1)).await;
        assert!(matches!(outcome, InsightOutcome::Failed { .. }));
        assert!(outcome.clone().into_bundle().is_empty());
        assert!(matches!(outcome.error(), Some(Error::InvalidData(_))));
    }

    #[tokio::test]
    async fn test_malformed_backend_degrades() {
        let client = InsightClient::Mock(MockBackend::malformed());
        let outcome = generate_with_timeout(&client, &context(), Duration::from_secs(1)).await;
        assert!(matches!(outcome, InsightOutcome::Failed { .. }));
        assert!(outcome.into_bundle().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_backend_times_out() {
        let client = InsightClient::Mock(MockBackend::slow(Duration::from_secs(120)));
        let outcome = generate_with_timeout(&client, &context(), Duration::from_secs(5)).await;
        assert_eq!(outcome, InsightOutcome::TimedOut { after_secs: 5 });
        assert!(matches!(
            outcome.error(),
            Some(Error::CollaboratorTimeout(5))
        ));
    }
}
