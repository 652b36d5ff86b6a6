//! Ollama backend implementation
//!
//! HTTP client for the Ollama generate API. The financial summary is sent as
//! JSON inside the prompt and the model is asked to answer with a JSON object.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};

use super::parsing::parse_insights;
use super::types::{InsightBundle, InsightContext};
use super::InsightGenerator;

const INSIGHT_INSTRUCTIONS: &str = "You are a careful personal finance analyst. \
Review the financial summary below and respond with ONLY a JSON object with four \
arrays of short strings: \"strategicInsights\", \"financialRisks\", \"opportunities\" \
and \"recommendations\". Use at most 4 items per array. Do not invent numbers that \
are not supported by the summary.";

/// Ollama backend
#[derive(Clone)]
pub struct OllamaBackend {
    http_client: Client,
    base_url: String,
    model: String,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    pub fn new(base_url: &str, model: &str) -> Self {
        Self {
            http_client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn host(&self) -> &str {
        &self.base_url
    }
}

/// Build the generate prompt for a context
pub fn build_prompt(context: &InsightContext) -> Result<String> {
    let summary = serde_json::to_string_pretty(context)?;
    Ok(format!(
        "{}\n\nFinancial summary:\n{}\n",
        INSIGHT_INSTRUCTIONS, summary
    ))
}

/// Request to Ollama API
#[derive(Debug, Serialize)]
struct OllamaRequest {
    model: String,
    prompt: String,
    stream: bool,
    format: &'static str,
}

/// Response from Ollama API
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    response: String,
}

#[async_trait]
impl InsightGenerator for OllamaBackend {
    async fn generate_insights(&self, context: &InsightContext) -> Result<InsightBundle> {
        let request = OllamaRequest {
            model: self.model.clone(),
            prompt: build_prompt(context)?,
            stream: false,
            format: "json",
        };

        let response = self
            .http_client
            .post(format!("{}/api/generate", self.base_url))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::InvalidData(format!(
                "Ollama returned HTTP {}",
                status.as_u16()
            )));
        }

        let ollama_response: OllamaResponse = response.json().await?;
        debug!("Ollama insight response: {}", ollama_response.response);

        parse_insights(&ollama_response.response)
    }

    async fn health_check(&self) -> bool {
        match self
            .http_client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
        {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    fn name(&self) -> &str {
        "ollama"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Summary;

    fn empty_context() -> InsightContext {
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
    fn test_new_trims_trailing_slash() {
        let backend = OllamaBackend::new("http://localhost:11434/", "llama3.2");
        assert_eq!(backend.host(), "http://localhost:11434");
        assert_eq!(backend.model(), "llama3.2");
    }

    #[test]
    fn test_build_prompt_includes_summary() {
        let prompt = build_prompt(&empty_context()).unwrap();
        assert!(prompt.contains("strategicInsights"));
        assert!(prompt.contains("\"currentBalance\""));
    }

    #[tokio::test]
    async fn test_unreachable_host_fails() {
        let backend = OllamaBackend::new("http://127.0.0.1:9", "llama3.2");
        assert!(!backend.health_check().await);
        assert!(backend.generate_insights(&empty_context()).await.is_err());
    }
}
