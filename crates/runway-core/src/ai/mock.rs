//! Mock backend for testing
//!
//! Provides configurable responses for the insight generator.
//! Useful for unit tests and development without a running LLM server.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::parsing::parse_insights;
use super::types::{InsightBundle, InsightContext};
use super::InsightGenerator;

/// How the mock responds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockBehavior {
    /// Return a fixed, well-formed bundle
    #[default]
    Healthy,
    /// Return an error
    Failing,
    /// Return text that is not a valid insight payload
    Malformed,
    /// Sleep before answering (for timeout tests)
    Slow(Duration),
}

/// Mock insight backend for testing
#[derive(Clone, Default)]
pub struct MockBackend {
    pub behavior: MockBehavior,
}

impl MockBackend {
    /// Create a new mock backend (healthy by default)
    pub fn new() -> Self {
        Self {
            behavior: MockBehavior::Healthy,
        }
    }

    pub fn failing() -> Self {
        Self {
            behavior: MockBehavior::Failing,
        }
    }

    pub fn malformed() -> Self {
        Self {
            behavior: MockBehavior::Malformed,
        }
    }

    pub fn slow(delay: Duration) -> Self {
        Self {
            behavior: MockBehavior::Slow(delay),
        }
    }

    /// The bundle returned by a healthy mock
    pub fn canned_bundle() -> InsightBundle {
        InsightBundle {
            strategic_insights: vec![
                "Income arrives on a steady monthly schedule".to_string(),
                "Housing is the dominant fixed cost".to_string(),
            ],
            financial_risks: vec!["Emergency fund covers less than three months".to_string()],
            opportunities: vec!["Consolidate overlapping subscriptions".to_string()],
            recommendations: vec![
                "Automate a transfer to savings on payday".to_string(),
                "Review insurance premiums annually".to_string(),
            ],
        }
    }
}

#[async_trait]
impl InsightGenerator for MockBackend {
    async fn generate_insights(&self, _context: &InsightContext) -> Result<InsightBundle> {
        match self.behavior {
            MockBehavior::Healthy => Ok(Self::canned_bundle()),
            MockBehavior::Failing => Err(Error::InvalidData("mock insight failure".into())),
            MockBehavior::Malformed => parse_insights("Sorry, I can't produce JSON today."),
            MockBehavior::Slow(delay) => {
                tokio::time::sleep(delay).await;
                Ok(Self::canned_bundle())
            }
        }
    }

    async fn health_check(&self) -> bool {
        !matches!(self.behavior, MockBehavior::Failing)
    }

    fn name(&self) -> &str {
        "mock"
    }
}
