//! Test utilities for runway-core
//!
//! This module provides a mock Ollama server that can be used for
//! development and integration tests of the insight generator.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Json, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::oneshot;

/// How the mock server answers generate requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MockMode {
    /// Well-formed insight JSON
    #[default]
    Normal,
    /// Prose with no JSON object
    Garbage,
    /// Well-formed JSON after a delay
    Delay(Duration),
    /// HTTP 500
    ServerError,
}

/// Mock Ollama server for testing and development
pub struct MockOllamaServer {
    addr: SocketAddr,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockOllamaServer {
    /// Start a well-behaved mock server on an available port
    pub async fn start() -> Self {
        Self::start_with(MockMode::Normal).await
    }

    /// Start the mock server with a specific response mode
    pub async fn start_with(mode: MockMode) -> Self {
        let app = Router::new()
            .route("/api/tags", get(handle_tags))
            .route("/api/generate", post(handle_generate))
            .with_state(mode);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    shutdown_rx.await.ok();
                })
                .await
                .unwrap();
        });

        Self {
            addr,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    /// Get the base URL for this mock server
    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// Stop the mock server
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

impl Drop for MockOllamaServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Ollama tags endpoint response (health check)
async fn handle_tags() -> Json<TagsResponse> {
    Json(TagsResponse {
        models: vec![ModelInfo {
            name: "llama3.2:latest".to_string(),
            modified_at: "2024-01-01T00:00:00Z".to_string(),
            size: 2_000_000_000,
        }],
    })
}

/// Ollama generate endpoint
async fn handle_generate(
    State(mode): State<MockMode>,
    Json(request): Json<GenerateRequest>,
) -> impl IntoResponse {
    let response = match mode {
        MockMode::Normal => insights_mock(&request.prompt),
        MockMode::Garbage => "I'm sorry, I can only answer in prose today.".to_string(),
        MockMode::Delay(delay) => {
            tokio::time::sleep(delay).await;
            insights_mock(&request.prompt)
        }
        MockMode::ServerError => {
            return (StatusCode::INTERNAL_SERVER_ERROR, "model crashed").into_response();
        }
    };

    Json(GenerateResponse {
        model: request.model,
        response,
        done: true,
    })
    .into_response()
}

/// Answer from the summary embedded in the prompt
fn insights_mock(prompt: &str) -> String {
    let overspending = prompt.contains("\"netIncome\": -");
    let risks: Vec<&str> = if overspending {
        vec!["Spending is outpacing income"]
    } else {
        vec![]
    };
    let body = serde_json::json!({
        "strategicInsights": ["Income arrives on a regular schedule"],
        "financialRisks": risks,
        "opportunities": ["Compare utility providers"],
        "recommendations": ["Keep three months of expenses in savings"],
    });
    // Models often wrap the JSON in prose
    format!("Here is my analysis:\n{}", body)
}

#[derive(Debug, Serialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

#[derive(Debug, Serialize)]
struct ModelInfo {
    name: String,
    modified_at: String,
    size: u64,
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    model: String,
    prompt: String,
    #[allow(dead_code)]
    #[serde(default)]
    stream: bool,
}

#[derive(Debug, Serialize)]
struct GenerateResponse {
    model: String,
    response: String,
    done: bool,
}
