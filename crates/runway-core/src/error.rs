//! Error types for Runway

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("Insight generator timed out after {0}s")]
    CollaboratorTimeout(u64),

    #[error("Computation error: {0}")]
    Computation(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Forecast run cancelled")]
    Cancelled,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

impl Error {
    /// Classify the error for the `errors[]` list of a forecast result
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::InvalidData(_) | Self::Json(_) => ErrorKind::Validation,
            Self::InsufficientData(_) => ErrorKind::InsufficientData,
            Self::CollaboratorTimeout(_) | Self::Http(_) => ErrorKind::CollaboratorTimeout,
            Self::Computation(_) => ErrorKind::Computation,
            Self::Config(_) | Self::Toml(_) | Self::Io(_) => ErrorKind::Configuration,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }
}

/// Serializable error category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InsufficientData,
    CollaboratorTimeout,
    Computation,
    Configuration,
    Cancelled,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::InsufficientData => "insufficient_data",
            Self::CollaboratorTimeout => "collaborator_timeout",
            Self::Computation => "computation",
            Self::Configuration => "configuration",
            Self::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
