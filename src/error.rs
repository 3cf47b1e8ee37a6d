//! Error types for wayfinder

use thiserror::Error;

/// Main error type for wayfinder operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid coordinates: {0}")]
    InvalidCoordinates(String),

    #[error("Could not parse coordinates '{input}': {reason}")]
    CoordinateParse { input: String, reason: String },

    #[error("Provider {provider} accepts {expected} queries, got {got}")]
    QueryShape {
        provider: &'static str,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Provider {provider} failed: {reason}")]
    Provider { provider: &'static str, reason: String },

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server error: {0}")]
    Server(String),
}

impl Error {
    pub(crate) fn provider(provider: &'static str, reason: impl Into<String>) -> Self {
        Error::Provider {
            provider,
            reason: reason.into(),
        }
    }
}

/// Result type alias for wayfinder operations
pub type Result<T> = std::result::Result<T, Error>;
