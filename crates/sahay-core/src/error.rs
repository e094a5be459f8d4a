//! Error types for Sahay

use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("AI service error: {0}")]
    Ai(#[from] AiError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of the external text-generation collaborator
///
/// Every variant is recoverable: callers downgrade to the rule-based path.
#[derive(Error, Debug)]
pub enum AiError {
    #[error("AI backend unavailable: {0}")]
    Unavailable(String),

    #[error("AI call timed out after {0:?}")]
    Timeout(Duration),

    #[error("AI HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Unparseable AI response: {0}")]
    Parse(String),

    #[error("AI output rejected: {0}")]
    Validation(String),
}
