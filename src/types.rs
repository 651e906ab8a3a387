//! Error taxonomy shared across the crate.

use thiserror::Error;

/// Errors surfaced by the ingestion and query pipelines.
///
/// Transient external failures (`Fetch`, `Embedding`, `Completion`, `Storage`)
/// are retried only where an explicit [`crate::retry::RetryPolicy`] wraps the
/// call. `Config` and `InvalidInput` are never retried.
#[derive(Debug, Error)]
pub enum AssistantError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("fetch error: {0}")]
    Fetch(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("storage error: {0}")]
    Storage(String),

    #[error("completion error: {0}")]
    Completion(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<std::io::Error> for AssistantError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<reqwest::Error> for AssistantError {
    fn from(err: reqwest::Error) -> Self {
        Self::Fetch(err.to_string())
    }
}
