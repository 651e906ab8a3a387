//! Environment-driven configuration.
//!
//! All external endpoints and tuning knobs live here so components can be
//! constructed explicitly from a [`Settings`] value instead of reaching for
//! process-global client handles. Binaries call [`Settings::from_env`] once
//! after `dotenvy::dotenv()`.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::chunker;
use crate::types::AssistantError;

/// Runtime configuration for both the ingestion and query paths.
#[derive(Clone, Debug)]
pub struct Settings {
    /// API key for the OpenAI-compatible model service.
    pub model_api_key: String,
    /// Base URL of the model service (embeddings + chat completions).
    pub model_api_base: String,
    /// Chat completion model identifier.
    pub chat_model: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Dimensionality of the embedding vectors; fixes the vector table schema.
    pub embedding_dimensions: usize,
    /// Path of the SQLite knowledge store.
    pub database_path: PathBuf,
    /// Address the HTTP server binds to.
    pub bind_addr: String,
    /// Minimum similarity for a chunk to be retrieved, in [0, 1].
    pub match_threshold: f32,
    /// Maximum number of chunks retrieved per question.
    pub match_count: usize,
    /// Maximum chunk size in characters.
    pub chunk_max_size: usize,
    /// Overlap between consecutive chunks in characters.
    pub chunk_overlap: usize,
    /// Timeout for a single ingestion page fetch.
    pub fetch_timeout: Duration,
    /// Maximum fetch attempts per page before the URL is reported as failed.
    pub fetch_max_attempts: usize,
}

impl Settings {
    /// Loads settings from the environment. `MODEL_API_KEY` is required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self, AssistantError> {
        let settings = Self {
            model_api_key: env::var("MODEL_API_KEY")
                .map_err(|_| AssistantError::Config("MODEL_API_KEY is not set".to_string()))?,
            model_api_base: var_or("MODEL_API_BASE", "https://api.openai.com/v1"),
            chat_model: var_or("CHAT_MODEL", "gpt-4o-mini"),
            embedding_model: var_or("EMBEDDING_MODEL", "text-embedding-3-small"),
            embedding_dimensions: parsed_var("EMBEDDING_DIMENSIONS", 1536)?,
            database_path: PathBuf::from(var_or("DATABASE_PATH", "./dronemind.sqlite")),
            bind_addr: var_or("BIND_ADDR", "127.0.0.1:3000"),
            match_threshold: parsed_var("MATCH_THRESHOLD", 0.2)?,
            match_count: parsed_var("MATCH_COUNT", 3)?,
            chunk_max_size: parsed_var("CHUNK_MAX_SIZE", chunker::DEFAULT_MAX_SIZE)?,
            chunk_overlap: parsed_var("CHUNK_OVERLAP", chunker::DEFAULT_OVERLAP)?,
            fetch_timeout: Duration::from_secs(parsed_var("FETCH_TIMEOUT_SECS", 60)?),
            fetch_max_attempts: parsed_var("FETCH_MAX_ATTEMPTS", 3)?,
        };
        settings.validate()?;
        Ok(settings)
    }

    /// Rejects configurations the pipelines cannot run with.
    pub fn validate(&self) -> Result<(), AssistantError> {
        if self.embedding_dimensions == 0 {
            return Err(AssistantError::Config(
                "EMBEDDING_DIMENSIONS must be greater than zero".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.match_threshold) {
            return Err(AssistantError::Config(format!(
                "MATCH_THRESHOLD must be in [0, 1], got {}",
                self.match_threshold
            )));
        }
        if self.match_count == 0 {
            return Err(AssistantError::Config(
                "MATCH_COUNT must be greater than zero".to_string(),
            ));
        }
        if self.chunk_overlap >= self.chunk_max_size {
            return Err(AssistantError::Config(format!(
                "CHUNK_OVERLAP ({}) must be smaller than CHUNK_MAX_SIZE ({})",
                self.chunk_overlap, self.chunk_max_size
            )));
        }
        if self.fetch_max_attempts == 0 {
            return Err(AssistantError::Config(
                "FETCH_MAX_ATTEMPTS must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T, AssistantError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|err| AssistantError::Config(format!("invalid {name}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_settings() -> Settings {
        Settings {
            model_api_key: "test-key".to_string(),
            model_api_base: "https://api.openai.com/v1".to_string(),
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_dimensions: 1536,
            database_path: PathBuf::from("./dronemind.sqlite"),
            bind_addr: "127.0.0.1:3000".to_string(),
            match_threshold: 0.2,
            match_count: 3,
            chunk_max_size: 512,
            chunk_overlap: 100,
            fetch_timeout: Duration::from_secs(60),
            fetch_max_attempts: 3,
        }
    }

    #[test]
    fn defaults_validate() {
        assert!(valid_settings().validate().is_ok());
    }

    #[test]
    fn overlap_not_below_max_size_is_rejected() {
        let mut settings = valid_settings();
        settings.chunk_overlap = 512;
        assert!(matches!(
            settings.validate(),
            Err(AssistantError::Config(_))
        ));
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let mut settings = valid_settings();
        settings.match_threshold = 1.5;
        assert!(settings.validate().is_err());
        settings.match_threshold = -0.1;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn zero_match_count_is_rejected() {
        let mut settings = valid_settings();
        settings.match_count = 0;
        assert!(settings.validate().is_err());
    }
}
