//! Configuration management for deskflow.
//!
//! Configuration can be set via environment variables:
//! - `GROQ_API_KEY` - Required. Your Groq API key.
//! - `HOST` - Optional. Server host. Defaults to `127.0.0.1`.
//! - `PORT` - Optional. Server port. Defaults to `8000`.
//! - `DATABASE_PATH` - Optional. SQLite database file. Defaults to `deskflow.db`.
//! - `REQUEST_TIMEOUT_SECS` - Optional. Per-completion timeout. Defaults to `60`.
//! - `CLASSIFIER_MODEL`, `RESEARCHER_MODEL`, `VALIDATOR_MODEL`,
//!   `WRITER_MODEL`, `REVIEWER_MODEL` - Optional per-role model overrides.

use std::path::PathBuf;

use thiserror::Error;

use crate::agents::AgentModels;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Groq API key
    pub api_key: String,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// SQLite database file for workflow persistence
    pub database_path: PathBuf,

    /// Timeout for a single completion request, in seconds
    pub request_timeout_secs: u64,

    /// Model assignment per agent role
    pub models: AgentModels,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GROQ_API_KEY` is not set.
    pub fn from_env() -> Result<Self, ConfigError> {
        let api_key = std::env::var("GROQ_API_KEY")
            .map_err(|_| ConfigError::MissingEnvVar("GROQ_API_KEY".to_string()))?;

        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8000".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let database_path = std::env::var("DATABASE_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("deskflow.db"));

        let request_timeout_secs = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .map_err(|e| {
                ConfigError::InvalidValue("REQUEST_TIMEOUT_SECS".to_string(), format!("{}", e))
            })?;

        let mut models = AgentModels::default();
        if let Ok(model) = std::env::var("CLASSIFIER_MODEL") {
            models.classifier = model;
        }
        if let Ok(model) = std::env::var("RESEARCHER_MODEL") {
            models.researcher = model;
        }
        if let Ok(model) = std::env::var("VALIDATOR_MODEL") {
            models.validator = model;
        }
        if let Ok(model) = std::env::var("WRITER_MODEL") {
            models.writer = model;
        }
        if let Ok(model) = std::env::var("REVIEWER_MODEL") {
            models.reviewer = model;
        }

        Ok(Self {
            api_key,
            host,
            port,
            database_path,
            request_timeout_secs,
            models,
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(api_key: String, database_path: PathBuf) -> Self {
        Self {
            api_key,
            host: "127.0.0.1".to_string(),
            port: 8000,
            database_path,
            request_timeout_secs: 60,
            models: AgentModels::default(),
        }
    }
}
