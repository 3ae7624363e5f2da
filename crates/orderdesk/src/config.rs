use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;

/// Process configuration, constructed once at startup and passed by
/// reference to whichever component needs it. Nothing reads these
/// environment variables after this point.
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the OpenAI-compatible chat-completions endpoint
    pub model_host: String,
    /// Bearer token for the model endpoint
    pub api_key: String,
    /// Model identifier handed to the agents
    pub model: String,
    /// Sampling temperature; the support agents run deterministic
    pub temperature: Option<f32>,
    /// Path to the SQLite resolution database
    pub database_path: PathBuf,
    /// Base URL of the log-search service
    pub log_search_url: String,
}

impl Config {
    /// Load configuration from the environment (a `.env` file is
    /// honored when present).
    pub fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let model_host = env::var("ORDERDESK_MODEL_HOST")
            .context("ORDERDESK_MODEL_HOST environment variable must be set")?;
        let api_key = env::var("ORDERDESK_API_KEY")
            .context("ORDERDESK_API_KEY environment variable must be set")?;
        let model = env::var("ORDERDESK_MODEL")
            .context("ORDERDESK_MODEL environment variable must be set")?;
        let log_search_url = env::var("ORDERDESK_LOG_SEARCH_URL")
            .context("ORDERDESK_LOG_SEARCH_URL environment variable must be set")?;
        let database_path = env::var("ORDERDESK_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("orderdesk.db"));

        Ok(Self {
            model_host,
            api_key,
            model,
            temperature: Some(0.0),
            database_path,
            log_search_url,
        })
    }
}
