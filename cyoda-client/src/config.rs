//! Client configuration.

use crate::error::{RepositoryError, RepositoryResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Connection and polling settings for [`CyodaRepository`](crate::CyodaRepository).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the platform API (e.g. `https://example.cyoda.net/api`).
    pub api_url: String,
    /// OAuth2 token endpoint used by [`ClientCredentialsAuth`](crate::ClientCredentialsAuth).
    pub token_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Per-request HTTP timeout (in seconds).
    pub request_timeout_secs: u64,
    /// How long a snapshot search may stay `RUNNING` (in milliseconds).
    pub search_timeout_ms: u64,
    /// Delay between snapshot status polls (in milliseconds).
    pub poll_interval_ms: u64,
    /// Page size used when fetching snapshot results.
    pub page_size: usize,
    /// Entity version used when callers do not name one.
    pub default_entity_version: String,
    /// `source` reported in edge-message metadata.
    pub edge_message_source: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8082/api".to_string(),
            token_url: "http://localhost:8082/api/oauth/token".to_string(),
            client_id: String::new(),
            client_secret: String::new(),
            request_timeout_secs: 60,
            search_timeout_ms: 60_000,
            poll_interval_ms: 500,
            page_size: 100,
            default_entity_version: "1000".to_string(),
            edge_message_source: "cyoda-client".to_string(),
        }
    }
}

impl ClientConfig {
    /// Loads a JSON config file. Missing keys keep their defaults.
    pub fn from_file(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| RepositoryError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: ClientConfig = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Builds a config from `CYODA_*` environment variables on top of the defaults.
    pub fn from_env() -> RepositoryResult<Self> {
        let mut config = ClientConfig::default();

        if let Some(v) = env_var("CYODA_API_URL") {
            config.api_url = v;
        }
        if let Some(v) = env_var("CYODA_TOKEN_URL") {
            config.token_url = v;
        }
        if let Some(v) = env_var("CYODA_CLIENT_ID") {
            config.client_id = v;
        }
        if let Some(v) = env_var("CYODA_CLIENT_SECRET") {
            config.client_secret = v;
        }
        if let Some(v) = env_var("CYODA_SEARCH_TIMEOUT_MS") {
            config.search_timeout_ms = parse_number("CYODA_SEARCH_TIMEOUT_MS", &v)?;
        }
        if let Some(v) = env_var("CYODA_POLL_INTERVAL_MS") {
            config.poll_interval_ms = parse_number("CYODA_POLL_INTERVAL_MS", &v)?;
        }
        if let Some(v) = env_var("CYODA_PAGE_SIZE") {
            config.page_size = parse_number("CYODA_PAGE_SIZE", &v)?;
        }
        if let Some(v) = env_var("CYODA_ENTITY_VERSION") {
            config.default_entity_version = v;
        }

        config.validate()?;
        Ok(config)
    }

    /// Rejects settings the client cannot run with.
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.api_url.trim().is_empty() {
            return Err(RepositoryError::Config("api_url must not be empty".to_string()));
        }
        if self.poll_interval_ms == 0 {
            return Err(RepositoryError::Config(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.page_size == 0 {
            return Err(RepositoryError::Config(
                "page_size must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn search_timeout(&self) -> Duration {
        Duration::from_millis(self.search_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(name: &str, value: &str) -> RepositoryResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| RepositoryError::Config(format!("{name} is not a number: {value}")))
}
