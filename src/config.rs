use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::constants::{DEFAULT_SEARCH_QUERY, DEFAULT_USER_AGENT};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {name}: {message}")]
    InvalidValue { name: String, message: String },
    #[error("failed to parse {name} as integer: {source}")]
    ParseInt {
        name: String,
        #[source]
        source: std::num::ParseIntError,
    },
}

/// Application configuration loaded from environment variables.
///
/// Credentials are optional here: a missing Reddit id/secret only fails the
/// first request that needs it, so the service can still start and answer
/// health checks.
#[derive(Debug, Clone)]
pub struct Config {
    // Reddit
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub reddit_user_agent: String,
    pub reddit_api_url: String,
    pub reddit_auth_url: String,
    pub reddit_timeout: Duration,
    pub search_query: String,
    pub discovery_max_pages: usize,

    // LLM / embeddings
    pub llm_base_url: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_timeout: Duration,
    pub embedding_model: String,

    // Clustering
    pub min_cluster_documents: usize,
    pub min_topic_size: usize,
    pub min_samples: usize,

    // Web Server
    pub web_host: String,
    pub web_port: u16,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if a variable is set but cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            // Reddit
            reddit_client_id: optional_env("REDDIT_CLIENT_ID"),
            reddit_client_secret: optional_env("REDDIT_CLIENT_SECRET"),
            reddit_user_agent: env_or_default("REDDIT_USER_AGENT", DEFAULT_USER_AGENT),
            reddit_api_url: env_or_default("REDDIT_API_URL", "https://oauth.reddit.com"),
            reddit_auth_url: env_or_default("REDDIT_AUTH_URL", "https://www.reddit.com"),
            reddit_timeout: Duration::from_secs(parse_env_u64("REDDIT_TIMEOUT_SECS", 30)?),
            search_query: env_or_default("SEARCH_QUERY", DEFAULT_SEARCH_QUERY),
            discovery_max_pages: parse_env_usize("DISCOVERY_MAX_PAGES", 10)?,

            // LLM / embeddings
            llm_base_url: env_or_default("LLM_BASE_URL", "http://localhost:11434"),
            llm_model: env_or_default("LLM_MODEL", "qwen2.5:7b"),
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_timeout: Duration::from_secs(parse_env_u64("LLM_TIMEOUT_SECS", 120)?),
            embedding_model: env_or_default("EMBEDDING_MODEL", "all-minilm"),

            // Clustering
            min_cluster_documents: parse_env_usize("MIN_CLUSTER_DOCUMENTS", 2)?,
            min_topic_size: parse_env_usize("MIN_TOPIC_SIZE", 2)?,
            min_samples: parse_env_usize("MIN_SAMPLES", 1)?,

            // Web Server
            web_host: env_or_default("WEB_HOST", "0.0.0.0"),
            web_port: parse_env_u16("WEB_PORT", 8000)?,
        })
    }

    /// Configuration with every field populated, pointing at localhost.
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            reddit_client_id: Some("test-client".to_string()),
            reddit_client_secret: Some("test-secret".to_string()),
            reddit_user_agent: DEFAULT_USER_AGENT.to_string(),
            reddit_api_url: "http://127.0.0.1:9".to_string(),
            reddit_auth_url: "http://127.0.0.1:9".to_string(),
            reddit_timeout: Duration::from_secs(5),
            search_query: DEFAULT_SEARCH_QUERY.to_string(),
            discovery_max_pages: 10,
            llm_base_url: "http://127.0.0.1:9".to_string(),
            llm_model: "test-model".to_string(),
            llm_api_key: None,
            llm_timeout: Duration::from_secs(5),
            embedding_model: "test-embed".to_string(),
            min_cluster_documents: 2,
            min_topic_size: 2,
            min_samples: 1,
            web_host: "127.0.0.1".to_string(),
            web_port: 0,
        }
    }

    /// Validate that the configuration is usable.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reddit_timeout.is_zero() {
            return Err(invalid("REDDIT_TIMEOUT_SECS", "must be at least 1"));
        }
        if self.llm_timeout.is_zero() {
            return Err(invalid("LLM_TIMEOUT_SECS", "must be at least 1"));
        }
        if self.min_topic_size < 2 {
            return Err(invalid("MIN_TOPIC_SIZE", "must be at least 2"));
        }
        if self.min_samples == 0 {
            return Err(invalid("MIN_SAMPLES", "must be at least 1"));
        }
        if self.search_query.trim().is_empty() {
            return Err(invalid("SEARCH_QUERY", "cannot be empty"));
        }
        Ok(())
    }
}

/// Parse a service base URL so that relative paths join under it.
///
/// `https://host/ollama` and `https://host/ollama/` both yield
/// `https://host/ollama/`, so `join("api/generate")` keeps the prefix.
pub(crate) fn base_url(raw: &str) -> Result<Url, url::ParseError> {
    let trimmed = raw.trim();
    if trimmed.ends_with('/') {
        Url::parse(trimmed)
    } else {
        Url::parse(&format!("{trimmed}/"))
    }
}

fn invalid(name: &str, message: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

fn env_or_default(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u64(name: &str, default: u64) -> Result<u64, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_u16(name: &str, default: u16) -> Result<u16, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}

fn parse_env_usize(name: &str, default: usize) -> Result<usize, ConfigError> {
    match std::env::var(name) {
        Ok(val) if !val.is_empty() => val.parse().map_err(|e| ConfigError::ParseInt {
            name: name.to_string(),
            source: e,
        }),
        _ => Ok(default),
    }
}
