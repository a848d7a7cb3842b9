//! Configuration types for the connection and the entity persister.

use std::env;

use tracing::warn;

/// Default OpenSearch URL.
pub const DEFAULT_OPENSEARCH_URL: &str = "http://localhost:9200";

/// Default cap on the number of hits a search returns.
pub const DEFAULT_MAX_RESULTS: usize = 10_000;

/// Configuration for `OpenSearchConnection`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    /// The OpenSearch server URL.
    pub url: String,
    /// Default `size` for searches that do not set one.
    pub max_results: usize,
    /// Whether writes ask the engine to refresh before returning.
    pub refresh: bool,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_OPENSEARCH_URL.to_string(),
            max_results: DEFAULT_MAX_RESULTS,
            refresh: true,
        }
    }
}

impl ConnectionConfig {
    /// Create a config for the given URL with default limits.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    /// Read the configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `OPENSEARCH_URL`: OpenSearch server URL (default: http://localhost:9200)
    /// - `OPENSEARCH_MAX_RESULTS`: default search size (default: 10000)
    /// - `OPENSEARCH_REFRESH`: "true" or "false" (default: true)
    pub fn from_env() -> Self {
        let url = env::var("OPENSEARCH_URL").unwrap_or_else(|_| DEFAULT_OPENSEARCH_URL.to_string());
        let max_results = env::var("OPENSEARCH_MAX_RESULTS")
            .ok()
            .and_then(|v| v.parse::<usize>().ok())
            .unwrap_or(DEFAULT_MAX_RESULTS);
        let refresh = match env::var("OPENSEARCH_REFRESH") {
            Ok(value) => Self::parse_flag(&value).unwrap_or_else(|| {
                warn!(value = %value, "Invalid OPENSEARCH_REFRESH, defaulting to 'true'");
                true
            }),
            Err(_) => true,
        };

        Self {
            url,
            max_results,
            refresh,
        }
    }

    fn parse_flag(value: &str) -> Option<bool> {
        match value.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        }
    }
}

/// Configuration for the `EntityPersister`.
///
/// Controls how many queued inserts a single `execute_inserts` call accepts.
#[derive(Debug, Clone)]
pub struct PersisterConfig {
    /// Maximum number of entities flushed by one `execute_inserts` call.
    ///
    /// Set to `None` to disable the limit.
    /// Defaults to 1000 if not specified.
    pub max_batch_size: Option<usize>,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            max_batch_size: Some(1000),
        }
    }
}

impl PersisterConfig {
    /// Create a config with no batch size limit.
    pub fn unlimited() -> Self {
        Self {
            max_batch_size: None,
        }
    }

    /// Create a config with a custom batch size limit.
    pub fn with_max_batch_size(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: Some(max_batch_size),
        }
    }
}
