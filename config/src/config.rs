use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default text-generation model requested from the LLM collaborator.
pub const DEFAULT_LLM_MODEL: &str = "pharma-analyst-large";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Invalid(String),
}

/// Retry policy for rate-limited LLM calls.
///
/// Delay before attempt `n` (0-based) is `base_delay_ms * 2^n`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 15_000,
        }
    }
}

impl RetryPolicy {
    pub fn delay_ms(&self, attempt: u32) -> u64 {
        self.base_delay_ms.saturating_mul(1_u64 << attempt.min(16))
    }
}

/// Relative-deviation thresholds for multi-model RL agreement analysis.
///
/// A per-action deviation above `low_agreement` flags low consensus, above
/// `medium_agreement` medium; at or below is high. The same `low_agreement`
/// bound marks an action key as high-variance in stability analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConsensusPolicy {
    pub medium_agreement: f64,
    pub low_agreement: f64,
}

impl Default for ConsensusPolicy {
    fn default() -> Self {
        Self {
            medium_agreement: 0.2,
            low_agreement: 0.5,
        }
    }
}

/// Top-level configuration for the reporting service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Base URL of the upstream prediction API cluster.
    pub prediction_api_base: String,
    /// Embedding service endpoint; the knowledge store degrades to no-ops
    /// when absent.
    pub embedding_url: Option<String>,
    /// Vector index endpoint; an in-process index is used when absent.
    pub vector_index_url: Option<String>,
    /// LLM completion endpoint; the template fallback is used when absent.
    pub llm_url: Option<String>,
    pub llm_api_key: Option<String>,
    pub llm_model: String,
    /// Host to bind the HTTP API to.
    pub host: String,
    /// Port to bind the HTTP API to.
    pub port: u16,
    /// Client-level timeout for upstream prediction requests, seconds.
    pub request_timeout_secs: u64,
    /// Bounded per-collector history capacity.
    pub max_history: usize,
    pub retry: RetryPolicy,
    pub consensus: ConsensusPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            prediction_api_base: "http://localhost:8000".to_string(),
            embedding_url: None,
            vector_index_url: None,
            llm_url: None,
            llm_api_key: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            host: "0.0.0.0".to_string(),
            port: 8001,
            request_timeout_secs: 10,
            max_history: 100,
            retry: RetryPolicy::default(),
            consensus: ConsensusPolicy::default(),
        }
    }
}

impl AppConfig {
    /// Creates a configuration from environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            prediction_api_base: std::env::var("API_BASE_URL")
                .unwrap_or(defaults.prediction_api_base),
            embedding_url: std::env::var("EMBEDDING_API_URL").ok(),
            vector_index_url: std::env::var("VECTOR_INDEX_URL").ok(),
            llm_url: std::env::var("LLM_API_URL").ok(),
            llm_api_key: std::env::var("LLM_API_KEY").ok(),
            llm_model: std::env::var("LLM_MODEL").unwrap_or(defaults.llm_model),
            host: std::env::var("HOST").unwrap_or(defaults.host),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            request_timeout_secs: std::env::var("REQUEST_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.request_timeout_secs),
            max_history: std::env::var("MAX_HISTORY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.max_history),
            retry: defaults.retry,
            consensus: defaults.consensus,
        }
    }

    #[must_use]
    pub fn builder() -> AppConfigBuilder {
        AppConfigBuilder::default()
    }
}

/// Builder for `AppConfig`.
#[derive(Debug, Default)]
pub struct AppConfigBuilder {
    config: Option<AppConfig>,
}

impl AppConfigBuilder {
    fn config(&mut self) -> &mut AppConfig {
        self.config.get_or_insert_with(AppConfig::default)
    }

    #[must_use]
    pub fn prediction_api_base(mut self, url: impl Into<String>) -> Self {
        self.config().prediction_api_base = url.into();
        self
    }

    #[must_use]
    pub fn embedding_url(mut self, url: impl Into<String>) -> Self {
        self.config().embedding_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn vector_index_url(mut self, url: impl Into<String>) -> Self {
        self.config().vector_index_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn llm_url(mut self, url: impl Into<String>) -> Self {
        self.config().llm_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn llm_api_key(mut self, key: impl Into<String>) -> Self {
        self.config().llm_api_key = Some(key.into());
        self
    }

    #[must_use]
    pub fn llm_model(mut self, model: impl Into<String>) -> Self {
        self.config().llm_model = model.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.config().host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.config().port = port;
        self
    }

    #[must_use]
    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config().request_timeout_secs = secs;
        self
    }

    #[must_use]
    pub fn max_history(mut self, capacity: usize) -> Self {
        self.config().max_history = capacity;
        self
    }

    #[must_use]
    pub fn retry(mut self, retry: RetryPolicy) -> Self {
        self.config().retry = retry;
        self
    }

    #[must_use]
    pub fn consensus(mut self, consensus: ConsensusPolicy) -> Self {
        self.config().consensus = consensus;
        self
    }

    pub fn build(mut self) -> Result<AppConfig, ConfigError> {
        let config = self.config().clone();
        if config.prediction_api_base.is_empty() {
            return Err(ConfigError::Invalid(
                "prediction_api_base must not be empty".to_string(),
            ));
        }
        if config.max_history == 0 {
            return Err(ConfigError::Invalid(
                "max_history must be at least 1".to_string(),
            ));
        }
        Ok(config)
    }
}
