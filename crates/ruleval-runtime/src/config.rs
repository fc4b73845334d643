//! Runtime configuration.
//!
//! Sources, lowest to highest precedence: built-in defaults, an optional
//! YAML file, environment variables, then whatever the CLI overrides on
//! the returned value.
//!
//! ```yaml
//! rounds: 2
//! batch_size: 5
//! target:
//!   style: openai
//!   base_url: http://localhost:8000/v1
//!   model: my-model
//! extraction:
//!   style: qwen
//!   base_url: http://localhost:9000/generate
//! completion:
//!   timeout: 30m
//! circuit_breaker:
//!   recovery_timeout: 30s
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

use crate::cache::CacheConfig;
use crate::providers::CompletionConfig;
use crate::resilience::{CircuitBreakerConfig, RetryPolicy};

pub const QWEN_BASE_URL_ENV: &str = "QWEN_BASE_URL";
pub const QWEN_CODER_BASE_URL_ENV: &str = "QWEN_CODER_BASE_URL";
pub const TESTED_MODEL_BASE_URL_ENV: &str = "TESTED_MODEL_BASE_URL";
pub const TESTED_MODEL_NAME_ENV: &str = "TESTED_MODEL_NAME";

/// Errors from loading or validating configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// One model endpoint.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndpointConfig {
    /// Provider style: `qwen`, `openai`, or `echo`.
    pub style: String,

    pub base_url: Option<String>,

    pub model: Option<String>,

    /// Plain key from the config file; prefer the environment variables.
    #[serde(skip_serializing)]
    pub api_key: Option<String>,

    /// In-flight requests per batch for per-prompt styles; defaults to the batch size.
    pub concurrency: Option<usize>,
}

impl EndpointConfig {
    pub fn new(style: impl Into<String>) -> Self {
        Self {
            style: style.into(),
            ..Self::default()
        }
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// JSON settings handed to the provider factory.
    pub fn provider_config(&self, name: &str, default_concurrency: usize) -> JsonValue {
        serde_json::json!({
            "name": name,
            "base_url": self.base_url,
            "model": self.model,
            "api_key": self.api_key,
            "concurrency": self.concurrency.unwrap_or(default_concurrency),
        })
    }
}

impl std::fmt::Debug for EndpointConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EndpointConfig")
            .field("style", &self.style)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            style: "echo".to_string(),
            base_url: None,
            model: None,
            api_key: None,
            concurrency: None,
        }
    }
}

/// Everything the round orchestrator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Total number of rounds, round 0 included.
    pub rounds: u32,

    /// Prompts per model call.
    pub batch_size: usize,

    /// The model under evaluation.
    pub target: EndpointConfig,

    /// The model that extracts corresponding parts.
    pub extraction: EndpointConfig,

    /// Tried when the extraction endpoint fails.
    pub extraction_fallback: Option<EndpointConfig>,

    pub completion: CompletionConfig,

    pub retry: RetryPolicy,

    pub circuit_breaker: CircuitBreakerConfig,

    pub cache: CacheConfig,

    /// Where `round_<N>.json` and `summary.json` are written.
    pub output_dir: PathBuf,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            rounds: 2,
            batch_size: 5,
            target: EndpointConfig::new("openai"),
            extraction: EndpointConfig::new("qwen"),
            extraction_fallback: None,
            completion: CompletionConfig::default(),
            retry: RetryPolicy::default(),
            circuit_breaker: CircuitBreakerConfig::default(),
            cache: CacheConfig::default(),
            output_dir: PathBuf::from("output"),
        }
    }
}

impl RuntimeConfig {
    /// Parse a YAML document; missing keys keep their defaults.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&text).map_err(|source| ConfigError::Yaml {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Defaults, then the optional YAML file, then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_yaml_file(p)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Overlay endpoint settings from environment variables.
    ///
    /// `lookup` stands in for `std::env::var` so tests stay hermetic.
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(QWEN_BASE_URL_ENV) {
            self.extraction.base_url = Some(url);
        }
        if let Some(url) = get(QWEN_CODER_BASE_URL_ENV) {
            let fallback = self
                .extraction_fallback
                .get_or_insert_with(|| EndpointConfig::new("qwen"));
            fallback.base_url = Some(url);
        }
        if let Some(url) = get(TESTED_MODEL_BASE_URL_ENV) {
            self.target.base_url = Some(url);
        }
        if let Some(model) = get(TESTED_MODEL_NAME_ENV) {
            self.target.model = Some(model);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.rounds == 0 {
            return Err(ConfigError::Invalid("rounds must be at least 1".to_string()));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("batch_size must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(ConfigError::Invalid("retry.max_attempts must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// Serde adapter for durations written like `1800s`, `30m`, or `1h 30m`.
pub(crate) mod human_duration {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        humantime::parse_duration(&text).map_err(serde::de::Error::custom)
    }
}
