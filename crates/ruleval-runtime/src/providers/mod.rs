//! Model provider abstractions for ruleval-runtime.
//!
//! Every model the runtime talks to (the target model under evaluation and
//! the extraction model) is an [`LlmProvider`]: a batch of prompts in, one
//! reply per prompt out, index for index. Implementations:
//!
//! - [`QwenProvider`]: legacy `{prompt, max_new_tokens, temperature, top_k}`
//!   endpoints answering `{completions: [...]}`
//! - [`OpenAiProvider`]: OpenAI-compatible chat completions, one request per
//!   prompt with bounded concurrency
//! - [`EchoProvider`]: returns each prompt verbatim, for dry runs
//!
//! ## Security
//!
//! All providers use the [`secrets`] module for credential handling.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

mod echo;
mod factory;
mod openai;
mod qwen;
pub mod secrets;

pub use echo::{EchoProvider, EchoProviderFactory};
pub use factory::{ProviderFactory, ProviderRegistry};
pub use openai::{OpenAiProvider, OpenAiProviderFactory, TESTED_MODEL_API_KEY_ENV};
pub use qwen::{QwenProvider, QwenProviderFactory, QWEN_API_KEY_ENV};
pub use secrets::ApiCredential;

/// Errors from model providers.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    HttpError(String),

    #[error("Rate limit exceeded, retry after {retry_after:?}")]
    RateLimited { retry_after: Option<Duration> },

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    ParseError(String),

    #[error("Timeout after {0:?}")]
    Timeout(Duration),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Circuit open for {0}")]
    CircuitOpen(String),
}

impl ProviderError {
    /// Whether a retry can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::HttpError(_)
            | ProviderError::RateLimited { .. }
            | ProviderError::Timeout(_) => true,
            ProviderError::ApiError { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Sampling settings for a completion request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompletionConfig {
    /// Model override; empty means the provider's configured model.
    pub model: String,

    pub max_tokens: u32,

    /// 0.0 for deterministic decoding.
    pub temperature: f32,

    /// Sent only by the legacy endpoint style.
    pub top_k: u32,

    /// Per-call timeout, written like `1800s` or `30m` in config files.
    #[serde(with = "crate::config::human_duration")]
    pub timeout: Duration,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: String::new(),
            max_tokens: 8096,
            temperature: 0.0,
            top_k: 1,
            timeout: Duration::from_secs(1800),
        }
    }
}

impl CompletionConfig {
    /// Small, fast settings for connectivity probes.
    pub fn probe() -> Self {
        Self {
            max_tokens: 16,
            timeout: Duration::from_secs(60),
            ..Self::default()
        }
    }
}

/// Provider abstraction allows swapping model backends.
///
/// Reply `i` answers prompt `i`. Any server error fails the whole call;
/// retries are the caller's business (see [`crate::resilience`]).
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a batch of prompts.
    async fn complete(
        &self,
        prompts: &[String],
        config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError>;

    /// Provider name for logs and circuit keys.
    fn name(&self) -> &str;

    /// Send one tiny prompt and report whether it came back.
    async fn health_check(&self) -> bool {
        let probe = vec!["ping".to_string()];
        match self.complete(&probe, &CompletionConfig::probe()).await {
            Ok(replies) => replies.len() == 1,
            Err(e) => {
                tracing::warn!(provider = %self.name(), error = %e, "Health check failed");
                false
            }
        }
    }
}

/// Build the shared HTTP client for a provider.
pub(crate) fn http_client() -> Result<reqwest::Client, ProviderError> {
    reqwest::Client::builder()
        .build()
        .map_err(|e| ProviderError::HttpError(e.to_string()))
}

pub(crate) fn send_error(e: reqwest::Error, timeout: Duration) -> ProviderError {
    if e.is_timeout() {
        ProviderError::Timeout(timeout)
    } else {
        ProviderError::HttpError(e.to_string())
    }
}

/// Map 429 and other non-success statuses to errors.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, ProviderError> {
    let status = response.status();
    if status.as_u16() == 429 {
        let retry_after = response
            .headers()
            .get("retry-after")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .map(Duration::from_secs);
        return Err(ProviderError::RateLimited { retry_after });
    }
    if !status.is_success() {
        let message = response.text().await.unwrap_or_default();
        return Err(ProviderError::ApiError {
            status: status.as_u16(),
            message,
        });
    }
    Ok(response)
}

/// Read a base URL from provider JSON config, rejecting non-HTTP schemes.
pub(crate) fn base_url_from(
    config: &serde_json::Value,
    provider: &str,
) -> Result<String, ProviderError> {
    let url = config["base_url"].as_str().unwrap_or_default().trim();
    if url.is_empty() {
        return Err(ProviderError::NotConfigured(format!(
            "{} provider requires 'base_url'",
            provider
        )));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ProviderError::NotConfigured(
            "base_url must start with http:// or https://".to_string(),
        ));
    }
    Ok(url.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_defaults() {
        let config = CompletionConfig::default();
        assert_eq!(config.max_tokens, 8096);
        assert_eq!(config.temperature, 0.0);
        assert_eq!(config.timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_transient_errors() {
        assert!(ProviderError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(ProviderError::ApiError { status: 503, message: String::new() }.is_transient());
        assert!(!ProviderError::ApiError { status: 400, message: String::new() }.is_transient());
        assert!(!ProviderError::ParseError("bad".into()).is_transient());
        assert!(!ProviderError::CircuitOpen("x".into()).is_transient());
    }

    #[test]
    fn test_base_url_validation() {
        let ok = serde_json::json!({"base_url": "http://localhost:8000/"});
        assert_eq!(base_url_from(&ok, "qwen").unwrap(), "http://localhost:8000");
        assert!(base_url_from(&serde_json::json!({}), "qwen").is_err());
        assert!(base_url_from(&serde_json::json!({"base_url": "ftp://x"}), "qwen").is_err());
    }

    #[test]
    fn test_completion_config_from_yaml() {
        let config: CompletionConfig = serde_yaml::from_str("timeout: 30m\nmax_tokens: 512\n").unwrap();
        assert_eq!(config.timeout, Duration::from_secs(1800));
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.top_k, 1);
    }
}
