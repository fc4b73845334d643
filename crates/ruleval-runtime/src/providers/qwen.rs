//! Legacy batch endpoint ("qwen" style).
//!
//! One POST carries the whole batch:
//! `{"prompt": [...], "max_new_tokens": N, "temperature": T, "top_k": K}`
//! and the endpoint answers `{"completions": [...]}` in prompt order.

use super::{
    base_url_from, check_status, factory::ProviderFactory, http_client, secrets::ApiCredential,
    send_error, CompletionConfig, LlmProvider, ProviderError,
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Optional bearer token for legacy endpoints.
pub const QWEN_API_KEY_ENV: &str = "QWEN_API_KEY";

/// Client for a legacy batch completion endpoint.
pub struct QwenProvider {
    name: String,
    url: String,
    credential: Option<ApiCredential>,
    client: reqwest::Client,
}

impl std::fmt::Debug for QwenProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QwenProvider")
            .field("name", &self.name)
            .field("url", &self.url)
            .field("credential", &self.credential)
            .finish()
    }
}

impl QwenProvider {
    /// Create a client posting to `url` exactly as given.
    pub fn new(url: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "qwen".to_string(),
            url: url.into(),
            credential: None,
            client: http_client()?,
        })
    }

    /// Create from JSON configuration: `base_url` required, `api_key` and
    /// `name` optional. The key falls back to `QWEN_API_KEY`.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let mut provider = Self::new(base_url_from(config, "qwen")?)?;
        provider.credential = ApiCredential::optional_from_config_or_env(
            config,
            "api_key",
            QWEN_API_KEY_ENV,
            "Qwen API key",
        );
        if let Some(name) = config["name"].as_str() {
            provider.name = name.to_string();
        }
        if let Some(cred) = &provider.credential {
            tracing::debug!(provider = %provider.name, credential = %cred, "Using API key");
        }
        Ok(provider)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

#[derive(Debug, Serialize)]
struct QwenRequest<'a> {
    prompt: &'a [String],
    max_new_tokens: u32,
    temperature: f32,
    top_k: u32,
}

#[derive(Debug, Deserialize)]
struct QwenResponse {
    completions: Option<Vec<String>>,
}

#[async_trait]
impl LlmProvider for QwenProvider {
    async fn complete(
        &self,
        prompts: &[String],
        config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }
        let request = QwenRequest {
            prompt: prompts,
            max_new_tokens: config.max_tokens,
            temperature: config.temperature,
            top_k: config.top_k,
        };

        let mut builder = self.client.post(&self.url).timeout(config.timeout).json(&request);
        if let Some(cred) = &self.credential {
            builder = builder.bearer_auth(cred.expose());
        }
        let response = builder
            .send()
            .await
            .map_err(|e| send_error(e, config.timeout))?;
        let response = check_status(response).await?;

        let body: QwenResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        let completions = body
            .completions
            .ok_or_else(|| ProviderError::ParseError("missing 'completions' key".to_string()))?;
        if completions.len() != prompts.len() {
            return Err(ProviderError::ParseError(format!(
                "expected {} completions, got {}",
                prompts.len(),
                completions.len()
            )));
        }
        Ok(completions)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory for legacy endpoints.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "http://host:port/generate",   // Required
///   "api_key": "...",                          // Optional, falls back to QWEN_API_KEY env
///   "name": "extraction"                       // Optional, used in logs
/// }
/// ```
pub struct QwenProviderFactory;

impl ProviderFactory for QwenProviderFactory {
    fn provider_type(&self) -> &'static str {
        "qwen"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(QwenProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        base_url_from(config, "qwen").map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn prompts(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_batch_completion() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/generate"))
            .and(body_partial_json(serde_json::json!({
                "prompt": ["a", "b"],
                "max_new_tokens": 8096,
                "top_k": 1
            })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"completions": ["reply a", "reply b"]})),
            )
            .mount(&server)
            .await;

        let provider = QwenProvider::new(format!("{}/generate", server.uri())).unwrap();
        let replies = provider
            .complete(&prompts(&["a", "b"]), &CompletionConfig::default())
            .await
            .unwrap();
        assert_eq!(replies, vec!["reply a", "reply b"]);
    }

    #[tokio::test]
    async fn test_missing_completions_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"text": "x"})))
            .mount(&server)
            .await;

        let provider = QwenProvider::new(server.uri()).unwrap();
        let err = provider
            .complete(&prompts(&["a"]), &CompletionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_server_error_and_auth_header() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("authorization", "Bearer secret-token"))
            .respond_with(ResponseTemplate::new(503).set_body_string("overloaded"))
            .mount(&server)
            .await;

        let config = serde_json::json!({"base_url": server.uri(), "api_key": "secret-token"});
        let provider = QwenProvider::from_config(&config).unwrap();
        let err = provider
            .complete(&prompts(&["a"]), &CompletionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status: 503, .. }));
        assert!(err.is_transient());
        assert!(!format!("{:?}", provider).contains("secret-token"));
    }

    #[tokio::test]
    async fn test_length_mismatch_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"completions": ["only one"]})),
            )
            .mount(&server)
            .await;

        let provider = QwenProvider::new(server.uri()).unwrap();
        let result = provider
            .complete(&prompts(&["a", "b"]), &CompletionConfig::default())
            .await;
        assert!(matches!(result, Err(ProviderError::ParseError(_))));
    }

    #[test]
    fn test_factory_requires_base_url() {
        let factory = QwenProviderFactory;
        assert_eq!(factory.provider_type(), "qwen");
        assert!(factory.validate_config(&serde_json::json!({})).is_err());
        assert!(factory
            .validate_config(&serde_json::json!({"base_url": "http://localhost:1"}))
            .is_ok());
    }
}
