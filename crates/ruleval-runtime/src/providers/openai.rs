//! OpenAI-compatible chat completions ("openai" style).
//!
//! Each prompt becomes its own single-message chat request. Requests run
//! with bounded concurrency and the replies are put back in prompt order.

use super::{
    base_url_from, check_status, factory::ProviderFactory, http_client, secrets::ApiCredential,
    send_error, CompletionConfig, LlmProvider, ProviderError,
};
use async_trait::async_trait;
use futures::{stream, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Optional bearer token for the model under test.
pub const TESTED_MODEL_API_KEY_ENV: &str = "TESTED_MODEL_API_KEY";

const DEFAULT_CONCURRENCY: usize = 8;

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiProvider {
    name: String,
    base_url: String,
    model: String,
    concurrency: usize,
    credential: Option<ApiCredential>,
    client: reqwest::Client,
}

impl std::fmt::Debug for OpenAiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiProvider")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .field("concurrency", &self.concurrency)
            .field("credential", &self.credential)
            .finish()
    }
}

impl OpenAiProvider {
    /// `base_url` is the API root, e.g. `http://host:8000/v1`.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Result<Self, ProviderError> {
        Ok(Self {
            name: "openai".to_string(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            concurrency: DEFAULT_CONCURRENCY,
            credential: None,
            client: http_client()?,
        })
    }

    /// Create from JSON configuration.
    ///
    /// `base_url` and `model` are required; `api_key` falls back to
    /// `TESTED_MODEL_API_KEY`; `concurrency` defaults to 8.
    pub fn from_config(config: &JsonValue) -> Result<Self, ProviderError> {
        let model = config["model"]
            .as_str()
            .filter(|m| !m.is_empty())
            .ok_or_else(|| ProviderError::NotConfigured("openai provider requires 'model'".to_string()))?;
        let mut provider = Self::new(base_url_from(config, "openai")?, model)?;
        provider.credential = ApiCredential::optional_from_config_or_env(
            config,
            "api_key",
            TESTED_MODEL_API_KEY_ENV,
            "Tested model API key",
        );
        if let Some(n) = config["concurrency"].as_u64() {
            provider.concurrency = (n as usize).max(1);
        }
        if let Some(name) = config["name"].as_str() {
            provider.name = name.to_string();
        }
        if let Some(cred) = &provider.credential {
            tracing::debug!(provider = %provider.name, credential = %cred, "Using API key");
        }
        Ok(provider)
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    async fn complete_one(&self, prompt: &str, config: &CompletionConfig) -> Result<String, ProviderError> {
        let model = if config.model.is_empty() { &self.model } else { &config.model };
        let request = ChatRequest {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        };

        let mut builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .timeout(config.timeout)
            .json(&request);
        if let Some(cred) = &self.credential {
            builder = builder.bearer_auth(cred.expose());
        }
        let response = builder
            .send()
            .await
            .map_err(|e| send_error(e, config.timeout))?;
        let response = check_status(response).await?;

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ParseError(e.to_string()))?;
        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content.unwrap_or_default())
            .ok_or_else(|| ProviderError::ParseError("response has no choices".to_string()))
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    content: Option<String>,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(
        &self,
        prompts: &[String],
        config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        let requests = prompts
            .iter()
            .enumerate()
            .map(|(idx, prompt)| async move {
                self.complete_one(prompt, config).await.map(|text| (idx, text))
            })
            .collect::<Vec<_>>();

        let mut out = stream::iter(requests)
            .buffer_unordered(self.concurrency)
            .collect::<Vec<_>>()
            .await;

        out.sort_by_key(|r| r.as_ref().map(|(i, _)| *i).unwrap_or(usize::MAX));
        let mut texts = Vec::with_capacity(out.len());
        for r in out {
            let (_, text) = r?;
            texts.push(text);
        }
        Ok(texts)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Factory for OpenAI-compatible endpoints.
///
/// ## Configuration Format
/// ```json
/// {
///   "base_url": "http://host:8000/v1",   // Required
///   "model": "my-model",                 // Required
///   "api_key": "...",                    // Optional, falls back to TESTED_MODEL_API_KEY env
///   "concurrency": 8                     // Optional, in-flight requests per batch
/// }
/// ```
pub struct OpenAiProviderFactory;

impl ProviderFactory for OpenAiProviderFactory {
    fn provider_type(&self) -> &'static str {
        "openai"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        Ok(Arc::new(OpenAiProvider::from_config(config)?))
    }

    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError> {
        base_url_from(config, "openai")?;
        if config["model"].as_str().unwrap_or_default().is_empty() {
            return Err(ProviderError::NotConfigured(
                "openai provider requires 'model'".to_string(),
            ));
        }
        Ok(())
    }

    fn default_config(&self) -> JsonValue {
        serde_json::json!({ "concurrency": DEFAULT_CONCURRENCY })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn reply(text: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        }))
    }

    #[tokio::test]
    async fn test_replies_keep_prompt_order() {
        let server = MockServer::start().await;
        for (prompt, answer, delay) in [("first", "one", 80), ("second", "two", 0), ("third", "three", 40)] {
            Mock::given(method("POST"))
                .and(path("/v1/chat/completions"))
                .and(body_partial_json(serde_json::json!({
                    "model": "tested",
                    "messages": [{"role": "user", "content": prompt}]
                })))
                .respond_with(reply(answer).set_delay(std::time::Duration::from_millis(delay)))
                .mount(&server)
                .await;
        }

        let provider = OpenAiProvider::new(format!("{}/v1", server.uri()), "tested")
            .unwrap()
            .with_concurrency(3);
        let prompts: Vec<String> = ["first", "second", "third"].iter().map(|s| s.to_string()).collect();
        let replies = provider.complete(&prompts, &CompletionConfig::default()).await.unwrap();
        assert_eq!(replies, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_any_failure_fails_the_batch() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(serde_json::json!({"messages": [{"role": "user", "content": "bad"}]})))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(reply("fine"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(server.uri(), "m").unwrap();
        let prompts = vec!["ok".to_string(), "bad".to_string()];
        let err = provider.complete(&prompts, &CompletionConfig::default()).await.unwrap_err();
        assert!(matches!(err, ProviderError::ApiError { status: 500, .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "7"))
            .mount(&server)
            .await;

        let provider = OpenAiProvider::new(server.uri(), "m").unwrap();
        let err = provider
            .complete(&["x".to_string()], &CompletionConfig::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProviderError::RateLimited { retry_after: Some(d) } if d.as_secs() == 7
        ));
    }

    #[test]
    fn test_factory_validation() {
        let factory = OpenAiProviderFactory;
        assert!(factory
            .validate_config(&serde_json::json!({"base_url": "http://x/v1", "model": "m"}))
            .is_ok());
        assert!(factory
            .validate_config(&serde_json::json!({"base_url": "http://x/v1"}))
            .is_err());
        let provider = factory
            .create(&serde_json::json!({"base_url": "http://x/v1", "model": "m", "name": "target"}))
            .unwrap();
        assert_eq!(provider.name(), "target");
    }
}
