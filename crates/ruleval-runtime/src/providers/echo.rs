//! Identity provider: every reply is its prompt.

use super::{factory::ProviderFactory, CompletionConfig, LlmProvider, ProviderError};
use async_trait::async_trait;
use serde_json::Value as JsonValue;
use std::sync::Arc;

/// Returns each prompt verbatim. Used for dry runs and round-stability checks.
#[derive(Debug, Clone)]
pub struct EchoProvider {
    name: String,
}

impl EchoProvider {
    pub fn new() -> Self {
        Self {
            name: "echo".to_string(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl Default for EchoProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LlmProvider for EchoProvider {
    async fn complete(
        &self,
        prompts: &[String],
        _config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        Ok(prompts.to_vec())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

pub struct EchoProviderFactory;

impl ProviderFactory for EchoProviderFactory {
    fn provider_type(&self) -> &'static str {
        "echo"
    }

    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let provider = match config["name"].as_str() {
            Some(name) => EchoProvider::new().with_name(name),
            None => EchoProvider::new(),
        };
        Ok(Arc::new(provider))
    }

    fn validate_config(&self, _config: &JsonValue) -> Result<(), ProviderError> {
        Ok(())
    }
}
