//! Providers wrapped in retry and circuit breaking, plus ordered fallback.

use std::sync::Arc;

use async_trait::async_trait;

use super::{with_retry, CircuitBreaker, RetryPolicy};
use crate::providers::{CompletionConfig, LlmProvider, ProviderError};

/// A provider whose calls are retried and tracked by a circuit breaker.
///
/// The breaker is shared so every guarded endpoint reports into one place;
/// circuits are keyed by the inner provider's name.
pub struct GuardedProvider {
    inner: Arc<dyn LlmProvider>,
    breaker: Arc<CircuitBreaker>,
    retry: RetryPolicy,
}

impl GuardedProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, breaker: Arc<CircuitBreaker>, retry: RetryPolicy) -> Self {
        Self { inner, breaker, retry }
    }
}

#[async_trait]
impl LlmProvider for GuardedProvider {
    async fn complete(
        &self,
        prompts: &[String],
        config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        let name = self.inner.name();
        if self.breaker.is_open(name) {
            return Err(ProviderError::CircuitOpen(name.to_string()));
        }

        let result = with_retry(&self.retry, name, || self.inner.complete(prompts, config)).await;
        match &result {
            Ok(_) => self.breaker.record_success(name),
            Err(_) => self.breaker.record_failure(name),
        }
        result
    }

    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}

/// Tries each provider in order and returns the first success.
///
/// With every provider failing, the last error is returned.
pub struct FallbackProvider {
    name: String,
    chain: Vec<Arc<dyn LlmProvider>>,
}

impl FallbackProvider {
    pub fn new(chain: Vec<Arc<dyn LlmProvider>>) -> Self {
        let name = chain
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join("|");
        Self { name, chain }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }
}

#[async_trait]
impl LlmProvider for FallbackProvider {
    async fn complete(
        &self,
        prompts: &[String],
        config: &CompletionConfig,
    ) -> Result<Vec<String>, ProviderError> {
        let mut last_error =
            ProviderError::NotConfigured("fallback chain has no providers".to_string());
        for (idx, provider) in self.chain.iter().enumerate() {
            match provider.complete(prompts, config).await {
                Ok(replies) => return Ok(replies),
                Err(e) => {
                    if idx + 1 < self.chain.len() {
                        tracing::warn!(
                            endpoint = %provider.name(),
                            error = %e,
                            "Model call failed, trying next endpoint"
                        );
                    }
                    last_error = e;
                }
            }
        }
        Err(last_error)
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> bool {
        for provider in &self.chain {
            if provider.health_check().await {
                return true;
            }
        }
        false
    }
}
