//! Provider factory pattern for endpoint styles.
//!
//! Each endpoint style (`qwen`, `openai`, `echo`) registers a factory that
//! builds providers from JSON configuration, so the runtime config only
//! names a style and passes its settings through.
//!
//! ## Usage
//!
//! ```ignore
//! let registry = ProviderRegistry::with_defaults();
//! let provider = registry.create("qwen", &json!({"base_url": "http://host/generate"}))?;
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value as JsonValue;

use super::{LlmProvider, ProviderError};

/// Factory for creating providers from configuration.
pub trait ProviderFactory: Send + Sync {
    /// Unique style name, e.g. "qwen".
    fn provider_type(&self) -> &'static str;

    /// Create a provider instance from JSON configuration.
    fn create(&self, config: &JsonValue) -> Result<Arc<dyn LlmProvider>, ProviderError>;

    /// Validate configuration without creating a provider.
    fn validate_config(&self, config: &JsonValue) -> Result<(), ProviderError>;

    /// Defaults merged under the caller's configuration.
    fn default_config(&self) -> JsonValue {
        serde_json::json!({})
    }
}

/// Registry of available provider factories, keyed by style name.
#[derive(Default)]
pub struct ProviderRegistry {
    factories: BTreeMap<String, Arc<dyn ProviderFactory>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory, replacing any factory with the same style name.
    pub fn register(&mut self, factory: Arc<dyn ProviderFactory>) {
        self.factories
            .insert(factory.provider_type().to_string(), factory);
    }

    /// Create a provider; `config` keys override the factory defaults.
    pub fn create(
        &self,
        provider_type: &str,
        config: &JsonValue,
    ) -> Result<Arc<dyn LlmProvider>, ProviderError> {
        let factory = self.factory(provider_type)?;
        let merged = merge(factory.default_config(), config);
        factory.validate_config(&merged)?;
        factory.create(&merged)
    }

    /// List available provider types.
    pub fn available_types(&self) -> Vec<&str> {
        self.factories.keys().map(|s| s.as_str()).collect()
    }

    /// Registry with every built-in style.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(super::QwenProviderFactory));
        registry.register(Arc::new(super::OpenAiProviderFactory));
        registry.register(Arc::new(super::EchoProviderFactory));
        registry
    }

    fn factory(&self, provider_type: &str) -> Result<&Arc<dyn ProviderFactory>, ProviderError> {
        self.factories.get(provider_type).ok_or_else(|| {
            ProviderError::NotConfigured(format!(
                "Unknown provider type: '{}'. Available: {:?}",
                provider_type,
                self.available_types()
            ))
        })
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.available_types())
            .finish()
    }
}

/// Shallow merge of two JSON objects; null overrides are skipped.
fn merge(defaults: JsonValue, overrides: &JsonValue) -> JsonValue {
    let mut merged = match defaults {
        JsonValue::Object(map) => map,
        _ => serde_json::Map::new(),
    };
    if let JsonValue::Object(map) = overrides {
        for (k, v) in map {
            if !v.is_null() {
                merged.insert(k.clone(), v.clone());
            }
        }
    }
    JsonValue::Object(merged)
}
