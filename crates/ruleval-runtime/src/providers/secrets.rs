//! Credential handling for model endpoints.
//!
//! Endpoint keys are optional (many in-house endpoints are open), but when
//! present they are wrapped in [`ApiCredential`] so they never reach a log
//! line, a `Debug` dump, or an error message.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::providers::secrets::ApiCredential;
//!
//! // Optional key: config first, then environment
//! let cred = ApiCredential::optional_from_config_or_env(&config, "api_key", "QWEN_API_KEY", "Qwen API key");
//!
//! // Explicit exposure at the point of use
//! if let Some(cred) = &cred {
//!     request = request.bearer_auth(cred.expose());
//! }
//! ```

use secrecy::{ExposeSecret, SecretString};
use serde_json::Value as JsonValue;
use std::fmt;

/// Where a credential was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Provider JSON config (usually built from the YAML file)
    Config,
    /// Environment variable
    Environment,
}

impl fmt::Display for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::Config => write!(f, "config"),
            CredentialSource::Environment => write!(f, "environment"),
        }
    }
}

/// A securely-stored API credential.
///
/// `Debug` and `Display` show `[REDACTED]`; the value is zeroed on drop and
/// only reachable through [`ApiCredential::expose`].
pub struct ApiCredential {
    value: SecretString,
    source: CredentialSource,
    name: &'static str,
}

impl ApiCredential {
    fn new(value: impl Into<String>, source: CredentialSource, name: &'static str) -> Self {
        Self {
            value: SecretString::from(value.into()),
            source,
            name,
        }
    }

    /// Load a key from JSON config, falling back to the environment.
    ///
    /// Empty strings count as absent.
    pub fn optional_from_config_or_env(
        config: &JsonValue,
        config_key: &str,
        env_var: &str,
        name: &'static str,
    ) -> Option<Self> {
        if let Some(value) = config[config_key].as_str().filter(|v| !v.is_empty()) {
            return Some(Self::new(value, CredentialSource::Config, name));
        }
        std::env::var(env_var)
            .ok()
            .filter(|v| !v.is_empty())
            .map(|value| Self::new(value, CredentialSource::Environment, name))
    }

    /// Expose the credential value. Call only where the value is sent.
    pub fn expose(&self) -> &str {
        self.value.expose_secret()
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiCredential")
            .field("value", &"[REDACTED]")
            .field("source", &self.source)
            .field("name", &self.name)
            .finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {} [REDACTED]", self.name, self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_redacted_in_debug() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Environment, "Test API key");

        let debug = format!("{:?}", cred);
        assert!(!debug.contains(secret), "Secret exposed in Debug!");
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_credential_redacted_in_display() {
        let secret = "sk-super-secret-key-12345";
        let cred = ApiCredential::new(secret, CredentialSource::Config, "Test API key");

        let display = format!("{}", cred);
        assert!(!display.contains(secret), "Secret exposed in Display!");
        assert!(display.contains("Test API key"));
        assert!(display.contains("config"));
        assert_eq!(cred.expose(), secret);
    }

    #[test]
    fn test_config_wins_over_env() {
        let config = serde_json::json!({"api_key": "config-key"});

        std::env::set_var("RULEVAL_TEST_KEY_PRIORITY", "env-key");
        let cred = ApiCredential::optional_from_config_or_env(
            &config,
            "api_key",
            "RULEVAL_TEST_KEY_PRIORITY",
            "Test key",
        )
        .unwrap();

        assert_eq!(cred.expose(), "config-key");
        assert_eq!(cred.source, CredentialSource::Config);

        std::env::remove_var("RULEVAL_TEST_KEY_PRIORITY");
    }

    #[test]
    fn test_optional_falls_back_to_env() {
        std::env::set_var("RULEVAL_TEST_KEY_FALLBACK", "env-key");
        let cred = ApiCredential::optional_from_config_or_env(
            &serde_json::json!({"api_key": ""}),
            "api_key",
            "RULEVAL_TEST_KEY_FALLBACK",
            "Test key",
        )
        .unwrap();
        assert_eq!(cred.expose(), "env-key");
        assert_eq!(cred.to_string(), "Test key from environment [REDACTED]");
        std::env::remove_var("RULEVAL_TEST_KEY_FALLBACK");
    }

    #[test]
    fn test_missing_credential() {
        assert!(ApiCredential::optional_from_config_or_env(
            &serde_json::json!({}),
            "api_key",
            "RULEVAL_NONEXISTENT_VAR_12345",
            "Test key"
        )
        .is_none());
    }
}
