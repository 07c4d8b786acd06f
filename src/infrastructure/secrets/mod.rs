//! Environment-Backed Secrets Provider
//!
//! Resolves named secrets from environment variables holding JSON objects.
//! The secret name `tick-api-key-dev` maps to the variable
//! `TICKFLOW_SECRET_TICK_API_KEY_DEV`.

use async_trait::async_trait;

use crate::application::ports::{SecretsError, SecretsProvider};

/// Prefix for secret environment variables.
const VAR_PREFIX: &str = "TICKFLOW_SECRET_";

/// Secrets provider reading JSON objects from the environment.
#[derive(Debug, Clone, Default)]
pub struct EnvSecretsProvider;

impl EnvSecretsProvider {
    /// Create a provider.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn var_name(name: &str) -> String {
        let suffix: String = name
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{VAR_PREFIX}{suffix}")
    }
}

#[async_trait]
impl SecretsProvider for EnvSecretsProvider {
    async fn get_secret(&self, name: &str) -> Result<serde_json::Value, SecretsError> {
        let var = Self::var_name(name);
        let raw = std::env::var(&var).map_err(|_| SecretsError::NotFound(name.to_string()))?;
        serde_json::from_str(&raw).map_err(|err| SecretsError::Malformed(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secret_names_map_to_env_vars() {
        assert_eq!(
            EnvSecretsProvider::var_name("tick-api-key-dev"),
            "TICKFLOW_SECRET_TICK_API_KEY_DEV"
        );
    }

    #[tokio::test]
    async fn resolves_json_secret_from_env() {
        std::env::set_var(
            "TICKFLOW_SECRET_RESOLVES_JSON",
            r#"{"api_key":"abc123"}"#,
        );
        let provider = EnvSecretsProvider::new();
        let value = provider.get_secret("resolves-json").await.unwrap();
        assert_eq!(value["api_key"], "abc123");
    }

    #[tokio::test]
    async fn missing_secret_is_not_found() {
        let provider = EnvSecretsProvider::new();
        let err = provider.get_secret("does-not-exist").await.unwrap_err();
        assert!(matches!(err, SecretsError::NotFound(_)));
    }

    #[tokio::test]
    async fn non_json_secret_is_malformed() {
        std::env::set_var("TICKFLOW_SECRET_PLAIN_TEXT", "not json");
        let provider = EnvSecretsProvider::new();
        let err = provider.get_secret("plain-text").await.unwrap_err();
        assert!(matches!(err, SecretsError::Malformed(_)));
    }
}
