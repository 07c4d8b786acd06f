//! Pipeline Configuration
//!
//! Configuration for the producer and consumer paths, loaded from
//! environment variables. Stream, store, and secret identifiers are
//! externally supplied; none of them are part of the core's logic.

use std::path::PathBuf;
use std::time::Duration;

use crate::application::services::retry::RetryConfig;
use crate::domain::window::DEFAULT_WINDOW_SIZE;

/// Default symbol list, comma-separated.
const DEFAULT_SYMBOLS: &str = "AAPL,MSFT,GOOGL";

/// Producer-side settings.
#[derive(Debug, Clone)]
pub struct ProducerSettings {
    /// Symbols to fetch and publish each invocation.
    pub symbols: Vec<String>,
    /// Publish retry/backoff settings.
    pub retry: RetryConfig,
    /// Interval between producer invocations in the local loop.
    pub interval: Duration,
}

impl Default for ProducerSettings {
    fn default() -> Self {
        Self {
            symbols: split_symbols(DEFAULT_SYMBOLS),
            retry: RetryConfig::default(),
            interval: Duration::from_secs(30),
        }
    }
}

/// Consumer-side settings.
#[derive(Debug, Clone)]
pub struct ConsumerSettings {
    /// Maximum records per delivery batch.
    pub batch_size: usize,
    /// Prices held per symbol window.
    pub window_size: usize,
}

impl Default for ConsumerSettings {
    fn default() -> Self {
        Self {
            batch_size: 100,
            window_size: DEFAULT_WINDOW_SIZE,
        }
    }
}

/// Complete pipeline configuration.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Stream identifier.
    pub stream_name: String,
    /// Keyed store identifier.
    pub keyed_store_name: String,
    /// Root directory of the blob archive.
    pub blob_root: PathBuf,
    /// Secret identifier for the secrets provider.
    pub secret_name: String,
    /// Producer settings.
    pub producer: ProducerSettings,
    /// Consumer settings.
    pub consumer: ConsumerSettings,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            stream_name: "tick-stream".to_string(),
            keyed_store_name: "tick-latest".to_string(),
            blob_root: PathBuf::from("data/archive"),
            secret_name: "tick-api-key-dev".to_string(),
            producer: ProducerSettings::default(),
            consumer: ConsumerSettings::default(),
        }
    }
}

impl PipelineConfig {
    /// Create configuration from environment variables.
    ///
    /// Every variable is optional and falls back to the defaults above.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the symbol list is present but empty,
    /// or a numeric setting parses to zero where zero is meaningless.
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let symbols = std::env::var("TICKFLOW_SYMBOLS")
            .map_or_else(|_| defaults.producer.symbols.clone(), |s| split_symbols(&s));
        if symbols.is_empty() {
            return Err(ConfigError::EmptyValue("TICKFLOW_SYMBOLS".to_string()));
        }

        let max_attempts = parse_env_u32("TICKFLOW_MAX_ATTEMPTS", defaults.producer.retry.max_attempts);
        if max_attempts == 0 {
            return Err(ConfigError::ZeroValue("TICKFLOW_MAX_ATTEMPTS".to_string()));
        }

        let window_size = parse_env_usize("TICKFLOW_WINDOW_SIZE", defaults.consumer.window_size);
        if window_size == 0 {
            return Err(ConfigError::ZeroValue("TICKFLOW_WINDOW_SIZE".to_string()));
        }

        let batch_size = parse_env_usize("TICKFLOW_BATCH_SIZE", defaults.consumer.batch_size);
        if batch_size == 0 {
            return Err(ConfigError::ZeroValue("TICKFLOW_BATCH_SIZE".to_string()));
        }

        Ok(Self {
            stream_name: parse_env_string("TICKFLOW_STREAM_NAME", &defaults.stream_name),
            keyed_store_name: parse_env_string("TICKFLOW_KEYED_STORE", &defaults.keyed_store_name),
            blob_root: std::env::var("TICKFLOW_BLOB_ROOT")
                .map_or(defaults.blob_root, PathBuf::from),
            secret_name: parse_env_string("TICKFLOW_SECRET_NAME", &defaults.secret_name),
            producer: ProducerSettings {
                symbols,
                retry: RetryConfig {
                    max_attempts,
                    backoff_base_secs: parse_env_u64(
                        "TICKFLOW_BACKOFF_BASE_SECS",
                        defaults.producer.retry.backoff_base_secs,
                    ),
                },
                interval: parse_env_duration_secs(
                    "TICKFLOW_PRODUCER_INTERVAL_SECS",
                    defaults.producer.interval,
                ),
            },
            consumer: ConsumerSettings {
                batch_size,
                window_size,
            },
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A variable is present but holds no usable value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// A numeric variable parsed to zero where zero is meaningless.
    #[error("environment variable {0} must be greater than zero")]
    ZeroValue(String),
}

fn split_symbols(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn parse_env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn parse_env_u32(key: &str, default: u32) -> u32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_contract() {
        let config = PipelineConfig::default();
        assert_eq!(config.stream_name, "tick-stream");
        assert_eq!(config.producer.symbols, vec!["AAPL", "MSFT", "GOOGL"]);
        assert_eq!(config.producer.retry.max_attempts, 3);
        assert_eq!(config.producer.retry.backoff_base_secs, 2);
        assert_eq!(config.consumer.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(config.consumer.batch_size, 100);
    }

    #[test]
    fn split_symbols_trims_and_drops_empties() {
        assert_eq!(
            split_symbols(" AAPL, MSFT ,,GOOGL "),
            vec!["AAPL", "MSFT", "GOOGL"]
        );
        assert!(split_symbols(" , ,").is_empty());
    }
}
