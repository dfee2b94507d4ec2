//! Runtime configuration for the HTTP layer.
//!
//! Configuration is optional: without a file every field takes its default.
//! A YAML file may override any subset of fields:
//!
//! ```yaml
//! user_agent: "diario_crawlers (+https://example.org)"
//! request_timeout_secs: 60
//! max_retries: 3
//! retry_base_delay_ms: 500
//! retry_max_jitter_ms: 100
//! ```

use crate::error::SpiderError;
use serde::{Deserialize, Serialize};
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// `User-Agent` header sent with every request.
    pub user_agent: String,
    /// Per-request timeout.
    pub request_timeout_secs: u64,
    /// Retries for transient failures (transport errors, 429, 5xx).
    pub max_retries: usize,
    /// First backoff delay; doubles on each attempt.
    pub retry_base_delay_ms: u64,
    /// Upper bound of the random jitter added to each backoff.
    pub retry_max_jitter_ms: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
            request_timeout_secs: 30,
            max_retries: 5,
            retry_base_delay_ms: 1000,
            retry_max_jitter_ms: 250,
        }
    }
}

impl CrawlerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SpiderError> {
        Ok(serde_yaml::from_str(yaml)?)
    }
}

/// Load the crawler configuration.
///
/// # Arguments
///
/// * `path` - Optional YAML file to read
///
/// # Returns
///
/// The parsed configuration, or [`CrawlerConfig::default`] when `path` is
/// `None`. Keys absent from the file keep their defaults.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not valid YAML for
/// [`CrawlerConfig`].
#[instrument(level = "info")]
pub async fn load_config(path: Option<&str>) -> Result<CrawlerConfig, Box<dyn Error>> {
    let Some(path) = path else {
        return Ok(CrawlerConfig::default());
    };

    let yaml = fs::read_to_string(path).await?;
    let config = CrawlerConfig::from_yaml_str(&yaml)?;
    info!(path, ?config, "Loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlerConfig::default();
        assert!(config.user_agent.starts_with("diario_crawlers/"));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.retry_base_delay_ms, 1000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CrawlerConfig::from_yaml_str("max_retries: 2\nuser_agent: test-agent\n").unwrap();
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.user_agent, "test-agent");
        assert_eq!(config.request_timeout_secs, 30);
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(CrawlerConfig::from_yaml_str("max_retries: lots").is_err());
    }

    #[tokio::test]
    async fn test_load_config_without_path() {
        let config = load_config(None).await.unwrap();
        assert_eq!(config, CrawlerConfig::default());
    }

    #[tokio::test]
    async fn test_load_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "request_timeout_secs: 5\n").unwrap();

        let config = load_config(path.to_str()).await.unwrap();
        assert_eq!(config.request_timeout_secs, 5);
    }

    #[tokio::test]
    async fn test_load_config_missing_file() {
        assert!(load_config(Some("/nonexistent/config.yaml")).await.is_err());
    }
}
