//! Crawler configuration.
//!
//! A [`CrawlConfig`] is built once at startup, from an optional YAML file and
//! then from command-line overrides, and handed to the components that need
//! it. Every field has a default, so an empty or partial file is valid.
//!
//! # Example
//!
//! ```yaml
//! base_dir: dataset
//! quota: 50
//! pause_min_secs: 0.5
//! pause_max_secs: 1.5
//! fetch:
//!   timeout_secs: 10
//!   max_retries: 3
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{info, instrument};

/// Errors raised while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
}

/// Settings for one crawler run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Root of the dataset: `<base_dir>/<category>/<source>/<id>_<slug>.txt`.
    pub base_dir: PathBuf,
    /// Maximum number of articles saved per (source, category) job.
    pub quota: usize,
    /// Bodies shorter than this many characters are discarded.
    pub min_body_chars: usize,
    /// Lower bound of the pause taken after each successful save.
    pub pause_min_secs: f64,
    /// Upper bound of the pause taken after each successful save.
    pub pause_max_secs: f64,
    /// How many jobs may run at the same time.
    pub parallel_jobs: usize,
    pub fetch: FetchConfig,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("dataset"),
            quota: 100,
            min_body_chars: 500,
            pause_min_secs: 1.0,
            pause_max_secs: 2.5,
            parallel_jobs: 1,
            fetch: FetchConfig::default(),
        }
    }
}

impl CrawlConfig {
    /// Load a configuration from a YAML file.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        let config = Self::from_yaml(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        info!(?config, "Loaded configuration");
        Ok(config)
    }

    /// Parse a configuration from YAML text. Blank input yields the defaults.
    pub fn from_yaml(raw: &str) -> Result<Self, serde_yaml::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(raw)
    }

    /// Pause bounds as durations, with the upper bound never below the lower.
    pub fn pause_range(&self) -> (Duration, Duration) {
        let min = secs(self.pause_min_secs);
        let max = secs(self.pause_max_secs).max(min);
        (min, max)
    }

    /// Disable the post-save pause entirely.
    pub fn without_pause(mut self) -> Self {
        self.pause_min_secs = 0.0;
        self.pause_max_secs = 0.0;
        self
    }
}

/// HTTP settings for the page fetcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout_secs: u64,
    /// Total attempts per URL, including the first one.
    pub max_retries: usize,
    /// Fixed part of the wait after a failed attempt.
    pub backoff_base_secs: f64,
    /// Added once per previous failed attempt.
    pub backoff_step_secs: f64,
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            max_retries: 3,
            backoff_base_secs: 1.0,
            backoff_step_secs: 1.0,
            user_agent: "Chrome/124.0.0.0 Safari/537.36".to_string(),
        }
    }
}

impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn backoff_base(&self) -> Duration {
        secs(self.backoff_base_secs)
    }

    pub fn backoff_step(&self) -> Duration {
        secs(self.backoff_step_secs)
    }
}

// Negative, NaN or out-of-range values from a config file count as zero.
fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CrawlConfig::default();
        assert_eq!(config.base_dir, PathBuf::from("dataset"));
        assert_eq!(config.quota, 100);
        assert_eq!(config.min_body_chars, 500);
        assert_eq!(config.fetch.max_retries, 3);
        assert_eq!(config.fetch.timeout(), Duration::from_secs(15));
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = CrawlConfig::from_yaml("quota: 7\nfetch:\n  max_retries: 5\n").unwrap();
        assert_eq!(config.quota, 7);
        assert_eq!(config.fetch.max_retries, 5);
        assert_eq!(config.fetch.timeout_secs, 15);
        assert_eq!(config.min_body_chars, 500);
    }

    #[test]
    fn test_blank_yaml_is_default() {
        assert_eq!(CrawlConfig::from_yaml("  \n").unwrap(), CrawlConfig::default());
    }

    #[test]
    fn test_invalid_yaml_is_error() {
        assert!(CrawlConfig::from_yaml("quota: [not a number").is_err());
    }

    #[test]
    fn test_pause_range_is_ordered() {
        let mut config = CrawlConfig::default();
        config.pause_min_secs = 2.0;
        config.pause_max_secs = 1.0;
        let (min, max) = config.pause_range();
        assert_eq!(min, Duration::from_secs(2));
        assert_eq!(max, Duration::from_secs(2));

        let (min, max) = config.without_pause().pause_range();
        assert_eq!(min, Duration::ZERO);
        assert_eq!(max, Duration::ZERO);
    }

    #[test]
    fn test_out_of_range_seconds_count_as_zero() {
        let yaml = "
pause_min_secs: -3.0
pause_max_secs: 1.0e30
fetch:
  backoff_base_secs: 1e30
  backoff_step_secs: .nan
";
        let config = CrawlConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.pause_range(), (Duration::ZERO, Duration::ZERO));
        assert_eq!(config.fetch.backoff_base(), Duration::ZERO);
        assert_eq!(config.fetch.backoff_step(), Duration::ZERO);

        let config = CrawlConfig::from_yaml("pause_min_secs: 0.25\npause_max_secs: 0.5\n").unwrap();
        assert_eq!(
            config.pause_range(),
            (Duration::from_millis(250), Duration::from_millis(500))
        );
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let err = CrawlConfig::load(Path::new("/definitely/not/here.yaml"))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
