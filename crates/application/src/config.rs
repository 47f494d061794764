//! Session configuration.
//!
//! JSON on disk, every field optional, with a couple of environment
//! overrides for quick experiments.

use kindred_location::platform::Platform;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Overrides `location_timeout_ms`.
pub const ENV_LOCATION_TIMEOUT_MS: &str = "KINDRED_LOCATION_TIMEOUT_MS";
/// Overrides `platform` ("auto", "native" or "web").
pub const ENV_PLATFORM: &str = "KINDRED_PLATFORM";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: &'static str, message: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Geolocation implementation to use.
    pub platform: Platform,

    /// Upper bound on one location acquisition attempt.
    pub location_timeout_ms: u64,

    /// Feed requested when the profile names none.
    pub global_feed_id: String,

    /// Matches allowed to wait behind the visible one.
    pub pending_queue_limit: usize,

    /// Buffer size of each match intake channel.
    pub match_channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            platform: Platform::Auto,
            location_timeout_ms: kindred_location::DEFAULT_ACQUISITION_TIMEOUT.as_millis() as u64,
            global_feed_id: kindred_feed::GLOBAL_FEED_ID.to_string(),
            pending_queue_limit: kindred_matches::DEFAULT_PENDING_QUEUE_LIMIT,
            match_channel_capacity: kindred_matches::DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_json_str(&content)?;
        tracing::info!(path = %path.display(), "loaded session config");
        Ok(config)
    }

    /// Apply `KINDRED_*` environment overrides.
    pub fn with_env_overrides(self) -> Result<Self> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(raw) = lookup(ENV_LOCATION_TIMEOUT_MS) {
            self.location_timeout_ms =
                raw.trim()
                    .parse()
                    .map_err(|e: std::num::ParseIntError| ConfigError::InvalidValue {
                        field: "location_timeout_ms",
                        message: e.to_string(),
                    })?;
        }

        if let Some(raw) = lookup(ENV_PLATFORM) {
            self.platform = serde_json::from_value(serde_json::Value::String(
                raw.trim().to_lowercase(),
            ))
            .map_err(|e| ConfigError::InvalidValue {
                field: "platform",
                message: e.to_string(),
            })?;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.location_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "location_timeout_ms",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.global_feed_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "global_feed_id",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    pub fn location_timeout(&self) -> Duration {
        Duration::from_millis(self.location_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.location_timeout(), Duration::from_secs(12));
        assert_eq!(config.global_feed_id, "global");
        assert_eq!(config.platform, Platform::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = SessionConfig::from_json_str(r#"{"platform": "web"}"#).unwrap();
        assert_eq!(config.platform, Platform::Web);
        assert_eq!(config.location_timeout_ms, 12_000);
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let err = SessionConfig::from_json_str(r#"{"location_timeout_ms": 0}"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidValue {
                field: "location_timeout_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_bad_json_is_parse_error() {
        assert!(matches!(
            SessionConfig::from_json_str("{"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = SessionConfig::default()
            .with_overrides(|key| match key {
                ENV_LOCATION_TIMEOUT_MS => Some("15000".to_string()),
                ENV_PLATFORM => Some("Native".to_string()),
                _ => None,
            })
            .unwrap();
        assert_eq!(config.location_timeout_ms, 15_000);
        assert_eq!(config.platform, Platform::Native);
    }

    #[test]
    fn test_bad_override_rejected() {
        let err = SessionConfig::default()
            .with_overrides(|key| (key == ENV_LOCATION_TIMEOUT_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains("location_timeout_ms"));
    }

    #[test]
    fn test_missing_file() {
        let err = SessionConfig::load(Path::new("/nonexistent/kindred.json")).unwrap_err();
        assert!(matches!(err, ConfigError::ReadFile { .. }));
    }
}
