//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::{EventOrder, EventType, EventsQuery};

/// Root application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Remote API client settings
    #[serde(default)]
    pub api: ApiConfig,

    /// Which events and borders are synced
    #[serde(default)]
    pub sync: SyncConfig,

    /// Where output is written
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(AppError::validation("api.base_url is empty"));
        }
        url::Url::parse(&self.api.base_url)?;
        if self.api.user_agent.trim().is_empty() {
            return Err(AppError::validation("api.user_agent is empty"));
        }
        if self.api.timeout_secs == 0 {
            return Err(AppError::validation("api.timeout_secs must be > 0"));
        }
        if self.api.retry_max_wait_ms < self.api.retry_wait_ms {
            return Err(AppError::validation(
                "api.retry_max_wait_ms must be >= api.retry_wait_ms",
            ));
        }
        if self.sync.event_types.is_empty() {
            return Err(AppError::validation("No event types defined"));
        }
        if self.sync.supported_borders.is_empty() {
            return Err(AppError::validation("sync.supported_borders is empty"));
        }
        if self.sync.anniversary_borders.is_empty() {
            return Err(AppError::validation("sync.anniversary_borders is empty"));
        }
        if self.sync.anniversary_participants == 0 {
            return Err(AppError::validation(
                "sync.anniversary_participants must be > 0",
            ));
        }
        for (name, dir) in [
            ("storage.border_dir", &self.storage.border_dir),
            ("storage.event_dir", &self.storage.event_dir),
            ("storage.metadata_dir", &self.storage.metadata_dir),
        ] {
            if dir.trim().is_empty() {
                return Err(AppError::validation(format!("{name} is empty")));
            }
        }
        if self.storage.mode == StorageMode::S3 && self.storage.bucket.trim().is_empty() {
            return Err(AppError::validation("storage.bucket is empty"));
        }
        Ok(())
    }
}

/// HTTP client and retry behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Retries after the first attempt on 429/5xx
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// First backoff delay, doubled on every retry
    #[serde(default = "defaults::retry_wait")]
    pub retry_wait_ms: u64,

    /// Backoff ceiling
    #[serde(default = "defaults::retry_max_wait")]
    pub retry_max_wait_ms: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
            retry_wait_ms: defaults::retry_wait(),
            retry_max_wait_ms: defaults::retry_max_wait(),
        }
    }
}

/// Event and border whitelists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Remote event type codes requested from `/events`
    #[serde(default = "defaults::event_types")]
    pub event_types: Vec<u8>,

    /// Event-point borders every normal event must expose
    #[serde(default = "defaults::supported_borders")]
    pub supported_borders: Vec<u32>,

    /// Idol-point borders every anniversary idol must expose
    #[serde(default = "defaults::anniversary_borders")]
    pub anniversary_borders: Vec<u32>,

    /// Exact number of idol rankings in an anniversary event
    #[serde(default = "defaults::anniversary_participants")]
    pub anniversary_participants: usize,
}

impl SyncConfig {
    /// The `/events` filter used to discover new events.
    pub fn events_query(&self) -> EventsQuery {
        EventsQuery {
            at: None,
            types: self.event_types.iter().copied().map(EventType::from).collect(),
            order_by: vec![EventOrder::IdAsc],
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            event_types: defaults::event_types(),
            supported_borders: defaults::supported_borders(),
            anniversary_borders: defaults::anniversary_borders(),
            anniversary_participants: defaults::anniversary_participants(),
        }
    }
}

/// Storage backend selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMode {
    #[default]
    Local,
    S3,
}

/// Output locations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub mode: StorageMode,

    /// Root directory for local mode
    #[serde(default = "defaults::root")]
    pub root: String,

    #[serde(default = "defaults::border_dir")]
    pub border_dir: String,

    #[serde(default = "defaults::event_dir")]
    pub event_dir: String,

    #[serde(default = "defaults::metadata_dir")]
    pub metadata_dir: String,

    /// Bucket for s3 mode
    #[serde(default = "defaults::bucket")]
    pub bucket: String,

    /// Key prefix inside the bucket
    #[serde(default)]
    pub prefix: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            mode: StorageMode::default(),
            root: defaults::root(),
            border_dir: defaults::border_dir(),
            event_dir: defaults::event_dir(),
            metadata_dir: defaults::metadata_dir(),
            bucket: defaults::bucket(),
            prefix: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "defaults::log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::log_level(),
        }
    }
}

mod defaults {
    // API defaults
    pub fn base_url() -> String {
        "https://api.matsurihi.me/api/mltd/v2".into()
    }
    pub fn user_agent() -> String {
        "border-sync/0.1".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_wait() -> u64 {
        2_000
    }
    pub fn retry_max_wait() -> u64 {
        30_000
    }

    // Sync defaults: theater, tour, anniversary, tune, tale
    pub fn event_types() -> Vec<u8> {
        vec![3, 4, 5, 11, 13]
    }
    pub fn supported_borders() -> Vec<u32> {
        vec![100, 2500]
    }
    pub fn anniversary_borders() -> Vec<u32> {
        vec![100, 1000]
    }
    pub fn anniversary_participants() -> usize {
        52
    }

    // Storage defaults
    pub fn root() -> String {
        "data".into()
    }
    pub fn border_dir() -> String {
        "border_info".into()
    }
    pub fn event_dir() -> String {
        "event_info".into()
    }
    pub fn metadata_dir() -> String {
        "metadata".into()
    }
    pub fn bucket() -> String {
        "mltd-border-predict".into()
    }

    pub fn log_level() -> String {
        "info".into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
            [sync]
            supported_borders = [100, 1000, 2500]

            [storage]
            mode = "s3"
            prefix = "mltd"
            "#,
        )
        .unwrap();

        assert_eq!(config.sync.supported_borders, vec![100, 1000, 2500]);
        assert_eq!(config.sync.anniversary_borders, vec![100, 1000]);
        assert_eq!(config.sync.anniversary_participants, 52);
        assert_eq!(config.storage.mode, StorageMode::S3);
        assert_eq!(config.storage.border_dir, "border_info");
        assert_eq!(config.api.max_retries, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_empty_whitelist() {
        let mut config = Config::default();
        config.sync.supported_borders.clear();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_backoff() {
        let mut config = Config::default();
        config.api.retry_max_wait_ms = 10;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_events_query_from_config() {
        let query = SyncConfig::default().events_query();
        assert_eq!(query.types.len(), 5);
        assert!(query.types.contains(&EventType::Anniversary));
        assert_eq!(query.order_by, vec![EventOrder::IdAsc]);
    }

    #[test]
    fn test_load_missing_file_errors() {
        let err = Config::load("/nonexistent/config.toml").unwrap_err();
        assert!(matches!(err, AppError::Io(_)));
    }
}
