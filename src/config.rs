//! TOML configuration file.
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::domain::Intervals;
use crate::error::SyncError;
use crate::services::EngineConfig;

pub const CONFIG_DIR_ENV: &str = "NTPSYNC_CONFIG_DIR";

/// One week.
pub const MAX_INTERVAL_MINUTES: u64 = 7 * 24 * 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSection {
    pub timezone: String,
    pub servers: Vec<String>,
    pub sync_interval_minutes: u64,
    pub retry_interval_minutes: u64,
    pub max_retries: u32,
    pub query_timeout_secs: u64,
    pub ipv6_only: bool,
}

impl Default for SyncSection {
    fn default() -> Self {
        Self {
            timezone: "UTC".into(),
            servers: vec!["pool.ntp.org".into(), "time.google.com".into()],
            sync_interval_minutes: 60,
            retry_interval_minutes: 5,
            max_retries: 3,
            query_timeout_secs: 10,
            ipv6_only: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSection {
    /// Defaults to `state.toml` next to the config file.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSection {
    pub enabled: bool,
    pub color: bool,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            enabled: true,
            color: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sync: SyncSection,
    pub store: StoreSection,
    pub logging: LoggingSection,
}

impl Config {
    /// Load from the default location; a missing file yields defaults.
    pub fn load() -> Result<Self, SyncError> {
        Self::load_from(&default_path())
    }

    pub fn load_from(path: &Path) -> Result<Self, SyncError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SyncError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let serialized =
            toml::to_string_pretty(self).map_err(|e| SyncError::Config(e.to_string()))?;
        fs::write(path, serialized)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SyncError> {
        let s = &self.sync;
        if s.servers.iter().all(|h| h.trim().is_empty()) {
            return Err(SyncError::Config("at least one server is required".into()));
        }
        if s.max_retries == 0 {
            return Err(SyncError::Config("max_retries must be at least 1".into()));
        }
        if s.sync_interval_minutes == 0 || s.retry_interval_minutes == 0 {
            return Err(SyncError::Config("intervals must be at least 1 minute".into()));
        }
        if s.sync_interval_minutes > MAX_INTERVAL_MINUTES
            || s.retry_interval_minutes > MAX_INTERVAL_MINUTES
        {
            return Err(SyncError::Config(format!(
                "intervals must be at most {MAX_INTERVAL_MINUTES} minutes"
            )));
        }
        if s.query_timeout_secs == 0 {
            return Err(SyncError::Config("query_timeout_secs must be at least 1".into()));
        }
        Ok(())
    }

    /// Configured servers, trimmed, blanks dropped.
    pub fn servers(&self) -> Vec<String> {
        self.sync
            .servers
            .iter()
            .map(|h| h.trim())
            .filter(|h| !h.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn intervals(&self) -> Intervals {
        Intervals::from_minutes(
            self.sync.sync_interval_minutes,
            self.sync.retry_interval_minutes,
        )
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            max_retries: self.sync.max_retries,
            query_timeout: Duration::from_secs(self.sync.query_timeout_secs),
        }
    }

    pub fn state_path(&self) -> PathBuf {
        self.store
            .path
            .clone()
            .unwrap_or_else(|| resolve_config_dir().join("state.toml"))
    }
}

pub fn default_path() -> PathBuf {
    resolve_config_dir().join("config.toml")
}

fn resolve_config_dir() -> PathBuf {
    if let Some(val) = env::var_os(CONFIG_DIR_ENV) {
        let path = PathBuf::from(val);
        if path.is_absolute() {
            return path;
        }
        return env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| PathBuf::from("."));
    }
    if let Some(base) = dirs::config_dir() {
        return base.join("ntpsync");
    }
    PathBuf::from(".ntpsync")
}
