use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

use crate::{
    base_libs::_errors::ConfigError,
    config::_constants::{
        DEFAULT_IDLE_DELAY, DEFAULT_IDLE_SLICE, DEFAULT_IDLE_TIMEOUT, DEFAULT_LOG_FILE,
    },
};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub coalescer: CoalescerConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CoalescerConfig {
    /// Timeout handed to the scheduler when a set does not pass one
    #[serde(default = "default_timeout_ms")]
    pub default_timeout_ms: u64,
    /// Defer writes whose last duration does not fit the idle slice
    #[serde(default = "default_true")]
    pub adaptive_deferral: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,
    #[serde(default = "default_idle_slice_ms")]
    pub idle_slice_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Rocksdb,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// RocksDB directory, unused by the memory backend
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default)]
    pub quota_bytes: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// No file logging when unset
    #[serde(default)]
    pub directory: Option<String>,
    #[serde(default = "default_log_file")]
    pub file_name: String,
    #[serde(default = "default_stdout_level")]
    pub stdout_level: String,
    #[serde(default = "default_file_level")]
    pub file_level: String,
}

fn default_true() -> bool {
    true
}

fn default_timeout_ms() -> u64 {
    DEFAULT_IDLE_TIMEOUT.as_millis() as u64
}

fn default_idle_delay_ms() -> u64 {
    DEFAULT_IDLE_DELAY.as_millis() as u64
}

fn default_idle_slice_ms() -> u64 {
    DEFAULT_IDLE_SLICE.as_millis() as u64
}

fn default_store_path() -> String {
    "./data/deferkv".to_string()
}

fn default_log_file() -> String {
    DEFAULT_LOG_FILE.to_string()
}

fn default_stdout_level() -> String {
    "warn".to_string()
}

fn default_file_level() -> String {
    "debug".to_string()
}

impl Default for CoalescerConfig {
    fn default() -> Self {
        Self {
            default_timeout_ms: default_timeout_ms(),
            adaptive_deferral: true,
        }
    }
}

impl CoalescerConfig {
    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            idle_delay_ms: default_idle_delay_ms(),
            idle_slice_ms: default_idle_slice_ms(),
        }
    }
}

impl SchedulerConfig {
    pub fn idle_delay(&self) -> Duration {
        Duration::from_millis(self.idle_delay_ms)
    }

    pub fn idle_slice(&self) -> Duration {
        Duration::from_millis(self.idle_slice_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: default_store_path(),
            quota_bytes: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            directory: None,
            file_name: default_log_file(),
            stdout_level: default_stdout_level(),
            file_level: default_file_level(),
        }
    }
}

impl Config {
    pub fn load(config_path: &str) -> Result<Config, ConfigError> {
        let config_str =
            fs::read_to_string(Path::new(config_path)).map_err(|source| ConfigError::Io {
                path: config_path.to_string(),
                source,
            })?;

        Config::parse(config_path, &config_str)
    }

    pub fn parse(config_path: &str, config_str: &str) -> Result<Config, ConfigError> {
        serde_json::from_str(config_str).map_err(|source| ConfigError::Parse {
            path: config_path.to_string(),
            source,
        })
    }

    pub fn load_or_default(config_path: Option<&str>) -> Result<Config, ConfigError> {
        match config_path {
            Some(path) => Config::load(path),
            None => Ok(Config::default()),
        }
    }
}
