//! Configuration management for feed-notifier.
//!
//! Configuration is read from `~/.config/feed-notifier/config.toml` at startup.
//! If the file doesn't exist, a default configuration with comments is created.

pub mod interval;

pub use interval::{format_interval, parse_interval};

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use rand::Rng;

/// Browser-like user agent; some feed servers reject unknown clients.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_4) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/83.0.4103.97 Safari/537.36";

/// Longest delay between two scheduled ticks.
pub const MAX_TICK_DELAY_SECS: u64 = 365 * 86400;

/// Main configuration struct.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// SQLite database file. Defaults to the platform data directory.
    pub database_path: Option<PathBuf>,
    pub monitor: MonitorConfig,
    pub fetcher: FetcherConfig,
}

/// Polling cadence of the monitor.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub base_interval_secs: u64,
    /// Upper bound of the random delay added to every tick
    pub jitter_secs: u64,
    /// Maximum number of feeds fetched concurrently within one cycle
    pub workers: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            base_interval_secs: 300,
            jitter_secs: 60,
            workers: 10,
        }
    }
}

impl MonitorConfig {
    /// Delay until the next scheduled tick: `base + uniform(0..=jitter)`,
    /// capped at [`MAX_TICK_DELAY_SECS`].
    pub fn next_delay(&self) -> Duration {
        let jitter = if self.jitter_secs == 0 {
            0
        } else {
            rand::rng().random_range(0..=self.jitter_secs)
        };
        let secs = self
            .base_interval_secs
            .saturating_add(jitter)
            .min(MAX_TICK_DELAY_SECS);
        Duration::from_secs(secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetcherConfig {
    /// Total request timeout; a hung feed server must not stall a cycle
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for FetcherConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// If the default config file doesn't exist, creates one with comments.
    /// An explicitly given path must exist.
    /// Missing fields in the config file will use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let default_path = Self::default_config_path()?;
                if !default_path.exists() {
                    Self::create_default_config(&default_path)?;
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        Self::from_toml(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Get the default config file path: `~/.config/feed-notifier/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("feed-notifier").join("config.toml"))
    }

    /// Create a default config file with comments.
    fn create_default_config(path: &PathBuf) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.clone(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.clone(),
                source: e,
            })?;

        Ok(())
    }

    fn default_config_content() -> String {
        r##"# feed-notifier configuration

# SQLite database holding subscriptions and delivery records.
# Defaults to the platform data directory when unset.
# database_path = "/var/lib/feed-notifier/feed-notifier.db"

[monitor]
# Every feed is polled once per cycle. A cycle starts
# base_interval_secs + random(0..=jitter_secs) seconds after the last one.
base_interval_secs = 300
jitter_secs = 60
# Feeds fetched concurrently within one cycle
workers = 10

[fetcher]
timeout_secs = 30
# user_agent = "Mozilla/5.0 ..."
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read config file {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {}", .path.display(), .source)]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}
