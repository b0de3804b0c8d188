//! Configuration management for familyhub.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::display::night::parse_time_of_day;
use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "familyhub";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "familyhub.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `FAMILYHUB_`, sections split on `__`)
/// 2. TOML config file at `~/.config/familyhub/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Display defaults, used where a family leaves a setting unset.
    pub display: DisplayConfig,
    /// Write retry configuration.
    pub retry: RetryConfig,
    /// Change feed configuration.
    pub realtime: RealtimeConfig,
    /// Session configuration.
    pub auth: AuthConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/familyhub/familyhub.db`
    pub database_path: Option<PathBuf>,
}

/// Display defaults for the mom display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Seconds without interaction before the screensaver starts.
    pub idle_timeout_secs: u32,
    /// Seconds each photo stays on screen.
    pub photo_interval_secs: u32,
    /// Start of the night-mode window (`HH:MM`).
    pub night_mode_start: Option<String>,
    /// End of the night-mode window (`HH:MM`).
    pub night_mode_end: Option<String>,
    /// Interval between re-evaluations of the display, in milliseconds.
    pub tick_interval_ms: u64,
}

/// Retry policy for writes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    pub base_delay_ms: u64,
    /// Upper bound for any single delay, in milliseconds.
    pub max_delay_ms: u64,
}

/// How change notifications reach subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Poll the shared database file; works across processes.
    #[default]
    Poll,
    /// In-process broadcast; only sees writes made by the same process.
    Local,
}

/// Change feed configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RealtimeConfig {
    /// Which feed implementation the display uses.
    pub mode: FeedMode,
    /// Buffered events per subscriber before it is considered lagging.
    pub channel_capacity: usize,
    /// Poll interval for the polling feed, in milliseconds.
    pub poll_interval_ms: u64,
    /// First reconnect delay after the feed drops, in milliseconds.
    pub reconnect_base_ms: u64,
    /// Maximum reconnect delay, in milliseconds.
    pub reconnect_max_ms: u64,
}

/// Session configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Lifetime of a login session in hours.
    pub session_ttl_hours: u32,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            idle_timeout_secs: 300,
            photo_interval_secs: 30,
            night_mode_start: None,
            night_mode_end: None,
            tick_interval_ms: 1000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 200,
            max_delay_ms: 5_000,
        }
    }
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            mode: FeedMode::Poll,
            channel_capacity: 256,
            poll_interval_ms: 1000,
            reconnect_base_ms: 1000,
            reconnect_max_ms: 60_000,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            session_ttl_hours: 24 * 30,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file).nested())
            .merge(Env::prefixed("FAMILYHUB_").split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("display.idle_timeout_secs", u64::from(self.display.idle_timeout_secs)),
            ("display.photo_interval_secs", u64::from(self.display.photo_interval_secs)),
            ("display.tick_interval_ms", self.display.tick_interval_ms),
            ("retry.max_attempts", u64::from(self.retry.max_attempts)),
            ("realtime.poll_interval_ms", self.realtime.poll_interval_ms),
            ("realtime.reconnect_base_ms", self.realtime.reconnect_base_ms),
            ("realtime.channel_capacity", self.realtime.channel_capacity as u64),
            ("auth.session_ttl_hours", u64::from(self.auth.session_ttl_hours)),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} must be greater than 0"),
                });
            }
        }

        if self.retry.base_delay_ms > self.retry.max_delay_ms {
            return Err(Error::ConfigValidation {
                message: format!(
                    "retry.base_delay_ms ({}) cannot be greater than retry.max_delay_ms ({})",
                    self.retry.base_delay_ms, self.retry.max_delay_ms
                ),
            });
        }

        if self.realtime.reconnect_base_ms > self.realtime.reconnect_max_ms {
            return Err(Error::ConfigValidation {
                message: format!(
                    "realtime.reconnect_base_ms ({}) cannot be greater than realtime.reconnect_max_ms ({})",
                    self.realtime.reconnect_base_ms, self.realtime.reconnect_max_ms
                ),
            });
        }

        for value in [&self.display.night_mode_start, &self.display.night_mode_end]
            .into_iter()
            .flatten()
        {
            if parse_time_of_day(value).is_err() {
                return Err(Error::ConfigValidation {
                    message: format!("invalid night mode time: {value}"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the display tick interval as a Duration.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.display.tick_interval_ms)
    }

    /// Get the polling feed interval as a Duration.
    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.realtime.poll_interval_ms)
    }

    /// Get the session lifetime.
    #[must_use]
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(i64::from(self.auth.session_ttl_hours))
    }
}
