/*!
 * Configuration types for cosmos-presence
 */

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{PresenceError, Result};

/// Default asset shown as the large image of every activity
pub const DEFAULT_LARGE_IMAGE_URL: &str = "https://media0.giphy.com/media/v1.Y2lkPTc5MGI3NjExZGE0ZXVvY3QwbmkyN2Vkbmg3ZHo1OXZkcW13OXU4aHphaWpvbndiNSZlcD12MV9pbnRlcm5hbF9naWZfYnlfaWQmY3Q9Zw/PkKzNQjwPy7GvxZbfe/giphy.gif";

/// Runtime configuration for the presence daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresenceConfig {
    /// Directory holding the settings and discovery documents
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Host process name to look for in the process table
    #[serde(default = "default_process_name")]
    pub process_name: String,

    /// Delay before re-querying the process table when the host is absent
    #[serde(default = "default_search_retry")]
    pub search_retry_secs: u64,

    /// Grace period between finding the host and opening the channel
    #[serde(default = "default_startup_grace")]
    pub startup_grace_secs: u64,

    /// Interval of the host liveness re-check
    #[serde(default = "default_liveness_interval")]
    pub liveness_interval_secs: u64,

    /// Interval between activity cycles while connected
    #[serde(default = "default_activity_interval")]
    pub activity_interval_secs: u64,

    /// Delay between the initial and the explored announce
    #[serde(default = "default_explored_delay")]
    pub explored_delay_secs: u64,

    /// Delay before restarting discovery after a disconnect
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// Limit on opening the channel and receiving READY
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    /// Large image asset sent with each activity
    #[serde(default = "default_large_image_url")]
    pub large_image_url: String,

    /// Chance that the explored line shows the description instead of facts
    #[serde(default = "default_description_probability")]
    pub description_probability: f64,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stdout)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            process_name: default_process_name(),
            search_retry_secs: default_search_retry(),
            startup_grace_secs: default_startup_grace(),
            liveness_interval_secs: default_liveness_interval(),
            activity_interval_secs: default_activity_interval(),
            explored_delay_secs: default_explored_delay(),
            reconnect_delay_secs: default_reconnect_delay(),
            connect_timeout_secs: default_connect_timeout(),
            large_image_url: default_large_image_url(),
            description_probability: default_description_probability(),
            log_level: LogLevel::Info,
            log_file: None,
            verbose: false,
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    Warn,

    /// Info, warnings, and errors
    #[default]
    Info,

    /// Debug and above
    Debug,

    /// All messages including traces
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

// Default value functions for serde
fn default_data_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("cosmos-presence")
}

fn default_process_name() -> String {
    if cfg!(windows) {
        "Discord.exe".to_string()
    } else {
        "Discord".to_string()
    }
}

fn default_search_retry() -> u64 {
    5
}

fn default_startup_grace() -> u64 {
    25
}

fn default_liveness_interval() -> u64 {
    60 * 60
}

fn default_activity_interval() -> u64 {
    45
}

fn default_explored_delay() -> u64 {
    10
}

fn default_reconnect_delay() -> u64 {
    3
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_large_image_url() -> String {
    DEFAULT_LARGE_IMAGE_URL.to_string()
}

fn default_description_probability() -> f64 {
    0.15
}

/// Config file name inside the default data dir
pub const CONFIG_FILE: &str = "config.toml";

impl PresenceConfig {
    /// `config.toml` in the default data dir
    pub fn default_path() -> PathBuf {
        default_data_dir().join(CONFIG_FILE)
    }

    /// Load `path`, or the default file if present, or built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::from_file(path),
            None => {
                let default_path = Self::default_path();
                if default_path.is_file() {
                    Self::from_file(&default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: PresenceConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Reject configurations the session cannot run with
    pub fn validate(&self) -> Result<()> {
        let intervals = [
            ("search_retry_secs", self.search_retry_secs),
            ("liveness_interval_secs", self.liveness_interval_secs),
            ("activity_interval_secs", self.activity_interval_secs),
            ("explored_delay_secs", self.explored_delay_secs),
            ("reconnect_delay_secs", self.reconnect_delay_secs),
            ("connect_timeout_secs", self.connect_timeout_secs),
        ];
        for (name, value) in intervals {
            if value == 0 {
                return Err(PresenceError::Config(format!(
                    "{} must be greater than 0",
                    name
                )));
            }
        }

        // The explored announce must land before the next cycle re-announces
        if self.explored_delay_secs >= self.activity_interval_secs {
            return Err(PresenceError::Config(format!(
                "explored_delay_secs ({}) must be shorter than activity_interval_secs ({})",
                self.explored_delay_secs, self.activity_interval_secs
            )));
        }

        if self.process_name.trim().is_empty() {
            return Err(PresenceError::Config(
                "process_name must not be empty".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.description_probability) {
            return Err(PresenceError::Config(format!(
                "description_probability must be within [0, 1], got {}",
                self.description_probability
            )));
        }

        Ok(())
    }

    pub fn search_retry(&self) -> Duration {
        Duration::from_secs(self.search_retry_secs)
    }

    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }

    pub fn liveness_interval(&self) -> Duration {
        Duration::from_secs(self.liveness_interval_secs)
    }

    pub fn activity_interval(&self) -> Duration {
        Duration::from_secs(self.activity_interval_secs)
    }

    pub fn explored_delay(&self) -> Duration {
        Duration::from_secs(self.explored_delay_secs)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_secs(self.reconnect_delay_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}
