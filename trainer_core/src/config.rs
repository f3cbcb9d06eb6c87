//! Configuration file support for the trainer tools.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/trainer/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable that overrides the configured API token
pub const TOKEN_ENV_VAR: &str = "HEVY_TOKEN";

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub remote: RemoteConfig,

    #[serde(default)]
    pub sync: SyncConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Remote fitness-tracking service configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_token: Option<String>,

    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl RemoteConfig {
    /// Resolve the API token, preferring the `HEVY_TOKEN` environment variable
    pub fn resolve_token(&self) -> Result<String> {
        self.resolve_token_with(std::env::var(TOKEN_ENV_VAR).ok())
    }

    fn resolve_token_with(&self, env_token: Option<String>) -> Result<String> {
        env_token
            .into_iter()
            .chain(self.api_token.clone())
            .map(|t| t.trim().to_string())
            .find(|t| !t.is_empty())
            .ok_or_else(|| {
                Error::Config(format!(
                    "{} environment variable or remote.api_token is required",
                    TOKEN_ENV_VAR
                ))
            })
    }
}

/// Sync window parameters
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SyncConfig {
    #[serde(default = "default_push_window_days")]
    pub push_window_days: i64,

    #[serde(default = "default_pull_window_days")]
    pub pull_window_days: i64,

    #[serde(default = "default_page_size")]
    pub page_size: u32,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            push_window_days: default_push_window_days(),
            pull_window_days: default_pull_window_days(),
            page_size: default_page_size(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir().unwrap_or_else(|| {
        std::env::var("HOME")
            .map(|home| PathBuf::from(home).join(".local/share"))
            .unwrap_or_else(|_| PathBuf::from("."))
    });
    base.join("trainer")
}

fn default_base_url() -> String {
    "https://api.hevyapp.com".into()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_push_window_days() -> i64 {
    7
}

fn default_pull_window_days() -> i64 {
    30
}

fn default_page_size() -> u32 {
    50
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!(
                "No config file found at {:?}, using defaults",
                config_path
            );
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir().unwrap_or_else(|| {
            std::env::var("HOME")
                .map(|home| PathBuf::from(home).join(".config"))
                .unwrap_or_else(|_| PathBuf::from("."))
        });
        base.join("trainer").join("config.toml")
    }

    /// Reject values that would make sync windows or pagination meaningless
    pub fn validate(&self) -> Result<()> {
        if self.sync.page_size == 0 {
            return Err(Error::Config("sync.page_size must be at least 1".into()));
        }
        if self.sync.push_window_days < 0 || self.sync.pull_window_days < 0 {
            return Err(Error::Config("sync windows cannot be negative".into()));
        }
        if self.remote.base_url.trim().is_empty() {
            return Err(Error::Config("remote.base_url cannot be empty".into()));
        }
        Ok(())
    }

    /// Save the current configuration to the default path
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path();
        self.save_to(&config_path)
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
