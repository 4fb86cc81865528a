use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

use crate::utils;

/// Current configuration version
pub const CURRENT_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_database_path")]
    pub database_path: String,
    #[serde(default = "default_server_url")]
    pub server_url: String,
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,
    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: u32,
    #[serde(default = "default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub log_format: LogFormat,
    #[serde(default = "default_theme_path")]
    pub theme_path: String,
    #[serde(default = "default_config_version")]
    pub config_version: Option<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            database_path: default_database_path(),
            server_url: default_server_url(),
            session_cookie: default_session_cookie(),
            session_ttl_hours: default_session_ttl_hours(),
            log_filter: default_log_filter(),
            log_format: LogFormat::default(),
            theme_path: default_theme_path(),
            config_version: Some(CURRENT_CONFIG_VERSION),
        }
    }
}

// Default value functions
fn default_bind_address() -> String {
    "127.0.0.1:5000".to_string()
}

fn default_database_path() -> String {
    // Fallback only; the real profile is applied at load time
    Config::default_database_path_for_profile(utils::Profile::Prod)
}

fn default_server_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_session_cookie() -> String {
    "planner.sid".to_string()
}

fn default_session_ttl_hours() -> u32 {
    24 * 7
}

fn default_log_filter() -> String {
    "daily_planner=info,tower_http=info".to_string()
}

fn default_theme_path() -> String {
    Config::default_theme_path_for_profile(utils::Profile::Prod)
}

fn default_config_version() -> Option<u32> {
    Some(CURRENT_CONFIG_VERSION)
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config directory: {0}")]
    ConfigDirError(String),
    #[error("Failed to read config file: {0}")]
    ReadError(String),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Failed to write config file: {0}")]
    WriteError(String),
}

impl Config {
    /// Load configuration from file, or create default if missing
    /// Uses the provided profile to determine config and data paths
    pub fn load_with_profile(profile: utils::Profile) -> Result<Self, ConfigError> {
        let config_path = Self::get_config_path(profile)?;

        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            let mut config = Config::default();
            config.database_path = Self::default_database_path_for_profile(profile);
            config.theme_path = Self::default_theme_path_for_profile(profile);
            config.save_to(&config_path)?;
            tracing::info!(path = %config_path.display(), "wrote default config");
            Ok(config)
        }
    }

    /// Load configuration from an explicit file. Missing keys take defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save_to(&mut self, path: &Path) -> Result<(), ConfigError> {
        // Ensure config version is set before saving
        self.config_version = Some(CURRENT_CONFIG_VERSION);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError(e.to_string()))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::WriteError(format!("Failed to serialize config: {}", e)))?;

        fs::write(path, toml_string).map_err(|e| ConfigError::WriteError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path(profile: utils::Profile) -> Result<PathBuf, ConfigError> {
        let config_dir = utils::get_config_dir(profile).ok_or_else(|| {
            ConfigError::ConfigDirError("Could not determine config directory".to_string())
        })?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get default database path for a specific profile
    fn default_database_path_for_profile(profile: utils::Profile) -> String {
        if let Some(data_dir) = utils::get_data_dir(profile) {
            data_dir.join("planner.db").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.local/share/planner-dev/planner.db".to_string(),
                utils::Profile::Prod => "~/.local/share/planner/planner.db".to_string(),
            }
        }
    }

    fn default_theme_path_for_profile(profile: utils::Profile) -> String {
        if let Some(config_dir) = utils::get_config_dir(profile) {
            config_dir.join("theme.toml").to_string_lossy().to_string()
        } else {
            match profile {
                utils::Profile::Dev => "~/.config/planner-dev/theme.toml".to_string(),
                utils::Profile::Prod => "~/.config/planner/theme.toml".to_string(),
            }
        }
    }

    /// Get the expanded database path (with ~ expansion)
    pub fn get_database_path(&self) -> PathBuf {
        utils::expand_path(&self.database_path)
    }

    pub fn get_theme_path(&self) -> PathBuf {
        utils::expand_path(&self.theme_path)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(u64::from(self.session_ttl_hours) * 3600)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str("bind_address = \"0.0.0.0:8080\"").unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.session_cookie, "planner.sid");
        assert_eq!(config.session_ttl_hours, 168);
        assert_eq!(config.log_format, LogFormat::Text);
        assert_eq!(config.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn save_then_load_from_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("config.toml");
        let mut config = Config {
            log_format: LogFormat::Json,
            session_ttl_hours: 2,
            config_version: None,
            ..Config::default()
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.log_format, LogFormat::Json);
        assert_eq!(loaded.session_ttl(), Duration::from_secs(7200));
        assert_eq!(loaded.config_version, Some(CURRENT_CONFIG_VERSION));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "session_ttl_hours = \"soon\"").unwrap();
        assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseError(_))));
    }
}
