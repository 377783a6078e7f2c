//! Configuration management for glance.
//!
//! The trigger is not part of this file; it has its own record owned by
//! [`TriggerStore`](crate::TriggerStore) so capture can rewrite it atomically.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};

use crate::{APP_NAME, Service};

/// Application settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    /// Service shown when the app starts
    #[serde(default, skip_serializing_if = "is_default_service")]
    pub start_service: Service,

    /// Landing page override for Gemini
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gemini_url: Option<String>,

    /// Landing page override for Claude
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub claude_url: Option<String>,

    /// Show the overlay right after launch
    #[serde(default = "default_true", skip_serializing_if = "is_true")]
    pub show_on_launch: bool,

    /// Exit when the global hotkey cannot be installed instead of running
    /// with the tray menu only
    #[serde(default, skip_serializing_if = "is_false")]
    pub require_global_hotkey: bool,
}

fn default_true() -> bool {
    true
}

fn is_true(v: &bool) -> bool {
    *v
}

fn is_false(v: &bool) -> bool {
    !*v
}

fn is_default_service(v: &Service) -> bool {
    *v == Service::default()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            start_service: Service::default(),
            gemini_url: None,
            claude_url: None,
            show_on_launch: true,
            require_global_hotkey: false,
        }
    }
}

impl Config {
    /// Landing page of `service`, honoring overrides.
    pub fn home_url(&self, service: Service) -> &str {
        let custom = match service {
            Service::Gemini => self.gemini_url.as_deref(),
            Service::Claude => self.claude_url.as_deref(),
        };
        custom.unwrap_or(service.default_home_url())
    }
}

/// Manages loading and saving configuration files.
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Creates a new ConfigManager with the default configuration directory.
    pub fn new() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Creates a new ConfigManager with a specified configuration directory.
    pub fn with_config_dir<P: AsRef<std::path::Path>>(dir: P) -> Self {
        let config_path = dir.as_ref().join(format!("{}.toml", APP_NAME));
        Self { config_path }
    }

    /// Returns the default path to the configuration file.
    pub fn default_config_path() -> Result<PathBuf> {
        Ok(default_config_dir()?.join(format!("{}.toml", APP_NAME)))
    }

    /// Loads the configuration from the config file or returns default.
    pub fn load(&self) -> Result<Config> {
        if !self.config_path.exists() {
            return Ok(Config::default());
        }

        let config_content = fs::read_to_string(&self.config_path)
            .with_context(|| format!("Failed to read config file at {:?}", self.config_path))?;

        let config: Config = toml::from_str(&config_content)
            .with_context(|| format!("Failed to parse config file at {:?}", self.config_path))?;

        Ok(config)
    }

    /// Saves the configuration to the config file.
    pub fn save(&self, config: &Config) -> Result<()> {
        let config_dir = self
            .config_path
            .parent()
            .with_context(|| format!("Failed to get parent directory of {:?}", self.config_path))?;

        fs::create_dir_all(config_dir)
            .with_context(|| format!("Failed to create config directory at {:?}", config_dir))?;

        let serialized =
            toml::to_string_pretty(&config).context("Failed to serialize configuration")?;

        fs::write(&self.config_path, serialized)
            .with_context(|| format!("Failed to write config file at {:?}", self.config_path))?;

        Ok(())
    }

    /// Returns the path to the configuration file.
    pub fn config_path(&self) -> &std::path::Path {
        &self.config_path
    }
}

/// Directory holding the config file and the trigger record.
pub fn default_config_dir() -> Result<PathBuf> {
    let config_dir = config_dir().context("Failed to retrieve configuration directory")?;
    Ok(config_dir.join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.start_service, Service::Gemini);
        assert!(config.show_on_launch);
        assert!(!config.require_global_hotkey);
        assert_eq!(
            config.home_url(Service::Claude),
            Service::Claude.default_home_url()
        );
    }

    #[test]
    fn test_default_config_serializes_empty() {
        let serialized = toml::to_string_pretty(&Config::default()).unwrap();
        assert!(serialized.trim().is_empty());
    }

    #[test]
    fn test_config_manager_save_load() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());
        assert_eq!(manager.load().unwrap(), Config::default());

        let config = Config {
            start_service: Service::Claude,
            claude_url: Some("https://claude.ai/new".to_string()),
            show_on_launch: false,
            ..Default::default()
        };
        manager.save(&config).unwrap();

        let loaded = manager.load().unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.home_url(Service::Claude), "https://claude.ai/new");
        assert_eq!(loaded.home_url(Service::Gemini), Service::Gemini.default_home_url());
    }

    #[test]
    fn test_invalid_config_is_an_error() {
        let temp = tempdir().expect("Failed to create temp dir");
        let manager = ConfigManager::with_config_dir(temp.path());
        fs::write(manager.config_path(), "start_service = \"bard\"").unwrap();
        assert!(manager.load().is_err());
    }
}
