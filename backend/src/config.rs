//! # Service configuration
//!
//! Resolved once at startup. A YAML file supplies the settings, environment
//! variables override the data directory and the bind address, and anything
//! missing falls back to the defaults below.
//!
//! Lookup order for the file: `REMINDERS_CONFIG`, then `config.yaml` in the
//! data directory, then built-in defaults.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::info;

pub const CONFIG_ENV: &str = "REMINDERS_CONFIG";
pub const DATA_DIR_ENV: &str = "REMINDERS_DATA_DIR";
pub const BIND_ENV: &str = "REMINDERS_BIND";
pub const CONFIG_FILE_NAME: &str = "config.yaml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub data_directory: PathBuf,
    pub bind_address: String,
    /// Origin allowed by CORS
    pub allowed_origin: String,
    /// Widest window an occurrence query may request
    pub max_window_days: u32,
    /// How far back due dispatch looks and how far ahead `upcoming` looks
    pub due_horizon_hours: u32,
    /// Interval of the server's due poller; 0 disables it
    pub due_poll_seconds: u64,
    /// Default tracing filter when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            bind_address: "127.0.0.1:3000".to_string(),
            allowed_origin: "http://localhost:8080".to_string(),
            max_window_days: 62,
            due_horizon_hours: 24,
            due_poll_seconds: 60,
            log_level: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    /// Resolve configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::load_with(|key| std::env::var(key).ok())
    }

    /// Resolve configuration using `env` for variable lookups
    pub fn load_with<F>(env: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_dir_override = env(DATA_DIR_ENV).map(PathBuf::from);

        let config_path = match env(CONFIG_ENV) {
            Some(path) => Some(PathBuf::from(path)),
            None => {
                let directory = data_dir_override.clone().unwrap_or_else(default_data_directory);
                let candidate = directory.join(CONFIG_FILE_NAME);
                candidate.exists().then_some(candidate)
            }
        };

        let mut config = match config_path {
            Some(path) => Self::from_file(&path)?,
            None => Self::default(),
        };

        if let Some(directory) = data_dir_override {
            config.data_directory = directory;
        }
        if let Some(bind_address) = env(BIND_ENV) {
            config.bind_address = bind_address;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: ServiceConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_window_days < 1 {
            bail!("max_window_days must be at least 1");
        }
        if self.due_horizon_hours < 1 {
            bail!("due_horizon_hours must be at least 1");
        }
        if u64::from(self.due_horizon_hours) > u64::from(self.max_window_days) * 24 {
            bail!("due_horizon_hours cannot exceed max_window_days");
        }
        self.socket_addr()?;
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr> {
        self.bind_address
            .parse()
            .with_context(|| format!("Invalid bind address '{}'", self.bind_address))
    }
}

/// `~/Documents/Caregiver Reminders`, or the home directory when there is no
/// Documents folder
pub fn default_data_directory() -> PathBuf {
    dirs::document_dir()
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
        .join("Caregiver Reminders")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_from(pairs: &[(&str, String)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_file() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().to_string_lossy().to_string();

        let config = ServiceConfig::load_with(env_from(&[(DATA_DIR_ENV, data_dir)])).unwrap();
        assert_eq!(config.data_directory, temp_dir.path());
        assert_eq!(config.bind_address, "127.0.0.1:3000");
        assert_eq!(config.max_window_days, 62);
        assert_eq!(config.due_horizon_hours, 24);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_reads_config_from_data_directory() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(
            temp_dir.path().join(CONFIG_FILE_NAME),
            "max_window_days: 14\nlog_level: debug\n",
        )
        .unwrap();

        let config = ServiceConfig::load_with(env_from(&[(
            DATA_DIR_ENV,
            temp_dir.path().to_string_lossy().to_string(),
        )]))
        .unwrap();
        assert_eq!(config.max_window_days, 14);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.due_horizon_hours, 24);
        // The env override wins over the file's (defaulted) data directory
        assert_eq!(config.data_directory, temp_dir.path());
    }

    #[test]
    fn test_explicit_config_path_and_bind_override() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("custom.yaml");
        fs::write(&path, "bind_address: 0.0.0.0:9000\nallowed_origin: http://example.test\n").unwrap();

        let config = ServiceConfig::load_with(env_from(&[
            (CONFIG_ENV, path.to_string_lossy().to_string()),
            (BIND_ENV, "127.0.0.1:4000".to_string()),
        ]))
        .unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:4000");
        assert_eq!(config.allowed_origin, "http://example.test");
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("absent.yaml");
        let result = ServiceConfig::load_with(env_from(&[(CONFIG_ENV, path.to_string_lossy().to_string())]));
        assert!(result.is_err());
    }

    #[test]
    fn test_validation() {
        let mut config = ServiceConfig::default();
        assert!(config.validate().is_ok());

        config.max_window_days = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.due_horizon_hours = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.max_window_days = 1;
        config.due_horizon_hours = 48;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.bind_address = "not an address".to_string();
        assert!(config.validate().is_err());
    }
}
