//! Application configuration
//!
//! Stored as TOML under `~/.config/switch-remote/config.toml`. Missing fields
//! fall back to defaults, and a missing file is created with the defaults so
//! the user has something to edit.

use crate::mapping::DispatchSettings;
use crate::transport::DeviceEndpoint;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

const CONFIG_DIR: &str = ".config/switch-remote";
const CONFIG_FILE: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to access config file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Where and how to reach the device
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DeviceConfig {
    pub host: String,
    pub port: u16,
    pub path: String,
    pub request_timeout_ms: u64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        let endpoint = DeviceEndpoint::default();
        Self {
            host: endpoint.host,
            port: endpoint.port,
            path: endpoint.path,
            request_timeout_ms: endpoint.request_timeout.as_millis() as u64,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct DispatchConfig {
    /// Press-to-release delay for momentary buttons
    pub hold_duration_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            hold_duration_ms: DispatchSettings::default().hold_duration.as_millis() as u64,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
#[serde(default)]
pub struct SessionConfig {
    /// Send the rest state once before accepting commands
    pub check_connection: bool,
    /// Send the rest state when input ends without `quit`
    pub release_on_exit: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            check_connection: true,
            release_on_exit: true,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    pub device: DeviceConfig,
    pub dispatch: DispatchConfig,
    pub session: SessionConfig,
}

impl AppConfig {
    pub fn default_path() -> PathBuf {
        let mut path = get_home_dir();
        path.push(CONFIG_DIR);
        path.push(CONFIG_FILE);
        path
    }

    pub async fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let config: AppConfig = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub async fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConfigError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        let content = toml::to_string_pretty(self)?;
        tokio::fs::write(path, content)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        info!("Wrote config to {}", path.display());
        Ok(())
    }

    /// Loads `path`, writing the default config there first if it is missing
    pub async fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        let exists = tokio::fs::try_exists(path)
            .await
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if !exists {
            info!("No config at {}, creating default", path.display());
            let config = AppConfig::default();
            config.save(path).await?;
            return Ok(config);
        }
        Self::load(path).await
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.device.host.trim().is_empty() {
            return Err(ConfigError::Invalid("device.host must not be empty".into()));
        }
        if self.device.port == 0 {
            return Err(ConfigError::Invalid("device.port must not be 0".into()));
        }
        if self.device.request_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "device.request_timeout_ms must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn endpoint(&self) -> DeviceEndpoint {
        DeviceEndpoint::new(self.device.host.clone(), self.device.port)
            .with_path(self.device.path.clone())
            .with_timeout(Duration::from_millis(self.device.request_timeout_ms))
    }

    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings {
            hold_duration: Duration::from_millis(self.dispatch.hold_duration_ms),
        }
    }
}

fn get_home_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_else(|| {
        warn!("Could not determine home directory, using current directory");
        PathBuf::from(".")
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn missing_file_is_created_with_defaults() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join("nested").join(CONFIG_FILE);

        let config = AppConfig::load_or_create(&path).await?;

        assert_eq!(config, AppConfig::default());
        assert!(path.exists());
        assert_eq!(AppConfig::load(&path).await?, config);
        Ok(())
    }

    #[tokio::test]
    async fn partial_file_keeps_defaults_for_missing_fields(
    ) -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(
            &path,
            "[device]\nhost = \"10.0.0.42\"\n\n[dispatch]\nhold_duration_ms = 300\n",
        )
        .await?;

        let config = AppConfig::load(&path).await?;

        assert_eq!(config.device.host, "10.0.0.42");
        assert_eq!(config.device.port, 80);
        assert_eq!(config.device.path, "/controller");
        assert_eq!(config.dispatch_settings().hold_duration, Duration::from_millis(300));
        assert!(config.session.check_connection);
        assert_eq!(config.endpoint().url(), "http://10.0.0.42/controller");
        Ok(())
    }

    #[tokio::test]
    async fn malformed_file_is_a_parse_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = TempDir::new()?;
        let path = dir.path().join(CONFIG_FILE);
        tokio::fs::write(&path, "[device\nhost = ").await?;

        let result = AppConfig::load(&path).await;

        assert!(matches!(result, Err(ConfigError::Parse { .. })));
        Ok(())
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut config = AppConfig::default();
        config.device.port = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = AppConfig::default();
        config.device.host = "  ".into();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn defaults_match_device_and_dispatch_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.endpoint(), DeviceEndpoint::default());
        assert_eq!(config.dispatch_settings(), DispatchSettings::default());
    }

    #[test]
    fn default_path_lives_under_config_dir() {
        let path = AppConfig::default_path();
        assert!(path.ends_with(".config/switch-remote/config.toml"));
    }
}
