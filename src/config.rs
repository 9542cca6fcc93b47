//! TOML-backed configuration: which device to bridge, where to publish and
//! whether to keep a data collection log. A default config is written on
//! first run.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

use crate::device::mapping::DeviceSpec;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this system")]
    NoConfigDir,

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Where and how often snapshots leave the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishConfig {
    pub url: String,
    /// Minimum seconds between two sends; snapshots inside the window are
    /// dropped.
    pub window_secs: f64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            url: "ws://127.0.0.1:8765".to_string(),
            window_secs: 1.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub device: DeviceSpec,
    pub publish: PublishConfig,
    /// Append-only data log; disabled when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub datalog_path: Option<PathBuf>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: DeviceSpec::spacemouse_wireless(),
            publish: PublishConfig::default(),
            datalog_path: None,
        }
    }
}

impl BridgeConfig {
    pub fn config_path() -> Result<PathBuf, ConfigError> {
        let base = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(base.join("spacebridge").join("config.toml"))
    }

    /// Loads the config file, writing the defaults first if none exists yet.
    pub fn load_or_create() -> Result<Self, ConfigError> {
        let path = Self::config_path()?;

        if path.exists() {
            info!("Loading config from {}", path.display());
            let raw = fs::read_to_string(&path)?;
            Ok(toml::from_str(&raw)?)
        } else {
            info!("No config found, writing defaults to {}", path.display());
            let config = Self::default();
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&path, toml::to_string_pretty(&config)?)?;
            Ok(config)
        }
    }
}
