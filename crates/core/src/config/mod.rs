//! Configuration for the negotiation channel
//!
//! This module provides the frontend-side settings of a [`crate::Channel`]:
//! - Type-safe config struct via serde
//! - TOML file format
//! - Auto-generation of a default config file
//! - Manual reload capability
//!
//! # Example
//!
//! ```ignore
//! use retrovars_core::{Channel, ChannelConfig};
//!
//! let config = ChannelConfig::load("frontend.toml").unwrap_or_default();
//! let channel = Channel::with_config(config);
//! ```
//!
//! A config with presets:
//!
//! ```toml
//! version = 1
//! debug = false
//! notify_on_accept = true
//! event_capacity = 256
//!
//! [presets]
//! gb_colorize = true
//! gb_palette = "Green"
//! video_size = [320, 288]
//! ```

mod preset;

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

pub use preset::PresetValue;

/// Configuration system errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read or write config file
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to parse TOML content
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Failed to serialize config to TOML
    #[error("Failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),
}

/// Result type for config operations
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Channel configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelConfig {
    /// Config version for future migration support
    pub version: u32,

    /// Trace every query
    pub debug: bool,

    /// Notify the core when a preset seeds a newly declared variable
    pub notify_on_accept: bool,

    /// Capacity of each event subscriber's queue
    pub event_capacity: usize,

    /// Host-supplied values keyed by variable name
    pub presets: BTreeMap<String, PresetValue>,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            version: 1,
            debug: false,
            notify_on_accept: true,
            event_capacity: 256,
            presets: BTreeMap::new(),
        }
    }
}

impl ChannelConfig {
    /// Parse a config from TOML text
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load config from file, creating default if missing.
    pub fn load(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml_str(&content)?;
            tracing::debug!("Loaded channel config from {:?}", path);
            Ok(config)
        } else {
            let default = Self::default();
            default.save(path)?;
            tracing::info!("Created default channel config at {:?}", path);
            Ok(default)
        }
    }

    /// Save config to file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save(&self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved channel config to {:?}", path);
        Ok(())
    }

    /// Reload config from file.
    pub fn reload(&mut self, path: impl AsRef<Path>) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        *self = Self::from_toml_str(&content)?;
        tracing::debug!("Reloaded channel config from {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_config_default() {
        let config = ChannelConfig::default();
        assert_eq!(config.version, 1);
        assert!(!config.debug);
        assert!(config.notify_on_accept);
        assert_eq!(config.event_capacity, 256);
        assert!(config.presets.is_empty());
    }

    #[test]
    fn test_channel_config_parse_presets() {
        let config = ChannelConfig::from_toml_str(
            r#"
            debug = true

            [presets]
            gb_colorize = true
            gb_palette = "Green"
            frameskip = 3
            gamma = 1.5
            video_size = [320, 288]
            "#,
        )
        .unwrap();

        assert!(config.debug);
        assert_eq!(config.version, 1);
        assert_eq!(config.presets["gb_colorize"], PresetValue::Bool(true));
        assert_eq!(config.presets["gb_palette"], PresetValue::Text("Green".to_string()));
        assert_eq!(config.presets["frameskip"], PresetValue::Integer(3));
        assert_eq!(config.presets["gamma"], PresetValue::Float(1.5));
        assert_eq!(config.presets["video_size"], PresetValue::Pair([320, 288]));
    }

    #[test]
    fn test_channel_config_serialize() {
        let config = ChannelConfig {
            version: 2,
            debug: true,
            ..ChannelConfig::default()
        };

        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("version = 2"));
        assert!(toml_str.contains("debug = true"));
    }

    #[test]
    fn test_channel_config_load_creates_default() {
        let dir = std::env::temp_dir().join(format!("retrovars-config-{}", std::process::id()));
        let path = dir.join("channel.toml");
        let _ = std::fs::remove_file(&path);

        let config = ChannelConfig::load(&path).unwrap();
        assert_eq!(config, ChannelConfig::default());
        assert!(path.exists());

        let mut edited = config.clone();
        edited.event_capacity = 8;
        edited.save(&path).unwrap();

        let mut reloaded = ChannelConfig::default();
        reloaded.reload(&path).unwrap();
        assert_eq!(reloaded.event_capacity, 8);

        let _ = std::fs::remove_dir_all(&dir);
    }
}
