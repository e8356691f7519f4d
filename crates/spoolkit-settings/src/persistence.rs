//! Settings persistence.
//!
//! Loads and saves the pipeline configuration from the platform config
//! directory. A missing file falls back to defaults; saving creates the
//! directory first.

use std::path::PathBuf;

use crate::config::Config;
use crate::error::{Result, SettingsError};

const CONFIG_DIR: &str = "spoolkit";
const CONFIG_FILE: &str = "config.toml";

/// Settings persistence layer.
#[derive(Debug, Clone, Default)]
pub struct SettingsPersistence {
    config: Config,
}

impl SettingsPersistence {
    /// Create a new persistence layer with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// The platform-specific config file path.
    pub fn default_path() -> Result<PathBuf> {
        let base = dirs::config_dir()
            .ok_or_else(|| SettingsError::ConfigDirectory("no config directory".to_string()))?;
        Ok(base.join(CONFIG_DIR).join(CONFIG_FILE))
    }

    /// Load from the default path, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::default_path()?;
        if !path.exists() {
            return Ok(Self::default());
        }
        Ok(Self {
            config: Config::load_from_file(&path)?,
        })
    }

    /// Save to the default path, creating the directory when needed.
    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.config.save_to_file(&path)
    }

    /// The held configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Replace the held configuration.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_roundtrips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let mut config = Config::default();
        config.ring.lock_steps = 7.5;
        config.print.nozzle_temp = 215;
        config.save_to_file(&path).unwrap();

        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.ring.lock_steps, 7.5);
        assert_eq!(loaded.print.nozzle_temp, 215);
        assert_eq!(loaded.ring.center, 117.5);
    }

    #[test]
    fn test_config_roundtrips_through_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let config = Config::default();
        config.save_to_file(&path).unwrap();
        let loaded = Config::load_from_file(&path).unwrap();
        assert_eq!(loaded.print.layer_thickness, 0.2);
    }

    #[test]
    fn test_unknown_extension_is_rejected() {
        let config = Config::default();
        assert!(config.save_to_file(std::path::Path::new("config.ini")).is_err());
    }
}
