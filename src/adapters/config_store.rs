use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, ProbeError};
use crate::ports::ConfigStore;

/// TOML-based configuration store with OS-specific paths.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a new TomlConfigStore.
    /// Uses OS-specific application data directories.
    pub fn new() -> Result<Self, ProbeError> {
        let data_dir = Self::get_data_dir()?;

        // Ensure the data directory exists
        fs::create_dir_all(&data_dir)?;

        info!(data_dir = ?data_dir, "ConfigStore initialized");

        Ok(Self { data_dir })
    }

    /// Get the OS-specific application data directory.
    /// - macOS: ~/Library/Application Support/VoxProbe/
    /// - Windows: %APPDATA%\VoxProbe\
    /// - Linux: ~/.config/VoxProbe/
    fn get_data_dir() -> Result<PathBuf, ProbeError> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir()
                .map(|p| p.join("VoxProbe"))
                .ok_or_else(|| {
                    ProbeError::Config("Could not find application data directory".to_string())
                })
        }

        #[cfg(not(target_os = "macos"))]
        {
            dirs::config_dir()
                .map(|p| p.join("VoxProbe"))
                .ok_or_else(|| {
                    ProbeError::Config("Could not find application data directory".to_string())
                })
        }
    }

    /// Get the OS-specific log directory.
    /// - macOS: ~/Library/Application Support/VoxProbe/logs/
    /// - Windows: %LOCALAPPDATA%\VoxProbe\logs\
    /// - Linux: ~/.local/share/VoxProbe/logs/
    fn get_logs_dir(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            self.data_dir.join("logs")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join("VoxProbe").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        {
            dirs::data_dir()
                .map(|p| p.join("VoxProbe").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, ProbeError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)?;
            let config: AppConfig = toml::from_str(&content)?;
            info!(path = ?config_path, "Configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), ProbeError> {
        let config_path = self.config_path();

        // Ensure parent directory exists
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(config)?;
        fs::write(&config_path, content)?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn logs_dir(&self) -> PathBuf {
        self.get_logs_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::SampleEncoding;

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = tempfile::tempdir().unwrap();

        let store = TomlConfigStore {
            data_dir: temp_dir.path().to_path_buf(),
        };

        // Create and save a config
        let mut config = AppConfig::new();
        config.audio.device = "3".to_string();
        config.audio.encoding = SampleEncoding::F32;
        config.segmentation.model = "en-tiny".to_string();
        config.logging.level = "debug".to_string();

        store.save(&config).unwrap();

        // Load it back
        let loaded = store.load().unwrap();
        assert_eq!(loaded.audio.device, "3");
        assert_eq!(loaded.audio.encoding, SampleEncoding::F32);
        assert_eq!(loaded.segmentation.model, "en-tiny");
        assert_eq!(loaded.logging.level, "debug");
    }

    #[test]
    fn test_load_creates_default_when_missing() {
        let temp_dir = tempfile::tempdir().unwrap();

        let store = TomlConfigStore {
            data_dir: temp_dir.path().to_path_buf(),
        };

        let config = store.load().unwrap();
        assert_eq!(config.audio.device, "default");
        assert_eq!(config.audio.sample_rate_hz, 48_000);
        assert!(store.config_path().exists());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let temp_dir = tempfile::tempdir().unwrap();

        let store = TomlConfigStore {
            data_dir: temp_dir.path().to_path_buf(),
        };

        fs::write(store.config_path(), "[segmentation]\nmodel = \"en-tiny\"\n").unwrap();

        let config = store.load().unwrap();
        assert_eq!(config.segmentation.model, "en-tiny");
        // Untouched sections keep their defaults.
        assert_eq!(config.audio.channels, 1);
        assert_eq!(config.logging.level, "info");
    }
}
