use std::fs;
use std::path::Path;
use std::time::Duration;

use parking_lot::RwLock;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;

use crate::adapters::{CpalAudioProbe, RuleSegmenter, TomlConfigStore};
use crate::domain::{
    AppConfig, AudioDevice, CaptureFormat, CaptureReport, DeviceDirection, DeviceSelector,
    ModelCatalog, ProbeError, SegmentationResult,
};
use crate::infrastructure::init_logging;
use crate::ports::{AudioProbe, ConfigStore, Segmenter};

/// Application controller that orchestrates initialization and wires the
/// probes together.
pub struct AppController {
    config: RwLock<AppConfig>,
    config_store: TomlConfigStore,
    audio: CpalAudioProbe,
    segmenter: RuleSegmenter,
    _log_guard: Option<WorkerGuard>,
}

impl AppController {
    /// Initialize the application controller.
    ///
    /// `config_override` bypasses the default config file location for one
    /// run; `log_level` overrides the configured level.
    pub fn new(
        config_override: Option<&Path>,
        log_level: Option<&str>,
    ) -> Result<Self, ProbeError> {
        // Step 1: Initialize config store
        let config_store = TomlConfigStore::new()?;

        // Step 2: Load configuration
        let config = match config_override {
            Some(path) => {
                let content = fs::read_to_string(path).map_err(|e| {
                    ProbeError::Config(format!("Cannot read {}: {}", path.display(), e))
                })?;
                toml::from_str(&content)?
            }
            None => config_store.load()?,
        };

        // Step 3: Initialize logging
        let level = log_level.unwrap_or(&config.logging.level);
        let log_guard = init_logging(
            &config_store.logs_dir(),
            level,
            config.logging.file_logging,
        )?;

        info!("VoxProbe starting up");

        let audio = CpalAudioProbe::new();
        let segmenter = RuleSegmenter::new()?;

        Ok(Self {
            config: RwLock::new(config),
            config_store,
            audio,
            segmenter,
            _log_guard: log_guard,
        })
    }

    /// Get the current configuration.
    pub fn config(&self) -> AppConfig {
        self.config.read().clone()
    }

    /// List audio devices, optionally filtered by direction.
    pub fn list_devices(
        &self,
        direction: Option<DeviceDirection>,
    ) -> Result<Vec<AudioDevice>, ProbeError> {
        self.audio.list_devices(direction)
    }

    /// The system default device for a direction, if any.
    pub fn default_device(
        &self,
        direction: DeviceDirection,
    ) -> Result<Option<AudioDevice>, ProbeError> {
        self.audio.default_device(direction)
    }

    /// The input device a selector would pick.
    pub fn resolve_device(&self, selector: &DeviceSelector) -> Result<AudioDevice, ProbeError> {
        self.audio.resolve(selector)
    }

    /// Run the capture probe.
    pub async fn capture(
        &self,
        selector: &DeviceSelector,
        format: CaptureFormat,
        duration: Duration,
    ) -> Result<CaptureReport, ProbeError> {
        self.audio.capture(selector, format, duration).await
    }

    /// Segment text with the given model, loading it first if needed.
    pub fn segment(&self, text: &str, model_id: &str) -> Result<SegmentationResult, ProbeError> {
        if self.segmenter.loaded_model().as_deref() != Some(model_id) {
            self.segmenter.load_model(model_id)?;
        }
        self.segmenter.segment(text)
    }

    /// The built-in segmentation model catalog.
    pub fn model_catalog(&self) -> &ModelCatalog {
        self.segmenter.catalog()
    }

    /// Get the data directory path.
    pub fn data_dir(&self) -> String {
        self.config_store.data_dir().to_string_lossy().to_string()
    }

    /// Get the logs directory path.
    pub fn logs_dir(&self) -> String {
        self.config_store.logs_dir().to_string_lossy().to_string()
    }

    /// Get the config file path.
    pub fn config_path(&self) -> String {
        self.config_store.config_path().to_string_lossy().to_string()
    }
}
