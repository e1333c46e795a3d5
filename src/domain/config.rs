use serde::{Deserialize, Serialize};

use crate::domain::audio::{CaptureFormat, SampleEncoding};

/// Audio probe configuration.
///
/// These replace the hardcoded device index and stream parameters of the
/// original exploratory probe; the CLI can override any of them per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Capture device selector: "default", an index, or a name substring.
    pub device: String,
    /// Requested sample rate in Hz.
    pub sample_rate_hz: u32,
    /// Requested channel count.
    pub channels: u16,
    /// Requested sample encoding.
    pub encoding: SampleEncoding,
    /// How long the capture probe holds the stream open, in milliseconds.
    pub probe_duration_ms: u64,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            device: "default".to_string(),
            sample_rate_hz: 48_000,
            channels: 1,
            encoding: SampleEncoding::I16,
            probe_duration_ms: 2_000,
        }
    }
}

impl AudioSettings {
    /// The capture format these settings describe.
    pub fn capture_format(&self) -> CaptureFormat {
        CaptureFormat {
            sample_rate_hz: self.sample_rate_hz,
            channels: self.channels,
            encoding: self.encoding,
        }
    }
}

/// Segmentation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SegmentationSettings {
    /// Selected model identifier from the built-in catalog.
    pub model: String,
}

impl Default for SegmentationSettings {
    fn default() -> Self {
        Self {
            model: "en-small".to_string(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    pub level: String,
    /// Enable file logging with rotation.
    pub file_logging: bool,
    /// Maximum number of log files to keep.
    pub max_files: u32,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            file_logging: true,
            max_files: 7,
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub audio: AudioSettings,
    pub segmentation: SegmentationSettings,
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Create a new AppConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }
}
