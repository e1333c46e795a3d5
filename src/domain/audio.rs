use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::error::ProbeError;

/// Whether a device records or plays audio.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceDirection {
    Input,
    Output,
}

impl fmt::Display for DeviceDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceDirection::Input => write!(f, "input"),
            DeviceDirection::Output => write!(f, "output"),
        }
    }
}

/// Descriptor for one enumerated audio device.
///
/// `index` is the position within the direction's enumeration order and is
/// only stable for the duration of one process run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioDevice {
    pub index: usize,
    /// Human-readable device name, never empty.
    pub name: String,
    pub direction: DeviceDirection,
    /// Whether this is the system default device for its direction.
    pub is_default: bool,
}

/// User-facing choice of capture device.
///
/// Parsed from a config value or CLI flag: `default` (or an empty string)
/// selects the system default, a decimal integer selects by enumeration
/// index, anything else matches case-insensitively on a name substring.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeviceSelector {
    Default,
    Index(usize),
    Name(String),
}

impl DeviceSelector {
    /// Check whether a device descriptor satisfies this selector.
    pub fn matches(&self, device: &AudioDevice) -> bool {
        match self {
            DeviceSelector::Default => device.is_default,
            DeviceSelector::Index(index) => device.index == *index,
            DeviceSelector::Name(name) => {
                device.name.to_lowercase().contains(&name.to_lowercase())
            }
        }
    }
}

impl FromStr for DeviceSelector {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("default") {
            Ok(DeviceSelector::Default)
        } else if let Ok(index) = trimmed.parse::<usize>() {
            Ok(DeviceSelector::Index(index))
        } else {
            Ok(DeviceSelector::Name(trimmed.to_string()))
        }
    }
}

impl fmt::Display for DeviceSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeviceSelector::Default => write!(f, "default"),
            DeviceSelector::Index(index) => write!(f, "{}", index),
            DeviceSelector::Name(name) => write!(f, "{}", name),
        }
    }
}

/// On-the-wire sample representation requested from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleEncoding {
    I16,
    F32,
}

impl FromStr for SampleEncoding {
    type Err = ProbeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "i16" => Ok(SampleEncoding::I16),
            "f32" => Ok(SampleEncoding::F32),
            other => Err(ProbeError::Config(format!(
                "Unknown sample encoding: {} (expected i16 or f32)",
                other
            ))),
        }
    }
}

impl fmt::Display for SampleEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleEncoding::I16 => write!(f, "i16"),
            SampleEncoding::F32 => write!(f, "f32"),
        }
    }
}

/// Exact capture format requested when opening a stream.
///
/// The probe asks the device for precisely this format; a device that
/// cannot deliver it is reported as `FormatUnsupported` rather than
/// silently negotiated down.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaptureFormat {
    pub sample_rate_hz: u32,
    pub channels: u16,
    pub encoding: SampleEncoding,
}

impl Default for CaptureFormat {
    fn default() -> Self {
        Self {
            sample_rate_hz: 48_000,
            channels: 1,
            encoding: SampleEncoding::I16,
        }
    }
}

impl CaptureFormat {
    /// Reject formats no device could ever satisfy, before any device IO.
    pub fn validate(&self) -> Result<(), ProbeError> {
        if self.sample_rate_hz == 0 {
            return Err(ProbeError::Config(
                "Sample rate must be greater than zero".to_string(),
            ));
        }
        if self.channels == 0 {
            return Err(ProbeError::Config(
                "Channel count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

impl fmt::Display for CaptureFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}ch/{}Hz",
            self.encoding, self.channels, self.sample_rate_hz
        )
    }
}

/// Outcome of one capture probe run.
#[derive(Debug, Clone, Serialize)]
pub struct CaptureReport {
    pub device_name: String,
    pub format: CaptureFormat,
    /// How long the stream was held open, in milliseconds.
    pub requested_ms: u64,
    /// Interleaved samples delivered by the device while the stream was open.
    pub captured_samples: usize,
    /// Peak absolute level, normalized to 0.0-1.0.
    pub peak: f32,
    /// RMS level, normalized to 0.0-1.0.
    pub rms: f32,
}

impl CaptureReport {
    /// Seconds of audio actually delivered by the device.
    pub fn captured_secs(&self) -> f32 {
        let samples_per_sec = self.format.sample_rate_hz as f32 * self.format.channels as f32;
        if samples_per_sec == 0.0 {
            return 0.0;
        }
        self.captured_samples as f32 / samples_per_sec
    }
}
