use thiserror::Error;

/// Domain-level errors for VoxProbe.
///
/// Capture failures are split into explicit kinds (device, format,
/// permission) so callers can tell *why* a stream could not be opened;
/// `Backend` is the remainder, not the default.
#[derive(Error, Debug)]
pub enum ProbeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),

    #[error("No audio device matches selector `{selector}`")]
    DeviceNotFound { selector: String },

    #[error("Device `{device}` does not support {detail}")]
    FormatUnsupported { device: String, detail: String },

    #[error("Audio device access denied: {detail}")]
    PermissionDenied { detail: String },

    #[error("Audio backend error: {detail}")]
    Backend { detail: String },

    #[error("Unknown segmentation model: {0}")]
    ModelNotFound(String),

    #[error("Segmentation model error: {0}")]
    Model(String),
}

impl From<std::io::Error> for ProbeError {
    fn from(err: std::io::Error) -> Self {
        ProbeError::Io(err.to_string())
    }
}

impl From<toml::de::Error> for ProbeError {
    fn from(err: toml::de::Error) -> Self {
        ProbeError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for ProbeError {
    fn from(err: toml::ser::Error) -> Self {
        ProbeError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for ProbeError {
    fn from(err: serde_json::Error) -> Self {
        ProbeError::Serialization(err.to_string())
    }
}
