pub mod audio;
pub mod config;
pub mod error;
pub mod model;
pub mod segmentation;

pub use audio::{
    AudioDevice, CaptureFormat, CaptureReport, DeviceDirection, DeviceSelector, SampleEncoding,
};
pub use config::AppConfig;
pub use error::ProbeError;
pub use model::{ModelCatalog, ModelProfile};
pub use segmentation::{SegmentationResult, SentenceSpan};
