use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{
    AudioDevice, CaptureFormat, CaptureReport, DeviceDirection, DeviceSelector, ProbeError,
};

/// Port for audio device probing.
///
/// Implementations handle platform-specific enumeration and capture-stream
/// lifecycle, including guaranteed release of the OS stream handle.
#[async_trait]
pub trait AudioProbe: Send + Sync {
    /// List audio devices, optionally filtered by direction.
    ///
    /// Devices are indexed per direction in enumeration order; system
    /// defaults are marked.
    fn list_devices(
        &self,
        direction: Option<DeviceDirection>,
    ) -> Result<Vec<AudioDevice>, ProbeError>;

    /// The system default device for a direction, if one exists.
    fn default_device(
        &self,
        direction: DeviceDirection,
    ) -> Result<Option<AudioDevice>, ProbeError>;

    /// The input device a selector would pick, without opening it.
    fn resolve(&self, selector: &DeviceSelector) -> Result<AudioDevice, ProbeError>;

    /// Open a capture stream with the exact requested format, hold it open
    /// for `duration`, and report what the device delivered.
    ///
    /// The stream is released on every exit path, including errors and
    /// cancellation.
    async fn capture(
        &self,
        selector: &DeviceSelector,
        format: CaptureFormat,
        duration: Duration,
    ) -> Result<CaptureReport, ProbeError>;
}
