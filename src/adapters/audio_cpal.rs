use std::thread;
use std::time::Duration;

use async_trait::async_trait;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{
    BuildStreamError, Device, DevicesError, PlayStreamError, SampleFormat, StreamConfig,
    SupportedStreamConfigsError,
};
use ringbuf::traits::{Consumer, Observer, Producer, Split};
use ringbuf::HeapRb;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use crate::domain::{
    AudioDevice, CaptureFormat, CaptureReport, DeviceDirection, DeviceSelector, ProbeError,
    SampleEncoding,
};
use crate::ports::AudioProbe;

/// Lock-free ring buffer for captured samples.
type RingProducer = ringbuf::HeapProd<i16>;

/// Placeholder when the backend cannot report a device name.
const UNNAMED_DEVICE: &str = "(unnamed)";

/// Extra ring capacity beyond the requested duration, in milliseconds.
const RING_SLACK_MS: u64 = 500;

/// Backend error descriptions that indicate an OS-level access failure.
const PERMISSION_MARKERS: &[&str] = &[
    "permission",
    "denied",
    "not permitted",
    "unauthorized",
    "access",
];

mod classify {
    use super::*;

    /// Route a backend-specific error description into the taxonomy.
    pub fn backend_detail(detail: String) -> ProbeError {
        let lowered = detail.to_lowercase();
        if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
            ProbeError::PermissionDenied { detail }
        } else {
            ProbeError::Backend { detail }
        }
    }

    pub fn devices_error(err: DevicesError) -> ProbeError {
        match err {
            DevicesError::BackendSpecific { err } => backend_detail(err.description),
        }
    }

    pub fn supported_configs_error(err: SupportedStreamConfigsError, device: &str) -> ProbeError {
        match err {
            SupportedStreamConfigsError::DeviceNotAvailable => ProbeError::DeviceNotFound {
                selector: device.to_string(),
            },
            SupportedStreamConfigsError::InvalidArgument => ProbeError::Backend {
                detail: format!("Invalid argument while querying configs for `{}`", device),
            },
            SupportedStreamConfigsError::BackendSpecific { err } => {
                backend_detail(err.description)
            }
        }
    }

    pub fn build_error(err: BuildStreamError, device: &str, format: &CaptureFormat) -> ProbeError {
        match err {
            BuildStreamError::DeviceNotAvailable => ProbeError::DeviceNotFound {
                selector: device.to_string(),
            },
            BuildStreamError::StreamConfigNotSupported | BuildStreamError::InvalidArgument => {
                ProbeError::FormatUnsupported {
                    device: device.to_string(),
                    detail: format.to_string(),
                }
            }
            BuildStreamError::BackendSpecific { err } => backend_detail(err.description),
            other => ProbeError::Backend {
                detail: other.to_string(),
            },
        }
    }

    pub fn play_error(err: PlayStreamError, device: &str) -> ProbeError {
        match err {
            PlayStreamError::DeviceNotAvailable => ProbeError::DeviceNotFound {
                selector: device.to_string(),
            },
            PlayStreamError::BackendSpecific { err } => backend_detail(err.description),
        }
    }
}

/// Capture-side audio processing.
mod probe {
    use super::*;

    /// Assemble the descriptor for the device at `index`.
    ///
    /// Devices whose names the backend cannot report keep their slot under
    /// a placeholder name so indices stay stable.
    pub fn descriptor(
        index: usize,
        name: Option<String>,
        default_name: Option<&str>,
        direction: DeviceDirection,
    ) -> AudioDevice {
        let name = name.unwrap_or_else(|| UNNAMED_DEVICE.to_string());
        AudioDevice {
            index,
            is_default: Some(name.as_str()) == default_name,
            name,
            direction,
        }
    }

    /// Enumerate one direction into device descriptors, indexed in
    /// enumeration order.
    pub fn describe_devices(direction: DeviceDirection) -> Result<Vec<AudioDevice>, ProbeError> {
        let host = cpal::default_host();
        let (devices, default_name) = match direction {
            DeviceDirection::Input => (
                host.input_devices().map_err(classify::devices_error)?,
                host.default_input_device().and_then(|d| d.name().ok()),
            ),
            DeviceDirection::Output => (
                host.output_devices().map_err(classify::devices_error)?,
                host.default_output_device().and_then(|d| d.name().ok()),
            ),
        };

        let result: Vec<AudioDevice> = devices
            .enumerate()
            .map(|(index, device)| {
                descriptor(index, device.name().ok(), default_name.as_deref(), direction)
            })
            .collect();

        debug!(count = result.len(), %direction, "Enumerated devices");
        Ok(result)
    }

    /// Resolve a selector to a concrete input device and its descriptor.
    pub fn resolve_input(
        selector: &DeviceSelector,
    ) -> Result<(Device, AudioDevice), ProbeError> {
        let host = cpal::default_host();
        let default_name = host.default_input_device().and_then(|d| d.name().ok());

        let devices = host.input_devices().map_err(classify::devices_error)?;

        for (index, device) in devices.enumerate() {
            let candidate = descriptor(
                index,
                device.name().ok(),
                default_name.as_deref(),
                DeviceDirection::Input,
            );
            if selector.matches(&candidate) {
                return Ok((device, candidate));
            }
        }

        // A Default selector with no default marked (nameless default device)
        // still resolves through the host's own notion of default.
        if *selector == DeviceSelector::Default {
            if let Some(device) = host.default_input_device() {
                let name = device.name().unwrap_or_else(|_| UNNAMED_DEVICE.to_string());
                return Ok((
                    device,
                    AudioDevice {
                        index: 0,
                        name,
                        direction: DeviceDirection::Input,
                        is_default: true,
                    },
                ));
            }
        }

        Err(ProbeError::DeviceNotFound {
            selector: selector.to_string(),
        })
    }

    /// Verify the requested format against the device's advertised ranges,
    /// so unsupported formats fail precisely before the stream is built.
    pub fn ensure_format_supported(
        device: &Device,
        device_name: &str,
        format: &CaptureFormat,
    ) -> Result<(), ProbeError> {
        let wanted = match format.encoding {
            SampleEncoding::I16 => SampleFormat::I16,
            SampleEncoding::F32 => SampleFormat::F32,
        };

        let ranges = device
            .supported_input_configs()
            .map_err(|e| classify::supported_configs_error(e, device_name))?;

        for range in ranges {
            if range.sample_format() == wanted
                && range.channels() == format.channels
                && range.min_sample_rate().0 <= format.sample_rate_hz
                && format.sample_rate_hz <= range.max_sample_rate().0
            {
                return Ok(());
            }
        }

        Err(ProbeError::FormatUnsupported {
            device: device_name.to_string(),
            detail: format.to_string(),
        })
    }

    /// Build the capture stream for the exact requested format.
    pub fn build_capture_stream(
        device: &Device,
        device_name: &str,
        format: &CaptureFormat,
        mut producer: RingProducer,
    ) -> Result<cpal::Stream, ProbeError> {
        let config = StreamConfig {
            channels: format.channels,
            sample_rate: cpal::SampleRate(format.sample_rate_hz),
            buffer_size: cpal::BufferSize::Default,
        };

        let err_device = device_name.to_string();
        let err_fn = move |err| {
            warn!(device = %err_device, ?err, "Capture stream error");
        };

        let stream = match format.encoding {
            SampleEncoding::I16 => device.build_input_stream(
                &config,
                move |data: &[i16], _: &cpal::InputCallbackInfo| {
                    // Overflow drops the newest samples; the probe reports
                    // what actually fit.
                    let _ = producer.push_slice(data);
                },
                err_fn,
                None,
            ),
            SampleEncoding::F32 => device.build_input_stream(
                &config,
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let converted: Vec<i16> = data
                        .iter()
                        .map(|&s| (s.clamp(-1.0, 1.0) * 32767.0) as i16)
                        .collect();
                    let _ = producer.push_slice(&converted);
                },
                err_fn,
                None,
            ),
        }
        .map_err(|e| classify::build_error(e, device_name, format))?;

        Ok(stream)
    }

    pub fn calculate_rms(samples: &[i16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }
        let sum_squares: f64 = samples.iter().map(|&s| (s as f64).powi(2)).sum();
        let rms = (sum_squares / samples.len() as f64).sqrt();
        (rms / 32767.0).min(1.0) as f32
    }

    pub fn calculate_peak(samples: &[i16]) -> f32 {
        let peak = samples
            .iter()
            .map(|&s| (s as i32).abs())
            .max()
            .unwrap_or(0);
        (peak as f32 / 32767.0).min(1.0)
    }
}

/// cpal-based audio probe.
///
/// Capture streams are opened on a dedicated thread because cpal streams
/// are not `Send`; the thread owns the stream and drops it on every exit
/// path, so an opened OS handle can never outlive the probe call.
pub struct CpalAudioProbe;

impl CpalAudioProbe {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CpalAudioProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AudioProbe for CpalAudioProbe {
    fn list_devices(
        &self,
        direction: Option<DeviceDirection>,
    ) -> Result<Vec<AudioDevice>, ProbeError> {
        let mut devices = Vec::new();
        let directions = match direction {
            Some(d) => vec![d],
            None => vec![DeviceDirection::Input, DeviceDirection::Output],
        };
        for direction in directions {
            devices.extend(probe::describe_devices(direction)?);
        }
        Ok(devices)
    }

    fn default_device(
        &self,
        direction: DeviceDirection,
    ) -> Result<Option<AudioDevice>, ProbeError> {
        Ok(probe::describe_devices(direction)?
            .into_iter()
            .find(|d| d.is_default))
    }

    fn resolve(&self, selector: &DeviceSelector) -> Result<AudioDevice, ProbeError> {
        probe::resolve_input(selector).map(|(_, descriptor)| descriptor)
    }

    async fn capture(
        &self,
        selector: &DeviceSelector,
        format: CaptureFormat,
        duration: Duration,
    ) -> Result<CaptureReport, ProbeError> {
        format.validate()?;

        let samples_per_ms =
            (format.sample_rate_hz as u64 * format.channels as u64).div_ceil(1_000);
        let capacity = (samples_per_ms * (duration.as_millis() as u64 + RING_SLACK_MS)) as usize;
        let ring = HeapRb::<i16>::new(capacity.max(1));
        let (producer, mut consumer) = ring.split();

        let (ready_tx, ready_rx) = oneshot::channel::<Result<AudioDevice, ProbeError>>();
        let (stop_tx, stop_rx) = oneshot::channel::<()>();
        let (done_tx, done_rx) = oneshot::channel::<Vec<i16>>();

        // Devices and streams are resolved and owned on a dedicated thread;
        // cpal streams are not Send.
        let thread_selector = selector.clone();
        let handle = thread::Builder::new()
            .name("audio-probe".to_string())
            .spawn(move || {
                let opened = (|| -> Result<(cpal::Stream, AudioDevice), ProbeError> {
                    let (device, descriptor) = probe::resolve_input(&thread_selector)?;
                    probe::ensure_format_supported(&device, &descriptor.name, &format)?;
                    let stream =
                        probe::build_capture_stream(&device, &descriptor.name, &format, producer)?;
                    stream
                        .play()
                        .map_err(|e| classify::play_error(e, &descriptor.name))?;
                    Ok((stream, descriptor))
                })();

                let (stream, descriptor) = match opened {
                    Ok(opened) => opened,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                let _ = ready_tx.send(Ok(descriptor));

                // Wait until the controlling side asks to stop; a dropped
                // sender (cancellation) unblocks the same way.
                let _ = stop_rx.blocking_recv();
                drop(stream);

                let available = consumer.occupied_len();
                let mut samples = vec![0i16; available];
                let read = consumer.pop_slice(&mut samples);
                samples.truncate(read);
                let _ = done_tx.send(samples);
            })
            .map_err(|e| ProbeError::Backend {
                detail: format!("Failed to spawn audio thread: {}", e),
            })?;

        let ready = ready_rx.await.unwrap_or_else(|_| {
            Err(ProbeError::Backend {
                detail: "Audio thread exited before the stream opened".to_string(),
            })
        });
        let descriptor = match ready {
            Ok(descriptor) => descriptor,
            Err(e) => {
                let _ = handle.join();
                return Err(e);
            }
        };

        info!(
            device = %descriptor.name,
            format = %format,
            duration_ms = duration.as_millis() as u64,
            "Capture stream opened"
        );

        tokio::time::sleep(duration).await;
        let _ = stop_tx.send(());

        let samples = done_rx.await.map_err(|_| ProbeError::Backend {
            detail: "Audio thread exited before draining samples".to_string(),
        })?;
        let _ = handle.join();

        let rms = probe::calculate_rms(&samples);
        let peak = probe::calculate_peak(&samples);

        info!(
            samples = samples.len(),
            rms,
            peak,
            "Capture probe complete"
        );

        Ok(CaptureReport {
            device_name: descriptor.name,
            format,
            requested_ms: duration.as_millis() as u64,
            captured_samples: samples.len(),
            peak,
            rms,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cpal::BackendSpecificError;

    #[test]
    fn test_descriptor_indexing_and_naming() {
        let names = [Some("Mic A".to_string()), None, Some("Mic B".to_string())];
        let devices: Vec<_> = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| probe::descriptor(i, name, Some("Mic B"), DeviceDirection::Input))
            .collect();

        for (i, device) in devices.iter().enumerate() {
            assert_eq!(device.index, i);
            assert!(!device.name.is_empty());
        }
        assert_eq!(devices[1].name, "(unnamed)");
        assert!(!devices[0].is_default);
        assert!(devices[2].is_default);
    }

    #[test]
    fn test_calculate_rms() {
        assert_eq!(probe::calculate_rms(&[]), 0.0);
        assert_eq!(probe::calculate_rms(&[0, 0, 0]), 0.0);

        let max_rms = probe::calculate_rms(&[32767, 32767, 32767]);
        assert!((max_rms - 1.0).abs() < 0.001);

        let half_rms = probe::calculate_rms(&[16384, -16384, 16384, -16384]);
        assert!(half_rms > 0.4 && half_rms < 0.6);
    }

    #[test]
    fn test_calculate_peak() {
        assert_eq!(probe::calculate_peak(&[]), 0.0);
        assert!((probe::calculate_peak(&[100, -32768, 200]) - 1.0).abs() < 0.001);
        let half = probe::calculate_peak(&[0, 16384, -12000]);
        assert!(half > 0.49 && half < 0.51);
    }

    #[test]
    fn test_classify_permission_markers() {
        let err = classify::backend_detail("Operation not permitted by the OS".to_string());
        assert!(matches!(err, ProbeError::PermissionDenied { .. }));

        let err = classify::backend_detail("ALSA function call failed".to_string());
        assert!(matches!(err, ProbeError::Backend { .. }));
    }

    #[test]
    fn test_classify_build_error_device_not_available() {
        let err = classify::build_error(
            BuildStreamError::DeviceNotAvailable,
            "Mic",
            &CaptureFormat::default(),
        );
        assert!(matches!(err, ProbeError::DeviceNotFound { .. }));
    }

    #[test]
    fn test_classify_build_error_format() {
        let err = classify::build_error(
            BuildStreamError::StreamConfigNotSupported,
            "Mic",
            &CaptureFormat::default(),
        );
        match err {
            ProbeError::FormatUnsupported { device, detail } => {
                assert_eq!(device, "Mic");
                assert!(detail.contains("48000"));
            }
            other => panic!("expected FormatUnsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_build_error_backend_permission() {
        let err = classify::build_error(
            BuildStreamError::BackendSpecific {
                err: BackendSpecificError {
                    description: "Access denied by privacy settings".to_string(),
                },
            },
            "Mic",
            &CaptureFormat::default(),
        );
        assert!(matches!(err, ProbeError::PermissionDenied { .. }));
    }

    #[test]
    fn test_classify_play_error() {
        let err = classify::play_error(PlayStreamError::DeviceNotAvailable, "Mic");
        assert!(matches!(err, ProbeError::DeviceNotFound { .. }));
    }
}
