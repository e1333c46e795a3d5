use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use crate::app::AppController;
use crate::domain::{
    AudioDevice, CaptureFormat, CaptureReport, DeviceDirection, DeviceSelector, SampleEncoding,
    SegmentationResult,
};

/// Probe audio capture devices and sentence segmentation models.
#[derive(Parser, Debug)]
#[command(name = "voxprobe", version, about, long_about = None)]
pub struct Cli {
    /// Use an alternate configuration file for this run.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the configured log level.
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List audio devices known to the host.
    Devices {
        /// Which direction to list.
        #[arg(long, value_enum, default_value_t = DirectionFilter::All)]
        direction: DirectionFilter,

        /// Emit the device list as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Open a capture stream on an input device and report what it delivers.
    Capture {
        /// Device selector: "default", an index, or a name substring.
        #[arg(short, long)]
        device: Option<DeviceSelector>,

        /// Requested sample rate in Hz.
        #[arg(long)]
        rate: Option<u32>,

        /// Requested channel count.
        #[arg(long)]
        channels: Option<u16>,

        /// Requested sample encoding (i16 or f32).
        #[arg(long)]
        encoding: Option<SampleEncoding>,

        /// How long to hold the stream open, in milliseconds.
        #[arg(long, value_name = "MS")]
        duration_ms: Option<u64>,
    },

    /// Split text into sentences with a segmentation model.
    Segment {
        /// Text to segment; read from stdin when omitted.
        text: Option<String>,

        /// Model identifier from the catalog.
        #[arg(short, long)]
        model: Option<String>,

        /// Emit spans and sentences as JSON.
        #[arg(long)]
        json: bool,
    },

    /// List the built-in segmentation model catalog.
    Models,

    /// Show the effective configuration and paths.
    Config,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectionFilter {
    Input,
    Output,
    All,
}

impl DirectionFilter {
    fn as_direction(self) -> Option<DeviceDirection> {
        match self {
            DirectionFilter::Input => Some(DeviceDirection::Input),
            DirectionFilter::Output => Some(DeviceDirection::Output),
            DirectionFilter::All => None,
        }
    }
}

/// Run one CLI invocation to completion.
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let controller = AppController::new(cli.config.as_deref(), cli.log_level.as_deref())?;

    match cli.command {
        Command::Devices { direction, json } => cmd_devices(&controller, direction, json),
        Command::Capture {
            device,
            rate,
            channels,
            encoding,
            duration_ms,
        } => cmd_capture(&controller, device, rate, channels, encoding, duration_ms).await,
        Command::Segment { text, model, json } => cmd_segment(&controller, text, model, json),
        Command::Models => cmd_models(&controller),
        Command::Config => cmd_config(&controller),
    }
}

fn cmd_devices(
    controller: &AppController,
    direction: DirectionFilter,
    json: bool,
) -> anyhow::Result<()> {
    let devices = controller.list_devices(direction.as_direction())?;

    if json {
        println!("{}", serde_json::to_string_pretty(&devices)?);
        return Ok(());
    }

    if devices.is_empty() {
        println!("No audio devices found");
        return Ok(());
    }

    for direction in [DeviceDirection::Input, DeviceDirection::Output] {
        let group: Vec<&AudioDevice> = devices
            .iter()
            .filter(|d| d.direction == direction)
            .collect();
        if group.is_empty() {
            continue;
        }
        println!("{} devices:", capitalize(&direction.to_string()));
        for device in group {
            let marker = if device.is_default { " (default)" } else { "" };
            println!("  {}: {}{}", device.index, device.name, marker);
        }
    }

    if direction == DirectionFilter::All {
        println!();
        for direction in [DeviceDirection::Input, DeviceDirection::Output] {
            let name = controller
                .default_device(direction)?
                .map(|d| d.name)
                .unwrap_or_else(|| "none".to_string());
            println!("default {}: {}", direction, name);
        }
    }

    Ok(())
}

async fn cmd_capture(
    controller: &AppController,
    device: Option<DeviceSelector>,
    rate: Option<u32>,
    channels: Option<u16>,
    encoding: Option<SampleEncoding>,
    duration_ms: Option<u64>,
) -> anyhow::Result<()> {
    let config = controller.config();

    let selector = device.unwrap_or_else(|| {
        config
            .audio
            .device
            .parse()
            .unwrap_or(DeviceSelector::Default)
    });
    let format = CaptureFormat {
        sample_rate_hz: rate.unwrap_or(config.audio.sample_rate_hz),
        channels: channels.unwrap_or(config.audio.channels),
        encoding: encoding.unwrap_or(config.audio.encoding),
    };
    let duration = Duration::from_millis(duration_ms.unwrap_or(config.audio.probe_duration_ms));

    // Resolve up front so a bad selector fails before any stream is built.
    let resolved = controller.resolve_device(&selector)?;
    println!("opening input {}: {}", resolved.index, resolved.name);

    let report = controller.capture(&selector, format, duration).await?;
    print_capture_report(&report);
    Ok(())
}

fn print_capture_report(report: &CaptureReport) {
    println!("device:   {}", report.device_name);
    println!("format:   {}", report.format);
    println!(
        "captured: {} samples ({:.2}s of {:.2}s requested)",
        report.captured_samples,
        report.captured_secs(),
        report.requested_ms as f32 / 1000.0
    );
    println!("level:    rms {:.3}, peak {:.3}", report.rms, report.peak);
}

fn cmd_segment(
    controller: &AppController,
    text: Option<String>,
    model: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let text = match text {
        Some(text) => text,
        None => {
            let mut buffer = String::new();
            std::io::stdin().read_to_string(&mut buffer)?;
            buffer
        }
    };

    let model_id = model.unwrap_or_else(|| controller.config().segmentation.model);
    let result = controller.segment(&text, &model_id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&json_sentences(&result, &text))?);
    } else {
        for sentence in result.sentences(&text) {
            println!("{}", sentence);
        }
    }

    Ok(())
}

#[derive(serde::Serialize)]
struct JsonSentence<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

#[derive(serde::Serialize)]
struct JsonSegmentation<'a> {
    model: &'a str,
    sentences: Vec<JsonSentence<'a>>,
}

fn json_sentences<'a>(result: &'a SegmentationResult, text: &'a str) -> JsonSegmentation<'a> {
    JsonSegmentation {
        model: &result.model,
        sentences: result
            .spans
            .iter()
            .filter_map(|span| {
                span.resolve(text).map(|sentence| JsonSentence {
                    start: span.start,
                    end: span.end,
                    text: sentence,
                })
            })
            .collect(),
    }
}

fn cmd_models(controller: &AppController) -> anyhow::Result<()> {
    let config = controller.config();
    let catalog = controller.model_catalog();

    for model in &catalog.models {
        let marker = if model.id == config.segmentation.model {
            " (configured)"
        } else {
            ""
        };
        println!("{} - {} [{}]{}", model.id, model.name, model.language, marker);
        println!("  {}", model.description);
    }

    Ok(())
}

fn cmd_config(controller: &AppController) -> anyhow::Result<()> {
    let config = controller.config();

    print!("{}", toml::to_string_pretty(&config)?);
    println!();
    println!("config file: {}", controller.config_path());
    println!("data dir:    {}", controller.data_dir());
    println!("logs dir:    {}", controller.logs_dir());

    Ok(())
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_capture_flags() {
        let cli = Cli::try_parse_from([
            "voxprobe", "capture", "--device", "3", "--rate", "48000", "--channels", "1",
            "--encoding", "i16", "--duration-ms", "500",
        ])
        .unwrap();

        match cli.command {
            Command::Capture {
                device,
                rate,
                channels,
                encoding,
                duration_ms,
            } => {
                assert_eq!(device, Some(DeviceSelector::Index(3)));
                assert_eq!(rate, Some(48_000));
                assert_eq!(channels, Some(1));
                assert_eq!(encoding, Some(SampleEncoding::I16));
                assert_eq!(duration_ms, Some(500));
            }
            other => panic!("expected capture, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_segment_positional_text() {
        let cli = Cli::try_parse_from(["voxprobe", "segment", "One. Two.", "--model", "en-tiny"])
            .unwrap();

        match cli.command {
            Command::Segment { text, model, json } => {
                assert_eq!(text.as_deref(), Some("One. Two."));
                assert_eq!(model.as_deref(), Some("en-tiny"));
                assert!(!json);
            }
            other => panic!("expected segment, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_devices_direction() {
        let cli =
            Cli::try_parse_from(["voxprobe", "devices", "--direction", "input", "--json"]).unwrap();

        match cli.command {
            Command::Devices { direction, json } => {
                assert_eq!(direction, DirectionFilter::Input);
                assert!(json);
            }
            other => panic!("expected devices, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_encoding() {
        assert!(Cli::try_parse_from(["voxprobe", "capture", "--encoding", "u8"]).is_err());
    }
}
