//! Output device discovery and selection.
//!
//! Thin wrappers around CPAL for:
//! - listing available output devices
//! - selecting either the default device or a device by substring match
//! - reading the device's native output format

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait};

use crate::error::AudioError;

/// Native output format of the selected device.
#[derive(Clone, Debug)]
pub struct OutputFormat {
    pub stream_config: cpal::StreamConfig,
    pub sample_format: cpal::SampleFormat,
}

impl OutputFormat {
    pub fn sample_rate(&self) -> u32 {
        self.stream_config.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.stream_config.channels
    }
}

/// Pick a CPAL output device.
///
/// - If `needle` is `Some`, chooses the first output device whose name contains the substring
///   (case-insensitive).
/// - Otherwise, returns the host default output device.
///
/// Every failure maps to [`AudioError::NoOutput`].
pub fn pick_device(host: &cpal::Host, needle: Option<&str>) -> Result<cpal::Device, AudioError> {
    if let Some(needle) = needle {
        let devices = host.output_devices().map_err(|e| {
            tracing::warn!("cannot enumerate output devices: {e}");
            AudioError::NoOutput
        })?;
        for d in devices {
            let matched = d
                .description()
                .ok()
                .map(|n| matches_device_name(&n.name(), needle))
                .unwrap_or(false);
            if matched {
                return Ok(d);
            }
        }
        tracing::warn!(device = needle, "no output device matched");
        return Err(AudioError::NoOutput);
    }

    host.default_output_device().ok_or(AudioError::NoOutput)
}

/// Read the device's default output config and check it can carry our stream.
pub fn output_format(device: &cpal::Device) -> Result<OutputFormat, AudioError> {
    let supported = device.default_output_config()?;
    validate_format(supported.channels(), supported.sample_rate())?;
    Ok(OutputFormat {
        sample_format: supported.sample_format(),
        stream_config: supported.into(),
    })
}

/// Reject formats with no output channels or a zero sample rate.
fn validate_format(channels: u16, rate_hz: u32) -> Result<(), AudioError> {
    if channels == 0 {
        return Err(AudioError::NoOutput);
    }
    if rate_hz == 0 {
        return Err(AudioError::BadSampleRate);
    }
    Ok(())
}

/// Print available output devices to stdout.
///
/// This is intended for CLI UX (`--list-devices`) rather than structured output.
pub fn list_devices(host: &cpal::Host) -> Result<()> {
    let devices = host.output_devices().context("No output devices")?;
    for (i, d) in devices.enumerate() {
        println!("#{i}: {}", d.description()?);
    }
    Ok(())
}

/// Human-readable device name for logs.
pub fn device_label(device: &cpal::Device) -> String {
    device
        .description()
        .map(|d| d.to_string())
        .unwrap_or_else(|_| "unknown device".to_string())
}

fn matches_device_name(name: &str, needle: &str) -> bool {
    let needle = needle.trim();
    if needle.is_empty() {
        return false;
    }
    name.to_lowercase().contains(&needle.to_lowercase())
}
