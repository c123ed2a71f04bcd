//! List available audio input and output devices.

use crate::recording::audio::suppress_alsa_warnings;
use anyhow::anyhow;
use console::style;
use cpal::traits::{DeviceTrait, HostTrait};

/// Prints input devices with their index and default config, then the
/// default output device used for playback.
///
/// # Errors
/// - If the audio host cannot enumerate devices
pub fn handle_list_devices() -> anyhow::Result<()> {
    let (host, devices) = suppress_alsa_warnings(|| {
        let host = cpal::default_host();
        let devices: Vec<cpal::Device> = host
            .input_devices()
            .map_err(|e| anyhow!("Failed to enumerate audio devices: {e}"))?
            .filter(|d| d.name().is_ok())
            .collect();
        Ok((host, devices))
    })?;

    if devices.is_empty() {
        println!("No audio input devices found on this system.");
        return Ok(());
    }

    println!();
    println!("{}", style("Input devices").bold());
    println!();

    let default_name = host.default_input_device().and_then(|d| d.name().ok());

    for (index, device) in devices.iter().enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if default_name.as_ref() == Some(&name) {
            format!(" {}", style("[DEFAULT]").green())
        } else {
            String::new()
        };
        let config = match device.default_input_config() {
            Ok(config) => format!(
                "{}Hz, {} channels",
                config.sample_rate().0,
                config.channels()
            ),
            Err(_) => "configuration unavailable".to_string(),
        };

        println!("  ID: {index}");
        println!("    Name: {name}{marker}");
        println!("    Config: {}", style(config).dim());
        println!();
    }

    let output = host
        .default_output_device()
        .and_then(|d| d.name().ok())
        .unwrap_or_else(|| "none".to_string());
    println!("{} {}", style("Playback device:").bold(), output);

    Ok(())
}
