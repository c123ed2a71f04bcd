//! Configuration file management for clipdeck.
//!
//! Settings are read from `~/.config/clipdeck/clipdeck.toml`, which setup writes
//! from the embedded default on first run. Every section except `[audio]` may
//! be omitted.

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Audio capture and playback configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioConfig {
    /// Input device to use. Options:
    /// - "default" for system default device
    /// - numeric index (0, 1, 2, etc.) from `clipdeck list-devices`
    /// - device name from `clipdeck list-devices`
    pub device: String,
    /// Requested sample rate in Hz; the device's native rate is used when it differs
    pub sample_rate: u32,
    /// Spacing of progress events while recording, in milliseconds
    #[serde(default = "default_progress_interval_ms")]
    pub progress_interval_ms: u64,
    /// Redraw and input poll interval of the terminal screens, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_progress_interval_ms() -> u64 {
    500
}

fn default_poll_interval_ms() -> u64 {
    50
}

impl AudioConfig {
    pub fn progress_interval(&self) -> Duration {
        Duration::from_millis(self.progress_interval_ms.max(1))
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Trim settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrimConfig {
    /// Frames per packet; every packet start is a seek point
    #[serde(default = "default_frames_per_packet")]
    pub frames_per_packet: u32,
}

fn default_frames_per_packet() -> u32 {
    crate::trim::DEFAULT_FRAMES_PER_PACKET
}

impl Default for TrimConfig {
    fn default() -> Self {
        Self {
            frames_per_packet: default_frames_per_packet(),
        }
    }
}

/// Export and share settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareConfig {
    /// Export format string: "codec [ffmpeg_options]", or "wav" to copy as is
    #[serde(default = "default_export_format")]
    pub export_format: String,
    /// Export directory; defaults to the user's audio (or home) directory plus `clipdeck`
    #[serde(default)]
    pub export_dir: Option<PathBuf>,
    /// MIME type offered to the clipboard; derived from the file extension when unset
    #[serde(default)]
    pub mime_type: Option<String>,
}

fn default_export_format() -> String {
    "wav".to_string()
}

impl Default for ShareConfig {
    fn default() -> Self {
        Self {
            export_format: default_export_format(),
            export_dir: None,
            mime_type: None,
        }
    }
}

impl ShareConfig {
    /// Directory exports are written to.
    ///
    /// # Errors
    /// - If no export directory is configured and the home directory is unknown
    pub fn resolved_export_dir(&self) -> anyhow::Result<PathBuf> {
        if let Some(dir) = &self.export_dir {
            return Ok(dir.clone());
        }
        dirs::audio_dir()
            .or_else(dirs::home_dir)
            .map(|dir| dir.join("clipdeck"))
            .ok_or_else(|| anyhow!("Could not determine home directory"))
    }

    /// MIME type for sharing `path`.
    pub fn mime_type_for(&self, path: &Path) -> String {
        self.mime_type
            .clone()
            .unwrap_or_else(|| crate::share::mime_type_for(path).to_string())
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClipdeckConfig {
    pub audio: AudioConfig,
    #[serde(default)]
    pub trim: TrimConfig,
    #[serde(default)]
    pub share: ShareConfig,
}

impl ClipdeckConfig {
    /// Loads configuration from the user's config directory.
    ///
    /// # Errors
    /// - If the config directory cannot be determined
    /// - If the config file cannot be read
    /// - If the TOML is malformed
    pub fn load() -> anyhow::Result<Self> {
        let config_path = config_path()?;
        let content = fs::read_to_string(&config_path)
            .map_err(|e| anyhow!("Failed to read {}: {e}", config_path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    /// - If the TOML is malformed or `[audio]` is missing
    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let config: ClipdeckConfig = toml::from_str(content)?;
        if config.trim.frames_per_packet == 0 {
            return Err(anyhow!("trim.frames_per_packet must be greater than zero"));
        }
        Ok(config)
    }
}

impl Default for ClipdeckConfig {
    fn default() -> Self {
        Self {
            audio: AudioConfig {
                device: "default".to_string(),
                sample_rate: 44100,
                progress_interval_ms: default_progress_interval_ms(),
                poll_interval_ms: default_poll_interval_ms(),
            },
            trim: TrimConfig::default(),
            share: ShareConfig::default(),
        }
    }
}

/// `~/.config/clipdeck`, created if missing.
///
/// # Errors
/// - If the home directory cannot be determined
/// - If the directory cannot be created
pub fn config_dir() -> anyhow::Result<PathBuf> {
    let dir = dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".config")
        .join("clipdeck");
    fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// Path to `clipdeck.toml`.
///
/// # Errors
/// - Same as [`config_dir`]
pub fn config_path() -> anyhow::Result<PathBuf> {
    Ok(config_dir()?.join("clipdeck.toml"))
}

/// `~/.local/share/clipdeck`, holding the store database and recordings.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn data_dir() -> anyhow::Result<PathBuf> {
    Ok(dirs::home_dir()
        .ok_or_else(|| anyhow!("Could not determine home directory"))?
        .join(".local")
        .join("share")
        .join("clipdeck"))
}

/// Directory new recordings and trim output are written to.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn recordings_dir() -> anyhow::Result<PathBuf> {
    Ok(data_dir()?.join("recordings"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_fills_defaults() {
        let config = ClipdeckConfig::from_toml_str(
            r#"
config_version = "0.1.0"

[audio]
device = "default"
sample_rate = 16000
"#,
        )
        .unwrap();

        assert_eq!(config.audio.sample_rate, 16000);
        assert_eq!(config.audio.progress_interval(), Duration::from_millis(500));
        assert_eq!(config.audio.poll_interval(), Duration::from_millis(50));
        assert_eq!(config.trim.frames_per_packet, 1024);
        assert_eq!(config.share.export_format, "wav");
        assert!(config.share.export_dir.is_none());
    }

    #[test]
    fn test_full_config() {
        let config = ClipdeckConfig::from_toml_str(
            r#"
[audio]
device = "USB Mic"
sample_rate = 48000
progress_interval_ms = 250
poll_interval_ms = 20

[trim]
frames_per_packet = 512

[share]
export_format = "libopus -b:a 24k"
export_dir = "/tmp/exports"
mime_type = "audio/ogg"
"#,
        )
        .unwrap();

        assert_eq!(config.audio.device, "USB Mic");
        assert_eq!(config.trim.frames_per_packet, 512);
        assert_eq!(
            config.share.resolved_export_dir().unwrap(),
            PathBuf::from("/tmp/exports")
        );
        assert_eq!(config.share.mime_type_for(Path::new("x.wav")), "audio/ogg");
    }

    #[test]
    fn test_mime_type_defaults_to_extension() {
        let share = ShareConfig::default();
        assert_eq!(share.mime_type_for(Path::new("x.wav")), "audio/wav");
    }

    #[test]
    fn test_missing_audio_section_is_an_error() {
        assert!(ClipdeckConfig::from_toml_str("[trim]\nframes_per_packet = 10\n").is_err());
    }

    #[test]
    fn test_zero_packet_size_is_rejected() {
        let err = ClipdeckConfig::from_toml_str(
            "[audio]\ndevice = \"default\"\nsample_rate = 16000\n[trim]\nframes_per_packet = 0\n",
        )
        .unwrap_err();
        assert!(err.to_string().contains("frames_per_packet"));
    }

    #[test]
    fn test_embedded_default_parses() {
        let config = ClipdeckConfig::from_toml_str(crate::setup::DEFAULT_CONFIG).unwrap();
        assert_eq!(config.audio.device, "default");
    }
}
