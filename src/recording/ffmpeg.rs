//! ffmpeg discovery and transcoding for exported clips.
//!
//! Recordings are always kept as WAV; ffmpeg only runs when a clip is exported
//! in another format. The binary is looked up in the usual install locations
//! before PATH, since terminals launched from a desktop often have a short PATH.

use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::process::Command;

/// Locates the ffmpeg binary on the system.
///
/// # Errors
/// - If ffmpeg is neither in a standard location nor on PATH
pub fn find_ffmpeg() -> Result<PathBuf> {
    let candidates: &[&str] = if cfg!(target_os = "macos") {
        &[
            "/opt/homebrew/bin/ffmpeg",
            "/usr/local/bin/ffmpeg",
            "/usr/bin/ffmpeg",
        ]
    } else if cfg!(target_os = "linux") {
        &["/usr/bin/ffmpeg", "/usr/local/bin/ffmpeg", "/snap/bin/ffmpeg"]
    } else {
        &[]
    };

    if let Some(path) = candidates.iter().map(PathBuf::from).find(|p| p.exists()) {
        tracing::debug!("Found ffmpeg at: {}", path.display());
        return Ok(path);
    }

    let path = find_in_path("ffmpeg")?;
    tracing::debug!("Found ffmpeg in PATH at: {}", path.display());
    Ok(path)
}

fn find_in_path(binary_name: &str) -> Result<PathBuf> {
    let search_cmd = if cfg!(target_os = "windows") {
        "where"
    } else {
        "which"
    };

    let output = Command::new(search_cmd)
        .arg(binary_name)
        .output()
        .map_err(|e| anyhow!("Failed to search PATH for {binary_name}: {e}"))?;

    if output.status.success() {
        let path = PathBuf::from(String::from_utf8_lossy(&output.stdout).trim());
        if !path.as_os_str().is_empty() {
            return Ok(path);
        }
    }

    Err(anyhow!(
        "ffmpeg not found. Install it to export in formats other than wav:\n\
         macOS: brew install ffmpeg\n\
         Linux: apt install ffmpeg (Debian/Ubuntu) or dnf install ffmpeg (Fedora)"
    ))
}

/// File extension for an export format string such as `"libopus -b:a 24k"`.
pub fn extension_for_format(format: &str) -> &str {
    let codec = format.split_whitespace().next().unwrap_or("wav");
    match codec {
        "libopus" | "libvorbis" => "ogg",
        "aac" => "m4a",
        "libmp3lame" => "mp3",
        "pcm_s16le" => "wav",
        other => other,
    }
}

/// Whether `format` keeps the WAV container, so no transcoding is needed.
pub fn is_passthrough(format: &str) -> bool {
    extension_for_format(format) == "wav"
}

/// Re-encodes `input` into `output` using an ffmpeg format string of the form
/// `"codec [ffmpeg options]"`.
///
/// # Errors
/// - If the format string is empty
/// - If ffmpeg cannot be found or exits with an error
pub fn transcode(input: &Path, output: &Path, format: &str) -> Result<()> {
    let mut parts = format.split_whitespace();
    let codec = parts
        .next()
        .ok_or_else(|| anyhow!("Invalid export format: empty"))?;

    let ffmpeg_path = find_ffmpeg()?;

    let mut cmd = Command::new(&ffmpeg_path);
    cmd.args(["-loglevel", "error", "-i"])
        .arg(input)
        .args(["-acodec", codec, "-y"]);
    cmd.args(parts);
    cmd.arg(output);

    let result = cmd.output()?;
    if result.status.success() {
        tracing::debug!("Transcoded {} to {}", input.display(), codec);
        Ok(())
    } else {
        let error_msg = String::from_utf8_lossy(&result.stderr);
        tracing::error!("ffmpeg transcode failed: {}", error_msg);
        Err(anyhow!("Audio encoding failed: {error_msg}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_format() {
        assert_eq!(extension_for_format("wav"), "wav");
        assert_eq!(extension_for_format("pcm_s16le"), "wav");
        assert_eq!(extension_for_format("libopus -b:a 24k"), "ogg");
        assert_eq!(extension_for_format("aac"), "m4a");
        assert_eq!(extension_for_format("mp3 -ab 16k"), "mp3");
        assert_eq!(extension_for_format("flac"), "flac");
        assert_eq!(extension_for_format(""), "wav");
    }

    #[test]
    fn test_passthrough_formats() {
        assert!(is_passthrough("wav"));
        assert!(is_passthrough("pcm_s16le"));
        assert!(!is_passthrough("mp3"));
    }

    #[test]
    fn test_transcode_rejects_empty_format() {
        let err = transcode(Path::new("/a.wav"), Path::new("/b.mp3"), "  ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }
}
