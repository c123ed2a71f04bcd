//! Exporting recordings and handing them to the desktop.
//!
//! A clip is copied (or transcoded) into the export directory under its display
//! name, then shared: placed on the clipboard with its MIME type via wl-copy
//! (Wayland) or xclip (X11), or revealed in the file manager when no clipboard
//! tool accepts it.

use crate::recording::ffmpeg;
use crate::session::sanitize_file_name;
use crate::store::RecordingItem;
use anyhow::{anyhow, Result};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;
use std::time::Duration;

/// MIME type for a file, from its extension.
pub fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("wav") => "audio/wav",
        Some("mp3") => "audio/mpeg",
        Some("ogg") => "audio/ogg",
        Some("m4a") => "audio/mp4",
        Some("flac") => "audio/flac",
        _ => "application/octet-stream",
    }
}

/// Where `item` lands when exported in `export_format`.
pub fn export_path(item: &RecordingItem, export_dir: &Path, export_format: &str) -> PathBuf {
    export_dir.join(format!(
        "{}.{}",
        sanitize_file_name(item.display_name()),
        ffmpeg::extension_for_format(export_format)
    ))
}

/// Copies a recording into `export_dir`, transcoding unless the format is WAV.
///
/// An export that already exists is reused as is.
///
/// # Errors
/// - If the recording file is missing
/// - If the copy or transcode fails
pub fn export_recording(
    item: &RecordingItem,
    export_dir: &Path,
    export_format: &str,
) -> Result<PathBuf> {
    if !item.file_path.exists() {
        return Err(anyhow!(
            "File not found: {}",
            item.file_path.display()
        ));
    }

    std::fs::create_dir_all(export_dir)?;
    let destination = export_path(item, export_dir, export_format);

    if destination.exists() {
        tracing::debug!("Export already present: {}", destination.display());
        return Ok(destination);
    }

    if ffmpeg::is_passthrough(export_format) {
        std::fs::copy(&item.file_path, &destination)?;
    } else {
        ffmpeg::transcode(&item.file_path, &destination, export_format)?;
    }

    tracing::info!(
        "Exported {} to {}",
        item.display_name(),
        destination.display()
    );
    Ok(destination)
}

/// Shares `path` with the desktop.
///
/// # Errors
/// - If the file does not exist
/// - If no clipboard tool or file manager could take it
pub fn share_file(path: &Path, mime_type: &str) -> Result<()> {
    if !path.exists() {
        return Err(anyhow!("File not found: {}", path.display()));
    }

    if copy_with("wl-copy", &["--type", mime_type], path) {
        return Ok(());
    }
    if copy_with(
        "xclip",
        &["-selection", "clipboard", "-t", mime_type, "-in", "-quiet"],
        path,
    ) {
        return Ok(());
    }

    reveal(path)
}

/// Pipes the file into a clipboard tool. Returns whether the tool took it.
fn copy_with(tool: &str, args: &[&str], path: &Path) -> bool {
    let Ok(mut child) = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    else {
        tracing::debug!("{} not found or not executable", tool);
        return false;
    };

    let Some(mut stdin) = child.stdin.take() else {
        return false;
    };

    let written = File::open(path)
        .and_then(|mut file| std::io::copy(&mut file, &mut stdin))
        .and_then(|_| stdin.flush());
    drop(stdin);

    match written {
        Ok(()) => {
            thread::sleep(Duration::from_millis(100));
            tracing::debug!("Copied {} to clipboard via {}", path.display(), tool);
            true
        }
        Err(e) => {
            tracing::warn!("Failed to write to {} stdin: {}", tool, e);
            false
        }
    }
}

/// Opens the platform file manager on the exported file.
fn reveal(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    let status = Command::new("open").arg("-R").arg(path).status();

    #[cfg(not(target_os = "macos"))]
    let status = Command::new("xdg-open")
        .arg(path.parent().unwrap_or(path))
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();

    match status {
        Ok(status) if status.success() => {
            tracing::debug!("Revealed {} in file manager", path.display());
            Ok(())
        }
        Ok(status) => Err(anyhow!(
            "File manager exited with code {}",
            status.code().unwrap_or(-1)
        )),
        Err(e) => Err(anyhow!("No clipboard tool or file manager available: {e}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(path: PathBuf, name: &str) -> RecordingItem {
        RecordingItem {
            id: "1".into(),
            file_path: path,
            duration: 3,
            created_at: 0,
            name: Some(name.into()),
        }
    }

    #[test]
    fn test_mime_types() {
        assert_eq!(mime_type_for(Path::new("a.wav")), "audio/wav");
        assert_eq!(mime_type_for(Path::new("a.WAV")), "audio/wav");
        assert_eq!(mime_type_for(Path::new("a.ogg")), "audio/ogg");
        assert_eq!(mime_type_for(Path::new("a")), "application/octet-stream");
    }

    #[test]
    fn test_export_path_sanitizes_name() {
        let it = item(PathBuf::from("/r/1.wav"), "Recording 2024-01-02 10:11:12");
        let path = export_path(&it, Path::new("/out"), "wav");
        assert_eq!(
            path,
            PathBuf::from("/out/Recording_2024-01-02_10_11_12.wav")
        );
    }

    #[test]
    fn test_export_copies_wav_and_reuses_existing() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("rec.wav");
        std::fs::write(&source, b"first").unwrap();
        let it = item(source.clone(), "clip one");
        let out_dir = dir.path().join("exports");

        let exported = export_recording(&it, &out_dir, "wav").unwrap();
        assert_eq!(exported, out_dir.join("clip_one.wav"));
        assert_eq!(std::fs::read(&exported).unwrap(), b"first");

        std::fs::write(&source, b"second").unwrap();
        let again = export_recording(&it, &out_dir, "wav").unwrap();
        assert_eq!(std::fs::read(again).unwrap(), b"first");
    }

    #[test]
    fn test_export_missing_source_fails() {
        let dir = tempfile::tempdir().unwrap();
        let it = item(dir.path().join("gone.wav"), "gone");
        let err = export_recording(&it, dir.path(), "wav").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }

    #[test]
    fn test_share_missing_file_fails_before_any_tool() {
        let err = share_file(Path::new("/nonexistent/clip.wav"), "audio/wav").unwrap_err();
        assert!(err.to_string().contains("File not found"));
    }
}
