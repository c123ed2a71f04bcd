//! Cut a window out of a stored recording.

use crate::config::ClipdeckConfig;
use crate::store::RecordingItem;
use crate::trim;

/// Trims recording `index` to `[start, end]` seconds and stores the result
/// as a new recording. The source is left untouched.
///
/// # Errors
/// - If the recording does not exist or its file is missing
/// - If the window is invalid or the container cannot be rewritten
pub async fn handle_trim(
    config: &ClipdeckConfig,
    index: usize,
    start: f64,
    end: f64,
) -> anyhow::Result<()> {
    let mut store = super::open_store()?;
    let source = super::existing_recording(&store, index)?;
    let bridge = super::open_bridge(config)?;

    // Past-the-end windows are cut at the end of the file
    let end = match trim::wav_duration(&source.file_path) {
        Ok(length) if end > length => length,
        _ => end,
    };

    let output = bridge.trim(&source.file_path, start, end).await?;
    let item = RecordingItem::trimmed(&source, output, start, end);
    println!(
        "Trimmed \"{}\" to {}s: {}",
        source.display_name(),
        item.duration,
        item.file_path.display()
    );
    store.insert(item)?;
    Ok(())
}
