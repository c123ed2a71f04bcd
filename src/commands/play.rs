//! Play a stored recording without opening the recorder screen.

use crate::config::ClipdeckConfig;
use crate::session::{format_mmss, PlaybackClock};
use console::{style, Term};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Plays recording `index` (1 = newest, the default) until it ends or Ctrl+C.
///
/// # Errors
/// - If the recording does not exist or its file is missing
/// - If the output device cannot play the file
pub async fn handle_play(config: &ClipdeckConfig, index: Option<usize>) -> anyhow::Result<()> {
    let store = super::open_store()?;
    let item = super::existing_recording(&store, index.unwrap_or(1))?;
    let mut bridge = super::open_bridge(config)?;

    let interrupted = Arc::new(AtomicBool::new(false));
    let flag = interrupted.clone();
    ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;

    let duration = bridge.play(&item.file_path).await?;
    let clock = PlaybackClock::new(duration);
    let term = Term::stdout();
    term.hide_cursor()?;

    let name = item.display_name().to_string();
    while !interrupted.load(Ordering::SeqCst) && !bridge.playback_finished() {
        let remaining = clock.remaining_secs(bridge.playback_position().unwrap_or_default());
        term.clear_line()?;
        term.write_str(&format!(
            "{} {}  {}",
            style("▶").green(),
            style(format_mmss(remaining)).bold(),
            style(&name).dim()
        ))?;
        tokio::time::sleep(config.audio.poll_interval().max(Duration::from_millis(100))).await;
    }

    if let Err(e) = bridge.stop_playback().await {
        tracing::debug!("Stop after playback: {}", e);
    }
    term.clear_line()?;
    term.show_cursor()?;
    println!("{} {}", style("■").dim(), name);
    Ok(())
}
