//! Recordings list: interactive browser or a plain listing.

use crate::bridge::Bridge;
use crate::config::ClipdeckConfig;
use crate::session::{format_mmss, PlaybackClock};
use crate::store::ui::{BrowserAction, NowPlaying, RecordingsBrowser};
use crate::store::{RecordingItem, RecordingStore};
use chrono::{Local, TimeZone};
use console::style;

/// Track loaded from the list.
struct Loaded {
    id: String,
    clock: PlaybackClock,
    paused: bool,
}

/// Lists stored recordings, newest first.
///
/// With `plain` the list is printed; otherwise the interactive browser opens.
///
/// # Errors
/// - If the store cannot be opened
/// - If the terminal cannot be driven
pub async fn handle_list(config: &ClipdeckConfig, plain: bool) -> anyhow::Result<()> {
    let mut store = super::open_store()?;

    if plain {
        print_recordings(store.items());
        return Ok(());
    }

    let mut bridge = super::open_bridge(config)?;
    run_browser(&mut bridge, &mut store, config).await
}

fn print_recordings(items: &[RecordingItem]) {
    if items.is_empty() {
        println!("No recordings yet. Run 'clipdeck' to record one.");
        return;
    }

    for (index, item) in items.iter().enumerate() {
        let created = Local
            .timestamp_millis_opt(item.created_at)
            .single()
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        let missing = if item.file_path.exists() {
            String::new()
        } else {
            format!("  {}", style("(file missing)").red())
        };
        println!(
            "{:>3}  {}  {}  {}{}",
            style(index + 1).bold(),
            format_mmss(item.duration),
            style(created).dim(),
            item.display_name(),
            missing
        );
    }
}

/// Runs the browser until the user leaves it. Playback started here is
/// stopped on exit.
///
/// # Errors
/// - If the terminal cannot be driven
pub(crate) async fn run_browser(
    bridge: &mut Bridge,
    store: &mut RecordingStore,
    config: &ClipdeckConfig,
) -> anyhow::Result<()> {
    let mut browser = RecordingsBrowser::new(store.items().to_vec())?;
    let mut loaded: Option<Loaded> = None;
    let poll_interval = config.audio.poll_interval();

    loop {
        if loaded.is_some() && bridge.playback_finished() {
            bridge.stop_playback().await?;
            loaded = None;
        }

        let now_playing = loaded.as_ref().map(|track| NowPlaying {
            id: track.id.clone(),
            remaining: track
                .clock
                .remaining_secs(bridge.playback_position().unwrap_or_default()),
            paused: track.paused,
        });
        browser.draw(now_playing.as_ref())?;

        let Some(action) = browser.handle_input(poll_interval)? else {
            continue;
        };

        match action {
            BrowserAction::Exit => break,
            BrowserAction::TogglePlay(index) => {
                let Some(item) = store.items().get(index).cloned() else {
                    continue;
                };

                if let Some(track) = loaded.as_mut().filter(|t| t.id == item.id) {
                    let result = if track.paused {
                        bridge.resume_playback().await
                    } else {
                        bridge.pause_playback().await
                    };
                    match result {
                        Ok(_) => track.paused = !track.paused,
                        Err(e) => browser.alert("Playback failed", &e.to_string())?,
                    }
                    continue;
                }

                if !item.file_path.exists() {
                    browser.alert("File not found", &item.file_path.display().to_string())?;
                    continue;
                }
                match bridge.play(&item.file_path).await {
                    Ok(duration) => {
                        loaded = Some(Loaded {
                            id: item.id.clone(),
                            clock: PlaybackClock::new(duration),
                            paused: false,
                        });
                    }
                    Err(e) => {
                        loaded = None;
                        browser.alert("Playback failed", &e.to_string())?;
                    }
                }
            }
            BrowserAction::Trim { index, start, end } => {
                let Some(item) = store.items().get(index).cloned() else {
                    continue;
                };
                if !item.file_path.exists() {
                    browser.alert("File not found", &item.file_path.display().to_string())?;
                    continue;
                }
                match bridge.trim(&item.file_path, start, end).await {
                    Ok(output) => {
                        let saved = store.insert(RecordingItem::trimmed(&item, output, start, end));
                        browser.state.set_items(store.items().to_vec());
                        match saved {
                            Ok(()) => browser.state.notify("Trimmed clip saved"),
                            Err(e) => {
                                tracing::error!("Failed to save recordings: {:#}", e);
                                browser.alert("Storage Error", &format!("{e:#}"))?;
                            }
                        }
                    }
                    Err(e) => browser.alert("Trim failed", &e.to_string())?,
                }
            }
            BrowserAction::Share(index) => {
                let Some(item) = store.items().get(index).cloned() else {
                    continue;
                };
                match super::share::export_and_share(bridge, &item, &config.share).await {
                    Ok(path) => browser.state.notify(format!("Shared {}", path.display())),
                    Err(e) => browser.alert("Share failed", &e.to_string())?,
                }
            }
            BrowserAction::Delete(index) => {
                if let Err(e) = store.remove_at(index) {
                    tracing::error!("Failed to delete recording: {:#}", e);
                    browser.alert("Storage Error", &format!("{e:#}"))?;
                    continue;
                }
                if loaded.as_ref().is_some_and(|t| store.get(&t.id).is_none()) {
                    bridge.stop_playback().await?;
                    loaded = None;
                }
                browser.state.set_items(store.items().to_vec());
                browser.state.notify("Deleted");
            }
        }
    }

    if loaded.is_some() {
        bridge.stop_playback().await?;
    }
    browser.cleanup()?;
    Ok(())
}
