//! Recorder screen.
//!
//! Drives the bridge from key presses, folds the service's events into the
//! session machine and saves every finished recording to the store. SIGUSR1
//! stops a recording in progress, so a hotkey daemon can end a take.

use crate::bridge::Bridge;
use crate::config::ClipdeckConfig;
use crate::recording::{RecorderCommand, RecorderEvent, RecorderTui};
use crate::session::{MicAction, RecorderState, SessionMachine, StopAction};
use crate::store::{RecordingItem, RecordingStore};
use crate::ui::show_alert;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::TryRecvError};

/// Runs the recorder screen until the user quits.
///
/// # Errors
/// - If the store cannot be opened
/// - If the terminal cannot be driven
/// - If the signal handler cannot be registered
pub async fn handle_record(config: &ClipdeckConfig) -> anyhow::Result<()> {
    tracing::info!("=== clipdeck recorder started ===");
    tracing::info!(
        "Configuration loaded: device={}, sample_rate={}Hz, frames_per_packet={}",
        config.audio.device,
        config.audio.sample_rate,
        config.trim.frames_per_packet
    );

    let mut store = match super::open_store() {
        Ok(store) => store,
        Err(e) => {
            show_alert("Storage Error", &format!("{e:#}"))?;
            return Err(e);
        }
    };
    let mut bridge = super::open_bridge(config)?;
    let mut events = bridge.subscribe();
    let mut machine = SessionMachine::new();

    let stop_requested = Arc::new(AtomicBool::new(false));
    signal_hook::flag::register(signal_hook::consts::SIGUSR1, stop_requested.clone())
        .map_err(|e| anyhow::anyhow!("Failed to register signal handler: {e}"))?;

    let mut tui = RecorderTui::new().map_err(|e| anyhow::anyhow!("Failed to initialize UI: {e}"))?;
    let poll_interval = config.audio.poll_interval();

    loop {
        if stop_requested.swap(false, Ordering::Relaxed) && bridge.is_capturing() {
            tracing::info!("Received SIGUSR1: stopping recording");
            bridge.stop().await?;
        }

        apply_events(&mut events, &mut machine, &mut store, &mut tui)?;

        if bridge.playback_finished() {
            bridge.stop_playback().await?;
            machine.end_playback();
        }

        machine.tick(Instant::now(), bridge.playback_position());
        tui.render(&machine.view())?;

        match tui.handle_input(poll_interval)? {
            RecorderCommand::Continue => {}
            RecorderCommand::Mic => match machine.mic_action() {
                Ok(MicAction::Start) => {
                    if let Err(e) = bridge.start().await {
                        tui.notify(e.to_string());
                    }
                }
                Ok(MicAction::Pause) => {
                    bridge.pause().await?;
                }
                Ok(MicAction::Resume) => {
                    bridge.resume().await?;
                }
                Err(e) => tui.notify(e.to_string()),
            },
            RecorderCommand::Stop => match machine.stop_action() {
                Some(StopAction::Recording) => {
                    bridge.stop().await?;
                }
                Some(StopAction::Playback) => {
                    bridge.stop_playback().await?;
                    machine.end_playback();
                }
                None => {}
            },
            RecorderCommand::TogglePlay => {
                toggle_playback(&mut bridge, &mut machine, &mut tui).await?;
            }
            RecorderCommand::Restart => {
                if let Err(e) = machine.restart() {
                    tui.notify(e.to_string());
                } else if bridge.is_playing() {
                    bridge.stop_playback().await?;
                }
            }
            RecorderCommand::OpenList => {
                if machine.capture().is_open() {
                    tui.notify("Stop the recording first");
                    continue;
                }
                if machine.playback().is_open() {
                    bridge.stop_playback().await?;
                    machine.end_playback();
                }
                drop(tui);
                super::list::run_browser(&mut bridge, &mut store, config).await?;
                tui = RecorderTui::new()?;
            }
            RecorderCommand::Quit => {
                if bridge.is_capturing() {
                    bridge.stop().await?;
                    apply_events(&mut events, &mut machine, &mut store, &mut tui)?;
                }
                break;
            }
        }
    }

    tui.cleanup()?;
    tracing::info!("=== clipdeck recorder exited ===");
    Ok(())
}

/// Play, pause or resume the last recording, depending on the current state.
async fn toggle_playback(
    bridge: &mut Bridge,
    machine: &mut SessionMachine,
    tui: &mut RecorderTui,
) -> anyhow::Result<()> {
    match machine.state() {
        RecorderState::Playing => {
            bridge.pause_playback().await?;
            machine.pause_playback()?;
        }
        RecorderState::PlayPaused => {
            bridge.resume_playback().await?;
            machine.resume_playback()?;
        }
        RecorderState::Recording | RecorderState::Paused => {
            tui.notify("Cannot play while recording");
        }
        RecorderState::Idle | RecorderState::Stopped => {
            let Some(file) = machine.file().cloned() else {
                tui.notify("Nothing recorded yet");
                return Ok(());
            };
            if !file.exists() {
                tui.alert("File not found", &file.display().to_string())?;
                return Ok(());
            }
            match bridge.play(&file).await {
                Ok(duration) => machine.begin_playback(duration, None)?,
                Err(e) => tui.alert("Playback failed", &e.to_string())?,
            }
        }
    }
    Ok(())
}

/// Folds pending service events into the machine and stores finished recordings.
fn apply_events(
    events: &mut broadcast::Receiver<RecorderEvent>,
    machine: &mut SessionMachine,
    store: &mut RecordingStore,
    tui: &mut RecorderTui,
) -> anyhow::Result<()> {
    loop {
        let event = match events.try_recv() {
            Ok(event) => event,
            Err(TryRecvError::Lagged(skipped)) => {
                tracing::warn!("Dropped {} recorder events", skipped);
                continue;
            }
            Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => return Ok(()),
        };

        tracing::debug!("{} {}", event.name(), event.file_path().display());
        if let RecorderEvent::Failed { message, .. } = &event {
            tui.alert("Recording Error", message)?;
        }

        if let Some(finished) = machine.on_event(&event, Instant::now()) {
            let item = RecordingItem::recorded(finished.file_path, finished.duration);
            tui.notify(format!("Saved {}", item.display_name()));
            if let Err(e) = store.insert(item) {
                tracing::error!("Failed to save recordings: {:#}", e);
                tui.alert("Storage Error", &format!("{e:#}"))?;
            }
        }
    }
}
