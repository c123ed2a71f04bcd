//! Async facade over the recording service, the player, trim and share.
//!
//! The recorder screen and the CLI commands talk only to [`Bridge`]. It owns the
//! capture service and the loaded playback session, and refuses any call that
//! would run capture and playback at the same time. Trim and share run on the
//! blocking pool so the caller's task keeps rendering.

use crate::error::BridgeError;
use crate::recording::device::{CaptureDevice, PlaybackDevice, PlaybackSession};
use crate::recording::events::{EventSink, RecorderEvent};
use crate::recording::service::{RecordingService, DEFAULT_PROGRESS_INTERVAL};
use crate::share;
use crate::trim::{self, DEFAULT_FRAMES_PER_PACKET};
use chrono::Local;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::sync::broadcast;

/// Acknowledgement returned by control calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ack {
    Paused,
    Resumed,
    Stopped,
    Shared,
}

/// Settings the bridge needs from configuration.
#[derive(Debug, Clone)]
pub struct BridgeOptions {
    /// Where new recordings and trim output are written
    pub recordings_dir: PathBuf,
    /// Packet size used when trimming
    pub frames_per_packet: u32,
    /// Spacing of progress events while recording
    pub progress_interval: Duration,
}

impl BridgeOptions {
    pub fn new(recordings_dir: PathBuf) -> Self {
        Self {
            recordings_dir,
            frames_per_packet: DEFAULT_FRAMES_PER_PACKET,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

pub struct Bridge {
    service: RecordingService,
    playback_device: Box<dyn PlaybackDevice>,
    player: Option<Box<dyn PlaybackSession>>,
    recordings_dir: PathBuf,
    frames_per_packet: u32,
    sink: EventSink,
}

impl Bridge {
    /// Wires a capture device, a playback device and an event sink together.
    pub fn new(
        capture: Box<dyn CaptureDevice>,
        playback: Box<dyn PlaybackDevice>,
        sink: EventSink,
        options: BridgeOptions,
    ) -> Self {
        Self {
            service: RecordingService::new(capture, sink.clone(), options.progress_interval),
            playback_device: playback,
            player: None,
            recordings_dir: options.recordings_dir,
            frames_per_packet: options.frames_per_packet,
            sink,
        }
    }

    /// New receiver for service events.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.sink.subscribe()
    }

    pub fn is_capturing(&self) -> bool {
        self.service.is_capturing()
    }

    pub fn is_playing(&self) -> bool {
        self.player.is_some()
    }

    /// Starts capture into a new `rec_<epoch ms>.wav` and returns its path.
    ///
    /// Device failures are reported through a `Failed` event, not here.
    ///
    /// # Errors
    /// - `BridgeError::Busy` while a track is loaded for playback
    pub async fn start(&mut self) -> Result<PathBuf, BridgeError> {
        if self.player.is_some() {
            return Err(BridgeError::Busy {
                action: "record",
                active: "playback",
            });
        }

        if let Err(e) = std::fs::create_dir_all(&self.recordings_dir) {
            tracing::warn!(
                "Failed to create recordings directory {}: {}",
                self.recordings_dir.display(),
                e
            );
        }

        let path = self
            .recordings_dir
            .join(format!("rec_{}.wav", Local::now().timestamp_millis()));
        self.service.start(&path);
        Ok(path)
    }

    pub async fn pause(&mut self) -> Result<Ack, BridgeError> {
        self.service.pause();
        Ok(Ack::Paused)
    }

    pub async fn resume(&mut self) -> Result<Ack, BridgeError> {
        self.service.resume();
        Ok(Ack::Resumed)
    }

    pub async fn stop(&mut self) -> Result<Ack, BridgeError> {
        self.service.stop();
        Ok(Ack::Stopped)
    }

    /// Cuts `[start, end]` seconds out of `path` into a new file in the
    /// recordings directory and returns the new path.
    ///
    /// # Errors
    /// - `BridgeError::Trim` for an invalid window (checked before any I/O) or
    ///   any container failure
    pub async fn trim(&self, path: &Path, start: f64, end: f64) -> Result<PathBuf, BridgeError> {
        trim::validate_window(start, end)?;

        let dir = self.recordings_dir.clone();
        let input = path.to_path_buf();
        let frames_per_packet = self.frames_per_packet;
        let report = tokio::task::spawn_blocking(move || {
            trim::trim_recording(&dir, &input, start, end, frames_per_packet)
        })
        .await
        .map_err(|e| BridgeError::Trim {
            message: format!("Trim task failed: {e}"),
        })??;

        Ok(report.output)
    }

    /// Hands `path` to the desktop with the given MIME type.
    ///
    /// # Errors
    /// - `BridgeError::Share` if the file is missing or nothing accepted it
    pub async fn share_file(&self, path: &Path, mime_type: &str) -> Result<Ack, BridgeError> {
        let path = path.to_path_buf();
        let mime_type = mime_type.to_string();
        tokio::task::spawn_blocking(move || share::share_file(&path, &mime_type))
            .await
            .map_err(|e| BridgeError::Share {
                message: format!("Share task failed: {e}"),
            })?
            .map_err(|e| BridgeError::Share {
                message: format!("{e:#}"),
            })?;
        Ok(Ack::Shared)
    }

    /// Loads `path` and starts playing it, replacing any loaded track.
    /// Returns the track length.
    ///
    /// # Errors
    /// - `BridgeError::Busy` while a capture session is open
    /// - `BridgeError::Playback` if the file cannot be loaded or played
    pub async fn play(&mut self, path: &Path) -> Result<Duration, BridgeError> {
        if self.service.is_capturing() {
            return Err(BridgeError::Busy {
                action: "play",
                active: "recording",
            });
        }

        self.player = None;
        let mut session = self
            .playback_device
            .load(path)
            .map_err(|e| BridgeError::Playback {
                message: format!("{e:#}"),
            })?;
        session.play().map_err(|e| BridgeError::Playback {
            message: format!("{e:#}"),
        })?;

        let duration = session.duration();
        tracing::info!(
            "Playing {} ({:.1}s)",
            path.display(),
            duration.as_secs_f64()
        );
        self.player = Some(session);
        Ok(duration)
    }

    pub async fn pause_playback(&mut self) -> Result<Ack, BridgeError> {
        let player = self.player.as_mut().ok_or(BridgeError::NotPlaying)?;
        player.pause().map_err(|e| BridgeError::Playback {
            message: format!("{e:#}"),
        })?;
        Ok(Ack::Paused)
    }

    pub async fn resume_playback(&mut self) -> Result<Ack, BridgeError> {
        let player = self.player.as_mut().ok_or(BridgeError::NotPlaying)?;
        player.play().map_err(|e| BridgeError::Playback {
            message: format!("{e:#}"),
        })?;
        Ok(Ack::Resumed)
    }

    /// Unloads the current track.
    ///
    /// # Errors
    /// - `BridgeError::NotPlaying` if nothing is loaded
    pub async fn stop_playback(&mut self) -> Result<Ack, BridgeError> {
        self.player.take().ok_or(BridgeError::NotPlaying)?;
        tracing::debug!("Playback stopped");
        Ok(Ack::Stopped)
    }

    /// Position of the loaded track, polled once per frame by the UI.
    pub fn playback_position(&self) -> Option<Duration> {
        self.player.as_ref().map(|p| p.position())
    }

    /// Whether the loaded track reached its end.
    pub fn playback_finished(&self) -> bool {
        self.player.as_ref().is_some_and(|p| p.is_finished())
    }
}
