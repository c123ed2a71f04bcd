//! Recorder screen state.
//!
//! Capture and playback are separate machines; [`SessionMachine`] holds both,
//! refuses any transition that would make them active together, and derives the
//! six-state [`RecorderState`] used for rendering and button labels.

use super::clock::{ElapsedClock, PlaybackClock};
use crate::recording::RecorderEvent;
use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Combined view of the two devices, as shown on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecorderState {
    Idle,
    Recording,
    Paused,
    Stopped,
    Playing,
    PlayPaused,
}

impl fmt::Display for RecorderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Paused => "paused",
            Self::Stopped => "stopped",
            Self::Playing => "playing",
            Self::PlayPaused => "playPaused",
        };
        f.write_str(name)
    }
}

/// Capture device lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureState {
    #[default]
    Idle,
    Active,
    Paused,
    Finalized,
}

impl CaptureState {
    /// Whether the capture device holds an open session.
    pub fn is_open(self) -> bool {
        matches!(self, Self::Active | Self::Paused)
    }
}

/// Playback device lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlaybackState {
    /// Whether a track is loaded on the playback device.
    pub fn is_open(self) -> bool {
        !matches!(self, Self::Stopped)
    }
}

/// A transition the current state does not allow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot {action} while {state}")]
    Invalid {
        action: &'static str,
        state: RecorderState,
    },

    #[error("Cannot {action} while {active} is active")]
    Exclusive {
        action: &'static str,
        active: &'static str,
    },
}

/// What the microphone button should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MicAction {
    Start,
    Pause,
    Resume,
}

/// What the stop button should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopAction {
    Recording,
    Playback,
}

/// A recording that just finished, ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRecording {
    pub file_path: PathBuf,
    pub duration: u64,
}

/// Everything the recorder screen renders from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionView {
    pub state: RecorderState,
    pub elapsed: u64,
    pub play_elapsed: u64,
    pub file: Option<PathBuf>,
    pub current_playing: Option<String>,
}

/// Capture and playback state machines plus their display clocks.
#[derive(Debug, Default)]
pub struct SessionMachine {
    capture: CaptureState,
    playback: PlaybackState,
    clock: ElapsedClock,
    elapsed: u64,
    file: Option<PathBuf>,
    recorded_duration: u64,
    play_clock: Option<PlaybackClock>,
    play_elapsed: u64,
    current_playing: Option<String>,
}

impl SessionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn capture(&self) -> CaptureState {
        self.capture
    }

    pub fn playback(&self) -> PlaybackState {
        self.playback
    }

    /// The six-state view. Playback states win while a track is loaded.
    pub fn state(&self) -> RecorderState {
        match (self.playback, self.capture) {
            (PlaybackState::Playing, _) => RecorderState::Playing,
            (PlaybackState::Paused, _) => RecorderState::PlayPaused,
            (PlaybackState::Stopped, CaptureState::Idle) => RecorderState::Idle,
            (PlaybackState::Stopped, CaptureState::Active) => RecorderState::Recording,
            (PlaybackState::Stopped, CaptureState::Paused) => RecorderState::Paused,
            (PlaybackState::Stopped, CaptureState::Finalized) => RecorderState::Stopped,
        }
    }

    /// Last finished recording, the default target for play.
    pub fn file(&self) -> Option<&PathBuf> {
        self.file.as_ref()
    }

    /// Duration in seconds of the last finished recording.
    pub fn recorded_duration(&self) -> u64 {
        self.recorded_duration
    }

    pub fn view(&self) -> SessionView {
        SessionView {
            state: self.state(),
            elapsed: self.elapsed,
            play_elapsed: self.play_elapsed,
            file: self.file.clone(),
            current_playing: self.current_playing.clone(),
        }
    }

    /// Decides what the microphone button does in the current state.
    ///
    /// # Errors
    /// - If a track is loaded on the playback device
    /// - If the last recording is finalized and the session was not restarted
    pub fn mic_action(&self) -> Result<MicAction, TransitionError> {
        if self.playback.is_open() {
            return Err(TransitionError::Exclusive {
                action: "record",
                active: "playback",
            });
        }
        match self.capture {
            CaptureState::Idle => Ok(MicAction::Start),
            CaptureState::Active => Ok(MicAction::Pause),
            CaptureState::Paused => Ok(MicAction::Resume),
            CaptureState::Finalized => Err(TransitionError::Invalid {
                action: "record",
                state: self.state(),
            }),
        }
    }

    /// Decides which device the stop button stops, if any.
    pub fn stop_action(&self) -> Option<StopAction> {
        if self.capture.is_open() {
            Some(StopAction::Recording)
        } else if self.playback.is_open() {
            Some(StopAction::Playback)
        } else {
            None
        }
    }

    /// Applies a service event. Returns the finished recording on `Stopped`.
    pub fn on_event(&mut self, event: &RecorderEvent, now: Instant) -> Option<FinishedRecording> {
        match event {
            RecorderEvent::Started { .. } => {
                self.clock.start(now);
                self.elapsed = 0;
                self.file = None;
                self.recorded_duration = 0;
                self.capture = CaptureState::Active;
                None
            }
            RecorderEvent::Paused { .. } => {
                self.clock.pause(now);
                self.elapsed = self.clock.elapsed_secs(now);
                self.capture = CaptureState::Paused;
                None
            }
            RecorderEvent::Resumed { .. } => {
                self.clock.resume(now);
                self.capture = CaptureState::Active;
                None
            }
            RecorderEvent::Stopped { file_path } => {
                let duration = self.clock.stop(now);
                self.elapsed = duration;
                self.recorded_duration = duration;
                self.file = Some(file_path.clone());
                self.capture = CaptureState::Finalized;
                Some(FinishedRecording {
                    file_path: file_path.clone(),
                    duration,
                })
            }
            RecorderEvent::Progress { .. } => None,
            RecorderEvent::Failed { message, .. } => {
                tracing::warn!("Recording failed to start: {}", message);
                self.clock.reset();
                self.elapsed = 0;
                self.capture = CaptureState::Idle;
                None
            }
        }
    }

    /// Marks a track as loaded and playing.
    ///
    /// # Errors
    /// - If the capture device holds an open session
    pub fn begin_playback(
        &mut self,
        duration: Duration,
        id: Option<String>,
    ) -> Result<(), TransitionError> {
        if self.capture.is_open() {
            return Err(TransitionError::Exclusive {
                action: "play",
                active: "recording",
            });
        }
        let clock = PlaybackClock::new(duration);
        self.play_elapsed = clock.initial_secs();
        self.play_clock = Some(clock);
        self.current_playing = Some(id.unwrap_or_else(|| "single-file".to_string()));
        self.playback = PlaybackState::Playing;
        Ok(())
    }

    /// playing -> playPaused
    pub fn pause_playback(&mut self) -> Result<(), TransitionError> {
        if self.playback != PlaybackState::Playing {
            return Err(TransitionError::Invalid {
                action: "pause playback",
                state: self.state(),
            });
        }
        self.playback = PlaybackState::Paused;
        Ok(())
    }

    /// playPaused -> playing
    pub fn resume_playback(&mut self) -> Result<(), TransitionError> {
        if self.playback != PlaybackState::Paused {
            return Err(TransitionError::Invalid {
                action: "resume playback",
                state: self.state(),
            });
        }
        self.playback = PlaybackState::Playing;
        Ok(())
    }

    /// Unloads the track, whether stopped by the user or finished.
    pub fn end_playback(&mut self) {
        self.playback = PlaybackState::Stopped;
        self.play_clock = None;
        self.play_elapsed = 0;
        self.current_playing = None;
    }

    /// Refreshes the displayed times.
    ///
    /// `position` is the playback device's reported position, polled by the
    /// caller once per frame while a track is loaded.
    pub fn tick(&mut self, now: Instant, position: Option<Duration>) {
        if self.clock.is_running() {
            self.elapsed = self.clock.elapsed_secs(now);
        }
        if self.playback == PlaybackState::Playing {
            if let (Some(clock), Some(position)) = (self.play_clock, position) {
                self.play_elapsed = clock.remaining_secs(position);
            }
        }
    }

    /// Returns to idle with all clocks cleared. Stored recordings are untouched.
    ///
    /// # Errors
    /// - If a recording is in progress
    pub fn restart(&mut self) -> Result<(), TransitionError> {
        if self.capture.is_open() {
            return Err(TransitionError::Invalid {
                action: "restart",
                state: self.state(),
            });
        }
        self.end_playback();
        self.capture = CaptureState::Idle;
        self.clock.reset();
        self.elapsed = 0;
        self.file = None;
        self.recorded_duration = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> PathBuf {
        PathBuf::from("/tmp/rec.wav")
    }

    fn at(base: Instant, secs: u64) -> Instant {
        base + Duration::from_secs(secs)
    }

    fn started() -> RecorderEvent {
        RecorderEvent::Started { file_path: path() }
    }

    #[test]
    fn test_record_pause_resume_stop_reports_seven_seconds() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();

        machine.on_event(&started(), t0);
        assert_eq!(machine.state(), RecorderState::Recording);

        machine.on_event(&RecorderEvent::Paused { file_path: path() }, at(t0, 3));
        assert_eq!(machine.state(), RecorderState::Paused);
        assert_eq!(machine.view().elapsed, 3);

        machine.on_event(&RecorderEvent::Resumed { file_path: path() }, at(t0, 5));
        machine.tick(at(t0, 8), None);
        assert_eq!(machine.view().elapsed, 6);

        let finished = machine.on_event(&RecorderEvent::Stopped { file_path: path() }, at(t0, 9));
        assert_eq!(
            finished,
            Some(FinishedRecording {
                file_path: path(),
                duration: 7
            })
        );
        assert_eq!(machine.state(), RecorderState::Stopped);
        assert_eq!(machine.file(), Some(&path()));
    }

    #[test]
    fn test_stop_without_pause_event_still_counts_segment() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();
        machine.on_event(&started(), t0);
        let finished = machine
            .on_event(&RecorderEvent::Stopped { file_path: path() }, at(t0, 4))
            .unwrap();
        assert_eq!(finished.duration, 4);
    }

    #[test]
    fn test_mic_action_follows_capture_state() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();
        assert_eq!(machine.mic_action(), Ok(MicAction::Start));

        machine.on_event(&started(), t0);
        assert_eq!(machine.mic_action(), Ok(MicAction::Pause));

        machine.on_event(&RecorderEvent::Paused { file_path: path() }, t0);
        assert_eq!(machine.mic_action(), Ok(MicAction::Resume));

        machine.on_event(&RecorderEvent::Stopped { file_path: path() }, t0);
        assert!(matches!(machine.mic_action(), Err(TransitionError::Invalid { .. })));
    }

    #[test]
    fn test_playback_cycle_from_stopped() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();
        machine.on_event(&started(), t0);
        machine.on_event(&RecorderEvent::Stopped { file_path: path() }, at(t0, 10));

        machine.begin_playback(Duration::from_secs(10), None).unwrap();
        assert_eq!(machine.state(), RecorderState::Playing);
        assert_eq!(machine.view().play_elapsed, 10);
        assert_eq!(machine.view().current_playing.as_deref(), Some("single-file"));

        machine.tick(t0, Some(Duration::from_millis(2_500)));
        assert_eq!(machine.view().play_elapsed, 7);

        machine.pause_playback().unwrap();
        assert_eq!(machine.state(), RecorderState::PlayPaused);
        assert!(machine.pause_playback().is_err());

        machine.resume_playback().unwrap();
        assert_eq!(machine.state(), RecorderState::Playing);
        assert_eq!(machine.stop_action(), Some(StopAction::Playback));

        machine.end_playback();
        assert_eq!(machine.state(), RecorderState::Stopped);
        assert_eq!(machine.view().play_elapsed, 0);
    }

    #[test]
    fn test_recording_and_playback_are_exclusive() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();

        machine.on_event(&started(), t0);
        assert_eq!(
            machine.begin_playback(Duration::from_secs(5), Some("42".into())),
            Err(TransitionError::Exclusive {
                action: "play",
                active: "recording"
            })
        );
        assert_eq!(machine.state(), RecorderState::Recording);

        machine.on_event(&RecorderEvent::Stopped { file_path: path() }, t0);
        machine.begin_playback(Duration::from_secs(5), Some("42".into())).unwrap();
        assert_eq!(
            machine.mic_action(),
            Err(TransitionError::Exclusive {
                action: "record",
                active: "playback"
            })
        );
    }

    #[test]
    fn test_restart_returns_to_idle_and_clears_everything() {
        let t0 = Instant::now();
        let mut machine = SessionMachine::new();
        machine.on_event(&started(), t0);
        machine.on_event(&RecorderEvent::Stopped { file_path: path() }, at(t0, 6));
        machine.begin_playback(Duration::from_secs(6), None).unwrap();

        machine.restart().unwrap();

        let view = machine.view();
        assert_eq!(view.state, RecorderState::Idle);
        assert_eq!(view.elapsed, 0);
        assert_eq!(view.play_elapsed, 0);
        assert_eq!(view.file, None);
        assert_eq!(machine.recorded_duration(), 0);
    }

    #[test]
    fn test_restart_rejected_while_recording() {
        let mut machine = SessionMachine::new();
        machine.on_event(&started(), Instant::now());
        assert!(machine.restart().is_err());
        assert_eq!(machine.state(), RecorderState::Recording);
    }

    #[test]
    fn test_failed_start_returns_to_idle() {
        let mut machine = SessionMachine::new();
        machine.on_event(
            &RecorderEvent::Failed {
                file_path: path(),
                message: "no device".into(),
            },
            Instant::now(),
        );
        assert_eq!(machine.state(), RecorderState::Idle);
        assert_eq!(machine.mic_action(), Ok(MicAction::Start));
    }
}
