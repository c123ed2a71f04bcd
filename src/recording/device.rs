//! Device seams between the service layer and the audio backend.
//!
//! The cpal implementations live in `audio` and `playback`; tests substitute
//! in-memory fakes. Sessions are not required to be `Send` because cpal streams
//! are not on every platform, so they stay on the task that opened them.

use anyhow::Result;
use std::path::Path;
use std::time::Duration;

/// Something that can open a capture session writing into a container file.
pub trait CaptureDevice {
    /// Opens the input device and starts writing to `path`.
    fn open(&mut self, path: &Path) -> Result<Box<dyn CaptureSession>>;
}

/// A running capture writing into one file.
pub trait CaptureSession {
    /// Stops taking input without closing the file.
    fn pause(&mut self) -> Result<()>;

    /// Takes input again, appending to the same file.
    fn resume(&mut self) -> Result<()>;

    /// Finalizes the file and releases the device.
    fn finish(self: Box<Self>) -> Result<()>;
}

/// Something that can load a file for playback.
pub trait PlaybackDevice {
    /// Loads `path` and returns a paused session positioned at the start.
    fn load(&mut self, path: &Path) -> Result<Box<dyn PlaybackSession>>;
}

/// A loaded track. Dropping the session stops playback and releases the device.
pub trait PlaybackSession {
    /// Length of the loaded track.
    fn duration(&self) -> Duration;

    /// Current playback position as reported by the device.
    fn position(&self) -> Duration;

    /// Starts or continues output.
    fn play(&mut self) -> Result<()>;

    /// Holds output at the current position.
    fn pause(&mut self) -> Result<()>;

    /// Whether the end of the track has been reached.
    fn is_finished(&self) -> bool;
}
