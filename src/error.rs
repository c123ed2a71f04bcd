//! Typed errors for the trim operation and the bridge facade.
//!
//! Command handlers work with `anyhow`; these enums exist where callers need to
//! tell failures apart (an invalid trim window versus a broken container, a
//! busy device versus a failed share).

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while cutting a window out of a recording.
#[derive(Debug, Error)]
pub enum TrimError {
    /// The requested window is empty, reversed or not a finite, non-negative range.
    #[error("Start must be less than end (start {start}s, end {end}s)")]
    InvalidWindow {
        /// Requested window start in seconds.
        start: f64,
        /// Requested window end in seconds.
        end: f64,
    },

    /// The source container does not carry any audio track.
    #[error("No audio track in {path}")]
    NoTrack {
        /// Source file that was opened.
        path: PathBuf,
    },

    /// Reading or writing the WAV container failed.
    #[error("Container error: {0}")]
    Container(#[from] hound::Error),

    /// Filesystem failure outside the container layer.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by [`crate::bridge::Bridge`] calls.
#[derive(Debug, Error)]
pub enum BridgeError {
    /// Trimming failed; carries the underlying message.
    #[error("TRIM_ERROR: {message}")]
    Trim {
        /// Human readable reason.
        message: String,
    },

    /// Exporting or handing the file to the system failed.
    #[error("SHARE_ERROR: {message}")]
    Share {
        /// Human readable reason.
        message: String,
    },

    /// The other device is active and the two must never run together.
    #[error("Cannot {action} while {active} is active")]
    Busy {
        /// The call that was rejected.
        action: &'static str,
        /// The device currently holding the session.
        active: &'static str,
    },

    /// A playback control was issued with no player loaded.
    #[error("Nothing is playing")]
    NotPlaying,

    /// The playback device could not load or start the file.
    #[error("Playback failed: {message}")]
    Playback {
        /// Human readable reason.
        message: String,
    },
}

impl From<TrimError> for BridgeError {
    fn from(err: TrimError) -> Self {
        BridgeError::Trim {
            message: err.to_string(),
        }
    }
}
