//! Lifecycle events emitted by the recording service.
//!
//! Events travel over a broadcast channel handed to the service when it is
//! built, so any number of listeners (the recorder screen, a CLI command, tests)
//! can follow a recording without the service knowing about them.

use std::path::{Path, PathBuf};
use tokio::sync::broadcast;

/// Event published by [`super::RecordingService`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecorderEvent {
    /// Capture device opened and writing to `file_path`
    Started { file_path: PathBuf },
    /// Capture suspended, file kept open
    Paused { file_path: PathBuf },
    /// Capture continues into the same file
    Resumed { file_path: PathBuf },
    /// File finalized and device released
    Stopped { file_path: PathBuf },
    /// Periodic tick carrying active seconds recorded so far
    Progress { elapsed: u64, file_path: PathBuf },
    /// The capture device could not be opened; the attempt was abandoned
    Failed { file_path: PathBuf, message: String },
}

impl RecorderEvent {
    /// Stable event name, used in logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "onRecordingStarted",
            Self::Paused { .. } => "onRecordingPaused",
            Self::Resumed { .. } => "onRecordingResumed",
            Self::Stopped { .. } => "onRecordingStopped",
            Self::Progress { .. } => "onRecordingProgress",
            Self::Failed { .. } => "onRecordingFailed",
        }
    }

    /// The recording file every event refers to.
    pub fn file_path(&self) -> &Path {
        match self {
            Self::Started { file_path }
            | Self::Paused { file_path }
            | Self::Resumed { file_path }
            | Self::Stopped { file_path }
            | Self::Progress { file_path, .. }
            | Self::Failed { file_path, .. } => file_path,
        }
    }
}

/// Sending half of the event stream, cloned into the service and its ticker.
#[derive(Debug, Clone)]
pub struct EventSink {
    sender: broadcast::Sender<RecorderEvent>,
}

impl EventSink {
    /// Creates a sink buffering up to `capacity` events per lagging listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Publishes an event. Having no listeners is not an error.
    pub fn emit(&self, event: RecorderEvent) {
        let name = event.name();
        if self.sender.send(event).is_err() {
            tracing::trace!("{} dropped: no listeners", name);
        }
    }

    /// Opens a new listener receiving every event emitted from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<RecorderEvent> {
        self.sender.subscribe()
    }
}
