//! Audio capture and playback for clipdeck.
//!
//! Provides the device seams and their cpal implementations, the recording
//! service with its event stream, ffmpeg export support, and the recorder screen.

pub mod audio;
pub mod device;
pub mod events;
pub mod ffmpeg;
pub mod playback;
pub mod service;
pub mod ui;

pub use audio::CpalCapture;
pub use events::{EventSink, RecorderEvent};
pub use playback::CpalPlayback;
pub use ui::{RecorderCommand, RecorderTui};
