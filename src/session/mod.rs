//! Recorder session state: what the controls show and which transitions are allowed.

pub mod clock;
pub mod labels;
pub mod state;

pub use clock::{ElapsedClock, PlaybackClock};
pub use labels::{format_mmss, mic_label, play_label, sanitize_file_name};
pub use state::{MicAction, RecorderState, SessionMachine, SessionView, StopAction};
