//! Display helpers for the recorder controls.

use super::state::RecorderState;

/// Formats whole seconds as `MM:SS`. Minutes are not wrapped at an hour.
pub fn format_mmss(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

/// Label of the microphone button.
pub fn mic_label(state: RecorderState) -> &'static str {
    match state {
        RecorderState::Recording => "Pause",
        RecorderState::Paused => "Resume",
        _ => "Start",
    }
}

/// Label of the play button.
pub fn play_label(state: RecorderState) -> &'static str {
    match state {
        RecorderState::Playing => "Pause",
        _ => "Play",
    }
}

/// Replaces characters that are unsafe in exported file names with `_`.
pub fn sanitize_file_name(name: &str) -> String {
    name.replace([':', '/', '\\', ',', ' '], "_")
}
