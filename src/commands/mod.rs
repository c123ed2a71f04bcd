//! Application command handlers for clipdeck.
//!
//! # Commands
//! - `record`: Recorder screen (default)
//! - `list`: Recordings list, interactive or plain
//! - `play`: Play a stored recording in the terminal
//! - `trim`: Cut a window out of a stored recording
//! - `delete`: Remove a stored recording and its file
//! - `share`: Export a recording and hand it to the desktop
//! - `config`: Open configuration file in user's preferred editor
//! - `list_devices`: List available audio input devices
//! - `logs`: Display recent log entries

pub mod config;
pub mod delete;
pub mod list;
pub mod list_devices;
pub mod logs;
pub mod play;
pub mod record;
pub mod share;
pub mod trim;

pub use config::handle_config;
pub use delete::handle_delete;
pub use list::handle_list;
pub use list_devices::handle_list_devices;
pub use logs::handle_logs;
pub use play::handle_play;
pub use record::handle_record;
pub use share::handle_share;
pub use trim::handle_trim;

use crate::bridge::{Bridge, BridgeOptions};
use crate::config::{data_dir, recordings_dir, ClipdeckConfig};
use crate::recording::{CpalCapture, CpalPlayback, EventSink};
use crate::store::{RecordingItem, RecordingStore};

/// Capacity of the event channel between the recording service and its listeners.
const EVENT_CAPACITY: usize = 64;

/// Builds a bridge on the configured cpal devices.
///
/// # Errors
/// - If the recordings directory cannot be determined
pub(crate) fn open_bridge(config: &ClipdeckConfig) -> anyhow::Result<Bridge> {
    let mut options = BridgeOptions::new(recordings_dir()?);
    options.frames_per_packet = config.trim.frames_per_packet;
    options.progress_interval = config.audio.progress_interval();

    Ok(Bridge::new(
        Box::new(CpalCapture::new(
            config.audio.sample_rate,
            config.audio.device.clone(),
        )),
        Box::new(CpalPlayback::new()),
        EventSink::new(EVENT_CAPACITY),
        options,
    ))
}

/// Opens the recordings store in the data directory.
///
/// # Errors
/// - If the data directory or the database cannot be opened
pub(crate) fn open_store() -> anyhow::Result<RecordingStore> {
    RecordingStore::open(&data_dir()?)
}

/// Looks up recording `index` (1 = newest) and checks its file is still on disk.
///
/// # Errors
/// - If the index is out of range
/// - If the audio file is missing
pub(crate) fn existing_recording(
    store: &RecordingStore,
    index: usize,
) -> anyhow::Result<RecordingItem> {
    let item = store.by_index(index)?.clone();
    if !item.file_path.exists() {
        return Err(anyhow::anyhow!(
            "File not found: {}",
            item.file_path.display()
        ));
    }
    Ok(item)
}
