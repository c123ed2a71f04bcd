//! Persistent recordings list and its interactive browser.

pub mod recordings;
pub mod storage;
pub mod ui;

pub use recordings::{RecordingItem, RecordingStore};
