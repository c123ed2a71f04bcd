//! Screens shared by the recorder and the recordings list.

pub mod error;

pub use error::{render_alert, show_alert, wait_for_key, ErrorScreen};
