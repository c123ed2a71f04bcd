//! Configuration management for clipdeck.
//!
//! Loads application settings from TOML and resolves the directories the app
//! reads and writes: config, data (store and recordings) and exports.

pub mod file;

pub use file::{
    config_dir, config_path, data_dir, recordings_dir, AudioConfig, ClipdeckConfig, ShareConfig,
    TrimConfig,
};
