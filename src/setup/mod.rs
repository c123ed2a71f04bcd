//! First-run setup.
//!
//! Writes the default configuration file and creates the data directories the
//! store and the recorder write into.

pub mod version;

use std::path::Path;

/// Embedded default configuration template.
pub(crate) const DEFAULT_CONFIG: &str = include_str!("../../environments/clipdeck.toml");

/// Current application version from Cargo.toml
const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Writes the default config to `config_path` and creates `recordings_dir`.
///
/// An existing config file is left alone; only its version line is bumped by
/// the caller.
///
/// # Errors
/// Returns an error if any file operations fail.
pub fn run_setup(config_path: &Path, recordings_dir: &Path) -> anyhow::Result<()> {
    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    if !config_path.exists() {
        let full_config = format!(r#"config_version = "{CURRENT_VERSION}""#) + "\n" + DEFAULT_CONFIG;
        std::fs::write(config_path, full_config)?;
        tracing::info!("Wrote default config to {}", config_path.display());
    }

    std::fs::create_dir_all(recordings_dir)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setup_writes_versioned_config_once() {
        let dir = tempfile::tempdir().unwrap();
        let config_path = dir.path().join("config").join("clipdeck.toml");
        let recordings = dir.path().join("data").join("recordings");

        run_setup(&config_path, &recordings).unwrap();
        let written = std::fs::read_to_string(&config_path).unwrap();
        assert!(written.starts_with(&format!(r#"config_version = "{CURRENT_VERSION}""#)));
        assert!(recordings.is_dir());

        std::fs::write(&config_path, "[audio]\ndevice = \"mine\"\nsample_rate = 8000\n").unwrap();
        run_setup(&config_path, &recordings).unwrap();
        assert!(std::fs::read_to_string(&config_path).unwrap().contains("mine"));
    }
}
