//! Structured logging for clipdeck using the tracing crate.
//!
//! Logs go to a daily-rotated file under the XDG state directory and never to
//! the terminal, which belongs to the recorder screen. Only the seven newest
//! log files are kept.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing_appender::rolling;
use tracing_subscriber::prelude::*;

/// Log file name prefix; the appender adds a `.YYYY-MM-DD` suffix.
pub const LOG_FILE_PREFIX: &str = "clipdeck.log";

/// Number of daily log files kept.
const MAX_LOG_FILES: usize = 7;

/// Keeps the non-blocking writer alive for the program lifetime.
static APPENDER_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// Initializes file logging.
///
/// Log level is controlled by `RUST_LOG` (defaults to "info").
///
/// # Errors
/// - If the log directory cannot be determined or created
/// - If logging was already initialized
pub fn init_logging() -> Result<(), anyhow::Error> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)?;

    if let Err(e) = cleanup_old_logs(&log_dir) {
        eprintln!("Warning: Failed to cleanup old logs: {e}");
    }

    let file_appender = rolling::daily(&log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    APPENDER_GUARD
        .set(guard)
        .map_err(|_| anyhow::anyhow!("Logging already initialized"))?;

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_ansi(false),
        )
        .init();

    tracing::debug!("Logging initialized. Log dir: {}", log_dir.display());
    Ok(())
}

/// `$XDG_STATE_HOME/clipdeck`, or `~/.local/state/clipdeck`.
///
/// # Errors
/// - If the home directory cannot be determined
pub fn log_dir() -> Result<PathBuf, anyhow::Error> {
    if let Ok(xdg_state) = std::env::var("XDG_STATE_HOME") {
        if !xdg_state.is_empty() {
            return Ok(PathBuf::from(xdg_state).join("clipdeck"));
        }
    }
    let home =
        dirs::home_dir().ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?;
    Ok(home.join(".local").join("state").join("clipdeck"))
}

/// Whether `file_name` is a rotated log file (`clipdeck.log.YYYY-MM-DD`).
fn is_rotated_log(file_name: &str) -> bool {
    file_name
        .strip_prefix(LOG_FILE_PREFIX)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|date| date.matches('-').count() == 2)
}

/// Removes all but the newest [`MAX_LOG_FILES`] rotated log files.
fn cleanup_old_logs(log_dir: &Path) -> Result<(), anyhow::Error> {
    let mut log_files: Vec<_> = fs::read_dir(log_dir)?
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            if !is_rotated_log(name) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .collect();

    log_files.sort_by(|a, b| b.1.cmp(&a.1));

    for (path, _) in log_files.iter().skip(MAX_LOG_FILES) {
        if let Err(e) = fs::remove_file(path) {
            tracing::warn!("Failed to delete old log file {}: {}", path.display(), e);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotated_log_names() {
        assert!(is_rotated_log("clipdeck.log.2026-10-19"));
        assert!(!is_rotated_log("clipdeck.log"));
        assert!(!is_rotated_log("other.log.2026-10-19"));
    }

    #[test]
    fn test_cleanup_keeps_seven_newest() {
        let dir = tempfile::tempdir().unwrap();
        for day in 1..=9 {
            fs::write(dir.path().join(format!("clipdeck.log.2026-10-0{day}")), "x").unwrap();
        }
        fs::write(dir.path().join("notes.txt"), "keep").unwrap();

        cleanup_old_logs(dir.path()).unwrap();

        let remaining: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| is_rotated_log(&e.file_name().to_string_lossy()))
            .collect();
        assert_eq!(remaining.len(), 7);
        assert!(dir.path().join("notes.txt").exists());
    }
}
