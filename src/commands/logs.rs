//! Display recent log entries.

use crate::logging::{log_dir, LOG_FILE_PREFIX};
use anyhow::anyhow;
use std::fs;
use std::path::{Path, PathBuf};

const DEFAULT_LINES: usize = 50;

/// Prints the last lines of the newest log file.
///
/// # Errors
/// - If the log directory cannot be determined
/// - If the log file cannot be read
pub fn handle_logs() -> anyhow::Result<()> {
    let dir = log_dir()?;

    if !dir.exists() {
        println!("Log directory does not exist yet: {}", dir.display());
        println!("Logs will be created when the application runs.");
        return Ok(());
    }

    let Some(log_file) = find_latest_log(&dir)? else {
        println!("No log files found in: {}", dir.display());
        println!("Run 'clipdeck' or other commands to generate logs.");
        return Ok(());
    };

    let content =
        fs::read_to_string(&log_file).map_err(|e| anyhow!("Failed to read log file: {e}"))?;
    if content.is_empty() {
        println!("Log file is empty: {}", log_file.display());
        return Ok(());
    }

    let lines = tail(&content, DEFAULT_LINES);
    println!();
    if lines.len() < content.lines().count() {
        println!(
            "Showing last {} of {} lines:",
            lines.len(),
            content.lines().count()
        );
    } else {
        println!("Showing all {} lines:", lines.len());
    }
    println!("Full log file at: {}", log_file.display());
    println!();

    for line in lines {
        println!("{line}");
    }
    Ok(())
}

/// The last `count` lines of `content`.
fn tail(content: &str, count: usize) -> Vec<&str> {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(count);
    lines[start..].to_vec()
}

/// Most recently modified file whose name starts with the log prefix.
fn find_latest_log(dir: &Path) -> anyhow::Result<Option<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| anyhow!("Failed to read log directory: {e}"))?;

    let latest = entries
        .filter_map(|entry| {
            let path = entry.ok()?.path();
            let name = path.file_name()?.to_str()?;
            if !name.starts_with(LOG_FILE_PREFIX) {
                return None;
            }
            let modified = fs::metadata(&path).ok()?.modified().ok()?;
            Some((path, modified))
        })
        .max_by_key(|(_, modified)| *modified)
        .map(|(path, _)| path);

    Ok(latest)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tail_keeps_last_lines() {
        assert_eq!(tail("a\nb\nc", 2), vec!["b", "c"]);
        assert_eq!(tail("a\nb", 5), vec!["a", "b"]);
        assert!(tail("", 3).is_empty());
    }

    #[test]
    fn test_find_latest_log_ignores_other_files() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_latest_log(dir.path()).unwrap(), None);

        fs::write(dir.path().join("notes.txt"), "x").unwrap();
        fs::write(dir.path().join("clipdeck.log.2026-10-19"), "line").unwrap();

        let latest = find_latest_log(dir.path()).unwrap().unwrap();
        assert!(latest.ends_with("clipdeck.log.2026-10-19"));
    }
}
