//! Opens the clipdeck configuration file in the user's editor.

use crate::config::config_path;
use std::process::Command;

/// Opens the configuration file in `$EDITOR`, falling back to nano, then vi.
///
/// # Errors
/// - If no editor can be found or executed
pub fn handle_config() -> anyhow::Result<()> {
    let path = config_path()?;
    tracing::info!("Opening config file: {}", path.display());

    let editor = find_editor()?;
    tracing::debug!("Using editor: {}", editor);

    let status = Command::new(&editor).arg(&path).status().map_err(|e| {
        anyhow::anyhow!(
            "Failed to open editor '{editor}': {e}. Make sure the editor is installed and accessible."
        )
    })?;

    if !status.success() {
        return Err(anyhow::anyhow!(
            "Editor exited with error code: {}",
            status.code().unwrap_or(-1)
        ));
    }

    // Surface mistakes now rather than on the next recording
    if let Err(e) = crate::config::ClipdeckConfig::load() {
        eprintln!("Warning: {e:#}");
    }
    Ok(())
}

fn find_editor() -> anyhow::Result<String> {
    if let Some(editor) = std::env::var("EDITOR").ok().filter(|e| !e.is_empty()) {
        return Ok(editor);
    }

    ["nano", "vi"]
        .into_iter()
        .find(|editor| is_editor_available(editor))
        .map(str::to_string)
        .ok_or_else(|| anyhow::anyhow!("No editor found. Please set the $EDITOR environment variable."))
}

fn is_editor_available(editor: &str) -> bool {
    Command::new("which")
        .arg(editor)
        .output()
        .map(|output| output.status.success())
        .unwrap_or(false)
}
