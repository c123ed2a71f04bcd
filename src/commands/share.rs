//! Export a recording and hand it to the desktop.

use crate::bridge::Bridge;
use crate::config::{ClipdeckConfig, ShareConfig};
use crate::error::BridgeError;
use crate::share;
use crate::store::RecordingItem;
use std::path::PathBuf;

/// Exports `item` in the configured format and shares the export.
///
/// Returns the path that was shared.
///
/// # Errors
/// - `BridgeError::Share` if the export or the hand-off fails
pub(crate) async fn export_and_share(
    bridge: &Bridge,
    item: &RecordingItem,
    config: &ShareConfig,
) -> Result<PathBuf, BridgeError> {
    let export_dir = config
        .resolved_export_dir()
        .map_err(|e| BridgeError::Share {
            message: e.to_string(),
        })?;

    let owned = item.clone();
    let format = config.export_format.clone();
    let exported = tokio::task::spawn_blocking(move || {
        share::export_recording(&owned, &export_dir, &format)
    })
    .await
    .map_err(|e| BridgeError::Share {
        message: format!("Export task failed: {e}"),
    })?
    .map_err(|e| BridgeError::Share {
        message: format!("{e:#}"),
    })?;

    let mime_type = config.mime_type_for(&exported);
    bridge.share_file(&exported, &mime_type).await?;
    tracing::info!("Shared {} as {}", exported.display(), mime_type);
    Ok(exported)
}

/// Shares recording `index` (1 = newest).
///
/// # Errors
/// - If the recording does not exist or its file is missing
/// - If the export or the hand-off fails
pub async fn handle_share(config: &ClipdeckConfig, index: usize) -> anyhow::Result<()> {
    let store = super::open_store()?;
    let item = super::existing_recording(&store, index)?;
    let bridge = super::open_bridge(config)?;

    let exported = export_and_share(&bridge, &item, &config.share).await?;
    println!("Shared {}", exported.display());
    Ok(())
}
