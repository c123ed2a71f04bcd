//! Remove a stored recording.

use cliclack::{confirm, outro, outro_cancel};

/// Deletes recording `index` (1 = newest) and its audio file.
///
/// Asks for confirmation unless `yes` is set.
///
/// # Errors
/// - If the recording does not exist
/// - If the prompt or the store fails
pub fn handle_delete(index: usize, yes: bool) -> anyhow::Result<()> {
    let mut store = super::open_store()?;
    let item = store.by_index(index)?.clone();

    if !yes {
        let confirmed = confirm(format!("Delete \"{}\"?", item.display_name()))
            .initial_value(false)
            .interact()?;
        if !confirmed {
            outro_cancel("Kept")?;
            return Ok(());
        }
    }

    store.remove_at(index - 1)?;
    tracing::info!("Deleted recording {}", item.id);
    if yes {
        println!("Deleted \"{}\"", item.display_name());
    } else {
        outro(format!("Deleted \"{}\"", item.display_name()))?;
    }
    Ok(())
}
