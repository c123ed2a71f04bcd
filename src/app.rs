//! Application orchestration and command routing.
//!
//! Handles command-line argument parsing and delegates to appropriate command handlers.

use crate::commands;
use crate::config::{self, ClipdeckConfig};
use crate::logging;
use crate::setup::{self, version::SetupNeed};
use crate::ui::show_alert;
use anyhow::anyhow;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;

/// Writes the default config on first run and bumps the version line after upgrades.
fn check_and_run_setup() -> anyhow::Result<()> {
    let config_path = config::config_path()?;
    let recordings_dir = config::recordings_dir()?;

    match setup::version::check_setup_needed(&config_path)? {
        SetupNeed::UpToDate => {
            tracing::debug!("Config version up to date ({})", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        SetupNeed::Fresh => {
            tracing::info!("No config found, running first-time setup");
        }
        SetupNeed::Upgrade { from } => {
            tracing::info!(
                "Setup needed - migrating from version {} to {}",
                from,
                env!("CARGO_PKG_VERSION")
            );
        }
    }

    setup::run_setup(&config_path, &recordings_dir).map_err(|e| {
        tracing::error!("Setup failed: {e}");
        anyhow!("Setup failed: {e}")
    })?;
    setup::version::update_config_version(&config_path).map_err(|e| {
        tracing::error!("Failed to update config version: {e}");
        anyhow!("Failed to update config version: {e}")
    })?;
    Ok(())
}

/// Loads the config; the recorder screen reports failures full screen.
fn load_config(full_screen: bool) -> anyhow::Result<ClipdeckConfig> {
    ClipdeckConfig::load().or_else(|err| {
        tracing::error!("Failed to load configuration: {err:#}");
        if full_screen {
            let message = format!(
                "{err:#}\n\nPlease check your ~/.config/clipdeck/clipdeck.toml file and try again."
            );
            show_alert("Configuration Error", &message)?;
        }
        Err(anyhow!("Configuration error: {err:#}"))
    })
}

/// Record, trim, store and replay short audio clips from the terminal
#[derive(Parser)]
#[command(name = "clipdeck")]
#[command(version)]
#[command(
    long_about = "Record, trim, store and replay short audio clips from the terminal.\n\nDEFAULT COMMAND:\n    If no command is specified, 'record' is used by default.\n\nEXAMPLES:\n    # Open the recorder\n    $ clipdeck\n\n    # Browse recordings (play, trim, share, delete)\n    $ clipdeck list\n\n    # Keep seconds 1.5 to 4 of the newest recording\n    $ clipdeck trim 1 --start 1.5 --end 4\n\n    # Stop a running recording from a hotkey\n    $ pkill -USR1 clipdeck"
)]
#[command(
    after_help = "CONFIGURATION:\n    Config file:        ~/.config/clipdeck/clipdeck.toml\n    Recordings:         ~/.local/share/clipdeck/recordings\n    Logs:               ~/.local/state/clipdeck/clipdeck.log.*"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the recorder screen (default)
    ///
    /// Space starts, pauses and resumes; s stops; p plays the last take;
    /// r restarts; h opens the recordings list; Escape/q quits.
    #[command(visible_alias = "r")]
    Record,

    /// Browse saved recordings
    ///
    /// Enter plays or pauses, t trims, e shares, d deletes, Esc leaves.
    #[command(visible_alias = "ls")]
    List {
        /// Print the list instead of opening the browser
        #[arg(short, long)]
        plain: bool,
    },

    /// Play a saved recording
    #[command(visible_alias = "p")]
    Play {
        /// Recording index (1 = most recent)
        #[arg(value_name = "N")]
        index: Option<usize>,
    },

    /// Save a window of a recording as a new recording
    ///
    /// The cut is aligned to packet boundaries, so the clip may start and end
    /// slightly outside the requested window.
    Trim {
        /// Recording index (1 = most recent)
        #[arg(value_name = "N")]
        index: usize,

        /// Window start in seconds
        #[arg(short, long)]
        start: f64,

        /// Window end in seconds
        #[arg(short, long)]
        end: f64,
    },

    /// Delete a recording and its audio file
    Delete {
        /// Recording index (1 = most recent)
        #[arg(value_name = "N")]
        index: usize,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Export a recording and copy it to the clipboard
    ///
    /// Falls back to revealing the export in the file manager when no
    /// clipboard tool is available.
    Share {
        /// Recording index (1 = most recent)
        #[arg(value_name = "N")]
        index: usize,
    },

    /// Open configuration file in your preferred editor
    #[command(visible_alias = "c")]
    Config,

    /// List available audio devices
    #[command(name = "list-devices")]
    ListDevices,

    /// Show recent log entries from the application
    Logs,

    /// Generate shell completion script
    ///
    /// Examples:
    ///   clipdeck completions bash > clipdeck.bash
    ///   clipdeck completions zsh > _clipdeck
    Completions {
        /// The shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Runs the main application based on command-line arguments.
///
/// # Errors
/// - If setup fails
/// - If logging initialization fails
/// - If command execution fails
pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Commands that need neither logging nor config
    match &cli.command {
        Some(Commands::Completions { shell }) => {
            generate(*shell, &mut Cli::command(), "clipdeck", &mut io::stdout());
            return Ok(());
        }
        Some(Commands::ListDevices) => return commands::handle_list_devices(),
        Some(Commands::Logs) => return commands::handle_logs(),
        _ => {}
    }

    logging::init_logging()?;
    check_and_run_setup()?;

    match cli.command.unwrap_or(Commands::Record) {
        Commands::Record => {
            let config = load_config(true)?;
            commands::handle_record(&config).await
        }
        Commands::List { plain } => {
            let config = load_config(!plain)?;
            commands::handle_list(&config, plain).await
        }
        Commands::Play { index } => commands::handle_play(&load_config(false)?, index).await,
        Commands::Trim { index, start, end } => {
            commands::handle_trim(&load_config(false)?, index, start, end).await
        }
        Commands::Delete { index, yes } => commands::handle_delete(index, yes),
        Commands::Share { index } => commands::handle_share(&load_config(false)?, index).await,
        Commands::Config => commands::handle_config(),
        Commands::Completions { .. } | Commands::ListDevices | Commands::Logs => Ok(()),
    }
}
