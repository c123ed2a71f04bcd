//! clipdeck: record, trim, store and replay short audio clips from the terminal.

mod app;
mod bridge;
mod commands;
mod config;
mod error;
mod logging;
mod recording;
mod session;
mod setup;
mod share;
mod store;
mod trim;
mod ui;

#[tokio::main]
async fn main() {
    if let Err(e) = app::run().await {
        tracing::error!("{e:#}");
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
