//! Scripted tray host entry point.
//!
//! Reads tray events from stdin (one per line) and drives the context menu
//! through the headless platform. See [`script`] for the line format.

mod app;
mod config;
mod features;
mod script;

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Drive a tray context menu from a line-oriented script.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Configuration file (defaults to the per-user location).
    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting traymux host");

    let config = match cli.config {
        Some(path) => config::Config::load_from(&path)?,
        None => config::Config::load()?,
    };
    tracing::info!(items = config.menu_ids().len(), "configuration loaded");

    let stdin = std::io::stdin().lock();
    let summary = app::run(&config, stdin)?;

    tracing::info!(
        activations = summary.activations,
        notifications = summary.notifications,
        auto_update = summary.auto_update,
        accent = ?summary.accent,
        exited = summary.exited,
        "host shut down cleanly"
    );
    Ok(())
}
