use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    load_settings, ImportOrchestrator, NotificationPresenter, NotificationSurface,
    UpdateOrchestrator,
};
use shared::domain::{AppId, ImportOutcome};
use tracing_subscriber::EnvFilter;

mod host;
mod terminal;

use host::{LocalHost, SimulatedRelease};
use terminal::TerminalSurface;

#[derive(Parser, Debug)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check for an update and walk through download, install and relaunch.
    Update {
        /// Pretend this version is published.
        #[arg(long)]
        offer_version: Option<String>,
        #[arg(long, default_value = "Bug fixes and improvements")]
        notes: String,
        #[arg(long, default_value_t = 4 * 1024 * 1024)]
        download_size: u64,
    },
    /// Import screenshots for a game.
    Import {
        #[arg(long)]
        app_id: u32,
        /// Skip the native picker and import these files.
        files: Vec<String>,
    },
    /// Entry point after a successful relaunch.
    #[command(hide = true)]
    Relaunched,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let settings = load_settings();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_filter.as_str()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    let args = Args::parse();

    let surface: Arc<dyn NotificationSurface> = Arc::new(TerminalSurface::new());
    let presenter = NotificationPresenter::new(surface);

    match args.command {
        Command::Update {
            offer_version,
            notes,
            download_size,
        } => {
            let release = offer_version.map(|version| SimulatedRelease {
                version,
                notes,
                download_size,
            });
            let host = Arc::new(LocalHost::new(release, Vec::new()));
            let mut updater = UpdateOrchestrator::new(host, presenter);
            let phase = updater.run_update_check().await?;
            println!("Update check finished in phase {phase:?}");
        }
        Command::Import { app_id, files } => {
            let host = Arc::new(LocalHost::new(None, files));
            let mut importer = ImportOrchestrator::new(host, presenter).with_settings(&settings);
            match importer.import_screenshots(AppId(app_id)).await? {
                ImportOutcome::Succeeded { imported } => {
                    println!("Imported {imported} screenshots for app {app_id}")
                }
                ImportOutcome::Failed { message } => println!("Import failed: {message}"),
                ImportOutcome::NoSelection => println!("Nothing imported"),
            }
        }
        Command::Relaunched => {
            tracing::info!("relaunched after update");
            println!("Relaunched after update.");
        }
    }

    Ok(())
}
