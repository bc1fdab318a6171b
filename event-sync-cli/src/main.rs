mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "event-sync")]
#[command(about = "Propagate Event changes between the local content store and the remote CRM")]
struct Cli {
    /// Config file to use instead of ~/.config/event-sync/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Push a saved local record to the remote store
    LocalSaved {
        id: u64,

        /// The record was just created
        #[arg(long)]
        new: bool,
    },
    /// Delete a local record and its remote counterpart
    LocalDeleted { id: u64 },
    /// Materialize a saved remote event locally
    RemoteSaved {
        /// JSON file holding the remote event values
        #[arg(long)]
        payload: PathBuf,

        /// The event was just created
        #[arg(long)]
        new: bool,
    },
    /// Delete every local record linked to a removed remote event
    RemoteDeleted { id: u64 },
    /// Look up recorded links (side: local/drupal/nid or remote/civicrm/cid)
    Xref { side: String, id: u64 },
    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = cli.config.as_deref();

    match cli.command {
        Commands::LocalSaved { id, new } => commands::local::saved(config, id, new).await,
        Commands::LocalDeleted { id } => commands::local::deleted(config, id).await,
        Commands::RemoteSaved { payload, new } => {
            commands::remote::saved(config, &payload, new).await
        }
        Commands::RemoteDeleted { id } => commands::remote::deleted(config, id).await,
        Commands::Xref { side, id } => commands::xref::run(config, &side, id),
        Commands::Config => commands::config::run(config),
    }
}
