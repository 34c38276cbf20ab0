use std::sync::Arc;

use anyhow::Result;
use cirrus_server::{manifest, register, OrgConfig};
use cirrus_store::{ObjectStore, RestStore};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "cirrus-server", version, about = "Cloud code webhooks for a Cirrus organisation")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve the webhook, health and template routes (default)
    Serve,
    /// Print the hosted platform options as JSON
    Manifest,
    /// Register every function and trigger webhook with the hosted platform
    RegisterWebhooks,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = Arc::new(OrgConfig::from_env()?);
    let rest = Arc::new(RestStore::new(
        config.parse_server_url.clone(),
        config.app_id.clone(),
        config.master_key.clone(),
    ));

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let store: Arc<dyn ObjectStore> = rest;
            let ax = cirrus_server::build(Arc::clone(&config), store)?;
            info!(
                organisation = %config.organisation_id,
                store = %config.parse_server_url,
                "cloud code loaded"
            );
            ax.listen(config.listen_addr()).await?;
        }
        Command::Manifest => {
            println!("{}", serde_json::to_string_pretty(&manifest::manifest(&config))?);
        }
        Command::RegisterWebhooks => {
            let store: Arc<dyn ObjectStore> = rest.clone();
            let ax = cirrus_server::build(Arc::clone(&config), store)?;
            register::register_webhooks(&config, &ax.app, &rest).await?;
        }
    }

    Ok(())
}
