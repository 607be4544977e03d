//! tenure - membership retention admin CLI

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod cli;
mod commands;

use cli::{Cli, Commands};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("tenure=warn".parse()?))
        .init();

    let cli = Cli::parse();
    let api = api::ApiClient::new(&cli.url)?;

    match cli.command {
        Commands::Members { search, json } => {
            commands::members::execute(&api, search.as_deref(), json).await
        }
        Commands::Policy { id, policy } => commands::policy::execute(&api, id, &policy).await,
        Commands::Remove { id } => commands::remove::execute(&api, id).await,
        Commands::Sync => commands::sync::execute(&api).await,
        Commands::Status { json } => commands::status::execute(&api, json).await,
    }
}
