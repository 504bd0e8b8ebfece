use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use hnwire::app::AppContext;
use hnwire::cli::{commands, Cli, Commands};
use hnwire::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(workers) = cli.workers {
        config.api.workers = workers;
    }

    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Item { id } => {
            commands::show_item(&ctx, id).await?;
        }
        Commands::User { username } => {
            commands::show_user(&ctx, &username).await?;
        }
        Commands::Stories {
            filter,
            offset,
            limit,
        } => {
            commands::list_stories(&ctx, filter, offset, limit).await?;
        }
        Commands::Parents { id } => {
            commands::show_parents(&ctx, id).await?;
        }
        Commands::Metadata { url } => {
            commands::show_metadata(&ctx, &url).await?;
        }
    }

    Ok(())
}
