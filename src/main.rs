use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use newswire::app::AppContext;
use newswire::cli::{commands, Cli, Commands};
use newswire::config::{self, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("newswire=info")))
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    };
    let config = config.inspect_err(|e| tracing::error!(error = %e, "cannot load configuration"))?;

    let ctx = AppContext::new(config)
        .inspect_err(|e| tracing::error!(error = %e, "cannot open article store"))?;

    match cli.command {
        Commands::Serve {
            interval,
            stdin_bus,
            api_base,
        } => {
            let interval = interval
                .map(|raw| config::parse_poll_interval(&raw).map_err(anyhow::Error::msg))
                .transpose()
                .context("invalid --interval")?;
            commands::serve(ctx, interval, stdin_bus, api_base.as_deref()).await?;
        }
        Commands::Update => {
            commands::update_sources(&ctx).await?;
        }
        Commands::List { n, page } => {
            commands::list_articles(&ctx, n, page)?;
        }
        Commands::Search { text, page } => {
            commands::search_articles(&ctx, &text, page)?;
        }
    }

    Ok(())
}
