use std::sync::Arc;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feed_notifier::app::AppContext;
use feed_notifier::cli::{commands, Cli, Commands};
use feed_notifier::notifier::ConsoleNotifier;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries replies and notifications
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let config = commands::load_config(&cli)?;
    let ctx = AppContext::new(config, Arc::new(ConsoleNotifier))?;

    match cli.command {
        Commands::Run { .. } => {
            commands::run(Arc::new(ctx)).await?;
        }
        Commands::List { subscriber } => {
            commands::list(&ctx, subscriber)?;
        }
        Commands::Subscribe { subscriber, url } => {
            commands::subscribe(&ctx, subscriber, &url).await?;
        }
        Commands::Unsubscribe { subscriber, index } => {
            commands::unsubscribe(&ctx, subscriber, &index).await?;
        }
    }

    Ok(())
}
