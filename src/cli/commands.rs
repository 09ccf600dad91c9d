use std::sync::Arc;

use crate::app::{AppContext, NotifierError, Result};
use crate::cli::{Cli, Commands};
use crate::config::{parse_interval, Config};
use crate::daemon::Daemon;
use crate::domain::SubscriberId;

/// Load the config file and apply command-line overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let mut config =
        Config::load(cli.config.as_deref()).map_err(|e| NotifierError::Config(e.to_string()))?;
    apply_overrides(cli, &mut config)?;
    Ok(config)
}

fn apply_overrides(cli: &Cli, config: &mut Config) -> Result<()> {
    if let Some(db) = &cli.db {
        config.database_path = Some(db.clone());
    }
    if let Some(workers) = cli.workers {
        config.monitor.workers = workers;
    }
    if let Commands::Run { interval, jitter } = &cli.command {
        if let Some(interval) = interval {
            config.monitor.base_interval_secs =
                parse_interval(interval).map_err(NotifierError::InvalidInput)?;
        }
        if let Some(jitter) = jitter {
            config.monitor.jitter_secs = parse_interval(jitter).map_err(NotifierError::InvalidInput)?;
        }
    }
    Ok(())
}

pub async fn run(ctx: Arc<AppContext>) -> Result<()> {
    Daemon::new(ctx).run().await
}

pub fn list(ctx: &AppContext, subscriber_id: SubscriberId) -> Result<()> {
    let subscriber = ctx.registry.get_or_create(subscriber_id)?;
    println!("{}", subscriber.handle_list());
    Ok(())
}

pub async fn subscribe(ctx: &AppContext, subscriber_id: SubscriberId, url: &str) -> Result<()> {
    let subscriber = ctx.registry.get_or_create(subscriber_id)?;
    println!("{}", subscriber.handle_subscribe(url).await);
    Ok(())
}

pub async fn unsubscribe(ctx: &AppContext, subscriber_id: SubscriberId, index: &str) -> Result<()> {
    let subscriber = ctx.registry.get_or_create(subscriber_id)?;
    println!("{}", subscriber.handle_unsubscribe(index).await);
    Ok(())
}
