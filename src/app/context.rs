use std::path::PathBuf;
use std::sync::Arc;

use crate::app::error::{NotifierError, Result};
use crate::config::Config;
use crate::fetcher::{FeedFetcher, HttpFetcher};
use crate::monitor::Monitor;
use crate::notifier::Notifier;
use crate::store::SqliteStore;
use crate::subscription::{Services, SubscriberRegistry};

/// Wires the store, fetcher, monitor and subscriber registry together.
///
/// Built once at startup; every collaborator is injected from here.
pub struct AppContext {
    pub store: Arc<SqliteStore>,
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub monitor: Arc<Monitor>,
    pub registry: SubscriberRegistry,
}

impl AppContext {
    pub fn new(config: Config, notifier: Arc<dyn Notifier + Send + Sync>) -> Result<Self> {
        let db_path = match &config.database_path {
            Some(p) => p.clone(),
            None => Self::default_db_path()?,
        };

        let store = Arc::new(SqliteStore::new(&db_path)?);
        let fetcher = Arc::new(HttpFetcher::new(&config.fetcher)?);
        Ok(Self::from_parts(&config, store, fetcher, notifier))
    }

    pub fn in_memory(config: Config, notifier: Arc<dyn Notifier + Send + Sync>) -> Result<Self> {
        let store = Arc::new(SqliteStore::in_memory()?);
        let fetcher = Arc::new(HttpFetcher::new(&config.fetcher)?);
        Ok(Self::from_parts(&config, store, fetcher, notifier))
    }

    pub fn from_parts(
        config: &Config,
        store: Arc<SqliteStore>,
        fetcher: Arc<dyn FeedFetcher + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Self {
        let monitor = Arc::new(Monitor::new(fetcher.clone(), config.monitor.clone()));

        let registry = SubscriberRegistry::new(Services {
            store: store.clone(),
            ledger: store.clone(),
            fetcher,
            notifier: notifier.clone(),
            monitor: monitor.clone(),
        });

        Self {
            store,
            notifier,
            monitor,
            registry,
        }
    }

    fn default_db_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir()
            .ok_or_else(|| NotifierError::Config("Could not find data directory".into()))?;
        let app_dir = data_dir.join("feed-notifier");
        std::fs::create_dir_all(&app_dir)?;
        Ok(app_dir.join("feed-notifier.db"))
    }
}
