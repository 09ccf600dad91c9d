use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::app::{NotifierError, Result};
use crate::domain::{FetchedFeed, Item, Source, SubscriberId};
use crate::fetcher::FeedFetcher;
use crate::monitor::{Monitor, Observer};
use crate::notifier::Notifier;
use crate::store::{DeliveryLedger, SubscriptionStore};
use crate::subscription::DeliveryHandler;

/// Collaborators shared by every subscriber context.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn SubscriptionStore + Send + Sync>,
    pub ledger: Arc<dyn DeliveryLedger + Send + Sync>,
    pub fetcher: Arc<dyn FeedFetcher + Send + Sync>,
    pub notifier: Arc<dyn Notifier + Send + Sync>,
    pub monitor: Arc<Monitor>,
}

/// One subscriber's view of the system.
///
/// Binds the subscriber's persisted sources to their monitor registrations.
pub struct SubscriptionContext {
    subscriber_id: SubscriberId,
    services: Services,
    // Serialises read-modify-write of this subscriber's source set
    mutation: Mutex<()>,
}

impl SubscriptionContext {
    pub fn new(subscriber_id: SubscriberId, services: Services) -> Self {
        Self {
            subscriber_id,
            services,
            mutation: Mutex::new(()),
        }
    }

    pub fn subscriber_id(&self) -> SubscriberId {
        self.subscriber_id
    }

    /// Fetch `url` once and subscribe to it.
    pub async fn subscribe(&self, url: &str) -> Result<(Source, Vec<Item>)> {
        let feed = self.services.fetcher.fetch(url).await?;
        self.subscribe_feed(feed).await
    }

    /// Subscribe to an already fetched feed.
    ///
    /// Every item currently in the feed is marked delivered, so only items
    /// published afterwards are sent. Returns the new source and those items.
    pub async fn subscribe_feed(&self, feed: FetchedFeed) -> Result<(Source, Vec<Item>)> {
        let _guard = self.mutation.lock().await;
        let store = &self.services.store;

        let mut sources = store.get_sources(self.subscriber_id)?;
        let source = Source::from_feed(&feed);

        if let Some(existing) = sources.get(&source.id) {
            return Err(NotifierError::AlreadySubscribed {
                title: existing.display_title().to_string(),
                link: existing.link.clone(),
            });
        }

        sources.insert(source.id.clone(), source.clone());
        store.save_sources(self.subscriber_id, &sources)?;

        let backlog: Vec<String> = feed.items.iter().map(|item| item.id.clone()).collect();
        if let Err(e) = self.services.ledger.mark_delivered(self.subscriber_id, &backlog) {
            // Without the backlog marked the first poll would flood the subscriber
            sources.remove(&source.id);
            if let Err(rollback) = store.save_sources(self.subscriber_id, &sources) {
                warn!(
                    "Failed to roll back subscription {} for {}: {}",
                    source.link, self.subscriber_id, rollback
                );
            }
            return Err(e);
        }

        self.services.monitor.observe(self.observer(&source));

        info!(
            "Subscriber {} subscribed to {} ({} items already present)",
            self.subscriber_id,
            source.link,
            backlog.len()
        );

        Ok((source, feed.items))
    }

    /// Remove the source with `source_id` and stop observing its link.
    ///
    /// A poll already in flight for that link may still reach this
    /// subscriber once; the ledger keeps it from sending anything twice.
    pub async fn unsubscribe(&self, source_id: &str) -> Result<Source> {
        let _guard = self.mutation.lock().await;
        let store = &self.services.store;

        let mut sources = store.get_sources(self.subscriber_id)?;
        let source = sources
            .remove(source_id)
            .ok_or_else(|| NotifierError::NotFound(format!("Subscription {}", source_id)))?;

        store.save_sources(self.subscriber_id, &sources)?;

        if !sources.values().any(|s| s.link == source.link) {
            self.services
                .monitor
                .remove_observer(self.subscriber_id, &source.link);
        }

        info!(
            "Subscriber {} unsubscribed from {}",
            self.subscriber_id, source.link
        );

        Ok(source)
    }

    /// Sources ordered by subscription time, oldest first.
    pub fn list_sources(&self) -> Result<Vec<Source>> {
        let mut sources: Vec<Source> = self
            .services
            .store
            .get_sources(self.subscriber_id)?
            .into_values()
            .collect();

        sources.sort_by(|a, b| {
            a.subscribed_at
                .cmp(&b.subscribed_at)
                .then_with(|| a.id.cmp(&b.id))
        });

        Ok(sources)
    }

    /// Re-register observers for all persisted sources, e.g. after a restart.
    pub fn restore(&self) -> Result<usize> {
        let sources = self.list_sources()?;

        for source in &sources {
            self.services.monitor.observe(self.observer(source));
        }

        Ok(sources.len())
    }

    fn observer(&self, source: &Source) -> Observer {
        Observer {
            subscriber_id: self.subscriber_id,
            link: source.link.clone(),
            handler: Arc::new(DeliveryHandler::new(
                self.subscriber_id,
                self.services.ledger.clone(),
                self.services.notifier.clone(),
            )),
        }
    }
}
