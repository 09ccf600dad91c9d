pub mod sqlite;

use std::collections::HashMap;

use crate::app::Result;
use crate::domain::{Source, SubscriberId};

pub use sqlite::SqliteStore;

/// Durable record of which items were already delivered to which subscriber.
///
/// Marks are monotonic: once delivered, an item never becomes undelivered.
pub trait DeliveryLedger {
    fn has_delivered(&self, subscriber_id: SubscriberId, item_id: &str) -> Result<bool>;
    /// Marking an empty slice is a no-op.
    fn mark_delivered(&self, subscriber_id: SubscriberId, item_ids: &[String]) -> Result<()>;
}

/// Durable mapping from subscriber to the feeds they follow.
pub trait SubscriptionStore {
    // Subscriber directory
    fn add_subscriber(&self, subscriber_id: SubscriberId) -> Result<()>;
    fn get_subscribers(&self) -> Result<Vec<SubscriberId>>;

    // Sources, keyed by source id
    fn get_sources(&self, subscriber_id: SubscriberId) -> Result<HashMap<String, Source>>;
    /// Replaces the full source set of `subscriber_id`.
    fn save_sources(
        &self,
        subscriber_id: SubscriberId,
        sources: &HashMap<String, Source>,
    ) -> Result<()>;

    /// Number of subscribers following `link`.
    fn subscribe_count(&self, link: &str) -> Result<i64>;
}
