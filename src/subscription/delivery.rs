use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::domain::{Item, SubscriberId};
use crate::monitor::ItemHandler;
use crate::notifier::Notifier;
use crate::store::DeliveryLedger;

/// Sends a subscriber every item the ledger has not seen yet.
///
/// The ledger, not the monitor registration, decides whether an item goes
/// out, so a callback that fires once more after unsubscribe, or a link
/// pulled twice in quick succession, sends nothing new.
pub struct DeliveryHandler {
    subscriber_id: SubscriberId,
    ledger: Arc<dyn DeliveryLedger + Send + Sync>,
    notifier: Arc<dyn Notifier + Send + Sync>,
}

impl DeliveryHandler {
    pub fn new(
        subscriber_id: SubscriberId,
        ledger: Arc<dyn DeliveryLedger + Send + Sync>,
        notifier: Arc<dyn Notifier + Send + Sync>,
    ) -> Self {
        Self {
            subscriber_id,
            ledger,
            notifier,
        }
    }
}

#[async_trait]
impl ItemHandler for DeliveryHandler {
    async fn on_items(&self, link: &str, items: &[Item]) {
        let mut sent = 0;

        for item in items {
            match self.ledger.has_delivered(self.subscriber_id, &item.id) {
                Ok(true) => continue,
                Ok(false) => {}
                Err(e) => {
                    error!(
                        "Ledger read failed for subscriber {} on {}, abandoning batch: {}",
                        self.subscriber_id, link, e
                    );
                    break;
                }
            }

            if let Err(e) = self.notifier.send(self.subscriber_id, &item.message()).await {
                warn!(
                    "Failed to notify subscriber {} about {}: {}",
                    self.subscriber_id, item.link, e
                );
            }

            if let Err(e) = self
                .ledger
                .mark_delivered(self.subscriber_id, std::slice::from_ref(&item.id))
            {
                error!(
                    "Ledger write failed for subscriber {} on {}, abandoning batch: {}",
                    self.subscriber_id, link, e
                );
                break;
            }

            sent += 1;
        }

        if sent > 0 {
            info!(
                "Delivered {} new items from {} to subscriber {}",
                sent, link, self.subscriber_id
            );
        }
    }
}
