use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::app::Result;
use crate::domain::SubscriberId;
use crate::subscription::{Services, SubscriptionContext};

/// Process-wide cache of subscriber contexts.
///
/// Contexts are created on first access and live as long as the registry.
pub struct SubscriberRegistry {
    services: Services,
    contexts: Mutex<HashMap<SubscriberId, Arc<SubscriptionContext>>>,
}

impl SubscriberRegistry {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// The context of `subscriber_id`, recording the subscriber on first sight.
    pub fn get_or_create(&self, subscriber_id: SubscriberId) -> Result<Arc<SubscriptionContext>> {
        let mut contexts = self
            .contexts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let Some(ctx) = contexts.get(&subscriber_id) {
            return Ok(ctx.clone());
        }

        self.services.store.add_subscriber(subscriber_id)?;

        let ctx = Arc::new(SubscriptionContext::new(
            subscriber_id,
            self.services.clone(),
        ));
        contexts.insert(subscriber_id, ctx.clone());

        Ok(ctx)
    }

    pub fn len(&self) -> usize {
        self.contexts
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Load every known subscriber and re-register their sources with the monitor.
    ///
    /// Returns the number of restored sources.
    pub fn restore_all(&self) -> Result<usize> {
        let subscribers = self.services.store.get_subscribers()?;
        let mut restored = 0;

        for subscriber_id in &subscribers {
            restored += self.get_or_create(*subscriber_id)?.restore()?;
        }

        info!(
            "Restored {} subscriptions for {} subscribers",
            restored,
            subscribers.len()
        );

        Ok(restored)
    }
}
