use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use crate::domain::Item;

/// A parsed feed document as returned by a fetcher.
#[derive(Debug, Clone)]
pub struct FetchedFeed {
    /// The URL the feed was fetched from
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// The site link the feed advertises about itself
    pub link: Option<String>,
    /// Oldest first
    pub items: Vec<Item>,
}

impl FetchedFeed {
    /// Identity of the feed, stable across the different URLs it may be served from.
    pub fn source_id(&self) -> String {
        let identity = self.link.as_deref().unwrap_or(&self.url);
        let mut hasher = Sha256::new();
        hasher.update(identity.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn latest_item(&self) -> Option<&Item> {
        self.items.last()
    }
}

/// One feed followed by one subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub id: String,
    /// The URL that gets polled
    pub link: String,
    pub title: String,
    pub description: Option<String>,
    pub subscribed_at: DateTime<Utc>,
}

impl Source {
    pub fn from_feed(feed: &FetchedFeed) -> Self {
        Self {
            id: feed.source_id(),
            link: feed.url.clone(),
            title: feed.title.clone().unwrap_or_default(),
            description: feed.description.clone(),
            subscribed_at: Utc::now(),
        }
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.link
        } else {
            &self.title
        }
    }
}
