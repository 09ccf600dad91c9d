use sha2::{Digest, Sha256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// Ledger key, unique across feeds
    pub id: String,
    pub guid: String,
    pub title: String,
    pub link: String,
}

impl Item {
    pub fn new(feed_link: &str, guid: &str, title: &str, link: &str) -> Self {
        // Feeds without guids are keyed by the entry link instead
        let guid = if guid.is_empty() { link } else { guid };
        Self {
            id: Self::generate_id(feed_link, guid),
            guid: guid.to_string(),
            title: title.to_string(),
            link: link.to_string(),
        }
    }

    /// Generate a deterministic ID from feed link and entry guid.
    ///
    /// Guids are only unique within one feed, so the feed link is hashed in.
    pub fn generate_id(feed_link: &str, guid: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(feed_link.as_bytes());
        hasher.update(b"\0");
        hasher.update(guid.as_bytes());
        hex::encode(hasher.finalize())
    }

    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            "(Untitled)"
        } else {
            &self.title
        }
    }

    /// Notification body: a single-line `[title](link)` reference.
    pub fn message(&self) -> String {
        format!("[{}]({})", self.display_title(), self.link)
    }
}
