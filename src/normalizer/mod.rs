use feed_rs::parser;
use html_escape::decode_html_entities;

use crate::app::{NotifierError, Result};
use crate::domain::{FetchedFeed, Item};

#[derive(Clone)]
pub struct Normalizer;

impl Default for Normalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Normalizer {
    pub fn new() -> Self {
        Self
    }

    /// Parse an RSS/Atom/JSON feed body into a [`FetchedFeed`] with items oldest first.
    pub fn normalize(&self, feed_url: &str, body: &[u8]) -> Result<FetchedFeed> {
        let feed = parser::parse(body).map_err(|e| NotifierError::FetchFailed(e.to_string()))?;

        let mut items: Vec<Item> = feed
            .entries
            .into_iter()
            .map(|entry| {
                let link = entry
                    .links
                    .first()
                    .map(|l| l.href.clone())
                    .unwrap_or_default();
                let title = entry
                    .title
                    .map(|t| decode_html_entities(&t.content).to_string())
                    .unwrap_or_default();

                Item::new(feed_url, &entry.id, &title, &link)
            })
            .collect();

        // Documents list newest first
        items.reverse();

        Ok(FetchedFeed {
            url: feed_url.to_string(),
            title: feed.title.map(|t| decode_html_entities(&t.content).to_string()),
            description: feed
                .description
                .map(|d| decode_html_entities(&d.content).to_string()),
            link: feed.links.first().map(|l| l.href.clone()),
            items,
        })
    }
}
