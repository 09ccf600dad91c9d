pub mod http_fetcher;

pub use http_fetcher::HttpFetcher;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::{FetchedFeed, Item};

/// Fetch-and-parse boundary.
///
/// Network, HTTP status and parse failures all surface as
/// [`NotifierError::FetchFailed`](crate::app::NotifierError::FetchFailed).
#[async_trait]
pub trait FeedFetcher {
    /// Fetch feed metadata together with its items, oldest first.
    async fn fetch(&self, url: &str) -> Result<FetchedFeed>;

    /// Fetch only the items, oldest first.
    async fn fetch_items(&self, url: &str) -> Result<Vec<Item>> {
        Ok(self.fetch(url).await?.items)
    }
}
