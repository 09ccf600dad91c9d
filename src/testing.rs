//! In-process fakes for the fetch, notification and ledger seams.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::app::{NotifierError, Result};
use crate::domain::{FetchedFeed, Item, SubscriberId};
use crate::fetcher::FeedFetcher;
use crate::monitor::ItemHandler;
use crate::notifier::Notifier;
use crate::store::DeliveryLedger;

pub fn item(feed_link: &str, guid: &str) -> Item {
    Item::new(
        feed_link,
        guid,
        &format!("Post {}", guid),
        &format!("{}/posts/{}", feed_link.trim_end_matches("/feed.xml"), guid),
    )
}

enum StubFeed {
    Items(Vec<Item>),
    Failing,
}

/// Serves canned feeds and counts fetches per URL.
#[derive(Default)]
pub struct StubFetcher {
    feeds: Mutex<HashMap<String, StubFeed>>,
    fetches: Mutex<HashMap<String, usize>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_items(&self, url: &str, items: Vec<Item>) {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), StubFeed::Items(items));
    }

    pub fn push_item(&self, url: &str, item: Item) {
        let mut feeds = self.feeds.lock().unwrap();
        match feeds.get_mut(url) {
            Some(StubFeed::Items(items)) => items.push(item),
            _ => {
                feeds.insert(url.to_string(), StubFeed::Items(vec![item]));
            }
        }
    }

    pub fn set_failing(&self, url: &str) {
        self.feeds
            .lock()
            .unwrap()
            .insert(url.to_string(), StubFeed::Failing);
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.fetches.lock().unwrap().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed> {
        *self.fetches.lock().unwrap().entry(url.to_string()).or_default() += 1;

        match self.feeds.lock().unwrap().get(url) {
            Some(StubFeed::Items(items)) => Ok(FetchedFeed {
                url: url.to_string(),
                title: Some(format!("Feed {}", url)),
                description: None,
                link: Some(url.to_string()),
                items: items.clone(),
            }),
            Some(StubFeed::Failing) => Err(NotifierError::FetchFailed(format!("{} is down", url))),
            None => Err(NotifierError::FetchFailed(format!("{} returned 404", url))),
        }
    }
}

/// Records every batch it is handed.
#[derive(Default)]
pub struct RecordingHandler {
    batches: Mutex<Vec<Vec<Item>>>,
}

impl RecordingHandler {
    pub fn batches(&self) -> Vec<Vec<Item>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemHandler for RecordingHandler {
    async fn on_items(&self, _link: &str, items: &[Item]) {
        self.batches.lock().unwrap().push(items.to_vec());
    }
}

/// Collects sent messages instead of delivering them.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(SubscriberId, String)>>,
    failing: Mutex<bool>,
}

impl RecordingNotifier {
    pub fn sent(&self) -> Vec<(SubscriberId, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn sent_to(&self, subscriber_id: SubscriberId) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter(|(id, _)| *id == subscriber_id)
            .map(|(_, message)| message)
            .collect()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, subscriber_id: SubscriberId, message: &str) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(NotifierError::Io(std::io::Error::other("chat API unavailable")));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subscriber_id, message.to_string()));
        Ok(())
    }
}

/// Ledger that starts failing after a number of successful calls.
pub struct FlakyLedger<L> {
    inner: L,
    remaining: Mutex<usize>,
}

impl<L> FlakyLedger<L> {
    pub fn new(inner: L, successful_calls: usize) -> Self {
        Self {
            inner,
            remaining: Mutex::new(successful_calls),
        }
    }

    pub fn inner(&self) -> &L {
        &self.inner
    }

    fn take_call(&self) -> Result<()> {
        let mut remaining = self.remaining.lock().unwrap();
        if *remaining == 0 {
            return Err(NotifierError::StoreFailed("ledger unavailable".into()));
        }
        *remaining -= 1;
        Ok(())
    }
}

impl<L: DeliveryLedger> DeliveryLedger for FlakyLedger<L> {
    fn has_delivered(&self, subscriber_id: SubscriberId, item_id: &str) -> Result<bool> {
        self.take_call()?;
        self.inner.has_delivered(subscriber_id, item_id)
    }

    fn mark_delivered(&self, subscriber_id: SubscriberId, item_ids: &[String]) -> Result<()> {
        self.take_call()?;
        self.inner.mark_delivered(subscriber_id, item_ids)
    }
}
