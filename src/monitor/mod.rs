//! The single background polling loop.
//!
//! The monitor owns the watch table (feed link → observers). Every cycle it
//! fetches each watched link exactly once, no matter how many subscribers
//! follow it, and hands the same item list to every observer of that link.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::{watch, Notify, Semaphore};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, error, info, warn};

use crate::config::{format_interval, MonitorConfig};
use crate::domain::{Item, SubscriberId};
use crate::fetcher::FeedFetcher;

/// Receives the items of one polled feed.
#[async_trait]
pub trait ItemHandler {
    async fn on_items(&self, link: &str, items: &[Item]);
}

/// One subscriber's interest in one feed link.
#[derive(Clone)]
pub struct Observer {
    pub subscriber_id: SubscriberId,
    pub link: String,
    pub handler: Arc<dyn ItemHandler + Send + Sync>,
}

/// Outcome of one pull cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PullSummary {
    /// Links fetched this cycle
    pub polled: usize,
    /// Links whose fetch or parse failed
    pub failed: usize,
}

type WatchTable = HashMap<String, Vec<Observer>>;

pub struct Monitor {
    fetcher: Arc<dyn FeedFetcher + Send + Sync>,
    config: MonitorConfig,
    watches: Mutex<WatchTable>,
    semaphore: Arc<Semaphore>,
    poke: Notify,
    shutdown: watch::Sender<bool>,
    started: AtomicBool,
}

impl Monitor {
    pub fn new(fetcher: Arc<dyn FeedFetcher + Send + Sync>, config: MonitorConfig) -> Self {
        let (shutdown, _) = watch::channel(false);
        let workers = config.workers.max(1);

        Self {
            fetcher,
            config,
            watches: Mutex::new(HashMap::new()),
            semaphore: Arc::new(Semaphore::new(workers)),
            poke: Notify::new(),
            shutdown,
            started: AtomicBool::new(false),
        }
    }

    // Handlers never run under this lock
    fn table(&self) -> MutexGuard<'_, WatchTable> {
        self.watches
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register `observer` for its link and poke the loop for an early pull.
    ///
    /// A subscriber observes a link at most once; registering again replaces
    /// the previous observer.
    pub fn observe(&self, observer: Observer) {
        {
            let mut table = self.table();
            let observers = table.entry(observer.link.clone()).or_default();
            observers.retain(|o| o.subscriber_id != observer.subscriber_id);
            debug!(
                "Subscriber {} observes {} ({} observers)",
                observer.subscriber_id,
                observer.link,
                observers.len() + 1
            );
            observers.push(observer);
        }

        self.poke.notify_one();
    }

    /// Drop the observer of `subscriber_id` on `link`.
    ///
    /// Returns whether an observer was removed. A link left without observers
    /// stops being polled.
    pub fn remove_observer(&self, subscriber_id: SubscriberId, link: &str) -> bool {
        let mut table = self.table();

        let Some(observers) = table.get_mut(link) else {
            return false;
        };

        let before = observers.len();
        observers.retain(|o| o.subscriber_id != subscriber_id);
        let removed = observers.len() != before;

        if observers.is_empty() {
            table.remove(link);
            debug!("Stopped watching {}", link);
        }

        removed
    }

    pub fn watched_links(&self) -> Vec<String> {
        let mut links: Vec<String> = self.table().keys().cloned().collect();
        links.sort();
        links
    }

    pub fn observer_count(&self, link: &str) -> usize {
        self.table().get(link).map_or(0, Vec::len)
    }

    /// Start the background loop.
    ///
    /// Only the first call spawns the loop; later calls return `None`.
    pub fn run(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self
            .started
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Monitor already running");
            return None;
        }

        let monitor = Arc::clone(self);
        Some(tokio::spawn(async move { monitor.launch().await }))
    }

    /// Ask the loop to exit once the current tick is done.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    async fn launch(&self) {
        let mut shutdown = self.shutdown.subscribe();

        info!(
            "Monitor started (interval: {} + up to {} jitter, {} workers)",
            format_interval(self.config.base_interval_secs),
            format_interval(self.config.jitter_secs),
            self.config.workers
        );

        let mut deadline = Instant::now();

        while !*shutdown.borrow() {
            tokio::select! {
                biased;
                _ = shutdown.changed() => {}
                _ = sleep_until(deadline) => {
                    self.log_pull("scheduled").await;
                    deadline = Instant::now() + self.config.next_delay();
                }
                // A poke keeps the current deadline
                _ = self.poke.notified() => {
                    self.log_pull("requested").await;
                }
            }
        }

        info!("Monitor stopped");
    }

    async fn log_pull(&self, reason: &str) {
        let summary = self.pull().await;
        debug!(
            "Pull ({}) finished: {} feeds polled, {} failed",
            reason, summary.polled, summary.failed
        );
    }

    /// Run one cycle: fetch every watched link once, then notify its observers.
    ///
    /// Links are fetched in parallel. A failing link is logged and skipped;
    /// it never stops the other links of the cycle.
    pub async fn pull(&self) -> PullSummary {
        let snapshot: Vec<(String, Vec<Observer>)> = self
            .table()
            .iter()
            .filter(|(_, observers)| !observers.is_empty())
            .map(|(link, observers)| (link.clone(), observers.clone()))
            .collect();

        let mut handles = Vec::with_capacity(snapshot.len());

        for (link, observers) in snapshot {
            let fetcher = self.fetcher.clone();
            let semaphore = self.semaphore.clone();

            handles.push(tokio::spawn(async move {
                let items = {
                    let _permit = semaphore.acquire_owned().await.ok();
                    match fetcher.fetch_items(&link).await {
                        Ok(items) => items,
                        Err(e) => {
                            warn!("Skipping {} this cycle: {}", link, e);
                            return false;
                        }
                    }
                };

                if items.is_empty() {
                    debug!("No items in {}", link);
                    return true;
                }

                for observer in &observers {
                    observer.handler.on_items(&link, &items).await;
                }

                true
            }));
        }

        let mut summary = PullSummary::default();
        for result in futures::future::join_all(handles).await {
            summary.polled += 1;
            match result {
                Ok(true) => {}
                Ok(false) => summary.failed += 1,
                Err(e) => {
                    summary.failed += 1;
                    error!("Poll task failed: {}", e);
                }
            }
        }

        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{item, RecordingHandler, StubFetcher};
    use std::time::Duration;

    const FEED_A: &str = "https://a.example.com/feed.xml";
    const FEED_B: &str = "https://b.example.com/feed.xml";

    fn monitor(fetcher: Arc<StubFetcher>) -> Arc<Monitor> {
        Arc::new(Monitor::new(
            fetcher,
            MonitorConfig {
                base_interval_secs: 3600,
                jitter_secs: 0,
                workers: 4,
            },
        ))
    }

    fn observer(subscriber_id: SubscriberId, link: &str, handler: &Arc<RecordingHandler>) -> Observer {
        Observer {
            subscriber_id,
            link: link.into(),
            handler: handler.clone(),
        }
    }

    #[tokio::test]
    async fn test_shared_feed_fetched_once_per_cycle() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1"), item(FEED_A, "2")]);
        let monitor = monitor(fetcher.clone());

        let first = Arc::new(RecordingHandler::default());
        let second = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &first));
        monitor.observe(observer(2, FEED_A, &second));

        let summary = monitor.pull().await;

        assert_eq!(summary, PullSummary { polled: 1, failed: 0 });
        assert_eq!(fetcher.fetch_count(FEED_A), 1);
        assert_eq!(first.batches(), second.batches());
        assert_eq!(first.batches().len(), 1);
        assert_eq!(first.batches()[0].len(), 2);
    }

    #[tokio::test]
    async fn test_failing_feed_does_not_block_others() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_failing(FEED_A);
        fetcher.set_items(FEED_B, vec![item(FEED_B, "1")]);
        let monitor = monitor(fetcher.clone());

        let a = Arc::new(RecordingHandler::default());
        let b = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &a));
        monitor.observe(observer(1, FEED_B, &b));

        let summary = monitor.pull().await;
        assert_eq!(summary, PullSummary { polled: 2, failed: 1 });
        assert!(a.batches().is_empty());
        assert_eq!(b.batches().len(), 1);

        // Retried next cycle
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let summary = monitor.pull().await;
        assert_eq!(summary.failed, 0);
        assert_eq!(fetcher.fetch_count(FEED_A), 2);
        assert_eq!(a.batches().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_feed_skips_observers() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, Vec::new());
        let monitor = monitor(fetcher.clone());

        let handler = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &handler));
        monitor.pull().await;

        assert_eq!(fetcher.fetch_count(FEED_A), 1);
        assert!(handler.batches().is_empty());
    }

    #[tokio::test]
    async fn test_observe_replaces_same_subscriber() {
        let monitor = monitor(Arc::new(StubFetcher::new()));
        let handler = Arc::new(RecordingHandler::default());

        monitor.observe(observer(1, FEED_A, &handler));
        monitor.observe(observer(1, FEED_A, &handler));
        monitor.observe(observer(2, FEED_A, &handler));

        assert_eq!(monitor.observer_count(FEED_A), 2);
        assert_eq!(monitor.watched_links(), vec![FEED_A.to_string()]);
    }

    #[tokio::test]
    async fn test_remove_last_observer_prunes_watch() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let monitor = monitor(fetcher.clone());
        let handler = Arc::new(RecordingHandler::default());

        monitor.observe(observer(1, FEED_A, &handler));
        monitor.observe(observer(2, FEED_A, &handler));

        assert!(monitor.remove_observer(1, FEED_A));
        assert_eq!(monitor.observer_count(FEED_A), 1);
        assert!(!monitor.remove_observer(1, FEED_A));

        assert!(monitor.remove_observer(2, FEED_A));
        assert!(monitor.watched_links().is_empty());

        let summary = monitor.pull().await;
        assert_eq!(summary.polled, 0);
        assert_eq!(fetcher.fetch_count(FEED_A), 0);
    }

    #[tokio::test]
    async fn test_run_starts_once_and_stops() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let monitor = monitor(fetcher.clone());
        let handler = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &handler));

        let handle = monitor.run().expect("first run starts the loop");
        assert!(monitor.run().is_none());

        // The first tick fires immediately
        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.batches().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        monitor.stop();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_huge_interval_keeps_loop_alive() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let monitor = Arc::new(Monitor::new(
            fetcher.clone(),
            MonitorConfig {
                base_interval_secs: u64::MAX - 1,
                jitter_secs: 60,
                workers: 1,
            },
        ));
        let handler = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &handler));

        let handle = monitor.run().unwrap();
        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.batches().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        // The loop survived scheduling the next tick and still answers pokes
        monitor.observe(observer(2, FEED_A, &handler));
        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.batches().len() < 2 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        monitor.stop();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_observe_pokes_running_loop() {
        let fetcher = Arc::new(StubFetcher::new());
        fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let monitor = monitor(fetcher.clone());
        let handle = monitor.run().unwrap();

        // Let the immediate tick run against the empty table
        tokio::time::sleep(Duration::from_millis(50)).await;

        let handler = Arc::new(RecordingHandler::default());
        monitor.observe(observer(1, FEED_A, &handler));

        // The base interval is an hour, so only the poke can deliver this
        tokio::time::timeout(Duration::from_secs(5), async {
            while handler.batches().is_empty() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();

        monitor.stop();
        handle.await.unwrap();
    }
}
