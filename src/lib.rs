//! # feed-notifier
//!
//! Watches RSS/Atom feeds and notifies chat subscribers about new items,
//! delivering each item to each subscriber at most once.
//!
//! ## Architecture
//!
//! ```text
//! Transport → SubscriptionContext → Store / Ledger
//!                    ↓ observe
//!                 Monitor → Fetcher → Normalizer
//!                    ↓ on_items
//!             DeliveryHandler → Ledger → Notifier
//! ```
//!
//! - [`monitor`]: the single polling loop; fetches each watched link once per cycle
//! - [`subscription`]: per-subscriber contexts, command handlers, delivery dedup
//! - [`store`]: ledger and subscription persistence (SQLite)
//! - [`fetcher`]: HTTP fetching, [`normalizer`]: feed parsing
//!
//! ## Quick Start
//!
//! ```bash
//! # Subscribe and list from the command line
//! feed-notifier subscribe --subscriber 42 https://blog.rust-lang.org/feed.xml
//! feed-notifier list --subscriber 42
//!
//! # Run the service; commands arrive on stdin
//! echo "42 /list" | feed-notifier run --interval 5m
//! ```

/// Application context and error types.
pub mod app;

/// Command-line interface using clap.
pub mod cli;

/// Configuration loaded from `~/.config/feed-notifier/config.toml`.
pub mod config;

/// Long-running service combining the monitor and the stdin transport.
pub mod daemon;

/// Core domain models: [`Item`](domain::Item), [`Source`](domain::Source).
pub mod domain;

/// Feed fetching.
///
/// - [`FeedFetcher`](fetcher::FeedFetcher): async trait for fetch-and-parse
/// - [`HttpFetcher`](fetcher::HttpFetcher): reqwest-based implementation
pub mod fetcher;

/// Polling scheduler with per-link observer fan-out.
pub mod monitor;

/// Feed parsing and normalization.
///
/// Converts RSS 0.9x/1.0/2.0, Atom 0.3/1.0, and JSON Feed 1.0
/// into oldest-first [`Item`](domain::Item) lists.
pub mod normalizer;

/// Outbound notifications.
pub mod notifier;

/// Persistence.
///
/// - [`DeliveryLedger`](store::DeliveryLedger) and
///   [`SubscriptionStore`](store::SubscriptionStore): storage traits
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation of both
pub mod store;

/// Subscriber contexts, chat command handlers and delivery deduplication.
pub mod subscription;

/// Inbound command events.
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;
