pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "feed-notifier")]
#[command(about = "Notifies chat subscribers about new RSS/Atom items", long_about = None)]
pub struct Cli {
    /// Config file (default: ~/.config/feed-notifier/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// SQLite database file, overrides the config file
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Number of feeds fetched in parallel, overrides the config file
    #[arg(short, long, global = true)]
    pub workers: Option<usize>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Poll feeds and read `<subscriber_id> /<command> [args]` lines from stdin
    Run {
        /// Base polling interval (e.g., "90s", "5m", "1h")
        #[arg(short, long)]
        interval: Option<String>,

        /// Maximum random delay added to each interval
        #[arg(short, long)]
        jitter: Option<String>,
    },
    /// List a subscriber's feeds
    List {
        /// Chat or account identifier
        #[arg(short, long, allow_negative_numbers = true)]
        subscriber: i64,
    },
    /// Subscribe a subscriber to a feed
    Subscribe {
        /// Chat or account identifier
        #[arg(short, long, allow_negative_numbers = true)]
        subscriber: i64,
        /// URL of the feed
        url: String,
    },
    /// Unsubscribe a subscriber from the feed at a position shown by `list`
    Unsubscribe {
        /// Chat or account identifier
        #[arg(short, long, allow_negative_numbers = true)]
        subscriber: i64,
        /// 1-based position in the list
        index: String,
    },
}
