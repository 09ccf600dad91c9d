pub mod item;
pub mod source;

pub use item::Item;
pub use source::{FetchedFeed, Source};

/// Chat or account identifier of a subscriber.
pub type SubscriberId = i64;
