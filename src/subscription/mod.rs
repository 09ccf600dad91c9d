pub mod commands;
pub mod context;
pub mod delivery;
pub mod registry;

pub use commands::is_valid_url;
pub use context::{Services, SubscriptionContext};
pub use delivery::DeliveryHandler;
pub use registry::SubscriberRegistry;
