//! Inbound side of the chat transport.

use crate::domain::SubscriberId;
use crate::subscription::SubscriberRegistry;

/// A command received from a subscriber.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandEvent {
    pub subscriber_id: SubscriberId,
    /// Command name without the leading slash
    pub command: String,
    pub args: String,
}

impl CommandEvent {
    /// Parse a `<subscriber_id> /<command> [args]` line.
    pub fn parse(line: &str) -> Option<Self> {
        let (id, rest) = line.trim().split_once(char::is_whitespace)?;
        let subscriber_id = id.parse::<SubscriberId>().ok()?;

        let rest = rest.trim_start();
        let rest = rest.strip_prefix('/')?;
        let (command, args) = rest.split_once(char::is_whitespace).unwrap_or((rest, ""));

        if command.is_empty() {
            return None;
        }

        Some(Self {
            subscriber_id,
            command: command.to_lowercase(),
            args: args.trim().to_string(),
        })
    }
}

/// Route `event` to its subscriber's context and produce the reply text.
pub async fn dispatch(registry: &SubscriberRegistry, event: &CommandEvent) -> String {
    let ctx = match registry.get_or_create(event.subscriber_id) {
        Ok(ctx) => ctx,
        Err(e) => return e.to_string(),
    };

    match event.command.as_str() {
        "list" => ctx.handle_list(),
        "subscribe" => ctx.handle_subscribe(&event.args).await,
        "unsubscribe" => ctx.handle_unsubscribe(&event.args).await,
        other => format!("Unknown command: /{}", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::subscription::commands::EMPTY_LIST_REPLY;
    use crate::subscription::context::tests::{Harness, FEED_A};
    use crate::testing::item;

    #[test]
    fn test_parse_command_with_args() {
        let event = CommandEvent::parse("42 /subscribe https://example.com/feed.xml").unwrap();
        assert_eq!(
            event,
            CommandEvent {
                subscriber_id: 42,
                command: "subscribe".into(),
                args: "https://example.com/feed.xml".into(),
            }
        );
    }

    #[test]
    fn test_parse_command_without_args() {
        let event = CommandEvent::parse("  -100123   /List ").unwrap();
        assert_eq!(event.subscriber_id, -100123);
        assert_eq!(event.command, "list");
        assert_eq!(event.args, "");
    }

    #[test]
    fn test_parse_rejects_malformed_lines() {
        assert!(CommandEvent::parse("").is_none());
        assert!(CommandEvent::parse("/list").is_none());
        assert!(CommandEvent::parse("abc /list").is_none());
        assert!(CommandEvent::parse("42 list").is_none());
        assert!(CommandEvent::parse("42 /").is_none());
    }

    #[tokio::test]
    async fn test_dispatch_routes_by_subscriber() {
        let h = Harness::new();
        h.fetcher.set_items(FEED_A, vec![item(FEED_A, "1")]);
        let registry = SubscriberRegistry::new(h.services.clone());

        let subscribe = CommandEvent::parse(&format!("1 /subscribe {}", FEED_A)).unwrap();
        let reply = dispatch(&registry, &subscribe).await;
        assert!(reply.contains("added."));

        let list = |id: i64| CommandEvent::parse(&format!("{} /list", id)).unwrap();
        assert_eq!(
            dispatch(&registry, &list(1)).await,
            format!("1. [Feed {a}]({a})", a = FEED_A)
        );
        assert_eq!(dispatch(&registry, &list(2)).await, EMPTY_LIST_REPLY);
    }

    #[tokio::test]
    async fn test_dispatch_unknown_command() {
        let h = Harness::new();
        let registry = SubscriberRegistry::new(h.services.clone());
        let event = CommandEvent::parse("1 /start").unwrap();

        assert_eq!(dispatch(&registry, &event).await, "Unknown command: /start");
    }
}
