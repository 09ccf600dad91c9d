//! Chat command handlers.
//!
//! Every handler returns the text to reply with; failures are rendered as
//! plain text rather than surfaced as errors.

use url::Url;

use crate::subscription::SubscriptionContext;

pub const EMPTY_LIST_REPLY: &str = "No subscriptions yet.";
pub const INVALID_URL_REPLY: &str = "Please input a valid url.";
pub const INVALID_INDEX_REPLY: &str = "Please input a valid index.";

/// Accepts absolute http(s) URLs with a host.
pub fn is_valid_url(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => {
            matches!(url.scheme(), "http" | "https")
                && url.host_str().is_some_and(|host| !host.is_empty())
        }
        Err(_) => false,
    }
}

impl SubscriptionContext {
    /// `/list`: numbered sources in subscription order.
    pub fn handle_list(&self) -> String {
        let sources = match self.list_sources() {
            Ok(sources) => sources,
            Err(e) => return e.to_string(),
        };

        if sources.is_empty() {
            return EMPTY_LIST_REPLY.to_string();
        }

        sources
            .iter()
            .enumerate()
            .map(|(idx, source)| format!("{}. [{}]({})", idx + 1, source.display_title(), source.link))
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// `/subscribe <url>`
    pub async fn handle_subscribe(&self, arg: &str) -> String {
        let url = arg.trim();
        if !is_valid_url(url) {
            return INVALID_URL_REPLY.to_string();
        }

        match self.subscribe(url).await {
            Ok((source, items)) => {
                let added = format!(
                    "Subscription [{}]({}) added.",
                    source.display_title(),
                    source.link
                );
                match items.last() {
                    Some(latest) => format!("{}\n\n{}", added, latest.message()),
                    None => added,
                }
            }
            Err(e) => e.to_string(),
        }
    }

    /// `/unsubscribe <n>`, where `n` is the 1-based position shown by `/list`.
    pub async fn handle_unsubscribe(&self, arg: &str) -> String {
        let sources = match self.list_sources() {
            Ok(sources) => sources,
            Err(e) => return e.to_string(),
        };

        let source = match arg.trim().parse::<usize>() {
            Ok(index) if (1..=sources.len()).contains(&index) => &sources[index - 1],
            _ => return INVALID_INDEX_REPLY.to_string(),
        };

        match self.unsubscribe(&source.id).await {
            Ok(removed) => format!("Subscription {} deleted.", removed.display_title()),
            Err(e) => e.to_string(),
        }
    }
}
