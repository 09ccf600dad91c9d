use std::io::Write;

use async_trait::async_trait;

use crate::app::Result;
use crate::domain::SubscriberId;

/// Outbound side of the chat transport.
#[async_trait]
pub trait Notifier {
    async fn send(&self, subscriber_id: SubscriberId, message: &str) -> Result<()>;
}

/// Writes every notification to stdout as `<subscriber_id> <message>`.
#[derive(Debug, Default, Clone)]
pub struct ConsoleNotifier;

#[async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, subscriber_id: SubscriberId, message: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{} {}", subscriber_id, message)?;
        stdout.flush()?;
        Ok(())
    }
}
