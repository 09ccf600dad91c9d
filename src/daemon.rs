//! Long-running service: the monitor loop plus a line-based command transport.
//!
//! Commands are read from stdin as `<subscriber_id> /<command> [args]`;
//! replies and notifications go through the configured [`Notifier`].
//!
//! [`Notifier`]: crate::notifier::Notifier

use std::future::Future;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use crate::app::{AppContext, Result};
use crate::transport::{dispatch, CommandEvent};

pub struct Daemon {
    ctx: Arc<AppContext>,
}

impl Daemon {
    pub fn new(ctx: Arc<AppContext>) -> Self {
        Self { ctx }
    }

    /// Run until SIGINT/SIGTERM.
    ///
    /// Closing stdin stops command intake but polling continues.
    pub async fn run(&self) -> Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), shutdown_signal())
            .await
    }

    async fn serve<R, S>(&self, input: R, shutdown: S) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        S: Future<Output = ()>,
    {
        self.ctx.registry.restore_all()?;
        let monitor_handle = self.ctx.monitor.run();

        info!("Daemon started (PID: {})", std::process::id());

        let mut lines = input.lines();
        let mut input_open = true;

        tokio::pin!(shutdown);

        loop {
            let line = tokio::select! {
                _ = &mut shutdown => {
                    info!("Received termination signal");
                    break;
                }
                line = lines.next_line(), if input_open => line,
            };

            match line {
                Ok(Some(line)) => {
                    // A slow feed server must not delay shutdown
                    tokio::select! {
                        _ = &mut shutdown => {
                            info!("Received termination signal");
                            break;
                        }
                        _ = self.handle_line(&line) => {}
                    }
                }
                Ok(None) => {
                    info!("Command input closed, polling continues");
                    input_open = false;
                }
                Err(e) => {
                    error!("Failed to read command input: {}", e);
                    input_open = false;
                }
            }
        }

        info!("Daemon shutting down...");
        self.ctx.monitor.stop();
        if let Some(handle) = monitor_handle {
            if let Err(e) = handle.await {
                error!("Monitor task failed: {}", e);
            }
        }

        Ok(())
    }

    async fn handle_line(&self, line: &str) {
        if line.trim().is_empty() {
            return;
        }

        let Some(event) = CommandEvent::parse(line) else {
            warn!("Ignoring malformed command: {}", line);
            return;
        };

        info!("Subscriber {} sent /{}", event.subscriber_id, event.command);
        let reply = dispatch(&self.ctx.registry, &event).await;

        if let Err(e) = self.ctx.notifier.send(event.subscriber_id, &reply).await {
            warn!("Failed to reply to subscriber {}: {}", event.subscriber_id, e);
        }
    }
}

#[cfg(unix)]
async fn shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                _ = sigterm.recv() => {},
                _ = sigint.recv() => {},
            }
        }
        (Err(e), _) | (_, Err(e)) => {
            warn!("Failed to install signal handlers, falling back to ctrl-c: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("Failed to listen for ctrl-c: {}", e);
                std::future::pending::<()>().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for ctrl-c: {}", e);
        std::future::pending::<()>().await;
    }
}
