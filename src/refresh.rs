//! Background selection refresh
//!
//! Periodically forces a refresh of the selector and reports each result over
//! a tokio channel, so a long-running consumer can redraw or re-export.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

use crate::selector::{Selection, StoreSelector};

/// Messages sent from the background refresh to its consumer
#[derive(Debug, Clone)]
pub enum RefreshMessage {
    /// Refresh started
    RefreshStarted,
    /// A new selection is available
    Refreshed(Selection),
    /// The refresh failed and no cached list could stand in
    RefreshError(String),
}

/// Configuration for the background refresh
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Time between forced refreshes
    pub interval: Duration,
    /// How many stores to select on each refresh
    pub count: usize,
    /// Whether auto-refresh is enabled
    pub enabled: bool,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300), // 5 minutes
            count: 4,
            enabled: true,
        }
    }
}

/// Handle for controlling the background refresh
pub struct RefreshHandle {
    /// Channel for receiving refresh messages
    pub receiver: mpsc::Receiver<RefreshMessage>,
    /// Signals shutdown to the refresh task
    shutdown_tx: mpsc::Sender<()>,
}

impl RefreshHandle {
    /// Creates a new RefreshHandle and spawns the refresh task
    ///
    /// The first refresh happens one `interval` after spawning. A disabled
    /// config spawns nothing and the receiver stays empty.
    pub fn spawn(selector: Arc<StoreSelector>, config: RefreshConfig) -> Self {
        let (msg_tx, msg_rx) = mpsc::channel(32);
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        if config.enabled {
            tokio::spawn(async move {
                let mut interval = tokio::time::interval(config.interval);
                // Skip the first tick (immediate)
                interval.tick().await;

                loop {
                    tokio::select! {
                        _ = interval.tick() => {
                            if msg_tx.send(RefreshMessage::RefreshStarted).await.is_err() {
                                break;
                            }
                            let message = match selector.get_latest_n(config.count, true).await {
                                Ok(selection) => RefreshMessage::Refreshed(selection),
                                Err(err) => {
                                    warn!(error = %err, "background refresh failed");
                                    RefreshMessage::RefreshError(err.to_string())
                                }
                            };
                            if msg_tx.send(message).await.is_err() {
                                break;
                            }
                        }
                        _ = shutdown_rx.recv() => {
                            break;
                        }
                    }
                }
            });
        }

        Self {
            receiver: msg_rx,
            shutdown_tx,
        }
    }

    /// Waits for the next message, `None` once the task has stopped
    pub async fn recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.recv().await
    }

    /// Returns a pending message without waiting, if there is one
    pub fn try_recv(&mut self) -> Option<RefreshMessage> {
        self.receiver.try_recv().ok()
    }

    /// Shuts down the refresh task
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(()).await;
    }
}
