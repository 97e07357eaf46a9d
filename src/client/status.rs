//! Connection probe results and live monitoring.

use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;

use super::GooseClient;

/// Result of a status probe.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ConnectionStatus {
    pub is_connected: bool,
    /// Human-readable reason when not connected
    pub error: Option<String>,
    pub response_time_ms: Option<u64>,
}

impl ConnectionStatus {
    pub fn connected(response_time_ms: u64) -> Self {
        Self {
            is_connected: true,
            error: None,
            response_time_ms: Some(response_time_ms),
        }
    }

    pub fn unreachable(error: impl Into<String>) -> Self {
        Self {
            is_connected: false,
            error: Some(error.into()),
            response_time_ms: None,
        }
    }
}

/// Background task that probes the backend on an interval and publishes
/// each result.
///
/// The watch channel starts at a disconnected status with no error until the
/// first probe lands.
#[derive(Debug)]
pub struct ConnectionMonitor {
    rx: watch::Receiver<ConnectionStatus>,
    task: JoinHandle<()>,
}

impl ConnectionMonitor {
    /// Start probing immediately, then every `interval`.
    pub fn spawn(client: GooseClient, interval: Duration) -> Self {
        let (tx, rx) = watch::channel(ConnectionStatus::default());

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                let status = client.test_connection().await;
                if tx.send(status).is_err() {
                    // Every receiver is gone
                    break;
                }
            }
        });

        Self { rx, task }
    }

    /// A receiver for status updates
    pub fn subscribe(&self) -> watch::Receiver<ConnectionStatus> {
        self.rx.clone()
    }

    /// The most recent probe result
    pub fn current(&self) -> ConnectionStatus {
        self.rx.borrow().clone()
    }
}

impl Drop for ConnectionMonitor {
    fn drop(&mut self) {
        self.task.abort();
    }
}
