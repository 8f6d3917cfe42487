//! Upstream connectivity state read by the shell's connection gate

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionError {
    pub message: String,
    pub since: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectionErrorState {
    pub error: Option<ConnectionError>,
}

impl ConnectionErrorState {
    pub fn is_broken(&self) -> bool {
        self.error.is_some()
    }
}

/// Publishes connectivity changes to any number of readers.
#[derive(Debug, Clone)]
pub struct ConnectionMonitor {
    tx: watch::Sender<ConnectionErrorState>,
}

impl Default for ConnectionMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionMonitor {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionErrorState::default());
        Self { tx }
    }

    /// Flag the upstream as broken. The first report keeps its timestamp
    /// until the state is cleared.
    pub fn report(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|state| match &mut state.error {
            Some(error) => error.message = message,
            None => {
                tracing::warn!(%message, "upstream connection lost");
                state.error = Some(ConnectionError {
                    message,
                    since: Utc::now(),
                });
            }
        });
    }

    pub fn clear(&self) {
        let previous = self.tx.send_replace(ConnectionErrorState::default());
        if previous.is_broken() {
            tracing::info!("upstream connection restored");
        }
    }

    pub fn current(&self) -> ConnectionErrorState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ConnectionErrorState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_then_clear() {
        let monitor = ConnectionMonitor::new();
        assert!(!monitor.current().is_broken());

        monitor.report("connection refused");
        let first = monitor.current().error.expect("error");
        monitor.report("timed out");
        let second = monitor.current().error.expect("error");
        assert_eq!(second.message, "timed out");
        assert_eq!(second.since, first.since);

        monitor.clear();
        assert!(!monitor.current().is_broken());
    }

    #[tokio::test]
    async fn subscribers_see_changes() {
        let monitor = ConnectionMonitor::new();
        let mut rx = monitor.subscribe();

        monitor.report("down");
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow_and_update().is_broken());
    }
}
