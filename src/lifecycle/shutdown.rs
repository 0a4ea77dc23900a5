//! Shutdown coordination.

use tokio::sync::broadcast;

/// Fan-out stop signal for the health monitor and the HTTP server.
///
/// Every long-running task holds its own receiver. Dropping the coordinator
/// also releases every receiver, so tasks stop even if `trigger` is never
/// called.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Signal all subscribers. Returns how many were still listening.
    pub fn trigger(&self) -> usize {
        self.tx.send(()).unwrap_or(0)
    }

    /// Number of tasks still holding a receiver.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolve once `receiver` observes a trigger or its sender is gone.
pub async fn recv_or_closed(mut receiver: broadcast::Receiver<()>) {
    let _ = receiver.recv().await;
}
