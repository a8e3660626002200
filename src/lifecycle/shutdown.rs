//! Stop signal for the gateway's tasks.
//!
//! The HTTP server, the idle-bucket sweeper and the config-update loop each
//! hold a receiver. One `trigger` reaches all of them.

use tokio::sync::broadcast;

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

    /// Signal every subscribed task. Returns how many were still listening.
    pub fn trigger(&self) -> usize {
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::debug!(tasks = notified, "Shutdown signalled");
        notified
    }

    /// Tasks that have not yet dropped their receiver.
    pub fn pending_tasks(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
