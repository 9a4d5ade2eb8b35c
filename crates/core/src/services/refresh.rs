//! Change notification for the feed.
//!
//! Every successful mutation of galleries or images bumps a shared version
//! counter. Readers that cache the feed compare versions instead of holding
//! references to each other's state.

use std::sync::Arc;

use tokio::sync::watch;

/// Cloneable, monotonic change counter.
#[derive(Clone)]
pub struct RefreshTrigger {
    tx: Arc<watch::Sender<u64>>,
}

impl RefreshTrigger {
    /// Create a trigger starting at version 0.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx: Arc::new(tx) }
    }

    /// Record a mutation. Returns the new version.
    pub fn bump(&self) -> u64 {
        let mut version = 0;
        self.tx.send_modify(|v| {
            *v += 1;
            version = *v;
        });
        tracing::trace!(version, "Feed refresh requested");
        version
    }

    /// Current version.
    #[must_use]
    pub fn current(&self) -> u64 {
        *self.tx.borrow()
    }

    /// Receive a notification each time the version changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }
}

impl Default for RefreshTrigger {
    fn default() -> Self {
        Self::new()
    }
}
