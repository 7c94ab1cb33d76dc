//! Event bus backed by a tokio broadcast channel.

use tokio::sync::broadcast;

use crate::dispatch::{domain::DispatchEvent, ports::EventSink};

/// In-process fan-out of lifecycle events.
///
/// Slow subscribers lag and lose the oldest events; publishers never block.
#[derive(Debug, Clone)]
pub struct BroadcastEventBus {
    tx: broadcast::Sender<DispatchEvent>,
    capacity: usize,
}

impl BroadcastEventBus {
    /// Creates a bus buffering up to `requested` events (at least one) per subscriber.
    #[must_use]
    pub fn new(requested: usize) -> Self {
        let capacity = requested.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Returns the per-subscriber buffer size.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for BroadcastEventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

impl EventSink for BroadcastEventBus {
    fn publish(&self, event: DispatchEvent) {
        // No receivers is fine.
        if self.tx.send(event).is_err() {
            tracing::trace!("lifecycle event dropped, no subscribers");
        }
    }

    fn subscribe(&self) -> broadcast::Receiver<DispatchEvent> {
        self.tx.subscribe()
    }
}
