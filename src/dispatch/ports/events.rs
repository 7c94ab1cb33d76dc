//! Lifecycle event publication port.

use tokio::sync::broadcast;

use crate::dispatch::domain::DispatchEvent;

/// Publish/subscribe seam for lifecycle notifications.
pub trait EventSink: Send + Sync {
    /// Publishes an event; having no subscribers is not an error.
    fn publish(&self, event: DispatchEvent);

    /// Subscribes to events published from now on.
    fn subscribe(&self) -> broadcast::Receiver<DispatchEvent>;
}
