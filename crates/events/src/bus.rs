//! In-process audit hub backed by a `tokio::sync::broadcast` channel.
//!
//! [`AuditRecorder`] is shared via `Arc` across request handlers; recording
//! is fire-and-forget so a slow or absent sink never delays a response.

use tokio::sync::broadcast;

use crate::audit::AuditEvent;

/// Default buffer capacity for the broadcast channel.
const DEFAULT_CAPACITY: usize = 1024;

/// Fan-out hub for [`AuditEvent`]s.
///
/// Wraps a [`broadcast::Sender`] so that any number of subscribers can
/// independently receive every recorded event.
pub struct AuditRecorder {
    sender: broadcast::Sender<AuditEvent>,
}

impl AuditRecorder {
    /// Create a recorder with a specific channel capacity.
    ///
    /// When the buffer is full the oldest un-consumed events are dropped
    /// and slow receivers observe a `RecvError::Lagged`.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Record an event for all current subscribers.
    ///
    /// If no sink is subscribed the event is silently dropped; requests
    /// never fail on account of the trail.
    pub fn record(&self, event: AuditEvent) {
        // Ignore the SendError — it only means there are zero receivers.
        let _ = self.sender.send(event);
    }

    /// Subscribe to all events recorded on this hub.
    pub fn subscribe(&self) -> broadcast::Receiver<AuditEvent> {
        self.sender.subscribe()
    }
}

impl Default for AuditRecorder {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}
