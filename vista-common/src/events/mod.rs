//! Event types for the Vista event system
//!
//! Provides the owner-facing playhead event definitions and the EventBus used
//! to fan them out.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Playhead notifications delivered to the controller's owner
///
/// Events are broadcast via EventBus and can be serialized (for logs or any
/// outer transport) with [`PlayheadEvent::to_json`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayheadEvent {
    /// A user or application seek landed inside the playable window and was
    /// accepted without correction
    SeekAccepted {
        /// Position the element settled on (seconds)
        position: f64,
        /// When the seek was accepted
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A gap larger than the silent-jump limit was found ahead of the playhead
    ///
    /// Fired at most once per readiness plateau.
    LargeGap {
        /// Playhead position when the gap was found (seconds)
        current_time: f64,
        /// Distance to the start of the next buffered range (seconds)
        gap_size: f64,
        /// Whether the owner vetoed the jump
        canceled: bool,
        /// When the gap was found
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl PlayheadEvent {
    /// Short event name, matching the serialized `type` tag
    pub fn event_type(&self) -> &'static str {
        match self {
            PlayheadEvent::SeekAccepted { .. } => "SeekAccepted",
            PlayheadEvent::LargeGap { .. } => "LargeGap",
        }
    }

    /// Serialize as a single JSON object
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for playhead events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the controller)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use vista_common::events::{EventBus, PlayheadEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(PlayheadEvent::SeekAccepted {
///     position: 12.5,
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(PlayheadEvent::SeekAccepted { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<PlayheadEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<PlayheadEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: PlayheadEvent,
    ) -> Result<usize, broadcast::error::SendError<PlayheadEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: PlayheadEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
