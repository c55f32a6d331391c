//! Owner notifications
//!
//! The playhead reports back to whoever owns it through [`PlayheadObserver`].
//! Both calls are synchronous: the large-gap verdict is consulted before the
//! playhead decides whether to jump.

use vista_common::events::{EventBus, PlayheadEvent};

/// A gap larger than the silent-jump limit, found ahead of the playhead
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LargeGap {
    /// Playhead position when the gap was found (seconds)
    pub current_time: f64,
    /// Distance to the start of the next buffered range (seconds)
    pub gap_size: f64,
}

/// Owner's answer to a large-gap notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GapVerdict {
    /// Let the configured policy decide
    Allow,
    /// Veto the jump; the position is left where it is
    Cancel,
}

/// Callbacks from the playhead to its owner
pub trait PlayheadObserver: Send {
    /// A seek landed inside the playable window and needed no correction
    fn on_seek_accepted(&mut self, position: f64);

    /// A large gap was found; fired at most once per readiness plateau
    fn on_large_gap(&mut self, gap: &LargeGap) -> GapVerdict;
}

/// Observer that ignores seeks and never vetoes a gap jump
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl PlayheadObserver for NoopObserver {
    fn on_seek_accepted(&mut self, _position: f64) {}

    fn on_large_gap(&mut self, _gap: &LargeGap) -> GapVerdict {
        GapVerdict::Allow
    }
}

/// Republishes playhead callbacks as [`PlayheadEvent`]s on an [`EventBus`]
///
/// A bus subscriber cannot answer synchronously, so the large-gap verdict is
/// a fixed policy chosen at construction.
pub struct EventBusObserver {
    bus: EventBus,
    cancel_large_gaps: bool,
}

impl EventBusObserver {
    pub fn new(bus: EventBus, cancel_large_gaps: bool) -> Self {
        Self {
            bus,
            cancel_large_gaps,
        }
    }
}

impl PlayheadObserver for EventBusObserver {
    fn on_seek_accepted(&mut self, position: f64) {
        self.bus.emit_lossy(PlayheadEvent::SeekAccepted {
            position,
            timestamp: vista_common::time::now(),
        });
    }

    fn on_large_gap(&mut self, gap: &LargeGap) -> GapVerdict {
        self.bus.emit_lossy(PlayheadEvent::LargeGap {
            current_time: gap.current_time,
            gap_size: gap.gap_size,
            canceled: self.cancel_large_gaps,
            timestamp: vista_common::time::now(),
        });
        if self.cancel_large_gaps {
            GapVerdict::Cancel
        } else {
            GapVerdict::Allow
        }
    }
}
