//! Playhead state
//!
//! Everything the controller remembers between events. Owned exclusively by
//! [`super::Playhead`] and only mutated from its `&mut self` methods.

use crate::timer::TimerHandle;
use std::time::Instant;
use vista_common::ReadyState;

/// Where the controller is in bringing up the initial position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartupPhase {
    /// No metadata yet and no early seek pending
    AwaitingMetadata,

    /// No metadata yet; a position update arrived and the early-seek timer is
    /// coalescing further updates
    BatchingEarlySeek,

    /// Metadata loaded and the start position applied.
    ///
    /// `start_seek_pending` is true while the seek to the start position has
    /// not been acknowledged by a `seeking` event yet; until then `seeking` and
    /// `playing` are not treated as user activity.
    MetadataResolved { start_seek_pending: bool },
}

impl StartupPhase {
    pub fn has_metadata(&self) -> bool {
        matches!(self, StartupPhase::MetadataResolved { .. })
    }

    /// Metadata loaded and the start seek acknowledged
    pub fn is_tracking_seeks(&self) -> bool {
        matches!(
            self,
            StartupPhase::MetadataResolved {
                start_seek_pending: false
            }
        )
    }
}

/// Suspected stall episode
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StallTracker {
    /// Position at which the playhead appears frozen
    pub playhead_time: Option<f64>,
    /// When the frozen position was first observed
    pub wall_clock: Option<Instant>,
    /// A nudge was already applied for this episode
    pub corrected: bool,
}

impl StallTracker {
    /// Begin tracking a new candidate position
    pub fn restart(&mut self, position: f64, now: Instant) {
        self.playhead_time = Some(position);
        self.wall_clock = Some(now);
        self.corrected = false;
    }
}

/// Logical playhead state
#[derive(Debug, Clone)]
pub struct PlayheadState {
    /// Pending target position before metadata, then the cached resolved start
    pub start_time: Option<f64>,

    /// Rate requested by the owner; may be negative
    pub playback_rate: f64,

    /// Playback intentionally held for rebuffering
    pub buffering: bool,

    /// The element's `seeking` event for the current seek has been seen
    pub seeking_event_received: bool,

    /// A segment was appended since the last seek
    pub had_segment_appended: bool,

    /// Ready state seen by the previous gap poll
    pub prev_ready_state: ReadyState,

    /// Large-gap notification already fired for this ready-state plateau
    pub did_fire_large_gap: bool,

    pub stall: StallTracker,
}

impl PlayheadState {
    pub fn new(start_time: Option<f64>, ready_state: ReadyState) -> Self {
        Self {
            start_time,
            playback_rate: 1.0,
            buffering: false,
            seeking_event_received: false,
            had_segment_appended: false,
            prev_ready_state: ready_state,
            did_fire_large_gap: false,
            stall: StallTracker::default(),
        }
    }

    /// Track the ready-state plateau; returns true when it changed
    pub fn observe_ready_state(&mut self, ready_state: ReadyState) -> bool {
        if ready_state == self.prev_ready_state {
            return false;
        }
        self.prev_ready_state = ready_state;
        self.did_fire_large_gap = false;
        true
    }
}

/// Handles of the tasks currently scheduled on behalf of the playhead
#[derive(Debug, Default)]
pub struct ActiveTimers {
    pub gap_jump: Option<TimerHandle>,
    pub trick_play: Option<TimerHandle>,
    pub early_seek: Option<TimerHandle>,
    pub seek_verification: Option<TimerHandle>,
}

impl ActiveTimers {
    /// Take every live handle, leaving none behind
    pub fn drain(&mut self) -> impl Iterator<Item = TimerHandle> {
        [
            self.gap_jump.take(),
            self.trick_play.take(),
            self.early_seek.take(),
            self.seek_verification.take(),
        ]
        .into_iter()
        .flatten()
    }
}
