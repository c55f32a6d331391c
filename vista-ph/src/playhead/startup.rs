//! Start position resolution and early-seek batching

use super::{Playhead, StartupPhase, EARLY_SEEK_DELAY, SEEK_EPSILON};
use crate::timer::TimerTask;
use tracing::{debug, trace};
use vista_common::time::{format_position, within};

impl Playhead {
    /// Logical playhead position in seconds
    ///
    /// Before metadata loads this is the resolved start position. Afterwards
    /// it is the element's position, clamped to the availability window unless
    /// the element is paused (a paused live stream stops buffering and may
    /// legitimately drift out of the window).
    pub fn time(&mut self) -> f64 {
        if self.media.ready_state().has_metadata() {
            let current = self.media.current_time();
            if self.media.paused() {
                return current;
            }
            // The element may have moved before its 'seeking' event reached us
            return self.clamp_to_window(current);
        }
        self.resolve_start_time()
    }

    /// Replace the start position
    ///
    /// With metadata loaded this seeks right away, clamped to the window.
    pub fn set_start_time(&mut self, start_time: f64) {
        if self.media.ready_state().has_metadata() {
            let target = self.clamp_to_window(start_time);
            debug!("Applying start time {} immediately", format_position(target));
            self.media.set_current_time(target);
        } else {
            self.state.start_time = Some(self.clamp_seek_to_duration(start_time.max(0.0)));
        }
    }

    /// Resolve (and cache) the initial position
    ///
    /// A computed live-edge start is cached: recomputing it each call would
    /// keep chasing the moving edge and never be reached.
    pub(super) fn resolve_start_time(&mut self) -> f64 {
        if let Some(start_time) = self.state.start_time {
            return self.clamp_to_window(start_time);
        }

        let computed = if self.timeline.duration().is_finite() {
            // Static content, or live content that has finished
            self.timeline.segment_availability_start()
        } else {
            self.timeline.seek_range_end()
        };

        let resolved = self.clamp_seek_to_duration(computed);
        self.state.start_time = Some(resolved);
        resolved
    }

    pub(super) fn on_loaded_metadata(&mut self) {
        let target = self.resolve_start_time();

        // Leaving the early-seek phase. Cancelling matters: some engines fire
        // a position update right before metadata, which would otherwise land
        // a stale batch after metadata is known.
        if let Some(handle) = self.active.early_seek.take() {
            self.timers.cancel(handle);
        }

        let current = self.media.current_time();
        if within(current, target, SEEK_EPSILON) {
            self.phase = StartupPhase::MetadataResolved {
                start_seek_pending: false,
            };
            debug!("Metadata loaded, already at start {}", format_position(target));
        } else {
            self.phase = StartupPhase::MetadataResolved {
                start_seek_pending: true,
            };
            debug!(
                "Metadata loaded, moving from {} to start {}",
                format_position(current),
                format_position(target)
            );
            self.media.set_current_time(target);
        }
    }

    /// The element acknowledged the seek to the start position
    pub(super) fn on_seeking_to_start_time(&mut self) {
        debug_assert!(
            self.media.ready_state().has_metadata(),
            "ready state should be past HaveNothing when seeking to start"
        );
        trace!("Start seek acknowledged");
        self.phase = StartupPhase::MetadataResolved {
            start_seek_pending: false,
        };
    }

    /// A position update before metadata means the user seeked; the reported
    /// position is not updated yet, so coalesce updates and read it later
    pub(super) fn on_position_update_before_metadata(&mut self) {
        if let Some(handle) = self.active.early_seek.take() {
            self.timers.cancel(handle);
        }
        self.active.early_seek = Some(
            self.timers
                .schedule_once(EARLY_SEEK_DELAY, TimerTask::EarlySeek),
        );
        self.phase = StartupPhase::BatchingEarlySeek;
    }

    pub(super) fn on_early_seek(&mut self) {
        if self.phase.has_metadata() {
            return;
        }
        debug_assert!(
            !self.media.ready_state().has_metadata(),
            "ready state should be HaveNothing for early seeking"
        );

        let current = self.media.current_time();
        let target = self.reposition(current);
        debug!(
            "Early seek to {} remapped to {}",
            format_position(current),
            format_position(target)
        );
        self.state.start_time = Some(target);
        self.phase = StartupPhase::AwaitingMetadata;
    }
}
