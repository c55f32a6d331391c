//! Position reconciliation against the availability window

use super::{Playhead, SEEK_EPSILON};
use tracing::{debug, trace};
use vista_common::time::format_position;

/// Extra offset into the window for corrective seeks. Some engines take a few
/// seconds to start playing after a seek, even when buffered; seeking exactly
/// to the window start would fall out again before playback begins.
pub const SEEK_START_OFFSET: f64 = 5.0;

impl Playhead {
    /// Seconds of media wanted before playback resumes
    pub fn rebuffering_goal(&self) -> f64 {
        self.timeline
            .min_buffer_time()
            .max(self.config.rebuffering_goal)
    }

    /// Never target the exact duration; engines disagree on what happens there
    pub(super) fn clamp_seek_to_duration(&self, time: f64) -> f64 {
        let duration = self.timeline.duration();
        if time >= duration {
            debug_assert!(
                self.config.duration_backoff >= 0.0,
                "duration backoff must be non-negative"
            );
            return duration - self.config.duration_backoff;
        }
        time
    }

    /// Clamp to the segment availability window
    pub(super) fn clamp_to_window(&self, time: f64) -> f64 {
        let start = self.timeline.segment_availability_start();
        if time < start {
            return start;
        }
        let end = self.timeline.segment_availability_end();
        if time > end {
            return end;
        }
        time
    }

    /// Compute where the playhead should be, given a reported position
    ///
    /// Targets are deliberately offset into the window rather than placed on
    /// its edge: every correction produces another `seeking` event which runs
    /// this again, and an edge that keeps moving would loop forever.
    pub fn reposition(&self, current_time: f64) -> f64 {
        let buffered = self.media.buffered();
        let rebuffering_goal = self.rebuffering_goal();

        let start = self.timeline.safe_availability_start(0.0);
        let end = self.timeline.segment_availability_end();
        let duration = self.timeline.duration();

        // Far enough from a moving window start that buffering can finish
        // before the window catches up. Equal to `start` for static content.
        let safe = self.timeline.safe_availability_start(rebuffering_goal);

        let seek_start = self.timeline.safe_availability_start(SEEK_START_OFFSET);
        let seek_safe = self
            .timeline
            .safe_availability_start(rebuffering_goal + SEEK_START_OFFSET);

        if current_time >= duration {
            trace!("Playhead past duration");
            return self.clamp_seek_to_duration(current_time);
        }

        if current_time > end {
            trace!("Playhead past availability end");
            return end;
        }

        if current_time < start {
            if buffered.is_buffered(seek_start) {
                trace!("Playhead before start, start is buffered");
                return seek_start;
            }
            trace!("Playhead before start, start is unbuffered");
            return seek_safe;
        }

        if current_time >= safe || buffered.is_buffered(current_time) {
            trace!("Playhead in safe or buffered region");
            current_time
        } else {
            trace!("Playhead outside safe region and unbuffered");
            seek_safe
        }
    }

    /// Reposition and, if the target differs, correct the element
    ///
    /// Returns true when a corrective seek was issued.
    pub(super) fn reposition_and_correct(&mut self, current_time: f64) -> bool {
        let target = self.reposition(current_time);
        // Only differences of more than a millisecond are corrected
        if (target - current_time).abs() <= SEEK_EPSILON {
            return false;
        }
        debug!(
            "Repositioning {} -> {}",
            format_position(current_time),
            format_position(target)
        );
        self.move_playhead(current_time, target);
        true
    }

    pub(super) fn on_seeking(&mut self) {
        debug_assert!(
            self.media.ready_state().has_metadata(),
            "ready state should be past HaveNothing when seeking"
        );

        self.state.seeking_event_received = true;
        self.state.had_segment_appended = false;

        let current = self.media.current_time();
        if self.reposition_and_correct(current) {
            return;
        }

        trace!("Seek to {} accepted", format_position(current));
        self.state.did_fire_large_gap = false;
        self.observer.on_seek_accepted(current);
    }

    pub(super) fn on_playing(&mut self) {
        debug_assert!(
            self.media.ready_state().has_metadata(),
            "ready state should be past HaveNothing when playing"
        );

        let current = self.media.current_time();
        self.reposition_and_correct(current);
    }
}
