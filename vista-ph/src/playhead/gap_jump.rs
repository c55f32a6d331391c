//! Gap jumping and stall correction
//!
//! Runs every [`super::GAP_JUMP_INTERVAL`], on each `waiting` event and after
//! each segment append. Ordering matters: the stall check is only reached when
//! no gap is found, so one poll never applies both corrections.

use super::Playhead;
use crate::observer::{GapVerdict, LargeGap};
use std::time::Duration;
use tracing::{debug, info};
use vista_common::time::format_position;
use vista_common::{BufferedRanges, ReadyState};

/// How long the playhead must sit still before a stall is corrected
pub const STALL_THRESHOLD: Duration = Duration::from_secs(1);

/// Forward nudge applied to unstick a stalled engine (seconds)
pub const STALL_NUDGE: f64 = 0.1;

/// The last part of a buffered range may not play on every engine; a stall
/// this close to the range end is not nudged
const STALL_RANGE_END_MARGIN: f64 = 0.5;

impl Playhead {
    pub(super) fn poll_gap_jump(&mut self) {
        let ready_state = self.media.ready_state();
        // Don't gap jump before the element is ready to play
        if ready_state == ReadyState::HaveNothing {
            return;
        }

        // A seek has begun but its 'seeking' event has not arrived yet
        if self.media.seeking() {
            if !self.state.seeking_event_received {
                return;
            }
        } else {
            self.state.seeking_event_received = false;
        }

        // No jumping while paused, or a paused live stream would keep hopping
        if self.media.paused() {
            return;
        }

        // A new ready-state plateau means playback moved on; re-arm the
        // large-gap notification
        self.state.observe_ready_state(ready_state);

        let current_time = self.media.current_time();
        let buffered = self.media.buffered();

        let availability_start = self.timeline.segment_availability_start();
        if current_time < availability_start {
            // The window slid past the playhead
            let target = self.reposition(current_time);
            info!(
                "Jumping forward {:.3}s to catch up with the availability window",
                target - current_time
            );
            self.move_playhead(current_time, target);
            return;
        }

        let Some(gap_index) = buffered.gap_index(current_time) else {
            self.check_stall(current_time, ready_state, &buffered);
            return;
        };

        // Before the first range this may just be an unbuffered seek; wait
        // for a segment to land before calling it a gap
        if gap_index == 0 && !self.state.had_segment_appended {
            return;
        }

        let Some(next_range) = buffered.get(gap_index).copied() else {
            return;
        };
        let jump_to = next_range.start;

        // The pipeline may buffer past the seek range end; never jump there
        if jump_to >= self.timeline.seek_range_end() {
            return;
        }

        let jump_size = jump_to - current_time;
        let is_gap_small = jump_size <= self.config.small_gap_limit;
        let mut jump_large_gap = false;

        if !is_gap_small && !self.state.did_fire_large_gap {
            self.state.did_fire_large_gap = true;

            let verdict = self.observer.on_large_gap(&LargeGap {
                current_time,
                gap_size: jump_size,
            });

            if self.config.jump_large_gaps && verdict == GapVerdict::Allow {
                jump_large_gap = true;
            } else {
                info!("Ignoring large gap at {}", format_position(current_time));
            }
        }

        if is_gap_small || jump_large_gap {
            if gap_index == 0 {
                info!(
                    "Jumping forward {:.3}s because of gap before start time of {}",
                    jump_size,
                    format_position(jump_to)
                );
            } else {
                let gap_start = buffered
                    .get(gap_index - 1)
                    .map(|r| r.end)
                    .unwrap_or(current_time);
                info!(
                    "Jumping forward {:.3}s because of gap starting at {} and ending at {}",
                    jump_size,
                    format_position(gap_start),
                    format_position(jump_to)
                );
            }
            self.move_playhead(current_time, jump_to);
        }
    }

    /// Some engines freeze in the middle of a buffered range (for example
    /// after seeking in a background tab). A small forward seek flushes the
    /// pipeline; apply it once per stall episode.
    fn check_stall(
        &mut self,
        current_time: f64,
        ready_state: ReadyState,
        buffered: &BufferedRanges,
    ) {
        if ready_state >= ReadyState::HaveFutureData || self.media.playback_rate() <= 0.0 {
            return;
        }

        let now = self.timers.now();
        if self.state.stall.playhead_time != Some(current_time) {
            self.state.stall.restart(current_time, now);
            return;
        }

        if self.state.stall.corrected {
            return;
        }
        let stalled_long_enough = self
            .state
            .stall
            .wall_clock
            .is_some_and(|since| now.saturating_duration_since(since) > STALL_THRESHOLD);
        if !stalled_long_enough {
            return;
        }

        let inside_range = buffered
            .range_containing(current_time)
            .is_some_and(|r| current_time < r.end - STALL_RANGE_END_MARGIN);
        if inside_range {
            debug!(
                "Flushing media pipeline due to stall inside buffered range at {}",
                format_position(current_time)
            );
            self.media.set_current_time(current_time + STALL_NUDGE);
            self.state.stall.playhead_time = Some(self.media.current_time());
            self.state.stall.corrected = true;
        }
    }
}
