//! Corrective seeks with verified application
//!
//! Some engines silently ignore a position write, particularly a re-seek
//! shortly after another seek. After writing, the playhead re-checks every
//! 100ms and rewrites the target while the element still reports the
//! pre-seek position, up to [`SEEK_VERIFY_RETRIES`] times.

use super::Playhead;
use crate::timer::TimerTask;
use std::time::Duration;
use tracing::debug;
use vista_common::time::format_position;

/// Spacing between verification checks
pub const SEEK_VERIFY_INTERVAL: Duration = Duration::from_millis(100);

/// Maximum number of rewrites for one corrective seek
pub const SEEK_VERIFY_RETRIES: u8 = 10;

/// A corrective seek awaiting confirmation
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SeekVerification {
    /// Position reported before the seek was written
    pub from: f64,
    /// Position that was written
    pub target: f64,
    /// Rewrites still allowed
    pub retries_left: u8,
}

impl Playhead {
    /// Write `target_time` and schedule verification
    ///
    /// A newer corrective seek supersedes a verification still pending for an
    /// older one.
    pub(super) fn move_playhead(&mut self, current_time: f64, target_time: f64) {
        debug!(
            "Moving playhead from {} to {}",
            format_position(current_time),
            format_position(target_time)
        );
        self.media.set_current_time(target_time);

        self.schedule_verification(SeekVerification {
            from: current_time,
            target: target_time,
            retries_left: SEEK_VERIFY_RETRIES,
        });
    }

    fn schedule_verification(&mut self, verification: SeekVerification) {
        if let Some(handle) = self.active.seek_verification.take() {
            self.timers.cancel(handle);
        }
        self.active.seek_verification = Some(self.timers.schedule_once(
            SEEK_VERIFY_INTERVAL,
            TimerTask::VerifySeek(verification),
        ));
    }

    pub(super) fn on_verify_seek(&mut self, verification: SeekVerification) {
        if verification.retries_left == 0 {
            debug!(
                "Giving up on seek to {}, element still at {}",
                format_position(verification.target),
                format_position(verification.from)
            );
            return;
        }

        // Exact comparison: any movement at all means the write was applied
        // (or something else moved the element, which also ends this seek)
        if self.media.current_time() != verification.from {
            return;
        }

        debug!(
            "Seek to {} was ignored, rewriting ({} retries left)",
            format_position(verification.target),
            verification.retries_left - 1
        );
        self.media.set_current_time(verification.target);
        self.schedule_verification(SeekVerification {
            retries_left: verification.retries_left - 1,
            ..verification
        });
    }
}
