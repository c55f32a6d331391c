//! Buffering holds and playback-rate management
//!
//! Engines only play forward, so negative rates are emulated: the applied rate
//! is held at zero and a timer steps the position back by `rate / 4` every
//! 250ms.

use super::{Playhead, TRICK_PLAY_INTERVAL};
use crate::timer::TimerTask;
use tracing::debug;

impl Playhead {
    /// Hold playback for rebuffering (`true`) or release it (`false`)
    pub fn set_buffering(&mut self, buffering: bool) {
        if buffering != self.state.buffering {
            self.state.buffering = buffering;
            self.set_playback_rate(self.state.playback_rate);
        }
    }

    pub fn is_buffering(&self) -> bool {
        self.state.buffering
    }

    /// Logical playback rate; may be negative
    pub fn playback_rate(&self) -> f64 {
        self.state.playback_rate
    }

    /// Request a logical playback rate
    pub fn set_playback_rate(&mut self, rate: f64) {
        if let Some(handle) = self.active.trick_play.take() {
            self.timers.cancel(handle);
        }

        self.state.playback_rate = rate;
        self.media.set_playback_rate(self.expected_applied_rate());

        // While buffering the timer is deferred; set_buffering(false) comes
        // back through here
        if !self.state.buffering && rate < 0.0 {
            self.active.trick_play = Some(
                self.timers
                    .schedule_repeating(TRICK_PLAY_INTERVAL, TimerTask::TrickPlay),
            );
        }
    }

    /// Rate the element should currently report
    fn expected_applied_rate(&self) -> f64 {
        if self.state.buffering || self.state.playback_rate < 0.0 {
            0.0
        } else {
            self.state.playback_rate
        }
    }

    pub(super) fn on_trick_play_tick(&mut self) {
        let step = self.state.playback_rate / 4.0;
        self.media.set_current_time(self.media.current_time() + step);
    }

    /// The element's rate changed, possibly from native controls
    ///
    /// A reported rate of exactly zero is not taken as a request: some native
    /// controls zero the rate as a side effect of seeking. This also means a
    /// zero rate cannot be set through the element while the logical rate is
    /// negative; pausing still works.
    pub(super) fn on_rate_change(&mut self) {
        let applied = self.media.playback_rate();
        if applied != 0.0 && applied != self.expected_applied_rate() {
            debug!("Element playback rate changed to {}", applied);
            self.set_playback_rate(applied);
        }
    }
}
