//! Playhead controller
//!
//! **Responsibilities:**
//! - Start position resolution and early-seek batching (`startup`)
//! - Position reconciliation against the availability window (`reposition`)
//! - Periodic gap jumping and stall correction (`gap_jump`)
//! - Corrective seeks with verified application (`seek`)
//! - Buffering holds and trick-play rate emulation (`rate`)
//!
//! The controller is a plain `&mut self` state machine. The owner feeds it
//! media events ([`Playhead::handle_event`]), fired timer tasks
//! ([`Playhead::on_timer`]) and its own requests (rate, buffering, segment
//! appended). Nothing here blocks or locks.

mod gap_jump;
mod rate;
mod reposition;
mod seek;
mod startup;
mod state;

pub use gap_jump::{STALL_NUDGE, STALL_THRESHOLD};
pub use reposition::SEEK_START_OFFSET;
pub use seek::{SeekVerification, SEEK_VERIFY_INTERVAL, SEEK_VERIFY_RETRIES};
pub use state::{PlayheadState, StallTracker, StartupPhase};

use crate::config::PlayheadConfig;
use crate::error::Result;
use crate::media::{MediaElement, MediaEvent};
use crate::observer::PlayheadObserver;
use crate::timeline::PresentationTimeline;
use crate::timer::{TimerHandle, TimerService, TimerTask};
use state::ActiveTimers;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Gap/stall poll cadence
pub const GAP_JUMP_INTERVAL: Duration = Duration::from_millis(250);

/// Reverse-playback step cadence; each step moves `rate / 4` seconds
pub const TRICK_PLAY_INTERVAL: Duration = Duration::from_millis(250);

/// Debounce window for position updates before metadata loads
pub const EARLY_SEEK_DELAY: Duration = Duration::from_millis(100);

/// Positions closer than this (seconds) are considered equal
pub const SEEK_EPSILON: f64 = 0.001;

/// Controls the media element's playback position
pub struct Playhead {
    media: Arc<dyn MediaElement>,
    timeline: Arc<dyn PresentationTimeline>,
    timers: Arc<dyn TimerService>,
    observer: Box<dyn PlayheadObserver>,
    config: PlayheadConfig,
    state: PlayheadState,
    phase: StartupPhase,
    active: ActiveTimers,
}

impl Playhead {
    /// Create a playhead and start controlling `media`
    ///
    /// `start_time` is the requested initial position; `None` starts at the
    /// beginning of static content or at the live edge. If the element already
    /// has metadata the start position is applied immediately.
    pub fn new(
        media: Arc<dyn MediaElement>,
        timeline: Arc<dyn PresentationTimeline>,
        timers: Arc<dyn TimerService>,
        observer: Box<dyn PlayheadObserver>,
        config: PlayheadConfig,
        start_time: Option<f64>,
    ) -> Result<Self> {
        config.validate()?;

        let ready_state = media.ready_state();
        let mut playhead = Self {
            media,
            timeline,
            timers,
            observer,
            config,
            state: PlayheadState::new(None, ready_state),
            phase: StartupPhase::AwaitingMetadata,
            active: ActiveTimers::default(),
        };
        playhead.state.start_time = start_time.map(|t| playhead.clamp_seek_to_duration(t.max(0.0)));

        if ready_state.has_metadata() {
            playhead.on_loaded_metadata();
        }

        // readyState and 'waiting' are not reliable on every engine, so the
        // gap check also runs on a fixed cadence
        playhead.active.gap_jump = Some(
            playhead
                .timers
                .schedule_repeating(GAP_JUMP_INTERVAL, TimerTask::GapJump),
        );

        debug!(
            "Playhead created (ready_state={}, start_time={:?})",
            ready_state, playhead.state.start_time
        );
        Ok(playhead)
    }

    /// Stop controlling the element
    ///
    /// Cancels every scheduled task and releases the collaborators. Consuming
    /// `self` makes any later use of the controller a compile error.
    pub fn destroy(mut self) {
        self.cancel_all_timers();
        debug!("Playhead destroyed");
    }

    fn cancel_all_timers(&mut self) {
        for handle in self.active.drain() {
            self.timers.cancel(handle);
        }
    }

    /// Deliver a media element event
    pub fn handle_event(&mut self, event: MediaEvent) {
        trace!("Media event: {}", event);
        match event {
            MediaEvent::LoadedMetadata => {
                if !self.phase.has_metadata() {
                    self.on_loaded_metadata();
                }
            }
            MediaEvent::TimeUpdate => {
                if !self.phase.has_metadata() {
                    self.on_position_update_before_metadata();
                }
            }
            MediaEvent::Seeking => match self.phase {
                StartupPhase::MetadataResolved {
                    start_seek_pending: true,
                } => self.on_seeking_to_start_time(),
                StartupPhase::MetadataResolved {
                    start_seek_pending: false,
                } => self.on_seeking(),
                _ => {}
            },
            MediaEvent::Playing => {
                if self.phase.is_tracking_seeks() {
                    self.on_playing();
                }
            }
            MediaEvent::Waiting => self.poll_gap_jump(),
            MediaEvent::RateChange => self.on_rate_change(),
        }
    }

    /// Deliver a fired timer task
    ///
    /// Fires for handles the playhead no longer tracks (cancelled while the
    /// fire was in flight) are dropped.
    pub fn on_timer(&mut self, handle: TimerHandle, task: TimerTask) {
        match task {
            TimerTask::GapJump => {
                if self.active.gap_jump == Some(handle) {
                    self.poll_gap_jump();
                }
            }
            TimerTask::TrickPlay => {
                if self.active.trick_play == Some(handle) {
                    self.on_trick_play_tick();
                }
            }
            TimerTask::EarlySeek => {
                if self.active.early_seek == Some(handle) {
                    self.active.early_seek = None;
                    self.on_early_seek();
                }
            }
            TimerTask::VerifySeek(verification) => {
                if self.active.seek_verification == Some(handle) {
                    self.active.seek_verification = None;
                    self.on_verify_seek(verification);
                }
            }
        }
    }

    /// Called by the segment pipeline after each media segment append
    ///
    /// The pipeline keeps buffering forward from what is buffered, so any
    /// unbuffered span before the first range is now known to be a real gap.
    pub fn segment_appended(&mut self) {
        self.state.had_segment_appended = true;
        self.poll_gap_jump();
    }

    pub fn state(&self) -> &PlayheadState {
        &self.state
    }

    pub fn phase(&self) -> StartupPhase {
        self.phase
    }

    pub fn config(&self) -> &PlayheadConfig {
        &self.config
    }

    /// True while a reverse-playback timer is running
    pub fn is_trick_playing(&self) -> bool {
        self.active.trick_play.is_some()
    }

    /// True while a corrective seek is still being verified
    pub fn is_verifying_seek(&self) -> bool {
        self.active.seek_verification.is_some()
    }
}

impl Drop for Playhead {
    fn drop(&mut self) {
        self.cancel_all_timers();
    }
}
