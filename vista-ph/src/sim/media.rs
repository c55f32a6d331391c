//! Simulated media element
//!
//! Holds the properties a real element would report and queues the events it
//! would emit. Nothing is decoded: the position advances with the applied rate
//! while it sits inside a buffered range.

use crate::media::{MediaElement, MediaEvent};
use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};
use vista_common::{BufferedRanges, ReadyState, TimeRange};

/// Buffered media ahead of the position needed to report `HaveEnoughData`
const ENOUGH_DATA_AHEAD: f64 = 2.0;

/// Buffered media ahead of the position needed to report `HaveFutureData`
const FUTURE_DATA_AHEAD: f64 = 0.5;

#[derive(Debug)]
struct MediaInner {
    current_time: f64,
    paused: bool,
    seeking: bool,
    ready_state: ReadyState,
    buffered: BufferedRanges,
    playback_rate: f64,
    events: VecDeque<MediaEvent>,
    seek_writes: usize,
    rate_writes: usize,
    ignore_seeks: usize,
    frozen: bool,
}

/// In-memory media element
#[derive(Debug)]
pub struct SimulatedMedia {
    inner: Mutex<MediaInner>,
}

impl SimulatedMedia {
    /// A fresh element: no metadata, paused at zero, nothing buffered
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MediaInner {
                current_time: 0.0,
                paused: true,
                seeking: false,
                ready_state: ReadyState::HaveNothing,
                buffered: BufferedRanges::empty(),
                playback_rate: 1.0,
                events: VecDeque::new(),
                seek_writes: 0,
                rate_writes: 0,
                ignore_seeks: 0,
                frozen: false,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, MediaInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Metadata arrived
    pub fn load_metadata(&self) {
        let mut inner = self.lock();
        if inner.ready_state == ReadyState::HaveNothing {
            inner.ready_state = ReadyState::HaveMetadata;
            inner.events.push_back(MediaEvent::LoadedMetadata);
            Self::refresh_ready_state(&mut inner);
        }
    }

    /// Force a ready state (no event is emitted)
    pub fn set_ready_state(&self, ready_state: ReadyState) {
        self.lock().ready_state = ready_state;
    }

    pub fn play(&self) {
        let mut inner = self.lock();
        if inner.paused {
            inner.paused = false;
            if inner.ready_state >= ReadyState::HaveFutureData {
                inner.events.push_back(MediaEvent::Playing);
            }
        }
    }

    pub fn pause(&self) {
        self.lock().paused = true;
    }

    /// Replace the buffered ranges
    pub fn set_buffered(&self, buffered: BufferedRanges) {
        let mut inner = self.lock();
        inner.buffered = buffered;
        Self::refresh_ready_state(&mut inner);
    }

    /// Add one appended segment
    pub fn append(&self, range: TimeRange) {
        let mut inner = self.lock();
        inner.buffered.insert(range);
        Self::refresh_ready_state(&mut inner);
    }

    /// Drop buffered media before `time`
    pub fn evict_before(&self, time: f64) {
        self.lock().buffered.evict_before(time);
    }

    /// A user seek (from native controls, say)
    pub fn user_seek(&self, time: f64) {
        let mut inner = self.lock();
        Self::write_position(&mut inner, time);
    }

    /// Ignore the next `count` position writes, like engines that drop
    /// redundant re-seeks
    pub fn ignore_next_seeks(&self, count: usize) {
        self.lock().ignore_seeks = count;
    }

    /// Stop the position from advancing even when data is available
    pub fn set_frozen(&self, frozen: bool) {
        self.lock().frozen = frozen;
    }

    /// Change the applied rate from outside (native controls)
    pub fn user_set_rate(&self, rate: f64) {
        let mut inner = self.lock();
        inner.playback_rate = rate;
        inner.events.push_back(MediaEvent::RateChange);
    }

    /// Finish any in-flight seek, as the engine would once it has data
    pub fn complete_seek(&self) {
        let mut inner = self.lock();
        if inner.seeking {
            inner.seeking = false;
            Self::refresh_ready_state(&mut inner);
            if !inner.paused && inner.ready_state >= ReadyState::HaveFutureData {
                inner.events.push_back(MediaEvent::Playing);
            }
        }
    }

    /// Advance playback by `dt` seconds of wall time
    ///
    /// Completes a pending seek, moves the position forward within the
    /// current buffered range and emits `timeupdate`/`waiting` as a real
    /// element would.
    pub fn advance(&self, dt: f64) {
        self.complete_seek();

        let mut inner = self.lock();
        if !inner.ready_state.has_metadata() || inner.paused || inner.frozen {
            return;
        }

        let was_playable = inner.ready_state >= ReadyState::HaveFutureData;
        let rate = inner.playback_rate;
        if rate > 0.0 {
            let ahead = inner.buffered.buffered_ahead_of(inner.current_time);
            let step = (dt * rate).min(ahead);
            if step > 0.0 {
                inner.current_time += step;
                inner.events.push_back(MediaEvent::TimeUpdate);
            }
        }

        Self::refresh_ready_state(&mut inner);
        if was_playable && inner.ready_state < ReadyState::HaveFutureData {
            inner.events.push_back(MediaEvent::Waiting);
        } else if !was_playable && inner.ready_state >= ReadyState::HaveFutureData {
            inner.events.push_back(MediaEvent::Playing);
        }
    }

    /// Take all queued events, oldest first
    pub fn take_events(&self) -> Vec<MediaEvent> {
        self.lock().events.drain(..).collect()
    }

    /// Number of position writes attempted (including ignored ones)
    pub fn seek_writes(&self) -> usize {
        self.lock().seek_writes
    }

    /// Number of applied-rate writes
    pub fn rate_writes(&self) -> usize {
        self.lock().rate_writes
    }

    fn write_position(inner: &mut MediaInner, time: f64) {
        inner.seek_writes += 1;
        if inner.ignore_seeks > 0 {
            inner.ignore_seeks -= 1;
            return;
        }
        inner.current_time = time;
        if inner.ready_state.has_metadata() {
            inner.seeking = true;
            inner.events.push_back(MediaEvent::Seeking);
        } else {
            // Before metadata there is no seeking event, only the position
            // update
            inner.events.push_back(MediaEvent::TimeUpdate);
        }
    }

    fn refresh_ready_state(inner: &mut MediaInner) {
        if !inner.ready_state.has_metadata() {
            return;
        }
        let ahead = inner.buffered.buffered_ahead_of(inner.current_time);
        inner.ready_state = if inner.seeking {
            ReadyState::HaveMetadata
        } else if ahead >= ENOUGH_DATA_AHEAD {
            ReadyState::HaveEnoughData
        } else if ahead >= FUTURE_DATA_AHEAD {
            ReadyState::HaveFutureData
        } else if inner.buffered.is_buffered(inner.current_time) {
            ReadyState::HaveCurrentData
        } else {
            ReadyState::HaveMetadata
        };
    }
}

impl Default for SimulatedMedia {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for SimulatedMedia {
    fn current_time(&self) -> f64 {
        self.lock().current_time
    }

    fn set_current_time(&self, time: f64) {
        let mut inner = self.lock();
        Self::write_position(&mut inner, time);
    }

    fn paused(&self) -> bool {
        self.lock().paused
    }

    fn seeking(&self) -> bool {
        self.lock().seeking
    }

    fn ready_state(&self) -> ReadyState {
        self.lock().ready_state
    }

    fn buffered(&self) -> BufferedRanges {
        self.lock().buffered.clone()
    }

    fn playback_rate(&self) -> f64 {
        self.lock().playback_rate
    }

    fn set_playback_rate(&self, rate: f64) {
        let mut inner = self.lock();
        inner.rate_writes += 1;
        if inner.playback_rate != rate {
            inner.playback_rate = rate;
            inner.events.push_back(MediaEvent::RateChange);
        }
    }
}
