//! Test helpers for vista-ph integration tests
//!
//! Provides a [`Harness`] wiring a [`Playhead`] to a simulated element, a
//! simulated timeline, a virtual-clock timer service and a recording observer.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::Duration;

use vista_common::{BufferedRanges, ReadyState};
use vista_ph::media::MediaElement;
use vista_ph::observer::{GapVerdict, LargeGap, PlayheadObserver};
use vista_ph::sim::media::SimulatedMedia;
use vista_ph::sim::timeline::SimulatedTimeline;
use vista_ph::timer::ManualTimers;
use vista_ph::{Playhead, PlayheadConfig};

/// What the playhead reported to its owner
#[derive(Debug, Default)]
pub struct ObserverLog {
    pub seeks: Vec<f64>,
    pub large_gaps: Vec<LargeGap>,
}

/// Observer that records every callback and answers gaps with a fixed verdict
pub struct RecordingObserver {
    log: Arc<Mutex<ObserverLog>>,
    verdict: GapVerdict,
}

impl PlayheadObserver for RecordingObserver {
    fn on_seek_accepted(&mut self, position: f64) {
        self.log.lock().unwrap().seeks.push(position);
    }

    fn on_large_gap(&mut self, gap: &LargeGap) -> GapVerdict {
        self.log.lock().unwrap().large_gaps.push(*gap);
        self.verdict
    }
}

/// Builder for [`Harness`]
pub struct HarnessBuilder {
    timeline: SimulatedTimeline,
    config: PlayheadConfig,
    start_time: Option<f64>,
    buffered: Vec<(f64, f64)>,
    metadata: bool,
    playing: bool,
    position: Option<f64>,
    verdict: GapVerdict,
}

impl HarnessBuilder {
    pub fn config(mut self, config: PlayheadConfig) -> Self {
        self.config = config;
        self
    }

    pub fn start_time(mut self, start_time: f64) -> Self {
        self.start_time = Some(start_time);
        self
    }

    pub fn buffered(mut self, ranges: &[(f64, f64)]) -> Self {
        self.buffered = ranges.to_vec();
        self
    }

    /// Create the playhead before metadata has loaded
    pub fn without_metadata(mut self) -> Self {
        self.metadata = false;
        self
    }

    /// Leave the element paused
    pub fn paused(mut self) -> Self {
        self.playing = false;
        self
    }

    /// Element position before the playhead is created
    pub fn position(mut self, position: f64) -> Self {
        self.position = Some(position);
        self
    }

    pub fn cancel_large_gaps(mut self) -> Self {
        self.verdict = GapVerdict::Cancel;
        self
    }

    pub fn build(self) -> Harness {
        let media = Arc::new(SimulatedMedia::new());
        let timeline = Arc::new(self.timeline);
        let timers = Arc::new(ManualTimers::new());
        let log = Arc::new(Mutex::new(ObserverLog::default()));

        media.set_buffered(BufferedRanges::from_pairs(&self.buffered));
        if let Some(position) = self.position {
            media.user_seek(position);
        }
        if self.metadata {
            media.load_metadata();
        }
        // Events from setting up the element are not the playhead's business
        media.take_events();

        let playhead = Playhead::new(
            media.clone(),
            timeline.clone(),
            timers.clone(),
            Box::new(RecordingObserver {
                log: log.clone(),
                verdict: self.verdict,
            }),
            self.config,
            self.start_time,
        )
        .expect("valid playhead config");

        let mut harness = Harness {
            media,
            timeline,
            timers,
            log,
            playhead: Some(playhead),
        };
        harness.settle();

        if self.playing {
            harness.media.play();
            harness.settle();
        }
        harness
    }
}

/// A playhead under test plus its collaborators
pub struct Harness {
    pub media: Arc<SimulatedMedia>,
    pub timeline: Arc<SimulatedTimeline>,
    pub timers: Arc<ManualTimers>,
    pub log: Arc<Mutex<ObserverLog>>,
    playhead: Option<Playhead>,
}

impl Harness {
    pub fn vod(duration: f64) -> HarnessBuilder {
        Self::builder(SimulatedTimeline::vod(duration))
    }

    pub fn live(start: f64, end: f64) -> HarnessBuilder {
        Self::builder(SimulatedTimeline::with_window(start, end))
    }

    pub fn builder(timeline: SimulatedTimeline) -> HarnessBuilder {
        HarnessBuilder {
            timeline,
            config: PlayheadConfig::default(),
            start_time: None,
            buffered: Vec::new(),
            metadata: true,
            playing: true,
            position: None,
            verdict: GapVerdict::Allow,
        }
    }

    pub fn playhead(&mut self) -> &mut Playhead {
        self.playhead.as_mut().expect("playhead already destroyed")
    }

    /// Deliver queued element events, then let any in-flight seek complete
    /// and deliver what that caused
    pub fn settle(&mut self) {
        self.flush();
        self.media.complete_seek();
        self.flush();
    }

    /// Deliver queued element events without completing seeks
    pub fn flush(&mut self) {
        for _ in 0..32 {
            let events = self.media.take_events();
            if events.is_empty() {
                return;
            }
            if let Some(playhead) = self.playhead.as_mut() {
                for event in events {
                    playhead.handle_event(event);
                }
            }
        }
        panic!("element kept emitting events");
    }

    /// Advance virtual time, delivering timer fires and the events they cause
    /// (seeks are not completed, so the element keeps reporting `seeking`)
    pub fn advance(&mut self, span: Duration) {
        let deadline = self.timers.elapsed() + span;
        while let Some((handle, task)) = self.timers.pop_due(deadline) {
            if let Some(playhead) = self.playhead.as_mut() {
                playhead.on_timer(handle, task);
            }
            self.flush();
        }
        let remaining = deadline.saturating_sub(self.timers.elapsed());
        self.timers.run_for(remaining, |_, _| {});
    }

    /// Like [`Harness::advance`], completing each seek as it lands
    pub fn advance_settled(&mut self, span: Duration) {
        let deadline = self.timers.elapsed() + span;
        while let Some((handle, task)) = self.timers.pop_due(deadline) {
            if let Some(playhead) = self.playhead.as_mut() {
                playhead.on_timer(handle, task);
            }
            self.settle();
        }
        let remaining = deadline.saturating_sub(self.timers.elapsed());
        self.timers.run_for(remaining, |_, _| {});
    }

    /// Position the element currently reports
    pub fn position(&self) -> f64 {
        self.media.current_time()
    }

    pub fn set_buffered(&mut self, ranges: &[(f64, f64)]) {
        self.media.set_buffered(BufferedRanges::from_pairs(ranges));
    }

    pub fn set_ready_state(&mut self, ready_state: ReadyState) {
        self.media.set_ready_state(ready_state);
    }

    pub fn destroy(&mut self) {
        if let Some(playhead) = self.playhead.take() {
            playhead.destroy();
        }
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.log.lock().unwrap().seeks.clone()
    }

    pub fn large_gaps(&self) -> Vec<LargeGap> {
        self.log.lock().unwrap().large_gaps.clone()
    }
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "expected {} but got {}",
        expected,
        actual
    );
}
