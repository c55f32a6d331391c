//! Simulated playback environment
//!
//! **Responsibilities:**
//! - In-memory media element ([`media::SimulatedMedia`])
//! - Static and sliding presentation timelines ([`timeline::SimulatedTimeline`])
//! - Segment delivery with configurable holes ([`pipeline::SegmentPipeline`])
//! - Wiring those to a [`Playhead`] and stepping them together ([`Simulation`])
//! - A tokio driver with real timers for the binary ([`driver`])
//!
//! [`Simulation`] is synchronous: it works with any [`TimerService`], so tests
//! step it against [`crate::timer::ManualTimers`] while the binary runs it
//! under [`driver::PlayheadDriver`].

pub mod driver;
pub mod media;
pub mod pipeline;
pub mod timeline;

use crate::config::{PlayheadConfig, ScenarioConfig};
use crate::error::Result;
use crate::media::MediaElement;
use crate::observer::PlayheadObserver;
use crate::playhead::Playhead;
use crate::timeline::PresentationTimeline;
use crate::timer::{TimerHandle, TimerService, TimerTask};
use media::SimulatedMedia;
use pipeline::SegmentPipeline;
use std::fmt;
use std::sync::Arc;
use timeline::SimulatedTimeline;
use tracing::{debug, info, warn};
use vista_common::time::format_position;
use vista_common::BufferedRanges;

/// Events delivered per flush before giving up on a feedback loop
const MAX_EVENTS_PER_FLUSH: usize = 256;

/// Within this distance of the end, running out of buffer is not a rebuffer
const END_OF_STREAM_TOLERANCE: f64 = 0.1;

/// Buffering starts when less than this much media (seconds) is buffered ahead
const STARVATION_THRESHOLD: f64 = 0.5;

/// Live start is held this many segments behind the live edge
const LIVE_DELAY_SEGMENTS: f64 = 3.0;

/// Owner requests applied between simulation steps
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SimCommand {
    /// Request a logical playback rate
    SetRate(f64),
    /// Seek as a user would, through the element
    Seek(f64),
    /// Replace the start position (before metadata) or seek to it
    SetStartTime(f64),
    Pause,
    Play,
}

/// Snapshot of a simulation run
#[derive(Debug, Clone, PartialEq)]
pub struct SimulationReport {
    pub position: f64,
    pub playback_rate: f64,
    pub seek_writes: usize,
    pub segments_appended: usize,
    pub rebuffer_count: usize,
    pub buffered: BufferedRanges,
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "position={} rate={} seek_writes={} segments={} rebuffers={} buffered_ranges={}",
            format_position(self.position),
            self.playback_rate,
            self.seek_writes,
            self.segments_appended,
            self.rebuffer_count,
            self.buffered.len()
        )
    }
}

/// A playhead wired to simulated collaborators
pub struct Simulation {
    playhead: Playhead,
    media: Arc<SimulatedMedia>,
    timeline: Arc<SimulatedTimeline>,
    pipeline: SegmentPipeline,
    requested_rate: f64,
    rebuffer_count: usize,
}

impl Simulation {
    /// Build the collaborators described by `scenario` and attach a playhead
    pub fn new(
        scenario: &ScenarioConfig,
        config: PlayheadConfig,
        timers: Arc<dyn TimerService>,
        observer: Box<dyn PlayheadObserver>,
    ) -> Result<Self> {
        scenario.validate()?;

        let timeline = if scenario.live {
            let timeline = SimulatedTimeline::live(scenario.window);
            timeline.set_presentation_delay(LIVE_DELAY_SEGMENTS * scenario.segment_duration);
            timeline
        } else {
            SimulatedTimeline::vod(scenario.duration)
        };
        timeline.set_min_buffer_time(scenario.min_buffer_time);
        let timeline = Arc::new(timeline);
        let media = Arc::new(SimulatedMedia::new());

        let playhead = Playhead::new(
            media.clone(),
            timeline.clone(),
            timers,
            observer,
            config,
            scenario.start_time,
        )?;

        info!(
            "Simulation ready: {} presentation, segments of {}s, {} hole(s)",
            if scenario.live { "live" } else { "static" },
            scenario.segment_duration,
            scenario.holes.len()
        );

        Ok(Self {
            playhead,
            media,
            timeline,
            pipeline: SegmentPipeline::new(scenario.segment_duration, scenario.holes.clone()),
            requested_rate: scenario.playback_rate,
            rebuffer_count: 0,
        })
    }

    pub fn playhead(&self) -> &Playhead {
        &self.playhead
    }

    pub fn playhead_mut(&mut self) -> &mut Playhead {
        &mut self.playhead
    }

    pub fn media(&self) -> &SimulatedMedia {
        &self.media
    }

    pub fn timeline(&self) -> &SimulatedTimeline {
        &self.timeline
    }

    /// Buffer the start position, load metadata and begin playing
    pub fn start(&mut self) {
        let start = self.playhead.time();
        self.pipeline.fill(start, &self.media, self.timeline.as_ref());

        self.media.load_metadata();
        self.flush_events();

        self.media.play();
        self.flush_events();

        if self.requested_rate != 1.0 {
            self.playhead.set_playback_rate(self.requested_rate);
            self.flush_events();
        }
        debug!("Simulation started at {}", format_position(self.media.current_time()));
    }

    /// Advance everything by `dt` seconds
    pub fn step(&mut self, dt: f64) {
        self.timeline.advance(dt);
        self.media.advance(dt);
        self.flush_events();

        if self.media.ready_state().has_metadata() {
            let position = self.media.current_time();
            if self.pipeline.fill(position, &self.media, self.timeline.as_ref()) > 0 {
                self.playhead.segment_appended();
            }
        }

        self.update_buffering();
        self.flush_events();
    }

    /// Deliver a fired timer and whatever it caused
    pub fn on_timer(&mut self, handle: TimerHandle, task: TimerTask) {
        self.playhead.on_timer(handle, task);
        self.flush_events();
    }

    pub fn apply(&mut self, command: SimCommand) {
        debug!("Applying {:?}", command);
        match command {
            SimCommand::SetRate(rate) => {
                self.requested_rate = rate;
                self.playhead.set_playback_rate(rate);
            }
            SimCommand::Seek(time) => self.media.user_seek(time),
            SimCommand::SetStartTime(time) => self.playhead.set_start_time(time),
            SimCommand::Pause => self.media.pause(),
            SimCommand::Play => self.media.play(),
        }
        self.flush_events();
    }

    /// Deliver queued element events until the element goes quiet
    pub fn flush_events(&mut self) {
        let mut delivered = 0;
        loop {
            let events = self.media.take_events();
            if events.is_empty() {
                return;
            }
            for event in events {
                self.playhead.handle_event(event);
                delivered += 1;
            }
            if delivered >= MAX_EVENTS_PER_FLUSH {
                warn!("Element still emitting after {} events, deferring the rest", delivered);
                return;
            }
        }
    }

    /// Hold playback while the buffer is short and release it at the goal
    ///
    /// Buffered media past a gap counts: the playhead will jump the gap, so
    /// only a genuinely empty buffer holds playback.
    fn update_buffering(&mut self) {
        if !self.media.ready_state().has_metadata() || self.media.paused() || self.media.seeking() {
            return;
        }

        let position = self.media.current_time();
        let ahead = total_buffered_ahead(&self.media.buffered(), position);
        let at_end = position + ahead >= self.timeline.duration() - END_OF_STREAM_TOLERANCE;

        if self.playhead.is_buffering() {
            if ahead >= self.playhead.rebuffering_goal() || at_end {
                debug!("Buffered {:.3}s ahead, resuming", ahead);
                self.playhead.set_buffering(false);
            }
        } else if ahead < STARVATION_THRESHOLD && !at_end {
            debug!("Buffer ran dry at {}", format_position(position));
            self.rebuffer_count += 1;
            self.playhead.set_buffering(true);
        }
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            position: self.media.current_time(),
            playback_rate: self.playhead.playback_rate(),
            seek_writes: self.media.seek_writes(),
            segments_appended: self.pipeline.segments_appended(),
            rebuffer_count: self.rebuffer_count,
            buffered: self.media.buffered(),
        }
    }

    /// Detach the playhead and report the final state
    pub fn finish(self) -> SimulationReport {
        let report = self.report();
        self.playhead.destroy();
        report
    }
}

/// Seconds buffered after `position`, summed across every later range
fn total_buffered_ahead(buffered: &BufferedRanges, position: f64) -> f64 {
    buffered
        .iter()
        .filter(|r| r.end > position)
        .map(|r| r.end - r.start.max(position))
        .sum()
}
