//! Simulated segment pipeline
//!
//! Appends fixed-length segments ahead of the playhead, clipped to the
//! availability window. Configured holes are never delivered, which leaves
//! gaps in the buffer for the playhead to jump.

use super::media::SimulatedMedia;
use crate::timeline::PresentationTimeline;
use std::collections::BTreeSet;
use tracing::trace;
use vista_common::TimeRange;

/// Seconds of media the pipeline keeps buffered ahead of the position
pub const BUFFER_AHEAD: f64 = 10.0;

#[derive(Debug)]
pub struct SegmentPipeline {
    segment_duration: f64,
    holes: Vec<TimeRange>,
    appended: BTreeSet<i64>,
    segments_appended: usize,
}

impl SegmentPipeline {
    pub fn new(segment_duration: f64, holes: Vec<TimeRange>) -> Self {
        Self {
            segment_duration,
            holes,
            appended: BTreeSet::new(),
            segments_appended: 0,
        }
    }

    /// Total number of segments appended so far
    pub fn segments_appended(&self) -> usize {
        self.segments_appended
    }

    /// Append every missing segment from `position` up to [`BUFFER_AHEAD`]
    ///
    /// Returns the number of segments appended by this call.
    pub fn fill(
        &mut self,
        position: f64,
        media: &SimulatedMedia,
        timeline: &dyn PresentationTimeline,
    ) -> usize {
        let window_start = timeline.segment_availability_start();
        let available_end = timeline.segment_availability_end();
        let duration = timeline.duration();

        // Segments that slid out of a live window are gone
        media.evict_before(window_start);
        let evict_below = (window_start / self.segment_duration).floor() as i64;
        self.appended.retain(|&index| index >= evict_below);

        let mut count = 0;
        let mut index = (position.max(window_start) / self.segment_duration).floor() as i64;
        loop {
            let start = index as f64 * self.segment_duration;
            if start >= position + BUFFER_AHEAD || start >= duration {
                break;
            }
            // Only whole segments are published; the last one is cut at the
            // end of the presentation
            let end = ((index + 1) as f64 * self.segment_duration).min(duration);
            if end > available_end {
                break;
            }
            if self.appended.insert(index) {
                let range = TimeRange::new(start.max(window_start), end);
                let pieces = self.deliverable(range);
                // A segment lost entirely to a hole never reaches the element
                if !pieces.is_empty() {
                    count += 1;
                }
                for piece in pieces {
                    trace!("Appending segment {} ({:.3}..{:.3})", index, piece.start, piece.end);
                    media.append(piece);
                }
            }
            index += 1;
        }

        self.segments_appended += count;
        count
    }

    /// Parts of `range` not covered by a hole
    fn deliverable(&self, range: TimeRange) -> Vec<TimeRange> {
        let mut pieces = vec![range];
        for hole in &self.holes {
            pieces = pieces
                .into_iter()
                .flat_map(|piece| {
                    let mut kept = Vec::with_capacity(2);
                    if hole.end <= piece.start || hole.start >= piece.end {
                        kept.push(piece);
                        return kept;
                    }
                    if hole.start > piece.start {
                        kept.push(TimeRange::new(piece.start, hole.start));
                    }
                    if hole.end < piece.end {
                        kept.push(TimeRange::new(hole.end, piece.end));
                    }
                    kept
                })
                .collect();
        }
        pieces.retain(|piece| piece.end > piece.start);
        pieces
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaElement;
    use crate::sim::timeline::SimulatedTimeline;

    #[test]
    fn test_fill_buffers_ahead_once() {
        let media = SimulatedMedia::new();
        let timeline = SimulatedTimeline::vod(60.0);
        let mut pipeline = SegmentPipeline::new(2.0, Vec::new());

        assert_eq!(pipeline.fill(0.0, &media, &timeline), 5);
        assert_eq!(pipeline.fill(0.0, &media, &timeline), 0);
        assert!(media.buffered().is_buffered(9.5));
        assert!(!media.buffered().is_buffered(10.5));
    }

    #[test]
    fn test_fill_stops_at_duration() {
        let media = SimulatedMedia::new();
        let timeline = SimulatedTimeline::vod(5.0);
        let mut pipeline = SegmentPipeline::new(2.0, Vec::new());

        assert_eq!(pipeline.fill(0.0, &media, &timeline), 3);
        assert_eq!(media.buffered().get(0), Some(&TimeRange::new(0.0, 5.0)));
    }

    #[test]
    fn test_holes_leave_gaps() {
        let media = SimulatedMedia::new();
        let timeline = SimulatedTimeline::vod(60.0);
        let mut pipeline = SegmentPipeline::new(2.0, vec![TimeRange::new(3.0, 3.3)]);

        pipeline.fill(0.0, &media, &timeline);
        let buffered = media.buffered();
        assert_eq!(buffered.len(), 2);
        assert_eq!(buffered.get(0), Some(&TimeRange::new(0.0, 3.0)));
        assert_eq!(buffered.get(1).map(|r| r.start), Some(3.3));
    }

    #[test]
    fn test_segment_inside_hole_not_counted() {
        let media = SimulatedMedia::new();
        let timeline = SimulatedTimeline::vod(60.0);
        let mut pipeline = SegmentPipeline::new(2.0, vec![TimeRange::new(4.0, 6.0)]);

        assert_eq!(pipeline.fill(0.0, &media, &timeline), 4);
        assert_eq!(pipeline.segments_appended(), 4);
        assert!(!media.buffered().is_buffered(5.0));

        // Nothing new past the hole: the lost segment is not retried
        assert_eq!(pipeline.fill(0.0, &media, &timeline), 0);
    }

    #[test]
    fn test_live_window_evicts_old_segments() {
        let media = SimulatedMedia::new();
        let timeline = SimulatedTimeline::live(30.0);
        let mut pipeline = SegmentPipeline::new(2.0, Vec::new());

        pipeline.fill(0.0, &media, &timeline);
        timeline.advance(6.0);
        pipeline.fill(6.0, &media, &timeline);
        assert!(!media.buffered().is_buffered(5.0));
        assert!(media.buffered().is_buffered(6.0));
    }
}
