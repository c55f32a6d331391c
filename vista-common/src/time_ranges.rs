//! Buffered time range queries
//!
//! A media element reports what it has buffered as an ordered list of
//! half-open `[start, end)` spans in presentation seconds. The playhead uses two
//! questions against that list: "is this exact time buffered?" and "is there a
//! hole starting at or just after this time, and where does the next range
//! begin?".

use serde::{Deserialize, Serialize};

/// Ranges shorter than this are reported by some engines when nothing is
/// actually playable. A lone range of this size is treated as empty.
const DEGENERATE_RANGE_SECONDS: f64 = 1e-4;

/// How close the playhead must be to the end of a buffered range before the
/// following unbuffered span counts as a gap at the playhead.
pub const GAP_TOLERANCE_SECONDS: f64 = 0.1;

/// A single buffered span in presentation seconds
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: f64,
    pub end: f64,
}

impl TimeRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Length of the span in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Inclusive containment, matching how engines report buffered edges
    pub fn contains(&self, time: f64) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Ordered, non-overlapping list of buffered spans
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BufferedRanges {
    ranges: Vec<TimeRange>,
}

impl BufferedRanges {
    /// Build from spans in any order; overlapping or touching spans are merged
    pub fn new(mut ranges: Vec<TimeRange>) -> Self {
        ranges.retain(|r| r.end > r.start);
        ranges.sort_by(|a, b| a.start.total_cmp(&b.start));

        let mut merged: Vec<TimeRange> = Vec::with_capacity(ranges.len());
        for range in ranges {
            match merged.last_mut() {
                Some(last) if range.start <= last.end => {
                    last.end = last.end.max(range.end);
                }
                _ => merged.push(range),
            }
        }

        Self { ranges: merged }
    }

    /// Convenience constructor from `(start, end)` pairs
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Self {
        Self::new(pairs.iter().map(|&(s, e)| TimeRange::new(s, e)).collect())
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.ranges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranges.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TimeRange> {
        self.ranges.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TimeRange> {
        self.ranges.iter()
    }

    /// Add a span, merging with neighbours
    pub fn insert(&mut self, range: TimeRange) {
        let mut ranges = std::mem::take(&mut self.ranges);
        ranges.push(range);
        *self = Self::new(ranges);
    }

    /// Drop everything buffered before `time` (used when a live window slides)
    pub fn evict_before(&mut self, time: f64) {
        self.ranges.retain(|r| r.end > time);
        if let Some(first) = self.ranges.first_mut() {
            first.start = first.start.max(time);
        }
    }

    /// True when nothing usable is buffered
    fn is_effectively_empty(&self) -> bool {
        match self.ranges.as_slice() {
            [] => true,
            [only] => only.duration() < DEGENERATE_RANGE_SECONDS,
            _ => false,
        }
    }

    /// Whether `time` falls inside any buffered range
    pub fn is_buffered(&self, time: f64) -> bool {
        if self.is_effectively_empty() {
            return false;
        }
        self.ranges.iter().any(|r| r.contains(time))
    }

    /// The range containing `time`, if any
    pub fn range_containing(&self, time: f64) -> Option<&TimeRange> {
        self.ranges.iter().find(|r| r.contains(time))
    }

    /// Seconds of contiguous media buffered from `time` onward
    pub fn buffered_ahead_of(&self, time: f64) -> f64 {
        self.ranges
            .iter()
            .find(|r| time >= r.start && time < r.end)
            .map(|r| r.end - time)
            .unwrap_or(0.0)
    }

    /// Index of the first range that starts after `time` with nothing
    /// playable in between.
    ///
    /// Returns `Some(0)` when `time` is before the first range. Returns
    /// `Some(i)` for `i > 0` only when `time` is within
    /// [`GAP_TOLERANCE_SECONDS`] of the end of range `i - 1` (or past it), so a
    /// playhead comfortably inside a range never reports a gap.
    pub fn gap_index(&self, time: f64) -> Option<usize> {
        if self.is_effectively_empty() {
            return None;
        }

        self.ranges.iter().enumerate().position(|(i, r)| {
            r.start > time && (i == 0 || self.ranges[i - 1].end - time <= GAP_TOLERANCE_SECONDS)
        })
    }
}

impl From<Vec<TimeRange>> for BufferedRanges {
    fn from(ranges: Vec<TimeRange>) -> Self {
        Self::new(ranges)
    }
}
