//! Presentation timeline queries
//!
//! The manifest model lives outside this crate; the playhead only needs the
//! availability window and a few derived points on it.

/// Availability-window view of the presentation
///
/// All values are presentation seconds. `duration()` is `f64::INFINITY` for a
/// live presentation that has not ended.
pub trait PresentationTimeline: Send + Sync {
    fn duration(&self) -> f64;

    /// Earliest time for which segments can still be fetched
    fn segment_availability_start(&self) -> f64;

    /// Latest time for which segments can be fetched
    fn segment_availability_end(&self) -> f64;

    /// Availability start moved `margin` seconds into the window, so a seek
    /// there will not fall out of a sliding window while it buffers. For static
    /// presentations this is just the availability start.
    fn safe_availability_start(&self, margin: f64) -> f64;

    /// Furthest point a seek may target (the live edge for live content)
    fn seek_range_end(&self) -> f64;

    /// Minimum buffer the manifest asks for before playback (seconds)
    fn min_buffer_time(&self) -> f64 {
        0.0
    }

    fn is_live(&self) -> bool {
        self.duration().is_infinite()
    }
}
