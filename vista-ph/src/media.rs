//! Media element facade
//!
//! The playhead never touches a decoder or a renderer. It reads and writes a
//! handful of properties on the element it controls and reacts to the element's
//! discrete events.

use vista_common::{BufferedRanges, ReadyState};

/// Discrete events emitted by a media element
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaEvent {
    /// Duration and dimensions became known (ready state left `HaveNothing`)
    LoadedMetadata,

    /// The reported position changed; only meaningful to the playhead before
    /// metadata loads, where it is the only signal of an early user seek
    TimeUpdate,

    /// A seek started (by the user, the application or the playhead itself)
    Seeking,

    /// Playback started or resumed after a stall
    Playing,

    /// Playback stopped because the next frame is not available
    Waiting,

    /// The applied playback rate changed
    RateChange,
}

impl std::fmt::Display for MediaEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaEvent::LoadedMetadata => write!(f, "loadedmetadata"),
            MediaEvent::TimeUpdate => write!(f, "timeupdate"),
            MediaEvent::Seeking => write!(f, "seeking"),
            MediaEvent::Playing => write!(f, "playing"),
            MediaEvent::Waiting => write!(f, "waiting"),
            MediaEvent::RateChange => write!(f, "ratechange"),
        }
    }
}

/// The element whose position the playhead controls
///
/// Writes must not call back into the playhead synchronously; any resulting
/// events are delivered later through [`crate::Playhead::handle_event`].
/// Implementations use interior mutability so the playhead can share the
/// element with its owner.
pub trait MediaElement: Send + Sync {
    /// Reported position in presentation seconds
    fn current_time(&self) -> f64;

    /// Request a seek; engines may ignore redundant writes
    fn set_current_time(&self, time: f64);

    fn paused(&self) -> bool;

    /// True between the start of a seek and its completion
    fn seeking(&self) -> bool;

    fn ready_state(&self) -> ReadyState;

    fn buffered(&self) -> BufferedRanges;

    /// Rate actually applied by the engine (never negative)
    fn playback_rate(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);
}
