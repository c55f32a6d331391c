//! # Vista Common Library
//!
//! Shared code for the Vista playback crates including:
//! - Buffered time range queries (gap and containment lookups)
//! - Media readiness levels
//! - Event types (PlayheadEvent enum) and the EventBus
//! - Configuration file discovery
//! - Time utilities

pub mod config;
pub mod error;
pub mod events;
pub mod ready_state;
pub mod time;
pub mod time_ranges;

pub use error::{Error, Result};
pub use ready_state::ReadyState;
pub use time_ranges::{BufferedRanges, TimeRange};
