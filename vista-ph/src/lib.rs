//! # Vista Playhead Library (vista-ph)
//!
//! Playhead controller for streamed media.
//!
//! **Purpose:** Keep a media element's playback position consistent with a
//! moving (possibly live) presentation timeline: resolve the start position,
//! clamp seeks into the availability window, jump buffered gaps, unstick
//! stalled engines, and emulate negative-rate trick play.
//!
//! **Architecture:** A single-threaded `&mut self` state machine
//! ([`playhead::Playhead`]) driven by media events and fired timer tasks.
//! Collaborators are injected as trait objects:
//! - [`media::MediaElement`] - the element being controlled
//! - [`timeline::PresentationTimeline`] - availability window queries
//! - [`timer::TimerService`] - scheduling and the wall clock
//! - [`observer::PlayheadObserver`] - owner notifications
//!
//! The [`sim`] module provides simulated collaborators and a tokio driver
//! used by the `vista-ph` binary and the integration tests.

pub mod config;
pub mod error;
pub mod media;
pub mod observer;
pub mod playhead;
pub mod sim;
pub mod timeline;
pub mod timer;

pub use config::PlayheadConfig;
pub use error::{Error, Result};
pub use playhead::Playhead;
