//! Media readiness levels
//!
//! Mirrors the five readiness levels a media element reports (0..=4).
//! Ordering is meaningful: a higher level always implies everything a lower
//! level guarantees, so comparisons like `state < ReadyState::HaveFutureData`
//! read naturally in the controller.

use serde::{Deserialize, Serialize};

/// How much media data the element has available at the current position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum ReadyState {
    /// No information about the media resource
    #[default]
    HaveNothing = 0,

    /// Duration and dimensions are known, no frame data yet
    HaveMetadata = 1,

    /// Data for the current position only
    HaveCurrentData = 2,

    /// Data for the current position and at least a little beyond it
    HaveFutureData = 3,

    /// Enough data to play through without stalling
    HaveEnoughData = 4,
}

impl ReadyState {
    /// Convert a raw readiness level (0..=4); values above 4 saturate
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => ReadyState::HaveNothing,
            1 => ReadyState::HaveMetadata,
            2 => ReadyState::HaveCurrentData,
            3 => ReadyState::HaveFutureData,
            _ => ReadyState::HaveEnoughData,
        }
    }

    /// Raw readiness level (0..=4)
    pub fn level(self) -> u8 {
        self as u8
    }

    /// True once metadata has been loaded
    pub fn has_metadata(self) -> bool {
        self > ReadyState::HaveNothing
    }
}

impl std::fmt::Display for ReadyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReadyState::HaveNothing => write!(f, "HaveNothing"),
            ReadyState::HaveMetadata => write!(f, "HaveMetadata"),
            ReadyState::HaveCurrentData => write!(f, "HaveCurrentData"),
            ReadyState::HaveFutureData => write!(f, "HaveFutureData"),
            ReadyState::HaveEnoughData => write!(f, "HaveEnoughData"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_round_trip() {
        for level in 0..=4u8 {
            assert_eq!(ReadyState::from_level(level).level(), level);
        }
    }

    #[test]
    fn test_out_of_range_level_saturates() {
        assert_eq!(ReadyState::from_level(9), ReadyState::HaveEnoughData);
    }

    #[test]
    fn test_ordering_follows_levels() {
        assert!(ReadyState::HaveNothing < ReadyState::HaveMetadata);
        assert!(ReadyState::HaveCurrentData < ReadyState::HaveFutureData);
        assert!(!ReadyState::HaveNothing.has_metadata());
        assert!(ReadyState::HaveMetadata.has_metadata());
    }

    #[test]
    fn test_serializes_snake_case() {
        let json = serde_json::to_string(&ReadyState::HaveFutureData).unwrap();
        assert_eq!(json, "\"have_future_data\"");
    }
}
