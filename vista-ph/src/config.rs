//! Configuration for vista-ph
//!
//! Two layers:
//! 1. **[`PlayheadConfig`]**: the options the controller itself recognizes.
//! 2. **[`TomlConfig`]**: the bootstrap file read by the `vista-ph` binary,
//!    wrapping a `[playhead]` table together with `[logging]` and the
//!    `[scenario]` the simulation runs.
//!
//! Every field has a built-in default, so an empty or missing file is valid.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;
use vista_common::TimeRange;

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "VISTA_PH_CONFIG";

/// Config file name looked up in the platform config directory
pub const CONFIG_FILE_NAME: &str = "vista-ph.toml";

/// Options recognized by the playhead controller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayheadConfig {
    /// Gaps up to this size (seconds) are jumped without notifying the owner
    pub small_gap_limit: f64,

    /// Whether an uncanceled large-gap notification leads to a jump
    pub jump_large_gaps: bool,

    /// Distance kept from the absolute end of the presentation (seconds).
    /// Seeking exactly to the duration behaves inconsistently across engines.
    pub duration_backoff: f64,

    /// Seconds of media wanted before playback resumes; sizes the safe margin
    pub rebuffering_goal: f64,
}

impl Default for PlayheadConfig {
    fn default() -> Self {
        Self {
            small_gap_limit: 0.5,
            jump_large_gaps: false,
            duration_backoff: 0.001,
            rebuffering_goal: 2.0,
        }
    }
}

impl PlayheadConfig {
    /// Reject values the controller cannot work with
    pub fn validate(&self) -> Result<()> {
        if !(self.duration_backoff >= 0.0) {
            return Err(Error::Config(format!(
                "duration_backoff must be non-negative, got {}",
                self.duration_backoff
            )));
        }
        if !(self.small_gap_limit >= 0.0) {
            return Err(Error::Config(format!(
                "small_gap_limit must be non-negative, got {}",
                self.small_gap_limit
            )));
        }
        if !(self.rebuffering_goal >= 0.0) || !self.rebuffering_goal.is_finite() {
            return Err(Error::Config(format!(
                "rebuffering_goal must be a finite non-negative number, got {}",
                self.rebuffering_goal
            )));
        }
        Ok(())
    }
}

/// Bootstrap configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Controller options
    #[serde(default)]
    pub playhead: PlayheadConfig,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Simulation inputs for the `vista-ph` binary
    #[serde(default)]
    pub scenario: ScenarioConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// What the simulation plays
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScenarioConfig {
    /// Live (sliding window) instead of a static presentation
    pub live: bool,

    /// Presentation length for static content (seconds)
    pub duration: f64,

    /// Availability window length for live content (seconds)
    pub window: f64,

    /// Explicit start position; `None` starts at the natural start point
    pub start_time: Option<f64>,

    /// Logical playback rate requested once playback starts
    pub playback_rate: f64,

    /// How long to run the simulation (seconds)
    pub run_secs: f64,

    /// Length of each appended segment (seconds)
    pub segment_duration: f64,

    /// Spans the segment pipeline never delivers
    pub holes: Vec<TimeRange>,

    /// Manifest minimum buffer time (seconds)
    pub min_buffer_time: f64,

    /// Owner vetoes every large-gap notification
    pub cancel_large_gaps: bool,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            live: false,
            duration: 60.0,
            window: 30.0,
            start_time: None,
            playback_rate: 1.0,
            run_secs: 20.0,
            segment_duration: 2.0,
            holes: Vec::new(),
            min_buffer_time: 0.0,
            cancel_large_gaps: false,
        }
    }
}

impl ScenarioConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.segment_duration > 0.0) {
            return Err(Error::Scenario(format!(
                "segment_duration must be positive, got {}",
                self.segment_duration
            )));
        }
        if !self.live && !(self.duration > 0.0) {
            return Err(Error::Scenario(format!(
                "duration must be positive for static content, got {}",
                self.duration
            )));
        }
        if self.live && !(self.window > 0.0) {
            return Err(Error::Scenario(format!(
                "window must be positive for live content, got {}",
                self.window
            )));
        }
        if !(self.run_secs >= 0.0) {
            return Err(Error::Scenario(format!(
                "run_secs must be non-negative, got {}",
                self.run_secs
            )));
        }
        if let Some(hole) = self.holes.iter().find(|h| !(h.end > h.start)) {
            return Err(Error::Scenario(format!(
                "hole {}..{} is empty or reversed",
                hole.start, hole.end
            )));
        }
        Ok(())
    }
}

impl TomlConfig {
    /// Load and validate; `None` or a missing file yields the defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config: TomlConfig = vista_common::config::load_toml_or_default(path)?;
        if let Some(path) = path {
            info!("Configuration loaded from {}", path.display());
        }
        config.playhead.validate()?;
        config.scenario.validate()?;
        Ok(config)
    }
}
