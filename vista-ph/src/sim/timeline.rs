//! Simulated presentation timeline
//!
//! A static presentation has a fixed `[0, duration]` window. A dynamic one
//! slides its window forward as [`SimulatedTimeline::advance`] is called.

use crate::timeline::PresentationTimeline;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Clone, Copy)]
struct Window {
    dynamic: bool,
    duration: f64,
    start: f64,
    end: f64,
    min_buffer_time: f64,
    presentation_delay: f64,
}

#[derive(Debug)]
pub struct SimulatedTimeline {
    window: Mutex<Window>,
}

impl SimulatedTimeline {
    /// Static presentation of `duration` seconds
    pub fn vod(duration: f64) -> Self {
        Self::from_window(Window {
            dynamic: false,
            duration,
            start: 0.0,
            end: duration,
            min_buffer_time: 0.0,
            presentation_delay: 0.0,
        })
    }

    /// Live presentation whose window is `[0, window]` to begin with
    pub fn live(window: f64) -> Self {
        Self::with_window(0.0, window)
    }

    /// Live presentation with an explicit availability window
    pub fn with_window(start: f64, end: f64) -> Self {
        Self::from_window(Window {
            dynamic: true,
            duration: f64::INFINITY,
            start,
            end,
            min_buffer_time: 0.0,
            presentation_delay: 0.0,
        })
    }

    fn from_window(window: Window) -> Self {
        Self {
            window: Mutex::new(window),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Window> {
        self.window.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn set_min_buffer_time(&self, seconds: f64) {
        self.lock().min_buffer_time = seconds;
    }

    /// Keep the seek range end this far behind the live edge
    pub fn set_presentation_delay(&self, seconds: f64) {
        self.lock().presentation_delay = seconds;
    }

    /// Slide a live window forward by `dt` seconds (no-op for static content)
    pub fn advance(&self, dt: f64) {
        let mut window = self.lock();
        if window.dynamic {
            window.start += dt;
            window.end += dt;
        }
    }

    /// End a live presentation at the current live edge
    pub fn end_of_stream(&self) {
        let mut window = self.lock();
        window.duration = window.end;
    }
}

impl PresentationTimeline for SimulatedTimeline {
    fn duration(&self) -> f64 {
        self.lock().duration
    }

    fn segment_availability_start(&self) -> f64 {
        self.lock().start
    }

    fn segment_availability_end(&self) -> f64 {
        self.lock().end
    }

    fn safe_availability_start(&self, margin: f64) -> f64 {
        let window = self.lock();
        if window.dynamic {
            (window.start + margin).min(window.end)
        } else {
            window.start
        }
    }

    fn seek_range_end(&self) -> f64 {
        let window = self.lock();
        if window.dynamic {
            (window.end - window.presentation_delay).max(window.start)
        } else {
            window.end
        }
    }

    fn min_buffer_time(&self) -> f64 {
        self.lock().min_buffer_time
    }
}
