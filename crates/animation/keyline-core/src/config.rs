//! Timeline configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timeline-wide tuning values shared by editing, interpolation and cue dispatch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapping rate in steps per second. The minimum timeline step is its inverse.
    pub snapping: f64,

    /// Tolerance under which an interpolation query counts as landing on a keyframe.
    pub exact_match_epsilon: f64,

    /// Tolerance used when selecting the keyframe nearest to the playhead.
    pub selection_tolerance: f64,

    /// Duration of one display tick at 100% playback speed, in seconds.
    pub frame_duration: f64,

    /// Wall-clock time a sound keyframe stays armed-off after firing.
    pub sound_cooldown_ms: u64,

    /// Output volume in percent (0-100).
    pub volume_percent: f64,

    /// When set, every segment is blended linearly with alpha rounded to 0 or 1.
    pub disable_interpolations: bool,

    /// Round frozen keyframe values (scale to 4 digits, others to 2).
    pub round_frozen_values: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapping: 24.0,
            exact_match_epsilon: 1.0 / 1200.0,
            selection_tolerance: 0.002,
            frame_duration: 1.0 / 60.0,
            sound_cooldown_ms: 400,
            volume_percent: 80.0,
            disable_interpolations: false,
            round_frozen_values: true,
        }
    }
}

impl Config {
    /// Minimum timeline step in seconds (0 when snapping is disabled).
    #[inline]
    pub fn step(&self) -> f64 {
        if self.snapping > 0.0 {
            1.0 / self.snapping.clamp(1.0, 120.0)
        } else {
            0.0
        }
    }

    /// Window inside which two keyframes of one channel are considered the same time.
    #[inline]
    pub fn replace_epsilon(&self) -> f64 {
        let half = self.step() / 2.0;
        if half > 0.0 {
            half
        } else {
            0.01
        }
    }

    /// Snap a time onto the timeline grid; never negative.
    pub fn snap_time(&self, time: f64) -> f64 {
        let step = self.step();
        if step <= 0.0 {
            return time.max(0.0);
        }
        let fps = 1.0 / step;
        ((time * fps).round() / fps).max(0.0)
    }

    /// Width of the sound trigger window at the given playback speed (percent).
    #[inline]
    pub fn trigger_window(&self, speed_percent: f64) -> f64 {
        self.frame_duration * (speed_percent / 100.0)
    }

    #[inline]
    pub fn sound_cooldown(&self) -> Duration {
        Duration::from_millis(self.sound_cooldown_ms)
    }
}
