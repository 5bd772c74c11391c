//! Engine tuning
//!
//! Every timing and geometry constant the engine uses lives here with its
//! default. The application embeds [`EngineConfig`] in its YAML config so the
//! values can be tuned without a rebuild.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Scale the grid is centered at once the viewport is known
pub const INITIAL_SCALE: f32 = 0.5;
/// Lowest zoom (whole grid visible)
pub const MIN_SCALE: f32 = 0.1;
/// Highest zoom
pub const MAX_SCALE: f32 = 2.0;
/// Per-tick factor while a zoom button is held
pub const ZOOM_FACTOR: f32 = 1.03;
/// Per-event factor for the mouse wheel
pub const WHEEL_ZOOM_FACTOR: f32 = 1.05;
/// Fraction of the remaining distance covered per recenter tick
pub const CENTER_SMOOTHING_FACTOR: f32 = 0.08;
/// Minimum time between two playback starts (caps overlap at ~8 clips)
pub const MIN_PLAY_INTERVAL_MS: u64 = 125;
/// Lifetime of a trail mark
pub const TRAIL_FADE_MS: u64 = 1000;
/// Pan distance per frame in screen pixels
pub const PAN_SPEED: f32 = 5.0;
/// Interval of the hold-to-zoom tick
pub const ZOOM_TICK_MS: u64 = 10;
/// Delay before the first recenter tick
pub const RECENTER_START_MS: u64 = 10;
/// Interval between recenter ticks
pub const RECENTER_TICK_MS: u64 = 16;
/// Playback stops this many seconds before the clip's end time
pub const STOP_MARGIN_S: f64 = 0.08;
/// Grace period added to the fallback stop timer
pub const FALLBACK_GRACE_MS: u64 = 100;
/// Interval at which live clips are checked against their stop position
pub const STOP_POLL_MS: u64 = 15;
/// Exponent of the spotlight luminance curve
pub const SPOTLIGHT_GAMMA: f32 = 4.0;

/// Engine tunables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub initial_scale: f32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub zoom_factor: f32,
    pub wheel_zoom_factor: f32,
    pub center_smoothing_factor: f32,
    pub min_play_interval_ms: u64,
    pub trail_fade_ms: u64,
    pub pan_speed: f32,
    pub zoom_tick_ms: u64,
    pub recenter_start_ms: u64,
    pub recenter_tick_ms: u64,
    pub stop_margin_s: f64,
    pub fallback_grace_ms: u64,
    pub stop_poll_ms: u64,
    pub spotlight_gamma: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            initial_scale: INITIAL_SCALE,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
            zoom_factor: ZOOM_FACTOR,
            wheel_zoom_factor: WHEEL_ZOOM_FACTOR,
            center_smoothing_factor: CENTER_SMOOTHING_FACTOR,
            min_play_interval_ms: MIN_PLAY_INTERVAL_MS,
            trail_fade_ms: TRAIL_FADE_MS,
            pan_speed: PAN_SPEED,
            zoom_tick_ms: ZOOM_TICK_MS,
            recenter_start_ms: RECENTER_START_MS,
            recenter_tick_ms: RECENTER_TICK_MS,
            stop_margin_s: STOP_MARGIN_S,
            fallback_grace_ms: FALLBACK_GRACE_MS,
            stop_poll_ms: STOP_POLL_MS,
            spotlight_gamma: SPOTLIGHT_GAMMA,
        }
    }
}

impl EngineConfig {
    /// Clamp values into ranges the engine can work with
    ///
    /// Scales must be positive and ordered, zoom factors must be > 1 and the
    /// smoothing factor must lie in (0, 1] so recentering terminates.
    pub fn validate(&mut self) {
        let defaults = Self::default();

        if !(self.min_scale > 0.0) {
            self.min_scale = defaults.min_scale;
        }
        if !(self.max_scale >= self.min_scale) {
            self.max_scale = self.min_scale.max(defaults.max_scale);
        }
        if !self.initial_scale.is_finite() {
            self.initial_scale = defaults.initial_scale;
        }
        self.initial_scale = self.initial_scale.clamp(self.min_scale, self.max_scale);

        if !(self.zoom_factor > 1.0) {
            self.zoom_factor = defaults.zoom_factor;
        }
        if !(self.wheel_zoom_factor > 1.0) {
            self.wheel_zoom_factor = defaults.wheel_zoom_factor;
        }
        if !(self.center_smoothing_factor > 0.0 && self.center_smoothing_factor <= 1.0) {
            self.center_smoothing_factor = defaults.center_smoothing_factor;
        }
        if !(self.pan_speed >= 0.0) {
            self.pan_speed = defaults.pan_speed;
        }
        if !(self.spotlight_gamma > 0.0) {
            self.spotlight_gamma = defaults.spotlight_gamma;
        }
        if !(self.stop_margin_s >= 0.0) {
            self.stop_margin_s = defaults.stop_margin_s;
        }

        // Zero intervals would make periodic tasks fire on every poll
        self.zoom_tick_ms = self.zoom_tick_ms.max(1);
        self.recenter_tick_ms = self.recenter_tick_ms.max(1);
        self.stop_poll_ms = self.stop_poll_ms.max(1);
        self.trail_fade_ms = self.trail_fade_ms.max(1);
    }

    pub fn min_play_interval(&self) -> Duration {
        Duration::from_millis(self.min_play_interval_ms)
    }

    pub fn trail_fade(&self) -> Duration {
        Duration::from_millis(self.trail_fade_ms)
    }

    pub fn zoom_tick(&self) -> Duration {
        Duration::from_millis(self.zoom_tick_ms)
    }

    pub fn recenter_start(&self) -> Duration {
        Duration::from_millis(self.recenter_start_ms)
    }

    pub fn recenter_tick(&self) -> Duration {
        Duration::from_millis(self.recenter_tick_ms)
    }

    pub fn fallback_grace(&self) -> Duration {
        Duration::from_millis(self.fallback_grace_ms)
    }

    pub fn stop_poll(&self) -> Duration {
        Duration::from_millis(self.stop_poll_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let mut config = EngineConfig::default();
        let before = config.clone();
        config.validate();
        assert_eq!(config, before);
    }

    #[test]
    fn test_validate_orders_scales() {
        let mut config = EngineConfig {
            min_scale: -1.0,
            max_scale: 0.01,
            initial_scale: 9.0,
            ..EngineConfig::default()
        };
        config.validate();
        assert_eq!(config.min_scale, MIN_SCALE);
        assert!(config.max_scale >= config.min_scale);
        assert!(config.initial_scale <= config.max_scale);
    }

    #[test]
    fn test_validate_rejects_degenerate_factors() {
        let mut config = EngineConfig {
            zoom_factor: 1.0,
            wheel_zoom_factor: 0.5,
            center_smoothing_factor: 0.0,
            recenter_tick_ms: 0,
            ..EngineConfig::default()
        };
        config.validate();
        assert_eq!(config.zoom_factor, ZOOM_FACTOR);
        assert_eq!(config.wheel_zoom_factor, WHEEL_ZOOM_FACTOR);
        assert_eq!(config.center_smoothing_factor, CENTER_SMOOTHING_FACTOR);
        assert_eq!(config.recenter_tick_ms, 1);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"pan_speed": 8.0}"#).unwrap();
        assert_eq!(config.pan_speed, 8.0);
        assert_eq!(config.trail_fade_ms, TRAIL_FADE_MS);
    }
}
