//! Animator configuration.

use serde::{Deserialize, Serialize};

/// Fixed cross-fade length used when a clip is interrupted mid-playback.
pub const DEFAULT_BLEND_DURATION: f32 = 0.3;

/// Configuration for animator sizing and playback policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// Wall-clock cross-fade duration in seconds when switching clips.
    pub blend_duration: f32,

    /// Maximum events to retain per tick before backpressure policy applies.
    pub max_events_per_tick: usize,

    /// Initial capacity hint for the per-tick change buffer.
    pub change_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            blend_duration: DEFAULT_BLEND_DURATION,
            max_events_per_tick: 1024,
            change_capacity: 64,
        }
    }
}
