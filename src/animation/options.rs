//! Per-keyframe and per-state-property options.
//!
//! Serialized keys are the stable numeric tags shared with saved animation
//! data. A tag may be retired but never renumbered or reused.

use serde::{Deserialize, Serialize};

use crate::animation::easing::{EaseMode, EaseType};

/// How a segment behaves on each repeat iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepeatType {
    /// No repeat, regardless of `repeat_count`.
    #[default]
    None,
    /// Jump back to the start value and play forward again.
    Restart,
    /// Alternate direction every iteration.
    Yoyo,
    /// Keep going forward: each iteration starts where the last ended.
    Incremental,
}

/// Value-noise modifier parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NoiseOptions {
    /// Lattice samples per second.
    #[serde(rename = "0")]
    pub step_size_per_second: f32,
    /// Number of octaves, clamped to `1..=16` when the noise is built.
    #[serde(rename = "1")]
    pub lod: u32,
    #[serde(rename = "2")]
    pub start_range: f32,
    #[serde(rename = "3")]
    pub end_range: f32,
    /// Interpolate between lattice samples instead of holding each one.
    #[serde(rename = "4")]
    pub smooth: bool,
    #[serde(rename = "5")]
    pub fade_in: bool,
    #[serde(rename = "6")]
    pub fade_out: bool,
}

impl Default for NoiseOptions {
    fn default() -> Self {
        Self {
            step_size_per_second: 10.0,
            lod: 1,
            start_range: -1.0,
            end_range: 1.0,
            smooth: true,
            fade_in: false,
            fade_out: false,
        }
    }
}

/// Options attached to a field keyframe.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeOptions {
    /// Target is an offset from the value live at build start.
    #[serde(rename = "0")]
    pub is_relative: bool,

    #[serde(rename = "1")]
    pub repeat_type: RepeatType,
    /// Additional runs after the first. 0 or negative disables repeat.
    #[serde(rename = "2")]
    pub repeat_count: i32,
    /// Seconds between runs.
    #[serde(rename = "3")]
    pub repeat_delay: f32,

    #[serde(rename = "4")]
    pub add_noise: bool,
    #[serde(rename = "5")]
    pub noise: NoiseOptions,
    #[serde(rename = "6")]
    pub generate_new_noise_each_iteration: bool,

    #[serde(rename = "7")]
    pub add_shake: bool,
    #[serde(rename = "8")]
    pub shake_range_bottom: f32,
    #[serde(rename = "9")]
    pub shake_range_top: f32,
    /// Seconds between shake samples.
    #[serde(rename = "10")]
    pub shake_update_rate: f32,
    #[serde(rename = "11")]
    pub shake_type: EaseMode,
}

impl Default for KeyframeOptions {
    fn default() -> Self {
        Self {
            is_relative: false,
            repeat_type: RepeatType::None,
            repeat_count: 0,
            repeat_delay: 0.0,
            add_noise: false,
            noise: NoiseOptions::default(),
            generate_new_noise_each_iteration: false,
            add_shake: false,
            shake_range_bottom: -1.0,
            shake_range_top: 1.0,
            shake_update_rate: 0.05,
            shake_type: EaseMode::InOut,
        }
    }
}

impl KeyframeOptions {
    /// Number of extra runs after the first, or 0 when repeat is off.
    #[must_use]
    pub fn effective_repeats(&self) -> u32 {
        if self.repeat_type == RepeatType::None || self.repeat_count <= 0 {
            0
        } else {
            self.repeat_count as u32
        }
    }
}

/// Options attached to a state property.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StatePropertyOptions {
    #[serde(flatten)]
    pub keyframe: KeyframeOptions,
    /// Re-resolve this channel on every state refresh.
    #[serde(rename = "20")]
    pub auto_update: bool,
    #[serde(rename = "21")]
    pub ease_type_override: bool,
    #[serde(rename = "22")]
    pub ease_type: EaseType,
}
