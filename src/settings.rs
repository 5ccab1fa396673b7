//! Animation Settings
//!
//! Engine-wide knobs consumed by [`AnimationSystem`](crate::animation::AnimationSystem)
//! and [`AnimatedComponent`](crate::animation::AnimatedComponent) when they build
//! and play schedules.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use kinema::settings::AnimationSettings;
//! use kinema::animation::LoopMode;
//!
//! // Defaults: play once, real-time, per-channel callbacks
//! let settings = AnimationSettings::default();
//!
//! // Looping editor preview at half speed
//! let preview = AnimationSettings {
//!     loop_mode: LoopMode::Loop,
//!     time_scale: 0.5,
//!     ..Default::default()
//! };
//!
//! // Or straight from a project file
//! let settings = AnimationSettings::from_json(r#"{ "noise_seed": 7 }"#)?;
//! ```

use serde::{Deserialize, Serialize};

use crate::animation::action::LoopMode;
use crate::errors::Result;

/// Global configuration for animation builds and playback.
///
/// # Fields
///
/// | Field           | Description                                         | Default |
/// |-----------------|-----------------------------------------------------|---------|
/// | `noise_seed`    | Base seed for noise and shake sample generation     | `0`     |
/// | `time_scale`    | Multiplier applied to every tick's delta time       | `1.0`   |
/// | `loop_mode`     | What happens when a timeline reaches its end        | `Once`  |
/// | `step_callback` | Collapse same-step callbacks across channels        | `false` |
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    /// Base seed for the modifier stack.
    ///
    /// Noise and shake samples are derived from this seed plus the channel
    /// and segment position, so rebuilding the same authored data always
    /// produces the same motion.
    pub noise_seed: u64,

    /// Playback speed multiplier. Negative values play backwards.
    pub time_scale: f32,

    /// Default loop mode for newly built schedules.
    pub loop_mode: LoopMode,

    /// Default for [`AnimatedComponent::step_callback`](crate::animation::AnimatedComponent).
    pub step_callback: bool,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            noise_seed: 0,
            time_scale: 1.0,
            loop_mode: LoopMode::Once,
            step_callback: false,
        }
    }
}

impl AnimationSettings {
    /// Parses settings from JSON. Missing keys take their default value.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let settings = AnimationSettings::from_json(r#"{ "noise_seed": 7, "loop_mode": "PingPong" }"#)
            .expect("valid settings");
        assert_eq!(settings.noise_seed, 7);
        assert_eq!(settings.loop_mode, LoopMode::PingPong);
        assert_eq!(settings.time_scale, 1.0);
        assert!(!settings.step_callback);
    }

    #[test]
    fn malformed_json_is_an_error() {
        assert!(AnimationSettings::from_json("{ noise_seed: }").is_err());
    }
}
