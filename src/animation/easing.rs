use std::f32::consts::{FRAC_PI_2, PI};

use serde::{Deserialize, Serialize};

/// Direction of an easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseMode {
    In,
    Out,
    #[default]
    InOut,
    /// Constant 1 over the whole span. Used to express a hold, not a curve.
    Fixed,
}

/// Shape of an easing curve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EaseFamily {
    #[default]
    Linear,
    Sine,
    Quad,
    Cubic,
    Quart,
    Quint,
    Expo,
    Circ,
    Back,
    Elastic,
    Bounce,
}

/// An easing curve: a family paired with a direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EaseType {
    pub family: EaseFamily,
    pub mode: EaseMode,
}

impl EaseType {
    pub const LINEAR: Self = Self::new(EaseFamily::Linear, EaseMode::InOut);

    #[must_use]
    pub const fn new(family: EaseFamily, mode: EaseMode) -> Self {
        Self { family, mode }
    }

    /// Maps a linear fraction in `[0, 1]` onto the curve.
    ///
    /// Input outside the unit range is clamped. Every mode except
    /// [`EaseMode::Fixed`] maps 0 to 0 and 1 to 1.
    #[inline]
    #[must_use]
    pub fn ease(&self, t: f32) -> f32 {
        ease(self.family, self.mode, t)
    }
}

#[must_use]
pub fn ease(family: EaseFamily, mode: EaseMode, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match mode {
        EaseMode::Fixed => 1.0,
        EaseMode::In => ease_in(family, t),
        EaseMode::Out => 1.0 - ease_in(family, 1.0 - t),
        EaseMode::InOut => {
            if t < 0.5 {
                ease_in(family, t * 2.0) * 0.5
            } else {
                1.0 - ease_in(family, (1.0 - t) * 2.0) * 0.5
            }
        }
    }
}

/// The "in" half of each family; `Out` and `InOut` are derived by reflection.
fn ease_in(family: EaseFamily, t: f32) -> f32 {
    match family {
        EaseFamily::Linear => t,
        EaseFamily::Sine => 1.0 - (t * FRAC_PI_2).cos(),
        EaseFamily::Quad => t * t,
        EaseFamily::Cubic => t * t * t,
        EaseFamily::Quart => t * t * t * t,
        EaseFamily::Quint => t * t * t * t * t,
        EaseFamily::Expo => {
            if t <= 0.0 {
                0.0
            } else {
                2f32.powf(10.0 * (t - 1.0))
            }
        }
        EaseFamily::Circ => 1.0 - (1.0 - t * t).max(0.0).sqrt(),
        EaseFamily::Back => {
            const S: f32 = 1.701_58;
            t * t * ((S + 1.0) * t - S)
        }
        EaseFamily::Elastic => {
            if t <= 0.0 || t >= 1.0 {
                t
            } else {
                let p = 0.3;
                let s = p / 4.0;
                let t = t - 1.0;
                -(2f32.powf(10.0 * t) * ((t - s) * (2.0 * PI) / p).sin())
            }
        }
        EaseFamily::Bounce => 1.0 - bounce_out(1.0 - t),
    }
}

fn bounce_out(t: f32) -> f32 {
    const N: f32 = 7.5625;
    const D: f32 = 2.75;
    if t < 1.0 / D {
        N * t * t
    } else if t < 2.0 / D {
        let t = t - 1.5 / D;
        N * t * t + 0.75
    } else if t < 2.5 / D {
        let t = t - 2.25 / D;
        N * t * t + 0.9375
    } else {
        let t = t - 2.625 / D;
        N * t * t + 0.984_375
    }
}
