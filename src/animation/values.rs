use glam::{Vec2, Vec4};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Flat component vector read from or written to a bound field.
///
/// Never wider than a color, so it stays on the stack.
pub type Values = SmallVec<[f32; 4]>;

#[inline]
#[must_use]
pub fn lerp(start: f32, end: f32, t: f32) -> f32 {
    start + (end - start) * t
}

/// RGBA color with `f32` channels.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Color(pub Vec4);

impl Color {
    pub const WHITE: Self = Self(Vec4::ONE);

    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self(Vec4::new(r, g, b, a))
    }
}

/// A value type a state property can hold.
///
/// Conversion to and from the flat numeric vector is what lets the build
/// engine treat every property as a set of independent scalar channels.
pub trait AnimValue: Copy + Clone + Sized {
    /// Number of numeric components.
    const ARITY: usize;

    fn to_values(&self) -> Values;

    /// Builds a value from `values`. Missing components fall back to the
    /// default value's components; extra components are ignored.
    fn from_values(values: &[f32]) -> Self;

    fn default_value() -> Self;
}

impl AnimValue for f32 {
    const ARITY: usize = 1;

    fn to_values(&self) -> Values {
        smallvec::smallvec![*self]
    }

    fn from_values(values: &[f32]) -> Self {
        values.first().copied().unwrap_or(0.0)
    }

    fn default_value() -> Self {
        0.0
    }
}

impl AnimValue for i32 {
    const ARITY: usize = 1;

    fn to_values(&self) -> Values {
        smallvec::smallvec![*self as f32]
    }

    /// Truncates toward zero.
    fn from_values(values: &[f32]) -> Self {
        values.first().map_or(0, |v| v.trunc() as i32)
    }

    fn default_value() -> Self {
        0
    }
}

impl AnimValue for Vec2 {
    const ARITY: usize = 2;

    fn to_values(&self) -> Values {
        smallvec::smallvec![self.x, self.y]
    }

    fn from_values(values: &[f32]) -> Self {
        let get = |i: usize| values.get(i).copied().unwrap_or(0.0);
        Vec2::new(get(0), get(1))
    }

    fn default_value() -> Self {
        Vec2::ZERO
    }
}

impl AnimValue for Color {
    const ARITY: usize = 4;

    fn to_values(&self) -> Values {
        SmallVec::from_buf(self.0.to_array())
    }

    fn from_values(values: &[f32]) -> Self {
        let get = |i: usize, fallback: f32| values.get(i).copied().unwrap_or(fallback);
        Color::rgba(get(0, 1.0), get(1, 1.0), get(2, 1.0), get(3, 1.0))
    }

    fn default_value() -> Self {
        Color::WHITE
    }
}
