//! Shared fixtures for the integration tests.
#![allow(dead_code)]

use glam::Vec2;
use smallvec::smallvec;

use kinema::animation::{
    Animatable, AnimValue, ChannelKey, Color, ColorProperty, FieldAccessor, FieldId, FieldKey,
    FloatProperty, IntegerProperty, PropertyMapBuilder, StateBase, StatePropertyGroup,
    Vector2Property,
};

pub const EPSILON: f32 = 1e-4;

pub fn approx(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

// ============================================================================
// Sprite target
// ============================================================================

pub const POSITION: FieldId = FieldId(1);
pub const ALPHA: FieldId = FieldId(2);
pub const TINT: FieldId = FieldId(3);
pub const LAYER: FieldId = FieldId(4);
pub const POINTS: FieldId = FieldId(5);

#[derive(Debug, Clone, PartialEq)]
pub struct Sprite {
    pub position: Vec2,
    pub alpha: f32,
    pub tint: Color,
    pub layer: i32,
    pub points: Vec<Vec2>,
}

impl Default for Sprite {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            alpha: 0.0,
            tint: Color::WHITE,
            layer: 0,
            points: Vec::new(),
        }
    }
}

impl Animatable for Sprite {
    fn accessor(field: FieldId) -> Option<FieldAccessor<Self>> {
        match field {
            POSITION => Some(FieldAccessor {
                arity: 2,
                get: |s, _| Some(s.position.to_values()),
                set: |s, _, v| {
                    s.position = Vec2::from_values(v);
                    true
                },
            }),
            ALPHA => Some(FieldAccessor {
                arity: 1,
                get: |s, _| Some(smallvec![s.alpha]),
                set: |s, _, v| {
                    s.alpha = v[0];
                    true
                },
            }),
            TINT => Some(FieldAccessor {
                arity: 4,
                get: |s, _| Some(s.tint.to_values()),
                set: |s, _, v| {
                    s.tint = Color::from_values(v);
                    true
                },
            }),
            LAYER => Some(FieldAccessor {
                arity: 1,
                get: |s, _| Some(s.layer.to_values()),
                set: |s, _, v| {
                    s.layer = i32::from_values(v);
                    true
                },
            }),
            POINTS => Some(FieldAccessor {
                arity: 2,
                get: |s, i| s.points.get(i).map(AnimValue::to_values),
                set: |s, i, v| match s.points.get_mut(i) {
                    Some(point) => {
                        *point = Vec2::from_values(v);
                        true
                    }
                    None => false,
                },
            }),
            _ => None,
        }
    }
}

pub fn alpha_channel() -> ChannelKey {
    ChannelKey::scalar(ALPHA)
}

pub fn position_x() -> ChannelKey {
    FieldKey::new(POSITION).component(0)
}

pub fn position_y() -> ChannelKey {
    FieldKey::new(POSITION).component(1)
}

// ============================================================================
// States
// ============================================================================

/// A state over every sprite field.
#[derive(Debug, Clone, Default)]
pub struct SpriteState {
    pub name: String,
    pub position: Vector2Property,
    pub alpha: FloatProperty,
    pub tint: ColorProperty,
    pub layer: IntegerProperty,
    pub points: StatePropertyGroup<Vector2Property>,
}

impl SpriteState {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }
}

impl StateBase<Sprite> for SpriteState {
    fn name(&self) -> &str {
        &self.name
    }

    fn before_update(&mut self, target: &Sprite) {
        self.points.resync(target.points.len());
    }

    fn generate_property_map(&self, _target: &Sprite, map: &mut PropertyMapBuilder<'_, Sprite>) {
        map.bind(&self.position, FieldKey::new(POSITION))
            .bind(&self.alpha, FieldKey::new(ALPHA))
            .bind(&self.tint, FieldKey::new(TINT))
            .bind(&self.layer, FieldKey::new(LAYER))
            .bind_group(&self.points, |map, index, point| {
                map.bind(point, FieldKey::item(POINTS, index));
            });
    }
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
