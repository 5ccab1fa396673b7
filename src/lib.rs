#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::too_many_arguments)]

pub mod errors;
pub mod settings;
pub mod animation;

pub use errors::{KinemaError, Result};
pub use settings::AnimationSettings;
pub use animation::{
    AnimatedComponent, Animatable, AnimationSequence, AnimationSystem, EaseType, FieldAccessor,
    FieldId, PropertyTable, TimelineNode,
};
