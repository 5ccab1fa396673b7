mod values;
pub mod easing;
pub mod binding;
pub mod options;
pub mod keyframe;
pub mod sequence;
pub mod property;
pub mod state;
pub mod modifiers;
pub mod action;
pub mod schedule;
pub mod builder;
pub mod component;
pub mod system;

pub use values::{AnimValue, Color, Values, lerp};
pub use easing::{EaseFamily, EaseMode, EaseType};
pub use binding::{Animatable, BindingCache, ChannelKey, FieldAccessor, FieldId, FieldKey, PropertyBinding};
pub use options::{KeyframeOptions, NoiseOptions, RepeatType, StatePropertyOptions};
pub use keyframe::{FieldKeyframeNode, KeyframeNode, NodeKind, StateKeyframeNode, TimelineNode};
pub use sequence::AnimationSequence;
pub use property::{AnimationProperty, PropertyOverrides, PropertyScope, PropertyTable};
pub use state::{
    ColorProperty, FloatProperty, IntegerProperty, PropertyMap, PropertyMapBuilder, StateBase,
    StateProperty, StatePropertyGroup, StateRegistry, Vector2Property,
};
pub use action::{LoopMode, PlaybackClock};
pub use schedule::{AnimationSchedule, CallbackEvent, ChannelTrack, Cue, PlaybackPhase, Segment, SegmentStatus};
pub use builder::BuildReport;
pub use component::AnimatedComponent;
pub use system::{AnimationSystem, AnimatorKey};
