//! Authored keyframe model.
//!
//! A [`TimelineNode`] is one authored event on a sequence. Most nodes are
//! keyframes: a [`FieldKeyframeNode`] targets a scalar value, a
//! [`StateKeyframeNode`] blends toward a named state. Plain markers carry
//! only a time and are ignored by the build engine.
//!
//! Serialized keys are stable numeric tags; see [`crate::animation::options`].

use serde::{Deserialize, Serialize};

use crate::animation::easing::EaseType;
use crate::animation::options::KeyframeOptions;

/// Header shared by every keyframe kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyframeNode {
    /// Snap to the target instead of interpolating.
    #[serde(rename = "0")]
    pub set: bool,
    #[serde(rename = "1")]
    pub ease: EaseType,
    #[serde(rename = "2")]
    pub callback: bool,
    /// Event name fired when this keyframe's segment begins.
    #[serde(rename = "3")]
    pub callback_value: String,
}

impl KeyframeNode {
    /// The event to fire at segment start, if any.
    #[must_use]
    pub fn callback_event(&self) -> Option<&str> {
        self.callback.then_some(self.callback_value.as_str())
    }
}

/// Keyframe of one scalar channel.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldKeyframeNode {
    #[serde(flatten)]
    pub header: KeyframeNode,
    #[serde(rename = "10")]
    pub value: f32,
    /// Name of an animation property the value is multiplied by.
    #[serde(rename = "11")]
    pub property: Option<String>,
    #[serde(rename = "12")]
    pub options: Option<KeyframeOptions>,
}

/// Keyframe that blends toward a named state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateKeyframeNode {
    #[serde(flatten)]
    pub header: KeyframeNode,
    #[serde(rename = "10")]
    pub state_name: String,
    /// Blend weight toward the state's values, in `[0, 1]`.
    #[serde(rename = "11")]
    pub target_percentage: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    #[serde(rename = "0")]
    Marker,
    #[serde(rename = "1")]
    Field(FieldKeyframeNode),
    #[serde(rename = "2")]
    State(StateKeyframeNode),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineNode {
    #[serde(rename = "0")]
    pub time: f32,
    #[serde(rename = "1", default = "default_active")]
    pub active: bool,
    #[serde(rename = "2")]
    pub kind: NodeKind,
}

fn default_active() -> bool {
    true
}

impl TimelineNode {
    /// A plain, non-keyframe node.
    #[must_use]
    pub fn marker(time: f32) -> Self {
        Self {
            time,
            active: true,
            kind: NodeKind::Marker,
        }
    }

    #[must_use]
    pub fn field(time: f32, value: f32) -> Self {
        Self {
            time,
            active: true,
            kind: NodeKind::Field(FieldKeyframeNode {
                value,
                ..Default::default()
            }),
        }
    }

    #[must_use]
    pub fn state(time: f32, state_name: impl Into<String>, target_percentage: f32) -> Self {
        Self {
            time,
            active: true,
            kind: NodeKind::State(StateKeyframeNode {
                state_name: state_name.into(),
                target_percentage,
                ..Default::default()
            }),
        }
    }

    // ========================================================================
    // Builder helpers
    // ========================================================================

    #[must_use]
    pub fn with_ease(mut self, ease: EaseType) -> Self {
        if let Some(header) = self.keyframe_mut() {
            header.ease = ease;
        }
        self
    }

    #[must_use]
    pub fn snapped(mut self) -> Self {
        if let Some(header) = self.keyframe_mut() {
            header.set = true;
        }
        self
    }

    #[must_use]
    pub fn with_callback(mut self, event: impl Into<String>) -> Self {
        if let Some(header) = self.keyframe_mut() {
            header.callback = true;
            header.callback_value = event.into();
        }
        self
    }

    /// Multiplies a field keyframe's value by the named property. No-op on
    /// other kinds.
    #[must_use]
    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        if let NodeKind::Field(node) = &mut self.kind {
            node.property = Some(property.into());
        }
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: KeyframeOptions) -> Self {
        if let NodeKind::Field(node) = &mut self.kind {
            node.options = Some(options);
        }
        self
    }

    #[must_use]
    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    // ========================================================================
    // Queries
    // ========================================================================

    #[inline]
    #[must_use]
    pub fn is_keyframe(&self) -> bool {
        !matches!(self.kind, NodeKind::Marker)
    }

    #[must_use]
    pub fn keyframe(&self) -> Option<&KeyframeNode> {
        match &self.kind {
            NodeKind::Marker => None,
            NodeKind::Field(node) => Some(&node.header),
            NodeKind::State(node) => Some(&node.header),
        }
    }

    pub fn keyframe_mut(&mut self) -> Option<&mut KeyframeNode> {
        match &mut self.kind {
            NodeKind::Marker => None,
            NodeKind::Field(node) => Some(&mut node.header),
            NodeKind::State(node) => Some(&mut node.header),
        }
    }

    #[must_use]
    pub fn as_field(&self) -> Option<&FieldKeyframeNode> {
        match &self.kind {
            NodeKind::Field(node) => Some(node),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_state(&self) -> Option<&StateKeyframeNode> {
        match &self.kind {
            NodeKind::State(node) => Some(node),
            _ => None,
        }
    }
}
