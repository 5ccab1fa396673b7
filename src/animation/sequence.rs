use serde::{Deserialize, Serialize};

use crate::animation::binding::ChannelKey;
use crate::animation::keyframe::TimelineNode;
use crate::errors::Result;

/// A named collection of timeline nodes for one channel (field sequences)
/// or for a target's states (state sequences, `channel == None`).
///
/// Nodes are stored in authoring order. The build engine always works on a
/// stable time-sorted view, so sorting on disk is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationSequence {
    #[serde(rename = "0")]
    pub name: String,
    #[serde(rename = "1", default = "default_active")]
    pub active: bool,
    #[serde(rename = "2", default)]
    pub channel: Option<ChannelKey>,
    #[serde(rename = "3", default)]
    pub nodes: Vec<TimelineNode>,
}

fn default_active() -> bool {
    true
}

impl AnimationSequence {
    /// Creates an empty state sequence.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            channel: None,
            nodes: Vec::new(),
        }
    }

    /// Creates an empty sequence driving one channel.
    #[must_use]
    pub fn for_channel(name: impl Into<String>, channel: ChannelKey) -> Self {
        Self {
            channel: Some(channel),
            ..Self::new(name)
        }
    }

    #[must_use]
    pub fn with_node(mut self, node: TimelineNode) -> Self {
        self.nodes.push(node);
        self
    }

    pub fn push(&mut self, node: TimelineNode) {
        self.nodes.push(node);
    }

    /// Sorts nodes by time. Stable: equal times keep their relative order.
    pub fn sort_nodes(&mut self) {
        self.nodes.sort_by(|a, b| a.time.total_cmp(&b.time));
    }

    /// Time-sorted view without touching the stored order.
    #[must_use]
    pub fn sorted_nodes(&self) -> Vec<&TimelineNode> {
        let mut nodes: Vec<&TimelineNode> = self.nodes.iter().collect();
        nodes.sort_by(|a, b| a.time.total_cmp(&b.time));
        nodes
    }

    /// Latest time of any node, active or not. 0 for an empty sequence.
    #[must_use]
    pub fn latest_node_time(&self) -> f32 {
        self.nodes.iter().map(|n| n.time).fold(0.0_f32, f32::max)
    }

    /// Latest time among keyframe nodes, skipping plain markers.
    #[must_use]
    pub fn latest_keyframe_callback_time(&self) -> f32 {
        self.nodes
            .iter()
            .filter(|n| n.is_keyframe())
            .map(|n| n.time)
            .fold(0.0_f32, f32::max)
    }

    /// Distinct state names referenced by state keyframes, in first-seen order.
    #[must_use]
    pub fn state_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for node in &self.nodes {
            if let Some(state) = node.as_state() {
                if !names.contains(&state.state_name.as_str()) {
                    names.push(&state.state_name);
                }
            }
        }
        names
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
