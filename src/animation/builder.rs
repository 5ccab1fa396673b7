//! Animation build engine.
//!
//! Turns authored sequences into [`ChannelTrack`]s for one target instance:
//!
//! 1. nodes are stable-sorted by time and inactive nodes dropped;
//! 2. field keyframe targets are scaled by their animation property and,
//!    in relative mode, offset by the channel's value live at build start;
//! 3. state keyframes blend each bound channel toward the state's value;
//! 4. consecutive nodes become segments laid end to end, carrying ease,
//!    repeat, modifiers and callbacks.
//!
//! Building never fails. Unresolvable references and unreadable channels
//! are logged, collected in [`BuildReport::warnings`] and fall back to
//! neutral behaviour.

use rustc_hash::FxHashMap;

use crate::animation::binding::{Animatable, BindingCache, ChannelKey, PropertyBinding};
use crate::animation::easing::EaseType;
use crate::animation::keyframe::{FieldKeyframeNode, KeyframeNode, StateKeyframeNode, TimelineNode};
use crate::animation::modifiers::{ModifierStack, RepeatSpec, mix_seed};
use crate::animation::options::KeyframeOptions;
use crate::animation::property::PropertyScope;
use crate::animation::schedule::{ChannelTrack, Cue, Segment, TrackOrigin};
use crate::animation::sequence::AnimationSequence;
use crate::animation::state::{PropertyMap, StateBinding, StateRegistry};
use crate::animation::values::lerp;
use crate::errors::KinemaError;

/// Summary of one build.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub channels: usize,
    pub segments: usize,
    pub cues: usize,
    pub warnings: Vec<KinemaError>,
}

impl BuildReport {
    fn warn(&mut self, err: KinemaError) {
        log::warn!("Animation build: {err}");
        self.warnings.push(err);
    }
}

/// Tracks and cues produced by a build.
#[derive(Debug)]
pub struct BuildOutput<T> {
    pub tracks: Vec<ChannelTrack<T>>,
    pub cues: Vec<Cue>,
    pub report: BuildReport,
}

/// Everything a build reads besides the target and its sequences.
pub struct BuildContext<'a, T: Animatable> {
    pub cache: &'a mut BindingCache<T>,
    pub properties: PropertyScope<'a>,
    pub states: &'a mut StateRegistry<T>,
    /// Non-empty ⇒ field keyframe values are offsets from the live value.
    pub relative_state: &'a str,
    pub noise_seed: u64,
    /// Live values to use instead of reading the target, keyed by channel.
    /// Used to re-resolve against the values captured by an earlier build.
    pub seeds: Option<&'a FxHashMap<ChannelKey, f32>>,
}

impl<T: Animatable> BuildContext<'_, T> {
    /// Builds every active sequence in `sequences` against `target`.
    pub fn build(&mut self, target: &T, sequences: &[AnimationSequence]) -> BuildOutput<T> {
        let mut out = BuildOutput {
            tracks: Vec::new(),
            cues: Vec::new(),
            report: BuildReport::default(),
        };

        for (index, sequence) in sequences.iter().enumerate() {
            if !sequence.active {
                continue;
            }
            match sequence.channel {
                Some(channel) => self.build_field_sequence(target, index, sequence, channel, &mut out),
                None => self.build_state_sequence(target, index, sequence, &mut out),
            }
        }

        out.report.channels = out.tracks.len();
        out.report.segments = out.tracks.iter().map(|t| t.segments.len()).sum();
        out.report.cues = out.cues.len();
        log::debug!(
            "Built {} channel(s), {} segment(s), {} cue(s), {} warning(s)",
            out.report.channels,
            out.report.segments,
            out.report.cues,
            out.report.warnings.len()
        );
        out
    }

    /// Resolves a binding and the live value of `channel`.
    fn bind_channel(
        &mut self,
        target: &T,
        channel: ChannelKey,
        report: &mut BuildReport,
    ) -> Option<(PropertyBinding<T>, f32)> {
        let binding = match self.cache.bind(channel.key) {
            Ok(binding) => binding,
            Err(err) => {
                report.warn(err);
                return None;
            }
        };
        if usize::from(channel.component) >= binding.arity() {
            report.warn(KinemaError::ArityMismatch {
                field: channel.key.field,
                expected: binding.arity(),
                actual: usize::from(channel.component) + 1,
            });
            return None;
        }
        if let Some(seed) = self.seeds.and_then(|seeds| seeds.get(&channel)) {
            return Some((binding, *seed));
        }
        match binding.read_component(target, channel.component) {
            Ok(live) => Some((binding, live)),
            Err(err) => {
                report.warn(err);
                None
            }
        }
    }

    // ========================================================================
    // Field sequences
    // ========================================================================

    fn build_field_sequence(
        &mut self,
        target: &T,
        index: usize,
        sequence: &AnimationSequence,
        channel: ChannelKey,
        out: &mut BuildOutput<T>,
    ) {
        let nodes: Vec<(&TimelineNode, &FieldKeyframeNode)> = sequence
            .sorted_nodes()
            .into_iter()
            .filter(|node| node.active)
            .filter_map(|node| node.as_field().map(|field| (node, field)))
            .collect();
        if nodes.is_empty() {
            return;
        }

        let Some((binding, live)) = self.bind_channel(target, channel, &mut out.report) else {
            return;
        };

        let relative = !self.relative_state.is_empty();
        let mut chain = ChainBuilder::new(live, mix_seed(self.noise_seed, &[index as u64]));

        for (node, field) in nodes {
            let multiplier = match self.properties.multiplier(field.property.as_deref()) {
                Ok(multiplier) => multiplier,
                Err(err) => {
                    out.report.warn(err);
                    1.0
                }
            };
            let options = field.options.unwrap_or_default();
            let mut target_value = field.value * multiplier;
            // Relative offsets are taken once, against the value live at build start.
            if relative || options.is_relative {
                target_value += live;
            }
            chain.push(node.time, target_value, &field.header, &field.header.ease, &options);
        }

        let mut track = ChannelTrack::new(channel, binding, TrackOrigin::Field(index), live);
        let (segments, cues) = chain.finish(Some(channel));
        track.replace_segments(segments);
        out.cues.extend(cues);
        out.tracks.push(track);
    }

    // ========================================================================
    // State sequences
    // ========================================================================

    fn build_state_sequence(
        &mut self,
        target: &T,
        index: usize,
        sequence: &AnimationSequence,
        out: &mut BuildOutput<T>,
    ) {
        let nodes: Vec<(&TimelineNode, &StateKeyframeNode)> = sequence
            .sorted_nodes()
            .into_iter()
            .filter(|node| node.active)
            .filter_map(|node| node.as_state().map(|state| (node, state)))
            .collect();
        if nodes.is_empty() {
            return;
        }

        // Bind every referenced state once.
        let mut maps: FxHashMap<&str, PropertyMap<T>> = FxHashMap::default();
        for name in sequence.state_names() {
            match self.states.bind(name, target, self.cache) {
                Ok(map) => {
                    for err in &map.warnings {
                        log::warn!("State '{name}': {err}");
                    }
                    maps.insert(name, map);
                }
                Err(err) => out.report.warn(err),
            }
        }

        // Every channel any referenced state binds, in first-seen order.
        let mut channels: Vec<ChannelKey> = Vec::new();
        for name in sequence.state_names() {
            let Some(map) = maps.get(name) else { continue };
            for entry in &map.entries {
                for component in 0..entry.target_values.len() {
                    let channel = entry.binding.key.component(component as u8);
                    if !channels.contains(&channel) {
                        channels.push(channel);
                    }
                }
            }
        }

        for channel in channels {
            let Some((binding, live)) = self.bind_channel(target, channel, &mut out.report) else {
                continue;
            };
            let seed = mix_seed(self.noise_seed, &[index as u64, channel_seed(channel)]);
            let mut chain = ChainBuilder::new(live, seed);
            let mut auto_update = false;

            for (node, state) in &nodes {
                let entry = maps
                    .get(state.state_name.as_str())
                    .and_then(|map| map.find(channel.key));
                let Some(entry) = entry else {
                    chain.hold(node.time);
                    continue;
                };
                let Some(goal) = state_goal(entry, channel, live) else {
                    chain.hold(node.time);
                    continue;
                };
                auto_update |= entry.options.auto_update;

                let ease = if entry.options.ease_type_override {
                    entry.options.ease_type
                } else {
                    state.header.ease
                };
                let blended = lerp(chain.value(), goal, state.target_percentage.clamp(0.0, 1.0));
                chain.push(node.time, blended, &state.header, &ease, &entry.options.keyframe);
            }

            if chain.is_empty() {
                continue;
            }
            let mut track = ChannelTrack::new(channel, binding, TrackOrigin::State(index), live);
            track.auto_update = auto_update;
            let (segments, cues) = chain.finish(Some(channel));
            track.replace_segments(segments);
            out.cues.extend(cues);
            out.tracks.push(track);
        }

        // Callbacks on nodes whose state bound nothing still fire.
        for (node, state) in &nodes {
            let bound = maps
                .get(state.state_name.as_str())
                .is_some_and(|map| !map.is_empty());
            if bound {
                continue;
            }
            if let Some(event) = state.header.callback_event() {
                out.cues.push(Cue {
                    time: node.time,
                    name: event.to_string(),
                    channel: None,
                });
            }
        }
    }
}

/// Target value of one channel of a state entry.
fn state_goal<T>(entry: &StateBinding<T>, channel: ChannelKey, live: f32) -> Option<f32> {
    let value = *entry.target_values.get(usize::from(channel.component))?;
    Some(if entry.options.keyframe.is_relative {
        value + live
    } else {
        value
    })
}

fn channel_seed(channel: ChannelKey) -> u64 {
    (u64::from(channel.key.field.0) << 32) ^ ((channel.key.index as u64) << 8) ^ u64::from(channel.component)
}

// ============================================================================
// Chain assembly
// ============================================================================

/// Lays segments end to end for one channel.
struct ChainBuilder {
    /// Value in effect at the end of the chain so far.
    value: f32,
    /// Timeline position where the next segment starts.
    cursor: f32,
    /// Authored time of the previous node.
    last_time: Option<f32>,
    seed: u64,
    segments: Vec<Segment>,
}

impl ChainBuilder {
    fn new(live: f32, seed: u64) -> Self {
        Self {
            value: live,
            cursor: 0.0,
            last_time: None,
            seed,
            segments: Vec::new(),
        }
    }

    fn value(&self) -> f32 {
        self.value
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Lets time pass without a segment.
    fn hold(&mut self, time: f32) {
        match self.last_time {
            Some(last) => self.cursor += (time - last).max(0.0),
            None => self.cursor = time,
        }
        self.last_time = Some(time);
    }

    fn push(
        &mut self,
        time: f32,
        target: f32,
        header: &KeyframeNode,
        ease: &EaseType,
        options: &KeyframeOptions,
    ) {
        let callback = header.callback_event().map(str::to_string);

        let mut segment = match self.last_time {
            // The first node resolves as an immediate set at its own time.
            None => {
                self.cursor = time;
                Segment::snap(time, self.value, target)
            }
            Some(last) => {
                let duration = (time - last).max(0.0);
                if header.set || duration <= 0.0 {
                    Segment::snap(self.cursor + duration, self.value, target)
                } else {
                    let repeat = RepeatSpec::from_options(options);
                    let seed = mix_seed(self.seed, &[self.segments.len() as u64]);
                    let mut tween = Segment::tween(self.cursor, duration, self.value, target, *ease);
                    tween.modifiers = ModifierStack::from_options(options, &repeat, duration, seed);
                    tween.repeat = repeat;
                    tween
                }
            }
        };
        segment.callback = callback;

        self.cursor = segment.end();
        self.value = segment.final_value();
        self.last_time = Some(time);
        self.segments.push(segment);
    }

    fn finish(self, channel: Option<ChannelKey>) -> (Vec<Segment>, Vec<Cue>) {
        let cues = self
            .segments
            .iter()
            .filter_map(|segment| {
                segment.callback.as_ref().map(|name| Cue {
                    time: segment.start,
                    name: name.clone(),
                    channel,
                })
            })
            .collect();
        (self.segments, cues)
    }
}
