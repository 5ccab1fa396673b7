//! Interpolation schedule runtime.
//!
//! A build produces one [`ChannelTrack`] per animated scalar channel. Each
//! track is a chain of [`Segment`]s laid end to end on the timeline. Every
//! tick, [`AnimationSchedule::tick`] advances the clock, collects the cues
//! crossed, samples every channel at the same time and only then writes the
//! results back, one read and one write per bound field.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::animation::action::{LoopMode, PlaybackClock};
use crate::animation::binding::{ChannelKey, FieldKey, PropertyBinding};
use crate::animation::easing::EaseType;
use crate::animation::modifiers::{ModifierStack, RepeatSpec};
use crate::animation::values::lerp;

// ============================================================================
// Segment
// ============================================================================

/// Lifecycle of a segment at a given timeline time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SegmentStatus {
    Pending,
    Running,
    Repeating,
    Completed,
}

/// One interpolation span between two consecutive keyframes.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Timeline time at which the segment begins.
    pub start: f32,
    /// Length of one run. 0 for snaps.
    pub duration: f32,
    pub from: f32,
    pub to: f32,
    pub ease: EaseType,
    /// Zero-duration immediate set.
    pub snap: bool,
    pub repeat: RepeatSpec,
    pub modifiers: ModifierStack,
    /// Event fired when the segment begins.
    pub callback: Option<String>,
}

impl Segment {
    #[must_use]
    pub fn snap(start: f32, from: f32, to: f32) -> Self {
        Self {
            start,
            duration: 0.0,
            from,
            to,
            ease: EaseType::LINEAR,
            snap: true,
            repeat: RepeatSpec::NONE,
            modifiers: ModifierStack::default(),
            callback: None,
        }
    }

    #[must_use]
    pub fn tween(start: f32, duration: f32, from: f32, to: f32, ease: EaseType) -> Self {
        Self {
            start,
            duration,
            from,
            to,
            ease,
            snap: false,
            repeat: RepeatSpec::NONE,
            modifiers: ModifierStack::default(),
            callback: None,
        }
    }

    /// Time covered including repeats.
    #[must_use]
    pub fn span(&self) -> f32 {
        if self.snap {
            0.0
        } else {
            self.repeat.span(self.duration)
        }
    }

    #[must_use]
    pub fn end(&self) -> f32 {
        self.start + self.span()
    }

    /// Value held once the segment has completed.
    #[must_use]
    pub fn final_value(&self) -> f32 {
        if self.snap {
            self.to
        } else {
            self.repeat.final_value(self.from, self.to)
        }
    }

    #[must_use]
    pub fn status(&self, time: f32) -> SegmentStatus {
        if time < self.start {
            return SegmentStatus::Pending;
        }
        if self.snap || time >= self.end() {
            return SegmentStatus::Completed;
        }
        let phase = self.repeat.locate(self.duration, time - self.start);
        if phase.iteration == 0 {
            SegmentStatus::Running
        } else {
            SegmentStatus::Repeating
        }
    }

    /// Value at `time`. Times before `start` clamp to the first frame.
    #[must_use]
    pub fn sample(&self, time: f32) -> f32 {
        if self.snap {
            return self.to;
        }
        let local = (time - self.start).max(0.0);
        let phase = self.repeat.locate(self.duration, local);
        if phase.finished {
            return self.final_value();
        }
        let (a, b) = self.repeat.endpoints(self.from, self.to, phase.iteration);
        let base = lerp(a, b, self.ease.ease(phase.progress));
        if self.modifiers.is_empty() {
            base
        } else {
            base + self.modifiers.offset(local, &phase)
        }
    }

    /// Value without noise or shake.
    #[must_use]
    pub fn sample_base(&self, time: f32) -> f32 {
        if self.snap {
            return self.to;
        }
        let phase = self.repeat.locate(self.duration, (time - self.start).max(0.0));
        if phase.finished {
            return self.final_value();
        }
        let (a, b) = self.repeat.endpoints(self.from, self.to, phase.iteration);
        lerp(a, b, self.ease.ease(phase.progress))
    }
}

// ============================================================================
// Channel tracks
// ============================================================================

/// Where a track's keyframes came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackOrigin {
    /// A field sequence, by index into the component's sequence list.
    Field(usize),
    /// A state sequence, by index into the component's sequence list.
    State(usize),
}

const MAX_SCAN_OFFSET: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct SegmentCursor {
    pub last_index: usize,
}

/// The segment chain driving one scalar channel.
pub struct ChannelTrack<T> {
    pub channel: ChannelKey,
    pub binding: PropertyBinding<T>,
    pub origin: TrackOrigin,
    /// Live value captured when the track was built.
    pub seed: f32,
    /// Re-resolved by state refreshes.
    pub auto_update: bool,
    pub segments: Vec<Segment>,
    cursor: SegmentCursor,
}

impl<T> fmt::Debug for ChannelTrack<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelTrack")
            .field("channel", &self.channel)
            .field("origin", &self.origin)
            .field("seed", &self.seed)
            .field("segments", &self.segments)
            .finish_non_exhaustive()
    }
}

impl<T> ChannelTrack<T> {
    #[must_use]
    pub fn new(channel: ChannelKey, binding: PropertyBinding<T>, origin: TrackOrigin, seed: f32) -> Self {
        Self {
            channel,
            binding,
            origin,
            seed,
            auto_update: false,
            segments: Vec::new(),
            cursor: SegmentCursor::default(),
        }
    }

    pub fn replace_segments(&mut self, segments: Vec<Segment>) {
        self.segments = segments;
        self.cursor = SegmentCursor::default();
    }

    #[must_use]
    pub fn end(&self) -> f32 {
        self.segments.iter().map(Segment::end).fold(0.0_f32, f32::max)
    }

    /// Index of the segment in effect at `time`: the last one whose start is
    /// not after `time`. `None` before the first segment.
    fn locate(&mut self, time: f32) -> Option<usize> {
        let len = self.segments.len();
        if len == 0 || time < self.segments[0].start {
            return None;
        }

        let i = self.cursor.last_index.min(len - 1);
        let mut found = None;
        if time >= self.segments[i].start {
            // Forward scan from the cursor
            for offset in 0..=MAX_SCAN_OFFSET {
                let idx = i + offset;
                if idx + 1 >= len || time < self.segments[idx + 1].start {
                    found = (idx < len).then_some(idx);
                    break;
                }
            }
        }

        // Large jump: fall back to binary search
        let idx = found.unwrap_or_else(|| self.segments.partition_point(|s| s.start <= time) - 1);
        self.cursor.last_index = idx;
        Some(idx)
    }

    /// Channel value at `time`, or `None` before the first keyframe.
    pub fn sample(&mut self, time: f32) -> Option<f32> {
        let idx = self.locate(time)?;
        Some(self.segments[idx].sample(time))
    }

    /// Same as [`sample`](Self::sample) without modifiers.
    pub fn sample_base(&mut self, time: f32) -> Option<f32> {
        let idx = self.locate(time)?;
        Some(self.segments[idx].sample_base(time))
    }
}

// ============================================================================
// Cues
// ============================================================================

/// A callback scheduled on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Cue {
    pub time: f32,
    pub name: String,
    /// Channel whose segment owns the cue; `None` for cues with no bound channel.
    pub channel: Option<ChannelKey>,
}

/// A fired callback.
#[derive(Debug, Clone, PartialEq)]
pub struct CallbackEvent {
    pub name: String,
    pub time: f32,
    pub channel: Option<ChannelKey>,
}

// ============================================================================
// Schedule
// ============================================================================

/// Lifecycle of a whole schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlaybackPhase {
    Pending,
    Running,
    Completed,
}

/// Channels grouped by bound field, so each field is read and written once.
#[derive(Debug, Clone)]
struct FieldGroup {
    key: FieldKey,
    /// `(track index, component)`
    members: Vec<(usize, u8)>,
}

/// A runnable animation for one target instance.
pub struct AnimationSchedule<T> {
    tracks: Vec<ChannelTrack<T>>,
    groups: Vec<FieldGroup>,
    cues: Vec<Cue>,
    fired: Vec<bool>,
    clock: PlaybackClock,
    phase: PlaybackPhase,
    /// Scratch buffer: one sample per track, filled before any write.
    samples: Vec<Option<f32>>,
}

impl<T> fmt::Debug for AnimationSchedule<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimationSchedule")
            .field("tracks", &self.tracks)
            .field("cues", &self.cues)
            .field("clock", &self.clock)
            .field("phase", &self.phase)
            .finish_non_exhaustive()
    }
}

impl<T> AnimationSchedule<T> {
    #[must_use]
    pub fn new(tracks: Vec<ChannelTrack<T>>, mut cues: Vec<Cue>, loop_mode: LoopMode, time_scale: f32) -> Self {
        cues.sort_by(|a, b| a.time.total_cmp(&b.time));
        let duration = tracks
            .iter()
            .map(ChannelTrack::end)
            .chain(cues.iter().map(|c| c.time))
            .fold(0.0_f32, f32::max);

        let mut groups: Vec<FieldGroup> = Vec::new();
        for (index, track) in tracks.iter().enumerate() {
            let key = track.channel.key;
            match groups.iter_mut().find(|g| g.key == key) {
                Some(group) => group.members.push((index, track.channel.component)),
                None => groups.push(FieldGroup {
                    key,
                    members: vec![(index, track.channel.component)],
                }),
            }
        }

        Self {
            fired: vec![false; cues.len()],
            samples: vec![None; tracks.len()],
            tracks,
            groups,
            cues,
            clock: PlaybackClock::new(duration, loop_mode, time_scale),
            phase: PlaybackPhase::Pending,
        }
    }

    #[must_use]
    pub fn tracks(&self) -> &[ChannelTrack<T>] {
        &self.tracks
    }

    pub fn tracks_mut(&mut self) -> &mut [ChannelTrack<T>] {
        &mut self.tracks
    }

    #[must_use]
    pub fn track(&self, channel: ChannelKey) -> Option<&ChannelTrack<T>> {
        self.tracks.iter().find(|t| t.channel == channel)
    }

    #[must_use]
    pub fn cues(&self) -> &[Cue] {
        &self.cues
    }

    #[must_use]
    pub fn clock(&self) -> &PlaybackClock {
        &self.clock
    }

    pub fn clock_mut(&mut self) -> &mut PlaybackClock {
        &mut self.clock
    }

    #[must_use]
    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    #[must_use]
    pub fn duration(&self) -> f32 {
        self.clock.duration()
    }

    #[must_use]
    pub fn time(&self) -> f32 {
        self.clock.time()
    }

    /// Moves the playhead. Cues before `time` count as already fired; cues
    /// exactly at `time` fire on the next tick.
    pub fn seek(&mut self, time: f32) {
        self.clock.seek(time);
        let now = self.clock.time();
        for (fired, cue) in self.fired.iter_mut().zip(&self.cues) {
            *fired = cue.time < now;
        }
        self.clock.paused = false;
        self.phase = PlaybackPhase::Pending;
    }

    /// Advances by `dt`, writes every channel and returns the cues crossed.
    pub fn tick(&mut self, dt: f32, target: &mut T) -> Vec<CallbackEvent> {
        if self.phase == PlaybackPhase::Completed {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.phase == PlaybackPhase::Pending {
            // Cues sitting on the playhead fire as playback starts.
            self.phase = PlaybackPhase::Running;
            let now = self.clock.time();
            self.cross(now, now, true, &mut events);
        }

        let step = self.clock.advance(dt);
        match step.wrap {
            None => self.cross(step.previous, step.time, false, &mut events),
            Some(wrap) => {
                self.cross(step.previous, wrap.edge, false, &mut events);
                // New playthrough: every cue is armed again. A ping-pong
                // restart sits on the edge, so cues already fired there stay fired.
                let bounce = wrap.restart == wrap.edge;
                for (fired, cue) in self.fired.iter_mut().zip(&self.cues) {
                    *fired = bounce && *fired && cue.time == wrap.edge;
                }
                self.cross(wrap.restart, step.time, true, &mut events);
            }
        }

        self.evaluate(step.time, target);
        if step.finished {
            self.phase = PlaybackPhase::Completed;
        }
        events
    }

    /// Writes every channel's value at the current clock time, without
    /// advancing or firing cues.
    pub fn apply(&mut self, target: &mut T) {
        let time = self.clock.time();
        self.evaluate(time, target);
    }

    /// Fires unfired cues between `from` and `to` in playback direction.
    /// `from` itself is only included when `inclusive` is set.
    fn cross(&mut self, from: f32, to: f32, inclusive: bool, events: &mut Vec<CallbackEvent>) {
        let forward = to >= from;
        for (fired, cue) in self.fired.iter_mut().zip(&self.cues) {
            if *fired {
                continue;
            }
            let t = cue.time;
            let hit = if forward {
                (t > from || (inclusive && t == from)) && t <= to
            } else {
                (t < from || (inclusive && t == from)) && t >= to
            };
            if hit {
                *fired = true;
                log::trace!("cue '{}' at {:.3}s", cue.name, t);
                events.push(CallbackEvent {
                    name: cue.name.clone(),
                    time: t,
                    channel: cue.channel,
                });
            }
        }
    }

    fn evaluate(&mut self, time: f32, target: &mut T) {
        // 1. Sample every channel at the same time
        for (sample, track) in self.samples.iter_mut().zip(self.tracks.iter_mut()) {
            *sample = track.sample(time);
        }

        // 2. Write back, one read and one write per field
        for group in &self.groups {
            if group.members.iter().all(|&(index, _)| self.samples[index].is_none()) {
                continue;
            }
            let binding = &self.tracks[group.members[0].0].binding;
            let mut values = match binding.read(target) {
                Ok(values) => values,
                Err(err) => {
                    log::warn!("Skipping channel update: {err}");
                    continue;
                }
            };
            for &(index, component) in &group.members {
                if let (Some(value), Some(slot)) =
                    (self.samples[index], values.get_mut(usize::from(component)))
                {
                    *slot = value;
                }
            }
            if let Err(err) = binding.write(target, &values) {
                log::warn!("Skipping channel update: {err}");
            }
        }
    }
}
