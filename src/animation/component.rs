use rustc_hash::{FxHashMap, FxHashSet};

use crate::animation::binding::{Animatable, BindingCache, ChannelKey};
use crate::animation::builder::{BuildContext, BuildReport};
use crate::animation::property::{PropertyOverrides, PropertyScope, PropertyTable};
use crate::animation::schedule::{AnimationSchedule, CallbackEvent, PlaybackPhase, TrackOrigin};
use crate::animation::sequence::AnimationSequence;
use crate::animation::state::{StateBase, StateRegistry};
use crate::errors::Result;
use crate::settings::AnimationSettings;

/// Animation data and the running schedule for one target instance.
///
/// Authored data (`sequences`, `states`) is left untouched by builds. Each
/// [`build`](Self::build) discards the previous schedule, including any
/// callbacks it had not fired yet, and resolves a fresh one.
pub struct AnimatedComponent<T: Animatable> {
    pub sequences: Vec<AnimationSequence>,
    pub states: StateRegistry<T>,
    /// Non-empty ⇒ field keyframe values are offsets from the live value.
    pub relative_state: String,
    /// Collapse callbacks sharing a step time and name into one event.
    pub step_callback: bool,
    pub settings: AnimationSettings,

    cache: BindingCache<T>,
    schedule: Option<AnimationSchedule<T>>,
}

impl<T: Animatable> Default for AnimatedComponent<T> {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

impl<T: Animatable> std::fmt::Debug for AnimatedComponent<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimatedComponent")
            .field("sequences", &self.sequences.len())
            .field("states", &self.states)
            .field("relative_state", &self.relative_state)
            .field("step_callback", &self.step_callback)
            .field("schedule", &self.schedule)
            .finish_non_exhaustive()
    }
}

impl<T: Animatable> AnimatedComponent<T> {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            sequences: Vec::new(),
            states: StateRegistry::new(),
            relative_state: String::new(),
            step_callback: settings.step_callback,
            settings,
            cache: BindingCache::new(),
            schedule: None,
        }
    }

    #[must_use]
    pub fn with_sequence(mut self, sequence: AnimationSequence) -> Self {
        self.sequences.push(sequence);
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl StateBase<T> + 'static) -> Self {
        self.states.insert(state);
        self
    }

    pub fn add_sequence(&mut self, sequence: AnimationSequence) {
        self.sequences.push(sequence);
    }

    // ========================================================================
    // Build
    // ========================================================================

    /// Resolves every sequence against `target`.
    ///
    /// Pending property overrides are consumed by this build and reset
    /// afterwards.
    pub fn build(&mut self, target: &T, properties: &mut PropertyTable) -> BuildReport {
        let overrides = properties.take_overrides();
        self.build_scoped(target, PropertyScope::new(properties, &overrides))
    }

    /// Same as [`build`](Self::build) with an already captured override
    /// snapshot, so several components can share one build session.
    pub fn build_scoped(&mut self, target: &T, properties: PropertyScope<'_>) -> BuildReport {
        // Rebuilding drops the old schedule and everything it still had queued.
        self.schedule = None;

        let mut ctx = BuildContext {
            cache: &mut self.cache,
            properties,
            states: &mut self.states,
            relative_state: &self.relative_state,
            noise_seed: self.settings.noise_seed,
            seeds: None,
        };
        let output = ctx.build(target, &self.sequences);

        self.schedule = Some(AnimationSchedule::new(
            output.tracks,
            output.cues,
            self.settings.loop_mode,
            self.settings.time_scale,
        ));
        output.report
    }

    /// Re-resolves state channels whose options have `auto_update` against
    /// the states as they are now. Offsets still use the values captured by
    /// the original build. One-shot channels, field channels and cues are
    /// left untouched.
    pub fn refresh_states(&mut self, target: &T) -> BuildReport {
        let Some(schedule) = self.schedule.as_mut() else {
            return BuildReport::default();
        };

        let seeds: FxHashMap<ChannelKey, f32> = schedule
            .tracks()
            .iter()
            .map(|track| (track.channel, track.seed))
            .collect();
        let refreshable: FxHashSet<(ChannelKey, TrackOrigin)> = schedule
            .tracks()
            .iter()
            .filter(|track| track.auto_update)
            .map(|track| (track.channel, track.origin))
            .collect();
        if refreshable.is_empty() {
            return BuildReport::default();
        }

        let state_sequences: Vec<AnimationSequence> = self
            .sequences
            .iter()
            .map(|sequence| {
                if sequence.channel.is_none() {
                    sequence.clone()
                } else {
                    // Keep indices stable; field sequences are skipped as inactive.
                    AnimationSequence {
                        active: false,
                        nodes: Vec::new(),
                        ..sequence.clone()
                    }
                }
            })
            .collect();

        let table = PropertyTable::new();
        let overrides = PropertyOverrides::default();
        let mut ctx = BuildContext {
            cache: &mut self.cache,
            properties: PropertyScope::new(&table, &overrides),
            states: &mut self.states,
            relative_state: &self.relative_state,
            noise_seed: self.settings.noise_seed,
            seeds: Some(&seeds),
        };
        let output = ctx.build(target, &state_sequences);

        let mut report = output.report;
        report.channels = 0;
        report.segments = 0;
        report.cues = 0;
        for fresh in output.tracks {
            if !refreshable.contains(&(fresh.channel, fresh.origin)) {
                continue;
            }
            if let Some(track) = schedule
                .tracks_mut()
                .iter_mut()
                .find(|t| t.channel == fresh.channel && t.origin == fresh.origin)
            {
                report.channels += 1;
                report.segments += fresh.segments.len();
                track.replace_segments(fresh.segments);
            }
        }
        log::debug!("Refreshed {} state channel(s)", report.channels);
        report
    }

    /// Immediately blends `target` toward the named state by `weight`,
    /// outside any timeline.
    pub fn apply_state(&mut self, name: &str, target: &mut T, weight: f32) -> Result<()> {
        let map = self.states.bind(name, target, &mut self.cache)?;
        map.apply(target, weight);
        Ok(())
    }

    // ========================================================================
    // Playback
    // ========================================================================

    #[must_use]
    pub fn schedule(&self) -> Option<&AnimationSchedule<T>> {
        self.schedule.as_ref()
    }

    /// Restarts the built schedule from time 0.
    pub fn play(&mut self) {
        if let Some(schedule) = &mut self.schedule {
            schedule.seek(0.0);
        }
    }

    pub fn pause(&mut self) {
        if let Some(schedule) = &mut self.schedule {
            schedule.clock_mut().paused = true;
        }
    }

    pub fn resume(&mut self) {
        if let Some(schedule) = &mut self.schedule {
            schedule.clock_mut().paused = false;
        }
    }

    /// Discards the schedule. Pending callbacks never fire.
    pub fn stop(&mut self) {
        if self.schedule.take().is_some() {
            log::debug!("Animation stopped");
        }
    }

    pub fn seek(&mut self, time: f32) {
        if let Some(schedule) = &mut self.schedule {
            schedule.seek(time);
        }
    }

    #[must_use]
    pub fn phase(&self) -> Option<PlaybackPhase> {
        self.schedule.as_ref().map(AnimationSchedule::phase)
    }

    /// `true` when nothing is left to play.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.phase().is_none_or(|phase| phase == PlaybackPhase::Completed)
    }

    /// Advances playback by `dt` seconds and writes every animated field.
    pub fn tick(&mut self, dt: f32, target: &mut T) -> Vec<CallbackEvent> {
        let Some(schedule) = &mut self.schedule else {
            return Vec::new();
        };
        let events = schedule.tick(dt, target);
        if !self.step_callback {
            return events;
        }

        let mut seen: FxHashSet<(u32, String)> = FxHashSet::default();
        events
            .into_iter()
            .filter(|event| seen.insert((event.time.to_bits(), event.name.clone())))
            .map(|event| CallbackEvent {
                channel: None,
                ..event
            })
            .collect()
    }
}
