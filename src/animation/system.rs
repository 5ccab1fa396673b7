use slotmap::{Key, SlotMap, new_key_type};

use crate::animation::binding::Animatable;
use crate::animation::builder::BuildReport;
use crate::animation::component::AnimatedComponent;
use crate::animation::property::{PropertyScope, PropertyTable};
use crate::animation::schedule::CallbackEvent;
use crate::errors::KinemaError;
use crate::settings::AnimationSettings;

new_key_type! {
    /// Handle of an animator registered with an [`AnimationSystem`].
    pub struct AnimatorKey;
}

struct Animator<K, T: Animatable> {
    target: K,
    component: AnimatedComponent<T>,
}

/// Animation system.
///
/// Owns the animated components of one target type and drives them every
/// frame against the host's own `SlotMap` of targets. Components refer to
/// their target by key only, so the host stays free to remove objects; an
/// animator whose target has gone is logged and skipped.
pub struct AnimationSystem<K: Key, T: Animatable> {
    animators: SlotMap<AnimatorKey, Animator<K, T>>,
    pub properties: PropertyTable,
    pub settings: AnimationSettings,
}

impl<K: Key, T: Animatable> Default for AnimationSystem<K, T> {
    fn default() -> Self {
        Self::new(AnimationSettings::default())
    }
}

impl<K: Key, T: Animatable> AnimationSystem<K, T> {
    #[must_use]
    pub fn new(settings: AnimationSettings) -> Self {
        Self {
            animators: SlotMap::with_key(),
            properties: PropertyTable::new(),
            settings,
        }
    }

    /// Registers `component` as the animator of `target`.
    pub fn add(&mut self, target: K, component: AnimatedComponent<T>) -> AnimatorKey {
        self.animators.insert(Animator { target, component })
    }

    /// Removes an animator. Its schedule is dropped without firing callbacks.
    pub fn remove(&mut self, key: AnimatorKey) -> Option<AnimatedComponent<T>> {
        self.animators.remove(key).map(|animator| animator.component)
    }

    #[must_use]
    pub fn get(&self, key: AnimatorKey) -> Option<&AnimatedComponent<T>> {
        self.animators.get(key).map(|animator| &animator.component)
    }

    pub fn get_mut(&mut self, key: AnimatorKey) -> Option<&mut AnimatedComponent<T>> {
        self.animators.get_mut(key).map(|animator| &mut animator.component)
    }

    #[must_use]
    pub fn target_of(&self, key: AnimatorKey) -> Option<K> {
        self.animators.get(key).map(|animator| animator.target)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.animators.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.animators.is_empty()
    }

    /// Builds every animator against its target.
    ///
    /// All builds in one call share a single snapshot of the pending
    /// property overrides; the overrides are reset afterwards.
    pub fn build_all(&mut self, targets: &SlotMap<K, T>) -> Vec<(AnimatorKey, BuildReport)> {
        let overrides = self.properties.take_overrides();
        let scope = PropertyScope::new(&self.properties, &overrides);

        let mut reports = Vec::with_capacity(self.animators.len());
        for (key, animator) in &mut self.animators {
            let Some(target) = targets.get(animator.target) else {
                let err = KinemaError::MissingTarget(format!("{:?}", animator.target));
                log::warn!("Animator {key:?} not built: {err}");
                animator.component.stop();
                reports.push((
                    key,
                    BuildReport {
                        warnings: vec![err],
                        ..BuildReport::default()
                    },
                ));
                continue;
            };
            reports.push((key, animator.component.build_scoped(target, scope)));
        }
        reports
    }

    /// Advances every animator by `dt` seconds.
    ///
    /// Returns the callbacks fired this frame, tagged with their animator.
    pub fn update(&mut self, dt: f32, targets: &mut SlotMap<K, T>) -> Vec<(AnimatorKey, CallbackEvent)> {
        let mut events = Vec::new();
        for (key, animator) in &mut self.animators {
            if animator.component.is_finished() {
                continue;
            }
            let Some(target) = targets.get_mut(animator.target) else {
                log::warn!(
                    "Animator {key:?} skipped: {}",
                    KinemaError::MissingTarget(format!("{:?}", animator.target))
                );
                continue;
            };
            events.extend(
                animator
                    .component
                    .tick(dt, target)
                    .into_iter()
                    .map(|event| (key, event)),
            );
        }
        events
    }
}
