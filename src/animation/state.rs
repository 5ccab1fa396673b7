//! State model.
//!
//! A state is an authored snapshot of target values. Concrete states declare
//! [`StateProperty`] fields (grouped with [`StatePropertyGroup`] for list-like
//! targets) and implement [`StateBase`] to bind each active property to the
//! matching live field. The build engine then blends toward those values
//! through state keyframes.

use std::fmt;

use glam::Vec2;
use rustc_hash::FxHashMap;

use crate::animation::binding::{Animatable, BindingCache, FieldKey, PropertyBinding};
use crate::animation::options::StatePropertyOptions;
use crate::animation::values::{AnimValue, Color, Values, lerp};
use crate::errors::KinemaError;

// ============================================================================
// StateProperty
// ============================================================================

/// One animatable channel of a state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StateProperty<V: AnimValue> {
    pub active: bool,
    pub value: V,
    pub options: StatePropertyOptions,
}

pub type FloatProperty = StateProperty<f32>;
pub type IntegerProperty = StateProperty<i32>;
pub type ColorProperty = StateProperty<Color>;
pub type Vector2Property = StateProperty<Vec2>;

impl<V: AnimValue> Default for StateProperty<V> {
    fn default() -> Self {
        Self {
            active: false,
            value: V::default_value(),
            options: StatePropertyOptions::default(),
        }
    }
}

impl<V: AnimValue> StateProperty<V> {
    /// An active property targeting `value`.
    #[must_use]
    pub fn new(value: V) -> Self {
        Self {
            active: true,
            value,
            options: StatePropertyOptions::default(),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: StatePropertyOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn default_value(&self) -> V {
        V::default_value()
    }

    #[must_use]
    pub fn target_values(&self) -> Values {
        self.value.to_values()
    }

    pub fn set_target_values(&mut self, values: &[f32]) {
        self.value = V::from_values(values);
    }
}

// ============================================================================
// StatePropertyGroup
// ============================================================================

/// Per-item property bundles for a target that holds a list of animatable
/// sub-items (e.g. path control points).
///
/// Bundles are bound through an index arena that [`resync`](Self::resync)
/// rebuilds before every state application. The arena never exceeds either
/// the authored bundles or the live items; lists are never extended.
#[derive(Debug, Clone, PartialEq)]
pub struct StatePropertyGroup<P> {
    pub active: bool,
    pub items: Vec<P>,
    slots: Vec<usize>,
}

impl<P> Default for StatePropertyGroup<P> {
    fn default() -> Self {
        Self {
            active: true,
            items: Vec::new(),
            slots: Vec::new(),
        }
    }
}

impl<P> StatePropertyGroup<P> {
    #[must_use]
    pub fn new(items: Vec<P>) -> Self {
        let slots = (0..items.len()).collect();
        Self {
            active: true,
            items,
            slots,
        }
    }

    /// Clears and rebuilds the slot arena for `live_count` target items.
    pub fn resync(&mut self, live_count: usize) {
        let count = self.items.len().min(live_count);
        self.slots.clear();
        self.slots.extend(0..count);
    }

    /// Number of bindable slots after the last resync.
    #[must_use]
    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    /// `(item index, bundle)` for every bindable slot.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &P)> {
        self.slots
            .iter()
            .filter_map(|&index| self.items.get(index).map(|item| (index, item)))
    }
}

// ============================================================================
// Property map
// ============================================================================

/// One active state property bound to a live field.
pub struct StateBinding<T> {
    pub binding: PropertyBinding<T>,
    pub target_values: Values,
    pub options: StatePropertyOptions,
}

impl<T> fmt::Debug for StateBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateBinding")
            .field("binding", &self.binding)
            .field("target_values", &self.target_values)
            .finish_non_exhaustive()
    }
}

/// Every active property of a state, bound to a concrete target.
pub struct PropertyMap<T> {
    pub entries: Vec<StateBinding<T>>,
    pub warnings: Vec<KinemaError>,
}

impl<T> fmt::Debug for PropertyMap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyMap")
            .field("entries", &self.entries)
            .field("warnings", &self.warnings)
            .finish()
    }
}

impl<T> PropertyMap<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn find(&self, key: FieldKey) -> Option<&StateBinding<T>> {
        self.entries.iter().find(|e| e.binding.key == key)
    }

    /// Immediately blends `target` toward the state by `weight`.
    ///
    /// Entries whose live value cannot be read are logged and skipped.
    pub fn apply(&self, target: &mut T, weight: f32) {
        for entry in &self.entries {
            let mut values = match entry.binding.read(target) {
                Ok(values) => values,
                Err(err) => {
                    log::warn!("Skipping state channel: {err}");
                    continue;
                }
            };
            for (live, goal) in values.iter_mut().zip(&entry.target_values) {
                *live = lerp(*live, *goal, weight);
            }
            if let Err(err) = entry.binding.write(target, &values) {
                log::warn!("Skipping state channel: {err}");
            }
        }
    }
}

/// Collects bindings while a state generates its property map.
pub struct PropertyMapBuilder<'c, T: Animatable> {
    cache: &'c mut BindingCache<T>,
    entries: Vec<StateBinding<T>>,
    warnings: Vec<KinemaError>,
}

impl<'c, T: Animatable> PropertyMapBuilder<'c, T> {
    #[must_use]
    pub fn new(cache: &'c mut BindingCache<T>) -> Self {
        Self {
            cache,
            entries: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Binds `property` to `key`. Inactive properties are skipped, not
    /// defaulted.
    pub fn bind<V: AnimValue>(&mut self, property: &StateProperty<V>, key: FieldKey) -> &mut Self {
        if !property.active {
            return self;
        }
        let binding = match self.cache.bind(key) {
            Ok(binding) => binding,
            Err(err) => {
                log::warn!("State property not bound: {err}");
                self.warnings.push(err);
                return self;
            }
        };
        if binding.arity() != V::ARITY {
            let err = KinemaError::ArityMismatch {
                field: key.field,
                expected: binding.arity(),
                actual: V::ARITY,
            };
            log::warn!("State property not bound: {err}");
            self.warnings.push(err);
            return self;
        }
        self.entries.push(StateBinding {
            binding,
            target_values: property.target_values(),
            options: property.options,
        });
        self
    }

    /// Binds every slot of `group` through `bind_item`. Skipped entirely
    /// when the group is inactive.
    pub fn bind_group<P>(
        &mut self,
        group: &StatePropertyGroup<P>,
        mut bind_item: impl FnMut(&mut Self, usize, &P),
    ) -> &mut Self {
        if group.active {
            for (index, item) in group.slots() {
                bind_item(self, index, item);
            }
        }
        self
    }

    #[must_use]
    pub fn finish(self) -> PropertyMap<T> {
        PropertyMap {
            entries: self.entries,
            warnings: self.warnings,
        }
    }
}

// ============================================================================
// StateBase
// ============================================================================

/// An authored target snapshot for targets of type `T`.
pub trait StateBase<T: Animatable> {
    fn name(&self) -> &str;

    /// Pre-sync hook run before every application, e.g. resyncing property
    /// groups to the target's current item count.
    fn before_update(&mut self, _target: &T) {}

    /// Binds every active property to the live field on `target`.
    fn generate_property_map(&self, target: &T, map: &mut PropertyMapBuilder<'_, T>);
}

/// Runs the full state application protocol: `before_update`, then
/// `generate_property_map`.
pub fn bind_state<T: Animatable>(
    state: &mut dyn StateBase<T>,
    target: &T,
    cache: &mut BindingCache<T>,
) -> PropertyMap<T> {
    state.before_update(target);
    let mut builder = PropertyMapBuilder::new(cache);
    state.generate_property_map(target, &mut builder);
    builder.finish()
}

/// Named states available to a target.
pub struct StateRegistry<T: Animatable> {
    states: FxHashMap<String, Box<dyn StateBase<T>>>,
}

impl<T: Animatable> Default for StateRegistry<T> {
    fn default() -> Self {
        Self {
            states: FxHashMap::default(),
        }
    }
}

impl<T: Animatable> fmt::Debug for StateRegistry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.states.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("StateRegistry").field("states", &names).finish()
    }
}

impl<T: Animatable> StateRegistry<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a state under its own name, replacing any previous one.
    pub fn insert(&mut self, state: impl StateBase<T> + 'static) {
        self.states.insert(state.name().to_string(), Box::new(state));
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.states.contains_key(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut (dyn StateBase<T> + 'static)> {
        self.states.get_mut(name).map(Box::as_mut)
    }

    /// Binds the named state against `target`.
    pub fn bind(
        &mut self,
        name: &str,
        target: &T,
        cache: &mut BindingCache<T>,
    ) -> Result<PropertyMap<T>, KinemaError> {
        let state = self
            .states
            .get_mut(name)
            .ok_or_else(|| KinemaError::UnknownState(name.to_string()))?;
        Ok(bind_state(state.as_mut(), target, cache))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}
