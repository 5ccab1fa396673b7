use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::animation::values::Values;
use crate::errors::{KinemaError, Result};

/// Stable identifier of an animatable field on a target type.
///
/// Saved animation data refers to fields by this number, so a target type
/// must never reassign an id to a different field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldId(pub u32);

/// A field on a target, plus an item index for list-backed fields.
///
/// `index` is 0 for plain fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FieldKey {
    pub field: FieldId,
    #[serde(default)]
    pub index: usize,
}

impl FieldKey {
    #[must_use]
    pub const fn new(field: FieldId) -> Self {
        Self { field, index: 0 }
    }

    #[must_use]
    pub const fn item(field: FieldId, index: usize) -> Self {
        Self { field, index }
    }

    /// Addresses one scalar component of this field.
    #[must_use]
    pub const fn component(self, component: u8) -> ChannelKey {
        ChannelKey { key: self, component }
    }
}

/// One scalar component of a field. This is the unit a sequence animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelKey {
    pub key: FieldKey,
    #[serde(default)]
    pub component: u8,
}

impl ChannelKey {
    #[must_use]
    pub const fn scalar(field: FieldId) -> Self {
        Self {
            key: FieldKey::new(field),
            component: 0,
        }
    }
}

/// Read/write accessors for one field of `T`.
///
/// Plain function pointers registered by the target type. The `usize`
/// argument is the item index of list-backed fields. `get` returns `None`
/// and `set` returns `false` when the index is out of range.
pub struct FieldAccessor<T> {
    pub arity: usize,
    pub get: fn(&T, usize) -> Option<Values>,
    pub set: fn(&mut T, usize, &[f32]) -> bool,
}

impl<T> Clone for FieldAccessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldAccessor<T> {}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("arity", &self.arity)
            .finish_non_exhaustive()
    }
}

/// A type whose fields can be driven by the animation engine.
///
/// ```rust,ignore
/// impl Animatable for Sprite {
///     fn accessor(field: FieldId) -> Option<FieldAccessor<Self>> {
///         match field {
///             ALPHA => Some(FieldAccessor {
///                 arity: 1,
///                 get: |s, _| Some(smallvec![s.alpha]),
///                 set: |s, _, v| { s.alpha = v[0]; true },
///             }),
///             _ => None,
///         }
///     }
/// }
/// ```
pub trait Animatable: Sized + 'static {
    fn accessor(field: FieldId) -> Option<FieldAccessor<Self>>;
}

/// Binding relationship: a resolved accessor attached to one field (and
/// list item) of a target.
pub struct PropertyBinding<T> {
    pub key: FieldKey,
    accessor: FieldAccessor<T>,
}

impl<T> Clone for PropertyBinding<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for PropertyBinding<T> {}

impl<T> fmt::Debug for PropertyBinding<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyBinding")
            .field("key", &self.key)
            .field("arity", &self.accessor.arity)
            .finish()
    }
}

impl<T> PropertyBinding<T> {
    #[must_use]
    pub fn new(key: FieldKey, accessor: FieldAccessor<T>) -> Self {
        Self { key, accessor }
    }

    #[inline]
    #[must_use]
    pub fn arity(&self) -> usize {
        self.accessor.arity
    }

    /// Reads the live component values.
    pub fn read(&self, target: &T) -> Result<Values> {
        (self.accessor.get)(target, self.key.index).ok_or(KinemaError::IndexOutOfRange {
            field: self.key.field,
            index: self.key.index,
        })
    }

    /// Reads a single component.
    pub fn read_component(&self, target: &T, component: u8) -> Result<f32> {
        let values = self.read(target)?;
        values
            .get(usize::from(component))
            .copied()
            .ok_or(KinemaError::ArityMismatch {
                field: self.key.field,
                expected: values.len(),
                actual: usize::from(component) + 1,
            })
    }

    /// Writes all components. `values.len()` must equal the field's arity.
    pub fn write(&self, target: &mut T, values: &[f32]) -> Result<()> {
        if values.len() != self.accessor.arity {
            return Err(KinemaError::ArityMismatch {
                field: self.key.field,
                expected: self.accessor.arity,
                actual: values.len(),
            });
        }
        if (self.accessor.set)(target, self.key.index, values) {
            Ok(())
        } else {
            Err(KinemaError::IndexOutOfRange {
                field: self.key.field,
                index: self.key.index,
            })
        }
    }
}

/// Per-type accessor cache.
///
/// Accessors are looked up once per field id and reused by every later
/// build for the same target type, including misses.
pub struct BindingCache<T> {
    accessors: FxHashMap<FieldId, Option<FieldAccessor<T>>>,
}

impl<T> Default for BindingCache<T> {
    fn default() -> Self {
        Self {
            accessors: FxHashMap::default(),
        }
    }
}

impl<T> fmt::Debug for BindingCache<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BindingCache")
            .field("cached", &self.accessors.len())
            .finish()
    }
}

impl<T: Animatable> BindingCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolves a binding for `key`, consulting the target type only on the
    /// first request for that field.
    pub fn bind(&mut self, key: FieldKey) -> Result<PropertyBinding<T>> {
        let accessor = *self
            .accessors
            .entry(key.field)
            .or_insert_with(|| T::accessor(key.field));
        accessor
            .map(|accessor| PropertyBinding::new(key, accessor))
            .ok_or(KinemaError::UnknownField(key.field))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.accessors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accessors.is_empty()
    }
}
