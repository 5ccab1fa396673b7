use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::{KinemaError, Result};

/// A named scalar multiplier applied to keyframe values at build time.
///
/// `value_anim` is a one-shot override: set it right before a build, and the
/// build consumes it (see [`PropertyTable::take_overrides`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnimationProperty {
    #[serde(rename = "0")]
    pub name: String,
    #[serde(rename = "1")]
    pub value: f32,
    #[serde(skip)]
    value_anim: Option<f32>,
}

impl AnimationProperty {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f32) -> Self {
        Self {
            name: name.into(),
            value,
            value_anim: None,
        }
    }

    pub fn set_value_anim(&mut self, value: f32) {
        self.value_anim = Some(value);
    }

    pub fn clear_value_anim(&mut self) {
        self.value_anim = None;
    }

    #[must_use]
    pub fn has_value_anim(&self) -> bool {
        self.value_anim.is_some()
    }

    /// The override if one is pending, otherwise the authored value.
    #[must_use]
    pub fn value_anim(&self) -> f32 {
        self.value_anim.unwrap_or(self.value)
    }
}

/// Registry of named animation properties.
#[derive(Debug, Clone, Default)]
pub struct PropertyTable {
    properties: FxHashMap<String, AnimationProperty>,
}

impl PropertyTable {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a property, keyed by its name.
    pub fn insert(&mut self, property: AnimationProperty) {
        self.properties.insert(property.name.clone(), property);
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AnimationProperty> {
        self.properties.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut AnimationProperty> {
        self.properties.get_mut(name)
    }

    /// Sets a pending override on `name`. Returns `false` if no such property.
    pub fn set_value_anim(&mut self, name: &str, value: f32) -> bool {
        match self.properties.get_mut(name) {
            Some(property) => {
                property.set_value_anim(value);
                true
            }
            None => {
                log::warn!("Cannot override missing animation property '{name}'");
                false
            }
        }
    }

    /// Moves every pending override into a build-scoped snapshot, leaving
    /// all properties unset.
    pub fn take_overrides(&mut self) -> PropertyOverrides {
        let values = self
            .properties
            .iter_mut()
            .filter_map(|(name, property)| property.value_anim.take().map(|v| (name.clone(), v)))
            .collect();
        PropertyOverrides { values }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.properties.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Serializes the authored properties, sorted by name. Overrides are
    /// transient and never persisted.
    pub fn to_json(&self) -> Result<String> {
        let mut list: Vec<&AnimationProperty> = self.properties.values().collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(serde_json::to_string(&list)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let list: Vec<AnimationProperty> = serde_json::from_str(json)?;
        let mut table = Self::new();
        for property in list {
            table.insert(property);
        }
        Ok(table)
    }
}

/// Overrides captured for exactly one build.
#[derive(Debug, Clone, Default)]
pub struct PropertyOverrides {
    values: FxHashMap<String, f32>,
}

impl PropertyOverrides {
    #[must_use]
    pub fn get(&self, name: &str) -> Option<f32> {
        self.values.get(name).copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Read-only property view used while resolving keyframe values.
#[derive(Debug, Clone, Copy)]
pub struct PropertyScope<'a> {
    table: &'a PropertyTable,
    overrides: &'a PropertyOverrides,
}

impl<'a> PropertyScope<'a> {
    #[must_use]
    pub fn new(table: &'a PropertyTable, overrides: &'a PropertyOverrides) -> Self {
        Self { table, overrides }
    }

    /// Multiplier for a keyframe that names `property`.
    ///
    /// No property ⇒ 1. Build-scoped override ⇒ override. Otherwise the
    /// property's own [`value_anim`](AnimationProperty::value_anim).
    pub fn multiplier(&self, property: Option<&str>) -> Result<f32> {
        let Some(name) = property else {
            return Ok(1.0);
        };
        if let Some(value) = self.overrides.get(name) {
            return Ok(value);
        }
        self.table
            .get(name)
            .map(AnimationProperty::value_anim)
            .ok_or_else(|| KinemaError::UnknownProperty(name.to_string()))
    }
}
