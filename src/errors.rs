//! Error Types
//!
//! This module defines the error types used throughout the animation engine.
//!
//! # Overview
//!
//! Almost every failure in the engine is recoverable: an unresolved property
//! or state name, a list index that no longer exists on the target, a target
//! the host has already removed. These are logged and the affected channel
//! falls back to neutral behaviour. [`KinemaError`] gives each of those
//! conditions a name so builds can report them in
//! [`BuildReport::warnings`](crate::animation::BuildReport).
//!
//! The only operations that return [`Result`] to the caller are the
//! persistence helpers (`to_json` / `from_json`).
//!
//! ```rust,ignore
//! use kinema::errors::Result;
//! use kinema::animation::AnimationSequence;
//!
//! fn load(json: &str) -> Result<AnimationSequence> {
//!     AnimationSequence::from_json(json)
//! }
//! ```

use thiserror::Error;

use crate::animation::binding::FieldId;

/// The main error type for the Kinema engine.
#[derive(Error, Debug)]
pub enum KinemaError {
    // ========================================================================
    // Reference Resolution
    // ========================================================================
    /// A keyframe names an animation property that is not registered.
    #[error("Animation property not found: {0}")]
    UnknownProperty(String),

    /// A state keyframe names a state that is not registered.
    #[error("Animation state not found: {0}")]
    UnknownState(String),

    /// The target type exposes no accessor for this field.
    #[error("Target has no animatable field {0:?}")]
    UnknownField(FieldId),

    // ========================================================================
    // Live Value Access
    // ========================================================================
    /// A list-item binding points past the end of the target's collection.
    #[error("Index out of range on field {field:?} (index: {index})")]
    IndexOutOfRange {
        /// Field being accessed
        field: FieldId,
        /// The invalid index
        index: usize,
    },

    /// A write supplied a different number of components than the field holds.
    #[error("Arity mismatch on field {field:?}: expected {expected}, got {actual}")]
    ArityMismatch {
        field: FieldId,
        expected: usize,
        actual: usize,
    },

    /// The host no longer holds the object an animator was bound to.
    #[error("Animation target missing: {0}")]
    MissingTarget(String),

    // ========================================================================
    // Persistence
    // ========================================================================
    /// JSON (de)serialization error.
    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),
}

/// Alias for `Result<T, KinemaError>`.
pub type Result<T> = std::result::Result<T, KinemaError>;
