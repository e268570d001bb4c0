//! Error types for the scene core
//!
//! Lookup misses are not errors; they surface as `None` or `false`. The
//! variants here cover configuration problems at construction time and
//! structural invariant violations.

use crate::config::ConfigError;
use crate::object::ObjectId;
use thiserror::Error;

/// Errors raised by the scene core
#[derive(Error, Debug)]
pub enum SceneError {
    /// The manager was constructed with an unusable configuration
    #[error("Invalid scene configuration: {0}")]
    InvalidConfig(String),

    /// A configuration file could not be loaded
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A pin was requested on an object whose memory was already reclaimed
    #[error("Object {0} has already been reclaimed")]
    Reclaimed(ObjectId),

    /// Destruction was forced on an object that is still pinned
    #[error("Object {id} destroyed while still referenced ({pins} pins outstanding)")]
    StillReferenced {
        /// Object that was to be destroyed
        id: ObjectId,
        /// Pins held at the time of the request
        pins: u32,
    },

    /// The entity arena is full
    #[error("Entity capacity of {0} exceeded")]
    CapacityExceeded(usize),
}

/// Result alias for scene operations
pub type SceneResult<T> = Result<T, SceneError>;
