//! Object identity and lifecycle
//!
//! Shared by entities and components: a unique id, a name, a tag set and a
//! lifecycle cell holding activation, shutdown and pin state.

pub mod identity;
pub mod lifecycle;

pub use identity::{allocate_object_id, ObjectId, ObjectIdentity};
pub use lifecycle::{Activation, LifePhase, Lifecycle, LifecycleHandle, PinGuard};
