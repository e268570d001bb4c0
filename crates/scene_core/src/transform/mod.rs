//! Transform component data and change events
//!
//! Propagation through the entity hierarchy lives in `scene::propagation`,
//! since it needs the whole graph.

pub mod data;
pub mod events;

pub use data::{AxisLocks, Transform};
pub use events::{ListenerSet, TransformEvent, TransformListener};
