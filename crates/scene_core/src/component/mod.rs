//! Components: attachable units of data and behavior
//!
//! Components live in the scene graph's arena. This module holds the pieces
//! that do not need the graph: registry keys, the registry itself and the
//! component payload types. Graph operations on components are in
//! `scene::components`.

pub mod body;
pub mod key;
pub mod registry;

pub use body::{Behavior, ComponentBody, ComponentType, HookContext, Mesh, Rigidbody};
pub use key::ComponentKey;
pub use registry::{ComponentRegistry, ComponentSelector};
