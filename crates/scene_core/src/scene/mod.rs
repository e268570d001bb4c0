//! Scene graph, entities and the entity manager
//!
//! Entities form the spatial tree; components form a secondary tree hanging
//! off entities and other components. Both live in one arena owned by
//! [`SceneGraph`]. Destruction is deferred: shutdown marks nodes, pins keep
//! them alive, and the sweep frees what is left.
//!
//! ## Architecture
//!
//! ```text
//! EntityManager (frame loop, roots, spawners, queries)
//!      ↓
//! SceneGraph (arena of entity and component nodes)
//!      ↓
//! Collaborators (renderer snapshot, physics hooks, transform listeners)
//! ```

mod components;
mod entities;
mod graph;
mod manager;
mod physics;
mod propagation;
mod render;
mod slots;
mod spawner;
mod sweep;

#[cfg(test)]
mod tests;

pub use graph::{ComponentNode, DistinguishedSlots, EntityKind, EntityNode, Owner, SceneGraph};
pub use manager::{EntityManager, RaycastHit, SceneStats, RAYCAST_IGNORE_TAG};
pub use physics::{BoundingSphere, PhysicsHooks, Ray};
pub use render::RenderRecord;
pub use spawner::{SpawnContext, SpawnFactory, SpawnRequest, SpawnerSettings};
pub use sweep::SweepReport;
