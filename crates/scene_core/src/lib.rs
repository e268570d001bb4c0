//! # Scene Core
//!
//! Object lifecycle, component composition and scene-graph core for a
//! real-time engine.
//!
//! ## Features
//!
//! - **Identity**: unique ids, names, tags and activation for every object
//! - **Components**: keyed registries of attachable behavior, nestable under
//!   other components
//! - **Scene Graph**: entity hierarchy in a generation-checked arena
//! - **Deferred Destruction**: shutdown, pins and a reclamation sweep under
//!   one synchronized lifecycle state
//! - **Transforms**: hierarchical positions, dependent rotations and
//!   per-axis rotation locks with change listeners
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use scene_core::prelude::*;
//!
//! fn main() -> Result<(), SceneError> {
//!     let mut manager = EntityManager::new(SceneConfig::default())?;
//!     let ship = manager.create_entity("ship")?;
//!     let graph = manager.graph_mut();
//!     graph.add_component(ship.into(), "hull", Mesh::new("ship.obj", 1.5).into());
//!     if let Some(transform) = graph.transform_of(ship) {
//!         graph.translate(transform, Vec3::new(0.0, 0.0, 5.0));
//!     }
//!
//!     manager.tick(1.0 / 60.0);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

pub mod component;
pub mod config;
pub mod error;
pub mod foundation;
pub mod object;
pub mod scene;
pub mod transform;

pub use error::{SceneError, SceneResult};

/// Common imports for scene users
pub mod prelude {
    pub use crate::{
        component::{Behavior, ComponentBody, ComponentType, HookContext, Mesh, Rigidbody},
        config::{Config, SceneConfig},
        error::{SceneError, SceneResult},
        foundation::{
            collections::{ComponentId, EntityId, ListenerId},
            math::{Axis, Quat, Unit, Vec3},
            time::{FixedTimestep, Timer},
        },
        object::{ObjectId, PinGuard},
        scene::{
            EntityKind, EntityManager, Owner, PhysicsHooks, Ray, SceneGraph, SpawnFactory, SpawnRequest,
            SpawnerSettings,
        },
        transform::{Transform, TransformEvent, TransformListener},
    };
}
