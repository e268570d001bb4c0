//! Component payloads
//!
//! The built-in payloads (transform, mesh, rigidbody) form a closed set the
//! entity caches in dedicated slots. Everything else is a [`Behavior`]: a
//! user type carrying its own type tag and lifecycle hooks.

use std::any::Any;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::foundation::collections::{ComponentId, EntityId};
use crate::foundation::math::Vec3;
use crate::scene::SceneGraph;
use crate::transform::Transform;

/// Type tag of a component body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentType {
    /// Spatial transform
    Transform,
    /// Renderable mesh reference
    Mesh,
    /// Physics body
    Rigidbody,
    /// User behavior, tagged by [`Behavior::type_name`]
    Custom(&'static str),
}

/// Renderable mesh reference
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    /// Asset identifier resolved by the renderer
    pub asset: String,
    /// Radius of a sphere around the entity position enclosing the mesh
    pub bounding_radius: f64,
    /// Whether the mesh should be drawn
    pub visible: bool,
}

impl Mesh {
    /// Visible mesh with the given asset and bounding radius
    pub fn new(asset: impl Into<String>, bounding_radius: f64) -> Self {
        Self {
            asset: asset.into(),
            bounding_radius,
            visible: true,
        }
    }
}

/// Physics body state mirrored for the physics collaborator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rigidbody {
    /// Mass in kilograms
    pub mass: f64,
    /// Linear velocity in units per second
    pub velocity: Vec3,
    /// Kinematic bodies are moved by gameplay code, not by the simulation
    pub kinematic: bool,
}

impl Default for Rigidbody {
    fn default() -> Self {
        Self {
            mass: 1.0,
            velocity: Vec3::zeros(),
            kinematic: false,
        }
    }
}

/// Borrowed view of the scene handed to behavior hooks
pub struct HookContext<'a> {
    /// Scene the component lives in
    pub graph: &'a mut SceneGraph,
    /// The component whose hook is running
    pub component: ComponentId,
    /// Entity the component is (transitively) attached to, if any
    pub entity: Option<EntityId>,
    /// Frame delta in seconds; zero outside update hooks
    pub delta: f64,
}

/// User-defined component logic
///
/// The body is taken out of the arena while a hook runs, so hooks may freely
/// mutate the graph through the context. Looking up the running component's
/// own body from inside a hook yields `None`.
pub trait Behavior: Any + Send {
    /// Stable type tag used for type-based lookup
    fn type_name(&self) -> &'static str;

    /// Upcast for downcasting to the concrete type
    fn as_any(&self) -> &dyn Any;

    /// Mutable upcast for downcasting to the concrete type
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Called after the component is inserted into a holder's registry
    fn on_attached(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Called before the component is removed from a holder's registry
    fn on_detached(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Variable-rate update, after child components have updated
    fn on_update(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Fixed-rate update, after child components have updated
    fn on_fixed_update(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Inactive to active transition
    fn on_activate(&mut self, _ctx: &mut HookContext<'_>) {}

    /// Active to inactive transition
    fn on_deactivate(&mut self, _ctx: &mut HookContext<'_>) {}

    /// One-time shutdown, after child components have shut down
    fn on_shutdown(&mut self, _ctx: &mut HookContext<'_>) {}
}

/// Payload of a component
pub enum ComponentBody {
    /// Spatial transform
    Transform(Transform),
    /// Renderable mesh reference
    Mesh(Mesh),
    /// Physics body
    Rigidbody(Rigidbody),
    /// User behavior
    Custom(Box<dyn Behavior>),
}

impl ComponentBody {
    /// Wrap a behavior
    pub fn custom<B: Behavior>(behavior: B) -> Self {
        Self::Custom(Box::new(behavior))
    }

    /// Type tag of the payload
    pub fn component_type(&self) -> ComponentType {
        match self {
            Self::Transform(_) => ComponentType::Transform,
            Self::Mesh(_) => ComponentType::Mesh,
            Self::Rigidbody(_) => ComponentType::Rigidbody,
            Self::Custom(behavior) => ComponentType::Custom(behavior.type_name()),
        }
    }

    /// Behavior downcast to `B`
    pub fn downcast_ref<B: Behavior>(&self) -> Option<&B> {
        match self {
            Self::Custom(behavior) => behavior.as_any().downcast_ref::<B>(),
            _ => None,
        }
    }

    /// Mutable behavior downcast to `B`
    pub fn downcast_mut<B: Behavior>(&mut self) -> Option<&mut B> {
        match self {
            Self::Custom(behavior) => behavior.as_any_mut().downcast_mut::<B>(),
            _ => None,
        }
    }
}

impl From<Transform> for ComponentBody {
    fn from(transform: Transform) -> Self {
        Self::Transform(transform)
    }
}

impl From<Mesh> for ComponentBody {
    fn from(mesh: Mesh) -> Self {
        Self::Mesh(mesh)
    }
}

impl From<Rigidbody> for ComponentBody {
    fn from(body: Rigidbody) -> Self {
        Self::Rigidbody(body)
    }
}

impl fmt::Debug for ComponentBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transform(t) => f.debug_tuple("Transform").field(t).finish(),
            Self::Mesh(m) => f.debug_tuple("Mesh").field(m).finish(),
            Self::Rigidbody(r) => f.debug_tuple("Rigidbody").field(r).finish(),
            Self::Custom(b) => f.debug_tuple("Custom").field(&b.type_name()).finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Health(u32);

    impl Behavior for Health {
        fn type_name(&self) -> &'static str {
            "Health"
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[test]
    fn test_component_type_tags() {
        assert_eq!(
            ComponentBody::from(Mesh::new("cube", 1.0)).component_type(),
            ComponentType::Mesh
        );
        assert_eq!(
            ComponentBody::from(Rigidbody::default()).component_type(),
            ComponentType::Rigidbody
        );
        assert_eq!(
            ComponentBody::custom(Health(3)).component_type(),
            ComponentType::Custom("Health")
        );
    }

    #[test]
    fn test_downcast_behavior() {
        let mut body = ComponentBody::custom(Health(3));
        body.downcast_mut::<Health>().unwrap().0 -= 1;
        assert_eq!(body.downcast_ref::<Health>().map(|h| h.0), Some(2));
        assert!(ComponentBody::from(Mesh::new("cube", 1.0))
            .downcast_ref::<Health>()
            .is_none());
    }
}
