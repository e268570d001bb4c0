//! Component registry operations on the scene graph

use log::{debug, trace, warn};

use super::graph::{ComponentNode, Owner, SceneGraph};
use super::slots::SlotBinding;
use crate::component::{Behavior, ComponentBody, ComponentKey, ComponentSelector, ComponentType, HookContext};
use crate::foundation::collections::ComponentId;
use crate::object::Activation;

/// Which behavior hook to run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Hook {
    Attached,
    Detached,
    Update,
    FixedUpdate,
    Activate,
    Deactivate,
    Shutdown,
}

impl SceneGraph {
    /// Put an unowned component into the arena
    ///
    /// The component is live but belongs to nothing until it is attached.
    pub fn create_component(&mut self, name: &str, body: ComponentBody) -> ComponentId {
        self.components.insert(ComponentNode::new(name, body))
    }

    /// Create a component and attach it to `holder` in one step
    ///
    /// Returns `None` if the holder is gone or shut down.
    pub fn add_component(&mut self, holder: Owner, name: &str, body: ComponentBody) -> Option<ComponentId> {
        if !self.holder_accepts_components(holder) {
            warn!("Cannot add component '{name}': holder {holder:?} is missing or shut down");
            return None;
        }
        let component = self.create_component(name, body);
        let attached = self.attach_component(holder, component);
        if attached != Some(component) {
            self.components.remove(component);
        }
        attached
    }

    /// Attach an existing component to `holder`
    ///
    /// If the holder already has a component under an equal key, the existing
    /// instance is kept and returned. Transforms, meshes and rigidbodies
    /// attached to an entity replace the matching slot occupant.
    pub fn attach_component(&mut self, holder: Owner, component: ComponentId) -> Option<ComponentId> {
        if !self.holder_accepts_components(holder) {
            warn!("Cannot attach component: holder {holder:?} is missing or shut down");
            return None;
        }
        let node = self.components.get(component)?;
        if node.identity.is_shutdown() {
            warn!("Cannot attach shut down component {}", node.identity.id());
            return None;
        }
        match node.owner {
            Some(current) if current != holder => {
                warn!(
                    "Component {} is already attached to {current:?}; detach it first",
                    node.identity.id()
                );
                return None;
            }
            _ => {}
        }
        if let Owner::Component(target) = holder {
            if target == component || self.component_is_ancestor(component, target) {
                warn!("Refusing to attach component {} beneath itself", node.identity.id());
                return None;
            }
        }

        if let Owner::Entity(entity) = holder {
            if let Some(binding) = SlotBinding::for_type(node.component_type) {
                return self.replace_slot(entity, binding, component);
            }
        }
        self.insert_into_registry(holder, component)
    }

    /// Register `component` with `holder` and fire its attach hook
    pub(crate) fn insert_into_registry(&mut self, holder: Owner, component: ComponentId) -> Option<ComponentId> {
        let key = ComponentKey::of(&self.components.get(component)?.identity);
        let registry = self.registry_mut(holder)?;
        if let Err(existing) = registry.insert(key, component) {
            trace!("Component already attached to {holder:?}; keeping existing instance");
            return Some(existing);
        }
        if let Some(node) = self.components.get_mut(component) {
            node.owner = Some(holder);
            debug!(
                "Attached component {} '{}' to {holder:?}",
                node.identity.id(),
                node.identity.name()
            );
        }
        self.run_hook(component, Hook::Attached, 0.0);
        Some(component)
    }

    /// Detach a component from `holder`
    ///
    /// Fires the detach hook, shuts the component down (recursively), removes
    /// it from the registry and clears its owner. The node stays in the arena
    /// until a sweep reclaims it. Returns the detached handle, or `None` if no
    /// matching component is attached.
    pub fn detach_component<'a>(
        &mut self,
        holder: Owner,
        selector: impl Into<ComponentSelector<'a>>,
    ) -> Option<ComponentId> {
        let component = self.registry(holder)?.resolve(selector.into())?;
        self.detach_resolved(holder, component);
        Some(component)
    }

    /// Destroy a component attached to `holder`
    ///
    /// Same as [`SceneGraph::detach_component`]: memory is only ever released
    /// by the sweep.
    pub fn destroy_component<'a>(
        &mut self,
        holder: Owner,
        selector: impl Into<ComponentSelector<'a>>,
    ) -> Option<ComponentId> {
        self.detach_component(holder, selector)
    }

    pub(crate) fn detach_resolved(&mut self, holder: Owner, component: ComponentId) {
        self.run_hook(component, Hook::Detached, 0.0);
        if let Owner::Entity(entity) = holder {
            self.release_slot(entity, component);
        }
        self.shutdown_component(component);
        if let Some(registry) = self.registry_mut(holder) {
            registry.remove(component);
        }
        if let Some(node) = self.components.get_mut(component) {
            node.owner = None;
            debug!(
                "Detached component {} '{}' from {holder:?}",
                node.identity.id(),
                node.identity.name()
            );
        }
    }

    /// Attached component by handle, name or id
    pub fn find_component<'a>(
        &self,
        holder: Owner,
        selector: impl Into<ComponentSelector<'a>>,
    ) -> Option<ComponentId> {
        self.registry(holder)?.resolve(selector.into())
    }

    /// Attached component by handle, name or id, if it has type `ty`
    pub fn find_component_typed<'a>(
        &self,
        holder: Owner,
        selector: impl Into<ComponentSelector<'a>>,
        ty: ComponentType,
    ) -> Option<ComponentId> {
        let found = self.find_component(holder, selector)?;
        (self.components.get(found)?.component_type == ty).then_some(found)
    }

    /// First attached component of type `ty`, in attach order
    pub fn find_component_of_type(&self, holder: Owner, ty: ComponentType) -> Option<ComponentId> {
        self.registry(holder)?
            .handles()
            .find(|h| self.components.get(*h).is_some_and(|c| c.component_type == ty))
    }

    /// First attached behavior of concrete type `B`, in attach order
    pub fn find_behavior<B: Behavior>(&self, holder: Owner) -> Option<ComponentId> {
        self.registry(holder)?
            .handles()
            .find(|h| self.behavior::<B>(*h).is_some())
    }

    /// Behavior of a component downcast to `B`
    pub fn behavior<B: Behavior>(&self, component: ComponentId) -> Option<&B> {
        self.components.get(component)?.body.as_ref()?.downcast_ref::<B>()
    }

    /// Mutable behavior of a component downcast to `B`
    pub fn behavior_mut<B: Behavior>(&mut self, component: ComponentId) -> Option<&mut B> {
        self.components.get_mut(component)?.body.as_mut()?.downcast_mut::<B>()
    }

    /// Run a component's variable-rate update
    ///
    /// Child components update first, then the component's own hook.
    pub fn update_component(&mut self, component: ComponentId, delta: f64) {
        if !self.component_updatable(component) {
            return;
        }
        for child in self.component_children(component) {
            self.update_component(child, delta);
        }
        self.run_hook(component, Hook::Update, delta);
    }

    /// Run a component's fixed-rate update
    pub fn fixed_update_component(&mut self, component: ComponentId, delta: f64) {
        if !self.component_updatable(component) {
            return;
        }
        for child in self.component_children(component) {
            self.fixed_update_component(child, delta);
        }
        self.run_hook(component, Hook::FixedUpdate, delta);
    }

    /// Activate or deactivate a component
    ///
    /// Hooks fire only on an actual transition. Returns whether one happened.
    pub fn set_component_active(&mut self, component: ComponentId, active: bool) -> bool {
        let Some(node) = self.components.get(component) else {
            return false;
        };
        match node.identity.lifecycle().set_active(active) {
            Some(Activation::Activated) => self.run_hook(component, Hook::Activate, 0.0),
            Some(Activation::Deactivated) => self.run_hook(component, Hook::Deactivate, 0.0),
            None => return false,
        }
        true
    }

    /// Shut a component and all of its child components down
    ///
    /// Idempotent. The component stays registered with its holder; removal
    /// is the sweep's job.
    pub fn shutdown_component(&mut self, component: ComponentId) {
        let Some(node) = self.components.get(component) else {
            return;
        };
        if !node.identity.lifecycle().shutdown() {
            return;
        }
        trace!("Shutting down component {}", node.identity.id());
        for child in self.component_children(component) {
            self.shutdown_component(child);
        }
        self.run_hook(component, Hook::Shutdown, 0.0);
    }

    fn component_children(&self, component: ComponentId) -> Vec<ComponentId> {
        self.components
            .get(component)
            .map(|c| c.children.to_vec())
            .unwrap_or_default()
    }

    fn holder_accepts_components(&self, holder: Owner) -> bool {
        match holder {
            Owner::Entity(id) => self.entities.get(id).is_some_and(|e| !e.identity.is_shutdown()),
            Owner::Component(id) => self.components.get(id).is_some_and(|c| !c.identity.is_shutdown()),
        }
    }

    fn component_is_ancestor(&self, ancestor: ComponentId, of: ComponentId) -> bool {
        let mut current = of;
        for _ in 0..=self.components.len() {
            match self.components.get(current).and_then(|c| c.owner) {
                Some(Owner::Component(parent)) if parent == ancestor => return true,
                Some(Owner::Component(parent)) => current = parent,
                _ => return false,
            }
        }
        false
    }

    /// Run one behavior hook with the body lifted out of the arena
    pub(crate) fn run_hook(&mut self, component: ComponentId, hook: Hook, delta: f64) {
        let Some(node) = self.components.get_mut(component) else {
            return;
        };
        let mut behavior = match node.body.take() {
            Some(ComponentBody::Custom(behavior)) => behavior,
            other => {
                node.body = other;
                return;
            }
        };

        let entity = self.owning_entity(component);
        let mut ctx = HookContext {
            graph: self,
            component,
            entity,
            delta,
        };
        match hook {
            Hook::Attached => behavior.on_attached(&mut ctx),
            Hook::Detached => behavior.on_detached(&mut ctx),
            Hook::Update => behavior.on_update(&mut ctx),
            Hook::FixedUpdate => behavior.on_fixed_update(&mut ctx),
            Hook::Activate => behavior.on_activate(&mut ctx),
            Hook::Deactivate => behavior.on_deactivate(&mut ctx),
            Hook::Shutdown => behavior.on_shutdown(&mut ctx),
        }

        if let Some(node) = self.components.get_mut(component) {
            node.body = Some(ComponentBody::Custom(behavior));
        }
    }
}
