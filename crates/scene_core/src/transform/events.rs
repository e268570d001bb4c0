//! Transform change notifications
//!
//! Listeners are registered per transform and called synchronously, on the
//! thread that mutated the transform, in registration order. The listener
//! list is snapshotted before each broadcast, so a listener may register or
//! remove listeners without affecting the broadcast in flight.

use std::fmt;
use std::sync::Arc;

use crate::foundation::collections::{ComponentId, HandleMap, ListenerId};
use crate::foundation::math::{Quat, Vec3};

/// Change broadcast by a transform
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TransformEvent {
    /// Position changed
    Translated {
        /// Transform that moved
        transform: ComponentId,
        /// New local position
        position: Vec3,
        /// New global position
        global_position: Vec3,
    },
    /// Rotation changed
    Rotated {
        /// Transform that rotated
        transform: ComponentId,
        /// Rotation applied by this step
        delta: Quat,
        /// Resulting rotation
        rotation: Quat,
    },
}

impl TransformEvent {
    /// Transform the event originated from
    pub fn transform(&self) -> ComponentId {
        match self {
            Self::Translated { transform, .. } | Self::Rotated { transform, .. } => *transform,
        }
    }
}

/// Receiver of transform change notifications
pub trait TransformListener: Send + Sync {
    /// The transform's position changed
    fn on_translate(&self, _event: &TransformEvent) {}

    /// The transform's rotation changed
    ///
    /// A single `rotate` call delivers one to four of these: the requested
    /// rotation, then one per locked axis that needed a correction. Each
    /// event carries only its own delta, so accumulate deltas rather than
    /// treating every call as a complete user rotation.
    fn on_rotate(&self, _event: &TransformEvent) {}
}

/// Registered listeners of one transform
#[derive(Default)]
pub struct ListenerSet {
    listeners: HandleMap<ListenerId, Arc<dyn TransformListener>>,
    order: Vec<ListenerId>,
}

impl ListenerSet {
    /// Register a listener, returning the id used to remove it
    pub fn add(&mut self, listener: Arc<dyn TransformListener>) -> ListenerId {
        let id = self.listeners.insert(listener);
        self.order.push(id);
        id
    }

    /// Remove a listener; returns whether it was registered
    pub fn remove(&mut self, id: ListenerId) -> bool {
        if self.listeners.remove(id).is_none() {
            return false;
        }
        self.order.retain(|l| *l != id);
        true
    }

    /// Remove every listener
    pub fn clear(&mut self) {
        self.listeners.clear();
        self.order.clear();
    }

    /// Number of registered listeners
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// Whether no listener is registered
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Listeners in registration order
    pub fn snapshot(&self) -> Vec<Arc<dyn TransformListener>> {
        self.order
            .iter()
            .filter_map(|id| self.listeners.get(*id).cloned())
            .collect()
    }
}

impl fmt::Debug for ListenerSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerSet").field("len", &self.len()).finish()
    }
}

/// Deliver `event` to each listener in order
pub fn broadcast(listeners: &[Arc<dyn TransformListener>], event: &TransformEvent) {
    for listener in listeners {
        match event {
            TransformEvent::Translated { .. } => listener.on_translate(event),
            TransformEvent::Rotated { .. } => listener.on_rotate(event),
        }
    }
}
