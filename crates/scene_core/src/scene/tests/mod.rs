//! Shared fixtures for scene tests
//!
//! Instrumented behaviors, listeners, physics collaborators and spawn
//! factories used by the unit tests in the sibling modules and by the
//! scenario suites below.


use std::any::Any;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use super::graph::{EntityKind, SceneGraph};
use super::physics::PhysicsHooks;
use super::spawner::{SpawnContext, SpawnFactory, SpawnRequest};
use crate::component::{Behavior, ComponentBody, HookContext, Mesh};
use crate::foundation::collections::{ComponentId, EntityId, ListenerId};
use crate::foundation::math::{Quat, Vec3};
use crate::transform::{TransformEvent, TransformListener};

#[derive(Debug, Default)]
struct HookCounts {
    attached: AtomicUsize,
    detached: AtomicUsize,
    updates: AtomicUsize,
    fixed_updates: AtomicUsize,
    activations: AtomicUsize,
    deactivations: AtomicUsize,
    shutdowns: AtomicUsize,
    update_order: Mutex<Vec<&'static str>>,
}

/// Hook call counters shared between a test and its recorders
#[derive(Debug, Clone, Default)]
pub(crate) struct Counters(Arc<HookCounts>);

impl Counters {
    pub(crate) fn attached(&self) -> usize {
        self.0.attached.load(Ordering::SeqCst)
    }

    pub(crate) fn detached(&self) -> usize {
        self.0.detached.load(Ordering::SeqCst)
    }

    pub(crate) fn updates(&self) -> usize {
        self.0.updates.load(Ordering::SeqCst)
    }

    pub(crate) fn fixed_updates(&self) -> usize {
        self.0.fixed_updates.load(Ordering::SeqCst)
    }

    pub(crate) fn activations(&self) -> usize {
        self.0.activations.load(Ordering::SeqCst)
    }

    pub(crate) fn deactivations(&self) -> usize {
        self.0.deactivations.load(Ordering::SeqCst)
    }

    pub(crate) fn shutdowns(&self) -> usize {
        self.0.shutdowns.load(Ordering::SeqCst)
    }

    pub(crate) fn update_order(&self) -> Vec<&'static str> {
        self.0.update_order.lock().clone()
    }
}

/// Behavior that counts every hook it receives
pub(crate) struct Recorder {
    label: &'static str,
    counters: Counters,
}

impl Recorder {
    pub(crate) fn body(counters: &Counters) -> ComponentBody {
        Self::body_labeled(counters, "recorder")
    }

    pub(crate) fn body_labeled(counters: &Counters, label: &'static str) -> ComponentBody {
        ComponentBody::custom(Self {
            label,
            counters: counters.clone(),
        })
    }

    fn bump(counter: &AtomicUsize) {
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

impl Behavior for Recorder {
    fn type_name(&self) -> &'static str {
        "Recorder"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_attached(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.attached);
    }

    fn on_detached(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.detached);
    }

    fn on_update(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.updates);
        self.counters.0.update_order.lock().push(self.label);
    }

    fn on_fixed_update(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.fixed_updates);
    }

    fn on_activate(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.activations);
    }

    fn on_deactivate(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.deactivations);
    }

    fn on_shutdown(&mut self, _ctx: &mut HookContext<'_>) {
        Self::bump(&self.counters.0.shutdowns);
    }
}

/// Record of rigidbody notifications
#[derive(Debug, Clone, Default)]
pub(crate) struct PhysicsLog {
    added: Arc<Mutex<Vec<ComponentId>>>,
    removed: Arc<Mutex<Vec<ComponentId>>>,
}

impl PhysicsLog {
    pub(crate) fn added(&self) -> Vec<ComponentId> {
        self.added.lock().clone()
    }

    pub(crate) fn removed(&self) -> Vec<ComponentId> {
        self.removed.lock().clone()
    }
}

/// Physics collaborator that only writes to a [`PhysicsLog`]
pub(crate) struct RecordingPhysics {
    log: PhysicsLog,
}

impl RecordingPhysics {
    pub(crate) fn new(log: &PhysicsLog) -> Self {
        Self { log: log.clone() }
    }
}

impl PhysicsHooks for RecordingPhysics {
    fn add_rigidbody(&mut self, _entity: EntityId, body: ComponentId) {
        self.log.added.lock().push(body);
    }

    fn remove_rigidbody(&mut self, _entity: EntityId, body: ComponentId) {
        self.log.removed.lock().push(body);
    }
}

#[derive(Debug, Default)]
struct EventCounts {
    translations: AtomicUsize,
    rotations: AtomicUsize,
    last_rotation: Mutex<Option<Quat>>,
}

impl TransformListener for EventCounts {
    fn on_translate(&self, _event: &TransformEvent) {
        self.translations.fetch_add(1, Ordering::SeqCst);
    }

    fn on_rotate(&self, event: &TransformEvent) {
        self.rotations.fetch_add(1, Ordering::SeqCst);
        if let TransformEvent::Rotated { delta, .. } = event {
            *self.last_rotation.lock() = Some(*delta);
        }
    }
}

/// Listener registered on one transform, counting what it hears
pub(crate) struct EventLog {
    id: ListenerId,
    counts: Arc<EventCounts>,
}

impl EventLog {
    pub(crate) fn attach(graph: &mut SceneGraph, transform: ComponentId) -> Self {
        let counts = Arc::new(EventCounts::default());
        let id = graph
            .add_transform_listener(transform, counts.clone())
            .expect("listener target is a transform");
        Self { id, counts }
    }

    pub(crate) fn id(&self) -> ListenerId {
        self.id
    }

    pub(crate) fn translations(&self) -> usize {
        self.counts.translations.load(Ordering::SeqCst)
    }

    pub(crate) fn rotations(&self) -> usize {
        self.counts.rotations.load(Ordering::SeqCst)
    }

    pub(crate) fn last_rotation_delta(&self) -> Option<Quat> {
        *self.counts.last_rotation.lock()
    }
}

/// Spawn factory producing meshed entities tagged `spawned` at (1, 0, 0)
pub(crate) struct NamedFactory {
    prefix: &'static str,
    numbered: bool,
}

impl NamedFactory {
    /// Names every request `prefix-N`
    pub(crate) fn unique(prefix: &'static str) -> Box<dyn SpawnFactory> {
        Box::new(Self { prefix, numbered: true })
    }

    /// Uses `name` for every request
    pub(crate) fn fixed(name: &'static str) -> Box<dyn SpawnFactory> {
        Box::new(Self {
            prefix: name,
            numbered: false,
        })
    }
}

impl SpawnFactory for NamedFactory {
    fn create(&mut self, ctx: &SpawnContext) -> Option<SpawnRequest> {
        let name = if self.numbered {
            format!("{}-{}", self.prefix, ctx.spawned_total)
        } else {
            self.prefix.to_string()
        };
        Some(
            SpawnRequest::new(name, EntityKind::Spatial3d, Vec3::new(1.0, 0.0, 0.0))
                .with_tag("spawned")
                .with_component("mesh", Mesh::new(self.prefix, 0.5).into()),
        )
    }
}
