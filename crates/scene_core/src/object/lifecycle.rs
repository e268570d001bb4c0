//! Lifecycle state shared by every entity and component
//!
//! Activation, shutdown and the pin count live behind one lock so that a pin
//! can never slip in between the sweep's "shut down and unreferenced" check
//! and the actual reclamation.
//!
//! ```text
//!   Live(active | inactive) --shutdown--> Zombie --sweep, pins == 0--> Reclaimed
//! ```
//!
//! Pins may be taken while `Live` or `Zombie`. Once `Reclaimed`, `reserve`
//! fails, so a subsystem holding a stale handle learns the object is gone
//! instead of resurrecting it.

use std::sync::Arc;

use parking_lot::Mutex;

use super::ObjectId;
use crate::error::{SceneError, SceneResult};

/// Coarse lifecycle phase of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifePhase {
    /// Participates in updates when active
    Live,
    /// Shut down; memory kept until the pin count drops to zero and a sweep runs
    Zombie,
    /// Removed from its arena; terminal
    Reclaimed,
}

/// An actual activation transition produced by `set_active`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activation {
    /// Inactive to active
    Activated,
    /// Active to inactive
    Deactivated,
}

#[derive(Debug)]
struct LifeState {
    phase: LifePhase,
    active: bool,
    pins: u32,
}

/// Unified activation, shutdown and pin state of one object
#[derive(Debug)]
pub struct Lifecycle {
    id: ObjectId,
    state: Mutex<LifeState>,
}

/// Shared handle to a lifecycle, safe to hand to other threads
pub type LifecycleHandle = Arc<Lifecycle>;

impl Lifecycle {
    /// Create the lifecycle of a freshly constructed, active object
    pub fn new(id: ObjectId) -> LifecycleHandle {
        Arc::new(Self {
            id,
            state: Mutex::new(LifeState {
                phase: LifePhase::Live,
                active: true,
                pins: 0,
            }),
        })
    }

    /// Id of the object this lifecycle belongs to
    pub fn id(&self) -> ObjectId {
        self.id
    }

    /// Current phase
    pub fn phase(&self) -> LifePhase {
        self.state.lock().phase
    }

    /// Whether the object is live and active
    pub fn is_active(&self) -> bool {
        self.state.lock().active
    }

    /// Whether the object has been shut down (zombie or reclaimed)
    pub fn is_shutdown(&self) -> bool {
        self.state.lock().phase != LifePhase::Live
    }

    /// Whether the object is live and active, read under a single lock
    pub fn is_updatable(&self) -> bool {
        let state = self.state.lock();
        state.phase == LifePhase::Live && state.active
    }

    /// Current number of outstanding pins
    pub fn reference_count(&self) -> u32 {
        self.state.lock().pins
    }

    /// Change the active flag, reporting the transition if one happened
    ///
    /// Returns `None` when the flag already had the requested value or when
    /// the object is shut down: shutdown is terminal and keeps it inactive.
    pub fn set_active(&self, active: bool) -> Option<Activation> {
        let mut state = self.state.lock();
        if state.phase != LifePhase::Live || state.active == active {
            return None;
        }
        state.active = active;
        Some(if active {
            Activation::Activated
        } else {
            Activation::Deactivated
        })
    }

    /// Shut the object down; returns `true` only for the first call
    pub fn shutdown(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase != LifePhase::Live {
            return false;
        }
        state.phase = LifePhase::Zombie;
        state.active = false;
        true
    }

    /// Pin the object, returning the new pin count
    pub fn reserve(&self) -> SceneResult<u32> {
        let mut state = self.state.lock();
        if state.phase == LifePhase::Reclaimed {
            return Err(SceneError::Reclaimed(self.id));
        }
        state.pins += 1;
        Ok(state.pins)
    }

    /// Release one pin, returning the new pin count
    ///
    /// Over-release is clamped at zero and logged.
    pub fn free(&self) -> u32 {
        let mut state = self.state.lock();
        if state.pins == 0 {
            log::warn!("Object {} released more times than it was reserved", self.id);
            return 0;
        }
        state.pins -= 1;
        state.pins
    }

    /// Whether a sweep could reclaim the object right now
    pub fn is_reclaimable(&self) -> bool {
        let state = self.state.lock();
        state.phase == LifePhase::Zombie && state.pins == 0
    }

    /// Move `Zombie` with no pins to `Reclaimed`; returns whether it did
    pub(crate) fn try_reclaim(&self) -> bool {
        let mut state = self.state.lock();
        if state.phase == LifePhase::Zombie && state.pins == 0 {
            state.phase = LifePhase::Reclaimed;
            true
        } else {
            false
        }
    }

    /// Reclaim regardless of phase, refusing only while pinned
    pub(crate) fn force_reclaim(&self) -> SceneResult<()> {
        let mut state = self.state.lock();
        if state.pins > 0 {
            return Err(SceneError::StillReferenced {
                id: self.id,
                pins: state.pins,
            });
        }
        state.phase = LifePhase::Reclaimed;
        state.active = false;
        Ok(())
    }
}

/// RAII pin on an object
///
/// Holds one reference for as long as it lives, keeping the object out of
/// the sweep even after it is detached and shut down.
#[derive(Debug)]
pub struct PinGuard {
    lifecycle: LifecycleHandle,
}

impl PinGuard {
    /// Take a pin on the object behind `lifecycle`
    pub fn acquire(lifecycle: LifecycleHandle) -> SceneResult<Self> {
        lifecycle.reserve()?;
        Ok(Self { lifecycle })
    }

    /// Id of the pinned object
    pub fn id(&self) -> ObjectId {
        self.lifecycle.id()
    }

    /// Lifecycle of the pinned object
    pub fn lifecycle(&self) -> &LifecycleHandle {
        &self.lifecycle
    }
}

impl Clone for PinGuard {
    fn clone(&self) -> Self {
        // The object cannot be reclaimed while this guard exists, so the
        // extra pin always succeeds.
        let _ = self.lifecycle.reserve();
        Self {
            lifecycle: Arc::clone(&self.lifecycle),
        }
    }
}

impl Drop for PinGuard {
    fn drop(&mut self) {
        self.lifecycle.free();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::object::allocate_object_id;
    use std::thread;

    fn lifecycle() -> LifecycleHandle {
        Lifecycle::new(allocate_object_id())
    }

    #[test]
    fn test_reserve_free_clamps_at_zero() {
        for (reserves, frees) in [(0u32, 0u32), (3, 1), (2, 2), (1, 4), (0, 3)] {
            let life = lifecycle();
            for _ in 0..reserves {
                life.reserve().unwrap();
            }
            for _ in 0..frees {
                life.free();
            }
            assert_eq!(life.reference_count(), reserves.saturating_sub(frees));
        }
    }

    #[test]
    fn test_set_active_reports_only_transitions() {
        let life = lifecycle();
        assert_eq!(life.set_active(true), None);
        assert_eq!(life.set_active(false), Some(Activation::Deactivated));
        assert_eq!(life.set_active(false), None);
        assert_eq!(life.set_active(true), Some(Activation::Activated));
    }

    #[test]
    fn test_shutdown_is_terminal_and_idempotent() {
        let life = lifecycle();
        assert!(life.shutdown());
        assert!(!life.shutdown());
        assert!(life.is_shutdown());
        assert!(!life.is_active());
        assert_eq!(life.set_active(true), None);
        assert_eq!(life.phase(), LifePhase::Zombie);
    }

    #[test]
    fn test_pinned_zombie_is_not_reclaimed() {
        let life = lifecycle();
        life.reserve().unwrap();
        life.shutdown();

        assert!(!life.try_reclaim());
        life.free();
        assert!(life.try_reclaim());
        assert_eq!(life.phase(), LifePhase::Reclaimed);
    }

    #[test]
    fn test_reserve_after_reclaim_fails() {
        let life = lifecycle();
        life.shutdown();
        assert!(life.try_reclaim());
        assert!(matches!(life.reserve(), Err(SceneError::Reclaimed(_))));
    }

    #[test]
    fn test_force_reclaim_refuses_pinned_object() {
        let life = lifecycle();
        let _pin = PinGuard::acquire(Arc::clone(&life)).unwrap();
        assert!(matches!(
            life.force_reclaim(),
            Err(SceneError::StillReferenced { pins: 1, .. })
        ));
    }

    #[test]
    fn test_pin_guard_releases_on_drop() {
        let life = lifecycle();
        {
            let pin = PinGuard::acquire(Arc::clone(&life)).unwrap();
            let copy = pin.clone();
            assert_eq!(life.reference_count(), 2);
            drop(copy);
            assert_eq!(life.reference_count(), 1);
        }
        assert_eq!(life.reference_count(), 0);
    }

    #[test]
    fn test_concurrent_reserve_and_reclaim_never_lose_a_pin() {
        for _ in 0..64 {
            let life = lifecycle();
            life.shutdown();

            let pinner = {
                let life = Arc::clone(&life);
                thread::spawn(move || life.reserve().is_ok())
            };
            let reclaimed = life.try_reclaim();
            let pinned = pinner.join().unwrap();

            // Either the sweep won and the pin was refused, or the pin won
            // and the object survives the sweep.
            assert_ne!(reclaimed, pinned);
            if pinned {
                assert_eq!(life.phase(), LifePhase::Zombie);
            }
        }
    }
}
