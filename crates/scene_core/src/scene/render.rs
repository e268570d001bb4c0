//! Render snapshot
//!
//! The renderer does not walk the graph. Each frame it receives a flat list
//! of records, one per visible mesh entity, each pinning its entity so the
//! sweep cannot reclaim it while the renderer still holds the record.

use log::{trace, warn};

use super::graph::SceneGraph;
use crate::component::Mesh;
use crate::foundation::collections::EntityId;
use crate::foundation::math::Mat4;
use crate::object::PinGuard;

/// One entity as the renderer sees it
#[derive(Debug, Clone)]
pub struct RenderRecord {
    /// Entity the record was taken from
    pub entity: EntityId,
    /// Pin held for as long as the record lives
    pub pin: PinGuard,
    /// World transform (translation * rotation * scale)
    pub world_matrix: Mat4,
    /// Mesh state at snapshot time
    pub mesh: Mesh,
}

impl SceneGraph {
    /// Records for every active entity with a visible mesh and a transform
    pub fn render_snapshot(&self) -> Vec<RenderRecord> {
        let mut records = Vec::new();
        for (entity, node) in &self.entities {
            if !node.identity.lifecycle().is_updatable() {
                continue;
            }
            let (Some(mesh), Some(transform)) = (self.mesh(entity), self.entity_transform(entity)) else {
                continue;
            };
            if !mesh.visible {
                continue;
            }
            let pin = match PinGuard::acquire(node.identity.lifecycle_handle()) {
                Ok(pin) => pin,
                Err(err) => {
                    warn!("Skipping entity in render snapshot: {err}");
                    continue;
                }
            };
            records.push(RenderRecord {
                entity,
                pin,
                world_matrix: transform.world_matrix(),
                mesh: mesh.clone(),
            });
        }
        trace!("Render snapshot with {} records", records.len());
        records
    }
}
