//! State captured when a drag begins and discarded when it ends.

use std::collections::HashMap;

use bevy::prelude::*;

use crate::math::sanitize_rotation;
use crate::pivot::centroid;
use crate::store::EntityStore;

/// An entity's transform at drag start.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntitySnapshot {
    /// Local transform, with a sanitized rotation.
    pub local: Transform,
    /// World position.
    pub world_position: Vec3,
    /// World rotation.
    pub world_rotation: Quat,
    /// World position minus the session pivot.
    pub offset: Vec3,
}

/// One pointer-down-to-pointer-up manipulation.
#[derive(Debug, Clone)]
pub struct DragSession {
    /// Pivot in world space: the selection centroid, or a picked point for
    /// ground-plane drags.
    pub pivot: Vec3,
    entities: Vec<Entity>,
    snapshots: HashMap<Entity, EntitySnapshot>,
    /// Gizmo orientation when the drag began.
    pub start_gizmo_rotation: Quat,
    /// Snapped angle most recently applied by the rotation gizmo.
    pub last_applied_snap_angle: Option<f32>,
    /// Rotation delta most recently written by the rotation gizmo.
    pub applied_rotation: Quat,
    /// Gizmo scale when the drag began.
    pub initial_gizmo_scale: Vec3,
    /// Height of the horizontal drag plane.
    pub plane_height: f32,
    /// Where the ground-plane pivot was last snapped to.
    pub last_snapped_pivot: Option<Vec3>,
}

impl DragSession {
    /// Snapshots `entities` around `pivot`, or around their centroid when no
    /// pivot is given.
    ///
    /// Entities missing from the store are left out. Returns `None` when
    /// nothing remains to drag.
    pub fn begin<S>(store: &S, entities: &[Entity], pivot: Option<Vec3>) -> Option<Self>
    where
        S: EntityStore + ?Sized,
    {
        let mut ordered = Vec::with_capacity(entities.len());
        for &entity in entities {
            if store.local_transform(entity).is_some() && !ordered.contains(&entity) {
                ordered.push(entity);
            }
        }
        if ordered.is_empty() {
            return None;
        }
        // Parents are written before their children, so a child converts
        // into its parent's already-moved frame.
        ordered.sort_by_key(|&entity| store.depth(entity));

        let pivot = match pivot {
            Some(pivot) => pivot,
            None => centroid(store, &ordered)?,
        };

        let mut snapshots = HashMap::with_capacity(ordered.len());
        for &entity in &ordered {
            let Some(mut local) = store.local_transform(entity) else {
                continue;
            };
            local.rotation = sanitize_rotation(local.rotation);
            let world_position = store.world_position(entity);
            snapshots.insert(
                entity,
                EntitySnapshot {
                    local,
                    world_position,
                    world_rotation: store.world_rotation(entity),
                    offset: world_position - pivot,
                },
            );
        }

        Some(Self {
            pivot,
            entities: ordered,
            snapshots,
            start_gizmo_rotation: Quat::IDENTITY,
            last_applied_snap_angle: None,
            applied_rotation: Quat::IDENTITY,
            initial_gizmo_scale: Vec3::ONE,
            plane_height: pivot.y,
            last_snapped_pivot: Some(pivot),
        })
    }

    /// Dragged entities, shallowest first and otherwise in selection order.
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    /// Number of dragged entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the session drags no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Snapshot of `entity`.
    pub fn snapshot(&self, entity: Entity) -> Option<&EntitySnapshot> {
        self.snapshots.get(&entity)
    }

    /// Snapshots in write order, matching [`DragSession::entities`].
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &EntitySnapshot)> + '_ {
        self.entities
            .iter()
            .filter_map(|entity| self.snapshots.get(entity).map(|s| (*entity, s)))
    }
}
