//! Pivot selection for multi-entity drags.

use bevy::prelude::*;

use crate::store::EntityStore;

/// Arithmetic mean of the world positions of `entities`.
///
/// Entities unknown to the store are skipped; `None` when none remain.
pub fn centroid<S>(store: &S, entities: &[Entity]) -> Option<Vec3>
where
    S: EntityStore + ?Sized,
{
    let mut sum = Vec3::ZERO;
    let mut count = 0usize;
    for &entity in entities {
        if store.local_transform(entity).is_none() {
            continue;
        }
        sum += store.world_position(entity);
        count += 1;
    }
    (count > 0).then(|| sum / count as f32)
}
