//! Collaborator seams: where transforms are read from, where they are sent,
//! and how the scene answers picking queries.
//!
//! The gizmo engine is written purely against these traits. The Bevy shell
//! backs [`EntityStore`] with the ECS world; tests and headless hosts use the
//! in-memory [`SceneGraph`].

use std::collections::HashMap;

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::math::sanitize_rotation;

/// Longest parent chain walked before giving up; guards against cycles.
const MAX_PARENT_DEPTH: usize = 64;

/// Read/write access to entity transforms and hierarchy.
///
/// World-space queries are computed fresh on every call from the current
/// local transforms, so a parent moved earlier in the same batch is seen.
pub trait EntityStore {
    /// Local (parent-relative) transform of `entity`, if it exists.
    fn local_transform(&self, entity: Entity) -> Option<Transform>;

    /// Overwrites the local transform of `entity`. Unknown entities are ignored.
    fn set_local_transform(&mut self, entity: Entity, transform: Transform);

    /// Parent of `entity`, if any.
    fn parent(&self, entity: Entity) -> Option<Entity>;

    /// Number of ancestors above `entity`.
    fn depth(&self, entity: Entity) -> usize {
        let mut depth = 0;
        let mut current = self.parent(entity);
        while let Some(node) = current {
            if depth >= MAX_PARENT_DEPTH {
                break;
            }
            depth += 1;
            current = self.parent(node);
        }
        depth
    }

    /// World matrix of `entity`, identity for unknown entities.
    fn world_matrix(&self, entity: Entity) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(entity);
        let mut depth = 0;
        while let Some(node) = current {
            if depth >= MAX_PARENT_DEPTH {
                break;
            }
            let Some(local) = self.local_transform(node) else {
                break;
            };
            matrix = local_matrix(&local) * matrix;
            current = self.parent(node);
            depth += 1;
        }
        matrix
    }

    /// World position of `entity`.
    fn world_position(&self, entity: Entity) -> Vec3 {
        self.world_matrix(entity).w_axis.truncate()
    }

    /// World rotation of `entity`, composed along the parent chain.
    fn world_rotation(&self, entity: Entity) -> Quat {
        let mut rotation = Quat::IDENTITY;
        let mut current = Some(entity);
        let mut depth = 0;
        while let Some(node) = current {
            if depth >= MAX_PARENT_DEPTH {
                break;
            }
            let Some(local) = self.local_transform(node) else {
                break;
            };
            rotation = sanitize_rotation(local.rotation) * rotation;
            current = self.parent(node);
            depth += 1;
        }
        sanitize_rotation(rotation)
    }

    /// World scale of `entity`, as decomposed from its world matrix.
    fn world_scale(&self, entity: Entity) -> Vec3 {
        let (scale, _, _) = self.world_matrix(entity).to_scale_rotation_translation();
        scale
    }
}

/// Matrix of a local transform, with a corrupt rotation read as identity.
pub fn local_matrix(transform: &Transform) -> Mat4 {
    Mat4::from_scale_rotation_translation(
        transform.scale,
        sanitize_rotation(transform.rotation),
        transform.translation,
    )
}

/// Receives transform writes for live feedback and the end-of-drag commit.
pub trait TransformDispatcher {
    /// Called after every write to the entity store during a drag.
    fn update_entity_transform(&mut self, entity: Entity, transform: Transform);

    /// Called exactly once per finished drag.
    fn commit(&mut self);
}

/// Resolves a world ray to the first scene point it hits.
pub trait ScenePicker {
    /// The hit point, or `None` when the ray misses all geometry.
    fn pick_point(&self, ray: &Ray3d) -> Option<Vec3>;
}

impl<F> ScenePicker for F
where
    F: Fn(&Ray3d) -> Option<Vec3>,
{
    fn pick_point(&self, ray: &Ray3d) -> Option<Vec3> {
        self(ray)
    }
}

/// A picker that never hits anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoScenePicker;

impl ScenePicker for NoScenePicker {
    fn pick_point(&self, _ray: &Ray3d) -> Option<Vec3> {
        None
    }
}

/// Supplies the ordered set of selected entities.
pub trait SelectionProvider {
    /// Selected entities in selection order.
    fn selected_entities(&self) -> &[Entity];
}

/// The selection the gizmo is attached to, in selection order.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq)]
pub struct GizmoSelection {
    entities: Vec<Entity>,
}

impl GizmoSelection {
    /// Replaces the selection.
    pub fn set(&mut self, entities: impl IntoIterator<Item = Entity>) {
        self.entities.clear();
        for entity in entities {
            self.add(entity);
        }
    }

    /// Appends `entity` unless it is already selected.
    pub fn add(&mut self, entity: Entity) {
        if !self.entities.contains(&entity) {
            self.entities.push(entity);
        }
    }

    /// Adds `entity` if absent, removes it if present.
    pub fn toggle(&mut self, entity: Entity) {
        if let Some(index) = self.entities.iter().position(|e| *e == entity) {
            self.entities.remove(index);
        } else {
            self.entities.push(entity);
        }
    }

    /// Empties the selection.
    pub fn clear(&mut self) {
        self.entities.clear();
    }

    /// The most recently selected entity.
    pub fn primary(&self) -> Option<Entity> {
        self.entities.last().copied()
    }

    /// Whether `entity` is selected.
    pub fn contains(&self, entity: Entity) -> bool {
        self.entities.contains(&entity)
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}

impl SelectionProvider for GizmoSelection {
    fn selected_entities(&self) -> &[Entity] {
        &self.entities
    }
}

#[derive(Debug, Clone, Copy)]
struct SceneNode {
    transform: Transform,
    parent: Option<Entity>,
}

/// In-memory transform hierarchy for headless use.
#[derive(Debug, Clone, Default)]
pub struct SceneGraph {
    nodes: HashMap<Entity, SceneNode>,
}

impl SceneGraph {
    /// Empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a root entity.
    pub fn insert(&mut self, entity: Entity, transform: Transform) {
        self.nodes.insert(
            entity,
            SceneNode {
                transform,
                parent: None,
            },
        );
    }

    /// Adds or replaces an entity parented to `parent`.
    pub fn insert_child(&mut self, entity: Entity, parent: Entity, transform: Transform) {
        self.nodes.insert(
            entity,
            SceneNode {
                transform,
                parent: Some(parent),
            },
        );
    }

    /// Removes an entity. Its children keep pointing at the missing parent and
    /// resolve as roots.
    pub fn remove(&mut self, entity: Entity) -> Option<Transform> {
        self.nodes.remove(&entity).map(|node| node.transform)
    }
}

impl EntityStore for SceneGraph {
    fn local_transform(&self, entity: Entity) -> Option<Transform> {
        self.nodes.get(&entity).map(|node| node.transform)
    }

    fn set_local_transform(&mut self, entity: Entity, transform: Transform) {
        if let Some(node) = self.nodes.get_mut(&entity) {
            node.transform = transform;
        }
    }

    fn parent(&self, entity: Entity) -> Option<Entity> {
        self.nodes.get(&entity).and_then(|node| node.parent)
    }
}

/// Transform changes committed together at the end of one drag.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformBatch {
    /// Final local transform per entity, in first-write order.
    pub changes: Vec<(Entity, Transform)>,
}

/// Dispatcher that records live updates and folds them into batches on commit.
///
/// Hosts drain [`TransformJournal::drain_committed`] to feed their undo stack
/// or persistence layer.
#[derive(Resource, Debug, Clone, Default)]
pub struct TransformJournal {
    pending: Vec<(Entity, Transform)>,
    committed: Vec<TransformBatch>,
    updates: usize,
}

impl TransformJournal {
    /// Changes written since the last commit.
    pub fn pending(&self) -> &[(Entity, Transform)] {
        &self.pending
    }

    /// Batches committed and not yet drained.
    pub fn committed(&self) -> &[TransformBatch] {
        &self.committed
    }

    /// Total live updates received.
    pub fn update_count(&self) -> usize {
        self.updates
    }

    /// Takes every committed batch.
    pub fn drain_committed(&mut self) -> Vec<TransformBatch> {
        std::mem::take(&mut self.committed)
    }
}

impl TransformDispatcher for TransformJournal {
    fn update_entity_transform(&mut self, entity: Entity, transform: Transform) {
        self.updates += 1;
        match self.pending.iter_mut().find(|(e, _)| *e == entity) {
            Some((_, existing)) => *existing = transform,
            None => self.pending.push((entity, transform)),
        }
    }

    fn commit(&mut self) {
        if self.pending.is_empty() {
            debug!("Gizmo commit with no pending transform changes");
            return;
        }
        let changes = std::mem::take(&mut self.pending);
        debug!("Committing transform batch of {} entities", changes.len());
        self.committed.push(TransformBatch { changes });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entities(n: usize) -> Vec<Entity> {
        let mut world = World::new();
        (0..n).map(|_| world.spawn_empty().id()).collect()
    }

    #[test]
    fn world_queries_follow_parent_chain() {
        let ids = entities(2);
        let (parent, child) = (ids[0], ids[1]);
        let mut graph = SceneGraph::new();
        graph.insert(
            parent,
            Transform::from_xyz(1.0, 0.0, 0.0)
                .with_rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
                .with_scale(Vec3::splat(2.0)),
        );
        graph.insert_child(child, parent, Transform::from_xyz(1.0, 0.0, 0.0));

        // Child's local +X maps to parent-space -Z, doubled.
        assert!(graph
            .world_position(child)
            .abs_diff_eq(Vec3::new(1.0, 0.0, -2.0), 1e-5));
        assert!(graph
            .world_rotation(child)
            .abs_diff_eq(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2), 1e-5));
        assert!(graph.world_scale(child).abs_diff_eq(Vec3::splat(2.0), 1e-5));
    }

    #[test]
    fn parent_cycle_terminates() {
        let ids = entities(2);
        let mut graph = SceneGraph::new();
        graph.insert_child(ids[0], ids[1], Transform::from_xyz(1.0, 0.0, 0.0));
        graph.insert_child(ids[1], ids[0], Transform::from_xyz(1.0, 0.0, 0.0));
        assert!(graph.world_position(ids[0]).is_finite());
    }

    #[test]
    fn unknown_entity_has_identity_matrix() {
        let ids = entities(1);
        let graph = SceneGraph::new();
        assert_eq!(graph.world_matrix(ids[0]), Mat4::IDENTITY);
        assert!(graph.local_transform(ids[0]).is_none());
    }

    #[test]
    fn removed_parent_leaves_child_as_root() {
        let ids = entities(2);
        let (parent, child) = (ids[0], ids[1]);
        let mut graph = SceneGraph::new();
        graph.insert(parent, Transform::from_xyz(5.0, 0.0, 0.0));
        graph.insert_child(child, parent, Transform::from_xyz(1.0, 0.0, 0.0));
        assert_eq!(graph.depth(child), 1);

        let removed = graph.remove(parent).unwrap();
        assert_eq!(removed.translation.x, 5.0);
        assert!(graph.remove(parent).is_none());
        assert!(graph
            .world_position(child)
            .abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn journal_folds_updates_into_one_batch() {
        let ids = entities(2);
        let mut journal = TransformJournal::default();
        journal.update_entity_transform(ids[0], Transform::from_xyz(1.0, 0.0, 0.0));
        journal.update_entity_transform(ids[1], Transform::from_xyz(2.0, 0.0, 0.0));
        journal.update_entity_transform(ids[0], Transform::from_xyz(3.0, 0.0, 0.0));
        journal.commit();
        journal.commit();

        assert_eq!(journal.update_count(), 3);
        assert!(journal.pending().is_empty());
        let batches = journal.drain_committed();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].changes.len(), 2);
        assert_eq!(batches[0].changes[0].0, ids[0]);
        assert_eq!(batches[0].changes[0].1.translation.x, 3.0);
        assert!(journal.committed().is_empty());
    }

    #[test]
    fn selection_keeps_order_and_uniqueness() {
        let ids = entities(3);
        let mut selection = GizmoSelection::default();
        selection.set([ids[2], ids[0], ids[2]]);
        assert_eq!(selection.selected_entities(), &[ids[2], ids[0]]);
        selection.toggle(ids[1]);
        assert_eq!(selection.primary(), Some(ids[1]));
        selection.toggle(ids[2]);
        assert_eq!(selection.selected_entities(), &[ids[0], ids[1]]);
        selection.clear();
        assert!(selection.is_empty());
    }

    #[test]
    fn closures_pick() {
        let picker = |ray: &Ray3d| Some(ray.origin);
        let ray = Ray3d::new(Vec3::ONE, Dir3::NEG_Y);
        assert_eq!(picker.pick_point(&ray), Some(Vec3::ONE));
        assert!(NoScenePicker.pick_point(&ray).is_none());
    }
}
