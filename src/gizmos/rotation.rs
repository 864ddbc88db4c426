use bevy::prelude::*;

use super::{aligned_rotation, recenter, DragStart, DragUpdate, GizmoContext, GizmoTransformer};
use crate::math::{rotation_angle, sanitize_rotation};
use crate::session::DragSession;
use crate::snap::{rotation_gate, snap_rotation};
use crate::store::EntityStore;
use crate::types::{AlignmentMode, GizmoConfig, GizmoHandle, GizmoKind};

/// Swept angle below which the gizmo counts as not rotated.
const HOLD_EPSILON: f32 = 1e-6;

/// Rotates the selection. One entity turns in place; several entities also
/// orbit the shared pivot.
#[derive(Debug, Default)]
pub struct RotationGizmo {
    entities: Vec<Entity>,
    session: Option<DragSession>,
}

impl RotationGizmo {
    /// A detached rotation gizmo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open drag session, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }
}

/// Applies the rotation from the session's start orientation to `current`.
fn rotate_selection(ctx: &mut GizmoContext, session: &mut DragSession, current: Quat) {
    let start = session.start_gizmo_rotation;
    let delta = sanitize_rotation(start.inverse() * sanitize_rotation(current));
    let angle = rotation_angle(delta);

    if angle < HOLD_EPSILON {
        session.last_applied_snap_angle = None;
        if rotation_angle(session.applied_rotation) < HOLD_EPSILON {
            return;
        }
        session.applied_rotation = Quat::IDENTITY;
        for (entity, snapshot) in session.iter() {
            ctx.write_local(entity, snapshot.local);
        }
        return;
    }

    let snap = ctx.config.snap;
    let applied = if snap.enabled {
        if !rotation_gate(&snap, angle, session.last_applied_snap_angle) {
            return;
        }
        let snapped = snap_rotation(delta, snap.rotation_step).value;
        session.last_applied_snap_angle = Some(rotation_angle(snapped));
        snapped
    } else {
        delta
    };

    // Same step as last time: nothing new to write.
    if rotation_angle(session.applied_rotation.inverse() * applied) < HOLD_EPSILON {
        return;
    }
    session.applied_rotation = applied;

    let world_delta = sanitize_rotation(start * applied * start.inverse());
    let orbit = session.len() > 1;
    let pivot = session.pivot;
    for (entity, snapshot) in session.iter() {
        let rotation = world_delta * snapshot.world_rotation;
        let position = orbit.then(|| pivot + world_delta * snapshot.offset);
        ctx.place(entity, snapshot.local, position, Some(rotation));
    }
}

impl GizmoTransformer for RotationGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Rotation
    }

    fn setup(&mut self) {
        self.session = None;
    }

    fn set_entities(&mut self, entities: &[Entity]) {
        self.entities = entities.to_vec();
    }

    fn entities(&self) -> &[Entity] {
        &self.entities
    }

    fn on_drag_start(
        &mut self,
        ctx: &mut GizmoContext,
        node: &mut Transform,
        start: &DragStart,
    ) -> bool {
        if self.session.is_some() || !matches!(start.handle, GizmoHandle::Axis(_)) {
            return false;
        }
        let Some(mut session) = DragSession::begin(&*ctx.store, &self.entities, None) else {
            return false;
        };
        node.translation = session.pivot;
        session.start_gizmo_rotation = sanitize_rotation(node.rotation);
        debug!(
            "Rotation drag started on {:?} with {} entities",
            start.handle,
            session.len()
        );
        self.session = Some(session);
        true
    }

    fn update(&mut self, ctx: &mut GizmoContext, _node: &mut Transform, update: &DragUpdate) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match update {
            DragUpdate::Handle(target) => rotate_selection(ctx, session, target.rotation),
            _ => debug!("Rotation gizmo ignored {update:?}"),
        }
    }

    fn on_drag_end(&mut self, ctx: &mut GizmoContext, node: &mut Transform) -> bool {
        let Some(session) = self.session.take() else {
            return false;
        };
        let local = ctx.config.alignment == AlignmentMode::Local;
        node.rotation = aligned_rotation(&*ctx.store, session.entities(), local);
        true
    }

    fn cleanup(&mut self) {
        self.session = None;
        self.entities.clear();
    }

    fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    fn align_node(&self, store: &dyn EntityStore, config: &GizmoConfig, node: &mut Transform) {
        recenter(store, &self.entities, node);
        node.rotation = aligned_rotation(store, &self.entities, config.alignment == AlignmentMode::Local);
        node.scale = Vec3::ONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmos::test_support::Rig;
    use crate::types::GizmoAxis;
    use std::f32::consts::FRAC_PI_2;

    fn start(rig: &mut Rig, gizmo: &mut RotationGizmo, node: &mut Transform) {
        gizmo.set_entities(&rig.ids.clone());
        let mut ctx = rig.ctx();
        gizmo.align_node(&*ctx.store, ctx.config, node);
        let start = DragStart::handle(GizmoHandle::Axis(GizmoAxis::Y));
        assert!(gizmo.on_drag_start(&mut ctx, node, &start));
    }

    fn turn(rig: &mut Rig, gizmo: &mut RotationGizmo, node: &mut Transform, degrees: f32) {
        let start_rotation = gizmo.session().unwrap().start_gizmo_rotation;
        let target = Transform {
            rotation: start_rotation * Quat::from_rotation_y(degrees.to_radians()),
            ..*node
        };
        let mut ctx = rig.ctx();
        gizmo.update(&mut ctx, node, &DragUpdate::Handle(target));
    }

    #[test]
    fn two_entities_orbit_the_pivot() {
        let mut rig = Rig::new(&[Transform::from_xyz(0.0, 0.0, 0.0), Transform::from_xyz(2.0, 0.0, 0.0)]);
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        // A clockwise quarter turn seen from above.
        turn(&mut rig, &mut gizmo, &mut node, -90.0);

        assert!(rig.local(0).translation.abs_diff_eq(Vec3::new(1.0, 0.0, -1.0), 1e-5));
        assert!(rig.local(1).translation.abs_diff_eq(Vec3::new(1.0, 0.0, 1.0), 1e-5));
        let expected = Quat::from_rotation_y(-FRAC_PI_2);
        assert!(rig.local(0).rotation.abs_diff_eq(expected, 1e-5));
        assert!(rig.local(1).rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn child_selected_before_parent_orbits_once() {
        let mut rig = Rig::new(&[Transform::from_xyz(2.0, 0.0, 0.0)]);
        let parent = rig.ids[0];
        let child = rig.spawn_child(parent, Transform::from_xyz(2.0, 0.0, 0.0));
        rig.ids = vec![child, parent];

        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        // Pivot (3, 0, 0); a quarter turn swings the pair onto the Z axis.
        turn(&mut rig, &mut gizmo, &mut node, -90.0);

        assert!(rig.graph.world_position(parent).abs_diff_eq(Vec3::new(3.0, 0.0, -1.0), 1e-5));
        assert!(rig.graph.world_position(child).abs_diff_eq(Vec3::new(3.0, 0.0, 1.0), 1e-5));
        assert!(rig.local(0).translation.abs_diff_eq(Vec3::new(2.0, 0.0, 0.0), 1e-5));
        assert!(rig.local(0).rotation.abs_diff_eq(Quat::IDENTITY, 1e-5));
    }

    #[test]
    fn single_entity_rotates_in_place() {
        let mut rig = Rig::new(&[Transform::from_xyz(3.0, 1.0, 0.0)]);
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        turn(&mut rig, &mut gizmo, &mut node, 45.0);

        assert_eq!(rig.local(0).translation, Vec3::new(3.0, 1.0, 0.0));
        assert!(rig
            .local(0)
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(45.0_f32.to_radians()), 1e-5));
    }

    #[test]
    fn local_alignment_turns_about_entity_axes() {
        let tilted = Quat::from_rotation_x(FRAC_PI_2);
        let mut rig = Rig::new(&[Transform::from_rotation(tilted)]);
        rig.config.alignment = AlignmentMode::Local;
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        assert!(node.rotation.abs_diff_eq(tilted, 1e-6));

        // Spinning about the node's local Y is spinning about the entity's own Y.
        turn(&mut rig, &mut gizmo, &mut node, 30.0);
        let expected = tilted * Quat::from_rotation_y(30.0_f32.to_radians());
        assert!(rig.local(0).rotation.abs_diff_eq(expected, 1e-5));
    }

    #[test]
    fn snapping_is_stepwise() {
        let mut rig = Rig::new(&[Transform::IDENTITY]);
        rig.config.snap.enabled = true;
        rig.config.snap.rotation_step = 15.0_f32.to_radians();
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);

        for degrees in 0..=14 {
            turn(&mut rig, &mut gizmo, &mut node, degrees as f32);
        }
        assert_eq!(rig.journal.update_count(), 0);
        assert_eq!(rig.local(0).rotation, Quat::IDENTITY);

        turn(&mut rig, &mut gizmo, &mut node, 15.5);
        assert_eq!(rig.journal.update_count(), 1);
        let step = Quat::from_rotation_y(15.0_f32.to_radians());
        assert!(rig.local(0).rotation.abs_diff_eq(step, 1e-5));

        // The handle leads; the entity stays on the step.
        turn(&mut rig, &mut gizmo, &mut node, 22.0);
        turn(&mut rig, &mut gizmo, &mut node, 29.0);
        assert_eq!(rig.journal.update_count(), 1);
        turn(&mut rig, &mut gizmo, &mut node, 30.0);
        assert!(rig
            .local(0)
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(30.0_f32.to_radians()), 1e-5));
    }

    #[test]
    fn returning_to_start_restores_initial_transform() {
        let initial = Transform::from_xyz(1.0, 0.0, 0.0).with_rotation(Quat::from_rotation_z(0.3));
        let mut rig = Rig::new(&[initial, Transform::from_xyz(-1.0, 0.0, 0.0)]);
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        turn(&mut rig, &mut gizmo, &mut node, 70.0);
        turn(&mut rig, &mut gizmo, &mut node, 0.0);

        assert!(rig.local(0).translation.abs_diff_eq(initial.translation, 1e-6));
        assert!(rig.local(0).rotation.abs_diff_eq(initial.rotation, 1e-6));
    }

    #[test]
    fn world_aligned_end_resets_node_orientation() {
        let mut rig = Rig::new(&[Transform::from_rotation(Quat::from_rotation_z(1.0))]);
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        turn(&mut rig, &mut gizmo, &mut node, 50.0);
        node.rotation = Quat::from_rotation_y(50.0_f32.to_radians());

        let mut ctx = rig.ctx();
        assert!(gizmo.on_drag_end(&mut ctx, &mut node));
        assert_eq!(node.rotation, Quat::IDENTITY);
        assert!(!gizmo.on_drag_end(&mut ctx, &mut node));
        assert_eq!(node.rotation, Quat::IDENTITY);
    }

    #[test]
    fn local_single_end_follows_entity() {
        let mut rig = Rig::new(&[Transform::IDENTITY]);
        rig.config.alignment = AlignmentMode::Local;
        let mut gizmo = RotationGizmo::new();
        let mut node = Transform::IDENTITY;
        start(&mut rig, &mut gizmo, &mut node);
        turn(&mut rig, &mut gizmo, &mut node, 40.0);

        let mut ctx = rig.ctx();
        gizmo.on_drag_end(&mut ctx, &mut node);
        assert!(node
            .rotation
            .abs_diff_eq(Quat::from_rotation_y(40.0_f32.to_radians()), 1e-5));
    }
}
