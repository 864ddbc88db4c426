use bevy::math::Ray3d;
use bevy::prelude::*;

use super::{recenter, DragStart, DragUpdate, GizmoContext, GizmoTransformer};
use crate::math::ray_horizontal_plane;
use crate::session::DragSession;
use crate::snap::{snap_vec3_xz, translation_gate};
use crate::store::EntityStore;
use crate::types::{GizmoConfig, GizmoHandle, GizmoKind};

/// Ground-plane drag state: where the pointer is on the plane and where the
/// gizmo node started.
#[derive(Debug, Clone, Copy)]
pub(crate) struct PlanarDrag {
    node_origin: Vec3,
    point: Vec3,
}

impl PlanarDrag {
    /// Opens a session pivoted on the picked scene point, or on the selection
    /// centroid when the pick misses.
    pub(crate) fn begin(
        ctx: &GizmoContext,
        entities: &[Entity],
        ray: Option<&Ray3d>,
        node: &Transform,
    ) -> Option<(DragSession, Self)> {
        let picked = ray.and_then(|ray| ctx.picker.pick_point(ray));
        if picked.is_none() {
            debug!("Ground drag pick missed, pivoting on the selection centroid");
        }
        let session = DragSession::begin(&*ctx.store, entities, picked)?;
        let drag = Self {
            node_origin: node.translation,
            point: session.pivot,
        };
        Some((session, drag))
    }

    /// Follows `ray` across the drag plane. Y never changes.
    pub(crate) fn update(
        &mut self,
        ctx: &mut GizmoContext,
        session: &mut DragSession,
        node: &mut Transform,
        ray: &Ray3d,
    ) {
        let Some(hit) = ray_horizontal_plane(ray, session.plane_height) else {
            return;
        };
        let mut delta = hit - self.point;
        delta.y = 0.0;
        self.point += delta;

        let snap = ctx.config.snap;
        let target = if snap.enabled {
            if !translation_gate(&snap, self.point, session.last_snapped_pivot) {
                return;
            }
            let snapped = snap_vec3_xz(self.point, snap.translation_step).value;
            session.last_snapped_pivot = Some(snapped);
            snapped
        } else {
            self.point
        };

        node.translation = self.node_origin + (target - session.pivot);
        for (entity, snapshot) in session.iter() {
            ctx.place(entity, snapshot.local, Some(target + snapshot.offset), None);
        }
    }
}

/// Drags the selection over a horizontal plane without axis handles.
#[derive(Debug, Default)]
pub struct FreeGizmo {
    entities: Vec<Entity>,
    session: Option<DragSession>,
    ground: Option<PlanarDrag>,
}

impl FreeGizmo {
    /// A detached free gizmo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open drag session, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }
}

impl GizmoTransformer for FreeGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Free
    }

    fn setup(&mut self) {
        self.session = None;
        self.ground = None;
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
        if self.session.is_some() || start.handle != GizmoHandle::Center {
            return false;
        }
        let Some((session, ground)) =
            PlanarDrag::begin(ctx, &self.entities, start.ray.as_ref(), node)
        else {
            return false;
        };
        debug!(
            "Free drag started at {} over {} entities",
            session.pivot,
            session.len()
        );
        self.session = Some(session);
        self.ground = Some(ground);
        true
    }

    fn update(&mut self, ctx: &mut GizmoContext, node: &mut Transform, update: &DragUpdate) {
        let (Some(session), Some(ground)) = (self.session.as_mut(), self.ground.as_mut()) else {
            return;
        };
        match update {
            DragUpdate::Pointer(ray) => ground.update(ctx, session, node, ray),
            _ => debug!("Free gizmo ignored {update:?}"),
        }
    }

    fn on_drag_end(&mut self, ctx: &mut GizmoContext, node: &mut Transform) -> bool {
        self.ground = None;
        let Some(session) = self.session.take() else {
            return false;
        };
        recenter(&*ctx.store, session.entities(), node);
        true
    }

    fn cleanup(&mut self) {
        self.session = None;
        self.ground = None;
        self.entities.clear();
    }

    fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    fn align_node(&self, store: &dyn EntityStore, _config: &GizmoConfig, node: &mut Transform) {
        recenter(store, &self.entities, node);
        node.rotation = Quat::IDENTITY;
        node.scale = Vec3::ONE;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gizmos::test_support::Rig;
    use crate::store::{SceneGraph, TransformJournal};
    use crate::types::GizmoConfig;

    fn down_at(x: f32, z: f32) -> Ray3d {
        Ray3d::new(Vec3::new(x, 10.0, z), Dir3::NEG_Y)
    }

    #[test]
    fn picked_point_pivots_and_height_is_preserved() {
        let mut rig = Rig::new(&[
            Transform::from_xyz(0.0, 1.0, 0.0),
            Transform::from_xyz(2.0, 3.0, 0.0),
        ]);
        let picker = |ray: &Ray3d| Some(Vec3::new(ray.origin.x, 1.0, ray.origin.z));
        let mut gizmo = FreeGizmo::new();
        gizmo.set_entities(&rig.ids);
        let mut node = Transform::from_xyz(1.0, 2.0, 0.0);

        let Rig { graph, journal, config, .. } = &mut rig;
        let mut ctx = GizmoContext::new(graph, journal, &picker, config);
        let start = DragStart::with_ray(GizmoHandle::Center, down_at(0.0, 0.0));
        assert!(gizmo.on_drag_start(&mut ctx, &mut node, &start));
        assert_eq!(gizmo.session().unwrap().pivot, Vec3::new(0.0, 1.0, 0.0));

        gizmo.update(&mut ctx, &mut node, &DragUpdate::Pointer(down_at(3.0, -1.0)));
        assert!(node.translation.abs_diff_eq(Vec3::new(4.0, 2.0, -1.0), 1e-5));
        assert!(gizmo.on_drag_end(&mut ctx, &mut node));

        assert!(rig.local(0).translation.abs_diff_eq(Vec3::new(3.0, 1.0, -1.0), 1e-5));
        assert!(rig.local(1).translation.abs_diff_eq(Vec3::new(5.0, 3.0, -1.0), 1e-5));
    }

    #[test]
    fn pick_miss_falls_back_to_centroid() {
        let mut rig = Rig::new(&[
            Transform::from_xyz(0.0, 0.0, 0.0),
            Transform::from_xyz(2.0, 2.0, 0.0),
        ]);
        let mut gizmo = FreeGizmo::new();
        gizmo.set_entities(&rig.ids.clone());
        let mut node = Transform::IDENTITY;
        let mut ctx = rig.ctx();
        let start = DragStart::with_ray(GizmoHandle::Center, down_at(5.0, 5.0));
        assert!(gizmo.on_drag_start(&mut ctx, &mut node, &start));
        let session = gizmo.session().unwrap();
        assert!(session.pivot.abs_diff_eq(Vec3::new(1.0, 1.0, 0.0), 1e-6));
        assert_eq!(session.plane_height, 1.0);
    }

    #[test]
    fn snapping_waits_for_a_full_step() {
        let mut world = World::new();
        let id = world.spawn_empty().id();
        let mut graph = SceneGraph::new();
        graph.insert(id, Transform::IDENTITY);
        let mut journal = TransformJournal::default();
        let mut config = GizmoConfig::default();
        config.snap.enabled = true;
        config.snap.translation_step = 1.0;

        let picker = |_: &Ray3d| Some(Vec3::ZERO);
        let mut gizmo = FreeGizmo::new();
        gizmo.set_entities(&[id]);
        let mut node = Transform::IDENTITY;
        let mut ctx = GizmoContext::new(&mut graph, &mut journal, &picker, &config);
        assert!(gizmo.on_drag_start(&mut ctx, &mut node, &DragStart::with_ray(GizmoHandle::Center, down_at(0.0, 0.0))));

        gizmo.update(&mut ctx, &mut node, &DragUpdate::Pointer(down_at(0.4, 0.0)));
        gizmo.update(&mut ctx, &mut node, &DragUpdate::Pointer(down_at(0.8, 0.0)));
        assert!(gizmo.on_drag_end(&mut ctx, &mut node));
        assert_eq!(journal.update_count(), 0);

        let mut ctx = GizmoContext::new(&mut graph, &mut journal, &picker, &config);
        assert!(gizmo.on_drag_start(&mut ctx, &mut node, &DragStart::with_ray(GizmoHandle::Center, down_at(0.0, 0.0))));
        gizmo.update(&mut ctx, &mut node, &DragUpdate::Pointer(down_at(1.2, 0.0)));
        assert!(gizmo.on_drag_end(&mut ctx, &mut node));
        assert_eq!(graph.local_transform(id).unwrap().translation, Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn only_the_centre_handle_starts_a_free_drag() {
        let mut rig = Rig::new(&[Transform::IDENTITY]);
        let mut gizmo = FreeGizmo::new();
        gizmo.set_entities(&rig.ids.clone());
        let mut node = Transform::IDENTITY;
        let mut ctx = rig.ctx();
        let start = DragStart::handle(GizmoHandle::Axis(crate::types::GizmoAxis::X));
        assert!(!gizmo.on_drag_start(&mut ctx, &mut node, &start));
    }
}
