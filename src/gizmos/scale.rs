use bevy::prelude::*;

use super::{aligned_rotation, recenter, DragStart, DragUpdate, GizmoContext, GizmoTransformer};
use crate::math::EPSILON;
use crate::session::DragSession;
use crate::snap::snap_scale;
use crate::store::EntityStore;
use crate::types::{GizmoAxis, GizmoConfig, GizmoHandle, GizmoKind};

/// Scales the selection in entity-local axes while spreading or gathering
/// entity positions around the shared pivot.
#[derive(Debug, Default)]
pub struct ScaleGizmo {
    entities: Vec<Entity>,
    session: Option<DragSession>,
    proportional: bool,
}

impl ScaleGizmo {
    /// A detached scale gizmo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Locks every drag to a uniform ratio.
    pub fn set_proportional(&mut self, proportional: bool) {
        self.proportional = proportional;
    }

    /// Whether drags are locked to a uniform ratio.
    pub fn is_proportional(&self) -> bool {
        self.proportional
    }

    /// The open drag session, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }
}

/// Componentwise `current / initial`, reading 1 where the baseline is zero.
fn raw_ratio(current: Vec3, initial: Vec3) -> Vec3 {
    let component = |c: f32, i: f32| if i.abs() > EPSILON { c / i } else { 1.0 };
    Vec3::new(
        component(current.x, initial.x),
        component(current.y, initial.y),
        component(current.z, initial.z),
    )
}

/// Collapses a ratio to the component that moved furthest from 1.
fn uniform_ratio(ratio: Vec3) -> Vec3 {
    let d = (ratio - Vec3::ONE).abs();
    let pick = if d.x >= d.y && d.x >= d.z {
        ratio.x
    } else if d.y >= d.z {
        ratio.y
    } else {
        ratio.z
    };
    Vec3::splat(pick)
}

fn with_plane_factor(plane: GizmoAxis, factor: f32) -> Vec3 {
    let mut ratio = Vec3::ONE;
    let (a, b) = plane.plane_axes();
    for axis in [a, b] {
        match axis {
            GizmoAxis::X => ratio.x = factor,
            GizmoAxis::Y => ratio.y = factor,
            GizmoAxis::Z => ratio.z = factor,
        }
    }
    ratio
}

fn scale_selection(ctx: &mut GizmoContext, session: &DragSession, ratio: Vec3) {
    let snap = ctx.config.snap;
    for (entity, snapshot) in session.iter() {
        let position = session.pivot + snapshot.offset * ratio;
        let mut local = snapshot.local;
        local.scale = snapshot.local.scale * ratio;
        if snap.enabled {
            local.scale = snap_scale(local.scale, snap.scale_step).value;
        }
        ctx.place(entity, local, Some(position), None);
    }
}

impl GizmoTransformer for ScaleGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Scale
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
        if self.session.is_some() || start.handle == GizmoHandle::Center {
            return false;
        }
        let Some(mut session) = DragSession::begin(&*ctx.store, &self.entities, None) else {
            return false;
        };
        node.translation = session.pivot;
        session.initial_gizmo_scale = node.scale;
        debug!(
            "Scale drag started on {:?} with {} entities",
            start.handle,
            session.len()
        );
        self.session = Some(session);
        true
    }

    fn update(&mut self, ctx: &mut GizmoContext, node: &mut Transform, update: &DragUpdate) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        let sensitivity = ctx.config.scale_sensitivity;
        let ratio = match *update {
            DragUpdate::Handle(target) => {
                let raw = raw_ratio(target.scale, session.initial_gizmo_scale);
                Vec3::ONE + (raw - Vec3::ONE) * sensitivity
            }
            DragUpdate::PlanarScale {
                plane,
                screen_delta,
            } => {
                let pixels = ctx.config.planar_scale_pixels.max(EPSILON);
                let factor = 1.0 + (screen_delta.x + screen_delta.y) / pixels * sensitivity;
                node.scale = session.initial_gizmo_scale * with_plane_factor(plane, factor);
                with_plane_factor(plane, factor)
            }
            DragUpdate::Pointer(_) => {
                debug!("Scale gizmo ignored a pointer update");
                return;
            }
        };
        let ratio = if self.proportional {
            uniform_ratio(ratio)
        } else {
            ratio
        };
        scale_selection(ctx, session, ratio);
    }

    fn on_drag_end(&mut self, _ctx: &mut GizmoContext, node: &mut Transform) -> bool {
        node.scale = Vec3::ONE;
        self.session.take().is_some()
    }

    fn cleanup(&mut self) {
        self.session = None;
        self.entities.clear();
    }

    fn is_dragging(&self) -> bool {
        self.session.is_some()
    }

    fn align_node(&self, store: &dyn EntityStore, _config: &GizmoConfig, node: &mut Transform) {
        recenter(store, &self.entities, node);
        node.rotation = aligned_rotation(store, &self.entities, true);
        node.scale = Vec3::ONE;
    }
}
