use bevy::prelude::*;

use super::free::PlanarDrag;
use super::{aligned_rotation, recenter, DragStart, DragUpdate, GizmoContext, GizmoTransformer};
use crate::session::DragSession;
use crate::snap::snap_vec3;
use crate::store::EntityStore;
use crate::types::{AlignmentMode, GizmoConfig, GizmoHandle, GizmoKind};

/// Translates the selection rigidly along an axis, across a plane, or over
/// the ground when the centre disc is grabbed.
#[derive(Debug, Default)]
pub struct PositionGizmo {
    entities: Vec<Entity>,
    session: Option<DragSession>,
    ground: Option<PlanarDrag>,
}

impl PositionGizmo {
    /// A detached position gizmo.
    pub fn new() -> Self {
        Self::default()
    }

    /// The open drag session, if any.
    pub fn session(&self) -> Option<&DragSession> {
        self.session.as_ref()
    }
}

/// Moves every snapshot by `gizmo_position - pivot`, snapping the combined
/// world position rather than the delta.
pub(crate) fn translate_selection(
    ctx: &mut GizmoContext,
    session: &DragSession,
    gizmo_position: Vec3,
) {
    let delta = gizmo_position - session.pivot;
    let snap = ctx.config.snap;
    for (entity, snapshot) in session.iter() {
        let mut candidate = session.pivot + delta + snapshot.offset;
        if snap.enabled {
            candidate = snap_vec3(candidate, snap.translation_step).value;
        }
        ctx.place(entity, snapshot.local, Some(candidate), None);
    }
}

impl GizmoTransformer for PositionGizmo {
    fn kind(&self) -> GizmoKind {
        GizmoKind::Position
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
        if self.session.is_some() {
            return false;
        }
        match start.handle {
            GizmoHandle::Center => {
                let Some((session, ground)) =
                    PlanarDrag::begin(ctx, &self.entities, start.ray.as_ref(), node)
                else {
                    return false;
                };
                self.session = Some(session);
                self.ground = Some(ground);
            }
            GizmoHandle::Axis(_) | GizmoHandle::Plane(_) => {
                let Some(session) = DragSession::begin(&*ctx.store, &self.entities, None) else {
                    return false;
                };
                node.translation = session.pivot;
                self.session = Some(session);
            }
            GizmoHandle::Uniform => return false,
        }
        debug!(
            "Position drag started on {:?} with {} entities",
            start.handle,
            self.entities.len()
        );
        true
    }

    fn update(&mut self, ctx: &mut GizmoContext, node: &mut Transform, update: &DragUpdate) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        match (update, self.ground.as_mut()) {
            (DragUpdate::Pointer(ray), Some(ground)) => ground.update(ctx, session, node, ray),
            (DragUpdate::Handle(target), None) => {
                translate_selection(ctx, session, target.translation);
            }
            _ => debug!("Position gizmo ignored {update:?}"),
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

    fn align_node(&self, store: &dyn EntityStore, config: &GizmoConfig, node: &mut Transform) {
        recenter(store, &self.entities, node);
        node.rotation = aligned_rotation(store, &self.entities, config.alignment == AlignmentMode::Local);
        node.scale = Vec3::ONE;
    }
}
