//! Owns the four gizmos, forwards selection and drag input to the active one,
//! and relays the end-of-drag commit.

use bevy::prelude::*;

use crate::gizmos::{
    DragStart, DragUpdate, FreeGizmo, GizmoContext, GizmoTransformer, PositionGizmo,
    RotationGizmo, ScaleGizmo,
};
use crate::types::{AlignmentMode, GizmoHandle, GizmoKind};

/// Coordinator for the active gizmo.
///
/// Only one gizmo is attached at a time and at most one drag is open. The
/// gizmo node (its displayed position, orientation and scale) lives here and
/// is kept in sync with the selection whenever no drag is running.
#[derive(Resource, Debug)]
pub struct GizmoController {
    kind: GizmoKind,
    position: PositionGizmo,
    rotation: RotationGizmo,
    scale: ScaleGizmo,
    free: FreeGizmo,
    selection: Vec<Entity>,
    node: Transform,
    handle: Option<GizmoHandle>,
    synced_alignment: Option<AlignmentMode>,
}

impl Default for GizmoController {
    fn default() -> Self {
        Self::new(GizmoKind::default())
    }
}

impl GizmoController {
    /// A controller with `kind` attached and nothing selected.
    pub fn new(kind: GizmoKind) -> Self {
        let mut controller = Self {
            kind,
            position: PositionGizmo::new(),
            rotation: RotationGizmo::new(),
            scale: ScaleGizmo::new(),
            free: FreeGizmo::new(),
            selection: Vec::new(),
            node: Transform::IDENTITY,
            handle: None,
            synced_alignment: None,
        };
        controller.active_mut().setup();
        controller
    }

    /// The attached gizmo kind.
    pub fn kind(&self) -> GizmoKind {
        self.kind
    }

    /// The attached selection.
    pub fn selection(&self) -> &[Entity] {
        &self.selection
    }

    /// The gizmo node's world transform.
    pub fn node(&self) -> Transform {
        self.node
    }

    /// The handle being dragged, if any.
    pub fn active_handle(&self) -> Option<GizmoHandle> {
        self.handle
    }

    /// Whether a drag is open.
    pub fn is_dragging(&self) -> bool {
        self.active().is_dragging()
    }

    /// Alignment the node was last synced to.
    pub fn synced_alignment(&self) -> Option<AlignmentMode> {
        self.synced_alignment
    }

    /// Locks scale drags to a uniform ratio.
    pub fn set_proportional_scaling(&mut self, proportional: bool) {
        self.scale.set_proportional(proportional);
    }

    /// The attached gizmo.
    pub fn active(&self) -> &dyn GizmoTransformer {
        match self.kind {
            GizmoKind::Position => &self.position,
            GizmoKind::Rotation => &self.rotation,
            GizmoKind::Scale => &self.scale,
            GizmoKind::Free => &self.free,
        }
    }

    fn active_mut(&mut self) -> &mut dyn GizmoTransformer {
        match self.kind {
            GizmoKind::Position => &mut self.position,
            GizmoKind::Rotation => &mut self.rotation,
            GizmoKind::Scale => &mut self.scale,
            GizmoKind::Free => &mut self.free,
        }
    }

    /// Swaps the attached gizmo. An open drag is ended and committed first.
    pub fn set_gizmo_kind(&mut self, ctx: &mut GizmoContext, kind: GizmoKind) {
        if kind == self.kind {
            return;
        }
        self.end_drag(ctx);
        self.active_mut().cleanup();
        self.kind = kind;
        let selection = self.selection.clone();
        let gizmo = self.active_mut();
        gizmo.setup();
        gizmo.set_entities(&selection);
        self.refresh(ctx);
        debug!("Gizmo switched to {kind}");
    }

    /// Attaches a new selection. An open drag is ended and committed first.
    pub fn set_selection(&mut self, ctx: &mut GizmoContext, entities: &[Entity]) {
        if entities == self.selection.as_slice() {
            return;
        }
        self.end_drag(ctx);
        self.selection = entities.to_vec();
        self.active_mut().set_entities(entities);
        self.refresh(ctx);
    }

    /// Starts a drag on `start.handle`. Returns `false` when a drag is already
    /// open or the gizmo cannot drag the selection with that handle.
    pub fn begin_drag(&mut self, ctx: &mut GizmoContext, start: DragStart) -> bool {
        if self.is_dragging() || self.selection.is_empty() {
            return false;
        }
        self.refresh(ctx);
        let mut node = self.node;
        let started = self.active_mut().on_drag_start(ctx, &mut node, &start);
        self.node = node;
        if started {
            self.handle = Some(start.handle);
        }
        started
    }

    /// Feeds one pointer move to the open drag.
    pub fn drag(&mut self, ctx: &mut GizmoContext, update: DragUpdate) {
        if !self.is_dragging() {
            return;
        }
        if let DragUpdate::Handle(target) = update {
            self.node = target;
        }
        let mut node = self.node;
        self.active_mut().update(ctx, &mut node, &update);
        self.node = node;
    }

    /// Ends the open drag and commits its writes once.
    ///
    /// Safe to call repeatedly; returns `true` only for the call that closed
    /// a session.
    pub fn end_drag(&mut self, ctx: &mut GizmoContext) -> bool {
        self.handle = None;
        let mut node = self.node;
        let closed = self.active_mut().on_drag_end(ctx, &mut node);
        self.node = node;
        if closed {
            ctx.dispatcher.commit();
            debug!("{} drag committed", self.kind);
        }
        self.refresh(ctx);
        closed
    }

    /// Re-derives the idle node from the selection and current alignment.
    ///
    /// Does nothing while dragging.
    pub fn refresh(&mut self, ctx: &mut GizmoContext) {
        if self.is_dragging() {
            return;
        }
        let mut node = self.node;
        self.active().align_node(&*ctx.store, ctx.config, &mut node);
        self.node = node;
        self.synced_alignment = Some(ctx.config.alignment);
    }
}
