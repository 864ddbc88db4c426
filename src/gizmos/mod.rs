//! The four transformers and the lifecycle they share.
//!
//! Every transformer is pure: it reads and writes transforms through a
//! [`GizmoContext`] and never touches windowing, rendering or the ECS
//! schedule. The controller feeds it [`DragStart`] and [`DragUpdate`] values
//! produced by the handle layer.

mod free;
mod position;
mod rotation;
mod scale;

pub use free::FreeGizmo;
pub use position::PositionGizmo;
pub use rotation::RotationGizmo;
pub use scale::ScaleGizmo;

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::frame::FrameConverter;
use crate::math::sanitize_rotation;
use crate::pivot::centroid;
use crate::store::{EntityStore, ScenePicker, TransformDispatcher};
use crate::types::{GizmoConfig, GizmoHandle, GizmoKind};

/// Collaborators handed to a transformer for one call.
pub struct GizmoContext<'a> {
    /// Transform storage.
    pub store: &'a mut dyn EntityStore,
    /// Receiver of live updates and the end-of-drag commit.
    pub dispatcher: &'a mut dyn TransformDispatcher,
    /// Scene ray caster, used to pick ground-drag pivots.
    pub picker: &'a dyn ScenePicker,
    /// Snap and alignment settings as of this call.
    pub config: &'a GizmoConfig,
}

impl<'a> GizmoContext<'a> {
    /// Bundles the collaborators for one call.
    pub fn new(
        store: &'a mut dyn EntityStore,
        dispatcher: &'a mut dyn TransformDispatcher,
        picker: &'a dyn ScenePicker,
        config: &'a GizmoConfig,
    ) -> Self {
        Self {
            store,
            dispatcher,
            picker,
            config,
        }
    }

    /// Writes a local transform to the store and reports it to the dispatcher.
    pub(crate) fn write_local(&mut self, entity: Entity, mut transform: Transform) {
        transform.rotation = sanitize_rotation(transform.rotation);
        self.store.set_local_transform(entity, transform);
        self.dispatcher.update_entity_transform(entity, transform);
    }

    /// Writes `base` with the given world position and rotation converted
    /// into the entity's current parent space.
    pub(crate) fn place(
        &mut self,
        entity: Entity,
        base: Transform,
        world_position: Option<Vec3>,
        world_rotation: Option<Quat>,
    ) {
        let converter = FrameConverter::resolve_or_root(&*self.store, entity);
        let mut transform = base;
        if let Some(position) = world_position {
            transform.translation = converter.to_local_position(position);
        }
        if let Some(rotation) = world_rotation {
            transform.rotation = converter.to_local_rotation(rotation);
        }
        self.write_local(entity, transform);
    }
}

/// How a drag begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragStart {
    /// The grabbed handle.
    pub handle: GizmoHandle,
    /// Pointer ray at pointer-down, used for ground-drag picking.
    pub ray: Option<Ray3d>,
}

impl DragStart {
    /// A drag on `handle` without pointer information.
    pub fn handle(handle: GizmoHandle) -> Self {
        Self { handle, ray: None }
    }

    /// A drag on `handle` that started under `ray`.
    pub fn with_ray(handle: GizmoHandle, ray: Ray3d) -> Self {
        Self {
            handle,
            ray: Some(ray),
        }
    }
}

/// One pointer-move worth of input.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DragUpdate {
    /// The handle layer moved the gizmo node to this world transform.
    Handle(Transform),
    /// The pointer ray, for ground-plane drags.
    Pointer(Ray3d),
    /// A planar scale handle moved `screen_delta` pixels (x right, y up)
    /// since the drag started.
    PlanarScale {
        /// Normal axis of the dragged plane.
        plane: crate::types::GizmoAxis,
        /// Pointer displacement since drag start.
        screen_delta: Vec2,
    },
}

/// Lifecycle shared by the position, rotation, scale and free gizmos.
///
/// `on_drag_end` and `cleanup` are safe to call at any time, including
/// without an active session.
pub trait GizmoTransformer {
    /// Which gizmo this is.
    fn kind(&self) -> GizmoKind;

    /// Prepares the gizmo for attachment, dropping any stale session.
    fn setup(&mut self);

    /// Replaces the attached selection.
    fn set_entities(&mut self, entities: &[Entity]);

    /// Attached selection in selection order.
    fn entities(&self) -> &[Entity];

    /// Starts a drag session. Returns `false` when nothing can be dragged
    /// with this handle.
    fn on_drag_start(
        &mut self,
        ctx: &mut GizmoContext,
        node: &mut Transform,
        start: &DragStart,
    ) -> bool;

    /// Applies one drag update to the selection.
    fn update(&mut self, ctx: &mut GizmoContext, node: &mut Transform, update: &DragUpdate);

    /// Ends the session. Returns `true` when a session was closed and its
    /// writes need committing.
    fn on_drag_end(&mut self, ctx: &mut GizmoContext, node: &mut Transform) -> bool;

    /// Detaches the gizmo: drops the session and the selection.
    fn cleanup(&mut self);

    /// Whether a drag session is open.
    fn is_dragging(&self) -> bool;

    /// Places and orients the idle gizmo node for the attached selection.
    fn align_node(&self, store: &dyn EntityStore, config: &GizmoConfig, node: &mut Transform);
}

/// Node orientation: a single selection in local mode follows the entity,
/// everything else is world-aligned.
pub(crate) fn aligned_rotation(store: &dyn EntityStore, entities: &[Entity], local: bool) -> Quat {
    match entities {
        [single] if local && store.local_transform(*single).is_some() => {
            store.world_rotation(*single)
        }
        _ => Quat::IDENTITY,
    }
}

/// Moves the node onto the selection centroid, if the selection resolves.
pub(crate) fn recenter(store: &dyn EntityStore, entities: &[Entity], node: &mut Transform) {
    if let Some(center) = centroid(store, entities) {
        node.translation = center;
    }
}
