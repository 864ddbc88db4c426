//! Bevy systems wiring pointer input to the gizmo controller.
//!
//! [`sample_pointer`] turns the window cursor into a world ray,
//! [`drive_gizmo`] runs hover, drag start, drag and drag end against the ECS
//! world, and [`draw_gizmo`] renders the handles.

use bevy::gizmos::config::{DefaultGizmoConfigGroup, GizmoConfigStore};
use bevy::input::mouse::MouseButton;
use bevy::input::ButtonInput;
use bevy::math::Ray3d;
use bevy::prelude::*;
use bevy::window::PrimaryWindow;

use crate::controller::GizmoController;
use crate::draw::{draw_handles, HandleView};
use crate::gizmos::{DragStart, GizmoContext};
use crate::handles::{hit_test, HandleDrag};
use crate::math::ray_sphere_intersection;
use crate::store::{EntityStore, GizmoSelection, ScenePicker, SelectionProvider, TransformJournal};
use crate::types::{GizmoCamera, GizmoConfig, GizmoHandle, GizmoKind, GizmoMode, GizmoStyle};

/// Pointer state sampled once per frame.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct GizmoPointer {
    /// World ray under the cursor, when the cursor is over the window.
    pub ray: Option<Ray3d>,
    /// Cursor position in window pixels, y down.
    pub cursor: Vec2,
    /// Camera forward direction.
    pub forward: Vec3,
    /// Camera right direction.
    pub right: Vec3,
    /// Camera up direction.
    pub up: Vec3,
    /// Primary button held.
    pub pressed: bool,
    /// Primary button went down this frame.
    pub just_pressed: bool,
}

/// Handle hover and the pointer tracking of the running drag.
#[derive(Resource, Debug, Default)]
pub struct GizmoInput {
    /// Handle under the pointer while idle.
    pub hovered: Option<GizmoHandle>,
    drag: Option<HandleDrag>,
}

impl GizmoInput {
    /// The tracked drag, if a handle is held.
    pub fn drag(&self) -> Option<&HandleDrag> {
        self.drag.as_ref()
    }
}

/// [`EntityStore`] over the ECS world: local `Transform` components and the
/// `ChildOf` hierarchy.
pub struct WorldEntityStore<'w> {
    world: &'w mut World,
}

impl<'w> WorldEntityStore<'w> {
    /// Wraps `world` for the duration of one borrow.
    pub fn new(world: &'w mut World) -> Self {
        Self { world }
    }
}

impl EntityStore for WorldEntityStore<'_> {
    fn local_transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<Transform>(entity).copied()
    }

    fn set_local_transform(&mut self, entity: Entity, transform: Transform) {
        if let Some(mut current) = self.world.get_mut::<Transform>(entity) {
            *current = transform;
        }
    }

    fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<ChildOf>(entity).map(ChildOf::parent)
    }
}

/// Picks the nearest point on a sphere of `radius` around each selected
/// entity. Stands in for mesh picking when a ground drag starts.
struct SelectionPicker {
    centers: Vec<Vec3>,
    radius: f32,
}

impl ScenePicker for SelectionPicker {
    fn pick_point(&self, ray: &Ray3d) -> Option<Vec3> {
        self.centers
            .iter()
            .filter_map(|center| ray_sphere_intersection(ray, *center, self.radius))
            .min_by(f32::total_cmp)
            .map(|t| ray.get_point(t))
    }
}

/// Configure Bevy's built-in gizmo renderer using our style resource.
pub fn configure_gizmos(mut config_store: ResMut<GizmoConfigStore>, style: Res<GizmoStyle>) {
    let (config, _) = config_store.config_mut::<DefaultGizmoConfigGroup>();
    config.line.width = style.line_width;
    config.depth_bias = style.depth_bias;
}

/// Samples the primary button and the cursor ray of the first gizmo camera.
pub fn sample_pointer(
    mut pointer: ResMut<GizmoPointer>,
    buttons: Res<ButtonInput<MouseButton>>,
    cameras: Query<(&Camera, &GlobalTransform), With<GizmoCamera>>,
    windows: Query<&Window, With<PrimaryWindow>>,
) {
    pointer.pressed = buttons.pressed(MouseButton::Left);
    pointer.just_pressed = buttons.just_pressed(MouseButton::Left);
    pointer.ray = None;

    let Some((camera, camera_transform)) = cameras.iter().next() else {
        return;
    };
    pointer.forward = *camera_transform.forward();
    pointer.right = *camera_transform.right();
    pointer.up = *camera_transform.up();

    let Some(window) = windows.iter().next() else {
        return;
    };
    let Some(cursor) = window.cursor_position() else {
        return;
    };
    pointer.cursor = cursor;
    pointer.ray = camera.viewport_to_world(camera_transform, cursor).ok();
}

/// Runs the gizmo for one frame against the ECS world.
///
/// Exclusive so the engine can read parent chains and write `Transform`s of
/// arbitrary entities while it holds the controller.
pub fn drive_gizmo(world: &mut World) {
    if !world.contains_resource::<GizmoController>()
        || !world.contains_resource::<TransformJournal>()
        || !world.contains_resource::<GizmoInput>()
    {
        return;
    }
    let pointer = world.get_resource::<GizmoPointer>().copied().unwrap_or_default();
    let config = world.get_resource::<GizmoConfig>().cloned().unwrap_or_default();
    let style = world.get_resource::<GizmoStyle>().cloned().unwrap_or_default();
    let mode = world.get_resource::<GizmoMode>().copied().unwrap_or_default();
    let selection: Vec<Entity> = world
        .get_resource::<GizmoSelection>()
        .map(|selection| selection.selected_entities().to_vec())
        .unwrap_or_default();

    let picker = {
        let store = WorldEntityStore::new(world);
        SelectionPicker {
            centers: selection
                .iter()
                .filter(|entity| store.local_transform(**entity).is_some())
                .map(|entity| store.world_position(*entity))
                .collect(),
            radius: style.pick_radius,
        }
    };

    world.resource_scope(|world, mut controller: Mut<GizmoController>| {
        world.resource_scope(|world, mut journal: Mut<TransformJournal>| {
            world.resource_scope(|world, mut input: Mut<GizmoInput>| {
                let mut store = WorldEntityStore::new(world);
                let mut ctx = GizmoContext::new(&mut store, &mut *journal, &picker, &config);
                step(
                    &mut controller,
                    &mut input,
                    &mut ctx,
                    &Frame {
                        pointer: &pointer,
                        selection: &selection,
                        mode,
                        style: &style,
                    },
                );
            });
        });
    });
}

/// Per-frame inputs to [`step`].
struct Frame<'a> {
    pointer: &'a GizmoPointer,
    selection: &'a [Entity],
    mode: GizmoMode,
    style: &'a GizmoStyle,
}

fn step(
    controller: &mut GizmoController,
    input: &mut GizmoInput,
    ctx: &mut GizmoContext,
    frame: &Frame,
) {
    controller.set_proportional_scaling(frame.mode.proportional_scaling);
    controller.set_selection(ctx, frame.selection);
    controller.set_gizmo_kind(ctx, frame.mode.kind);
    if !controller.is_dragging() {
        input.drag = None;
    }

    let pointer = frame.pointer;
    if !pointer.pressed && input.drag.take().is_some() {
        controller.end_drag(ctx);
    }

    if let Some(drag) = input.drag.as_mut() {
        let Some(ray) = pointer.ray else {
            return;
        };
        if let Some(update) = drag.drag(&ray, pointer.cursor) {
            controller.drag(ctx, update);
        }
        return;
    }

    controller.refresh(ctx);
    input.hovered = hover(controller, ctx, frame);

    if !pointer.just_pressed {
        return;
    }
    let (Some(handle), Some(ray)) = (input.hovered, pointer.ray) else {
        return;
    };
    if controller.begin_drag(ctx, DragStart::with_ray(handle, ray)) {
        input.drag = Some(HandleDrag::begin(
            controller.kind(),
            handle,
            &controller.node(),
            &ray,
            pointer.forward,
            pointer.cursor,
            frame.style,
        ));
    }
}

/// Handle under the pointer. The free gizmo can also be grabbed by the
/// selected entities themselves.
fn hover(controller: &GizmoController, ctx: &GizmoContext, frame: &Frame) -> Option<GizmoHandle> {
    if controller.selection().is_empty() {
        return None;
    }
    let ray = frame.pointer.ray?;
    let kind = controller.kind();
    hit_test(&controller.node(), kind, frame.style, &ray).or_else(|| {
        (kind == GizmoKind::Free && ctx.picker.pick_point(&ray).is_some())
            .then_some(GizmoHandle::Center)
    })
}

/// Draws the active gizmo around the selection.
pub fn draw_gizmo(
    controller: Res<GizmoController>,
    input: Res<GizmoInput>,
    pointer: Res<GizmoPointer>,
    style: Res<GizmoStyle>,
    mut gizmos: Gizmos,
) {
    if controller.selection().is_empty() {
        return;
    }
    let view = HandleView {
        node: controller.node(),
        kind: controller.kind(),
        hovered: input.hovered,
        active: controller.active_handle(),
        camera_right: pointer.right,
        camera_up: pointer.up,
    };
    draw_handles(&mut gizmos, &view, &style);
}
