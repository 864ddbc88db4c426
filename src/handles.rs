//! Handle picking and pointer tracking.
//!
//! [`hit_test`] finds the handle under a pointer ray. [`HandleDrag`] follows
//! the pointer once a handle is grabbed and turns every move into a
//! [`DragUpdate`] for the controller.

use bevy::math::Ray3d;
use bevy::prelude::*;

use crate::gizmo_frame::GizmoFrame;
use crate::gizmos::DragUpdate;
use crate::math::{ray_plane_intersection, ray_sphere_intersection, wrap_angle, EPSILON};
use crate::types::{GizmoAxis, GizmoHandle, GizmoKind, GizmoStyle};

/// Lower bound on a scale handle ratio, so a drag past the origin never
/// flips or collapses the selection.
const MIN_SCALE_RATIO: f32 = 0.01;

/// Minimum divisor to prevent division by zero in scale calculations.
const MIN_SCALE_DIVISOR: f32 = 1e-3;

/// Nearest handle found so far along the ray.
#[derive(Default)]
struct Nearest {
    best: Option<(GizmoHandle, f32)>,
}

impl Nearest {
    fn offer(&mut self, handle: GizmoHandle, t: Option<f32>) {
        let Some(t) = t else {
            return;
        };
        if self.best.is_none_or(|(_, best)| t < best) {
            self.best = Some((handle, t));
        }
    }
}

fn cone_center(frame: &GizmoFrame, style: &GizmoStyle, axis: GizmoAxis) -> Vec3 {
    frame.origin + frame.axis(axis) * (style.axis_length + style.cone_length * 0.5)
}

fn cube_center(frame: &GizmoFrame, style: &GizmoStyle, axis: GizmoAxis) -> Vec3 {
    frame.origin + frame.axis(axis) * (style.axis_length * style.cube_offset)
}

/// Distance along `ray` to the planar handle square of `normal`.
fn plane_hit(frame: &GizmoFrame, style: &GizmoStyle, ray: &Ray3d, normal: GizmoAxis) -> Option<f32> {
    let hit = ray_plane_intersection(ray, frame.origin, frame.axis(normal))?;
    let uv = frame.plane_coords(normal, hit);
    let lo = style.plane_offset - style.plane_hit_padding;
    let hi = style.plane_offset + style.plane_size + style.plane_hit_padding;
    let inside = uv.x >= lo && uv.x <= hi && uv.y >= lo && uv.y <= hi;
    inside.then(|| (hit - ray.origin).dot(*ray.direction))
}

/// Distance along `ray` to the rotation ring around `axis`.
fn ring_hit(frame: &GizmoFrame, style: &GizmoStyle, ray: &Ray3d, axis: GizmoAxis) -> Option<f32> {
    let hit = ray_plane_intersection(ray, frame.origin, frame.axis(axis))?;
    let radius = (hit - frame.origin).length();
    ((radius - style.axis_length).abs() <= style.ring_hit_thickness)
        .then(|| (hit - ray.origin).dot(*ray.direction))
}

/// The handle of a `kind` gizmo placed at `node` that `ray` hits first.
pub fn hit_test(
    node: &Transform,
    kind: GizmoKind,
    style: &GizmoStyle,
    ray: &Ray3d,
) -> Option<GizmoHandle> {
    let frame = GizmoFrame::from_node(node);
    let mut nearest = Nearest::default();

    match kind {
        GizmoKind::Position => {
            for axis in GizmoAxis::ALL {
                let center = cone_center(&frame, style, axis);
                nearest.offer(
                    GizmoHandle::Axis(axis),
                    ray_sphere_intersection(ray, center, style.cone_hit_radius),
                );
                nearest.offer(GizmoHandle::Plane(axis), plane_hit(&frame, style, ray, axis));
            }
            nearest.offer(
                GizmoHandle::Center,
                ray_sphere_intersection(ray, frame.origin, style.center_hit_radius),
            );
        }
        GizmoKind::Rotation => {
            for axis in GizmoAxis::ALL {
                nearest.offer(GizmoHandle::Axis(axis), ring_hit(&frame, style, ray, axis));
            }
        }
        GizmoKind::Scale => {
            for axis in GizmoAxis::ALL {
                let center = cube_center(&frame, style, axis);
                nearest.offer(
                    GizmoHandle::Axis(axis),
                    ray_sphere_intersection(ray, center, style.cube_hit_radius),
                );
                nearest.offer(GizmoHandle::Plane(axis), plane_hit(&frame, style, ray, axis));
            }
            nearest.offer(
                GizmoHandle::Uniform,
                ray_sphere_intersection(ray, frame.origin, style.uniform_hit_radius),
            );
        }
        GizmoKind::Free => {
            nearest.offer(
                GizmoHandle::Center,
                ray_sphere_intersection(ray, frame.origin, style.center_hit_radius),
            );
        }
    }

    nearest.best.map(|(handle, _)| handle)
}

/// Pointer tracking for one grabbed handle.
///
/// Built right after the controller accepted the drag, from the node it
/// placed for the session.
#[derive(Debug, Clone)]
pub struct HandleDrag {
    kind: GizmoKind,
    handle: GizmoHandle,
    start: Transform,
    axis_dir: Vec3,
    plane_normal: Vec3,
    start_point: Vec3,
    start_t: f32,
    reach: f32,
    last_angle: f32,
    swept: f32,
    start_cursor: Vec2,
}

impl HandleDrag {
    /// Starts tracking `handle` of a `kind` gizmo grabbed under `ray`.
    ///
    /// `view_forward` is the camera's forward direction and `cursor` the
    /// pointer position in window pixels.
    pub fn begin(
        kind: GizmoKind,
        handle: GizmoHandle,
        node: &Transform,
        ray: &Ray3d,
        view_forward: Vec3,
        cursor: Vec2,
        style: &GizmoStyle,
    ) -> Self {
        let frame = GizmoFrame::from_node(node);
        let view_dir = -view_forward.normalize_or_zero();

        let axis_dir = match handle {
            GizmoHandle::Axis(axis) | GizmoHandle::Plane(axis) => frame.axis(axis),
            GizmoHandle::Uniform | GizmoHandle::Center => view_dir,
        };

        // Plane the pointer ray is intersected with while dragging.
        let plane_normal = match (kind, handle) {
            (GizmoKind::Rotation, _) | (_, GizmoHandle::Plane(_)) => axis_dir,
            (_, GizmoHandle::Axis(_)) => {
                let n = axis_dir.cross(view_dir).cross(axis_dir).normalize_or_zero();
                if n.length_squared() < EPSILON {
                    axis_dir
                } else {
                    n
                }
            }
            _ => view_dir,
        };

        let start_point =
            ray_plane_intersection(ray, frame.origin, plane_normal).unwrap_or(frame.origin);
        let v = start_point - frame.origin;
        let start_t = match handle {
            GizmoHandle::Uniform => v.length(),
            _ => v.dot(axis_dir),
        };
        let last_angle = match handle {
            GizmoHandle::Axis(axis) if kind == GizmoKind::Rotation => {
                frame.ring_angle(axis, start_point).unwrap_or(0.0)
            }
            _ => 0.0,
        };

        Self {
            kind,
            handle,
            start: *node,
            axis_dir,
            plane_normal,
            start_point,
            start_t,
            reach: style.axis_length.max(MIN_SCALE_DIVISOR),
            last_angle,
            swept: 0.0,
            start_cursor: cursor,
        }
    }

    /// The grabbed handle.
    pub fn handle(&self) -> GizmoHandle {
        self.handle
    }

    /// Total angle swept by a rotation ring drag, unwrapped across turns.
    pub fn swept_angle(&self) -> f32 {
        self.swept
    }

    /// Converts one pointer move into a drag update.
    ///
    /// `None` when the ray no longer meets the drag plane.
    pub fn drag(&mut self, ray: &Ray3d, cursor: Vec2) -> Option<DragUpdate> {
        if self.handle == GizmoHandle::Center {
            return Some(DragUpdate::Pointer(*ray));
        }
        if let (GizmoKind::Scale, GizmoHandle::Plane(plane)) = (self.kind, self.handle) {
            let screen_delta = Vec2::new(
                cursor.x - self.start_cursor.x,
                self.start_cursor.y - cursor.y,
            );
            return Some(DragUpdate::PlanarScale {
                plane,
                screen_delta,
            });
        }

        let origin = self.start.translation;
        let hit = ray_plane_intersection(ray, origin, self.plane_normal)?;
        let v = hit - origin;
        let mut node = self.start;

        match (self.kind, self.handle) {
            (GizmoKind::Rotation, GizmoHandle::Axis(axis)) => {
                let frame = GizmoFrame::from_node(&self.start);
                let angle = frame.ring_angle(axis, hit)?;
                self.swept += wrap_angle(angle - self.last_angle);
                self.last_angle = angle;
                node.rotation = Quat::from_axis_angle(self.axis_dir, self.swept) * self.start.rotation;
            }
            (GizmoKind::Scale, GizmoHandle::Axis(axis)) => {
                let t = v.dot(self.axis_dir);
                let divisor = self.start_t.abs().max(MIN_SCALE_DIVISOR);
                let ratio = (1.0 + (t - self.start_t) / divisor).max(MIN_SCALE_RATIO);
                match axis {
                    GizmoAxis::X => node.scale.x *= ratio,
                    GizmoAxis::Y => node.scale.y *= ratio,
                    GizmoAxis::Z => node.scale.z *= ratio,
                }
            }
            (GizmoKind::Scale, GizmoHandle::Uniform) => {
                let ratio = (1.0 + (v.length() - self.start_t) / self.reach).max(MIN_SCALE_RATIO);
                node.scale *= ratio;
            }
            (_, GizmoHandle::Axis(_)) => {
                let t = v.dot(self.axis_dir);
                node.translation += self.axis_dir * (t - self.start_t);
            }
            (_, GizmoHandle::Plane(_)) => {
                let moved = hit - self.start_point;
                node.translation += moved - self.plane_normal * moved.dot(self.plane_normal);
            }
            _ => return None,
        }
        Some(DragUpdate::Handle(node))
    }
}
