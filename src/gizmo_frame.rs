//! Handle orientation derived from the gizmo node.
//!
//! The controller already orients the node for the active gizmo (world or
//! local for position and rotation, always local for scale), so every handle
//! family reads its axes from the node rotation.

use bevy::prelude::*;

use crate::math::{axis_basis, sanitize_rotation};
use crate::types::GizmoAxis;

/// Origin and unit axis directions of the gizmo node.
#[derive(Clone, Copy, Debug)]
pub struct GizmoFrame {
    /// World position of the handles' centre.
    pub origin: Vec3,
    x: Vec3,
    y: Vec3,
    z: Vec3,
}

impl GizmoFrame {
    /// Frame for a node transform. Node scale never stretches the handles.
    pub fn from_node(node: &Transform) -> Self {
        let rotation = sanitize_rotation(node.rotation);
        Self {
            origin: node.translation,
            x: rotation * Vec3::X,
            y: rotation * Vec3::Y,
            z: rotation * Vec3::Z,
        }
    }

    /// World direction of `axis`.
    pub fn axis(&self, axis: GizmoAxis) -> Vec3 {
        match axis {
            GizmoAxis::X => self.x,
            GizmoAxis::Y => self.y,
            GizmoAxis::Z => self.z,
        }
    }

    /// The two in-plane directions of the plane whose normal is `normal`.
    pub fn plane_dirs(&self, normal: GizmoAxis) -> (Vec3, Vec3) {
        let (a, b) = normal.plane_axes();
        (self.axis(a), self.axis(b))
    }

    /// Coordinates of `point` in the plane of `normal`, relative to the origin.
    pub fn plane_coords(&self, normal: GizmoAxis, point: Vec3) -> Vec2 {
        let (a, b) = self.plane_dirs(normal);
        let local = point - self.origin;
        Vec2::new(local.dot(a), local.dot(b))
    }

    /// Angle of `point` around `axis`, measured in the ring's own basis.
    ///
    /// `None` when the point sits on the axis.
    pub fn ring_angle(&self, axis: GizmoAxis, point: Vec3) -> Option<f32> {
        let dir = self.axis(axis);
        let v = point - self.origin;
        let v = (v - dir * v.dot(dir)).normalize_or_zero();
        if v == Vec3::ZERO {
            return None;
        }
        let (t1, t2) = axis_basis(dir);
        Some(v.dot(t2).atan2(v.dot(t1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn axes_follow_node_rotation() {
        let node = Transform::from_xyz(1.0, 2.0, 3.0).with_rotation(Quat::from_rotation_y(FRAC_PI_2));
        let frame = GizmoFrame::from_node(&node);
        assert_eq!(frame.origin, Vec3::new(1.0, 2.0, 3.0));
        assert!(frame.axis(GizmoAxis::X).abs_diff_eq(Vec3::NEG_Z, 1e-6));
        assert!(frame.axis(GizmoAxis::Y).abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn corrupt_rotation_reads_as_world_axes() {
        let node = Transform::from_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0));
        let frame = GizmoFrame::from_node(&node);
        assert_eq!(frame.axis(GizmoAxis::Z), Vec3::Z);
    }

    #[test]
    fn plane_coordinates_use_in_plane_axes() {
        let frame = GizmoFrame::from_node(&Transform::from_xyz(1.0, 0.0, 0.0));
        let uv = frame.plane_coords(GizmoAxis::Y, Vec3::new(1.5, 9.0, 0.7));
        assert!(uv.abs_diff_eq(Vec2::new(0.5, 0.7), 1e-6));
    }

    #[test]
    fn ring_angle_advances_counter_clockwise() {
        let frame = GizmoFrame::from_node(&Transform::IDENTITY);
        let a = frame.ring_angle(GizmoAxis::Y, Vec3::X).unwrap();
        let b = frame.ring_angle(GizmoAxis::Y, Vec3::NEG_Z).unwrap();
        // A positive quarter turn about +Y carries +X onto -Z.
        assert!((crate::math::wrap_angle(b - a) - FRAC_PI_2).abs() < 1e-5);
        assert!(frame.ring_angle(GizmoAxis::Y, Vec3::Y * 3.0).is_none());
    }
}
