//! Handle rendering.
//!
//! [`draw_handles`] emits the active gizmo's handle geometry as line segments
//! through a [`HandleRenderer`]. The Bevy implementation forwards them to the
//! immediate-mode `Gizmos` API.

use std::f32::consts::TAU;

use bevy::prelude::*;

use crate::gizmo_frame::GizmoFrame;
use crate::math::{axis_basis, rotation_between};
use crate::types::{GizmoAxis, GizmoHandle, GizmoKind, GizmoStyle};

/// Number of line segments used to draw translation cones.
const CONE_SEGMENTS: usize = 16;

/// Number of line segments used to draw the centre disc.
const DISC_SEGMENTS: usize = 32;

/// Sink for handle line segments.
pub trait HandleRenderer {
    /// Draws one straight segment.
    fn segment(&mut self, start: Vec3, end: Vec3, color: Color);
}

impl HandleRenderer for Gizmos<'_, '_> {
    fn segment(&mut self, start: Vec3, end: Vec3, color: Color) {
        self.line(start, end, color);
    }
}

/// Everything the renderer needs to know about the gizmo this frame.
#[derive(Clone, Copy, Debug)]
pub struct HandleView {
    /// The gizmo node.
    pub node: Transform,
    /// Which handle set to draw.
    pub kind: GizmoKind,
    /// Handle under the pointer.
    pub hovered: Option<GizmoHandle>,
    /// Handle being dragged.
    pub active: Option<GizmoHandle>,
    /// Camera right vector, for screen-facing handles.
    pub camera_right: Vec3,
    /// Camera up vector, for screen-facing handles.
    pub camera_up: Vec3,
}

struct Painter<'a, R: HandleRenderer + ?Sized> {
    out: &'a mut R,
    view: &'a HandleView,
    style: &'a GizmoStyle,
    frame: GizmoFrame,
}

impl<R: HandleRenderer + ?Sized> Painter<'_, R> {
    fn handle_color(&self, handle: GizmoHandle, axis: GizmoAxis) -> Color {
        self.style.axis_colors.for_axis(axis).pick(
            self.view.hovered == Some(handle),
            self.view.active == Some(handle),
        )
    }

    /// Shafts light up when any handle involving their axis is in play.
    fn shaft_color(&self, axis: GizmoAxis) -> Color {
        let involved = |handle: Option<GizmoHandle>| {
            handle.is_some_and(|h| h.involved_axes().contains(&axis))
        };
        self.style
            .axis_colors
            .for_axis(axis)
            .pick(involved(self.view.hovered), involved(self.view.active))
    }

    fn polyline(&mut self, points: &[Vec3], color: Color) {
        for pair in points.windows(2) {
            self.out.segment(pair[0], pair[1], color);
        }
    }

    fn shafts(&mut self, length: f32) {
        for axis in GizmoAxis::ALL {
            let end = self.frame.origin + self.frame.axis(axis) * length;
            let color = self.shaft_color(axis);
            self.out.segment(self.frame.origin, end, color);
        }
    }

    fn cones(&mut self) {
        for axis in GizmoAxis::ALL {
            let dir = self.frame.axis(axis);
            let base = self.frame.origin + dir * self.style.axis_length;
            let tip = base + dir * self.style.cone_length;
            let color = self.handle_color(GizmoHandle::Axis(axis), axis);
            let (t1, t2) = axis_basis(dir);
            for i in 0..CONE_SEGMENTS {
                let a0 = TAU * i as f32 / CONE_SEGMENTS as f32;
                let a1 = TAU * (i + 1) as f32 / CONE_SEGMENTS as f32;
                let p0 = base + (t1 * a0.cos() + t2 * a0.sin()) * self.style.cone_radius;
                let p1 = base + (t1 * a1.cos() + t2 * a1.sin()) * self.style.cone_radius;
                self.out.segment(tip, p0, color);
                self.out.segment(p0, p1, color);
            }
        }
    }

    fn plane_squares(&mut self) {
        for normal in GizmoAxis::ALL {
            let (d1, d2) = self.frame.plane_dirs(normal);
            let (offset, size) = (self.style.plane_offset, self.style.plane_size);
            let p0 = self.frame.origin + (d1 + d2) * offset;
            let corners = [p0, p0 + d1 * size, p0 + (d1 + d2) * size, p0 + d2 * size, p0];
            let color = self.handle_color(GizmoHandle::Plane(normal), normal);
            self.polyline(&corners, color);
        }
    }

    fn rings(&mut self) {
        let segments = self.style.ring_segments.max(3);
        for axis in GizmoAxis::ALL {
            let (t1, t2) = axis_basis(self.frame.axis(axis));
            let points: Vec<Vec3> = (0..=segments)
                .map(|i| {
                    let a = TAU * i as f32 / segments as f32;
                    self.frame.origin + (t1 * a.cos() + t2 * a.sin()) * self.style.axis_length
                })
                .collect();
            let color = self.handle_color(GizmoHandle::Axis(axis), axis);
            self.polyline(&points, color);
        }
    }

    fn cubes(&mut self) {
        let half = self.style.cube_size * 0.5;
        for axis in GizmoAxis::ALL {
            let center =
                self.frame.origin + self.frame.axis(axis) * (self.style.axis_length * self.style.cube_offset);
            let color = self.handle_color(GizmoHandle::Axis(axis), axis);
            let (x, y, z) = (
                self.frame.axis(GizmoAxis::X) * half,
                self.frame.axis(GizmoAxis::Y) * half,
                self.frame.axis(GizmoAxis::Z) * half,
            );
            let corner = |sx: f32, sy: f32, sz: f32| center + x * sx + y * sy + z * sz;
            for (a, b) in [(-1.0, -1.0), (-1.0, 1.0), (1.0, -1.0), (1.0, 1.0)] {
                self.out.segment(corner(-1.0, a, b), corner(1.0, a, b), color);
                self.out.segment(corner(a, -1.0, b), corner(a, 1.0, b), color);
                self.out.segment(corner(a, b, -1.0), corner(a, b, 1.0), color);
            }
        }
    }

    fn uniform_square(&mut self) {
        let half = self.style.uniform_size * 0.5;
        let r = self.view.camera_right * half;
        let u = self.view.camera_up * half;
        let o = self.frame.origin;
        let color = self.style.uniform_colors.pick(
            self.view.hovered == Some(GizmoHandle::Uniform),
            self.view.active == Some(GizmoHandle::Uniform),
        );
        self.polyline(&[o - r - u, o + r - u, o + r + u, o - r + u, o - r - u], color);
    }

    /// Ground disc, lying flat whatever the node orientation.
    fn center_disc(&mut self) {
        let turn = rotation_between(Vec3::Z, Vec3::Y);
        let points: Vec<Vec3> = (0..=DISC_SEGMENTS)
            .map(|i| {
                let a = TAU * i as f32 / DISC_SEGMENTS as f32;
                self.frame.origin + turn * Vec3::new(a.cos(), a.sin(), 0.0) * self.style.center_radius
            })
            .collect();
        let color = self.style.center_colors.pick(
            self.view.hovered == Some(GizmoHandle::Center),
            self.view.active == Some(GizmoHandle::Center),
        );
        self.polyline(&points, color);
    }
}

/// Draws the handle set of `view.kind` around `view.node`.
pub fn draw_handles<R: HandleRenderer + ?Sized>(out: &mut R, view: &HandleView, style: &GizmoStyle) {
    let mut painter = Painter {
        out,
        view,
        style,
        frame: GizmoFrame::from_node(&view.node),
    };
    match view.kind {
        GizmoKind::Position => {
            painter.shafts(style.axis_length);
            painter.cones();
            painter.plane_squares();
            painter.center_disc();
        }
        GizmoKind::Rotation => painter.rings(),
        GizmoKind::Scale => {
            painter.shafts(style.axis_length * style.cube_offset);
            painter.cubes();
            painter.plane_squares();
            painter.uniform_square();
        }
        GizmoKind::Free => painter.center_disc(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder(Vec<(Vec3, Vec3, Color)>);

    impl HandleRenderer for Recorder {
        fn segment(&mut self, start: Vec3, end: Vec3, color: Color) {
            self.0.push((start, end, color));
        }
    }

    fn view(kind: GizmoKind) -> HandleView {
        HandleView {
            node: Transform::from_xyz(1.0, 2.0, 3.0),
            kind,
            hovered: None,
            active: None,
            camera_right: Vec3::X,
            camera_up: Vec3::Y,
        }
    }

    #[test]
    fn rings_sit_at_axis_length() {
        let style = GizmoStyle::default();
        let mut out = Recorder::default();
        draw_handles(&mut out, &view(GizmoKind::Rotation), &style);

        assert_eq!(out.0.len(), 3 * style.ring_segments);
        let origin = Vec3::new(1.0, 2.0, 3.0);
        for (a, b, _) in &out.0 {
            assert!(((*a - origin).length() - style.axis_length).abs() < 1e-4);
            assert!(((*b - origin).length() - style.axis_length).abs() < 1e-4);
        }
    }

    #[test]
    fn hovered_and_active_handles_change_colour() {
        let style = GizmoStyle::default();
        let mut v = view(GizmoKind::Position);
        v.hovered = Some(GizmoHandle::Axis(GizmoAxis::X));
        v.active = Some(GizmoHandle::Plane(GizmoAxis::Y));
        let mut out = Recorder::default();
        draw_handles(&mut out, &v, &style);

        let colors: Vec<Color> = out.0.iter().map(|(_, _, c)| *c).collect();
        assert!(colors.contains(&style.axis_colors.x.hover));
        assert!(colors.contains(&style.axis_colors.y.active));
        assert!(colors.contains(&style.center_colors.idle));
    }

    #[test]
    fn centre_disc_lies_flat() {
        let style = GizmoStyle::default();
        let mut out = Recorder::default();
        draw_handles(&mut out, &view(GizmoKind::Free), &style);

        assert_eq!(out.0.len(), DISC_SEGMENTS);
        assert!(out.0.iter().all(|(a, b, _)| (a.y - 2.0).abs() < 1e-5 && (b.y - 2.0).abs() < 1e-5));
    }

    #[test]
    fn scale_handles_include_the_uniform_square() {
        let style = GizmoStyle::default();
        let mut v = view(GizmoKind::Scale);
        v.hovered = Some(GizmoHandle::Uniform);
        let mut out = Recorder::default();
        draw_handles(&mut out, &v, &style);
        assert!(out.0.iter().any(|(_, _, c)| *c == style.uniform_colors.hover));
    }
}
