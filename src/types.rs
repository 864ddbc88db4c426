//! Public vocabulary shared by the gizmo engine and its Bevy shell.
//!
//! Configuration lives in plain resources ([`GizmoConfig`], [`GizmoStyle`])
//! owned by the host and handed to the engine on every call.

use bevy::prelude::*;
use std::fmt;

/// Which transformer is attached to the current selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GizmoKind {
    /// Axis, plane and centre-disc translation.
    #[default]
    Position,
    /// Axis rings.
    Rotation,
    /// Axis, plane and uniform scaling, always in entity-local axes.
    Scale,
    /// Unconstrained translation on a horizontal plane.
    Free,
}

impl GizmoKind {
    /// Every gizmo kind, in toolbar order.
    pub const ALL: [GizmoKind; 4] = [
        GizmoKind::Position,
        GizmoKind::Rotation,
        GizmoKind::Scale,
        GizmoKind::Free,
    ];

    /// The kind after this one in [`GizmoKind::ALL`], wrapping around.
    pub fn next(self) -> Self {
        let index = Self::ALL.iter().position(|kind| *kind == self).unwrap_or(0);
        Self::ALL[(index + 1) % Self::ALL.len()]
    }
}

impl fmt::Display for GizmoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GizmoKind::Position => f.write_str("Position"),
            GizmoKind::Rotation => f.write_str("Rotation"),
            GizmoKind::Scale => f.write_str("Scale"),
            GizmoKind::Free => f.write_str("Free"),
        }
    }
}

/// Reference frame for position and rotation handles.
///
/// The scale gizmo ignores this and always works in entity-local axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentMode {
    /// Handles follow the global X/Y/Z axes.
    #[default]
    World,
    /// Handles follow the selected entity's own axes (single selection only).
    Local,
}

impl AlignmentMode {
    /// Flips between world and local alignment.
    pub fn toggled(self) -> Self {
        match self {
            AlignmentMode::World => AlignmentMode::Local,
            AlignmentMode::Local => AlignmentMode::World,
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::World => f.write_str("World"),
            AlignmentMode::Local => f.write_str("Local"),
        }
    }
}

/// One of the three principal axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoAxis {
    /// X, drawn red.
    X,
    /// Y, drawn green.
    Y,
    /// Z, drawn blue.
    Z,
}

impl GizmoAxis {
    /// All three axes in X, Y, Z order.
    pub const ALL: [GizmoAxis; 3] = [GizmoAxis::X, GizmoAxis::Y, GizmoAxis::Z];

    /// Unit vector for this axis.
    pub fn to_vec3(self) -> Vec3 {
        match self {
            GizmoAxis::X => Vec3::X,
            GizmoAxis::Y => Vec3::Y,
            GizmoAxis::Z => Vec3::Z,
        }
    }

    /// The two axes spanning the plane whose normal is `self`.
    pub fn plane_axes(self) -> (GizmoAxis, GizmoAxis) {
        match self {
            GizmoAxis::X => (GizmoAxis::Y, GizmoAxis::Z),
            GizmoAxis::Y => (GizmoAxis::X, GizmoAxis::Z),
            GizmoAxis::Z => (GizmoAxis::X, GizmoAxis::Y),
        }
    }
}

/// Identifies a grabbable piece of handle geometry.
///
/// The meaning of a handle depends on the active [`GizmoKind`]: `Axis` is a
/// translation cone, a rotation ring or a scale cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoHandle {
    /// A single-axis handle.
    Axis(GizmoAxis),
    /// A planar handle, identified by the plane's normal axis.
    Plane(GizmoAxis),
    /// The uniform scale square at the gizmo origin.
    Uniform,
    /// The centre disc, which starts a ground-plane drag.
    Center,
}

impl GizmoHandle {
    /// Axes that visually react while this handle is hovered or dragged.
    pub fn involved_axes(self) -> Vec<GizmoAxis> {
        match self {
            GizmoHandle::Axis(axis) => vec![axis],
            GizmoHandle::Plane(normal) => {
                let (a, b) = normal.plane_axes();
                vec![a, b]
            }
            GizmoHandle::Uniform => GizmoAxis::ALL.to_vec(),
            GizmoHandle::Center => vec![GizmoAxis::X, GizmoAxis::Z],
        }
    }
}

/// Grid and angle snapping, read at the moment a delta is applied.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapSettings {
    /// Master switch.
    pub enabled: bool,
    /// Grid size for positions, in world units.
    pub translation_step: f32,
    /// Angle increment, in radians.
    pub rotation_step: f32,
    /// Increment for local scale components.
    pub scale_step: f32,
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            translation_step: 0.25,
            rotation_step: 15.0_f32.to_radians(),
            scale_step: 0.1,
        }
    }
}

/// Behavioural settings for the gizmo engine.
///
/// Hosts mutate this resource freely; the engine never caches it across
/// pointer events.
#[derive(Resource, Debug, Clone, PartialEq)]
pub struct GizmoConfig {
    /// Snapping increments and the snap switch.
    pub snap: SnapSettings,
    /// World or local handle alignment.
    pub alignment: AlignmentMode,
    /// Amplification applied to the scale handle's raw ratio.
    pub scale_sensitivity: f32,
    /// Screen pixels of planar-scale drag that equal one unit of ratio.
    pub planar_scale_pixels: f32,
}

impl Default for GizmoConfig {
    fn default() -> Self {
        Self {
            snap: SnapSettings::default(),
            alignment: AlignmentMode::World,
            scale_sensitivity: 2.0,
            planar_scale_pixels: 100.0,
        }
    }
}

/// Toolbar state the host sets: which gizmo to show and whether scaling
/// keeps proportions. The plugin applies changes on the next frame.
#[derive(Resource, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GizmoMode {
    /// Gizmo to attach to the selection.
    pub kind: GizmoKind,
    /// Locks scale drags to a uniform ratio.
    pub proportional_scaling: bool,
}

/// Marker for cameras whose view drives gizmo picking.
///
/// ```ignore
/// commands.spawn((
///     Camera3d::default(),
///     Transform::from_xyz(0.0, 6.0, 12.0).looking_at(Vec3::ZERO, Vec3::Y),
///     GizmoCamera,
/// ));
/// ```
#[derive(Component)]
pub struct GizmoCamera;

/// Colours for one handle in its idle, hovered and dragged states.
#[derive(Clone, Debug)]
pub struct GizmoStateColors {
    /// Not interacted with.
    pub idle: Color,
    /// Under the pointer.
    pub hover: Color,
    /// Being dragged.
    pub active: Color,
}

impl GizmoStateColors {
    /// Builds a colour set from its three states.
    pub fn new(idle: Color, hover: Color, active: Color) -> Self {
        Self {
            idle,
            hover,
            active,
        }
    }

    /// Picks the colour for the given interaction state.
    pub fn pick(&self, hovered: bool, active: bool) -> Color {
        if active {
            self.active
        } else if hovered {
            self.hover
        } else {
            self.idle
        }
    }
}

impl Default for GizmoStateColors {
    fn default() -> Self {
        Self {
            idle: Color::srgb(0.8, 0.8, 0.8),
            hover: Color::srgb(1.0, 1.0, 1.0),
            active: Color::srgb(1.0, 1.0, 0.8),
        }
    }
}

/// Per-axis colour sets.
#[derive(Clone, Debug)]
pub struct AxisColors {
    /// X axis colours.
    pub x: GizmoStateColors,
    /// Y axis colours.
    pub y: GizmoStateColors,
    /// Z axis colours.
    pub z: GizmoStateColors,
}

impl AxisColors {
    /// Colours for `axis`.
    pub fn for_axis(&self, axis: GizmoAxis) -> &GizmoStateColors {
        match axis {
            GizmoAxis::X => &self.x,
            GizmoAxis::Y => &self.y,
            GizmoAxis::Z => &self.z,
        }
    }
}

impl Default for AxisColors {
    fn default() -> Self {
        Self {
            x: GizmoStateColors::new(
                Color::srgb(0.95, 0.3, 0.3),
                Color::srgb(1.0, 0.7, 0.7),
                Color::srgb(1.0, 0.9, 0.6),
            ),
            y: GizmoStateColors::new(
                Color::srgb(0.3, 0.9, 0.3),
                Color::srgb(0.7, 1.0, 0.7),
                Color::srgb(1.0, 0.9, 0.6),
            ),
            z: GizmoStateColors::new(
                Color::srgb(0.3, 0.5, 1.0),
                Color::srgb(0.7, 0.8, 1.0),
                Color::srgb(1.0, 0.9, 0.6),
            ),
        }
    }
}

/// Handle geometry, hit tolerances and colours.
///
/// Sizes are in world units around the gizmo origin.
#[derive(Resource, Clone, Debug)]
pub struct GizmoStyle {
    /// Line width handed to Bevy's gizmo renderer, in pixels.
    pub line_width: f32,
    /// Depth bias so handles draw over scene geometry.
    pub depth_bias: f32,
    /// Length of axis shafts and radius of rotation rings.
    pub axis_length: f32,
    /// Per-axis colours for every handle family.
    pub axis_colors: AxisColors,

    /// Translation cone length.
    pub cone_length: f32,
    /// Translation cone base radius.
    pub cone_radius: f32,
    /// Hit sphere radius around each cone.
    pub cone_hit_radius: f32,

    /// Offset of planar handles from the origin along both plane axes.
    pub plane_offset: f32,
    /// Side length of planar handles.
    pub plane_size: f32,
    /// Extra tolerance around planar handles.
    pub plane_hit_padding: f32,

    /// Segments per rotation ring.
    pub ring_segments: usize,
    /// Distance from the ring within which a ray counts as a hit.
    pub ring_hit_thickness: f32,

    /// Scale cube edge length.
    pub cube_size: f32,
    /// Scale cube position as a fraction of `axis_length`.
    pub cube_offset: f32,
    /// Hit sphere radius around each scale cube.
    pub cube_hit_radius: f32,

    /// Uniform scale square side length.
    pub uniform_size: f32,
    /// Hit sphere radius of the uniform scale square.
    pub uniform_hit_radius: f32,
    /// Uniform scale square colours.
    pub uniform_colors: GizmoStateColors,

    /// Radius of the centre disc used for ground-plane drags.
    pub center_radius: f32,
    /// Hit sphere radius of the centre disc.
    pub center_hit_radius: f32,
    /// Centre disc colours.
    pub center_colors: GizmoStateColors,

    /// Radius of the sphere around each selected entity that the free gizmo
    /// and picker treat as the entity's body.
    pub pick_radius: f32,
}

impl Default for GizmoStyle {
    fn default() -> Self {
        let axis_length = 2.0;
        let cone_length = 0.4;
        let cube_size = 0.2;

        Self {
            line_width: 3.0,
            depth_bias: -1.0,
            axis_length,
            axis_colors: AxisColors::default(),

            cone_length,
            cone_radius: 0.12,
            cone_hit_radius: cone_length * 0.9,

            plane_offset: 0.35,
            plane_size: 0.5,
            plane_hit_padding: 0.1,

            ring_segments: 64,
            ring_hit_thickness: 0.2,

            cube_size,
            cube_offset: 0.7,
            cube_hit_radius: cube_size * 0.9,

            uniform_size: 0.27,
            uniform_hit_radius: 0.3,
            uniform_colors: GizmoStateColors::new(
                Color::srgba(1.0, 1.0, 1.0, 0.9),
                Color::WHITE,
                Color::srgb(1.0, 0.9, 0.6),
            ),

            center_radius: 0.25,
            center_hit_radius: 0.3,
            center_colors: GizmoStateColors::new(
                Color::srgb(1.0, 0.6, 0.2),
                Color::srgb(1.0, 0.8, 0.5),
                Color::srgb(1.0, 0.9, 0.6),
            ),

            pick_radius: 0.75,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gizmo_kind_cycles_in_toolbar_order() {
        let mut kind = GizmoKind::Free;
        let mut seen = Vec::new();
        for _ in 0..GizmoKind::ALL.len() {
            kind = kind.next();
            seen.push(kind);
        }
        assert_eq!(seen, GizmoKind::ALL);
    }
}
