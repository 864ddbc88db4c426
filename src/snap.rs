//! Quantization of positions, scales and rotation deltas, plus the gates that
//! decide when a snapped value is worth applying.

use bevy::prelude::*;

use crate::math::{rotation_angle, sanitize_rotation};
use crate::types::SnapSettings;

/// Tolerance for "already on the grid" and for step boundaries.
const SNAP_EPSILON: f32 = 1e-4;

/// A snapped value and whether snapping moved it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Snapped<T> {
    /// The quantized value.
    pub value: T,
    /// `true` when quantization changed the input.
    pub changed: bool,
}

impl<T> Snapped<T> {
    fn new(value: T, changed: bool) -> Self {
        Self { value, changed }
    }
}

fn valid_step(step: f32) -> bool {
    step.is_finite() && step > SNAP_EPSILON
}

/// Nearest multiple of `step`. Non-positive steps leave the value alone.
pub fn quantize(value: f32, step: f32) -> f32 {
    if !valid_step(step) {
        return value;
    }
    (value / step).round() * step
}

/// Largest multiple of `step` not exceeding `value` in magnitude.
///
/// Values within tolerance of a multiple land on it, so an accumulated
/// `14.99999°` still counts as one full 15° step.
pub fn quantize_toward_zero(value: f32, step: f32) -> f32 {
    if !valid_step(step) {
        return value;
    }
    let steps = value / step;
    let nearest = steps.round();
    if (steps - nearest).abs() < SNAP_EPSILON {
        nearest * step
    } else {
        steps.trunc() * step
    }
}

/// Snaps a scalar to the nearest multiple of `step`.
pub fn snap_scalar(value: f32, step: f32) -> Snapped<f32> {
    let snapped = quantize(value, step);
    Snapped::new(snapped, (snapped - value).abs() > SNAP_EPSILON)
}

/// Snaps every component of `value` to the grid.
pub fn snap_vec3(value: Vec3, step: f32) -> Snapped<Vec3> {
    let snapped = Vec3::new(
        quantize(value.x, step),
        quantize(value.y, step),
        quantize(value.z, step),
    );
    Snapped::new(snapped, !snapped.abs_diff_eq(value, SNAP_EPSILON))
}

/// Snaps X and Z to the grid and keeps Y.
pub fn snap_vec3_xz(value: Vec3, step: f32) -> Snapped<Vec3> {
    let snapped = Vec3::new(quantize(value.x, step), value.y, quantize(value.z, step));
    Snapped::new(snapped, !snapped.abs_diff_eq(value, SNAP_EPSILON))
}

/// Snaps a local scale, never letting a component collapse to zero.
pub fn snap_scale(value: Vec3, step: f32) -> Snapped<Vec3> {
    let component = |v: f32| {
        let q = quantize(v, step);
        if q == 0.0 && valid_step(step) {
            step.copysign(v)
        } else {
            q
        }
    };
    let snapped = Vec3::new(component(value.x), component(value.y), component(value.z));
    Snapped::new(snapped, !snapped.abs_diff_eq(value, SNAP_EPSILON))
}

/// Reduces a rotation delta to a whole number of `step`s about its own axis.
///
/// The angle is rounded toward zero, so a partly swept step is never applied
/// early.
pub fn snap_rotation(delta: Quat, step: f32) -> Snapped<Quat> {
    let mut delta = sanitize_rotation(delta);
    if delta.w < 0.0 {
        delta = -delta;
    }
    let angle = rotation_angle(delta);
    if angle < SNAP_EPSILON {
        return Snapped::new(Quat::IDENTITY, angle > 0.0);
    }

    let (axis, _) = delta.to_axis_angle();
    let snapped_angle = quantize_toward_zero(angle, step);
    let snapped = Quat::from_axis_angle(axis, snapped_angle);
    Snapped::new(snapped, (snapped_angle - angle).abs() > SNAP_EPSILON)
}

/// Whether the rotation gizmo should apply a new snapped rotation now.
///
/// Without snapping every update applies. With snapping, the first
/// application waits for half a step and later ones for a full step of
/// change relative to the last applied angle.
pub fn rotation_gate(settings: &SnapSettings, accumulated: f32, last_applied: Option<f32>) -> bool {
    if !settings.enabled || !valid_step(settings.rotation_step) {
        return true;
    }
    let step = settings.rotation_step;
    match last_applied {
        None => accumulated >= step * 0.5 - SNAP_EPSILON,
        Some(last) => (accumulated - last).abs() >= step - SNAP_EPSILON,
    }
}

/// Whether a free-dragged pivot has travelled far enough from the last
/// snapped position to move the entities again.
pub fn translation_gate(settings: &SnapSettings, pivot: Vec3, last_snapped: Option<Vec3>) -> bool {
    if !settings.enabled || !valid_step(settings.translation_step) {
        return true;
    }
    match last_snapped {
        Some(last) => pivot.distance(last) >= settings.translation_step - SNAP_EPSILON,
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapping(rotation_degrees: f32) -> SnapSettings {
        SnapSettings {
            enabled: true,
            rotation_step: rotation_degrees.to_radians(),
            ..default()
        }
    }

    #[test]
    fn scalar_and_vector_snaps_report_change() {
        assert_eq!(snap_scalar(0.5, 0.25), Snapped::new(0.5, false));
        let snapped = snap_scalar(0.6, 0.25);
        assert!((snapped.value - 0.5).abs() < 1e-6 && snapped.changed);

        let v = snap_vec3(Vec3::new(0.13, -0.38, 1.0), 0.25);
        assert!(v.value.abs_diff_eq(Vec3::new(0.25, -0.5, 1.0), 1e-6));
        assert!(v.changed);

        let xz = snap_vec3_xz(Vec3::new(0.13, 0.37, 0.9), 0.5);
        assert!(xz.value.abs_diff_eq(Vec3::new(0.0, 0.37, 1.0), 1e-6));
    }

    #[test]
    fn zero_step_is_passthrough() {
        assert_eq!(quantize(1.234, 0.0), 1.234);
        assert_eq!(quantize_toward_zero(-1.234, -1.0), -1.234);
        assert!(!snap_vec3(Vec3::splat(0.3), 0.0).changed);
    }

    #[test]
    fn scale_snap_keeps_components_nonzero() {
        let s = snap_scale(Vec3::new(0.04, 1.26, -0.02), 0.1);
        assert!(s.value.abs_diff_eq(Vec3::new(0.1, 1.3, -0.1), 1e-5));
    }

    #[test]
    fn toward_zero_truncates_but_absorbs_float_noise() {
        let step = 15.0_f32.to_radians();
        assert_eq!(quantize_toward_zero(14.0_f32.to_radians(), step), 0.0);
        assert!((quantize_toward_zero(29.0_f32.to_radians(), step) - step).abs() < 1e-6);
        assert!((quantize_toward_zero(step * 0.999_99, step) - step).abs() < 1e-6);
        assert!((quantize_toward_zero(-20.0_f32.to_radians(), step) + step).abs() < 1e-6);
    }

    #[test]
    fn rotation_snap_keeps_axis() {
        let delta = Quat::from_rotation_y(-40.0_f32.to_radians());
        let snapped = snap_rotation(delta, 15.0_f32.to_radians());
        let expected = Quat::from_rotation_y(-30.0_f32.to_radians());
        assert!(snapped.value.abs_diff_eq(expected, 1e-5));
        assert!(snapped.changed);

        let identity = snap_rotation(Quat::IDENTITY, 0.2);
        assert_eq!(identity.value, Quat::IDENTITY);
        assert!(!identity.changed);
    }

    #[test]
    fn rotation_gate_uses_half_step_then_full_steps() {
        let settings = snapping(15.0);
        assert!(!rotation_gate(&settings, 7.0_f32.to_radians(), None));
        assert!(rotation_gate(&settings, 7.5_f32.to_radians(), None));
        let applied = Some(15.0_f32.to_radians());
        assert!(!rotation_gate(&settings, 29.0_f32.to_radians(), applied));
        assert!(rotation_gate(&settings, 30.0_f32.to_radians(), applied));
        assert!(rotation_gate(&settings, 0.0, applied));

        let off = SnapSettings::default();
        assert!(rotation_gate(&off, 0.001, Some(0.0)));
    }

    #[test]
    fn translation_gate_waits_for_a_step() {
        let settings = SnapSettings {
            enabled: true,
            translation_step: 1.0,
            ..default()
        };
        let last = Some(Vec3::ZERO);
        assert!(!translation_gate(&settings, Vec3::new(0.6, 0.0, 0.6), last));
        assert!(translation_gate(&settings, Vec3::new(0.8, 0.0, 0.8), last));
        assert!(translation_gate(&SnapSettings::default(), Vec3::ZERO, last));
    }
}
