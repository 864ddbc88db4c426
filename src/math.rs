//! Geometry helpers for handle picking and quaternion bookkeeping.

use std::f32::consts::PI;

use bevy::math::Ray3d;
use bevy::prelude::*;

/// Threshold for considering vectors as parallel or zero-length.
pub(crate) const EPSILON: f32 = 1e-6;

/// Threshold for parallel plane/ray detection.
const PLANE_EPSILON: f32 = 1e-5;

/// Threshold for choosing perpendicular helper vector.
const AXIS_PARALLEL_THRESHOLD: f32 = 0.9;

/// Dot product below which two directions count as opposite.
const OPPOSITE_DOT: f32 = -0.999_999;

/// Build an orthonormal basis (t1, t2) in the plane perpendicular to `axis`.
pub fn axis_basis(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or_zero();
    if axis.length_squared() < EPSILON {
        return (Vec3::X, Vec3::Y);
    }

    let helper = if axis.abs().dot(Vec3::Y) < AXIS_PARALLEL_THRESHOLD {
        Vec3::Y
    } else {
        Vec3::X
    };

    let t1 = axis.cross(helper).normalize_or_zero();
    let t2 = axis.cross(t1).normalize_or_zero();
    (t1, t2)
}

/// Distance along `ray` to the first hit on a sphere, or `None` on a miss.
///
/// A ray starting inside the sphere hits at distance zero.
pub fn ray_sphere_intersection(ray: &Ray3d, center: Vec3, radius: f32) -> Option<f32> {
    let m = ray.origin - center;
    let b = m.dot(*ray.direction);
    let c = m.length_squared() - radius * radius;

    // Origin outside and pointing away.
    if c > 0.0 && b > 0.0 {
        return None;
    }

    let discr = b * b - c;
    if discr < 0.0 {
        return None;
    }

    Some((-b - discr.sqrt()).max(0.0))
}

/// Point where `ray` crosses the plane through `plane_origin` with `plane_normal`.
///
/// Returns `None` when the ray is parallel to the plane or the plane lies
/// behind the ray origin.
pub fn ray_plane_intersection(ray: &Ray3d, plane_origin: Vec3, plane_normal: Vec3) -> Option<Vec3> {
    let denom = plane_normal.dot(*ray.direction);
    if denom.abs() < PLANE_EPSILON {
        return None;
    }
    let t = (plane_origin - ray.origin).dot(plane_normal) / denom;
    if t < 0.0 {
        None
    } else {
        Some(ray.origin + *ray.direction * t)
    }
}

/// Intersection of `ray` with the horizontal plane `y = height`.
pub fn ray_horizontal_plane(ray: &Ray3d, height: f32) -> Option<Vec3> {
    ray_plane_intersection(ray, Vec3::new(0.0, height, 0.0), Vec3::Y)
}

/// Replaces a missing or corrupt rotation with identity and normalizes the rest.
pub fn sanitize_rotation(rotation: Quat) -> Quat {
    let length_squared = rotation.length_squared();
    if !rotation.is_finite() || length_squared < EPSILON {
        Quat::IDENTITY
    } else {
        rotation / length_squared.sqrt()
    }
}

/// Total angle swept by `rotation`, in `[0, PI]`, independent of its axis.
///
/// Equal to `2 * acos(|w|)` for a unit quaternion, computed with `atan2` so
/// small angles keep their precision.
pub fn rotation_angle(rotation: Quat) -> f32 {
    let q = sanitize_rotation(rotation);
    let xyz = Vec3::new(q.x, q.y, q.z).length();
    2.0 * xyz.atan2(q.w.abs())
}

/// Shortest rotation carrying direction `from` onto direction `to`.
///
/// Opposite directions have no unique cross-product axis, so the rotation
/// turns by PI about an arbitrary axis perpendicular to `from`.
pub fn rotation_between(from: Vec3, to: Vec3) -> Quat {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();
    if from == Vec3::ZERO || to == Vec3::ZERO {
        return Quat::IDENTITY;
    }

    let dot = from.dot(to);
    if dot < OPPOSITE_DOT {
        let helper = if from.x.abs() < 0.1 { Vec3::X } else { Vec3::Y };
        let axis = from.cross(helper).normalize_or_zero();
        return Quat::from_axis_angle(axis, PI);
    }

    let axis = from.cross(to);
    Quat::from_xyzw(axis.x, axis.y, axis.z, 1.0 + dot).normalize()
}

/// Wraps an angle difference into `(-PI, PI]`.
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(2.0 * PI) - PI;
    if wrapped <= -PI {
        wrapped + 2.0 * PI
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn sphere_hit_from_outside_and_inside() {
        let ray = Ray3d::new(Vec3::new(0.0, 0.0, 10.0), Dir3::NEG_Z);
        let t = ray_sphere_intersection(&ray, Vec3::ZERO, 1.0).unwrap();
        assert!((t - 9.0).abs() < 1e-5);

        let inside = Ray3d::new(Vec3::ZERO, Dir3::X);
        assert_eq!(ray_sphere_intersection(&inside, Vec3::ZERO, 1.0), Some(0.0));

        let away = Ray3d::new(Vec3::new(0.0, 0.0, 10.0), Dir3::Z);
        assert!(ray_sphere_intersection(&away, Vec3::ZERO, 1.0).is_none());
    }

    #[test]
    fn horizontal_plane_hit_keeps_height() {
        let ray = Ray3d::new(Vec3::new(1.0, 5.0, 2.0), Dir3::NEG_Y);
        let hit = ray_horizontal_plane(&ray, 1.5).unwrap();
        assert!(hit.abs_diff_eq(Vec3::new(1.0, 1.5, 2.0), 1e-5));

        let parallel = Ray3d::new(Vec3::new(0.0, 5.0, 0.0), Dir3::X);
        assert!(ray_horizontal_plane(&parallel, 0.0).is_none());
    }

    #[test]
    fn swept_angle_ignores_axis_and_sign() {
        let q = Quat::from_rotation_y(0.5);
        assert!((rotation_angle(q) - 0.5).abs() < 1e-5);
        assert!((rotation_angle(-q) - 0.5).abs() < 1e-5);
        assert!((rotation_angle(Quat::from_rotation_x(-0.5)) - 0.5).abs() < 1e-5);
        assert_eq!(rotation_angle(Quat::IDENTITY), 0.0);
    }

    #[test]
    fn missing_rotation_becomes_identity() {
        assert_eq!(sanitize_rotation(Quat::from_xyzw(0.0, 0.0, 0.0, 0.0)), Quat::IDENTITY);
        assert_eq!(sanitize_rotation(Quat::from_xyzw(f32::NAN, 0.0, 0.0, 1.0)), Quat::IDENTITY);
        let scaled = Quat::from_xyzw(0.0, 0.0, 0.0, 3.0);
        assert!(sanitize_rotation(scaled).abs_diff_eq(Quat::IDENTITY, 1e-6));
    }

    #[test]
    fn rotation_between_regular_and_opposite() {
        let q = rotation_between(Vec3::X, Vec3::Z);
        assert!((q * Vec3::X).abs_diff_eq(Vec3::Z, 1e-5));
        assert!((rotation_angle(q) - FRAC_PI_2).abs() < 1e-5);

        for from in [Vec3::X, Vec3::Y, Vec3::Z, Vec3::new(1.0, 2.0, -0.5)] {
            let q = rotation_between(from, -from);
            assert!(q.is_finite());
            assert!((q * from.normalize()).abs_diff_eq(-from.normalize(), 1e-4));
        }
    }

    #[test]
    fn wrap_angle_range() {
        assert!((wrap_angle(3.0 * PI / 2.0) + FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(-3.0 * PI / 2.0) - FRAC_PI_2).abs() < 1e-5);
        assert!((wrap_angle(0.25) - 0.25).abs() < 1e-6);
    }
}
