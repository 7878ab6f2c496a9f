//! Shared Geometry Helpers
//!
//! All director geometry happens on the ground plane (XZ); height is ignored.

use bevy::math::{Quat, Vec3};
use smallvec::SmallVec;

use super::constants::CONE_ANGLE_EPSILON_DEGREES;

/// Project a vector onto the ground plane.
pub fn flatten(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Ground-plane distance between two points.
pub fn flat_distance(a: Vec3, b: Vec3) -> f32 {
    flatten(b - a).length()
}

/// Normalized ground-plane direction from `from` to `to`, or zero if they coincide.
pub fn flat_direction(from: Vec3, to: Vec3) -> Vec3 {
    flatten(to - from).normalize_or_zero()
}

/// Rotate a ground-plane direction by `degrees` around the up axis.
pub fn rotate_flat(direction: Vec3, degrees: f32) -> Vec3 {
    Quat::from_rotation_y(degrees.to_radians()) * direction
}

/// Cone acceptance test.
///
/// An entity is inside when it is in front of the caster (positive dot product
/// between the captured direction and the normalized vector to the entity) and
/// the angle between the two is at most half the arc. The boundary is inclusive.
pub fn in_cone(direction: Vec3, to_entity: Vec3, arc_degrees: f32) -> bool {
    let direction = flatten(direction).normalize_or_zero();
    let to_entity = flatten(to_entity).normalize_or_zero();
    if direction == Vec3::ZERO || to_entity == Vec3::ZERO {
        return false;
    }

    let dot = direction.dot(to_entity);
    if dot <= 0.0 {
        return false;
    }

    let angle = dot.clamp(-1.0, 1.0).acos().to_degrees();
    angle <= arc_degrees * 0.5 + CONE_ANGLE_EPSILON_DEGREES
}

/// Evenly spaced projectile angles (degrees) across `spread_degrees`, centered on 0.
///
/// One projectile always flies at 0 regardless of spread; N projectiles span
/// -half to +half in equal steps.
pub fn spread_angles(count: u32, spread_degrees: f32) -> SmallVec<[f32; 8]> {
    match count {
        0 => SmallVec::new(),
        1 => smallvec::smallvec![0.0],
        n => {
            let half = spread_degrees * 0.5;
            let step = spread_degrees / (n - 1) as f32;
            (0..n).map(|i| -half + step * i as f32).collect()
        }
    }
}

/// Danger radius of a channel telegraph that grows linearly from 0 to `max_radius`.
pub fn danger_radius(max_radius: f32, elapsed: f32, duration: f32) -> f32 {
    if duration <= 0.0 {
        return max_radius;
    }
    max_radius * (elapsed / duration).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_projectile_flies_straight() {
        assert_eq!(spread_angles(1, 90.0).as_slice(), &[0.0]);
        assert_eq!(spread_angles(1, 0.0).as_slice(), &[0.0]);
    }

    #[test]
    fn test_spread_angles_are_symmetric() {
        let angles = spread_angles(5, 60.0);
        assert_eq!(angles.as_slice(), &[-30.0, -15.0, 0.0, 15.0, 30.0]);
        assert!(spread_angles(0, 60.0).is_empty());
    }

    #[test]
    fn test_cone_excludes_entities_behind() {
        // Even a full-circle arc never accepts what is behind the caster
        assert!(!in_cone(Vec3::Z, -Vec3::Z, 360.0));
        assert!(!in_cone(Vec3::Z, Vec3::X, 360.0));
    }

    #[test]
    fn test_danger_radius_grows_linearly() {
        assert_eq!(danger_radius(10.0, 0.0, 4.0), 0.0);
        assert_eq!(danger_radius(10.0, 2.0, 4.0), 5.0);
        assert_eq!(danger_radius(10.0, 8.0, 4.0), 10.0);
        assert_eq!(danger_radius(10.0, 0.0, 0.0), 10.0);
    }

    #[test]
    fn test_flat_distance_ignores_height() {
        let a = Vec3::new(0.0, 5.0, 0.0);
        let b = Vec3::new(3.0, -2.0, 4.0);
        assert!((flat_distance(a, b) - 5.0).abs() < 1e-5);
    }
}
