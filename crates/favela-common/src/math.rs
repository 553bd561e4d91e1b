//! Orientation helpers.
//!
//! World space is Y-up. A yaw of zero faces +Z and the forward vector for a
//! yaw is `(sin yaw, 0, cos yaw)`.

use glam::Vec3;
use std::f32::consts::{PI, TAU};

/// Horizontal unit vector an entity with the given yaw is facing.
#[must_use]
pub fn forward_from_yaw(yaw: f32) -> Vec3 {
    Vec3::new(yaw.sin(), 0.0, yaw.cos())
}

/// Horizontal unit vector to the right of the given yaw.
#[must_use]
pub fn right_from_yaw(yaw: f32) -> Vec3 {
    forward_from_yaw(yaw).cross(Vec3::Y)
}

/// Unit view direction for a yaw/pitch pair (pitch positive looks up).
#[must_use]
pub fn direction_from_yaw_pitch(yaw: f32, pitch: f32) -> Vec3 {
    let (sp, cp) = pitch.sin_cos();
    Vec3::new(yaw.sin() * cp, sp, yaw.cos() * cp)
}

/// Yaw that faces along `direction` (vertical component ignored).
#[must_use]
pub fn yaw_towards(direction: Vec3) -> f32 {
    direction.x.atan2(direction.z)
}

/// Drops the vertical component.
#[must_use]
pub fn horizontal(v: Vec3) -> Vec3 {
    Vec3::new(v.x, 0.0, v.z)
}

/// Distance between two points on the ground plane.
#[must_use]
pub fn horizontal_distance(a: Vec3, b: Vec3) -> f32 {
    horizontal(b - a).length()
}

/// Wraps an angle into `(-PI, PI]`.
#[must_use]
pub fn wrap_angle(angle: f32) -> f32 {
    let wrapped = (angle + PI).rem_euclid(TAU) - PI;
    if wrapped <= -PI {
        wrapped + TAU
    } else {
        wrapped
    }
}

/// Moves `from` toward `to` along the shortest arc by fraction `t` (clamped to 0..=1).
#[must_use]
pub fn lerp_angle(from: f32, to: f32, t: f32) -> f32 {
    wrap_angle(from + wrap_angle(to - from) * t.clamp(0.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_forward_and_yaw_agree() {
        let dir = Vec3::new(1.0, 0.0, 1.0).normalize();
        let yaw = yaw_towards(dir);
        assert!((forward_from_yaw(yaw) - dir).length() < 1e-5);
        assert!((forward_from_yaw(0.0) - Vec3::Z).length() < 1e-6);
    }

    #[test]
    fn test_right_is_perpendicular() {
        let yaw = 0.7;
        assert!(forward_from_yaw(yaw).dot(right_from_yaw(yaw)).abs() < 1e-6);
        assert!((right_from_yaw(yaw).length() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_lerp_angle_takes_short_way() {
        let from = PI - 0.1;
        let to = -PI + 0.1;
        let mid = lerp_angle(from, to, 0.5);
        assert!((mid.abs() - PI).abs() < 1e-4);
    }

    #[test]
    fn test_horizontal_distance_ignores_height() {
        let a = Vec3::new(0.0, 0.0, 0.0);
        let b = Vec3::new(3.0, 10.0, 4.0);
        assert!((horizontal_distance(a, b) - 5.0).abs() < 1e-6);
    }

    proptest! {
        #[test]
        fn prop_wrap_angle_in_range(angle in -100.0f32..100.0) {
            let w = wrap_angle(angle);
            prop_assert!(w > -PI - 1e-4 && w <= PI + 1e-4);
        }
    }
}
