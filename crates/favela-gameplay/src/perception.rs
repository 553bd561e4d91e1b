//! Sight test between an observer and a target.

use favela_common::{forward_from_yaw, horizontal};
use glam::Vec3;

use crate::world::Geometry;

/// Height above the feet that sight rays aim at.
pub const CHEST_HEIGHT: f32 = 1.2;

/// A blocking hit this close to the target still counts as visible.
pub const SIGHT_TOLERANCE: f32 = 1.0;

/// Who is looking, and how far and wide they can see.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observer {
    /// Feet position
    pub position: Vec3,
    /// Facing yaw
    pub yaw: f32,
    /// Maximum sight distance (inclusive)
    pub view_distance: f32,
    /// Half of the field of view, in degrees
    pub view_half_angle: f32,
    /// Eye height above the feet
    pub eye_height: f32,
}

impl Observer {
    /// World-space eye position.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        self.position + Vec3::Y * self.eye_height
    }
}

/// Returns true if `observer` can see a target standing at `target`.
///
/// Checks run cheapest first: distance, then field of view on the ground
/// plane, then `line_of_sight(eye, chest)`. A target straight above or below
/// the observer counts as inside the field of view.
pub fn can_perceive<F>(observer: &Observer, target: Vec3, line_of_sight: F) -> bool
where
    F: FnOnce(Vec3, Vec3) -> bool,
{
    if observer.position.distance(target) > observer.view_distance {
        return false;
    }

    let to_target = horizontal(target - observer.position);
    if to_target.length_squared() > f32::EPSILON {
        let forward = forward_from_yaw(observer.yaw);
        let cos = forward.dot(to_target.normalize()).clamp(-1.0, 1.0);
        if cos.acos().to_degrees() > observer.view_half_angle {
            return false;
        }
    }

    line_of_sight(observer.eye(), target + Vec3::Y * CHEST_HEIGHT)
}

/// Static-geometry sight line between two points. Bodies never block sight.
#[must_use]
pub fn line_of_sight(geometry: &dyn Geometry, from: Vec3, to: Vec3) -> bool {
    let delta = to - from;
    let distance = delta.length();
    if distance <= f32::EPSILON {
        return true;
    }
    match geometry.raycast(from, delta / distance, distance) {
        None => true,
        Some(hit) => hit.distance > distance - SIGHT_TOLERANCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Aabb, BoxWorld};
    use proptest::prelude::*;

    fn observer() -> Observer {
        Observer {
            position: Vec3::ZERO,
            yaw: 0.0,
            view_distance: 80.0,
            view_half_angle: 75.0,
            eye_height: 1.5,
        }
    }

    #[test]
    fn test_sees_target_ahead() {
        let world = BoxWorld::open_ground();
        let seen = can_perceive(&observer(), Vec3::new(0.0, 0.0, 30.0), |a, b| {
            line_of_sight(&world, a, b)
        });
        assert!(seen);
    }

    #[test]
    fn test_view_distance_is_inclusive() {
        assert!(can_perceive(&observer(), Vec3::new(0.0, 0.0, 80.0), |_, _| true));
        assert!(!can_perceive(&observer(), Vec3::new(0.0, 0.0, 80.01), |_, _| true));
    }

    #[test]
    fn test_target_behind_is_unseen() {
        assert!(!can_perceive(&observer(), Vec3::new(0.0, 0.0, -10.0), |_, _| true));
        // 80 degrees off the facing is outside a 75 degree half angle.
        let off = Vec3::new(80f32.to_radians().sin(), 0.0, 80f32.to_radians().cos()) * 10.0;
        assert!(!can_perceive(&observer(), off, |_, _| true));
        let inside = Vec3::new(70f32.to_radians().sin(), 0.0, 70f32.to_radians().cos()) * 10.0;
        assert!(can_perceive(&observer(), inside, |_, _| true));
    }

    #[test]
    fn test_wall_blocks_sight() {
        let world = BoxWorld::open_ground().with_box(Aabb::new(
            Vec3::new(-3.0, 0.0, 10.0),
            Vec3::new(3.0, 4.0, 11.0),
        ));
        let seen = can_perceive(&observer(), Vec3::new(0.0, 0.0, 30.0), |a, b| {
            line_of_sight(&world, a, b)
        });
        assert!(!seen);
    }

    #[test]
    fn test_geometry_near_target_is_tolerated() {
        // Low crate half a unit in front of the target.
        let world = BoxWorld::default().with_box(Aabb::new(
            Vec3::new(-1.0, 0.0, 29.5),
            Vec3::new(1.0, 5.0, 29.8),
        ));
        let seen = can_perceive(&observer(), Vec3::new(0.0, 0.0, 30.0), |a, b| {
            line_of_sight(&world, a, b)
        });
        assert!(seen);
    }

    proptest! {
        #[test]
        fn prop_beyond_view_distance_never_seen(
            extra in 0.01f32..500.0,
            yaw in -3.0f32..3.0,
            angle in -3.0f32..3.0,
        ) {
            let mut obs = observer();
            obs.yaw = yaw;
            let dir = Vec3::new(angle.sin(), 0.0, angle.cos());
            let target = dir * (obs.view_distance + extra);
            prop_assert!(!can_perceive(&obs, target, |_, _| true));
        }
    }
}
