//! Kinematic locomotion for agents.
//!
//! There is no physics integrator: horizontal steps are tested with short
//! probes and vertical position is resolved by a ground probe each tick.

use favela_common::{horizontal, horizontal_distance, lerp_angle, yaw_towards, AgentId};
use glam::Vec3;

use crate::world::Geometry;

/// Height of the wall probes above the feet.
pub const PROBE_HEIGHT: f32 = 0.5;
/// Reach of the wall probes.
pub const PROBE_LENGTH: f32 = 0.4;
/// Agents never step to within this distance of one another, though an
/// overlapping pair may still step apart.
pub const PERSONAL_SPACE: f32 = 0.8;
/// Targets closer than this are considered reached.
pub const ARRIVE_EPSILON: f32 = 0.1;
/// Free-fall speed when above the ground.
pub const FALL_SPEED: f32 = 15.0;
/// Feet within this height of the ground snap onto it.
pub const GROUND_SNAP: f32 = 0.1;

const GROUND_PROBE_LIFT: f32 = 1.0;
const GROUND_PROBE_LENGTH: f32 = 50.0;
const PROBE_DIRECTIONS: [Vec3; 4] = [Vec3::X, Vec3::NEG_X, Vec3::Z, Vec3::NEG_Z];

/// Everything a step can collide with.
#[derive(Clone, Copy)]
pub struct Obstacles<'a> {
    /// Static level geometry
    pub geometry: &'a dyn Geometry,
    /// Positions of agents at the start of the tick
    pub neighbours: &'a [(AgentId, Vec3)],
    /// The moving agent, skipped in the neighbour test
    pub mover: Option<AgentId>,
}

impl Obstacles<'_> {
    /// Returns true if a step from `from` to `to` would collide.
    #[must_use]
    pub fn blocks(&self, from: Vec3, to: Vec3) -> bool {
        let probe_origin = to + Vec3::Y * PROBE_HEIGHT;
        let wall = PROBE_DIRECTIONS.iter().any(|dir| {
            self.geometry
                .raycast(probe_origin, *dir, PROBE_LENGTH)
                .is_some()
        });
        if wall {
            return true;
        }
        self.neighbours.iter().any(|(id, other)| {
            let gap = horizontal_distance(to, *other);
            Some(*id) != self.mover && gap < PERSONAL_SPACE && gap < horizontal_distance(from, *other)
        })
    }
}

/// Steps `position` toward `target` on the ground plane and turns `yaw`
/// smoothly toward the direction of travel.
///
/// A blocked step is retried along X only, then Z only, before giving up
/// for this tick. Returns the horizontal distance left to the target.
pub fn move_towards(
    position: &mut Vec3,
    yaw: &mut f32,
    target: Vec3,
    speed: f32,
    rotation_speed: f32,
    dt: f32,
    obstacles: &Obstacles<'_>,
) -> f32 {
    let to_target = horizontal(target - *position);
    let distance = to_target.length();
    if distance <= ARRIVE_EPSILON {
        return distance;
    }

    let dir = to_target / distance;
    let step = dir * (speed * dt).min(distance);
    let attempts = [step, Vec3::new(step.x, 0.0, 0.0), Vec3::new(0.0, 0.0, step.z)];
    for delta in attempts {
        if delta.length_squared() <= f32::EPSILON * f32::EPSILON {
            continue;
        }
        let next = *position + delta;
        if !obstacles.blocks(*position, next) {
            *position = next;
            break;
        }
    }

    *yaw = lerp_angle(*yaw, yaw_towards(dir), dt * rotation_speed);
    horizontal_distance(*position, target)
}

/// Resolves the height of `position` against the ground below it.
pub fn settle_on_ground(position: &mut Vec3, geometry: &dyn Geometry, dt: f32) {
    let probe = *position + Vec3::Y * GROUND_PROBE_LIFT;
    let ground = geometry
        .ground_below(probe, GROUND_PROBE_LENGTH)
        .unwrap_or(0.0);
    if position.y > ground + GROUND_SNAP {
        position.y = (position.y - FALL_SPEED * dt).max(ground);
    } else {
        position.y = ground;
    }
}
