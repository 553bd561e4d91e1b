//! Typed registry of damageable bodies and the combined scene raycast.
//!
//! Bodies are rebuilt from live entities each tick. Dead or removed agents
//! are never registered, so rays can't resolve to them.

use favela_common::{AgentId, EntityRef};
use glam::Vec3;

use crate::world::{Aabb, Geometry};

/// Half width of an agent torso box.
const AGENT_BODY_HALF_X: f32 = 0.3;
/// Half depth of an agent torso box.
const AGENT_BODY_HALF_Z: f32 = 0.25;
/// Height of the top of an agent torso.
const AGENT_BODY_HEIGHT: f32 = 1.4;
/// Height of an agent head center.
const AGENT_HEAD_CENTER: f32 = 1.55;
/// Half size of an agent head box.
const AGENT_HEAD_HALF: f32 = 0.14;
/// Half extents of the player capsule approximation.
const PLAYER_HALF: Vec3 = Vec3::new(0.4, 0.9, 0.4);

/// Part of a body that a ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitRegion {
    /// Torso and limbs
    Body,
    /// Head, eligible for the headshot multiplier
    Head,
}

/// What a scene ray struck.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// Level geometry
    Static,
    /// A damageable entity
    Entity(EntityRef, HitRegion),
}

impl HitTarget {
    /// Returns the struck entity, if any.
    #[must_use]
    pub const fn entity(self) -> Option<EntityRef> {
        match self {
            Self::Entity(entity, _) => Some(entity),
            Self::Static => None,
        }
    }
}

/// Nearest hit of a scene raycast.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Distance from the origin
    pub distance: f32,
    /// Point of impact
    pub point: Vec3,
    /// What was struck
    pub target: HitTarget,
}

/// Which colliders a ray may stop on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RayFilter {
    /// Entity the ray passes through (usually the shooter)
    pub exclude: Option<EntityRef>,
    /// Stop on level geometry
    pub statics: bool,
    /// Stop on agents
    pub agents: bool,
    /// Stop on the player
    pub player: bool,
}

impl RayFilter {
    /// Everything blocks.
    pub const ALL: Self = Self {
        exclude: None,
        statics: true,
        agents: true,
        player: true,
    };

    /// Everything except `entity` blocks.
    #[must_use]
    pub const fn excluding(entity: EntityRef) -> Self {
        Self {
            exclude: Some(entity),
            ..Self::ALL
        }
    }

    fn accepts(&self, owner: EntityRef) -> bool {
        if self.exclude == Some(owner) {
            return false;
        }
        match owner {
            EntityRef::Player => self.player,
            EntityRef::Agent(_) => self.agents,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Hitbox {
    owner: EntityRef,
    region: HitRegion,
    bounds: Aabb,
}

/// Position and facing of a registered entity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    /// Feet position
    pub position: Vec3,
    /// Facing yaw
    pub yaw: f32,
}

/// Hitboxes of all damageable entities for one tick.
#[derive(Debug, Clone, Default)]
pub struct Bodies {
    hitboxes: Vec<Hitbox>,
    poses: Vec<(EntityRef, Pose)>,
}

impl Bodies {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an agent standing at `position`.
    pub fn add_agent(&mut self, id: AgentId, position: Vec3, yaw: f32) {
        let owner = EntityRef::Agent(id);
        let body_center = position + Vec3::Y * (AGENT_BODY_HEIGHT * 0.5);
        self.hitboxes.push(Hitbox {
            owner,
            region: HitRegion::Body,
            bounds: Aabb::from_center(
                body_center,
                Vec3::new(AGENT_BODY_HALF_X, AGENT_BODY_HEIGHT * 0.5, AGENT_BODY_HALF_Z),
            ),
        });
        self.hitboxes.push(Hitbox {
            owner,
            region: HitRegion::Head,
            bounds: Aabb::from_center(
                position + Vec3::Y * AGENT_HEAD_CENTER,
                Vec3::splat(AGENT_HEAD_HALF),
            ),
        });
        self.poses.push((owner, Pose { position, yaw }));
    }

    /// Registers the player standing at `position`.
    pub fn add_player(&mut self, position: Vec3, yaw: f32) {
        self.hitboxes.push(Hitbox {
            owner: EntityRef::Player,
            region: HitRegion::Body,
            bounds: Aabb::from_center(position + Vec3::Y * PLAYER_HALF.y, PLAYER_HALF),
        });
        self.poses.push((EntityRef::Player, Pose { position, yaw }));
    }

    /// Looks up the pose of a registered entity.
    #[must_use]
    pub fn pose(&self, entity: EntityRef) -> Option<Pose> {
        self.poses
            .iter()
            .find(|(owner, _)| *owner == entity)
            .map(|(_, pose)| *pose)
    }

    /// Number of registered entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    fn nearest(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &RayFilter,
    ) -> Option<(f32, EntityRef, HitRegion)> {
        let mut best: Option<(f32, EntityRef, HitRegion)> = None;
        for hitbox in &self.hitboxes {
            if !filter.accepts(hitbox.owner) {
                continue;
            }
            let Some(t) = hitbox.bounds.ray_distance(origin, direction, max_distance) else {
                continue;
            };
            // Heads overlap torsos slightly; a tie goes to the head.
            let better = match best {
                None => true,
                Some((d, _, _)) => t < d || (t == d && hitbox.region == HitRegion::Head),
            };
            if better {
                best = Some((t, hitbox.owner, hitbox.region));
            }
        }
        best
    }
}

/// Static geometry and bodies viewed together for one tick.
#[derive(Clone, Copy)]
pub struct Scene<'a> {
    /// Level colliders
    pub geometry: &'a dyn Geometry,
    /// Damageable bodies
    pub bodies: &'a Bodies,
}

impl<'a> Scene<'a> {
    /// Bundles geometry and bodies.
    #[must_use]
    pub fn new(geometry: &'a dyn Geometry, bodies: &'a Bodies) -> Self {
        Self { geometry, bodies }
    }

    /// See [`raycast`].
    #[must_use]
    pub fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        max_distance: f32,
        filter: &RayFilter,
    ) -> Option<RayHit> {
        raycast(self.geometry, self.bodies, origin, direction, max_distance, filter)
    }
}

/// Casts a ray against static geometry and registered bodies, returning the
/// nearest hit the filter allows.
#[must_use]
pub fn raycast(
    geometry: &dyn Geometry,
    bodies: &Bodies,
    origin: Vec3,
    direction: Vec3,
    max_distance: f32,
    filter: &RayFilter,
) -> Option<RayHit> {
    let direction = direction.normalize_or_zero();
    if direction == Vec3::ZERO {
        return None;
    }

    let static_hit = if filter.statics {
        geometry.raycast(origin, direction, max_distance)
    } else {
        None
    };
    let body_hit = bodies.nearest(origin, direction, max_distance, filter);

    match (static_hit, body_hit) {
        (Some(s), Some((t, owner, region))) if t < s.distance => Some(RayHit {
            distance: t,
            point: origin + direction * t,
            target: HitTarget::Entity(owner, region),
        }),
        (Some(s), _) => Some(RayHit {
            distance: s.distance,
            point: s.point,
            target: HitTarget::Static,
        }),
        (None, Some((t, owner, region))) => Some(RayHit {
            distance: t,
            point: origin + direction * t,
            target: HitTarget::Entity(owner, region),
        }),
        (None, None) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::BoxWorld;

    fn agent(raw: u32) -> AgentId {
        AgentId::from_raw(raw)
    }

    #[test]
    fn test_ray_resolves_agent_by_id() {
        let world = BoxWorld::open_ground();
        let mut bodies = Bodies::new();
        bodies.add_agent(agent(1), Vec3::new(0.0, 0.0, 10.0), 0.0);
        bodies.add_agent(agent(2), Vec3::new(0.0, 0.0, 20.0), 0.0);

        let hit = raycast(&world, &bodies, Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 50.0, &RayFilter::ALL)
            .expect("hit");
        assert_eq!(hit.target, HitTarget::Entity(EntityRef::Agent(agent(1)), HitRegion::Body));
        assert!((hit.distance - 9.75).abs() < 1e-4);
    }

    #[test]
    fn test_head_region() {
        let world = BoxWorld::open_ground();
        let mut bodies = Bodies::new();
        bodies.add_agent(agent(1), Vec3::new(0.0, 0.0, 10.0), 0.0);
        let hit = raycast(&world, &bodies, Vec3::new(0.0, 1.55, 0.0), Vec3::Z, 50.0, &RayFilter::ALL)
            .expect("hit");
        assert_eq!(hit.target, HitTarget::Entity(EntityRef::Agent(agent(1)), HitRegion::Head));
    }

    #[test]
    fn test_wall_blocks_agent() {
        let world = BoxWorld::open_ground().with_box(Aabb::new(
            Vec3::new(-2.0, 0.0, 5.0),
            Vec3::new(2.0, 3.0, 6.0),
        ));
        let mut bodies = Bodies::new();
        bodies.add_agent(agent(1), Vec3::new(0.0, 0.0, 10.0), 0.0);
        let hit = raycast(&world, &bodies, Vec3::new(0.0, 1.0, 0.0), Vec3::Z, 50.0, &RayFilter::ALL)
            .expect("hit");
        assert_eq!(hit.target, HitTarget::Static);
    }

    #[test]
    fn test_filter_excludes_shooter_and_unregistered() {
        let world = BoxWorld::default();
        let mut bodies = Bodies::new();
        bodies.add_player(Vec3::ZERO, 0.0);
        let from_player = raycast(
            &world,
            &bodies,
            Vec3::new(0.0, 1.0, 0.0),
            Vec3::Z,
            50.0,
            &RayFilter::excluding(EntityRef::Player),
        );
        assert!(from_player.is_none());
        assert!(bodies.pose(EntityRef::Agent(agent(3))).is_none());
    }
}
