//! Thrown grenades: kinematic flight, fuse, and area damage.

use favela_common::EntityRef;
use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::world::Geometry;

/// Grenade parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrenadeDef {
    /// Damage at the center of the blast
    pub damage: f32,
    /// Blast radius
    pub radius: f32,
    /// Seconds from throw to detonation
    pub fuse: f32,
    /// Launch speed along the aim direction
    pub throw_force: f32,
    /// Extra upward launch speed
    pub lift: f32,
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    /// Fraction of vertical speed kept on a bounce
    pub restitution: f32,
    /// Fraction of horizontal speed kept on a bounce
    pub friction: f32,
    /// Height above the ground at which the grenade rests
    pub rest_height: f32,
    /// Damage factor applied to the thrower
    pub self_damage: f32,
    /// Grenades carried at spawn
    pub carried: u32,
}

impl Default for GrenadeDef {
    fn default() -> Self {
        Self {
            damage: 150.0,
            radius: 8.0,
            fuse: 2.5,
            throw_force: 25.0,
            lift: 5.0,
            gravity: -20.0,
            restitution: 0.3,
            friction: 0.7,
            rest_height: 0.1,
            self_damage: 0.5,
            carried: 1,
        }
    }
}

/// Linear falloff: `base` at the center, zero at and beyond `radius`.
#[must_use]
pub fn falloff_damage(base: f32, distance: f32, radius: f32) -> f32 {
    if radius <= 0.0 || distance >= radius {
        return 0.0;
    }
    base * (1.0 - distance.max(0.0) / radius)
}

/// Damage dealt by one detonation.
#[derive(Debug, Clone, PartialEq)]
pub struct Explosion {
    /// Blast center
    pub center: Vec3,
    /// Damaged entities and the damage each takes
    pub hits: Vec<(EntityRef, f32)>,
}

/// A grenade in flight.
#[derive(Debug, Clone, PartialEq)]
pub struct Grenade {
    /// Current position
    pub position: Vec3,
    /// Current velocity
    pub velocity: Vec3,
    /// Who threw it
    pub thrower: EntityRef,
    detonate_at: f64,
}

impl Grenade {
    /// Launches a grenade from `origin` along `direction`.
    #[must_use]
    pub fn throw(origin: Vec3, direction: Vec3, def: &GrenadeDef, now: f64, thrower: EntityRef) -> Self {
        Self {
            position: origin,
            velocity: direction.normalize_or_zero() * def.throw_force + Vec3::Y * def.lift,
            thrower,
            detonate_at: now + f64::from(def.fuse),
        }
    }

    /// Returns true once the fuse has run out.
    #[must_use]
    pub fn is_due(&self, now: f64) -> bool {
        now >= self.detonate_at
    }

    /// Integrates one step of flight, bouncing off the ground below.
    pub fn step(&mut self, dt: f32, geometry: &dyn Geometry, def: &GrenadeDef) {
        self.velocity.y += def.gravity * dt;
        self.position += self.velocity * dt;

        let ground = geometry
            .ground_below(self.position + Vec3::Y, 50.0)
            .unwrap_or(0.0);
        let floor = ground + def.rest_height;
        if self.position.y < floor {
            self.position.y = floor;
            self.velocity.y *= -def.restitution;
            self.velocity.x *= def.friction;
            self.velocity.z *= def.friction;
        }
    }

    /// Computes blast damage for every candidate within the radius. The
    /// thrower takes reduced damage.
    pub fn explode<I>(&self, def: &GrenadeDef, candidates: I) -> Explosion
    where
        I: IntoIterator<Item = (EntityRef, Vec3)>,
    {
        let hits = candidates
            .into_iter()
            .filter_map(|(entity, position)| {
                let mut damage = falloff_damage(def.damage, self.position.distance(position), def.radius);
                if entity == self.thrower {
                    damage *= def.self_damage;
                }
                (damage > 0.0).then_some((entity, damage))
            })
            .collect();
        Explosion {
            center: self.position,
            hits,
        }
    }
}
