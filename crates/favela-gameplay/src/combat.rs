//! Combat resolution shared by the player, agents and grenades.
//!
//! Provides:
//! - Hitscan firing with per-pellet spread
//! - Melee strikes with backstab detection
//! - Distance falloff for agent fire and return fire
//! - Headshot scaling

use favela_common::{forward_from_yaw, horizontal, EntityRef};
use glam::Vec3;
use tracing::trace;

use crate::config::BackstabPolicy;
use crate::effects::{emit_sound, emit_visual, Anchor, Effects, SoundKind, VisualKind};
use crate::scene::{HitRegion, HitTarget, RayFilter, Scene};
use crate::weapon::{Weapon, WeaponDef};

/// Dot product above which a melee strike counts as a backstab.
pub const BACKSTAB_DOT: f32 = 0.5;

/// Accuracy never drops below this for return fire.
pub const RETURN_FIRE_MIN_ACCURACY: f32 = 0.2;

/// One resolved ray of a shot.
///
/// `damage` is the weapon's base damage for this ray; the headshot
/// multiplier is applied by the receiver.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// What was struck
    pub target: HitTarget,
    /// Point of impact
    pub point: Vec3,
    /// Distance from the shot origin
    pub distance: f32,
    /// Damage carried by this hit
    pub damage: f32,
}

impl Hit {
    /// Struck entity, if not level geometry.
    #[must_use]
    pub const fn entity(&self) -> Option<EntityRef> {
        self.target.entity()
    }

    /// Struck region (`Body` for static hits).
    #[must_use]
    pub const fn region(&self) -> HitRegion {
        match self.target {
            HitTarget::Entity(_, region) => region,
            HitTarget::Static => HitRegion::Body,
        }
    }
}

/// Origin and aim of a shot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Shot {
    /// Who is shooting; rays pass through them
    pub shooter: EntityRef,
    /// Muzzle or eye position
    pub origin: Vec3,
    /// Aim direction
    pub direction: Vec3,
}

/// Perturbs `direction` by a random offset inside a disc of radius `spread`
/// on the plane perpendicular to it.
pub fn spread_direction(direction: Vec3, spread: f32, rng: &mut fastrand::Rng) -> Vec3 {
    let forward = direction.normalize_or_zero();
    if spread <= 0.0 || forward == Vec3::ZERO {
        return forward;
    }
    let helper = if forward.y.abs() < 0.99 { Vec3::Y } else { Vec3::X };
    let right = forward.cross(helper).normalize();
    let up = right.cross(forward);
    let radius = spread * rng.f32().sqrt();
    let theta = rng.f32() * std::f32::consts::TAU;
    (forward + right * (radius * theta.cos()) + up * (radius * theta.sin())).normalize()
}

/// Casts one ray per pellet and returns the nearest hit of each.
pub fn hitscan(def: &WeaponDef, shot: &Shot, scene: &Scene<'_>, rng: &mut fastrand::Rng) -> Vec<Hit> {
    let filter = RayFilter::excluding(shot.shooter);
    (0..def.pellets.max(1))
        .filter_map(|_| {
            let dir = spread_direction(shot.direction, def.spread, rng);
            scene.raycast(shot.origin, dir, def.range, &filter)
        })
        .map(|ray| Hit {
            target: ray.target,
            point: ray.point,
            distance: ray.distance,
            damage: def.damage,
        })
        .collect()
}

/// Returns true if a strike from `attacker` on a defender at `defender`
/// with yaw `defender_yaw` scores as a backstab.
///
/// The reversed attack vector (defender to attacker, horizontal) is dotted
/// with the defender's forward and must exceed [`BACKSTAB_DOT`].
#[must_use]
pub fn is_backstab(attacker: Vec3, defender: Vec3, defender_yaw: f32) -> bool {
    let reversed = horizontal(attacker - defender).normalize_or_zero();
    forward_from_yaw(defender_yaw).dot(reversed) > BACKSTAB_DOT
}

/// Single short ray that only damages agents. Level geometry blocks it.
pub fn melee(def: &WeaponDef, shot: &Shot, scene: &Scene<'_>, policy: BackstabPolicy) -> Option<Hit> {
    let filter = RayFilter {
        exclude: Some(shot.shooter),
        statics: true,
        agents: true,
        player: false,
    };
    let ray = scene.raycast(shot.origin, shot.direction, def.range, &filter)?;
    let entity = ray.target.entity()?;
    let pose = scene.bodies.pose(entity)?;

    let damage = if is_backstab(shot.origin, pose.position, pose.yaw) {
        trace!("Backstab on {entity}");
        policy.apply(def.damage)
    } else {
        def.damage
    };

    Some(Hit {
        target: ray.target,
        point: ray.point,
        distance: ray.distance,
        damage,
    })
}

/// Fires `weapon` if it may fire at `now`, emitting cues and returning the
/// resolved hits. Returns nothing when gated.
pub fn fire(
    weapon: &mut Weapon,
    now: f64,
    shot: &Shot,
    scene: &Scene<'_>,
    rng: &mut fastrand::Rng,
    effects: &mut dyn Effects,
    backstab: BackstabPolicy,
) -> Vec<Hit> {
    if !weapon.trigger(now) {
        return Vec::new();
    }

    if weapon.kind().is_melee() {
        emit_sound(effects, SoundKind::Slash);
        return melee(weapon.def(), shot, scene, backstab).into_iter().collect();
    }

    emit_visual(effects, VisualKind::MuzzleFlash, Anchor::Entity(shot.shooter));
    emit_sound(effects, SoundKind::Shoot);
    let hits = hitscan(weapon.def(), shot, scene, rng);
    for hit in hits.iter().filter(|h| h.target == HitTarget::Static) {
        emit_visual(effects, VisualKind::ImpactDecal, Anchor::Point(hit.point));
    }
    hits
}

/// Applies the headshot multiplier to damage landing on `region`.
#[must_use]
pub fn scaled_damage(amount: f32, region: HitRegion, headshot_multiplier: f32) -> f32 {
    match region {
        HitRegion::Head => amount * headshot_multiplier,
        HitRegion::Body => amount,
    }
}

/// Damage of an agent's aimed shot after distance falloff.
#[must_use]
pub fn agent_shot_damage(base: f32, distance: f32) -> f32 {
    if distance > 30.0 {
        base * 0.5
    } else if distance > 20.0 {
        base * 0.7
    } else {
        base
    }
}

/// Hit chance of a wounded agent firing back blindly.
#[must_use]
pub fn return_fire_accuracy(base: f32, distance: f32) -> f32 {
    let mut accuracy = base;
    if distance > 30.0 {
        accuracy *= 0.7;
    }
    if distance > 50.0 {
        accuracy *= 0.6;
    }
    if distance > 70.0 {
        accuracy *= 0.5;
    }
    accuracy.max(RETURN_FIRE_MIN_ACCURACY)
}

/// Damage of a return-fire shot.
#[must_use]
pub fn return_fire_damage(base: f32, distance: f32) -> f32 {
    let mut damage = base;
    if distance > 30.0 {
        damage *= 0.8;
    }
    if distance > 50.0 {
        damage *= 0.7;
    }
    damage
}
