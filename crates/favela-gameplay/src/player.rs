//! First-person player controller.
//!
//! Provides:
//! - Mouse look with a pitch limit
//! - Walk/run/crouch movement with a wall probe and jump/gravity
//! - Three weapon slots (primary, pistol, knife) with switching
//! - Automatic and semi-automatic fire, recoil, auto-reload on empty
//! - Grenade throwing

use favela_common::{direction_from_yaw_pitch, forward_from_yaw, right_from_yaw, EntityRef, Team};
use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::combat::{self, Hit, Shot};
use crate::config::{BackstabPolicy, PlayerConfig};
use crate::effects::{emit_sound, Effects, SoundKind};
use crate::events::{EventBus, GameEvent};
use crate::grenade::Grenade;
use crate::scene::Scene;
use crate::weapon::{Weapon, WeaponError, WeaponKind, WeaponResult};
use crate::world::Geometry;

/// Height of the wall probe above the feet.
const WALL_PROBE_HEIGHT: f32 = 0.9;

/// Input sampled for one frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerInput {
    /// Forward/backward axis (-1.0 - 1.0)
    pub forward: f32,
    /// Strafe axis, positive to the right (-1.0 - 1.0)
    pub right: f32,
    /// Run modifier held
    pub run: bool,
    /// Crouch held
    pub crouch: bool,
    /// Jump pressed
    pub jump: bool,
    /// Trigger held
    pub trigger: bool,
    /// Trigger went down this frame
    pub trigger_pressed: bool,
    /// Reload pressed
    pub reload: bool,
    /// Grenade throw pressed
    pub throw_grenade: bool,
    /// Slot key pressed (1 - 3)
    pub select_slot: Option<u8>,
    /// Scroll steps through the slots
    pub cycle: i8,
    /// Mouse movement in look units
    pub look: Vec2,
}

/// What the player produced this frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerTick {
    /// Resolved hits of a shot or stab
    pub hits: Vec<Hit>,
    /// A grenade that left the player's hand
    pub grenade: Option<Grenade>,
}

/// The human-controlled combatant.
#[derive(Debug, Clone)]
pub struct Player {
    team: Team,
    config: PlayerConfig,
    backstab: BackstabPolicy,
    position: Vec3,
    velocity_y: f32,
    yaw: f32,
    pitch: f32,
    health: f32,
    kills: u32,
    alive: bool,
    on_ground: bool,
    crouching: bool,
    slots: [Weapon; 3],
    current: usize,
    grenades: u32,
    rng: fastrand::Rng,
}

impl Player {
    /// Creates a player standing at `position` with a full loadout.
    #[must_use]
    pub fn new(team: Team, position: Vec3, config: PlayerConfig, backstab: BackstabPolicy, seed: u64) -> Self {
        let slots = [
            Weapon::new(config.primary),
            Weapon::new(WeaponKind::Pistol),
            Weapon::new(WeaponKind::Knife),
        ];
        Self {
            team,
            health: config.max_health,
            grenades: config.grenade.carried,
            config,
            backstab,
            position,
            velocity_y: 0.0,
            yaw: 0.0,
            pitch: 0.0,
            kills: 0,
            alive: true,
            on_ground: true,
            crouching: false,
            slots,
            current: 0,
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Movement and view tuning.
    #[must_use]
    pub const fn config(&self) -> &PlayerConfig {
        &self.config
    }

    /// Feet position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Eye position, lowered while crouching.
    #[must_use]
    pub fn eye(&self) -> Vec3 {
        let height = if self.crouching {
            self.config.crouch_eye_height
        } else {
            self.config.eye_height
        };
        self.position + Vec3::Y * height
    }

    /// View yaw.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// View pitch.
    #[must_use]
    pub const fn pitch(&self) -> f32 {
        self.pitch
    }

    /// Unit aim direction derived from yaw and pitch.
    #[must_use]
    pub fn aim(&self) -> Vec3 {
        direction_from_yaw_pitch(self.yaw, self.pitch)
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Kill count.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.kills
    }

    /// Returns true until health reaches zero.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.alive
    }

    /// Returns true while standing on something.
    #[must_use]
    pub const fn on_ground(&self) -> bool {
        self.on_ground
    }

    /// Grenades left.
    #[must_use]
    pub const fn grenades(&self) -> u32 {
        self.grenades
    }

    /// Selected slot number (1 - 3).
    #[must_use]
    pub const fn slot(&self) -> u8 {
        self.current as u8 + 1
    }

    /// Weapon in the selected slot.
    #[must_use]
    pub fn weapon(&self) -> &Weapon {
        &self.slots[self.current]
    }

    /// Applies look input.
    pub fn look(&mut self, delta: Vec2) {
        let sensitivity = self.config.mouse_sensitivity;
        self.yaw -= delta.x * sensitivity;
        self.set_pitch(self.pitch - delta.y * sensitivity);
    }

    /// Turns the view to aim at `point`.
    pub fn look_at(&mut self, point: Vec3) {
        let dir = point - self.eye();
        let flat = Vec2::new(dir.x, dir.z).length();
        if flat <= f32::EPSILON && dir.y.abs() <= f32::EPSILON {
            return;
        }
        self.yaw = dir.x.atan2(dir.z);
        self.set_pitch(dir.y.atan2(flat));
    }

    fn set_pitch(&mut self, pitch: f32) {
        let limit = self.config.pitch_limit;
        self.pitch = pitch.clamp(-limit, limit);
    }

    /// Switches to slot 1 - 3, abandoning any reload in progress.
    /// Returns `Ok(false)` if that slot is already selected.
    pub fn select_slot(&mut self, slot: u8) -> WeaponResult<bool> {
        if !(1..=3).contains(&slot) {
            return Err(WeaponError::InvalidSlot(slot));
        }
        let index = usize::from(slot - 1);
        if index == self.current {
            return Ok(false);
        }
        if self.slots[self.current].cancel_reload() {
            debug!("Reload of {} cancelled by weapon switch", self.weapon().kind().name());
        }
        self.current = index;
        debug!("Switched to {}", self.weapon().kind().name());
        Ok(true)
    }

    /// Steps through the slots, wrapping around.
    pub fn cycle_weapon(&mut self, step: i8) {
        let count = self.slots.len() as i32;
        let next = (self.current as i32 + i32::from(step)).rem_euclid(count);
        if let Err(e) = self.select_slot(next as u8 + 1) {
            debug!("{e}");
        }
    }

    /// Restores health up to the maximum.
    pub fn heal(&mut self, amount: f32) {
        if self.alive {
            self.health = (self.health + amount.max(0.0)).min(self.config.max_health);
        }
    }

    /// Counts a kill.
    pub fn add_kill(&mut self) {
        self.kills += 1;
    }

    /// Applies damage. Returns true if this hit killed the player.
    pub fn take_damage(&mut self, amount: f32, events: &EventBus) -> bool {
        if !self.alive {
            return false;
        }
        self.health = (self.health - amount.max(0.0)).max(0.0);
        if self.health <= 0.0 {
            self.alive = false;
            info!("Player died");
            events.publish(GameEvent::PlayerDied);
            return true;
        }
        false
    }

    /// Brings the player back at `position` with full health and loadout.
    pub fn respawn(&mut self, position: Vec3) {
        *self = Self::new(
            self.team,
            position,
            self.config.clone(),
            self.backstab,
            self.rng.u64(..),
        );
    }

    /// Runs one frame of input. Dead players do nothing.
    pub fn update(
        &mut self,
        dt: f32,
        input: &PlayerInput,
        now: f64,
        scene: &Scene<'_>,
        effects: &mut dyn Effects,
    ) -> PlayerTick {
        let mut tick = PlayerTick::default();
        if !self.alive {
            return tick;
        }

        self.look(input.look);
        if let Some(slot) = input.select_slot {
            if let Err(e) = self.select_slot(slot) {
                debug!("{e}");
            }
        }
        if input.cycle != 0 {
            self.cycle_weapon(input.cycle);
        }

        self.crouching = input.crouch;
        self.move_body(dt, input, scene.geometry);

        let weapon = &mut self.slots[self.current];
        if weapon.tick(now) {
            debug!("{} reloaded", weapon.kind().name());
        }
        if input.reload && weapon.start_reload(now) {
            emit_sound(effects, SoundKind::Reload);
        }

        let wants_fire = if weapon.def().automatic {
            input.trigger
        } else {
            input.trigger_pressed
        };
        if wants_fire {
            tick.hits = self.pull_trigger(now, scene, effects);
        }

        let weapon = &mut self.slots[self.current];
        if weapon.is_empty() && weapon.start_reload(now) {
            emit_sound(effects, SoundKind::Reload);
        }

        if input.throw_grenade && self.grenades > 0 {
            self.grenades -= 1;
            tick.grenade = Some(Grenade::throw(
                self.eye(),
                self.aim(),
                &self.config.grenade,
                now,
                EntityRef::Player,
            ));
            debug!("Grenade thrown, {} left", self.grenades);
        }

        tick
    }

    fn pull_trigger(&mut self, now: f64, scene: &Scene<'_>, effects: &mut dyn Effects) -> Vec<Hit> {
        let shot = Shot {
            shooter: EntityRef::Player,
            origin: self.eye(),
            direction: self.aim(),
        };
        let weapon = &mut self.slots[self.current];
        if weapon.is_empty() && !weapon.is_reloading() {
            emit_sound(effects, SoundKind::DryFire);
            return Vec::new();
        }
        if !weapon.can_fire(now) {
            return Vec::new();
        }

        let hits = combat::fire(weapon, now, &shot, scene, &mut self.rng, effects, self.backstab);
        let kick = weapon.recoil(&mut self.rng);
        self.yaw += kick.yaw;
        self.set_pitch(self.pitch + kick.pitch);
        hits
    }

    fn move_body(&mut self, dt: f32, input: &PlayerInput, geometry: &dyn Geometry) {
        let wish = forward_from_yaw(self.yaw) * input.forward + right_from_yaw(self.yaw) * input.right;
        if wish.length_squared() > f32::EPSILON {
            let dir = wish.normalize();
            let base = if input.crouch {
                self.config.crouch_speed
            } else if input.run {
                self.config.run_speed
            } else {
                self.config.walk_speed
            };
            let speed = base * self.weapon().def().move_speed;
            let probe = self.position + Vec3::Y * WALL_PROBE_HEIGHT;
            let blocked = geometry
                .raycast(probe, dir, self.config.wall_probe)
                .is_some_and(|hit| hit.distance < self.config.wall_stop);
            if !blocked {
                self.position += dir * speed * dt;
            }
        }

        if input.jump && self.on_ground {
            self.velocity_y = self.config.jump_speed;
            self.on_ground = false;
        }
        self.velocity_y += self.config.gravity * dt;
        self.position.y += self.velocity_y * dt;

        let ground = geometry.ground_below(self.position + Vec3::Y, self.config.ground_probe);
        match ground {
            Some(height) if self.velocity_y <= 0.0 => {
                self.position.y = height;
                self.velocity_y = 0.0;
                self.on_ground = true;
            },
            _ => self.on_ground = false,
        }
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity_y = 0.0;
            self.on_ground = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::RecordingEffects;
    use crate::scene::{Bodies, HitTarget};
    use crate::world::{Aabb, BoxWorld};
    use favela_common::AgentId;

    fn player() -> Player {
        Player::new(Team::Police, Vec3::ZERO, PlayerConfig::default(), BackstabPolicy::default(), 1)
    }

    fn frame(p: &mut Player, world: &BoxWorld, bodies: &Bodies, input: &PlayerInput, now: f64) -> PlayerTick {
        let scene = Scene::new(world, bodies);
        let mut fx = RecordingEffects::default();
        p.update(1.0 / 60.0, input, now, &scene, &mut fx)
    }

    #[test]
    fn test_walk_speed_scaled_by_weapon() {
        let world = BoxWorld::open_ground();
        let bodies = Bodies::new();
        let mut p = player();
        let input = PlayerInput {
            forward: 1.0,
            ..PlayerInput::default()
        };
        let scene = Scene::new(&world, &bodies);
        let mut fx = RecordingEffects::default();
        p.update(0.5, &input, 0.0, &scene, &mut fx);
        assert!((p.position().z - 8.0 * 0.95 * 0.5).abs() < 1e-4);
        assert!(p.on_ground());
    }

    #[test]
    fn test_wall_stops_movement() {
        let world = BoxWorld::open_ground().with_box(Aabb::new(
            Vec3::new(-5.0, 0.0, 0.3),
            Vec3::new(5.0, 3.0, 1.0),
        ));
        let bodies = Bodies::new();
        let mut p = player();
        let input = PlayerInput {
            forward: 1.0,
            ..PlayerInput::default()
        };
        frame(&mut p, &world, &bodies, &input, 0.0);
        assert!(p.position().z.abs() < 1e-6);
    }

    #[test]
    fn test_jump_and_land() {
        let world = BoxWorld::open_ground();
        let bodies = Bodies::new();
        let mut p = player();
        let jump = PlayerInput {
            jump: true,
            ..PlayerInput::default()
        };
        frame(&mut p, &world, &bodies, &jump, 0.0);
        assert!(p.position().y > 0.0);
        assert!(!p.on_ground());
        for i in 1..120 {
            frame(&mut p, &world, &bodies, &PlayerInput::default(), f64::from(i) / 60.0);
        }
        assert!(p.on_ground());
        assert!(p.position().y.abs() < 1e-6);
    }

    #[test]
    fn test_pitch_is_limited() {
        let mut p = player();
        p.look(Vec2::new(0.0, -100_000.0));
        assert!((p.pitch() - PlayerConfig::default().pitch_limit).abs() < 1e-6);
        p.look(Vec2::new(0.0, 100_000.0));
        assert!((p.pitch() + PlayerConfig::default().pitch_limit).abs() < 1e-6);
    }

    #[test]
    fn test_switch_cancels_reload() {
        let mut p = player();
        p.slots[0] = Weapon::new(WeaponKind::Rifle).with_ammo(3, 90);
        assert!(p.slots[0].start_reload(0.0));
        assert_eq!(p.select_slot(2).ok(), Some(true));
        assert!(!p.slots[0].is_reloading());
        assert_eq!(p.slots[0].ammo(), 3);
        assert_eq!(p.weapon().kind(), WeaponKind::Pistol);
        assert!(matches!(p.select_slot(4), Err(WeaponError::InvalidSlot(4))));
        assert_eq!(p.select_slot(2).ok(), Some(false));
    }

    #[test]
    fn test_cycle_wraps() {
        let mut p = player();
        p.cycle_weapon(-1);
        assert_eq!(p.slot(), 3);
        p.cycle_weapon(1);
        assert_eq!(p.slot(), 1);
        p.cycle_weapon(3);
        assert_eq!(p.slot(), 1);

        p.slots[0] = Weapon::new(WeaponKind::Rifle).with_ammo(3, 90);
        assert!(p.slots[0].start_reload(0.0));
        p.cycle_weapon(1);
        assert_eq!(p.slot(), 2);
        assert!(!p.slots[0].is_reloading());
    }

    #[test]
    fn test_automatic_fire_while_held() {
        let world = BoxWorld::default();
        let mut bodies = Bodies::new();
        bodies.add_agent(AgentId::from_raw(1), Vec3::new(0.0, 0.0, 5.0), 0.0);
        let mut p = player();
        p.look_at(Vec3::new(0.0, 1.0, 5.0));
        let held = PlayerInput {
            trigger: true,
            ..PlayerInput::default()
        };
        let first = frame(&mut p, &world, &bodies, &held, 0.0);
        assert_eq!(first.hits.len(), 1);
        assert!(matches!(first.hits[0].target, HitTarget::Entity(EntityRef::Agent(_), _)));
        frame(&mut p, &world, &bodies, &held, 0.2);
        assert_eq!(p.weapon().ammo(), 28);
    }

    #[test]
    fn test_semi_auto_needs_press() {
        let world = BoxWorld::default();
        let bodies = Bodies::new();
        let mut p = player();
        p.select_slot(2).expect("pistol");
        let held = PlayerInput {
            trigger: true,
            ..PlayerInput::default()
        };
        frame(&mut p, &world, &bodies, &held, 0.0);
        assert_eq!(p.weapon().ammo(), 15);
        let pressed = PlayerInput {
            trigger: true,
            trigger_pressed: true,
            ..PlayerInput::default()
        };
        frame(&mut p, &world, &bodies, &pressed, 1.0);
        assert_eq!(p.weapon().ammo(), 14);
    }

    #[test]
    fn test_auto_reload_when_empty() {
        let world = BoxWorld::default();
        let bodies = Bodies::new();
        let mut p = player();
        p.slots[0] = Weapon::new(WeaponKind::Rifle).with_ammo(1, 90);
        let held = PlayerInput {
            trigger: true,
            ..PlayerInput::default()
        };
        frame(&mut p, &world, &bodies, &held, 0.0);
        assert_eq!(p.weapon().ammo(), 0);
        assert!(p.weapon().is_reloading());
        frame(&mut p, &world, &bodies, &PlayerInput::default(), 2.5);
        assert_eq!(p.weapon().ammo(), 30);
        assert_eq!(p.weapon().reserve(), 60);
    }

    #[test]
    fn test_damage_and_death_notify_once() {
        let events = EventBus::default();
        let mut p = player();
        assert!(!p.take_damage(60.0, &events));
        p.heal(30.0);
        assert!((p.health() - 70.0).abs() < 1e-5);
        p.heal(100.0);
        assert!((p.health() - 100.0).abs() < 1e-5);
        assert!(p.take_damage(150.0, &events));
        assert!(!p.take_damage(10.0, &events));
        assert_eq!(p.health(), 0.0);
        assert_eq!(events.drain(), vec![GameEvent::PlayerDied]);
    }

    #[test]
    fn test_single_grenade() {
        let world = BoxWorld::open_ground();
        let bodies = Bodies::new();
        let mut p = player();
        let throw = PlayerInput {
            throw_grenade: true,
            ..PlayerInput::default()
        };
        assert!(frame(&mut p, &world, &bodies, &throw, 0.0).grenade.is_some());
        assert!(frame(&mut p, &world, &bodies, &throw, 1.0).grenade.is_none());
        assert_eq!(p.grenades(), 0);
    }

    #[test]
    fn test_respawn_restores_loadout() {
        let events = EventBus::default();
        let mut p = player();
        p.add_kill();
        p.take_damage(500.0, &events);
        p.respawn(Vec3::new(3.0, 0.0, 3.0));
        assert!(p.is_alive());
        assert_eq!(p.kills(), 0);
        assert_eq!(p.position(), Vec3::new(3.0, 0.0, 3.0));
    }
}
