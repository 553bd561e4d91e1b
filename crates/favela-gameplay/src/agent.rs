//! NPC agents and their behaviour state machine.
//!
//! Each agent walks a patrol route, reacts to sighting the player after a
//! short delay, investigates alerts, engages, and gives chase when it loses
//! sight. Taking damage latches the agent into permanent aggro.
//!
//! Deferred actions (reaction delay, patrol pauses, alert cool-down, corpse
//! fade) are stored as deadlines on the agent and evaluated at the start of
//! each tick. Dying clears every pending deadline.

use favela_common::{
    forward_from_yaw, horizontal, right_from_yaw, yaw_towards, AgentId, EntityRef, Team,
};
use glam::Vec3;
use std::f32::consts::TAU;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::combat::{agent_shot_damage, return_fire_accuracy, return_fire_damage, scaled_damage};
use crate::config::{AgentProfile, CombatConfig};
use crate::effects::{emit_sound, emit_visual, Anchor, Effects, SoundKind, VisualKind};
use crate::events::{EventBus, GameEvent};
use crate::movement::{move_towards, settle_on_ground, Obstacles, ARRIVE_EPSILON};
use crate::perception::{can_perceive, line_of_sight, Observer, CHEST_HEIGHT};
use crate::scene::HitRegion;
use crate::world::Geometry;

/// Error types for NPC operations.
#[derive(Debug, Error)]
pub enum NpcError {
    /// No agent with this id exists
    #[error("NPC not found: {0}")]
    NotFound(AgentId),
}

/// Result type for NPC operations.
pub type NpcResult<T> = Result<T, NpcError>;

/// Patrol points are within this distance of reaching.
const PATROL_ARRIVE: f32 = 1.0;
/// Last-known positions are within this distance of reaching.
const SEARCH_ARRIVE: f32 = 2.0;
/// Return fire closer than this shows no muzzle flash.
const RETURN_FLASH_MIN_DISTANCE: f32 = 4.0;

/// Behaviour state of an agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AgentState {
    /// Standing still. Reacts to sightings like a patroller.
    Idle,
    /// Walking the patrol route
    Patrol,
    /// Investigating a suspicious position
    Alert,
    /// Pursuing a target that was lost
    Chase,
    /// Engaging a target
    Combat,
    /// Terminal
    Dead,
}

impl AgentState {
    /// Lowercase name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Patrol => "patrol",
            Self::Alert => "alert",
            Self::Chase => "chase",
            Self::Combat => "combat",
            Self::Dead => "dead",
        }
    }
}

/// Player state sampled once for a whole tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetSnapshot {
    /// Feet position
    pub position: Vec3,
    /// Dead targets are invisible
    pub alive: bool,
}

/// Collaborators and clock handed to agents for one tick.
pub struct CombatContext<'a> {
    /// Static level colliders
    pub geometry: &'a dyn Geometry,
    /// Audio/visual cue sink
    pub effects: &'a mut dyn Effects,
    /// Round notifications
    pub events: &'a EventBus,
    /// Combat tuning
    pub config: &'a CombatConfig,
    /// Current game time in seconds
    pub now: f64,
}

/// Result of damage applied to a live agent.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed
    pub dealt: f32,
    /// The hit was lethal
    pub killed: bool,
    /// Damage of the return shot, if it hit
    pub return_fire: Option<f32>,
}

#[derive(Debug, Clone, Default)]
struct Timers {
    engage_at: Option<f64>,
    patrol_resume_at: Option<f64>,
    alert_expires_at: Option<f64>,
    fade_at: Option<f64>,
    remove_at: Option<f64>,
}

fn take_due(deadline: &mut Option<f64>, now: f64) -> bool {
    match *deadline {
        Some(at) if now >= at => {
            *deadline = None;
            true
        },
        _ => false,
    }
}

/// An NPC combatant.
#[derive(Debug, Clone)]
pub struct Agent {
    id: AgentId,
    team: Team,
    index: usize,
    profile: AgentProfile,
    position: Vec3,
    yaw: f32,
    health: f32,
    state: AgentState,
    aggro: bool,
    collidable: bool,
    last_known: Option<Vec3>,
    last_seen_at: Option<f64>,
    last_fire: Option<f64>,
    strafe_target: Option<Vec3>,
    patrol: Vec<Vec3>,
    patrol_index: usize,
    timers: Timers,
    rng: fastrand::Rng,
}

impl Agent {
    /// Creates an agent at `spawn` with a patrol route of 3 to 5 points
    /// spread evenly by angle, 5 to 15 units away.
    #[must_use]
    pub fn new(id: AgentId, team: Team, index: usize, spawn: Vec3, profile: AgentProfile, seed: u64) -> Self {
        let mut rng = fastrand::Rng::with_seed(seed);
        let count = rng.usize(3..=5);
        let patrol = (0..count)
            .map(|i| {
                let angle = i as f32 / count as f32 * TAU;
                let distance = 5.0 + rng.f32() * 10.0;
                spawn + Vec3::new(angle.cos() * distance, 0.0, angle.sin() * distance)
            })
            .collect();
        let yaw = rng.f32() * TAU;

        Self {
            id,
            team,
            index,
            health: profile.max_health,
            profile,
            position: spawn,
            yaw,
            state: AgentState::Patrol,
            aggro: false,
            collidable: true,
            last_known: None,
            last_seen_at: None,
            last_fire: None,
            strafe_target: None,
            patrol,
            patrol_index: 0,
            timers: Timers::default(),
            rng,
        }
    }

    /// Agent id.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Team.
    #[must_use]
    pub const fn team(&self) -> Team {
        self.team
    }

    /// Spawn order within the team.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Feet position.
    #[must_use]
    pub const fn position(&self) -> Vec3 {
        self.position
    }

    /// Facing yaw.
    #[must_use]
    pub const fn yaw(&self) -> f32 {
        self.yaw
    }

    /// Facing direction.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        forward_from_yaw(self.yaw)
    }

    /// Remaining health.
    #[must_use]
    pub const fn health(&self) -> f32 {
        self.health
    }

    /// Perception and weapon parameters.
    #[must_use]
    pub const fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    /// Behaviour state.
    #[must_use]
    pub const fn state(&self) -> AgentState {
        self.state
    }

    /// Returns true until the agent dies.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.state != AgentState::Dead
    }

    /// Returns true once the agent has been damaged.
    #[must_use]
    pub const fn is_aggro(&self) -> bool {
        self.aggro
    }

    /// Returns false once the corpse no longer blocks movement or rays.
    #[must_use]
    pub const fn is_collidable(&self) -> bool {
        self.collidable
    }

    /// Where the agent last knew its target to be.
    #[must_use]
    pub const fn last_known(&self) -> Option<Vec3> {
        self.last_known
    }

    /// Patrol route.
    #[must_use]
    pub fn patrol_route(&self) -> &[Vec3] {
        &self.patrol
    }

    /// Index of the patrol point being walked to.
    #[must_use]
    pub const fn patrol_index(&self) -> usize {
        self.patrol_index
    }

    /// Places the agent, e.g. when restoring a scenario.
    pub fn teleport(&mut self, position: Vec3, yaw: f32) {
        self.position = position;
        self.yaw = yaw;
    }

    /// Runs one tick of behaviour. Returns the damage of a shot that hit the
    /// target, if any. Dead agents do nothing.
    pub fn update(
        &mut self,
        dt: f32,
        target: TargetSnapshot,
        neighbours: &[(AgentId, Vec3)],
        ctx: &mut CombatContext<'_>,
    ) -> Option<f32> {
        if !self.is_alive() {
            return None;
        }

        self.run_timers(ctx);

        let geometry = ctx.geometry;
        let sees = target.alive && self.perceives(target.position, geometry);
        if sees {
            self.last_known = Some(target.position);
            self.last_seen_at = Some(ctx.now);
        }

        let obstacles = Obstacles {
            geometry,
            neighbours,
            mover: Some(self.id),
        };

        let shot = match self.state {
            AgentState::Idle | AgentState::Patrol => {
                self.patrol_step(dt, sees, &obstacles, ctx);
                None
            },
            AgentState::Alert => {
                self.alert_step(dt, sees, &obstacles, ctx);
                None
            },
            AgentState::Chase => {
                self.chase_step(dt, sees, target, &obstacles, ctx);
                None
            },
            AgentState::Combat => self.combat_step(dt, sees, target, &obstacles, ctx),
            AgentState::Dead => None,
        };

        settle_on_ground(&mut self.position, geometry, dt);
        shot
    }

    /// Returns true if this agent can see a target standing at `target`.
    #[must_use]
    pub fn perceives(&self, target: Vec3, geometry: &dyn Geometry) -> bool {
        let observer = Observer {
            position: self.position,
            yaw: self.yaw,
            view_distance: self.profile.view_distance,
            view_half_angle: self.profile.view_half_angle(),
            eye_height: self.profile.eye_height,
        };
        can_perceive(&observer, target, |eye, chest| line_of_sight(geometry, eye, chest))
    }

    /// Switches a patrolling or idle agent to Alert toward `spot`. Returns
    /// false for agents in any other state.
    pub fn alert(&mut self, spot: Vec3) -> bool {
        if !matches!(self.state, AgentState::Patrol | AgentState::Idle) {
            return false;
        }
        self.last_known = Some(spot);
        self.timers.patrol_resume_at = None;
        self.enter(AgentState::Alert);
        true
    }

    /// Applies `amount` damage from an attacker standing at `attacker`.
    ///
    /// Returns `None` and changes nothing if the agent is already dead.
    /// Negative amounts count as zero damage. A survivor latches aggro, switches to Combat, turns to the attacker
    /// and fires back at once.
    pub fn take_damage(
        &mut self,
        amount: f32,
        region: HitRegion,
        attacker: Vec3,
        ctx: &mut CombatContext<'_>,
    ) -> Option<DamageOutcome> {
        if !self.is_alive() {
            warn!("{} took {amount} damage while dead; ignored", self.id);
            return None;
        }

        let before = self.health;
        let damage = scaled_damage(amount, region, ctx.config.headshot_multiplier).max(0.0);
        self.health = (self.health - damage).max(0.0);
        let dealt = before - self.health;
        emit_visual(ctx.effects, VisualKind::HitFlash, Anchor::Entity(EntityRef::Agent(self.id)));
        self.last_known = Some(attacker);

        if self.health <= 0.0 {
            self.die(ctx);
            return Some(DamageOutcome {
                dealt,
                killed: true,
                return_fire: None,
            });
        }

        self.aggro = true;
        self.last_seen_at = Some(ctx.now);
        self.timers.engage_at = None;
        self.timers.patrol_resume_at = None;
        self.enter(AgentState::Combat);
        self.face(attacker);
        let return_fire = self.fire_back(attacker, ctx);

        Some(DamageOutcome {
            dealt,
            killed: false,
            return_fire,
        })
    }

    /// Advances corpse timers. Returns true when the agent should be removed.
    pub fn tick_corpse(&mut self, now: f64, effects: &mut dyn Effects) -> bool {
        if self.is_alive() {
            return false;
        }
        if take_due(&mut self.timers.fade_at, now) {
            emit_visual(effects, VisualKind::DeathFade, Anchor::Entity(EntityRef::Agent(self.id)));
        }
        take_due(&mut self.timers.remove_at, now)
    }

    fn die(&mut self, ctx: &mut CombatContext<'_>) {
        self.state = AgentState::Dead;
        self.health = 0.0;
        self.collidable = false;
        self.strafe_target = None;
        let linger = f64::from(ctx.config.corpse_linger);
        self.timers = Timers {
            fade_at: Some(ctx.now + linger),
            remove_at: Some(ctx.now + linger + f64::from(ctx.config.corpse_fade)),
            ..Timers::default()
        };
        info!("{} ({}) killed", self.id, self.team);
        ctx.events.publish(GameEvent::AgentDied {
            agent: self.id,
            team: self.team,
        });
    }

    fn enter(&mut self, next: AgentState) {
        if self.state == next {
            return;
        }
        debug!("{}: {} -> {}", self.id, self.state.name(), next.name());
        self.state = next;
        self.strafe_target = None;
        self.timers.alert_expires_at = None;
    }

    fn run_timers(&mut self, ctx: &CombatContext<'_>) {
        let now = ctx.now;

        if take_due(&mut self.timers.engage_at, now)
            && matches!(self.state, AgentState::Idle | AgentState::Patrol | AgentState::Alert)
        {
            self.enter(AgentState::Combat);
        }

        if take_due(&mut self.timers.patrol_resume_at, now) && !self.patrol.is_empty() {
            self.patrol_index = (self.patrol_index + 1) % self.patrol.len();
        }

        if take_due(&mut self.timers.alert_expires_at, now)
            && self.state == AgentState::Alert
            && !self.aggro
        {
            self.enter(AgentState::Patrol);
        }
    }

    fn step_towards(&mut self, target: Vec3, speed: f32, dt: f32, obstacles: &Obstacles<'_>) -> f32 {
        move_towards(
            &mut self.position,
            &mut self.yaw,
            target,
            speed,
            self.profile.rotation_speed,
            dt,
            obstacles,
        )
    }

    fn face(&mut self, point: Vec3) {
        let dir = horizontal(point - self.position);
        if dir.length_squared() > f32::EPSILON {
            self.yaw = yaw_towards(dir);
        }
    }

    fn patrol_step(&mut self, dt: f32, sees: bool, obstacles: &Obstacles<'_>, ctx: &CombatContext<'_>) {
        if sees && self.timers.engage_at.is_none() {
            self.timers.engage_at = Some(ctx.now + f64::from(self.profile.reaction_time));
            debug!("{} spotted target", self.id);
        }

        if self.state == AgentState::Idle || self.timers.patrol_resume_at.is_some() {
            return;
        }
        let Some(point) = self.patrol.get(self.patrol_index).copied() else {
            return;
        };

        let speed = self.profile.speed * ctx.config.speeds.patrol;
        if self.step_towards(point, speed, dt, obstacles) < PATROL_ARRIVE {
            let (min, max) = (ctx.config.patrol_wait_min, ctx.config.patrol_wait_max);
            let wait = min + self.rng.f32() * (max - min).max(0.0);
            self.timers.patrol_resume_at = Some(ctx.now + f64::from(wait));
        }
    }

    fn alert_step(&mut self, dt: f32, sees: bool, obstacles: &Obstacles<'_>, ctx: &CombatContext<'_>) {
        if self.aggro || sees {
            self.enter(AgentState::Combat);
            return;
        }

        let spot = self.last_known.unwrap_or(self.position);
        let speed = self.profile.speed * ctx.config.speeds.alert;
        if self.step_towards(spot, speed, dt, obstacles) < SEARCH_ARRIVE && self.timers.alert_expires_at.is_none() {
            self.timers.alert_expires_at = Some(ctx.now + f64::from(ctx.config.alert_cooldown));
        }
    }

    fn chase_step(
        &mut self,
        dt: f32,
        sees: bool,
        target: TargetSnapshot,
        obstacles: &Obstacles<'_>,
        ctx: &CombatContext<'_>,
    ) {
        if self.aggro {
            self.enter(AgentState::Combat);
            return;
        }

        let speed = self.profile.speed;
        if sees {
            if self.position.distance(target.position) < ctx.config.ranges.chase_engage {
                self.enter(AgentState::Combat);
            } else {
                self.step_towards(target.position, speed, dt, obstacles);
            }
            return;
        }

        let spot = self.last_known.unwrap_or(self.position);
        if self.step_towards(spot, speed, dt, obstacles) < SEARCH_ARRIVE {
            self.enter(AgentState::Alert);
        }
    }

    fn combat_step(
        &mut self,
        dt: f32,
        sees: bool,
        target: TargetSnapshot,
        obstacles: &Obstacles<'_>,
        ctx: &mut CombatContext<'_>,
    ) -> Option<f32> {
        let config = ctx.config;
        let ranges = &config.ranges;
        let speeds = &config.speeds;
        let speed = self.profile.speed;

        if self.aggro && target.alive {
            self.last_known = Some(target.position);
        }

        if !sees {
            if self.aggro {
                self.step_towards(target.position, speed * speeds.hunt, dt, obstacles);
                let distance = self.position.distance(target.position);
                let eye = self.position + Vec3::Y * self.profile.eye_height;
                let chest = target.position + Vec3::Y * CHEST_HEIGHT;
                if target.alive && distance <= ranges.aggro_fire && line_of_sight(ctx.geometry, eye, chest) {
                    self.face(target.position);
                    return self.try_fire(distance, ctx);
                }
                return None;
            }

            let lost_for = self.last_seen_at.map_or(f64::INFINITY, |at| ctx.now - at);
            if lost_for > f64::from(config.lost_target_timeout) {
                self.enter(AgentState::Chase);
            } else {
                let spot = self.last_known.unwrap_or(self.position);
                self.step_towards(spot, speed, dt, obstacles);
            }
            return None;
        }

        let distance = self.position.distance(target.position);
        if distance > ranges.advance {
            let factor = if self.aggro { speeds.aggro_advance } else { 1.0 };
            self.step_towards(target.position, speed * factor, dt, obstacles);
        } else if distance < ranges.retreat {
            let away = horizontal(self.position - target.position).normalize_or_zero();
            let spot = self.position + away * ranges.retreat_step;
            self.step_towards(spot, speed * speeds.retreat, dt, obstacles);
        } else {
            if self.rng.f32() < ranges.strafe_chance {
                let side = if self.rng.bool() { 1.0 } else { -1.0 };
                self.strafe_target = Some(self.position + right_from_yaw(self.yaw) * (ranges.strafe_offset * side));
            }
            if let Some(spot) = self.strafe_target {
                if self.step_towards(spot, speed * speeds.strafe, dt, obstacles) <= ARRIVE_EPSILON {
                    self.strafe_target = None;
                }
            }
        }

        self.face(target.position);
        self.try_fire(self.position.distance(target.position), ctx)
    }

    fn try_fire(&mut self, distance: f32, ctx: &mut CombatContext<'_>) -> Option<f32> {
        let interval = f64::from(self.profile.fire_interval);
        if self.last_fire.is_some_and(|at| ctx.now - at < interval) {
            return None;
        }
        self.last_fire = Some(ctx.now);

        emit_visual(ctx.effects, VisualKind::MuzzleFlash, Anchor::Entity(EntityRef::Agent(self.id)));
        emit_sound(ctx.effects, SoundKind::Shoot);

        (self.rng.f32() < self.profile.accuracy).then(|| agent_shot_damage(self.profile.damage, distance))
    }

    fn fire_back(&mut self, attacker: Vec3, ctx: &mut CombatContext<'_>) -> Option<f32> {
        let distance = self.position.distance(attacker);
        let accuracy = return_fire_accuracy(self.profile.accuracy, distance);
        let damage = return_fire_damage(self.profile.damage, distance);
        self.last_fire = Some(ctx.now);

        if distance > RETURN_FLASH_MIN_DISTANCE {
            emit_visual(ctx.effects, VisualKind::MuzzleFlash, Anchor::Entity(EntityRef::Agent(self.id)));
        }
        emit_sound(ctx.effects, SoundKind::Shoot);

        (self.rng.f32() < accuracy).then_some(damage)
    }
}
