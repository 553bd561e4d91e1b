//! Round orchestration.
//!
//! Owns the map, the player, the agents and live grenades, and advances
//! them together one tick at a time. Win and loss are decided here from
//! the alive counts and the player's death notification.

use favela_common::{EntityRef, FavelaError, FavelaResult, Team};
use favela_gameplay::{
    emit_sound, emit_visual, Agent, AgentManager, Anchor, Bodies, BoxWorld, CombatContext, Effects,
    EventBus, GameEvent, Geometry, Grenade, HitRegion, Player, PlayerInput, Scene, SoundKind,
    TargetSnapshot, VisualKind,
};
use glam::Vec3;
use tracing::{debug, info};

use crate::config::EngineConfig;

/// Progress of the current round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoundState {
    /// Fighting
    Playing,
    /// Every enemy is dead
    Won,
    /// The player died
    Lost,
}

/// One round of play.
pub struct Game {
    config: EngineConfig,
    world: BoxWorld,
    effects: Box<dyn Effects>,
    events: EventBus,
    player: Player,
    agents: AgentManager,
    grenades: Vec<Grenade>,
    state: RoundState,
    paused: bool,
    clock: f64,
    rng: fastrand::Rng,
}

impl Game {
    /// Starts a round on `world`.
    ///
    /// Fails if either team has no spawn point.
    pub fn new(config: EngineConfig, world: BoxWorld, effects: Box<dyn Effects>) -> FavelaResult<Self> {
        let seed = config.seed.unwrap_or_else(|| fastrand::u64(..));
        let mut rng = fastrand::Rng::with_seed(seed);
        let player = Player::new(
            config.player_team,
            Vec3::ZERO,
            config.player.clone(),
            config.combat.backstab,
            rng.u64(..),
        );
        let agents = AgentManager::new(config.combat.agent.clone(), rng.u64(..));

        let mut game = Self {
            config,
            world,
            effects,
            events: EventBus::default(),
            player,
            agents,
            grenades: Vec::new(),
            state: RoundState::Playing,
            paused: false,
            clock: 0.0,
            rng,
        };
        game.start_round()?;
        Ok(game)
    }

    fn start_round(&mut self) -> FavelaResult<()> {
        let team = self.config.player_team;
        let enemy = team.enemy();

        let own = self.world.spawn_points(team);
        if own.is_empty() {
            return Err(FavelaError::NoSpawnPoints(team.to_string()));
        }
        let spawn = own[self.rng.usize(..own.len())];

        let enemy_points = self.world.spawn_points(enemy).to_vec();
        if enemy_points.is_empty() {
            return Err(FavelaError::NoSpawnPoints(enemy.to_string()));
        }

        self.player.respawn(spawn);
        let facing = if enemy_points[0].z < spawn.z { Vec3::NEG_Z } else { Vec3::Z };
        self.player.look_at(self.player.eye() + facing);
        let spawned = self
            .agents
            .spawn_agents(enemy, self.config.enemy_count, &enemy_points);

        info!(
            "Round started: player on {team} at ({:.1}, {:.1}), {} {enemy} agents",
            spawn.x,
            spawn.z,
            spawned.len()
        );
        Ok(())
    }

    /// Advances the round by one tick of `dt` seconds and returns the
    /// events raised during it. Paused or finished rounds do nothing.
    pub fn update(&mut self, dt: f32, input: &PlayerInput) -> Vec<GameEvent> {
        if self.paused || self.state != RoundState::Playing {
            return Vec::new();
        }
        self.clock += f64::from(dt);
        let now = self.clock;

        let mut bodies = Bodies::new();
        self.agents.register_bodies(&mut bodies);
        if self.player.is_alive() {
            bodies.add_player(self.player.position(), self.player.yaw());
        }
        let tick = {
            let scene = Scene::new(&self.world, &bodies);
            self.player.update(dt, input, now, &scene, self.effects.as_mut())
        };

        let mut ctx = CombatContext {
            geometry: &self.world,
            effects: self.effects.as_mut(),
            events: &self.events,
            config: &self.config.combat,
            now,
        };

        let attacker = self.player.position();
        for hit in tick.hits {
            if let Some(EntityRef::Agent(id)) = hit.entity() {
                if let Some(outcome) = self.agents.damage_agent(id, hit.damage, hit.region(), attacker, &mut ctx) {
                    if outcome.killed {
                        self.player.add_kill();
                    }
                    if let Some(damage) = outcome.return_fire {
                        self.player.take_damage(damage, ctx.events);
                    }
                }
            }
        }

        self.grenades.extend(tick.grenade);
        let grenade_def = &self.config.player.grenade;
        let mut live = Vec::with_capacity(self.grenades.len());
        for mut grenade in self.grenades.drain(..) {
            grenade.step(dt, ctx.geometry, grenade_def);
            if !grenade.is_due(now) {
                live.push(grenade);
                continue;
            }

            let mut candidates: Vec<(EntityRef, Vec3)> = self
                .agents
                .agents()
                .filter(|agent| agent.is_alive())
                .map(|agent| (EntityRef::Agent(agent.id()), agent.position()))
                .collect();
            if self.player.is_alive() {
                candidates.push((EntityRef::Player, self.player.position()));
            }

            let explosion = grenade.explode(grenade_def, candidates);
            emit_visual(ctx.effects, VisualKind::Explosion, Anchor::Point(explosion.center));
            emit_sound(ctx.effects, SoundKind::Explosion);
            debug!("Grenade exploded with {} hits", explosion.hits.len());

            for (entity, damage) in explosion.hits {
                match entity {
                    EntityRef::Player => {
                        self.player.take_damage(damage, ctx.events);
                    },
                    EntityRef::Agent(id) => {
                        let outcome = self.agents.damage_agent(id, damage, HitRegion::Body, attacker, &mut ctx);
                        if let Some(outcome) = outcome {
                            if outcome.killed && grenade.thrower.is_player() {
                                self.player.add_kill();
                            }
                            if let Some(damage) = outcome.return_fire {
                                self.player.take_damage(damage, ctx.events);
                            }
                        }
                    },
                }
            }
        }
        self.grenades = live;

        let target = TargetSnapshot {
            position: self.player.position(),
            alive: self.player.is_alive(),
        };
        for shot in self.agents.update(dt, target, &mut ctx) {
            self.player.take_damage(shot.damage, ctx.events);
        }

        self.settle_round()
    }

    fn settle_round(&mut self) -> Vec<GameEvent> {
        let mut events = self.events.drain();
        if self.state == RoundState::Playing && events.contains(&GameEvent::PlayerDied) {
            self.state = RoundState::Lost;
            info!("Round lost after {:.1}s with {} kills", self.clock, self.player.kills());
            self.events.publish(GameEvent::RoundLost {
                elapsed: self.clock,
                kills: self.player.kills(),
            });
        }
        self.check_win_condition();
        events.extend(self.events.drain());
        events
    }

    /// Declares victory if no enemy is left alive. Returns true only the
    /// first time; later calls and finished rounds return false.
    pub fn check_win_condition(&mut self) -> bool {
        if self.state != RoundState::Playing || self.agents.alive_count(Some(self.enemy_team())) > 0 {
            return false;
        }
        self.state = RoundState::Won;
        info!("Round won after {:.1}s with {} kills", self.clock, self.player.kills());
        self.events.publish(GameEvent::RoundWon {
            elapsed: self.clock,
            kills: self.player.kills(),
        });
        true
    }

    /// Freezes the round.
    pub fn pause(&mut self) {
        if !self.paused {
            self.paused = true;
            debug!("Paused");
        }
    }

    /// Unfreezes the round.
    pub fn resume(&mut self) {
        if self.paused {
            self.paused = false;
            debug!("Resumed");
        }
    }

    /// Flips between paused and running.
    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    /// Throws the current round away and starts a fresh one.
    pub fn restart(&mut self) -> FavelaResult<()> {
        self.agents.dispose();
        self.grenades.clear();
        let stale = self.events.drain();
        if !stale.is_empty() {
            debug!("Dropped {} undelivered events on restart", stale.len());
        }
        self.state = RoundState::Playing;
        self.paused = false;
        self.clock = 0.0;
        self.start_round()
    }

    /// Current round state.
    #[must_use]
    pub const fn state(&self) -> RoundState {
        self.state
    }

    /// Returns true while paused.
    #[must_use]
    pub const fn is_paused(&self) -> bool {
        self.paused
    }

    /// Seconds of play in this round.
    #[must_use]
    pub const fn elapsed(&self) -> f64 {
        self.clock
    }

    /// Enemies killed by the player this round.
    #[must_use]
    pub const fn kills(&self) -> u32 {
        self.player.kills()
    }

    /// Team the agents fight for.
    #[must_use]
    pub fn enemy_team(&self) -> Team {
        self.config.player_team.enemy()
    }

    /// The player.
    #[must_use]
    pub const fn player(&self) -> &Player {
        &self.player
    }

    /// The player, mutably.
    pub fn player_mut(&mut self) -> &mut Player {
        &mut self.player
    }

    /// The agent manager.
    #[must_use]
    pub const fn agents(&self) -> &AgentManager {
        &self.agents
    }

    /// Living agents.
    pub fn living_agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.agents().filter(|agent| agent.is_alive())
    }

    /// Grenades in flight.
    #[must_use]
    pub fn grenades(&self) -> &[Grenade] {
        &self.grenades
    }

    /// The map.
    #[must_use]
    pub const fn world(&self) -> &BoxWorld {
        &self.world
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Runs `f` with a combat context over this round's collaborators.
    pub fn with_context<R>(&mut self, f: impl FnOnce(&mut AgentManager, &mut CombatContext<'_>) -> R) -> R {
        let mut ctx = CombatContext {
            geometry: &self.world,
            effects: self.effects.as_mut(),
            events: &self.events,
            config: &self.config.combat,
            now: self.clock,
        };
        f(&mut self.agents, &mut ctx)
    }
}
