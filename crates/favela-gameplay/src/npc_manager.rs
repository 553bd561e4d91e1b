//! Ownership and per-tick driving of all agents.

use std::collections::BTreeMap;

use favela_common::{AgentId, Team};
use glam::Vec3;
use tracing::{debug, info};

use crate::agent::{Agent, AgentState, CombatContext, DamageOutcome, NpcError, NpcResult, TargetSnapshot};
use crate::config::AgentProfile;
use crate::scene::{Bodies, HitRegion};

/// A shot an agent landed on the player this tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgentShot {
    /// Shooter
    pub agent: AgentId,
    /// Damage to apply to the player
    pub damage: f32,
}

/// Owns every agent of a round.
///
/// Agents are keyed by stable ids. Each tick they all read the same
/// snapshot of the target and of each other's positions, and each draws
/// from its own random generator, so update order does not change outcomes.
#[derive(Debug)]
pub struct AgentManager {
    agents: BTreeMap<AgentId, Agent>,
    profile: AgentProfile,
    next_id: AgentId,
    rng: fastrand::Rng,
}

impl AgentManager {
    /// Creates an empty manager.
    #[must_use]
    pub fn new(profile: AgentProfile, seed: u64) -> Self {
        Self {
            agents: BTreeMap::new(),
            profile,
            next_id: AgentId::from_raw(1),
            rng: fastrand::Rng::with_seed(seed),
        }
    }

    /// Spawns up to `count` agents of `team`, one per spawn point, on a
    /// shuffled selection of `spawn_points`. Returns the new ids.
    pub fn spawn_agents(&mut self, team: Team, count: usize, spawn_points: &[Vec3]) -> Vec<AgentId> {
        let mut pool = spawn_points.to_vec();
        for i in (1..pool.len()).rev() {
            let j = self.rng.usize(..=i);
            pool.swap(i, j);
        }
        if count > pool.len() {
            debug!(
                "Requested {count} {team} agents but only {} spawn points exist",
                pool.len()
            );
        }

        let ids: Vec<AgentId> = pool
            .into_iter()
            .take(count)
            .enumerate()
            .map(|(index, point)| {
                let id = self.next_id;
                self.next_id = id.next();
                let agent = Agent::new(id, team, index, point, self.profile.clone(), self.rng.u64(..));
                self.agents.insert(id, agent);
                id
            })
            .collect();

        info!("Spawned {} {team} agents", ids.len());
        ids
    }

    /// Runs one tick for every agent and removes expired corpses.
    /// Returns the shots that hit the target.
    pub fn update(&mut self, dt: f32, target: TargetSnapshot, ctx: &mut CombatContext<'_>) -> Vec<AgentShot> {
        let neighbours: Vec<(AgentId, Vec3)> = self
            .agents
            .values()
            .filter(|agent| agent.is_collidable())
            .map(|agent| (agent.id(), agent.position()))
            .collect();

        let mut shots = Vec::new();
        let mut expired = Vec::new();
        for agent in self.agents.values_mut() {
            if agent.is_alive() {
                if let Some(damage) = agent.update(dt, target, &neighbours, ctx) {
                    shots.push(AgentShot {
                        agent: agent.id(),
                        damage,
                    });
                }
            } else if agent.tick_corpse(ctx.now, ctx.effects) {
                expired.push(agent.id());
            }
        }

        for id in expired {
            if self.despawn(id).is_ok() {
                debug!("Removed corpse of {id}");
            }
        }
        shots
    }

    /// Damages an agent and alerts its patrolling teammates strictly inside
    /// the alert radius.
    ///
    /// Unknown or already-removed ids are treated as absent and return
    /// `None`, as do agents that were already dead.
    pub fn damage_agent(
        &mut self,
        id: AgentId,
        amount: f32,
        region: HitRegion,
        attacker: Vec3,
        ctx: &mut CombatContext<'_>,
    ) -> Option<DamageOutcome> {
        let agent = self.agents.get_mut(&id)?;
        let outcome = agent.take_damage(amount, region, attacker, ctx)?;

        let team = agent.team();
        let origin = agent.position();
        let spot = agent.last_known().unwrap_or(origin);
        let radius = ctx.config.alert_radius;

        for other in self.agents.values_mut() {
            if other.id() != id
                && other.team() == team
                && other.state() == AgentState::Patrol
                && other.position().distance(origin) < radius
                && other.alert(spot)
            {
                debug!("{} alerted by {id}", other.id());
            }
        }

        Some(outcome)
    }

    /// Number of living agents, optionally only those of `team`.
    #[must_use]
    pub fn alive_count(&self, team: Option<Team>) -> usize {
        self.agents
            .values()
            .filter(|agent| agent.is_alive() && team.map_or(true, |t| agent.team() == t))
            .count()
    }

    /// Looks up an agent.
    pub fn get(&self, id: AgentId) -> NpcResult<&Agent> {
        self.agents.get(&id).ok_or(NpcError::NotFound(id))
    }

    /// Looks up an agent mutably.
    pub fn get_mut(&mut self, id: AgentId) -> NpcResult<&mut Agent> {
        self.agents.get_mut(&id).ok_or(NpcError::NotFound(id))
    }

    /// Removes an agent immediately.
    pub fn despawn(&mut self, id: AgentId) -> NpcResult<Agent> {
        self.agents.remove(&id).ok_or(NpcError::NotFound(id))
    }

    /// Iterates all agents, dead or alive, in id order.
    pub fn agents(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    /// Registers the hitboxes of every collidable agent.
    pub fn register_bodies(&self, bodies: &mut Bodies) {
        for agent in self.agents.values().filter(|a| a.is_collidable()) {
            bodies.add_agent(agent.id(), agent.position(), agent.yaw());
        }
    }

    /// Number of agents held, including corpses not yet removed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// Returns true if no agents are held.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// Releases every agent.
    pub fn dispose(&mut self) {
        let count = self.agents.len();
        self.agents.clear();
        debug!("Disposed {count} agents");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CombatConfig;
    use crate::effects::RecordingEffects;
    use crate::events::{EventBus, GameEvent};
    use crate::world::BoxWorld;
    use std::collections::HashSet;

    struct Harness {
        world: BoxWorld,
        fx: RecordingEffects,
        events: EventBus,
        config: CombatConfig,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                world: BoxWorld::open_ground(),
                fx: RecordingEffects::default(),
                events: EventBus::default(),
                config: CombatConfig::default(),
            }
        }

        fn ctx(&mut self, now: f64) -> CombatContext<'_> {
            CombatContext {
                geometry: &self.world,
                effects: &mut self.fx,
                events: &self.events,
                config: &self.config,
                now,
            }
        }
    }

    fn points(n: usize) -> Vec<Vec3> {
        (0..n).map(|i| Vec3::new(i as f32 * 3.0, 0.0, 0.0)).collect()
    }

    fn far_away() -> TargetSnapshot {
        TargetSnapshot {
            position: Vec3::new(0.0, 0.0, 500.0),
            alive: true,
        }
    }

    #[test]
    fn test_spawn_capped_by_points() {
        let mut manager = AgentManager::new(AgentProfile::default(), 7);
        let spawn = points(3);
        let ids = manager.spawn_agents(Team::Criminal, 5, &spawn);
        assert_eq!(ids.len(), 3);
        assert_eq!(manager.alive_count(Some(Team::Criminal)), 3);

        let used: HashSet<_> = manager
            .agents()
            .map(|a| (a.position().x * 10.0) as i32)
            .collect();
        assert_eq!(used.len(), 3);
        for agent in manager.agents() {
            assert!(spawn.contains(&agent.position()));
        }
    }

    #[test]
    fn test_spawn_fewer_than_points() {
        let mut manager = AgentManager::new(AgentProfile::default(), 1);
        let ids = manager.spawn_agents(Team::Police, 2, &points(10));
        assert_eq!(ids.len(), 2);
        assert_ne!(ids[0], ids[1]);
        assert!(manager.spawn_agents(Team::Police, 4, &[]).is_empty());
    }

    #[test]
    fn test_alive_count_by_team() {
        let mut manager = AgentManager::new(AgentProfile::default(), 3);
        manager.spawn_agents(Team::Criminal, 2, &points(2));
        manager.spawn_agents(Team::Police, 3, &[Vec3::new(0.0, 0.0, 50.0), Vec3::new(5.0, 0.0, 50.0), Vec3::new(10.0, 0.0, 50.0)]);
        assert_eq!(manager.alive_count(None), 5);
        assert_eq!(manager.alive_count(Some(Team::Police)), 3);
        assert_eq!(manager.alive_count(Some(Team::Criminal)), 2);
    }

    #[test]
    fn test_damage_alerts_nearby_teammates() {
        let mut h = Harness::new();
        let mut manager = AgentManager::new(AgentProfile::default(), 9);
        let ids = manager.spawn_agents(Team::Criminal, 3, &[Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0), Vec3::new(60.0, 0.0, 0.0)]);
        let victim = ids
            .iter()
            .copied()
            .find(|id| manager.get(*id).map(|a| a.position() == Vec3::ZERO).unwrap_or(false))
            .expect("victim");
        let attacker = Vec3::new(0.0, 0.0, 30.0);

        manager
            .damage_agent(victim, 10.0, HitRegion::Body, attacker, &mut h.ctx(0.0))
            .expect("hit");

        for agent in manager.agents() {
            if agent.id() == victim {
                assert_eq!(agent.state(), AgentState::Combat);
            } else if agent.position().x < 20.0 {
                assert_eq!(agent.state(), AgentState::Alert);
                assert_eq!(agent.last_known(), Some(attacker));
            } else {
                assert_eq!(agent.state(), AgentState::Patrol);
            }
        }
    }

    #[test]
    fn test_alert_radius_is_exclusive() {
        let mut h = Harness::new();
        let mut manager = AgentManager::new(AgentProfile::default(), 5);
        let spawn = [Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0), Vec3::new(0.0, 0.0, -19.9)];
        let ids = manager.spawn_agents(Team::Police, 3, &spawn);
        let at = |manager: &AgentManager, point: Vec3| {
            ids.iter()
                .copied()
                .find(|id| manager.get(*id).map(|a| a.position() == point).unwrap_or(false))
                .expect("spawned")
        };
        let victim = at(&manager, Vec3::ZERO);
        let edge = at(&manager, spawn[1]);
        let inside = at(&manager, spawn[2]);

        manager
            .damage_agent(victim, 10.0, HitRegion::Body, Vec3::new(0.0, 0.0, 40.0), &mut h.ctx(0.0))
            .expect("hit");
        assert_eq!(manager.get(edge).map(Agent::state).ok(), Some(AgentState::Patrol));
        assert_eq!(manager.get(inside).map(Agent::state).ok(), Some(AgentState::Alert));
    }

    #[test]
    fn test_despawn_removes_once() {
        let mut manager = AgentManager::new(AgentProfile::default(), 6);
        let ids = manager.spawn_agents(Team::Criminal, 2, &points(2));
        let removed = manager.despawn(ids[0]).expect("present");
        assert_eq!(removed.id(), ids[0]);
        assert_eq!(manager.len(), 1);
        assert!(matches!(manager.despawn(ids[0]), Err(NpcError::NotFound(_))));
    }

    #[test]
    fn test_damage_unknown_agent_is_absent() {
        let mut h = Harness::new();
        let mut manager = AgentManager::new(AgentProfile::default(), 0);
        let missing = AgentId::from_raw(99);
        assert!(manager
            .damage_agent(missing, 10.0, HitRegion::Body, Vec3::ZERO, &mut h.ctx(0.0))
            .is_none());
        assert!(matches!(manager.get(missing), Err(NpcError::NotFound(_))));
    }

    #[test]
    fn test_corpse_removed_after_linger_and_fade() {
        let mut h = Harness::new();
        let mut manager = AgentManager::new(AgentProfile::default(), 4);
        let ids = manager.spawn_agents(Team::Police, 1, &[Vec3::ZERO]);
        let outcome = manager
            .damage_agent(ids[0], 500.0, HitRegion::Body, Vec3::Z, &mut h.ctx(1.0))
            .expect("hit");
        assert!(outcome.killed);
        assert_eq!(manager.alive_count(None), 0);
        assert_eq!(manager.len(), 1);
        assert!(h.events.drain().contains(&GameEvent::AgentDied {
            agent: ids[0],
            team: Team::Police,
        }));

        manager.update(0.1, far_away(), &mut h.ctx(5.0));
        assert_eq!(manager.len(), 1);
        manager.update(0.1, far_away(), &mut h.ctx(7.0));
        assert!(manager.is_empty());
        assert_eq!(h.fx.count_visual(crate::effects::VisualKind::DeathFade), 1);
    }

    #[test]
    fn test_dead_agents_have_no_bodies() {
        let mut h = Harness::new();
        let mut manager = AgentManager::new(AgentProfile::default(), 4);
        let ids = manager.spawn_agents(Team::Police, 2, &points(2));
        manager.damage_agent(ids[0], 500.0, HitRegion::Body, Vec3::Z, &mut h.ctx(0.0));
        let mut bodies = Bodies::new();
        manager.register_bodies(&mut bodies);
        assert_eq!(bodies.len(), 1);
        assert!(bodies.pose(favela_common::EntityRef::Agent(ids[0])).is_none());
    }

    #[test]
    fn test_update_is_order_independent() {
        let run = |reverse_ids: bool| {
            let mut h = Harness::new();
            let mut manager = AgentManager::new(AgentProfile::default(), 21);
            manager.spawn_agents(Team::Criminal, 4, &points(4));
            if reverse_ids {
                // Re-key so the map iterates the same agents back to front.
                let agents: Vec<Agent> = std::mem::take(&mut manager.agents).into_values().collect();
                for (i, agent) in agents.into_iter().enumerate() {
                    manager.agents.insert(AgentId::from_raw(100 - i as u32), agent);
                }
            }
            let target = TargetSnapshot {
                position: Vec3::new(4.0, 0.0, 12.0),
                alive: true,
            };
            for tick in 0..50 {
                manager.update(0.05, target, &mut h.ctx(f64::from(tick) * 0.05));
            }
            let mut out: Vec<(AgentId, Vec3, AgentState)> = manager
                .agents()
                .map(|a| (a.id(), a.position(), a.state()))
                .collect();
            out.sort_by_key(|(id, _, _)| *id);
            out
        };
        assert_eq!(run(false), run(true));
    }

    #[test]
    fn test_dispose_releases_all() {
        let mut manager = AgentManager::new(AgentProfile::default(), 2);
        manager.spawn_agents(Team::Criminal, 3, &points(3));
        manager.dispose();
        assert!(manager.is_empty());
        assert_eq!(manager.alive_count(None), 0);
    }
}
