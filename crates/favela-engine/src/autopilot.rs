//! Scripted player input for headless runs.
//!
//! Picks the nearest living enemy, turns toward it and fires once it is in
//! sight and roughly lined up. With nothing in sight it walks toward the
//! nearest enemy instead.

use favela_common::wrap_angle;
use favela_gameplay::{line_of_sight, Player, PlayerInput, CHEST_HEIGHT};
use glam::{Vec2, Vec3};

use crate::game::Game;

/// Largest aim error, in radians, at which the trigger is pulled.
const FIRE_CONE: f32 = 0.04;

/// Drives the player from the round state.
#[derive(Debug, Clone, Default)]
pub struct Autopilot {
    frames: u64,
}

impl Autopilot {
    /// Creates an autopilot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Produces the input for the next tick.
    pub fn input(&mut self, game: &Game) -> PlayerInput {
        self.frames += 1;
        let player = game.player();
        if !player.is_alive() {
            return PlayerInput::default();
        }

        let eye = player.eye();
        let Some(target) = game
            .living_agents()
            .map(|agent| agent.position() + Vec3::Y * CHEST_HEIGHT)
            .min_by(|a, b| a.distance_squared(eye).total_cmp(&b.distance_squared(eye)))
        else {
            return PlayerInput::default();
        };

        let (look, error) = aim_delta(player, target);
        let visible = line_of_sight(game.world(), eye, target);
        let firing = visible && error < FIRE_CONE;

        PlayerInput {
            look,
            forward: if visible { 0.0 } else { 1.0 },
            run: !visible,
            trigger: firing,
            // Semi-automatic weapons need a fresh press on every shot.
            trigger_pressed: firing && self.frames % 2 == 0,
            ..PlayerInput::default()
        }
    }
}

/// Look input that turns `player` to face `target`, and the current aim
/// error in radians.
fn aim_delta(player: &Player, target: Vec3) -> (Vec2, f32) {
    let dir = target - player.eye();
    let flat = Vec2::new(dir.x, dir.z).length();
    let yaw = dir.x.atan2(dir.z);
    let pitch = dir.y.atan2(flat);

    let yaw_error = wrap_angle(yaw - player.yaw());
    let pitch_error = pitch - player.pitch();
    let sensitivity = player_sensitivity(player);

    let look = Vec2::new(-yaw_error / sensitivity, -pitch_error / sensitivity);
    (look, yaw_error.abs().max(pitch_error.abs()))
}

fn player_sensitivity(player: &Player) -> f32 {
    player.config().mouse_sensitivity.max(f32::EPSILON)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::build_arena;
    use crate::config::EngineConfig;
    use favela_gameplay::NullEffects;

    #[test]
    fn test_look_delta_turns_onto_target() {
        let config = EngineConfig {
            seed: Some(3),
            enemy_count: 1,
            ..EngineConfig::default()
        };
        let mut game = Game::new(config, build_arena(3), Box::new(NullEffects)).expect("spawns exist");
        let target = game.player().eye() + Vec3::new(5.0, 0.0, 5.0);

        let (look, error) = aim_delta(game.player(), target);
        assert!(error > FIRE_CONE);
        game.player_mut().look(look);

        let (_, error) = aim_delta(game.player(), target);
        assert!(error < 1e-3);
    }

    #[test]
    fn test_no_enemies_means_no_input() {
        let config = EngineConfig {
            seed: Some(3),
            enemy_count: 1,
            ..EngineConfig::default()
        };
        let mut game = Game::new(config, build_arena(3), Box::new(NullEffects)).expect("spawns exist");
        let ids: Vec<_> = game.living_agents().map(favela_gameplay::Agent::id).collect();
        game.with_context(|agents, ctx| {
            for id in ids {
                agents.damage_agent(id, 1_000.0, favela_gameplay::HitRegion::Body, Vec3::ZERO, ctx);
            }
        });
        let mut pilot = Autopilot::new();
        assert_eq!(pilot.input(&game), PlayerInput::default());
    }
}
