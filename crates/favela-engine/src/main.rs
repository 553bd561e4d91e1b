//! # Favela Engine
//!
//! Headless entry point for the Favela shooter: builds the arena, starts a
//! round and plays it out with the autopilot until it is won, lost, or the
//! configured round length runs out.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use favela_engine::{build_arena, Autopilot, EngineConfig, FixedStep, Game, RoundState};
use favela_gameplay::{GameEvent, TracingEffects};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Simulated frame time of the headless loop.
const FRAME_SECONDS: f32 = 1.0 / 60.0;

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("favela=info".parse()?))
        .init();

    info!("Favela starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = match std::env::args().nth(1) {
        Some(path) => EngineConfig::load_from(path),
        None => EngineConfig::load(),
    };
    config.validate();
    let seed = *config.seed.get_or_insert_with(|| fastrand::u64(..u64::from(u32::MAX)));
    info!("Seed: {seed}");

    let round_seconds = f64::from(config.round_seconds);
    let mut step = FixedStep::new(config.tick_rate);
    let mut game = Game::new(config, build_arena(seed), Box::new(TracingEffects))?;
    let mut pilot = Autopilot::new();

    while game.state() == RoundState::Playing && game.elapsed() < round_seconds {
        for _ in 0..step.accumulate(FRAME_SECONDS) {
            let input = pilot.input(&game);
            for event in game.update(step.dt(), &input) {
                match event {
                    GameEvent::AgentDied { agent, team } => {
                        info!("{agent} ({team}) down, {} left", game.living_agents().count());
                    },
                    other => debug!("{other:?}"),
                }
            }
        }
    }

    match game.state() {
        RoundState::Won => info!("Victory in {:.1}s, {} kills", game.elapsed(), game.kills()),
        RoundState::Lost => info!("Defeat after {:.1}s, {} kills", game.elapsed(), game.kills()),
        RoundState::Playing => info!(
            "Time up after {:.1}s, {} kills, {} enemies left",
            game.elapsed(),
            game.kills(),
            game.living_agents().count()
        ),
    }

    info!("Favela shutdown complete");
    Ok(())
}
