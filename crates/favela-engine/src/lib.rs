//! Favela Engine - headless round driver for the Favela shooter.
//!
//! This crate provides the arena map, engine configuration, fixed-step
//! timing and the round orchestrator that ties the player and the agents
//! together.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod arena;
pub mod autopilot;
pub mod config;
pub mod game;
pub mod timing;

pub use arena::build_arena;
pub use autopilot::Autopilot;
pub use config::{ConfigError, EngineConfig};
pub use game::{Game, RoundState};
pub use timing::FixedStep;
