//! # Favela Gameplay
//!
//! Combat and NPC systems for the Favela shooter.
//!
//! This crate holds everything that runs on the simulation tick:
//! - Static geometry queries and the entity raycast scene
//! - Perception (view cone, view distance, line of sight)
//! - Agents with a per-agent state machine and the agent manager
//! - Weapons, hitscan and melee resolution, grenades
//! - Player controller with movement and physics
//! - Effect cues (sounds and visuals) behind a trait
//! - Event bus for round-level notifications

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod agent;
pub mod combat;
pub mod config;
pub mod effects;
pub mod events;
pub mod grenade;
pub mod movement;
pub mod npc_manager;
pub mod perception;
pub mod player;
pub mod scene;
pub mod weapon;
pub mod world;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::agent::*;
    pub use crate::combat::*;
    pub use crate::config::*;
    pub use crate::effects::*;
    pub use crate::events::*;
    pub use crate::grenade::*;
    pub use crate::movement::*;
    pub use crate::npc_manager::*;
    pub use crate::perception::*;
    pub use crate::player::*;
    pub use crate::scene::*;
    pub use crate::weapon::*;
    pub use crate::world::*;
}

pub use prelude::*;
