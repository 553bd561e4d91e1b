//! # Favela Common
//!
//! Common types, utilities, and shared abstractions for the Favela shooter.
//!
//! This crate provides foundational types used across all Favela subsystems:
//! - ID types (AgentId, EntityRef)
//! - Teams and the enemy relation between them
//! - Orientation helpers over `glam::Vec3` (yaw/forward conventions)
//! - Common error types
//! - Prelude for convenient imports

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod ids;
pub mod math;
pub mod team;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::*;
    pub use crate::ids::*;
    pub use crate::math::*;
    pub use crate::team::*;
}

pub use prelude::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_teams_are_enemies_of_each_other() {
        for team in Team::ALL {
            assert_ne!(team, team.enemy());
            assert_eq!(team, team.enemy().enemy());
        }
    }

    #[test]
    fn test_entity_ref_agent_accessor() {
        let id = AgentId::from_raw(7);
        assert_eq!(EntityRef::Agent(id).agent(), Some(id));
        assert_eq!(EntityRef::Player.agent(), None);
        assert!(EntityRef::Player.is_player());
    }
}
