//! Tunable combat parameters.
//!
//! Every field has a default matching the shipped game balance, and every
//! struct is `#[serde(default)]` so partial config files only override what
//! they name.

use serde::{Deserialize, Serialize};
use std::f32::consts::FRAC_PI_2;

use crate::grenade::GrenadeDef;
use crate::weapon::WeaponKind;

/// Perception and weapon parameters of a single NPC.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentProfile {
    /// Starting and maximum health
    pub max_health: f32,
    /// Damage of one successful shot
    pub damage: f32,
    /// Hit probability of one shot (0.0 - 1.0)
    pub accuracy: f32,
    /// Delay between first sighting and engaging (seconds)
    pub reaction_time: f32,
    /// Minimum interval between shots (seconds)
    pub fire_interval: f32,
    /// Base movement speed (units/second)
    pub speed: f32,
    /// Turn rate factor used for smoothed rotation
    pub rotation_speed: f32,
    /// Maximum sight distance
    pub view_distance: f32,
    /// Full field-of-view angle in degrees
    pub view_angle: f32,
    /// Hearing radius. Reserved: no transition consults it.
    pub hearing_distance: f32,
    /// Height of the eyes above the feet
    pub eye_height: f32,
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            damage: 12.0,
            accuracy: 0.5,
            reaction_time: 0.2,
            fire_interval: 0.35,
            speed: 4.0,
            rotation_speed: 3.0,
            view_distance: 80.0,
            view_angle: 150.0,
            hearing_distance: 30.0,
            eye_height: 1.5,
        }
    }
}

impl AgentProfile {
    /// Half of the field of view, in degrees.
    #[must_use]
    pub fn view_half_angle(&self) -> f32 {
        self.view_angle * 0.5
    }
}

/// How a knife hit from behind is scored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackstabPolicy {
    /// Replace the base damage with a fixed value
    Override(f32),
    /// Multiply the base damage
    Multiplier(f32),
}

impl Default for BackstabPolicy {
    fn default() -> Self {
        Self::Override(200.0)
    }
}

impl BackstabPolicy {
    /// Damage dealt by a backstab with the given base melee damage.
    #[must_use]
    pub fn apply(self, base: f32) -> f32 {
        match self {
            Self::Override(value) => value,
            Self::Multiplier(factor) => base * factor,
        }
    }
}

/// Distances that drive combat-state positioning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementRanges {
    /// Beyond this the agent closes in
    pub advance: f32,
    /// Inside this the agent backs off
    pub retreat: f32,
    /// A chasing agent that sees its target within this range engages
    pub chase_engage: f32,
    /// Aggro agents keep shooting at unseen targets within this range
    pub aggro_fire: f32,
    /// How far a retreat step aims
    pub retreat_step: f32,
    /// Lateral offset of a strafe target
    pub strafe_offset: f32,
    /// Chance per tick of picking a new strafe target
    pub strafe_chance: f32,
}

impl Default for EngagementRanges {
    fn default() -> Self {
        Self {
            advance: 40.0,
            retreat: 8.0,
            chase_engage: 20.0,
            aggro_fire: 70.0,
            retreat_step: 5.0,
            strafe_offset: 4.0,
            strafe_chance: 0.03,
        }
    }
}

/// Speed multipliers per behaviour, applied to the agent's base speed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpeedFactors {
    /// Walking a patrol route
    pub patrol: f32,
    /// Investigating a last-known position
    pub alert: f32,
    /// Aggro sprint toward an unseen target
    pub hunt: f32,
    /// Aggro advance toward a visible target
    pub aggro_advance: f32,
    /// Backing away from a close target
    pub retreat: f32,
    /// Side-stepping at mid range
    pub strafe: f32,
}

impl Default for SpeedFactors {
    fn default() -> Self {
        Self {
            patrol: 0.5,
            alert: 0.7,
            hunt: 1.5,
            aggro_advance: 1.3,
            retreat: 0.6,
            strafe: 0.4,
        }
    }
}

/// Complete combat tuning shared by the agent manager and the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatConfig {
    /// Profile given to every spawned agent
    pub agent: AgentProfile,
    /// Combat positioning ranges
    pub ranges: EngagementRanges,
    /// Behaviour speed multipliers
    pub speeds: SpeedFactors,
    /// Same-team patrollers within this radius of a wounded agent are alerted
    pub alert_radius: f32,
    /// Seconds without sight before a non-aggro agent gives chase
    pub lost_target_timeout: f32,
    /// Seconds an alert agent lingers at the last-known position
    pub alert_cooldown: f32,
    /// Shortest pause at a patrol point (seconds)
    pub patrol_wait_min: f32,
    /// Longest pause at a patrol point (seconds)
    pub patrol_wait_max: f32,
    /// Damage multiplier for head hits
    pub headshot_multiplier: f32,
    /// Knife backstab scoring
    pub backstab: BackstabPolicy,
    /// Seconds a corpse lies still before fading
    pub corpse_linger: f32,
    /// Seconds the fade-out lasts before the agent is removed
    pub corpse_fade: f32,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            agent: AgentProfile::default(),
            ranges: EngagementRanges::default(),
            speeds: SpeedFactors::default(),
            alert_radius: 20.0,
            lost_target_timeout: 3.0,
            alert_cooldown: 3.0,
            patrol_wait_min: 1.0,
            patrol_wait_max: 3.0,
            headshot_multiplier: 2.5,
            backstab: BackstabPolicy::default(),
            corpse_linger: 4.0,
            corpse_fade: 1.7,
        }
    }
}

/// Player movement, view and loadout parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Starting and maximum health
    pub max_health: f32,
    /// Walking speed
    pub walk_speed: f32,
    /// Running speed
    pub run_speed: f32,
    /// Crouched speed
    pub crouch_speed: f32,
    /// Upward speed of a jump
    pub jump_speed: f32,
    /// Vertical acceleration (negative is down)
    pub gravity: f32,
    /// Standing eye height
    pub eye_height: f32,
    /// Crouched eye height
    pub crouch_eye_height: f32,
    /// Radians of view rotation per unit of look input
    pub mouse_sensitivity: f32,
    /// Largest absolute pitch
    pub pitch_limit: f32,
    /// Reach of the wall probe in the movement direction
    pub wall_probe: f32,
    /// A wall closer than this stops movement
    pub wall_stop: f32,
    /// Reach of the ground probe from one unit above the feet
    pub ground_probe: f32,
    /// Weapon in slot 1
    pub primary: WeaponKind,
    /// Grenade parameters
    pub grenade: GrenadeDef,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            walk_speed: 8.0,
            run_speed: 14.0,
            crouch_speed: 4.0,
            jump_speed: 8.0,
            gravity: -25.0,
            eye_height: 1.7,
            crouch_eye_height: 1.0,
            mouse_sensitivity: 0.002,
            pitch_limit: FRAC_PI_2 - 0.1,
            wall_probe: 0.6,
            wall_stop: 0.5,
            ground_probe: 1.1,
            primary: WeaponKind::Rifle,
            grenade: GrenadeDef::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backstab_policies() {
        assert!((BackstabPolicy::Override(200.0).apply(55.0) - 200.0).abs() < f32::EPSILON);
        assert!((BackstabPolicy::Multiplier(2.0).apply(55.0) - 110.0).abs() < f32::EPSILON);
        assert_eq!(BackstabPolicy::default(), BackstabPolicy::Override(200.0));
    }

    #[test]
    fn test_default_profile_half_angle() {
        let profile = AgentProfile::default();
        assert!((profile.view_half_angle() - 75.0).abs() < f32::EPSILON);
    }
}
