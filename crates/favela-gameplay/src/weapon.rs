//! Weapon definitions and runtime state.
//!
//! Firing resolution (rays, spread, backstab) lives in [`crate::combat`];
//! this module owns ammunition, fire-rate gating, reloads and recoil.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Error types for weapon handling.
#[derive(Debug, Error)]
pub enum WeaponError {
    /// Slot number outside 1..=3
    #[error("Invalid weapon slot: {0}")]
    InvalidSlot(u8),
}

/// Result type for weapon operations.
pub type WeaponResult<T> = Result<T, WeaponError>;

/// Weapon models available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeaponKind {
    /// Pump shotgun, 8 pellets
    Shotgun,
    /// Bolt-action sniper rifle
    Sniper,
    /// AR-15 automatic rifle
    #[default]
    Rifle,
    /// Sidearm
    Pistol,
    /// Melee knife
    Knife,
}

impl WeaponKind {
    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shotgun => "Shotgun",
            Self::Sniper => "Sniper",
            Self::Rifle => "AR-15",
            Self::Pistol => "Pistol",
            Self::Knife => "Knife",
        }
    }

    /// Returns true for melee weapons.
    #[must_use]
    pub const fn is_melee(self) -> bool {
        matches!(self, Self::Knife)
    }
}

/// Static weapon parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponDef {
    /// Damage per pellet (or per stab)
    pub damage: f32,
    /// Rays per shot
    pub pellets: u32,
    /// Spread radius of a pellet around the aim direction (tangent)
    pub spread: f32,
    /// Maximum reach
    pub range: f32,
    /// Minimum seconds between shots
    pub fire_interval: f32,
    /// Seconds a reload takes
    pub reload_time: f32,
    /// Magazine capacity
    pub magazine: u32,
    /// Spare rounds carried at spawn
    pub reserve: u32,
    /// Fires while the trigger is held
    pub automatic: bool,
    /// View kick per shot (radians)
    pub recoil: f32,
    /// Multiplier on the carrier's movement speed
    pub move_speed: f32,
    /// Scope magnification, if any
    pub zoom: Option<f32>,
}

impl WeaponDef {
    /// Returns the stock definition of a weapon kind.
    #[must_use]
    pub fn for_kind(kind: WeaponKind) -> Self {
        match kind {
            WeaponKind::Shotgun => Self {
                damage: 25.0,
                pellets: 8,
                spread: 0.15,
                range: 15.0,
                fire_interval: 0.9,
                reload_time: 2.5,
                magazine: 6,
                reserve: 24,
                automatic: false,
                recoil: 0.15,
                move_speed: 0.9,
                zoom: None,
            },
            WeaponKind::Sniper => Self {
                damage: 150.0,
                pellets: 1,
                spread: 0.001,
                range: 200.0,
                fire_interval: 1.5,
                reload_time: 3.0,
                magazine: 5,
                reserve: 20,
                automatic: false,
                recoil: 0.3,
                move_speed: 0.8,
                zoom: Some(4.0),
            },
            WeaponKind::Rifle => Self {
                damage: 28.0,
                pellets: 1,
                spread: 0.03,
                range: 80.0,
                fire_interval: 0.1,
                reload_time: 2.0,
                magazine: 30,
                reserve: 120,
                automatic: true,
                recoil: 0.04,
                move_speed: 0.95,
                zoom: None,
            },
            WeaponKind::Pistol => Self {
                damage: 38.0,
                pellets: 1,
                spread: 0.015,
                range: 50.0,
                fire_interval: 0.18,
                reload_time: 1.4,
                magazine: 15,
                reserve: 60,
                automatic: false,
                recoil: 0.06,
                move_speed: 1.0,
                zoom: None,
            },
            WeaponKind::Knife => Self {
                damage: 55.0,
                pellets: 1,
                spread: 0.0,
                range: 2.5,
                fire_interval: 0.5,
                reload_time: 0.0,
                magazine: 0,
                reserve: 0,
                automatic: false,
                recoil: 0.0,
                move_speed: 1.1,
                zoom: None,
            },
        }
    }
}

/// View kick produced by one shot, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Recoil {
    /// Upward pitch kick
    pub pitch: f32,
    /// Sideways yaw kick
    pub yaw: f32,
}

/// A weapon carried in a slot: definition plus ammunition and timers.
#[derive(Debug, Clone)]
pub struct Weapon {
    kind: WeaponKind,
    def: WeaponDef,
    ammo: u32,
    reserve: u32,
    reload_done_at: Option<f64>,
    last_fire: Option<f64>,
}

impl Weapon {
    /// Creates a fully loaded weapon of the given kind.
    #[must_use]
    pub fn new(kind: WeaponKind) -> Self {
        Self::from_def(kind, WeaponDef::for_kind(kind))
    }

    /// Creates a fully loaded weapon from a custom definition.
    #[must_use]
    pub fn from_def(kind: WeaponKind, def: WeaponDef) -> Self {
        Self {
            kind,
            ammo: def.magazine,
            reserve: def.reserve,
            def,
            reload_done_at: None,
            last_fire: None,
        }
    }

    /// Sets the rounds in the magazine and in reserve (magazine is capped).
    #[must_use]
    pub fn with_ammo(mut self, ammo: u32, reserve: u32) -> Self {
        self.ammo = ammo.min(self.def.magazine);
        self.reserve = reserve;
        self
    }

    /// Weapon kind.
    #[must_use]
    pub const fn kind(&self) -> WeaponKind {
        self.kind
    }

    /// Static parameters.
    #[must_use]
    pub const fn def(&self) -> &WeaponDef {
        &self.def
    }

    /// Rounds in the magazine.
    #[must_use]
    pub const fn ammo(&self) -> u32 {
        self.ammo
    }

    /// Spare rounds.
    #[must_use]
    pub const fn reserve(&self) -> u32 {
        self.reserve
    }

    /// Returns true while a reload is in flight.
    #[must_use]
    pub const fn is_reloading(&self) -> bool {
        self.reload_done_at.is_some()
    }

    /// Returns true if the magazine is empty (never for melee).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        !self.kind.is_melee() && self.ammo == 0
    }

    /// Returns true if a shot may be taken at `now`.
    #[must_use]
    pub fn can_fire(&self, now: f64) -> bool {
        if self.is_reloading() || self.is_empty() {
            return false;
        }
        self.last_fire
            .map_or(true, |last| now - last >= f64::from(self.def.fire_interval))
    }

    /// Consumes one shot if allowed. Returns false (and changes nothing)
    /// when the weapon can't fire.
    pub fn trigger(&mut self, now: f64) -> bool {
        if !self.can_fire(now) {
            return false;
        }
        if !self.kind.is_melee() {
            self.ammo -= 1;
        }
        self.last_fire = Some(now);
        true
    }

    /// Starts a reload. No-op (returns false) for melee weapons, a full
    /// magazine, an empty reserve, or a reload already in flight.
    pub fn start_reload(&mut self, now: f64) -> bool {
        if self.is_reloading()
            || self.kind.is_melee()
            || self.ammo >= self.def.magazine
            || self.reserve == 0
        {
            return false;
        }
        self.reload_done_at = Some(now + f64::from(self.def.reload_time));
        debug!("{} reloading", self.kind.name());
        true
    }

    /// Completes a due reload. Returns true if one finished this call.
    pub fn tick(&mut self, now: f64) -> bool {
        match self.reload_done_at {
            Some(done) if now >= done => {
                let needed = self.def.magazine.saturating_sub(self.ammo);
                let loaded = needed.min(self.reserve);
                self.ammo += loaded;
                self.reserve -= loaded;
                self.reload_done_at = None;
                true
            },
            _ => false,
        }
    }

    /// Abandons an in-flight reload without loading anything.
    pub fn cancel_reload(&mut self) -> bool {
        self.reload_done_at.take().is_some()
    }

    /// Rolls the view kick of one shot.
    pub fn recoil(&self, rng: &mut fastrand::Rng) -> Recoil {
        Recoil {
            pitch: self.def.recoil,
            yaw: (rng.f32() - 0.5) * self.def.recoil * 0.3,
        }
    }
}
