//! Fire-and-forget audio/visual cues.
//!
//! Rendering and audio are external. Their failures must never interrupt
//! combat resolution, so gameplay code goes through [`emit_visual`] and
//! [`emit_sound`], which log and drop any error.

use favela_common::EntityRef;
use glam::Vec3;
use thiserror::Error;
use tracing::{trace, warn};

/// Error reported by an effect sink.
#[derive(Debug, Error)]
pub enum EffectError {
    /// The backend is not available (no audio device, renderer lost)
    #[error("Effect backend unavailable: {0}")]
    Unavailable(String),
    /// A specific cue could not be played
    #[error("Failed to play {cue}: {reason}")]
    Failed {
        /// Cue name
        cue: &'static str,
        /// Backend message
        reason: String,
    },
}

/// Visual cue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisualKind {
    /// Flash at a gun barrel
    MuzzleFlash,
    /// Red flash on a wounded body
    HitFlash,
    /// Bullet hole on level geometry
    ImpactDecal,
    /// Grenade detonation
    Explosion,
    /// Corpse fading out before removal
    DeathFade,
}

impl VisualKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::MuzzleFlash => "muzzle_flash",
            Self::HitFlash => "hit_flash",
            Self::ImpactDecal => "impact_decal",
            Self::Explosion => "explosion",
            Self::DeathFade => "death_fade",
        }
    }
}

/// Sound cue kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundKind {
    /// Gunshot
    Shoot,
    /// Knife swing
    Slash,
    /// Magazine change
    Reload,
    /// Empty trigger pull
    DryFire,
    /// Grenade detonation
    Explosion,
}

impl SoundKind {
    /// Short name for logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Shoot => "shoot",
            Self::Slash => "slash",
            Self::Reload => "reload",
            Self::DryFire => "dry_fire",
            Self::Explosion => "explosion",
        }
    }
}

/// Where a visual cue is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Anchor {
    /// A fixed world position
    Point(Vec3),
    /// Attached to an entity
    Entity(EntityRef),
}

/// Sink for cues produced by gameplay.
pub trait Effects {
    /// Shows a visual cue.
    fn visual(&mut self, kind: VisualKind, anchor: Anchor) -> Result<(), EffectError>;

    /// Plays a sound cue.
    fn sound(&mut self, kind: SoundKind) -> Result<(), EffectError>;
}

/// Shows a visual cue, logging and discarding any failure.
pub fn emit_visual(effects: &mut dyn Effects, kind: VisualKind, anchor: Anchor) {
    if let Err(e) = effects.visual(kind, anchor) {
        warn!("Visual effect {} failed: {e}", kind.name());
    }
}

/// Plays a sound cue, logging and discarding any failure.
pub fn emit_sound(effects: &mut dyn Effects, kind: SoundKind) {
    if let Err(e) = effects.sound(kind) {
        warn!("Sound {} failed: {e}", kind.name());
    }
}

/// Discards every cue.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEffects;

impl Effects for NullEffects {
    fn visual(&mut self, _kind: VisualKind, _anchor: Anchor) -> Result<(), EffectError> {
        Ok(())
    }

    fn sound(&mut self, _kind: SoundKind) -> Result<(), EffectError> {
        Ok(())
    }
}

/// Writes every cue to the trace log. Used by headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingEffects;

impl Effects for TracingEffects {
    fn visual(&mut self, kind: VisualKind, anchor: Anchor) -> Result<(), EffectError> {
        trace!(cue = kind.name(), ?anchor, "visual");
        Ok(())
    }

    fn sound(&mut self, kind: SoundKind) -> Result<(), EffectError> {
        trace!(cue = kind.name(), "sound");
        Ok(())
    }
}

/// Records cues for inspection, optionally failing every call.
#[derive(Debug, Default, Clone)]
pub struct RecordingEffects {
    /// Visual cues received
    pub visuals: Vec<(VisualKind, Anchor)>,
    /// Sound cues received
    pub sounds: Vec<SoundKind>,
    /// Reject every cue with an error after recording it
    pub failing: bool,
}

impl RecordingEffects {
    /// Sink that records and then reports failure.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Number of recorded visuals of a kind.
    #[must_use]
    pub fn count_visual(&self, kind: VisualKind) -> usize {
        self.visuals.iter().filter(|(k, _)| *k == kind).count()
    }

    /// Number of recorded sounds of a kind.
    #[must_use]
    pub fn count_sound(&self, kind: SoundKind) -> usize {
        self.sounds.iter().filter(|k| **k == kind).count()
    }
}

impl Effects for RecordingEffects {
    fn visual(&mut self, kind: VisualKind, anchor: Anchor) -> Result<(), EffectError> {
        self.visuals.push((kind, anchor));
        if self.failing {
            return Err(EffectError::Failed {
                cue: kind.name(),
                reason: "renderer lost".to_string(),
            });
        }
        Ok(())
    }

    fn sound(&mut self, kind: SoundKind) -> Result<(), EffectError> {
        self.sounds.push(kind);
        if self.failing {
            return Err(EffectError::Unavailable("no audio device".to_string()));
        }
        Ok(())
    }
}
