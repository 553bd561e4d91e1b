//! The two sides of a round.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Side a combatant fights for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Team {
    /// Police squad
    #[default]
    Police,
    /// Criminal faction
    Criminal,
}

impl Team {
    /// Both teams, in a fixed order.
    pub const ALL: [Self; 2] = [Self::Police, Self::Criminal];

    /// Returns the opposing team.
    #[must_use]
    pub const fn enemy(self) -> Self {
        match self {
            Self::Police => Self::Criminal,
            Self::Criminal => Self::Police,
        }
    }

    /// Returns the lowercase name used in config files and logs.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Police => "police",
            Self::Criminal => "criminal",
        }
    }

    /// Returns a stable index for per-team tables.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Police => 0,
            Self::Criminal => 1,
        }
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
