//! Error types for Favela.

use thiserror::Error;

/// Top-level error type for Favela operations.
#[derive(Debug, Error)]
pub enum FavelaError {
    /// No spawn point is available for a team
    #[error("No spawn points for team {0}")]
    NoSpawnPoints(String),
}

/// Result type alias for Favela operations.
pub type FavelaResult<T> = Result<T, FavelaError>;
