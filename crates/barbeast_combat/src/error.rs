//! # Combat Error Types

use thiserror::Error;

/// Errors that can occur when setting up a battle.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CombatError {
    /// Battle id is empty; it keys the roll stream.
    #[error("battle id must not be empty")]
    EmptyBattleId,

    /// Both entities share an id, so turn order ties cannot be broken.
    #[error("both combatants have id {0}")]
    DuplicateEntityId(String),

    /// An entity entered the battle with no hit points.
    #[error("entity {0} has no hit points")]
    EntityDown(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for combat operations.
pub type CombatResult<T> = Result<T, CombatError>;
