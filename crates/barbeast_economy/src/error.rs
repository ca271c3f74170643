//! # Economy Error Types
//!
//! All errors that can occur in the economy system.
//!
//! Expected business outcomes that are NOT failures (an already-settled
//! battle, a capped reward, a second login on the same day) are reported
//! inside successful results instead. What reaches the user is always
//! [`EconomyError::reason_code`], never the display message.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use barbeast_procedural::BarcodeError;

/// A spendable balance.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    /// Scan tokens.
    ScanTokens,
    /// Credits.
    Credits,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::ScanTokens => "tokens",
            Self::Credits => "credits",
        })
    }
}

/// Errors that can occur in the economy system.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EconomyError {
    /// Scanned input is not a valid barcode.
    #[error(transparent)]
    InvalidBarcode(#[from] BarcodeError),

    /// Balance too low for the requested spend.
    #[error("insufficient {resource}: need {required}, have {available}")]
    InsufficientFunds {
        /// The balance that was short.
        resource: Resource,
        /// The amount required.
        required: u64,
        /// The amount available.
        available: u64,
    },

    /// Craft item not in the catalog.
    #[error("unknown craft item: {0}")]
    UnknownItem(String),

    /// Quantity must be at least 1.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Rewards requested for a battle that has not finished.
    #[error("battle {0} is not completed")]
    BattleNotCompleted(String),

    /// A completed battle was given a different winner.
    #[error("battle {battle_id} already completed with winner {winner_id}")]
    BattleAlreadyCompleted {
        /// The battle.
        battle_id: String,
        /// Winner already on record.
        winner_id: String,
    },

    /// Arithmetic overflow in a balance calculation.
    #[error("arithmetic overflow in economic calculation")]
    ArithmeticOverflow,

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Malformed `YYYY-MM-DD` key.
    #[error("invalid date key: {0}")]
    InvalidDateKey(String),

    /// Ledger deltas do not add up to the state change.
    #[error("ledger mismatch on {field}: ledger says {ledger}, state says {state}")]
    ReconciliationMismatch {
        /// The diverging field.
        field: &'static str,
        /// Net delta according to the ledger.
        ledger: i128,
        /// Net change according to the state.
        state: i128,
    },

    /// Compare-and-set lost against a concurrent writer.
    #[error("document {user_id} changed: expected version {expected}, found {actual}")]
    StoreConflict {
        /// Document key.
        user_id: String,
        /// Version the writer read.
        expected: u64,
        /// Version currently stored.
        actual: u64,
    },

    /// Persistence layer failure.
    #[error("store failure: {0}")]
    Store(String),
}

impl EconomyError {
    /// Structured, user-visible reason code.
    #[must_use]
    pub const fn reason_code(&self) -> &'static str {
        match self {
            Self::InvalidBarcode(_) => "invalid-barcode",
            Self::InsufficientFunds {
                resource: Resource::ScanTokens,
                ..
            } => "insufficient-tokens",
            Self::InsufficientFunds {
                resource: Resource::Credits,
                ..
            } => "insufficient-credits",
            Self::UnknownItem(_) => "unknown-item",
            Self::InvalidQuantity(_) => "invalid-quantity",
            Self::BattleNotCompleted(_) => "battle-not-completed",
            Self::BattleAlreadyCompleted { .. } => "battle-already-completed",
            Self::ArithmeticOverflow => "arithmetic-overflow",
            Self::InvalidConfig(_) => "invalid-config",
            Self::InvalidDateKey(_) => "invalid-date-key",
            Self::ReconciliationMismatch { .. } => "ledger-mismatch",
            Self::StoreConflict { .. } => "store-conflict",
            Self::Store(_) => "store-failure",
        }
    }

    /// Whether re-running the whole read-transition-write cycle can succeed
    /// without new input.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreConflict { .. } | Self::Store(_))
    }
}

/// Result type for economy operations.
pub type EconomyResult<T> = Result<T, EconomyError>;
