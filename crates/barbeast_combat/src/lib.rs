//! # BARBEAST Combat
//!
//! Deterministic turn-based battles between two barcode creatures.
//!
//! ## Design Principles
//!
//! 1. **Replayable**: The same inputs reproduce the same event log, byte for byte
//! 2. **Seeded**: Crit rolls come from a stream keyed by `(battle_id, turn, actor)`
//! 3. **Immutable inputs**: Entities are never mutated; the log is the output
//!
//! ## Battle Flow
//!
//! ```text
//! START ──> TURN ──> ACTION ──> DAMAGE ──> STATUS? ──> ... ──> RESULT
//!            ▲                                   │
//!            └─────────── next turn ─────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use barbeast_combat::{simulate_battle, CombatEntity};
//! use barbeast_procedural::{normalize_to_ean13, Terrain};
//!
//! let a = CombatEntity::from_barcode(&normalize_to_ean13("4006381333931").unwrap(), 1);
//! let b = CombatEntity::from_barcode(&normalize_to_ean13("012345678905").unwrap(), 1);
//!
//! let outcome = simulate_battle(&a, &b, "battle-1", Terrain::Ice).unwrap();
//! assert_eq!(outcome.logs.last().unwrap().event_type(), "RESULT");
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod entity;
pub mod error;
pub mod event;
pub mod rng;
pub mod simulator;

pub use config::BattleConfig;
pub use entity::{Burn, CombatEntity, Skill};
pub use error::{CombatError, CombatResult};
pub use event::{
    BattleEvent, BattleEventKind, BattleEventLog, EndReason, EventCause, Severity, StatusChange,
};
pub use rng::BattleRng;
pub use simulator::{simulate_battle, BattleOutcome, BattleSimulator};
