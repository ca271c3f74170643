//! # BARBEAST Economy System
//!
//! Server-authoritative settlement of everything a player can earn or spend.
//!
//! ## Design Principles
//!
//! 1. **Pure transitions** - Every action is `(snapshot, request) -> (next snapshot, ledger entry, result)`
//! 2. **Exactly once** - Idempotency comes from persisted flags and day keys, never from memory
//! 3. **Integers only** - Balances are `u64`, ledger deltas are `i64`, overflow is an error
//! 4. **External configuration** - All amounts and caps in one TOML file
//!
//! ## Thread Safety
//!
//! Transitions hold no state. Concurrency is resolved at the store boundary
//! by compare-and-set commits (see [`store`]).
//!
//! ## Example
//!
//! ```rust
//! use barbeast_economy::{
//!     apply_battle_rewards, ActionContext, BattleRecord, EconomyConfig, EconomyState,
//! };
//!
//! let config = EconomyConfig::default();
//! let ctx = ActionContext::now(&config.calendar);
//! let battle = BattleRecord::new("battle-1").complete("creature-a");
//!
//! let settled = apply_battle_rewards(&EconomyState::new(), &battle, &ctx, &config).unwrap();
//! assert_eq!(settled.next_state.credits, 20);
//!
//! let again =
//!     apply_battle_rewards(&settled.next_state, &settled.result.battle, &ctx, &config).unwrap();
//! assert!(!again.result.granted);
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod calendar;
pub mod config;
pub mod crafting;
pub mod entry_fee;
pub mod error;
pub mod ledger;
pub mod login;
pub mod progression;
pub mod reward;
pub mod scan;
pub mod service;
pub mod state;
pub mod store;

pub use calendar::{ActionContext, CalendarConfig, DateKey};
pub use config::{
    BadgeThreshold, CraftingConfig, EconomyConfig, EntryFeeConfig, LoginConfig, RewardConfig,
    ScanConfig,
};
pub use crafting::{apply_craft, CraftBalances, CraftCatalog, CraftCosts, CraftItem, CraftOutcome};
pub use entry_fee::{apply_entry_fee, resolve_entry_fee, EntryFeeOutcome, EntryFeeResolution};
pub use error::{EconomyError, EconomyResult, Resource};
pub use ledger::{EconomyLedger, LedgerDelta, LedgerEntry, LedgerKind};
pub use login::{resolve_daily_login, DailyLoginOutcome};
pub use progression::ProgressionConfig;
pub use reward::{apply_battle_rewards, capped_credits, SettlementOutcome, SettlementReason};
pub use scan::{
    apply_scan, apply_scan_daily_award, apply_scan_token_grant, ScanAwardReason, ScanDailyAward,
    ScanOutcome,
};
pub use service::{EconomyService, DEFAULT_COMMIT_ATTEMPTS};
pub use state::{BattleRecord, BattleStatus, EconomyState, ScanDailyState, Transition};
pub use store::{execute, DocumentUpdate, EconomyStore, MemoryStore, UserDocument, Versioned};
