//! # Economy State
//!
//! The persisted per-user snapshot and the per-battle record. Transitions
//! read a snapshot and return a new one; they never mutate in place.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use barbeast_procedural::CanonicalBarcode;

use crate::calendar::DateKey;
use crate::error::{EconomyError, EconomyResult};
use crate::ledger::LedgerEntry;

/// Per-day scan bookkeeping.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanDailyState {
    /// Day the counters belong to.
    pub date_key: Option<DateKey>,
    /// First-scan bonuses awarded on `date_key`.
    pub issued_count: u32,
    /// Barcodes that already earned a bonus on `date_key`.
    pub barcodes: BTreeSet<CanonicalBarcode>,
}

impl ScanDailyState {
    /// This state if it belongs to `today`, otherwise a fresh one.
    #[must_use]
    pub fn for_day(&self, today: DateKey) -> Self {
        if self.date_key == Some(today) {
            self.clone()
        } else {
            Self {
                date_key: Some(today),
                ..Self::default()
            }
        }
    }
}

/// Per-user economy snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyState {
    /// Credit balance.
    pub credits: u64,
    /// Lifetime experience.
    pub xp: u64,
    /// Level derived from `xp`.
    pub level: u32,
    /// Scan-token balance.
    pub scan_tokens: u64,
    /// Day the battle counters belong to.
    pub daily_battle_date_key: Option<DateKey>,
    /// Battle credits earned on `daily_battle_date_key`.
    pub daily_battle_credits_earned: u64,
    /// Battle XP earned on `daily_battle_date_key`.
    pub daily_battle_xp_earned: u64,
    /// Consecutive daily logins.
    pub login_streak: u32,
    /// Longest streak ever.
    pub max_login_streak: u32,
    /// Last day the login bonus was claimed.
    pub last_daily_claim_date_key: Option<DateKey>,
    /// Badges earned, in award order. Never contains duplicates.
    pub badge_ids: Vec<String>,
    /// Crafted item counts.
    pub craft_inventory: BTreeMap<String, u32>,
    /// Scan bonus bookkeeping.
    pub scan_daily: ScanDailyState,
    /// Recently processed scan action ids and the day each landed.
    ///
    /// Outlives the daily reset so a retry across the cutoff stays a no-op.
    pub processed_scan_ids: BTreeMap<String, DateKey>,
}

impl Default for EconomyState {
    fn default() -> Self {
        Self {
            credits: 0,
            xp: 0,
            level: 1,
            scan_tokens: 0,
            daily_battle_date_key: None,
            daily_battle_credits_earned: 0,
            daily_battle_xp_earned: 0,
            login_streak: 0,
            max_login_streak: 0,
            last_daily_claim_date_key: None,
            badge_ids: Vec::new(),
            craft_inventory: BTreeMap::new(),
            scan_daily: ScanDailyState::default(),
            processed_scan_ids: BTreeMap::new(),
        }
    }
}

impl EconomyState {
    /// Fresh state for a new user.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets starting balances.
    #[must_use]
    pub const fn with_balances(mut self, credits: u64, scan_tokens: u64) -> Self {
        self.credits = credits;
        self.scan_tokens = scan_tokens;
        self
    }

    /// Number of crafted `item_id` held.
    #[must_use]
    pub fn item_count(&self, item_id: &str) -> u32 {
        self.craft_inventory.get(item_id).copied().unwrap_or(0)
    }

    /// Whether `badge_id` has been earned.
    #[must_use]
    pub fn has_badge(&self, badge_id: &str) -> bool {
        self.badge_ids.iter().any(|b| b == badge_id)
    }
}

/// Lifecycle of a battle record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleStatus {
    /// Created, not yet simulated.
    #[default]
    Pending,
    /// Simulated, winner known.
    Completed,
}

/// Per-battle settlement flags.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleRecord {
    /// Stable battle identifier.
    pub battle_id: String,
    /// Lifecycle status.
    pub status: BattleStatus,
    /// Winner once completed.
    pub winner_id: Option<String>,
    /// Entry fee already charged.
    #[serde(default)]
    pub entry_fee_charged: bool,
    /// Rewards already granted.
    #[serde(default)]
    pub reward_granted: bool,
}

impl BattleRecord {
    /// A pending battle with no flags set.
    #[must_use]
    pub fn new(battle_id: impl Into<String>) -> Self {
        Self {
            battle_id: battle_id.into(),
            status: BattleStatus::Pending,
            winner_id: None,
            entry_fee_charged: false,
            reward_granted: false,
        }
    }

    /// Marks the battle completed with `winner_id`.
    #[must_use]
    pub fn complete(mut self, winner_id: impl Into<String>) -> Self {
        self.status = BattleStatus::Completed;
        self.winner_id = Some(winner_id.into());
        self
    }

    /// Records the result of the battle. `Completed` is terminal: recording
    /// the same winner again returns the record unchanged.
    ///
    /// # Errors
    ///
    /// Returns `BattleAlreadyCompleted` if a different winner is on record.
    pub fn record_winner(&self, winner_id: &str) -> EconomyResult<Self> {
        match (&self.status, &self.winner_id) {
            (BattleStatus::Pending, _) => Ok(self.clone().complete(winner_id)),
            (BattleStatus::Completed, Some(recorded)) if recorded == winner_id => Ok(self.clone()),
            (BattleStatus::Completed, recorded) => Err(EconomyError::BattleAlreadyCompleted {
                battle_id: self.battle_id.clone(),
                winner_id: recorded.clone().unwrap_or_default(),
            }),
        }
    }

    /// Whether the battle has a result.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == BattleStatus::Completed
    }
}

/// Output of a pure economy transition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition<R> {
    /// State to persist.
    pub next_state: EconomyState,
    /// Audit record for the change. `None` when nothing changed.
    pub ledger_entry: Option<LedgerEntry>,
    /// Operation-specific result.
    pub result: R,
}

impl<R> Transition<R> {
    /// A transition that changes nothing.
    #[must_use]
    pub fn unchanged(state: &EconomyState, result: R) -> Self {
        Self {
            next_state: state.clone(),
            ledger_entry: None,
            result,
        }
    }

    /// Whether this transition writes nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.ledger_entry.is_none()
    }
}

/// `balance + amount`, failing on overflow.
pub(crate) fn credit(balance: u64, amount: u64) -> EconomyResult<u64> {
    balance
        .checked_add(amount)
        .ok_or(EconomyError::ArithmeticOverflow)
}

/// Positive ledger delta for `amount`.
pub(crate) fn gain(amount: u64) -> EconomyResult<i64> {
    i64::try_from(amount).map_err(|_| EconomyError::ArithmeticOverflow)
}

/// Negative ledger delta for `amount`.
pub(crate) fn loss(amount: u64) -> EconomyResult<i64> {
    gain(amount).map(|d| -d)
}
