//! # Reward Settlement
//!
//! **Exactly-Once Battle Rewards**
//!
//! A completed battle pays XP, credits and scan tokens to the settling user
//! at most once. The `reward_granted` flag on the battle record is the
//! idempotency key: a second settlement of the same battle returns
//! `ALREADY_PROCESSED` with zero deltas and writes nothing.
//!
//! Credits are subject to a per-day cap. XP and scan tokens are not. When
//! the cap bites the settlement still succeeds with the reduced (possibly
//! zero) credit amount and reports `DAILY_CAP`.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calendar::{ActionContext, DateKey};
use crate::config::EconomyConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::ledger::{LedgerEntry, LedgerKind};
use crate::state::{credit, gain, BattleRecord, EconomyState, Transition};

/// Why a settlement paid less than nominal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SettlementReason {
    /// Rewards for this battle were already granted.
    AlreadyProcessed,
    /// The daily credits cap reduced the credit reward.
    DailyCap,
}

/// Result of settling one battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementOutcome {
    /// Whether this call granted anything.
    pub granted: bool,
    /// Why the grant was skipped or reduced.
    pub reason: Option<SettlementReason>,
    /// Whether the cap reduced the credit reward.
    pub daily_cap_applied: bool,
    /// Winner recorded on the battle.
    pub winner_id: Option<String>,
    /// Credits granted.
    pub credits_delta: u64,
    /// XP granted.
    pub xp_delta: u64,
    /// Scan tokens granted.
    pub scan_tokens_delta: u64,
    /// XP before settlement.
    pub xp_before: u64,
    /// XP after settlement.
    pub xp_after: u64,
    /// Level before settlement.
    pub level_before: u32,
    /// Level after settlement.
    pub level_after: u32,
    /// Day the counters below belong to.
    pub daily_battle_date_key: Option<DateKey>,
    /// Battle credits earned that day, after this settlement.
    pub daily_battle_credits_earned: u64,
    /// Battle XP earned that day, after this settlement.
    pub daily_battle_xp_earned: u64,
    /// Battle record to persist alongside the new state.
    pub battle: BattleRecord,
}

impl SettlementOutcome {
    fn already_processed(state: &EconomyState, battle: &BattleRecord) -> Self {
        Self {
            granted: false,
            reason: Some(SettlementReason::AlreadyProcessed),
            daily_cap_applied: false,
            winner_id: battle.winner_id.clone(),
            credits_delta: 0,
            xp_delta: 0,
            scan_tokens_delta: 0,
            xp_before: state.xp,
            xp_after: state.xp,
            level_before: state.level,
            level_after: state.level,
            daily_battle_date_key: state.daily_battle_date_key,
            daily_battle_credits_earned: state.daily_battle_credits_earned,
            daily_battle_xp_earned: state.daily_battle_xp_earned,
            battle: battle.clone(),
        }
    }
}

/// Credits still payable today: `min(nominal, cap - earned)`, never negative.
#[must_use]
pub const fn capped_credits(nominal: u64, earned_today: u64, cap: u64) -> u64 {
    let remaining = cap.saturating_sub(earned_today);
    if nominal < remaining {
        nominal
    } else {
        remaining
    }
}

/// Settles the rewards for a completed battle.
///
/// # Errors
///
/// - `BattleNotCompleted` if the battle has no result yet
/// - `ArithmeticOverflow` if a balance would overflow
pub fn apply_battle_rewards(
    state: &EconomyState,
    battle: &BattleRecord,
    ctx: &ActionContext,
    config: &EconomyConfig,
) -> EconomyResult<Transition<SettlementOutcome>> {
    if battle.reward_granted {
        debug!(battle_id = %battle.battle_id, "rewards already granted");
        return Ok(Transition::unchanged(
            state,
            SettlementOutcome::already_processed(state, battle),
        ));
    }
    if !battle.is_completed() {
        return Err(EconomyError::BattleNotCompleted(battle.battle_id.clone()));
    }

    let rewards = &config.rewards;
    let same_day = state.daily_battle_date_key == Some(ctx.today);
    let (earned_credits, earned_xp) = if same_day {
        (state.daily_battle_credits_earned, state.daily_battle_xp_earned)
    } else {
        (0, 0)
    };

    let credits = capped_credits(rewards.credits, earned_credits, rewards.daily_credits_cap);
    let daily_cap_applied = credits < rewards.credits;

    let mut next = state.clone();
    next.credits = credit(state.credits, credits)?;
    next.xp = credit(state.xp, rewards.xp)?;
    next.scan_tokens = credit(state.scan_tokens, rewards.scan_tokens)?;
    next.level = config.progression.level_for_xp(next.xp);
    next.daily_battle_date_key = Some(ctx.today);
    next.daily_battle_credits_earned = credit(earned_credits, credits)?;
    next.daily_battle_xp_earned = credit(earned_xp, rewards.xp)?;

    let entry = LedgerEntry::new(LedgerKind::BattleReward, battle.battle_id.as_str(), ctx.at)
        .credits(gain(credits)?)
        .xp(gain(rewards.xp)?)
        .scan_tokens(gain(rewards.scan_tokens)?);

    let mut settled = battle.clone();
    settled.reward_granted = true;

    if daily_cap_applied {
        info!(
            battle_id = %battle.battle_id,
            nominal = rewards.credits,
            granted = credits,
            "daily credits cap applied"
        );
    }
    if next.level > state.level {
        info!(from = state.level, to = next.level, "level up");
    }
    debug!(battle_id = %battle.battle_id, credits, xp = rewards.xp, "battle rewards settled");

    let result = SettlementOutcome {
        granted: true,
        reason: daily_cap_applied.then_some(SettlementReason::DailyCap),
        daily_cap_applied,
        winner_id: battle.winner_id.clone(),
        credits_delta: credits,
        xp_delta: rewards.xp,
        scan_tokens_delta: rewards.scan_tokens,
        xp_before: state.xp,
        xp_after: next.xp,
        level_before: state.level,
        level_after: next.level,
        daily_battle_date_key: next.daily_battle_date_key,
        daily_battle_credits_earned: next.daily_battle_credits_earned,
        daily_battle_xp_earned: next.daily_battle_xp_earned,
        battle: settled,
    };

    Ok(Transition {
        next_state: next,
        ledger_entry: Some(entry),
        result,
    })
}
