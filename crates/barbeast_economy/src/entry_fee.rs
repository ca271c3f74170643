//! Battle entry fee.
//!
//! The fee is charged at most once per battle, keyed by the battle record's
//! `entry_fee_charged` flag. A short balance is reported, never clamped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::ActionContext;
use crate::config::EntryFeeConfig;
use crate::error::{EconomyError, EconomyResult, Resource};
use crate::ledger::{LedgerEntry, LedgerKind};
use crate::state::{loss, BattleRecord, EconomyState, Transition};

/// Pure fee decision.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFeeResolution {
    /// Whether this call charges the fee.
    pub charged: bool,
    /// Fee amount.
    pub fee: u64,
    /// Balance too low to pay.
    pub insufficient: bool,
    /// Balance after the decision.
    pub credits_after: u64,
}

/// Decides whether to charge `fee` against `credits`.
///
/// An already-charged battle reports a zero fee.
#[must_use]
pub const fn resolve_entry_fee(credits: u64, entry_fee_charged: bool, fee: u64) -> EntryFeeResolution {
    if entry_fee_charged {
        return EntryFeeResolution {
            charged: false,
            fee: 0,
            insufficient: false,
            credits_after: credits,
        };
    }
    match credits.checked_sub(fee) {
        Some(after) => EntryFeeResolution {
            charged: true,
            fee,
            insufficient: false,
            credits_after: after,
        },
        None => EntryFeeResolution {
            charged: false,
            fee,
            insufficient: true,
            credits_after: credits,
        },
    }
}

/// Result of charging a battle's entry fee.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EntryFeeOutcome {
    /// The fee decision.
    pub resolution: EntryFeeResolution,
    /// Battle record to persist alongside the new state.
    pub battle: BattleRecord,
}

/// Charges the entry fee for `battle`.
///
/// # Errors
///
/// Returns `InsufficientFunds` when the balance is below the fee.
pub fn apply_entry_fee(
    state: &EconomyState,
    battle: &BattleRecord,
    ctx: &ActionContext,
    config: &EntryFeeConfig,
) -> EconomyResult<Transition<EntryFeeOutcome>> {
    let resolution = resolve_entry_fee(state.credits, battle.entry_fee_charged, config.credits);

    if resolution.insufficient {
        return Err(EconomyError::InsufficientFunds {
            resource: Resource::Credits,
            required: resolution.fee,
            available: state.credits,
        });
    }
    if !resolution.charged {
        debug!(battle_id = %battle.battle_id, "entry fee already charged");
        return Ok(Transition::unchanged(
            state,
            EntryFeeOutcome {
                resolution,
                battle: battle.clone(),
            },
        ));
    }

    let mut next = state.clone();
    next.credits = resolution.credits_after;
    let mut charged = battle.clone();
    charged.entry_fee_charged = true;

    let entry = LedgerEntry::new(LedgerKind::EntryFee, battle.battle_id.as_str(), ctx.at)
        .credits(loss(resolution.fee)?);

    Ok(Transition {
        next_state: next,
        ledger_entry: Some(entry),
        result: EntryFeeOutcome {
            resolution,
            battle: charged,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::CalendarConfig;

    fn ctx() -> ActionContext {
        ActionContext::now(&CalendarConfig::default())
    }

    #[test]
    fn test_resolve() {
        assert_eq!(
            resolve_entry_fee(25, false, 10),
            EntryFeeResolution {
                charged: true,
                fee: 10,
                insufficient: false,
                credits_after: 15
            }
        );
        let short = resolve_entry_fee(5, false, 10);
        assert!(short.insufficient);
        assert!(!short.charged);
        assert_eq!(short.credits_after, 5);

        let again = resolve_entry_fee(25, true, 10);
        assert!(!again.charged);
        assert_eq!(again.fee, 0);
        assert_eq!(again.credits_after, 25);

        // already charged wins over a short balance
        let broke_again = resolve_entry_fee(0, true, 10);
        assert!(!broke_again.insufficient);
        assert_eq!(broke_again.fee, 0);
    }

    #[test]
    fn test_exact_balance_is_enough() {
        let r = resolve_entry_fee(10, false, 10);
        assert!(r.charged);
        assert_eq!(r.credits_after, 0);
    }

    #[test]
    fn test_charge_once_per_battle() {
        let config = EntryFeeConfig::default();
        let state = EconomyState::new().with_balances(30, 0);
        let first = apply_entry_fee(&state, &BattleRecord::new("b1"), &ctx(), &config).unwrap();
        assert_eq!(first.next_state.credits, 20);
        assert!(first.result.battle.entry_fee_charged);
        assert_eq!(first.ledger_entry.as_ref().unwrap().delta_credits, -10);

        let second =
            apply_entry_fee(&first.next_state, &first.result.battle, &ctx(), &config).unwrap();
        assert!(second.is_noop());
        assert_eq!(second.next_state.credits, 20);
        assert_eq!(second.result.resolution.fee, 0);
    }

    #[test]
    fn test_insufficient_credits() {
        let config = EntryFeeConfig::default();
        let state = EconomyState::new().with_balances(3, 0);
        let err = apply_entry_fee(&state, &BattleRecord::new("b1"), &ctx(), &config).unwrap_err();
        assert_eq!(err.reason_code(), "insufficient-credits");
        assert_eq!(
            err,
            EconomyError::InsufficientFunds {
                resource: Resource::Credits,
                required: 10,
                available: 3
            }
        );
    }
}
