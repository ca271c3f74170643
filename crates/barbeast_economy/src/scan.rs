//! # Scan Tokens
//!
//! Every scan action grants a fixed number of scan tokens. The first scan of
//! a given barcode on a given day additionally earns a bonus, up to a daily
//! number of bonuses. Both halves are composed into one transition so the
//! grant and the bonus land in a single ledger entry and a single write.
//!
//! Scan actions carry a caller-supplied id. Replaying an id is a no-op for as
//! long as it is retained, which spans at least one day cutoff. Ids older than
//! the retention window are pruned whenever a new scan lands.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use barbeast_procedural::{normalize_to_ean13, CanonicalBarcode};

use crate::calendar::{ActionContext, DateKey};
use crate::config::EconomyConfig;
use crate::error::{EconomyError, EconomyResult};
use crate::ledger::{LedgerEntry, LedgerKind};
use crate::state::{credit, gain, EconomyState, ScanDailyState, Transition};

/// Why no first-scan bonus was awarded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ScanAwardReason {
    /// This barcode already earned today's bonus.
    AlreadyAwarded,
    /// Today's bonus limit is used up.
    DailyLimit,
}

/// Result of the first-scan bonus check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanDailyAward {
    /// Whether the bonus is awarded.
    pub awarded: bool,
    /// Bonuses issued today, including this one.
    pub issued_count: u32,
    /// Why the bonus was withheld.
    pub reason: Option<ScanAwardReason>,
    /// Bookkeeping to persist.
    pub state: ScanDailyState,
}

/// Adds the per-scan grant to `current_tokens`.
///
/// # Errors
///
/// Returns `ArithmeticOverflow` if the balance would overflow.
pub fn apply_scan_token_grant(current_tokens: u64, tokens_per_scan: u64) -> EconomyResult<u64> {
    credit(current_tokens, tokens_per_scan)
}

/// Decides the first-scan bonus for `barcode` on `today`.
///
/// Counters from another day are discarded first.
#[must_use]
pub fn apply_scan_daily_award(
    state: &ScanDailyState,
    barcode: &CanonicalBarcode,
    today: DateKey,
    max_daily: u32,
) -> ScanDailyAward {
    let mut day = state.for_day(today);

    if day.barcodes.contains(barcode) {
        return ScanDailyAward {
            awarded: false,
            issued_count: day.issued_count,
            reason: Some(ScanAwardReason::AlreadyAwarded),
            state: day,
        };
    }
    if day.issued_count >= max_daily {
        return ScanDailyAward {
            awarded: false,
            issued_count: day.issued_count,
            reason: Some(ScanAwardReason::DailyLimit),
            state: day,
        };
    }

    day.issued_count += 1;
    day.barcodes.insert(barcode.clone());
    ScanDailyAward {
        awarded: true,
        issued_count: day.issued_count,
        reason: None,
        state: day,
    }
}

/// Result of one scan action.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanOutcome {
    /// Canonical form of the scanned code.
    pub barcode: CanonicalBarcode,
    /// False when `scan_id` was already processed.
    pub processed: bool,
    /// Per-scan tokens granted.
    pub tokens_granted: u64,
    /// Whether the first-scan bonus was awarded.
    pub bonus_awarded: bool,
    /// Bonus tokens granted.
    pub bonus_tokens: u64,
    /// Why the bonus was withheld.
    pub bonus_reason: Option<ScanAwardReason>,
    /// Bonuses issued today.
    pub issued_count: u32,
    /// Token balance after the scan.
    pub scan_tokens_after: u64,
}

/// Applies one scan action: normalization, per-scan grant and first-scan bonus.
///
/// # Errors
///
/// - `InvalidBarcode` if `raw_barcode` does not normalize
/// - `ArithmeticOverflow` if the balance would overflow
pub fn apply_scan(
    state: &EconomyState,
    scan_id: &str,
    raw_barcode: &str,
    ctx: &ActionContext,
    config: &EconomyConfig,
) -> EconomyResult<Transition<ScanOutcome>> {
    let barcode = normalize_to_ean13(raw_barcode).map_err(EconomyError::from)?;
    let scan = &config.scan;

    let day = state.scan_daily.for_day(ctx.today);
    if let Some(processed_on) = state.processed_scan_ids.get(scan_id) {
        debug!(scan_id, %processed_on, "scan already processed");
        return Ok(Transition::unchanged(
            state,
            ScanOutcome {
                barcode,
                processed: false,
                tokens_granted: 0,
                bonus_awarded: false,
                bonus_tokens: 0,
                bonus_reason: None,
                issued_count: day.issued_count,
                scan_tokens_after: state.scan_tokens,
            },
        ));
    }

    let after_grant = apply_scan_token_grant(state.scan_tokens, scan.tokens_per_scan)?;
    let mut award =
        apply_scan_daily_award(&day, &barcode, ctx.today, scan.max_daily_bonuses);
    let bonus = if award.awarded {
        scan.first_scan_bonus_tokens
    } else {
        0
    };

    let mut next = state.clone();
    next.scan_tokens = credit(after_grant, bonus)?;
    next.scan_daily = award.state;
    let oldest_kept = ctx
        .today
        .days_before(scan.scan_id_retention_days.saturating_sub(1));
    next.processed_scan_ids.retain(|_, day| *day >= oldest_kept);
    next.processed_scan_ids.insert(scan_id.to_string(), ctx.today);

    let total = credit(scan.tokens_per_scan, bonus)?;
    let entry = LedgerEntry::new(LedgerKind::Scan, scan_id, ctx.at).scan_tokens(gain(total)?);

    if award.reason == Some(ScanAwardReason::DailyLimit) {
        info!(issued = award.issued_count, "first-scan bonus limit reached");
    }
    debug!(scan_id, barcode = %barcode, tokens = total, "scan processed");

    let result = ScanOutcome {
        barcode,
        processed: true,
        tokens_granted: scan.tokens_per_scan,
        bonus_awarded: award.awarded,
        bonus_tokens: bonus,
        bonus_reason: award.reason,
        issued_count: award.issued_count,
        scan_tokens_after: next.scan_tokens,
    };

    Ok(Transition {
        next_state: next,
        ledger_entry: Some(entry),
        result,
    })
}
