//! # Economy Ledger
//!
//! **Append-Only Audit Trail**
//!
//! Every balance-changing transition produces exactly one [`LedgerEntry`].
//! Entries are never edited or removed. Summing the deltas of a user's
//! ledger must reproduce the difference between their current state and
//! the state they started with; [`EconomyLedger::reconcile`] checks that.
//!
//! ## Checksum Encoding
//!
//! ```text
//! Per entry:
//! [1 byte: kind tag]
//! [8 bytes: credits delta, LE]
//! [8 bytes: xp delta, LE]
//! [8 bytes: scan token delta, LE]
//! [4 bytes: ref id length, LE][N bytes: ref id]
//! [8 bytes: timestamp millis, LE]
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};
use crate::state::EconomyState;

/// What produced a ledger entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum LedgerKind {
    /// Battle reward settlement.
    BattleReward = 1,
    /// Battle entry fee.
    EntryFee = 2,
    /// Scan token grant and first-scan bonus.
    Scan = 3,
    /// Daily login bonus.
    DailyLogin = 4,
    /// Crafting spend.
    Craft = 5,
}

/// One audited balance change.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    /// What produced the change.
    pub kind: LedgerKind,
    /// Signed credit change.
    pub delta_credits: i64,
    /// Signed XP change.
    pub delta_xp: i64,
    /// Signed scan-token change.
    pub delta_scan_tokens: i64,
    /// Correlation id (battle id, scan id, date key, `craft:{item}:{qty}`).
    pub ref_id: String,
    /// When the action happened.
    pub timestamp: DateTime<Utc>,
}

impl LedgerEntry {
    /// An entry with all deltas zero.
    #[must_use]
    pub fn new(kind: LedgerKind, ref_id: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            kind,
            delta_credits: 0,
            delta_xp: 0,
            delta_scan_tokens: 0,
            ref_id: ref_id.into(),
            timestamp,
        }
    }

    /// Sets the credit delta.
    #[must_use]
    pub const fn credits(mut self, delta: i64) -> Self {
        self.delta_credits = delta;
        self
    }

    /// Sets the XP delta.
    #[must_use]
    pub const fn xp(mut self, delta: i64) -> Self {
        self.delta_xp = delta;
        self
    }

    /// Sets the scan-token delta.
    #[must_use]
    pub const fn scan_tokens(mut self, delta: i64) -> Self {
        self.delta_scan_tokens = delta;
        self
    }

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(self.kind as u8);
        buf.extend_from_slice(&self.delta_credits.to_le_bytes());
        buf.extend_from_slice(&self.delta_xp.to_le_bytes());
        buf.extend_from_slice(&self.delta_scan_tokens.to_le_bytes());
        let len = u32::try_from(self.ref_id.len()).unwrap_or(u32::MAX);
        buf.extend_from_slice(&len.to_le_bytes());
        buf.extend_from_slice(self.ref_id.as_bytes());
        buf.extend_from_slice(&self.timestamp.timestamp_millis().to_le_bytes());
    }
}

/// Summed deltas over a ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LedgerDelta {
    /// Net credits.
    pub credits: i128,
    /// Net XP.
    pub xp: i128,
    /// Net scan tokens.
    pub scan_tokens: i128,
}

/// A user's ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EconomyLedger {
    entries: Vec<LedgerEntry>,
}

impl EconomyLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an entry and returns its sequence number (0-based).
    pub fn append(&mut self, entry: LedgerEntry) -> u64 {
        self.entries.push(entry);
        (self.entries.len() - 1) as u64
    }

    /// All entries in append order.
    #[must_use]
    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First entry of `kind` correlated to `ref_id`.
    #[must_use]
    pub fn find_by_ref(&self, kind: LedgerKind, ref_id: &str) -> Option<&LedgerEntry> {
        self.entries
            .iter()
            .find(|e| e.kind == kind && e.ref_id == ref_id)
    }

    /// Entries of `kind` correlated to `ref_id`.
    #[must_use]
    pub fn count_by_ref(&self, kind: LedgerKind, ref_id: &str) -> usize {
        self.entries
            .iter()
            .filter(|e| e.kind == kind && e.ref_id == ref_id)
            .count()
    }

    /// Sum of all deltas.
    #[must_use]
    pub fn net_delta(&self) -> LedgerDelta {
        self.entries
            .iter()
            .fold(LedgerDelta::default(), |mut acc, e| {
                acc.credits += i128::from(e.delta_credits);
                acc.xp += i128::from(e.delta_xp);
                acc.scan_tokens += i128::from(e.delta_scan_tokens);
                acc
            })
    }

    /// Checks that the ledger explains every balance change from `genesis`
    /// to `current`.
    ///
    /// # Errors
    ///
    /// Returns `ReconciliationMismatch` naming the first diverging balance.
    pub fn reconcile(&self, genesis: &EconomyState, current: &EconomyState) -> EconomyResult<()> {
        let net = self.net_delta();
        let checks = [
            ("credits", net.credits, genesis.credits, current.credits),
            ("xp", net.xp, genesis.xp, current.xp),
            ("scan_tokens", net.scan_tokens, genesis.scan_tokens, current.scan_tokens),
        ];
        for (field, ledger, before, after) in checks {
            let state = i128::from(after) - i128::from(before);
            if ledger != state {
                return Err(EconomyError::ReconciliationMismatch {
                    field,
                    ledger,
                    state,
                });
            }
        }
        Ok(())
    }

    /// CRC32 over the encoded entries, in order.
    #[must_use]
    pub fn checksum(&self) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        let mut buf = Vec::with_capacity(64);
        for entry in &self.entries {
            buf.clear();
            entry.encode(&mut buf);
            hasher.update(&buf);
        }
        hasher.finalize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn sample_ledger() -> EconomyLedger {
        let mut ledger = EconomyLedger::new();
        ledger.append(LedgerEntry::new(LedgerKind::DailyLogin, "2024-01-01", at(0)).credits(10));
        ledger.append(
            LedgerEntry::new(LedgerKind::BattleReward, "battle-1", at(5))
                .credits(20)
                .xp(50)
                .scan_tokens(1),
        );
        ledger.append(
            LedgerEntry::new(LedgerKind::Craft, "craft:BOOST:1", at(9))
                .credits(-5)
                .scan_tokens(-1),
        );
        ledger
    }

    #[test]
    fn test_append_returns_sequence() {
        let mut ledger = EconomyLedger::new();
        assert!(ledger.is_empty());
        assert_eq!(ledger.append(LedgerEntry::new(LedgerKind::Scan, "s1", at(0))), 0);
        assert_eq!(ledger.append(LedgerEntry::new(LedgerKind::Scan, "s2", at(1))), 1);
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_net_delta_and_reconcile() {
        let ledger = sample_ledger();
        let net = ledger.net_delta();
        assert_eq!((net.credits, net.xp, net.scan_tokens), (25, 50, 0));

        let genesis = EconomyState::new().with_balances(0, 0);
        let mut current = genesis.clone();
        current.credits = 25;
        current.xp = 50;
        assert!(ledger.reconcile(&genesis, &current).is_ok());

        current.credits = 26;
        let err = ledger.reconcile(&genesis, &current).unwrap_err();
        assert_eq!(
            err,
            EconomyError::ReconciliationMismatch {
                field: "credits",
                ledger: 25,
                state: 26
            }
        );
    }

    #[test]
    fn test_find_by_ref_respects_kind() {
        let ledger = sample_ledger();
        assert!(ledger.find_by_ref(LedgerKind::BattleReward, "battle-1").is_some());
        assert!(ledger.find_by_ref(LedgerKind::EntryFee, "battle-1").is_none());
        assert_eq!(ledger.count_by_ref(LedgerKind::Craft, "craft:BOOST:1"), 1);
    }

    #[test]
    fn test_encoding_prefixes_ref_length() {
        let entry = LedgerEntry::new(LedgerKind::Craft, "craft:BOOST:2", at(0));
        let mut buf = Vec::new();
        entry.encode(&mut buf);

        // kind byte, then three i64 deltas
        assert_eq!(buf[25..29], 13u32.to_le_bytes());
        assert_eq!(&buf[29..42], b"craft:BOOST:2");
        assert_eq!(buf.len(), 42 + 8);
    }

    #[test]
    fn test_checksum_detects_tampering() {
        let ledger = sample_ledger();
        let original = ledger.checksum();
        assert_eq!(original, sample_ledger().checksum());

        let mut tampered = ledger.clone();
        tampered.entries[1].delta_credits = 2000;
        assert_ne!(tampered.checksum(), original);
    }

    #[test]
    fn test_entry_serializes_camel_case() {
        let entry = LedgerEntry::new(LedgerKind::EntryFee, "battle-9", at(0)).credits(-10);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["kind"], "ENTRY_FEE");
        assert_eq!(json["deltaCredits"], -10);
        assert_eq!(json["refId"], "battle-9");
    }
}
