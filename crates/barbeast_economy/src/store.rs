//! # Store Boundary
//!
//! **Compare-and-Set Persistence**
//!
//! The pure transitions only promise "at most once" if the snapshot they
//! read is the snapshot they replace. [`EconomyStore::commit`] enforces that
//! with a version check: the user document and its ledger entry are written
//! together, and only if nobody committed in between. [`execute`] runs the
//! whole read-transition-write cycle and re-runs it after a lost race, so the
//! second attempt sees the first writer's flags and becomes a no-op.
//!
//! ## Guarantees
//!
//! 1. **Atomicity**: document and ledger entry commit together or not at all
//! 2. **Isolation**: a stale version never overwrites a newer one
//! 3. **No-op reads**: transitions that change nothing never write

use std::collections::{BTreeMap, HashMap};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{EconomyError, EconomyResult};
use crate::ledger::{EconomyLedger, LedgerEntry};
use crate::state::{BattleRecord, EconomyState, Transition};

/// Everything persisted for one user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserDocument {
    /// Balances and daily counters.
    pub economy: EconomyState,
    /// Battle records by battle id.
    pub battles: BTreeMap<String, BattleRecord>,
}

impl UserDocument {
    /// Looks up a battle record.
    #[must_use]
    pub fn battle(&self, battle_id: &str) -> Option<&BattleRecord> {
        self.battles.get(battle_id)
    }

    /// Folds an economy transition into a document update.
    #[must_use]
    pub fn apply<R>(&self, transition: Transition<R>) -> DocumentUpdate<R> {
        let mut document = self.clone();
        document.economy = transition.next_state;
        DocumentUpdate {
            document,
            ledger_entry: transition.ledger_entry,
            result: transition.result,
        }
    }

    /// Like [`Self::apply`], also replacing one battle record.
    #[must_use]
    pub fn apply_with_battle<R>(
        &self,
        transition: Transition<R>,
        battle: BattleRecord,
    ) -> DocumentUpdate<R> {
        let mut update = self.apply(transition);
        update
            .document
            .battles
            .insert(battle.battle_id.clone(), battle);
        update
    }
}

/// A value with its store version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Versioned<T> {
    /// Store version; 0 means never written.
    pub version: u64,
    /// The value.
    pub value: T,
}

/// A document write produced from a snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentUpdate<R> {
    /// Document to write.
    pub document: UserDocument,
    /// Ledger entry to append with it.
    pub ledger_entry: Option<LedgerEntry>,
    /// Operation result.
    pub result: R,
}

/// Transactional persistence for user documents and their ledgers.
pub trait EconomyStore: Send + Sync {
    /// Reads a user's document. Unknown users read as a default document at
    /// version 0.
    ///
    /// # Errors
    ///
    /// Returns `Store` on backend failure.
    fn load(&self, user_id: &str) -> EconomyResult<Versioned<UserDocument>>;

    /// Writes `document` and appends `ledger_entry` if the stored version is
    /// still `expected_version`. Returns the new version.
    ///
    /// # Errors
    ///
    /// - `StoreConflict` if another writer committed first
    /// - `Store` on backend failure
    fn commit(
        &self,
        user_id: &str,
        expected_version: u64,
        document: UserDocument,
        ledger_entry: Option<LedgerEntry>,
    ) -> EconomyResult<u64>;
}

/// Runs `transition` against the user's current document and commits the
/// result, retrying from a fresh read when the load or the commit fails with
/// a retryable error.
///
/// # Errors
///
/// Returns the transition's error, or the last store error once
/// `max_attempts` are exhausted.
pub fn execute<S, R, F>(
    store: &S,
    user_id: &str,
    max_attempts: u32,
    mut transition: F,
) -> EconomyResult<R>
where
    S: EconomyStore + ?Sized,
    F: FnMut(&UserDocument) -> EconomyResult<DocumentUpdate<R>>,
{
    let mut last_error = EconomyError::Store(format!("no attempts for {user_id}"));

    for attempt in 1..=max_attempts.max(1) {
        let snapshot = match store.load(user_id) {
            Ok(snapshot) => snapshot,
            Err(e) if e.is_retryable() => {
                warn!(user_id, attempt, error = %e, "load failed, retrying");
                last_error = e;
                continue;
            }
            Err(e) => return Err(e),
        };
        let update = transition(&snapshot.value)?;

        if update.ledger_entry.is_none() && update.document == snapshot.value {
            debug!(user_id, "nothing to commit");
            return Ok(update.result);
        }

        match store.commit(user_id, snapshot.version, update.document, update.ledger_entry) {
            Ok(version) => {
                debug!(user_id, version, "committed");
                return Ok(update.result);
            }
            Err(e) if e.is_retryable() => {
                warn!(user_id, attempt, error = %e, "commit failed, retrying");
                last_error = e;
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_error)
}

#[derive(Debug, Default)]
struct StoredUser {
    version: u64,
    document: UserDocument,
    ledger: EconomyLedger,
}

/// In-process store. Reference implementation of the commit contract.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<HashMap<String, StoredUser>>,
}

impl MemoryStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of a user's ledger.
    #[must_use]
    pub fn ledger(&self, user_id: &str) -> EconomyLedger {
        self.users
            .lock()
            .get(user_id)
            .map(|u| u.ledger.clone())
            .unwrap_or_default()
    }

    /// Number of users with a committed document.
    #[must_use]
    pub fn user_count(&self) -> usize {
        self.users.lock().len()
    }
}

impl EconomyStore for MemoryStore {
    fn load(&self, user_id: &str) -> EconomyResult<Versioned<UserDocument>> {
        let users = self.users.lock();
        Ok(users.get(user_id).map_or_else(
            || Versioned {
                version: 0,
                value: UserDocument::default(),
            },
            |u| Versioned {
                version: u.version,
                value: u.document.clone(),
            },
        ))
    }

    fn commit(
        &self,
        user_id: &str,
        expected_version: u64,
        document: UserDocument,
        ledger_entry: Option<LedgerEntry>,
    ) -> EconomyResult<u64> {
        let mut users = self.users.lock();
        let actual = users.get(user_id).map_or(0, |u| u.version);
        if actual != expected_version {
            return Err(EconomyError::StoreConflict {
                user_id: user_id.to_string(),
                expected: expected_version,
                actual,
            });
        }

        let stored = users.entry(user_id.to_string()).or_default();
        stored.version += 1;
        stored.document = document;
        if let Some(entry) = ledger_entry {
            stored.ledger.append(entry);
        }
        Ok(stored.version)
    }
}
