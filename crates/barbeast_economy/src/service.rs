//! # Economy Service
//!
//! Store-backed entry points for the economy actions. Each call is one
//! read-transition-commit cycle through [`execute`], so concurrent calls for
//! the same user serialize on the document version and every idempotency
//! flag is honored across processes.
//!
//! ## Battle Flow
//!
//! ```text
//! charge_entry_fee ──> (simulate) ──> record_battle_result ──> settle_battle
//!   entry_fee_charged                   status = COMPLETED       reward_granted
//! ```

use chrono::{DateTime, Utc};

use crate::calendar::ActionContext;
use crate::config::EconomyConfig;
use crate::crafting::{apply_craft, CraftCatalog, CraftOutcome};
use crate::entry_fee::{apply_entry_fee, EntryFeeOutcome};
use crate::error::{EconomyError, EconomyResult};
use crate::login::{resolve_daily_login, DailyLoginOutcome};
use crate::reward::{apply_battle_rewards, SettlementOutcome};
use crate::scan::{apply_scan, ScanOutcome};
use crate::state::{BattleRecord, Transition};
use crate::store::{execute, DocumentUpdate, EconomyStore, UserDocument};

/// Commit attempts before a contended action gives up.
pub const DEFAULT_COMMIT_ATTEMPTS: u32 = 5;

/// Economy actions over a store.
#[derive(Debug)]
pub struct EconomyService<S> {
    store: S,
    config: EconomyConfig,
    catalog: CraftCatalog,
    max_attempts: u32,
}

impl<S: EconomyStore> EconomyService<S> {
    /// Creates a service over `store`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if `config` does not validate.
    pub fn new(store: S, config: EconomyConfig) -> EconomyResult<Self> {
        config.validate()?;
        let catalog = CraftCatalog::from_config(&config.crafting)?;
        Ok(Self {
            store,
            config,
            catalog,
            max_attempts: DEFAULT_COMMIT_ATTEMPTS,
        })
    }

    /// Sets the commit attempt limit.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// The underlying store.
    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// Day keys for an action at `at`.
    #[must_use]
    pub fn context_at(&self, at: DateTime<Utc>) -> ActionContext {
        ActionContext::new(at, &self.config.calendar)
    }

    /// Current document for `user_id`.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn snapshot(&self, user_id: &str) -> EconomyResult<UserDocument> {
        self.store.load(user_id).map(|v| v.value)
    }

    /// Charges the entry fee for `battle_id`, opening the battle if needed.
    ///
    /// # Errors
    ///
    /// `InsufficientFunds` or store errors.
    pub fn charge_entry_fee(
        &self,
        user_id: &str,
        battle_id: &str,
        ctx: &ActionContext,
    ) -> EconomyResult<EntryFeeOutcome> {
        self.run(user_id, |doc| {
            let battle = doc
                .battle(battle_id)
                .cloned()
                .unwrap_or_else(|| BattleRecord::new(battle_id));
            let t = apply_entry_fee(&doc.economy, &battle, ctx, &self.config.entry_fee)?;
            let battle = t.result.battle.clone();
            Ok(doc.apply_with_battle(t, battle))
        })
    }

    /// Records the winner of `battle_id`. Settlement flags are preserved and
    /// re-recording the same winner is a no-op.
    ///
    /// # Errors
    ///
    /// `BattleAlreadyCompleted` if another winner is on record, or store
    /// errors.
    pub fn record_battle_result(
        &self,
        user_id: &str,
        battle_id: &str,
        winner_id: &str,
    ) -> EconomyResult<BattleRecord> {
        self.run(user_id, |doc| {
            let battle = doc
                .battle(battle_id)
                .cloned()
                .unwrap_or_else(|| BattleRecord::new(battle_id))
                .record_winner(winner_id)?;
            let unchanged = Transition::unchanged(&doc.economy, battle.clone());
            Ok(doc.apply_with_battle(unchanged, battle))
        })
    }

    /// Settles the rewards of a completed battle exactly once.
    ///
    /// # Errors
    ///
    /// `BattleNotCompleted` if the battle is unknown or unfinished, or store
    /// errors.
    pub fn settle_battle(
        &self,
        user_id: &str,
        battle_id: &str,
        ctx: &ActionContext,
    ) -> EconomyResult<SettlementOutcome> {
        self.run(user_id, |doc| {
            let battle = doc
                .battle(battle_id)
                .ok_or_else(|| EconomyError::BattleNotCompleted(battle_id.to_string()))?;
            let t = apply_battle_rewards(&doc.economy, battle, ctx, &self.config)?;
            let battle = t.result.battle.clone();
            Ok(doc.apply_with_battle(t, battle))
        })
    }

    /// Processes one scan action.
    ///
    /// # Errors
    ///
    /// `InvalidBarcode` or store errors.
    pub fn scan(
        &self,
        user_id: &str,
        scan_id: &str,
        raw_barcode: &str,
        ctx: &ActionContext,
    ) -> EconomyResult<ScanOutcome> {
        self.run(user_id, |doc| {
            let t = apply_scan(&doc.economy, scan_id, raw_barcode, ctx, &self.config)?;
            Ok(doc.apply(t))
        })
    }

    /// Claims today's login bonus.
    ///
    /// # Errors
    ///
    /// Returns store errors.
    pub fn claim_daily_login(
        &self,
        user_id: &str,
        ctx: &ActionContext,
    ) -> EconomyResult<DailyLoginOutcome> {
        self.run(user_id, |doc| {
            let t = resolve_daily_login(&doc.economy, ctx, &self.config.login)?;
            Ok(doc.apply(t))
        })
    }

    /// Crafts `quantity` units of `item_id`.
    ///
    /// # Errors
    ///
    /// `UnknownItem`, `InvalidQuantity`, `InsufficientFunds` or store errors.
    pub fn craft(
        &self,
        user_id: &str,
        item_id: &str,
        quantity: u32,
        ctx: &ActionContext,
    ) -> EconomyResult<CraftOutcome> {
        self.run(user_id, |doc| {
            let t = apply_craft(&doc.economy, &self.catalog, item_id, quantity, ctx)?;
            Ok(doc.apply(t))
        })
    }

    fn run<R, F>(&self, user_id: &str, transition: F) -> EconomyResult<R>
    where
        F: FnMut(&UserDocument) -> EconomyResult<DocumentUpdate<R>>,
    {
        execute(&self.store, user_id, self.max_attempts, transition)
    }
}
