//! # Crafting
//!
//! **All-or-Nothing Spend**
//!
//! Crafting converts scan tokens and credits into items from a fixed
//! catalog. Either both balances cover the full cost and the item count
//! goes up, or nothing changes.
//!
//! ## Example
//!
//! ```rust
//! use barbeast_economy::crafting::{CraftCatalog, CraftItem};
//!
//! let mut catalog = CraftCatalog::new();
//! catalog.add_item(CraftItem::new("BOOST", 2, 50)).unwrap();
//!
//! let costs = catalog.get_craft_costs("BOOST", 3).unwrap();
//! assert_eq!((costs.total_token_cost, costs.total_credit_cost), (6, 150));
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::calendar::ActionContext;
use crate::config::CraftingConfig;
use crate::error::{EconomyError, EconomyResult, Resource};
use crate::ledger::{LedgerEntry, LedgerKind};
use crate::state::{loss, EconomyState, Transition};

/// A craftable item.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CraftItem {
    /// Item identifier.
    pub id: String,
    /// Scan tokens per unit.
    pub token_cost: u64,
    /// Credits per unit.
    pub credit_cost: u64,
}

impl CraftItem {
    /// Creates a catalog entry.
    #[must_use]
    pub fn new(id: impl Into<String>, token_cost: u64, credit_cost: u64) -> Self {
        Self {
            id: id.into(),
            token_cost,
            credit_cost,
        }
    }
}

/// Total cost of a craft.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftCosts {
    /// Scan tokens consumed.
    pub total_token_cost: u64,
    /// Credits consumed.
    pub total_credit_cost: u64,
}

/// Balances going into a craft.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CraftBalances {
    /// Scan-token balance.
    pub tokens: u64,
    /// Credit balance.
    pub credits: u64,
    /// Units of the item held.
    pub quantity: u32,
}

/// The craft catalog.
#[derive(Clone, Debug, Default)]
pub struct CraftCatalog {
    items: BTreeMap<String, CraftItem>,
}

impl CraftCatalog {
    /// Empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a catalog from configuration.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on duplicate item ids.
    pub fn from_config(config: &CraftingConfig) -> EconomyResult<Self> {
        let mut catalog = Self::new();
        for item in &config.items {
            catalog.add_item(item.clone())?;
        }
        Ok(catalog)
    }

    /// Adds an item.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the id already exists.
    pub fn add_item(&mut self, item: CraftItem) -> EconomyResult<()> {
        if self.items.contains_key(&item.id) {
            return Err(EconomyError::InvalidConfig(format!(
                "craft item {} already exists",
                item.id
            )));
        }
        self.items.insert(item.id.clone(), item);
        Ok(())
    }

    /// Looks up an item.
    #[must_use]
    pub fn get_item(&self, item_id: &str) -> Option<&CraftItem> {
        self.items.get(item_id)
    }

    /// Number of items.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total cost of `quantity` units of `item_id`.
    ///
    /// # Errors
    ///
    /// - `UnknownItem` if the item is not in the catalog
    /// - `InvalidQuantity` for zero
    /// - `ArithmeticOverflow` if the total overflows
    pub fn get_craft_costs(&self, item_id: &str, quantity: u32) -> EconomyResult<CraftCosts> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| EconomyError::UnknownItem(item_id.to_string()))?;
        if quantity == 0 {
            return Err(EconomyError::InvalidQuantity(quantity));
        }
        let qty = u64::from(quantity);
        Ok(CraftCosts {
            total_token_cost: item
                .token_cost
                .checked_mul(qty)
                .ok_or(EconomyError::ArithmeticOverflow)?,
            total_credit_cost: item
                .credit_cost
                .checked_mul(qty)
                .ok_or(EconomyError::ArithmeticOverflow)?,
        })
    }

    /// Checks that `balances` cover the craft without changing anything.
    ///
    /// # Errors
    ///
    /// Same as [`Self::apply_craft_balances`].
    pub fn can_craft(
        &self,
        balances: CraftBalances,
        item_id: &str,
        quantity: u32,
    ) -> EconomyResult<()> {
        self.apply_craft_balances(balances, item_id, quantity).map(|_| ())
    }

    /// Balances after crafting `quantity` units of `item_id`.
    ///
    /// Tokens are checked before credits.
    ///
    /// # Errors
    ///
    /// - `UnknownItem`, `InvalidQuantity` as for [`Self::get_craft_costs`]
    /// - `InsufficientFunds` naming the short balance
    /// - `ArithmeticOverflow` if the item count overflows
    pub fn apply_craft_balances(
        &self,
        balances: CraftBalances,
        item_id: &str,
        quantity: u32,
    ) -> EconomyResult<CraftBalances> {
        let costs = self.get_craft_costs(item_id, quantity)?;

        let tokens = balances
            .tokens
            .checked_sub(costs.total_token_cost)
            .ok_or(EconomyError::InsufficientFunds {
                resource: Resource::ScanTokens,
                required: costs.total_token_cost,
                available: balances.tokens,
            })?;
        let credits = balances
            .credits
            .checked_sub(costs.total_credit_cost)
            .ok_or(EconomyError::InsufficientFunds {
                resource: Resource::Credits,
                required: costs.total_credit_cost,
                available: balances.credits,
            })?;
        let quantity = balances
            .quantity
            .checked_add(quantity)
            .ok_or(EconomyError::ArithmeticOverflow)?;

        Ok(CraftBalances {
            tokens,
            credits,
            quantity,
        })
    }
}

/// Result of a craft.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CraftOutcome {
    /// Item crafted.
    pub item_id: String,
    /// Units crafted.
    pub quantity: u32,
    /// What it cost.
    pub costs: CraftCosts,
    /// Units held afterwards.
    pub item_count_after: u32,
}

/// Crafts `quantity` units of `item_id`.
///
/// **ATOMIC**: on any error the caller's state is untouched.
///
/// # Errors
///
/// See [`CraftCatalog::apply_craft_balances`].
pub fn apply_craft(
    state: &EconomyState,
    catalog: &CraftCatalog,
    item_id: &str,
    quantity: u32,
    ctx: &ActionContext,
) -> EconomyResult<Transition<CraftOutcome>> {
    let costs = catalog.get_craft_costs(item_id, quantity)?;
    let after = catalog.apply_craft_balances(
        CraftBalances {
            tokens: state.scan_tokens,
            credits: state.credits,
            quantity: state.item_count(item_id),
        },
        item_id,
        quantity,
    )?;

    let mut next = state.clone();
    next.scan_tokens = after.tokens;
    next.credits = after.credits;
    next.craft_inventory.insert(item_id.to_string(), after.quantity);

    let entry = LedgerEntry::new(LedgerKind::Craft, format!("craft:{item_id}:{quantity}"), ctx.at)
        .scan_tokens(loss(costs.total_token_cost)?)
        .credits(loss(costs.total_credit_cost)?);

    debug!(item_id, quantity, "crafted");

    Ok(Transition {
        next_state: next,
        ledger_entry: Some(entry),
        result: CraftOutcome {
            item_id: item_id.to_string(),
            quantity,
            costs,
            item_count_after: after.quantity,
        },
    })
}
