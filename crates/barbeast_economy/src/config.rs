//! # Economy Configuration
//!
//! All tunables live in one TOML document. Every section is optional and
//! falls back to the shipped defaults.
//!
//! ```toml
//! [rewards]
//! xp = 50
//! credits = 20
//! scan_tokens = 1
//! daily_credits_cap = 100
//!
//! [login]
//! bonus_credits = 10
//! badges = [{ id = "streak-3", streak = 3 }, { id = "streak-7", streak = 7 }]
//!
//! [[crafting.items]]
//! id = "BOOST"
//! token_cost = 2
//! credit_cost = 50
//! ```

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::calendar::CalendarConfig;
use crate::crafting::CraftItem;
use crate::error::{EconomyError, EconomyResult};
use crate::progression::ProgressionConfig;

/// Battle reward amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RewardConfig {
    /// XP per settled battle.
    pub xp: u64,
    /// Nominal credits per settled battle.
    pub credits: u64,
    /// Scan tokens per settled battle.
    pub scan_tokens: u64,
    /// Battle credits earnable per day.
    pub daily_credits_cap: u64,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            xp: 50,
            credits: 20,
            scan_tokens: 1,
            daily_credits_cap: 100,
        }
    }
}

/// Scan token amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScanConfig {
    /// Tokens per scan action.
    pub tokens_per_scan: u64,
    /// Extra tokens for the first scan of a barcode each day.
    pub first_scan_bonus_tokens: u64,
    /// First-scan bonuses per day.
    pub max_daily_bonuses: u32,
    /// Days a processed scan id is remembered, counting the day it landed.
    pub scan_id_retention_days: u32,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            tokens_per_scan: 1,
            first_scan_bonus_tokens: 1,
            max_daily_bonuses: 20,
            scan_id_retention_days: 7,
        }
    }
}

/// A streak milestone badge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BadgeThreshold {
    /// Badge identifier.
    pub id: String,
    /// Streak length that earns it.
    pub streak: u32,
}

impl BadgeThreshold {
    /// Creates a threshold.
    #[must_use]
    pub fn new(id: impl Into<String>, streak: u32) -> Self {
        Self {
            id: id.into(),
            streak,
        }
    }
}

/// Daily login bonus.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoginConfig {
    /// Credits per claim.
    pub bonus_credits: u64,
    /// Milestones, ascending by streak.
    pub badges: Vec<BadgeThreshold>,
}

impl Default for LoginConfig {
    fn default() -> Self {
        Self {
            bonus_credits: 10,
            badges: [3, 7, 14, 30]
                .into_iter()
                .map(|n| BadgeThreshold::new(format!("streak-{n}"), n))
                .collect(),
        }
    }
}

/// Battle entry fee.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntryFeeConfig {
    /// Credits charged per battle.
    pub credits: u64,
}

impl Default for EntryFeeConfig {
    fn default() -> Self {
        Self { credits: 10 }
    }
}

/// Craft catalog.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CraftingConfig {
    /// Craftable items.
    pub items: Vec<CraftItem>,
}

impl Default for CraftingConfig {
    fn default() -> Self {
        Self {
            items: vec![
                CraftItem::new("BOOST", 2, 50),
                CraftItem::new("SHIELD", 3, 80),
                CraftItem::new("POTION", 1, 20),
            ],
        }
    }
}

/// Full economy configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EconomyConfig {
    /// Battle rewards.
    pub rewards: RewardConfig,
    /// Level curve.
    pub progression: ProgressionConfig,
    /// Scan tokens.
    pub scan: ScanConfig,
    /// Daily login.
    pub login: LoginConfig,
    /// Entry fee.
    pub entry_fee: EntryFeeConfig,
    /// Craft catalog.
    pub crafting: CraftingConfig,
    /// Day cutoff.
    pub calendar: CalendarConfig,
}

impl EconomyConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on parse or validation failure.
    pub fn from_toml_str(source: &str) -> EconomyResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| EconomyError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or is invalid.
    pub fn from_file(path: impl AsRef<Path>) -> EconomyResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| EconomyError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }

    /// Cross-field validation.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> EconomyResult<()> {
        self.progression.validate()?;
        self.calendar.validate()?;

        // a retry must at least survive the next day cutoff
        if self.scan.scan_id_retention_days < 2 {
            return Err(EconomyError::InvalidConfig(format!(
                "scan_id_retention_days {} must be at least 2",
                self.scan.scan_id_retention_days
            )));
        }

        let mut last_streak = 0;
        let mut badge_ids = BTreeSet::new();
        for badge in &self.login.badges {
            if badge.streak == 0 || badge.streak <= last_streak {
                return Err(EconomyError::InvalidConfig(format!(
                    "badge {} streak {} must be positive and ascending",
                    badge.id, badge.streak
                )));
            }
            if !badge_ids.insert(badge.id.as_str()) {
                return Err(EconomyError::InvalidConfig(format!(
                    "duplicate badge id {}",
                    badge.id
                )));
            }
            last_streak = badge.streak;
        }

        let mut item_ids = BTreeSet::new();
        for item in &self.crafting.items {
            if item.id.is_empty() {
                return Err(EconomyError::InvalidConfig(
                    "craft item id must not be empty".to_string(),
                ));
            }
            if !item_ids.insert(item.id.as_str()) {
                return Err(EconomyError::InvalidConfig(format!(
                    "duplicate craft item {}",
                    item.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EconomyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rewards.xp, 50);
        assert_eq!(config.rewards.credits, 20);
        assert_eq!(config.rewards.daily_credits_cap, 100);
        assert_eq!(config.entry_fee.credits, 10);
        assert_eq!(config.login.badges.len(), 4);
        assert_eq!(config.login.badges[0].id, "streak-3");
        assert_eq!(config.calendar.utc_offset_hours, 9);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EconomyConfig::from_toml_str(
            r#"
            [rewards]
            credits = 25

            [[crafting.items]]
            id = "LURE"
            token_cost = 4
            credit_cost = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.rewards.credits, 25);
        assert_eq!(config.rewards.xp, 50);
        assert_eq!(config.crafting.items.len(), 1);
        assert_eq!(config.crafting.items[0].id, "LURE");
    }

    #[test]
    fn test_rejects_unknown_keys() {
        assert!(EconomyConfig::from_toml_str("[rewards]\ngems = 5\n").is_err());
    }

    #[test]
    fn test_rejects_descending_badges() {
        let result = EconomyConfig::from_toml_str(
            r#"
            [login]
            badges = [{ id = "a", streak = 7 }, { id = "b", streak = 3 }]
            "#,
        );
        assert!(matches!(result, Err(EconomyError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_duplicate_items() {
        let mut config = EconomyConfig::default();
        config.crafting.items.push(CraftItem::new("BOOST", 1, 1));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_short_scan_id_retention() {
        let result = EconomyConfig::from_toml_str("[scan]\nscan_id_retention_days = 1\n");
        assert!(matches!(result, Err(EconomyError::InvalidConfig(_))));
        assert_eq!(EconomyConfig::default().scan.scan_id_retention_days, 7);
    }

    #[test]
    fn test_missing_file() {
        let err = EconomyConfig::from_file("/definitely/not/here.toml").unwrap_err();
        assert_eq!(err.reason_code(), "invalid-config");
    }
}
