//! # Battle Configuration
//!
//! Balance numbers for the simulator, loaded once at startup from TOML.
//!
//! ```toml
//! max_turns = 30
//! base_crit_bp = 1000
//! crit_multiplier_pct = 150
//! min_damage = 1
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CombatError, CombatResult};

/// Simulator balance parameters.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BattleConfig {
    /// Turn ceiling; reaching it ends the battle on remaining HP.
    pub max_turns: u32,
    /// Base crit chance in basis points (10000 = 100%).
    pub base_crit_bp: u32,
    /// Damage multiplier on a crit, in percent.
    pub crit_multiplier_pct: u32,
    /// Floor applied to every hit.
    pub min_damage: u32,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            max_turns: 30,
            base_crit_bp: 1_000,
            crit_multiplier_pct: 150,
            min_damage: 1,
        }
    }
}

impl BattleConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` on parse failure or out-of-range values.
    pub fn from_toml_str(source: &str) -> CombatResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| CombatError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML config file.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> CombatResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())
            .map_err(|e| CombatError::InvalidConfig(format!("Failed to read config: {e}")))?;
        Self::from_toml_str(&source)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` naming the first bad field.
    pub fn validate(&self) -> CombatResult<()> {
        if self.max_turns == 0 {
            return Err(CombatError::InvalidConfig("max_turns must be > 0".to_string()));
        }
        if self.base_crit_bp > 10_000 {
            return Err(CombatError::InvalidConfig(
                "base_crit_bp must be <= 10000".to_string(),
            ));
        }
        if self.crit_multiplier_pct < 100 {
            return Err(CombatError::InvalidConfig(
                "crit_multiplier_pct must be >= 100".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(BattleConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = BattleConfig::from_toml_str("max_turns = 12").unwrap();
        assert_eq!(config.max_turns, 12);
        assert_eq!(config.crit_multiplier_pct, 150);
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(BattleConfig::from_toml_str("max_turns = 0").is_err());
        assert!(BattleConfig::from_toml_str("base_crit_bp = 20000").is_err());
        assert!(BattleConfig::from_toml_str("crit_multiplier_pct = 50").is_err());
        assert!(BattleConfig::from_toml_str("unknown = 1").is_err());
    }
}
