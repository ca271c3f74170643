//! XP to level curve.
//!
//! `level = 1 + floor(sqrt(xp / xp_per_level_unit))`, clamped to `[1, max_level]`.

use serde::{Deserialize, Serialize};

use crate::error::{EconomyError, EconomyResult};

/// Level curve parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProgressionConfig {
    /// XP divisor of the curve.
    pub xp_per_level_unit: u64,
    /// Level cap.
    pub max_level: u32,
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            xp_per_level_unit: 100,
            max_level: 50,
        }
    }
}

impl ProgressionConfig {
    /// Validates the curve.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` for a zero divisor or zero cap.
    pub fn validate(&self) -> EconomyResult<()> {
        if self.xp_per_level_unit == 0 {
            return Err(EconomyError::InvalidConfig(
                "xp_per_level_unit must be positive".to_string(),
            ));
        }
        if self.max_level == 0 {
            return Err(EconomyError::InvalidConfig(
                "max_level must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Level reached with `xp`.
    #[must_use]
    pub fn level_for_xp(&self, xp: u64) -> u32 {
        let unit = self.xp_per_level_unit.max(1);
        let steps = isqrt(xp / unit);
        let level = u32::try_from(steps.saturating_add(1)).unwrap_or(u32::MAX);
        level.clamp(1, self.max_level.max(1))
    }

    /// Minimum XP for `level`. Levels above the cap report the cap's threshold.
    #[must_use]
    pub fn xp_for_level(&self, level: u32) -> u64 {
        let steps = u64::from(level.clamp(1, self.max_level.max(1)) - 1);
        steps
            .saturating_mul(steps)
            .saturating_mul(self.xp_per_level_unit)
    }

    /// XP still needed for the next level, `None` at the cap.
    #[must_use]
    pub fn xp_to_next_level(&self, xp: u64) -> Option<u64> {
        let level = self.level_for_xp(xp);
        if level >= self.max_level {
            return None;
        }
        Some(self.xp_for_level(level + 1).saturating_sub(xp))
    }
}

/// Floor square root.
fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    let mut x = n;
    let mut y = n / 2 + (n & 1);
    while y < x {
        x = y;
        y = (x + n / x) / 2;
    }
    x
}
