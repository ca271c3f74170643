//! # Battle Terrain
//!
//! Terrain is picked from the check digit of the barcode and bends combat
//! numbers by fixed percentages. All multiplications floor to integers.
//!
//! | Terrain | Damage | Speed | Defense | Crit rate |
//! |---------|--------|-------|---------|-----------|
//! | ICE     | x0.95  | x1.05 | x1.00   | +0        |
//! | VOLCANO | x1.10  | x1.00 | x0.95   | +0        |
//! | LIBRARY | x1.00  | x1.00 | x1.00   | +5%       |

use std::fmt;

use serde::{Deserialize, Serialize};

/// Basis points in 100%.
pub const BASIS_POINTS: u32 = 10_000;

/// Battle terrain.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Terrain {
    /// Frozen arena: slower hits, faster movers.
    Ice = 0,
    /// Volcanic arena: harder hits, softer armor.
    Volcano = 1,
    /// Library arena: more critical hits.
    #[default]
    Library = 2,
}

impl Terrain {
    /// Terrain selected by `digit % 3`.
    #[must_use]
    pub const fn from_digit(digit: u8) -> Self {
        match digit % 3 {
            0 => Self::Ice,
            1 => Self::Volcano,
            _ => Self::Library,
        }
    }

    /// Damage multiplier in percent.
    #[inline]
    #[must_use]
    pub const fn damage_pct(self) -> u32 {
        match self {
            Self::Ice => 95,
            Self::Volcano => 110,
            Self::Library => 100,
        }
    }

    /// Speed multiplier in percent.
    #[inline]
    #[must_use]
    pub const fn speed_pct(self) -> u32 {
        match self {
            Self::Ice => 105,
            Self::Volcano | Self::Library => 100,
        }
    }

    /// Defense multiplier in percent.
    #[inline]
    #[must_use]
    pub const fn defense_pct(self) -> u32 {
        match self {
            Self::Volcano => 95,
            Self::Ice | Self::Library => 100,
        }
    }

    /// Additive crit-rate bonus in basis points.
    #[inline]
    #[must_use]
    pub const fn crit_bonus_bp(self) -> u32 {
        match self {
            Self::Library => 500,
            Self::Ice | Self::Volcano => 0,
        }
    }

    /// Applies the speed multiplier (floored).
    #[must_use]
    pub const fn apply_speed(self, speed: u32) -> u32 {
        scale_pct(speed, self.speed_pct())
    }

    /// Applies the defense multiplier (floored).
    #[must_use]
    pub const fn apply_defense(self, defense: u32) -> u32 {
        scale_pct(defense, self.defense_pct())
    }

    /// Upper-case name used in logs and documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ice => "ICE",
            Self::Volcano => "VOLCANO",
            Self::Library => "LIBRARY",
        }
    }
}

impl fmt::Display for Terrain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Picks the terrain for a barcode string from its last digit.
///
/// Empty or non-numeric input falls back to [`Terrain::Library`].
#[must_use]
pub fn terrain_from_barcode(code: &str) -> Terrain {
    if code.is_empty() || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Terrain::Library;
    }
    code.bytes()
        .last()
        .map_or(Terrain::Library, |b| Terrain::from_digit(b - b'0'))
}

/// Applies the terrain damage multiplier (floored).
#[must_use]
pub const fn apply_terrain_modifiers(damage: u32, terrain: Terrain) -> u32 {
    scale_pct(damage, terrain.damage_pct())
}

/// `value * pct / 100`, floored, saturating at `u32::MAX`.
const fn scale_pct(value: u32, pct: u32) -> u32 {
    let scaled = value as u64 * pct as u64 / 100;
    if scaled > u32::MAX as u64 {
        u32::MAX
    } else {
        scaled as u32
    }
}
