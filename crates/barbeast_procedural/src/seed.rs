//! # Entity Seeds
//!
//! The canonical barcode is hashed ONCE into an [`EntitySeed`]. Every creature
//! attribute is a partition of that seed or of a purpose-specific sub-seed.
//!
//! ## Determinism
//!
//! Given the same canonical barcode, this module produces **exactly** the
//! same values on any platform, any time. Nothing here reads a clock.

use serde::{Deserialize, Serialize};

use crate::barcode::CanonicalBarcode;
use crate::terrain::{terrain_from_barcode, Terrain};

/// Multiplier of the polynomial digit hash.
const DIGIT_HASH_BASE: u64 = 31;

/// Seed values below this (mod 1000) are rare.
const RARE_THRESHOLD_PER_MILLE: u64 = 50;

/// Seed values below this (mod 100) take motif A.
const MOTIF_A_THRESHOLD_PERCENT: u64 = 50;

/// Deterministic integer seed of a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntitySeed(u64);

impl EntitySeed {
    /// Creates a seed from a raw value.
    #[inline]
    #[must_use]
    pub const fn new(seed: u64) -> Self {
        Self(seed)
    }

    /// Hashes the digits of a canonical barcode into a seed.
    #[must_use]
    pub fn from_barcode(code: &CanonicalBarcode) -> Self {
        Self(code.digits().fold(0u64, |hash, digit| {
            hash.wrapping_mul(DIGIT_HASH_BASE)
                .wrapping_add(u64::from(digit))
        }))
    }

    /// Returns the raw seed value.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }

    /// Derives a sub-seed for a specific purpose (e.g., the attack stat).
    ///
    /// Uses a hash function to create independent streams from one seed.
    #[inline]
    #[must_use]
    pub const fn derive(self, purpose: u64) -> Self {
        let mut hash = self.0;
        hash ^= purpose;
        hash = hash.wrapping_mul(0x517c_c1b7_2722_0a95);
        hash ^= hash >> 32;
        Self(hash)
    }

    /// Rarity tier of this seed.
    #[must_use]
    pub const fn rarity(self) -> RarityTier {
        if self.0 % 1000 < RARE_THRESHOLD_PER_MILLE {
            RarityTier::Rare
        } else {
            RarityTier::Common
        }
    }

    /// Visual motif of this seed.
    #[must_use]
    pub const fn motif(self) -> Motif {
        if self.0 % 100 < MOTIF_A_THRESHOLD_PERCENT {
            Motif::A
        } else {
            Motif::B
        }
    }
}

/// Rarity tier of a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RarityTier {
    /// ~95% of barcodes.
    Common,
    /// ~5% of barcodes.
    Rare,
}

/// Visual and skill-kit motif of a creature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Motif {
    /// First motif family.
    A,
    /// Second motif family.
    B,
}

/// Seed of the creature behind a canonical barcode.
#[inline]
#[must_use]
pub fn derive_seed(code: &CanonicalBarcode) -> EntitySeed {
    EntitySeed::from_barcode(code)
}

/// Every attribute derived from one canonical barcode.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BarcodeTraits {
    /// Creature seed.
    pub seed: EntitySeed,
    /// Rarity tier.
    pub rarity: RarityTier,
    /// Motif family.
    pub motif: Motif,
    /// Home terrain.
    pub terrain: Terrain,
}

impl BarcodeTraits {
    /// Derives all traits of a canonical barcode.
    #[must_use]
    pub fn derive(code: &CanonicalBarcode) -> Self {
        let seed = derive_seed(code);
        Self {
            seed,
            rarity: seed.rarity(),
            motif: seed.motif(),
            terrain: terrain_from_barcode(code.as_str()),
        }
    }
}
