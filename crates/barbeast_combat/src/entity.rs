//! # Combat Entities
//!
//! Stat blocks handed to the simulator. Creatures scanned from a barcode get
//! their stats from independent sub-seeds of the barcode's [`EntitySeed`],
//! so a given barcode at a given level is always the same fighter.

use serde::{Deserialize, Serialize};

use barbeast_procedural::{BarcodeTraits, CanonicalBarcode, EntitySeed, Motif, RarityTier};

/// Sub-seed purposes, one stream per stat.
const PURPOSE_HP: u64 = 1;
const PURPOSE_ATTACK: u64 = 2;
const PURPOSE_DEFENSE: u64 = 3;
const PURPOSE_SPEED: u64 = 4;

/// Rare creatures get +10% on every stat.
const RARE_BONUS_PCT: u32 = 110;

/// Each level above 1 adds 5% to every stat.
const GROWTH_PCT_PER_LEVEL: u32 = 5;

/// Damage-over-time status applied by some skills.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Burn {
    /// Damage dealt at the end of each turn.
    pub damage: u32,
    /// Number of turns it lasts.
    pub turns: u8,
}

impl Burn {
    /// Total damage if it runs its course.
    #[must_use]
    pub const fn potency(self) -> u32 {
        self.damage.saturating_mul(self.turns as u32)
    }
}

/// A combat skill.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    /// Stable skill identifier.
    pub id: String,
    /// Attack multiplier in percent.
    pub power_pct: u32,
    /// Burn applied to the target on hit.
    pub burn: Option<Burn>,
}

impl Skill {
    /// Creates a plain damaging skill.
    #[must_use]
    pub fn new(id: impl Into<String>, power_pct: u32) -> Self {
        Self {
            id: id.into(),
            power_pct,
            burn: None,
        }
    }

    /// Adds a burn effect.
    #[must_use]
    pub fn with_burn(mut self, damage: u32, turns: u8) -> Self {
        self.burn = Some(Burn { damage, turns });
        self
    }

    /// Fallback used by entities with an empty kit.
    #[must_use]
    pub fn basic_strike() -> Self {
        Self::new("strike", 100)
    }
}

/// An immutable fighter snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatEntity {
    /// Stable identifier; breaks speed ties.
    pub id: String,
    /// Starting hit points.
    pub hp: u32,
    /// Attack stat.
    pub attack: u32,
    /// Defense stat.
    pub defense: u32,
    /// Speed stat.
    pub speed: u32,
    /// Skill kit, used in rotation.
    pub skills: Vec<Skill>,
    /// Creature level.
    pub level: u32,
}

impl CombatEntity {
    /// Derives a creature from a canonical barcode at the given level.
    ///
    /// The entity id is the canonical barcode string.
    #[must_use]
    pub fn from_barcode(code: &CanonicalBarcode, level: u32) -> Self {
        let traits = BarcodeTraits::derive(code);
        let level = level.max(1);
        let stat = |purpose: u64, base: u32, spread: u64| {
            let raw = base + rolled(traits.seed, purpose, spread);
            let raw = match traits.rarity {
                RarityTier::Rare => scale(raw, RARE_BONUS_PCT),
                RarityTier::Common => raw,
            };
            scale(raw, GROWTH_PCT_PER_LEVEL.saturating_mul(level - 1).saturating_add(100))
        };

        Self {
            id: code.as_str().to_string(),
            hp: stat(PURPOSE_HP, 80, 41),
            attack: stat(PURPOSE_ATTACK, 20, 16),
            defense: stat(PURPOSE_DEFENSE, 10, 11),
            speed: stat(PURPOSE_SPEED, 10, 21),
            skills: motif_kit(traits.motif),
            level,
        }
    }

    /// Skill used on a given turn (1-based), rotating through the kit.
    #[must_use]
    pub fn skill_for_turn(&self, turn: u32) -> Skill {
        if self.skills.is_empty() {
            return Skill::basic_strike();
        }
        let slot = turn.saturating_sub(1) as usize % self.skills.len();
        self.skills[slot].clone()
    }
}

fn rolled(seed: EntitySeed, purpose: u64, spread: u64) -> u32 {
    // spread is a small constant, so the remainder fits in u32
    u32::try_from(seed.derive(purpose).value() % spread).unwrap_or(0)
}

fn scale(value: u32, pct: u32) -> u32 {
    u32::try_from(u64::from(value) * u64::from(pct) / 100).unwrap_or(u32::MAX)
}

fn motif_kit(motif: Motif) -> Vec<Skill> {
    match motif {
        Motif::A => vec![
            Skill::new("claw", 100),
            Skill::new("flare", 80).with_burn(3, 3),
        ],
        Motif::B => vec![
            Skill::new("crush", 125),
            Skill::new("singe", 60).with_burn(5, 2),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use barbeast_procedural::normalize_to_ean13;

    fn code(raw: &str) -> CanonicalBarcode {
        normalize_to_ean13(raw).unwrap()
    }

    #[test]
    fn test_same_barcode_same_creature() {
        let a = CombatEntity::from_barcode(&code("4006381333931"), 3);
        let b = CombatEntity::from_barcode(&code("4006381333931"), 3);
        assert_eq!(a, b);
        assert_eq!(a.id, "4006381333931");
    }

    #[test]
    fn test_stats_within_ranges_at_level_one() {
        for raw in ["4006381333931", "012345678905", "12345670", "9780306406157"] {
            let entity = CombatEntity::from_barcode(&code(raw), 1);
            let traits = BarcodeTraits::derive(&code(raw));
            let cap = |max: u32| match traits.rarity {
                RarityTier::Rare => max * 110 / 100,
                RarityTier::Common => max,
            };
            assert!((80..=cap(120)).contains(&entity.hp), "{raw}: hp {}", entity.hp);
            assert!((20..=cap(35)).contains(&entity.attack));
            assert!((10..=cap(20)).contains(&entity.defense));
            assert!((10..=cap(30)).contains(&entity.speed));
            assert_eq!(entity.skills.len(), 2);
        }
    }

    #[test]
    fn test_levels_grow_stats() {
        let low = CombatEntity::from_barcode(&code("4006381333931"), 1);
        let high = CombatEntity::from_barcode(&code("4006381333931"), 11);
        assert_eq!(high.hp, low.hp * 150 / 100);
        assert!(high.attack >= low.attack);
    }

    #[test]
    fn test_level_zero_is_level_one() {
        let zero = CombatEntity::from_barcode(&code("4006381333931"), 0);
        let one = CombatEntity::from_barcode(&code("4006381333931"), 1);
        assert_eq!(zero, one);
    }

    #[test]
    fn test_extreme_level_saturates() {
        let entity = CombatEntity::from_barcode(&code("4006381333931"), u32::MAX);
        let base = CombatEntity::from_barcode(&code("4006381333931"), 1);
        assert_eq!(entity.level, u32::MAX);
        assert!(entity.hp >= base.hp);
        assert!(entity.attack >= base.attack);
    }

    #[test]
    fn test_skill_rotation() {
        let entity = CombatEntity::from_barcode(&code("4006381333931"), 1);
        assert_eq!(entity.skill_for_turn(1), entity.skills[0]);
        assert_eq!(entity.skill_for_turn(2), entity.skills[1]);
        assert_eq!(entity.skill_for_turn(3), entity.skills[0]);
    }

    #[test]
    fn test_empty_kit_uses_basic_strike() {
        let mut entity = CombatEntity::from_barcode(&code("4006381333931"), 1);
        entity.skills.clear();
        assert_eq!(entity.skill_for_turn(5), Skill::basic_strike());
    }
}
