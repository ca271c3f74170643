//! # Battle RNG
//!
//! Crit rolls are drawn from a ChaCha8 stream seeded per
//! `(battle_id, turn, actor_index)`:
//!
//! ```text
//! battle keys = SipHash128(DOMAIN_KEYS, battle_id)
//! roll seed   = SipHash64(battle keys, turn_le ++ actor_index_le)
//! roll        = ChaCha8(roll seed).gen_range(0..10000)
//! ```
//!
//! Every roll is addressable on its own, so a replay can recompute any
//! single turn without replaying the ones before it. All integers are hashed
//! little-endian so the stream is identical on every platform.

use std::hash::Hasher;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use siphasher::sip::SipHasher24;
use siphasher::sip128::{Hasher128, SipHasher24 as SipHasher128};

use barbeast_procedural::terrain::BASIS_POINTS;

/// Fixed keys separating battle streams from any other use of SipHash.
const DOMAIN_KEYS: (u64, u64) = (0x6261_7262_6561_7374, 0x6372_6974_5f72_6f6c);

/// Keyed roll source for one battle.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct BattleRng {
    k0: u64,
    k1: u64,
}

impl BattleRng {
    /// Derives the roll keys of a battle.
    #[must_use]
    pub fn new(battle_id: &str) -> Self {
        let mut hasher = SipHasher128::new_with_keys(DOMAIN_KEYS.0, DOMAIN_KEYS.1);
        hasher.write(battle_id.as_bytes());
        let keys = hasher.finish128();
        Self {
            k0: keys.h1,
            k1: keys.h2,
        }
    }

    /// Seeded stream for one actor on one turn.
    #[must_use]
    pub fn stream(&self, turn: u32, actor_index: usize) -> ChaCha8Rng {
        let mut hasher = SipHasher24::new_with_keys(self.k0, self.k1);
        hasher.write(&turn.to_le_bytes());
        hasher.write(&(actor_index as u64).to_le_bytes());
        ChaCha8Rng::seed_from_u64(hasher.finish())
    }

    /// Roll in basis points, `0..10000`.
    #[must_use]
    pub fn roll_bp(&self, turn: u32, actor_index: usize) -> u32 {
        self.stream(turn, actor_index).gen_range(0..BASIS_POINTS)
    }
}

impl std::fmt::Debug for BattleRng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // NEVER expose the roll keys in debug output
        f.debug_struct("BattleRng")
            .field("keys", &"[REDACTED]")
            .finish()
    }
}
