//! # Battle Simulator
//!
//! **Deterministic Turn-Based Resolution**
//!
//! ## Turn Structure
//!
//! ```text
//! TURN
//!  ├─ for each actor in speed order (terrain-adjusted, ties by id):
//!  │    ACTION ─> DAMAGE ─> STATUS (burn applied)?
//!  └─ for each burning entity in speed order:
//!       STATUS (burn ticked / expired)
//! ```
//!
//! ## Damage Pipeline
//!
//! ```text
//! base   = max(min_damage, attack * power% - terrain_defense / 2)
//! amount = floor(base * terrain_damage% * crit%)
//! ```
//!
//! The battle ends on a knockout or at the turn ceiling. At the ceiling the
//! higher remaining HP wins, then the lower total damage taken, then the
//! entity that acts first.

use barbeast_procedural::Terrain;

use crate::config::BattleConfig;
use crate::entity::{Burn, CombatEntity, Skill};
use crate::error::{CombatError, CombatResult};
use crate::event::{
    BattleEvent, BattleEventKind, BattleEventLog, EndReason, EventCause, LogBuilder, Severity,
    StatusChange,
};
use crate::rng::BattleRng;

/// Result of a simulated battle.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BattleOutcome {
    /// Battle identifier the rolls were keyed on.
    pub battle_id: String,
    /// Id of the single winner.
    pub winner_id: String,
    /// Ordered event log, ending in exactly one RESULT.
    pub logs: BattleEventLog,
    /// Number of turns played.
    pub turn_count: u32,
    /// End condition.
    pub end_reason: EndReason,
    /// Remaining HP, indexed like the inputs.
    pub final_hp: [u32; 2],
    /// Total HP lost, indexed like the inputs.
    pub damage_taken: [u32; 2],
}

/// Simulates battles under one balance configuration.
#[derive(Clone, Debug, Default)]
pub struct BattleSimulator {
    config: BattleConfig,
}

/// Mutable per-battle bookkeeping. Entities themselves stay untouched.
struct Arena {
    hp: [u32; 2],
    burns: [Option<Burn>; 2],
    taken: [u32; 2],
    log: LogBuilder,
}

impl Arena {
    fn lose_hp(&mut self, index: usize, amount: u32) -> u32 {
        let lost = amount.min(self.hp[index]);
        self.hp[index] -= lost;
        self.taken[index] = self.taken[index].saturating_add(lost);
        lost
    }
}

impl BattleSimulator {
    /// Creates a simulator with the given configuration.
    #[must_use]
    pub fn new(config: BattleConfig) -> Self {
        Self { config }
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &BattleConfig {
        &self.config
    }

    /// Runs a battle to completion.
    ///
    /// Pure: identical entities, battle id and terrain always give an
    /// identical outcome.
    ///
    /// # Errors
    ///
    /// - `EmptyBattleId` if `battle_id` is empty
    /// - `DuplicateEntityId` if both entities share an id
    /// - `EntityDown` if an entity starts with 0 HP
    pub fn simulate(
        &self,
        a: &CombatEntity,
        b: &CombatEntity,
        battle_id: &str,
        terrain: Terrain,
    ) -> CombatResult<BattleOutcome> {
        if battle_id.is_empty() {
            return Err(CombatError::EmptyBattleId);
        }
        if a.id == b.id {
            return Err(CombatError::DuplicateEntityId(a.id.clone()));
        }
        for entity in [a, b] {
            if entity.hp == 0 {
                return Err(CombatError::EntityDown(entity.id.clone()));
            }
        }

        let entities = [a, b];
        let rng = BattleRng::new(battle_id);
        let order = turn_order(entities, terrain);
        let mut arena = Arena {
            hp: [a.hp, b.hp],
            burns: [None, None],
            taken: [0, 0],
            log: LogBuilder::default(),
        };

        arena.log.push(
            BattleEventKind::Start {
                terrain,
                order: [entities[order[0]].id.clone(), entities[order[1]].id.clone()],
            },
            EventCause::Setup,
            Severity::Normal,
            arena.hp,
            arena.hp,
        );

        let mut knocked_out = None;
        let mut turn_count = 0;

        for turn in 1..=self.config.max_turns {
            turn_count = turn;
            arena.log.begin_turn(turn);
            arena.log.push(
                BattleEventKind::Turn {
                    first: entities[order[0]].id.clone(),
                },
                EventCause::SpeedOrder,
                Severity::Normal,
                arena.hp,
                arena.hp,
            );

            knocked_out = self.play_actions(&mut arena, entities, order, &rng, terrain, turn);
            if knocked_out.is_none() {
                knocked_out = tick_burns(&mut arena, entities, order);
            }
            if knocked_out.is_some() {
                break;
            }
        }

        let (winner, end_reason) = match knocked_out {
            Some(loser) => (1 - loser, EndReason::Knockout),
            None => (judge(&arena, order), EndReason::TurnLimit),
        };
        let winner_id = entities[winner].id.clone();

        arena.log.push(
            BattleEventKind::Result {
                winner_id: winner_id.clone(),
                reason: end_reason,
            },
            match end_reason {
                EndReason::Knockout => EventCause::Knockout,
                EndReason::TurnLimit => EventCause::TurnLimit,
            },
            Severity::Climax,
            arena.hp,
            arena.hp,
        );

        tracing::debug!(
            battle_id,
            winner = %winner_id,
            turns = turn_count,
            reason = ?end_reason,
            "battle resolved"
        );

        Ok(BattleOutcome {
            battle_id: battle_id.to_string(),
            winner_id,
            logs: arena.log.finish(),
            turn_count,
            end_reason,
            final_hp: arena.hp,
            damage_taken: arena.taken,
        })
    }

    /// Re-runs a battle and checks a claimed log against it.
    ///
    /// Used for audit replay and anti-cheat verification of client logs.
    ///
    /// # Errors
    ///
    /// Same as [`BattleSimulator::simulate`].
    pub fn verify_replay(
        &self,
        a: &CombatEntity,
        b: &CombatEntity,
        battle_id: &str,
        terrain: Terrain,
        claimed: &[BattleEvent],
    ) -> CombatResult<bool> {
        let outcome = self.simulate(a, b, battle_id, terrain)?;
        let matches = outcome.logs.as_slice() == claimed;
        if !matches {
            tracing::warn!(battle_id, "claimed battle log does not match replay");
        }
        Ok(matches)
    }

    /// Both actors act once. Returns the index of a knocked-out entity.
    fn play_actions(
        &self,
        arena: &mut Arena,
        entities: [&CombatEntity; 2],
        order: [usize; 2],
        rng: &BattleRng,
        terrain: Terrain,
        turn: u32,
    ) -> Option<usize> {
        for actor in order {
            let target = 1 - actor;
            let skill = entities[actor].skill_for_turn(turn);

            arena.log.push(
                BattleEventKind::Action {
                    actor: entities[actor].id.clone(),
                    skill_id: skill.id.clone(),
                },
                EventCause::Skill,
                Severity::Normal,
                arena.hp,
                arena.hp,
            );

            let critical = rng.roll_bp(turn, actor) < self.crit_rate_bp(terrain);
            let amount = self.damage(entities[actor], entities[target], &skill, terrain, critical);

            let before = arena.hp;
            arena.lose_hp(target, amount);
            let knocked_out = arena.hp[target] == 0;
            let (cause, severity) = if knocked_out {
                (EventCause::Knockout, Severity::Climax)
            } else if critical {
                (EventCause::Critical, Severity::Highlight)
            } else {
                (EventCause::Skill, Severity::Normal)
            };
            arena.log.push(
                BattleEventKind::Damage {
                    attacker: entities[actor].id.clone(),
                    target: entities[target].id.clone(),
                    amount,
                    critical,
                },
                cause,
                severity,
                before,
                arena.hp,
            );
            if knocked_out {
                return Some(target);
            }

            if let Some(burn) = skill.burn.filter(|burn| burn.turns > 0) {
                // a weaker burn never overwrites a stronger one
                let stronger = arena.burns[target].map_or(true, |current| {
                    burn.potency() > current.potency()
                });
                if stronger {
                    arena.burns[target] = Some(burn);
                    arena.log.push(
                        BattleEventKind::Status {
                            target: entities[target].id.clone(),
                            burn,
                            change: StatusChange::Applied,
                            amount: 0,
                        },
                        EventCause::Skill,
                        Severity::Highlight,
                        arena.hp,
                        arena.hp,
                    );
                }
            }
        }
        None
    }

    /// Crit chance in basis points under a terrain.
    fn crit_rate_bp(&self, terrain: Terrain) -> u32 {
        self.config.base_crit_bp.saturating_add(terrain.crit_bonus_bp())
    }

    /// Damage of one hit: base -> terrain -> crit -> floor.
    fn damage(
        &self,
        attacker: &CombatEntity,
        target: &CombatEntity,
        skill: &Skill,
        terrain: Terrain,
        critical: bool,
    ) -> u32 {
        let min_damage = u64::from(self.config.min_damage);
        let raw = u64::from(attacker.attack) * u64::from(skill.power_pct) / 100;
        let defense = u64::from(terrain.apply_defense(target.defense));
        let base = raw.saturating_sub(defense / 2).max(min_damage);

        let crit_pct = if critical {
            u64::from(self.config.crit_multiplier_pct)
        } else {
            100
        };
        let amount = base * u64::from(terrain.damage_pct()) * crit_pct / 10_000;
        u32::try_from(amount.max(min_damage)).unwrap_or(u32::MAX)
    }
}

/// Simulates a battle with the default configuration.
///
/// # Errors
///
/// Same as [`BattleSimulator::simulate`].
pub fn simulate_battle(
    a: &CombatEntity,
    b: &CombatEntity,
    battle_id: &str,
    terrain: Terrain,
) -> CombatResult<BattleOutcome> {
    BattleSimulator::default().simulate(a, b, battle_id, terrain)
}

/// Acting order: faster first under the terrain, ties by id.
fn turn_order(entities: [&CombatEntity; 2], terrain: Terrain) -> [usize; 2] {
    let speed = |i: usize| terrain.apply_speed(entities[i].speed);
    let mut order = [0, 1];
    order.sort_by(|&x, &y| {
        speed(y)
            .cmp(&speed(x))
            .then_with(|| entities[x].id.cmp(&entities[y].id))
    });
    order
}

/// End-of-turn burn damage. Returns the index of a knocked-out entity.
fn tick_burns(
    arena: &mut Arena,
    entities: [&CombatEntity; 2],
    order: [usize; 2],
) -> Option<usize> {
    for index in order {
        let Some(mut burn) = arena.burns[index] else {
            continue;
        };
        let before = arena.hp;
        let amount = arena.lose_hp(index, burn.damage);
        burn.turns -= 1;
        let change = if burn.turns == 0 {
            arena.burns[index] = None;
            StatusChange::Expired
        } else {
            arena.burns[index] = Some(burn);
            StatusChange::Ticked
        };
        let knocked_out = arena.hp[index] == 0;
        let (cause, severity) = if knocked_out {
            (EventCause::Knockout, Severity::Climax)
        } else {
            (EventCause::Burn, Severity::Normal)
        };
        arena.log.push(
            BattleEventKind::Status {
                target: entities[index].id.clone(),
                burn,
                change,
                amount,
            },
            cause,
            severity,
            before,
            arena.hp,
        );
        if knocked_out {
            return Some(index);
        }
    }
    None
}

/// Turn-limit decision: remaining HP, then damage taken, then acting order.
fn judge(arena: &Arena, order: [usize; 2]) -> usize {
    let [first, second] = order;
    match arena.hp[first].cmp(&arena.hp[second]) {
        std::cmp::Ordering::Greater => first,
        std::cmp::Ordering::Less => second,
        std::cmp::Ordering::Equal => {
            if arena.taken[second] < arena.taken[first] {
                second
            } else {
                first
            }
        }
    }
}
