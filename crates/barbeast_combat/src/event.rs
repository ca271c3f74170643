//! # Battle Event Log
//!
//! A closed set of typed events. Every event carries:
//! - a stable id `"{turn}-{index}-{TYPE}"`
//! - the cause that produced it
//! - HP of both combatants before and after (index 0 = first entity passed in)
//! - a presentation severity that never feeds back into battle logic

use serde::{Deserialize, Serialize};

use barbeast_procedural::Terrain;

use crate::entity::Burn;

/// Ordered battle log.
pub type BattleEventLog = Vec<BattleEvent>;

/// Presentation weight of an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    /// Routine beat.
    Normal,
    /// Crits and status applications.
    Highlight,
    /// Knockouts and the result.
    Climax,
}

/// What produced an event.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventCause {
    /// Battle setup.
    Setup,
    /// Turn order decided by speed.
    SpeedOrder,
    /// A skill was used.
    Skill,
    /// A skill landed a critical hit.
    Critical,
    /// Burn damage ticked.
    Burn,
    /// A combatant dropped to 0 HP.
    Knockout,
    /// The turn ceiling was reached.
    TurnLimit,
}

/// Why a battle ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EndReason {
    /// One side reached 0 HP.
    Knockout,
    /// Turn ceiling reached; judged on remaining HP.
    TurnLimit,
}

/// Lifecycle step of a status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusChange {
    /// Effect attached to the target.
    Applied,
    /// Effect dealt its periodic damage.
    Ticked,
    /// Effect dealt its last damage and fell off.
    Expired,
}

/// Event payload, one variant per event type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BattleEventKind {
    /// Battle begins.
    Start {
        /// Arena terrain.
        terrain: Terrain,
        /// Entity ids in acting order.
        order: [String; 2],
    },
    /// A new turn begins.
    Turn {
        /// Id of the entity acting first.
        first: String,
    },
    /// An entity uses a skill.
    Action {
        /// Acting entity.
        actor: String,
        /// Skill used.
        skill_id: String,
    },
    /// Damage is dealt.
    Damage {
        /// Attacking entity.
        attacker: String,
        /// Damaged entity.
        target: String,
        /// Damage after all modifiers.
        amount: u32,
        /// Whether the crit roll succeeded.
        critical: bool,
    },
    /// A status effect changes.
    Status {
        /// Affected entity.
        target: String,
        /// The burn involved.
        burn: Burn,
        /// Lifecycle step.
        change: StatusChange,
        /// Damage dealt by this step (0 when applied).
        amount: u32,
    },
    /// Battle ends.
    Result {
        /// The single winner.
        winner_id: String,
        /// End condition.
        reason: EndReason,
    },
}

impl BattleEventKind {
    /// Upper-case event type name.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Start { .. } => "START",
            Self::Turn { .. } => "TURN",
            Self::Action { .. } => "ACTION",
            Self::Damage { .. } => "DAMAGE",
            Self::Status { .. } => "STATUS",
            Self::Result { .. } => "RESULT",
        }
    }
}

/// One entry of the battle log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleEvent {
    /// Stable id `"{turn}-{index}-{TYPE}"`.
    pub id: String,
    /// Turn number (0 for START).
    pub turn: u32,
    /// Position within the turn.
    pub index: u32,
    /// Position within the whole log.
    pub at: u32,
    /// Producer of the event.
    pub cause: EventCause,
    /// Presentation weight.
    pub severity: Severity,
    /// HP of both combatants before the event.
    pub hp_before: [u32; 2],
    /// HP of both combatants after the event.
    pub hp_after: [u32; 2],
    /// Typed payload.
    pub kind: BattleEventKind,
}

impl BattleEvent {
    /// Upper-case event type name.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.type_name()
    }
}

/// Builds events with consistent ids and ordering.
#[derive(Debug, Default)]
pub(crate) struct LogBuilder {
    events: Vec<BattleEvent>,
    turn: u32,
    index: u32,
}

impl LogBuilder {
    /// Starts numbering a new turn.
    pub(crate) fn begin_turn(&mut self, turn: u32) {
        self.turn = turn;
        self.index = 0;
    }

    /// Appends an event.
    pub(crate) fn push(
        &mut self,
        kind: BattleEventKind,
        cause: EventCause,
        severity: Severity,
        hp_before: [u32; 2],
        hp_after: [u32; 2],
    ) {
        let at = u32::try_from(self.events.len()).unwrap_or(u32::MAX);
        self.events.push(BattleEvent {
            id: format!("{}-{}-{}", self.turn, self.index, kind.type_name()),
            turn: self.turn,
            index: self.index,
            at,
            cause,
            severity,
            hp_before,
            hp_after,
            kind,
        });
        self.index += 1;
    }

    /// Finishes the log.
    pub(crate) fn finish(self) -> BattleEventLog {
        self.events
    }
}
