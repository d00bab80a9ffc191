//! Declared actions and pretreatment.
//!
//! Declarations accumulate in an [`ActionQueue`] during the physical phase.
//! [`ActionQueue::pretreat`] turns them into [`PhysicalResult`]s in one pass
//! over the arena as it stands before any attack resolves:
//!
//! 1. Searchlights are split out and resolved on the spot.
//! 2. The rest are deduplicated per attacker.
//! 3. Every surviving action gets its to-hit numbers, damage and dice.
//!
//! Because every number is fixed before the first result resolves, one
//! attack's outcome never changes another's odds within the same phase.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::action::{AttackAction, AttackKind, Side};
use crate::arena::Arena;
use crate::damage::base_damage;
use crate::dice::{DiceRoller, Roll};
use crate::entity::{EntityId, StatusFlags};
use crate::error::EngineError;
use crate::report::{codes, Report, ReportLog};
use crate::tohit::{self, ToHit};

// =============================================================================
// Physical Result
// =============================================================================

/// A pretreated action: everything needed to resolve it later.
///
/// Slot 0 holds the left (or only) sub-attack, slot 1 the right arm of a
/// two-armed punch or brush-off.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalResult {
    /// The declaration
    pub action: AttackAction,
    /// To-hit per sub-attack
    pub to_hit: [ToHit; 2],
    /// Base damage per sub-attack
    pub damage: [u32; 2],
    /// Attack roll per sub-attack
    pub roll: [Roll; 2],
    /// Already settled as part of a mutual pair
    pub resolved: bool,
}

impl PhysicalResult {
    /// Sub-attack sides this result resolves, left first.
    #[must_use]
    pub fn sides(&self) -> &'static [Side] {
        tohit::sides(&self.action.kind)
    }

    /// Pretreats one action against the current arena.
    pub fn pretreat(arena: &Arena, action: AttackAction, dice: &mut dyn DiceRoller) -> Self {
        let mut to_hit = [
            ToHit::Impossible("no sub-attack".into()),
            ToHit::Impossible("no sub-attack".into()),
        ];
        let mut damage = [0; 2];
        let mut roll = [Roll::new(1, 1); 2];
        for &side in tohit::sides(&action.kind) {
            let slot = side.index();
            to_hit[slot] = tohit::compute(arena, &action, side);
            damage[slot] = base_damage(arena, &action, side);
            roll[slot] = dice.roll_2d6();
        }
        Self {
            action,
            to_hit,
            damage,
            roll,
            resolved: false,
        }
    }
}

// =============================================================================
// Action Queue
// =============================================================================

/// Physical-phase declarations awaiting pretreatment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionQueue {
    carried: Vec<AttackAction>,
    declared: Vec<AttackAction>,
}

impl ActionQueue {
    /// An empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares an action.
    pub fn declare(&mut self, action: AttackAction) {
        debug!(target: "hexbrawl::queue", attacker = %action.attacker, kind = ?action.kind, "declared");
        self.declared.push(action);
    }

    /// Decodes and declares a JSON action.
    ///
    /// # Errors
    ///
    /// [`EngineError::UnknownAttackKind`] if the `"kind"` field names no known
    /// attack, [`EngineError::Decode`] for any other malformed input. Nothing
    /// is queued on error.
    pub fn declare_encoded(&mut self, json: &str) -> Result<AttackAction, EngineError> {
        let value: serde_json::Value = serde_json::from_str(json).map_err(EngineError::Decode)?;
        if let Some(kind) = value.get("kind").and_then(serde_json::Value::as_str) {
            if !AttackKind::WIRE_NAMES.contains(&kind) {
                return Err(EngineError::UnknownAttackKind(kind.to_owned()));
            }
        }
        let action: AttackAction = serde_json::from_value(value).map_err(EngineError::Decode)?;
        self.declare(action);
        Ok(action)
    }

    /// Adds actions declared during movement (charges, rams, telemissiles).
    ///
    /// They sort ahead of every physical-phase declaration. Kinds that cannot
    /// be carried over are rejected and logged. Returns how many were taken.
    pub fn carry_over(&mut self, actions: impl IntoIterator<Item = AttackAction>) -> usize {
        let mut taken = 0;
        for action in actions {
            if action.kind.is_carried_over() {
                self.carried.push(action);
                taken += 1;
            } else {
                error!(target: "hexbrawl::queue", attacker = %action.attacker, kind = ?action.kind, "not a carried-over attack");
            }
        }
        taken
    }

    /// Number of queued declarations (before deduplication).
    #[must_use]
    pub fn len(&self) -> usize {
        self.carried.len() + self.declared.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.carried.is_empty() && self.declared.is_empty()
    }

    /// Drops everything queued.
    pub fn clear(&mut self) {
        self.carried.clear();
        self.declared.clear();
    }

    /// Drains the queue into the ordered, deduplicated action list.
    ///
    /// Searchlights are not included; see [`Self::take_searchlights`].
    pub fn drain_deduplicated(&mut self, arena: &Arena) -> Vec<AttackAction> {
        let carried = std::mem::take(&mut self.carried);
        let declared = std::mem::take(&mut self.declared);
        let usable = |action: &AttackAction| {
            let ok = arena.get(action.attacker).is_some_and(|a| !a.is_doomed());
            if !ok {
                debug!(target: "hexbrawl::queue", attacker = %action.attacker, kind = ?action.kind, "attacker gone; declaration dropped");
            }
            ok
        };

        let mut latest_carried: BTreeMap<EntityId, (usize, AttackAction)> = BTreeMap::new();
        for (index, action) in carried.into_iter().enumerate() {
            latest_carried.insert(action.attacker, (index, action));
        }
        let mut head: Vec<(usize, AttackAction)> = latest_carried
            .into_values()
            .filter(|(_, action)| usable(action))
            .collect();
        head.sort_by_key(|(index, _)| *index);

        let mut per_attacker: BTreeMap<EntityId, Vec<(usize, AttackAction)>> = BTreeMap::new();
        for (index, action) in declared.into_iter().enumerate() {
            if action.kind == AttackKind::Searchlight {
                continue;
            }
            per_attacker.entry(action.attacker).or_default().push((index, action));
        }

        let mut tail = Vec::new();
        for (attacker, list) in per_attacker {
            if head.iter().any(|(_, a)| a.attacker == attacker) {
                debug!(target: "hexbrawl::queue", %attacker, dropped = list.len(), "superseded by carried-over attack");
                continue;
            }
            let Some(&(last_index, last)) = list.last() else {
                continue;
            };
            if !usable(&last) {
                continue;
            }
            tail.push((last_index, last));
            let partner = |kind: &AttackKind| match last.kind {
                AttackKind::Punch { .. } => matches!(kind, AttackKind::Kick { .. }),
                AttackKind::Kick { .. } => matches!(kind, AttackKind::Punch { .. }),
                _ => false,
            };
            if let Some(&pair) = list.iter().rev().find(|(_, a)| partner(&a.kind)) {
                tail.push(pair);
            }
        }
        tail.sort_by_key(|(index, _)| *index);

        head.into_iter()
            .chain(tail)
            .map(|(_, action)| action)
            .collect()
    }

    /// Removes and returns every queued searchlight, in declaration order.
    pub fn take_searchlights(&mut self) -> Vec<AttackAction> {
        let (lights, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.declared)
            .into_iter()
            .partition(|a| a.kind == AttackKind::Searchlight);
        self.declared = rest;
        lights
    }

    /// Resolves searchlights, deduplicates the rest and pretreats them.
    ///
    /// Leaves the queue empty.
    pub fn pretreat(
        &mut self,
        arena: &mut Arena,
        dice: &mut dyn DiceRoller,
        reports: &mut ReportLog,
    ) -> Vec<PhysicalResult> {
        for light in self.take_searchlights() {
            reports.extend(resolve_searchlight(arena, &light));
        }
        let actions = self.drain_deduplicated(arena);
        debug!(target: "hexbrawl::queue", count = actions.len(), "pretreating");
        actions
            .into_iter()
            .map(|action| PhysicalResult::pretreat(arena, action, dice))
            .collect()
    }
}

/// Lights up the target of a searchlight declaration.
///
/// The attacker must be in play with a working searchlight, and the target
/// must be a unit in play.
pub fn resolve_searchlight(arena: &mut Arena, action: &AttackAction) -> Vec<Report> {
    let Some(attacker) = arena.get(action.attacker) else {
        return Vec::new();
    };
    if !attacker.is_alive() || !attacker.status.contains(StatusFlags::SEARCHLIGHT) {
        debug!(target: "hexbrawl::queue", attacker = %action.attacker, "no working searchlight");
        return Vec::new();
    }
    let attacker_name = attacker.name.clone();
    let Some(target_id) = action.target.entity() else {
        return Vec::new();
    };
    let Some(target) = arena.get_mut(target_id) else {
        return Vec::new();
    };
    target.status.insert(StatusFlags::ILLUMINATED);
    vec![Report::visible(codes::SEARCHLIGHT, target_id)
        .add(attacker_name)
        .add(target.name.as_str())]
}
