//! Displacement, piloting rolls and falls.

use hexfield::Coords;
use tracing::{debug, warn};

use crate::arena::Arena;
use crate::damage::{clusters, fall};
use crate::dice::DiceRoller;
use crate::entity::{EntityId, StatusFlags};
use crate::hit_table::{roll_location, AttackSide, HitTable};
use crate::report::{codes, Report};

use super::{DamageApplier, DamageOutcome, Displacer, PsrRequirement, StandardDamage};

/// Fall damage is applied in groups of this size.
const FALL_CLUSTER: u32 = 5;

/// Makes a piloting skill roll for `id`.
///
/// The target number is the unit's piloting skill plus `modifier`; the roll
/// passes when it meets or beats it. Returns the reports and whether it passed.
/// Unknown units pass silently.
pub fn roll_piloting(
    arena: &Arena,
    id: EntityId,
    modifier: i32,
    reason: &str,
    dice: &mut dyn DiceRoller,
) -> (Vec<Report>, bool) {
    let Some(entity) = arena.get(id) else {
        return (Vec::new(), true);
    };
    let needs = entity.piloting + modifier;
    let roll = dice.roll_2d6();
    let passed = roll.total >= needs;
    debug!(target: "hexbrawl::resolve", entity = %id, needs, roll = roll.total, passed, "piloting roll");

    let mut reports = vec![Report::visible(codes::PSR_ROLL, id)
        .add(entity.name.as_str())
        .add(reason)
        .add(needs)
        .add(roll.total)
        .with_indent(2)
        .with_newlines(0)];
    if passed {
        reports.push(Report::visible(codes::PSR_PASS, id));
    } else {
        reports.push(Report::visible(codes::PSR_FALL, id).add(entity.name.as_str()));
    }
    (reports, passed)
}

/// Moves units into empty on-board hexes; anything else makes a mech fall.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDisplacement {
    damage: StandardDamage,
}

impl StandardDisplacement {
    /// Creates the displacer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            damage: StandardDamage::new(),
        }
    }
}

impl Displacer for StandardDisplacement {
    fn displace(
        &self,
        arena: &mut Arena,
        id: EntityId,
        from: Coords,
        to: Coords,
        psr: Option<PsrRequirement>,
        dice: &mut dyn DiceRoller,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome::default();
        let Some(entity) = arena.get(id) else {
            warn!(target: "hexbrawl::resolve", entity = %id, "displaced unit missing");
            return outcome;
        };
        let is_mech = entity.is_mech();
        let name = entity.name.clone();
        let blocked = !arena.board().contains(to) || arena.stacking_violation(entity, to).is_some();

        if blocked {
            debug!(target: "hexbrawl::resolve", entity = %id, %from, %to, "displacement blocked");
            if is_mech {
                outcome.merge(self.fall(arena, id, 0, dice));
            }
            return outcome;
        }

        arena.set_position(id, Some(to));
        outcome.reports.push(
            Report::visible(codes::DISPLACED, id)
                .add(name.as_str())
                .add(to.to_string())
                .with_indent(2),
        );

        if let Some(psr) = psr.filter(|_| is_mech) {
            let (reports, passed) = roll_piloting(arena, id, psr.modifier, &psr.reason, dice);
            outcome.reports.extend(reports);
            if !passed {
                outcome.merge(self.fall(arena, id, 0, dice));
            }
        }
        outcome
    }

    fn fall(
        &self,
        arena: &mut Arena,
        id: EntityId,
        levels: u32,
        dice: &mut dyn DiceRoller,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome::default();
        let Some(entity) = arena.get_mut(id) else {
            return outcome;
        };
        if entity.is_mech() {
            entity.status.insert(StatusFlags::PRONE);
        }
        let total = fall(entity.tonnage, levels);
        outcome.reports.push(
            Report::visible(codes::FALL_DAMAGE, id)
                .add(entity.name.as_str())
                .add(total)
                .with_indent(2),
        );

        for group in clusters(total, FALL_CLUSTER) {
            let Some(entity) = arena.get(id) else {
                break;
            };
            let hit = roll_location(HitTable::Standard, entity, AttackSide::Front, dice);
            outcome.merge(self.damage.apply_damage(arena, id, hit, group));
            if outcome.destroyed.is_some() {
                break;
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::entity::components::{InfantryComponents, MechComponents};
    use crate::entity::{EntityInner, EntityTag};

    fn mech(arena: &mut Arena, at: Coords) -> EntityId {
        arena.spawn_with(
            EntityTag::Mech,
            EntityInner::Mech(MechComponents::default()),
            Some(at),
            |e| e.with_armor(10, 5).with_tonnage(50).with_piloting(5),
        )
    }

    #[test]
    fn displaces_into_empty_hex() {
        let mut arena = Arena::default();
        let from = Coords::new(3, 3);
        let to = Coords::new(3, 4);
        let id = mech(&mut arena, from);
        let mut dice = ScriptedDice::new([3, 3]);
        let out = StandardDisplacement::new().displace(
            &mut arena,
            id,
            from,
            to,
            Some(PsrRequirement::new(0, "kicked")),
            &mut dice,
        );
        assert_eq!(arena.get(id).unwrap().position(), Some(to));
        assert!(!arena.get(id).unwrap().is_prone());
        let ids: Vec<u16> = out.reports.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![codes::DISPLACED, codes::PSR_ROLL, codes::PSR_PASS]);
    }

    #[test]
    fn failed_roll_falls() {
        let mut arena = Arena::default();
        let from = Coords::new(3, 3);
        let id = mech(&mut arena, from);
        // PSR 1+1 fails against 5; fall damage 5 in one cluster, location 3+4
        let mut dice = ScriptedDice::new([1, 1, 3, 4]);
        let out = StandardDisplacement::new().displace(
            &mut arena,
            id,
            from,
            Coords::new(4, 3),
            Some(PsrRequirement::new(0, "pushed")),
            &mut dice,
        );
        assert!(arena.get(id).unwrap().is_prone());
        assert!(out.reports.iter().any(|r| r.id == codes::PSR_FALL));
        assert!(out.reports.iter().any(|r| r.id == codes::FALL_DAMAGE));
        assert_eq!(
            arena.get(id).unwrap().location(crate::entity::Location::CenterTorso).unwrap().armor,
            5
        );
    }

    #[test]
    fn occupied_destination_blocks_and_mech_falls() {
        let mut arena = Arena::default();
        let from = Coords::new(3, 3);
        let to = Coords::new(3, 4);
        let id = mech(&mut arena, from);
        mech(&mut arena, to);
        let mut dice = ScriptedDice::new([3, 4]);
        let out = StandardDisplacement::new().displace(&mut arena, id, from, to, None, &mut dice);
        assert_eq!(arena.get(id).unwrap().position(), Some(from));
        assert!(arena.get(id).unwrap().is_prone());
        assert_eq!(out.reports[0].id, codes::FALL_DAMAGE);
    }

    #[test]
    fn off_board_blocks() {
        let mut arena = Arena::default();
        let from = Coords::new(0, 0);
        let id = arena.spawn_with(
            EntityTag::Infantry,
            EntityInner::Infantry(InfantryComponents::default()),
            Some(from),
            |e| e.with_armor(0, 10),
        );
        let mut dice = ScriptedDice::new(Vec::new());
        let out = StandardDisplacement::new().displace(
            &mut arena,
            id,
            from,
            Coords::new(-1, 0),
            None,
            &mut dice,
        );
        assert_eq!(arena.get(id).unwrap().position(), Some(from));
        assert!(out.reports.is_empty());
    }

    #[test]
    fn piloting_roll_meets_target() {
        let mut arena = Arena::default();
        let id = mech(&mut arena, Coords::new(1, 1));
        let mut dice = ScriptedDice::new([3, 4]);
        let (reports, passed) = roll_piloting(&arena, id, 2, "damage", &mut dice);
        assert!(passed);
        assert_eq!(reports[0].id, codes::PSR_ROLL);
    }
}
