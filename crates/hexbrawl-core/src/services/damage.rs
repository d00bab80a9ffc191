//! Standard armor/structure damage model.

use tracing::{debug, warn};

use crate::arena::Arena;
use crate::entity::{EntityId, EntityTag, Location, StatusFlags};
use crate::hit_table::HitData;
use crate::report::{codes, Report};

use super::{CriticalKind, DamageApplier, DamageOutcome, DestroyCause};

/// Armor first, then structure; leftover damage moves inward.
///
/// - Rear hits on torsos strike rear armor.
/// - Arms and legs transfer to the side torso, side torsos to the center torso.
/// - Losing the head, center torso or a single-location unit's body kills the
///   unit, as does losing any side of a vehicle.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardDamage;

impl StandardDamage {
    /// Creates the damage model.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn lethal(tag: EntityTag, location: Location) -> bool {
        location.is_lethal()
            || (tag == EntityTag::Vehicle
                && matches!(
                    location,
                    Location::Front | Location::Left | Location::Right | Location::Rear
                ))
    }
}

impl DamageApplier for StandardDamage {
    fn apply_damage(
        &self,
        arena: &mut Arena,
        target: EntityId,
        hit: HitData,
        damage: u32,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome::default();
        let Some(entity) = arena.get_mut(target) else {
            warn!(target: "hexbrawl::resolve", entity = %target, "damage target missing");
            return outcome;
        };
        let name = entity.name.clone();
        let tag = entity.tag();

        outcome.reports.push(
            Report::visible(codes::DAMAGE, target)
                .add(name.as_str())
                .add(damage)
                .add_obscured(hit.location.name())
                .with_indent(2),
        );

        let mut location = hit.location;
        let mut rear = hit.rear;
        let mut remaining = damage;
        while remaining > 0 {
            let Some(state) = entity.locations.get_mut(&location) else {
                debug!(target: "hexbrawl::resolve", entity = %target, ?location, "location absent; damage lost");
                break;
            };
            if state.destroyed {
                match location.transfer() {
                    Some(next) => {
                        location = next;
                        rear = false;
                        continue;
                    }
                    None => break,
                }
            }

            let armor = if rear && location.has_rear() {
                &mut state.rear_armor
            } else {
                &mut state.armor
            };
            let absorbed = remaining.min(*armor);
            *armor -= absorbed;
            remaining -= absorbed;
            if remaining == 0 {
                break;
            }

            let internal = remaining.min(state.structure);
            state.structure -= internal;
            remaining -= internal;
            outcome.reports.push(
                Report::visible(codes::STRUCTURE_DAMAGE, target)
                    .add(location.name())
                    .add_obscured(state.structure)
                    .with_indent(3),
            );
            if state.structure > 0 {
                break;
            }

            state.destroyed = true;
            outcome.reports.push(
                Report::visible(codes::LOCATION_DESTROYED, target)
                    .add(location.name())
                    .with_indent(3),
            );
            if Self::lethal(tag, location) {
                let survivable = location != Location::Head && tag != EntityTag::Missile;
                outcome.destroyed = Some(DestroyCause::new(
                    format!("{} destruction", location.name()),
                    survivable,
                    location != Location::Body,
                ));
                break;
            }
            match location.transfer() {
                Some(next) => {
                    location = next;
                    rear = false;
                }
                None => break,
            }
        }

        if let (Some(body), Some(infantry)) = (
            entity.locations.get(&Location::Body).copied(),
            entity.inner_mut().as_infantry_mut(),
        ) {
            infantry.troopers = infantry.troopers.min(body.structure);
        }
        outcome
    }

    fn apply_critical(
        &self,
        arena: &mut Arena,
        target: EntityId,
        location: Location,
        kind: CriticalKind,
    ) -> DamageOutcome {
        let mut outcome = DamageOutcome::default();
        let Some(entity) = arena.get_mut(target) else {
            warn!(target: "hexbrawl::resolve", entity = %target, "critical target missing");
            return outcome;
        };
        let name = entity.name.clone();

        match kind {
            CriticalKind::RotorDestroyed => {
                if let Some(vehicle) = entity.as_vehicle_mut() {
                    vehicle.rotor_destroyed = true;
                }
                if let Some(rotor) = entity.locations.get_mut(&Location::Rotor) {
                    rotor.destroyed = true;
                }
                entity.status.insert(StatusFlags::IMMOBILE);
                outcome
                    .reports
                    .push(Report::visible(codes::ROTOR_DESTROYED, target).add(name).with_indent(3));
            }
            CriticalKind::ThroughArmor => {
                outcome.reports.push(
                    Report::visible(codes::THROUGH_ARMOR_CRITICAL, target).with_indent(3),
                );
                let effect = match (entity.tag(), location) {
                    (EntityTag::Mech, Location::Head) => {
                        outcome.destroyed = Some(DestroyCause::new("cockpit hit", false, true));
                        "cockpit destroyed"
                    }
                    (EntityTag::Mech, loc) => {
                        let mech = entity.as_mech_mut();
                        let limb = mech.and_then(|m| match loc {
                            Location::LeftArm => Some(&mut m.left_arm),
                            Location::RightArm => Some(&mut m.right_arm),
                            Location::LeftLeg => Some(&mut m.left_leg),
                            Location::RightLeg => Some(&mut m.right_leg),
                            _ => None,
                        });
                        match limb {
                            Some(limb) if !limb.upper_damaged => {
                                limb.upper_damaged = true;
                                "upper actuator"
                            }
                            Some(limb) if !limb.lower_damaged => {
                                limb.lower_damaged = true;
                                "lower actuator"
                            }
                            Some(_) => "no further effect",
                            None => "internal damage",
                        }
                    }
                    (EntityTag::Vehicle, _) => {
                        entity.status.insert(StatusFlags::IMMOBILE);
                        "motive system destroyed"
                    }
                    _ => "no effect",
                };
                outcome.reports.push(
                    Report::visible(codes::CRITICAL_HIT, target)
                        .add(name)
                        .add_obscured(effect)
                        .with_indent(3),
                );
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::{InfantryComponents, MechComponents, VehicleComponents};
    use crate::entity::EntityInner;
    use hexfield::{Coords, MovementMode};

    fn mech(arena: &mut Arena) -> EntityId {
        arena.spawn_with(
            EntityTag::Mech,
            EntityInner::Mech(MechComponents::default()),
            Some(Coords::new(2, 2)),
            |e| e.with_armor(4, 3).with_tonnage(50),
        )
    }

    #[test]
    fn armor_absorbs_first() {
        let mut arena = Arena::default();
        let id = mech(&mut arena);
        let out = StandardDamage::new().apply_damage(
            &mut arena,
            id,
            HitData::front(Location::LeftArm),
            3,
        );
        let arm = arena.get(id).unwrap().location(Location::LeftArm).unwrap();
        assert_eq!(arm.armor, 1);
        assert_eq!(arm.structure, 3);
        assert_eq!(out.reports.len(), 1);
        assert_eq!(out.reports[0].id, codes::DAMAGE);
        assert!(out.destroyed.is_none());
    }

    #[test]
    fn excess_transfers_inward() {
        let mut arena = Arena::default();
        let id = mech(&mut arena);
        // 4 armor + 3 structure destroys the arm, 2 more hit the left torso armor
        StandardDamage::new().apply_damage(&mut arena, id, HitData::front(Location::LeftArm), 9);
        let entity = arena.get(id).unwrap();
        assert!(entity.location(Location::LeftArm).unwrap().destroyed);
        assert_eq!(entity.location(Location::LeftTorso).unwrap().armor, 2);
    }

    #[test]
    fn rear_hits_use_rear_armor() {
        let mut arena = Arena::default();
        let id = mech(&mut arena);
        let hit = HitData {
            rear: true,
            ..HitData::front(Location::CenterTorso)
        };
        StandardDamage::new().apply_damage(&mut arena, id, hit, 1);
        let ct = arena.get(id).unwrap().location(Location::CenterTorso).unwrap();
        assert_eq!(ct.armor, 4);
        assert_eq!(ct.rear_armor, 1);
    }

    #[test]
    fn center_torso_loss_kills() {
        let mut arena = Arena::default();
        let id = mech(&mut arena);
        let out = StandardDamage::new().apply_damage(
            &mut arena,
            id,
            HitData::front(Location::CenterTorso),
            20,
        );
        let cause = out.destroyed.unwrap();
        assert!(cause.survivable);
        assert!(cause.salvageable);
    }

    #[test]
    fn vehicle_side_loss_kills() {
        let mut arena = Arena::default();
        let id = arena.spawn_with(
            EntityTag::Vehicle,
            EntityInner::Vehicle(VehicleComponents::default()),
            Some(Coords::new(1, 1)),
            |e| e.with_armor(1, 1),
        );
        let out = StandardDamage::new().apply_damage(&mut arena, id, HitData::front(Location::Left), 5);
        assert!(out.destroyed.is_some());
    }

    #[test]
    fn infantry_troopers_follow_structure() {
        let mut arena = Arena::default();
        let id = arena.spawn_with(
            EntityTag::Infantry,
            EntityInner::Infantry(InfantryComponents {
                troopers: 20,
                explosive_damage: 0,
                ejected_crew: false,
            }),
            Some(Coords::new(1, 1)),
            |e| e.with_armor(0, 20),
        );
        StandardDamage::new().apply_damage(&mut arena, id, HitData::front(Location::Body), 7);
        assert_eq!(arena.get(id).unwrap().as_infantry().unwrap().troopers, 13);
    }

    #[test]
    fn rotor_critical_immobilizes() {
        let mut arena = Arena::default();
        let id = arena.spawn_with(
            EntityTag::Vehicle,
            EntityInner::Vehicle(VehicleComponents::default()),
            Some(Coords::new(1, 1)),
            |e| e.with_movement(MovementMode::Vtol).with_armor(2, 2),
        );
        let out = StandardDamage::new().apply_critical(
            &mut arena,
            id,
            Location::Rotor,
            CriticalKind::RotorDestroyed,
        );
        let vtol = arena.get(id).unwrap();
        assert!(vtol.as_vehicle().unwrap().rotor_destroyed);
        assert!(vtol.status.contains(StatusFlags::IMMOBILE));
        assert_eq!(out.reports[0].id, codes::ROTOR_DESTROYED);
    }

    #[test]
    fn limb_critical_damages_actuators_in_order() {
        let mut arena = Arena::default();
        let id = mech(&mut arena);
        let model = StandardDamage::new();
        model.apply_critical(&mut arena, id, Location::RightArm, CriticalKind::ThroughArmor);
        model.apply_critical(&mut arena, id, Location::RightArm, CriticalKind::ThroughArmor);
        let arm = arena.get(id).unwrap().as_mech().unwrap().right_arm;
        assert!(arm.upper_damaged && arm.lower_damaged);
    }
}
