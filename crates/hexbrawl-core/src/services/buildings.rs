//! Building damage, collapse and fuel-tank explosions.

use hexfield::{Board, BuildingId, Coords};
use tracing::debug;

use crate::arena::Arena;
use crate::error::EngineError;
use crate::report::{codes, Report};

use super::{BuildingDamager, BuildingOutcome};

/// Standard building rules.
///
/// A hex that collapses queues a +0 piloting roll for every mech inside it.
/// A fuel tank that collapses explodes for its magnitude; the caller applies
/// that damage to the units in the hex.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardBuildings;

impl StandardBuildings {
    /// Creates the building rules.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl BuildingDamager for StandardBuildings {
    fn damage_building(
        &self,
        arena: &mut Arena,
        building: BuildingId,
        coords: Coords,
        damage: u32,
    ) -> Result<BuildingOutcome, EngineError> {
        let result = arena
            .board_mut()
            .damage_building(building, coords, damage)
            .map_err(|_| EngineError::MissingBuilding(building))?;
        let Some(info) = arena.board().building(building) else {
            return Err(EngineError::MissingBuilding(building));
        };
        let name = info.name.clone();
        let fuel_tank = info.is_fuel_tank();
        let magnitude = info.magnitude;

        let mut outcome = BuildingOutcome::default();
        outcome.reports.push(
            Report::public(codes::BUILDING_DAMAGE)
                .add(name.as_str())
                .add(damage)
                .add(coords.to_string())
                .add(result.new_cf)
                .with_indent(2),
        );

        if result.collapsed {
            debug!(target: "hexbrawl::resolve", %building, hex = %coords, "building collapsed");
            outcome.collapsed = true;
            outcome.reports.push(
                Report::public(codes::BUILDING_COLLAPSE)
                    .add(name.as_str())
                    .add(coords.to_string())
                    .with_indent(2),
            );
            for id in arena.entities_at(coords) {
                if arena.get(id).is_some_and(|e| e.is_mech() && e.is_alive()) {
                    arena.queue_psr(id, 0, "building collapse");
                }
            }
            if fuel_tank {
                outcome.exploded = Some(magnitude);
                outcome.reports.push(
                    Report::public(codes::FUEL_EXPLOSION)
                        .add(name)
                        .add(magnitude)
                        .with_indent(2),
                );
            }
        }
        Ok(outcome)
    }

    fn absorption(&self, board: &Board, building: BuildingId, coords: Coords) -> u32 {
        board.building(building).map_or(0, |b| b.absorption(coords))
    }

    fn damage_scale(&self, board: &Board, building: BuildingId) -> f32 {
        board.building(building).map_or(1.0, hexfield::Building::damage_scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::components::MechComponents;
    use crate::entity::{EntityInner, EntityTag};
    use hexfield::BuildingClass;

    #[test]
    fn damage_reduces_cf() {
        let mut arena = Arena::default();
        let at = Coords::new(4, 4);
        let id = arena
            .board_mut()
            .add_building("Depot", BuildingClass::Medium, &[(at, 2)]);
        let out = StandardBuildings::new()
            .damage_building(&mut arena, id, at, 10)
            .unwrap();
        assert!(!out.collapsed);
        assert_eq!(out.reports.len(), 1);
        assert_eq!(out.reports[0].id, codes::BUILDING_DAMAGE);
        let cf = arena.board().building(id).unwrap().cf(at);
        assert_eq!(cf, BuildingClass::Medium.default_cf() - 10);
    }

    #[test]
    fn collapse_queues_piloting_rolls() {
        let mut arena = Arena::default();
        let at = Coords::new(4, 4);
        let building = arena
            .board_mut()
            .add_building("Shed", BuildingClass::Light, &[(at, 1)]);
        let mech = arena.spawn_with(
            EntityTag::Mech,
            EntityInner::Mech(MechComponents::default()),
            Some(at),
            |e| e,
        );
        let out = StandardBuildings::new()
            .damage_building(&mut arena, building, at, 500)
            .unwrap();
        assert!(out.collapsed);
        assert_eq!(out.exploded, None);
        assert_eq!(arena.pending_psrs().len(), 1);
        assert_eq!(arena.pending_psrs()[0].entity, mech);
    }

    #[test]
    fn fuel_tank_explodes_on_collapse() {
        let mut arena = Arena::default();
        let at = Coords::new(2, 2);
        let tank = arena.board_mut().add_fuel_tank("Tank", at, 1, 40);
        let out = StandardBuildings::new()
            .damage_building(&mut arena, tank, at, 100)
            .unwrap();
        assert_eq!(out.exploded, Some(40));
        assert!(out.reports.iter().any(|r| r.id == codes::FUEL_EXPLOSION));
    }

    #[test]
    fn unknown_building_is_an_error() {
        let mut arena = Arena::default();
        let err = StandardBuildings::new()
            .damage_building(&mut arena, BuildingId::new(99), Coords::new(0, 0), 1)
            .unwrap_err();
        assert!(matches!(err, EngineError::MissingBuilding(_)));
    }

    #[test]
    fn hardened_halves_pass_through() {
        let mut arena = Arena::default();
        let at = Coords::new(1, 1);
        let id = arena
            .board_mut()
            .add_building("Bunker", BuildingClass::Hardened, &[(at, 1)]);
        let rules = StandardBuildings::new();
        assert!((rules.damage_scale(arena.board(), id) - 0.5).abs() < f32::EPSILON);
        assert_eq!(rules.absorption(arena.board(), id, at), 12);
    }
}
