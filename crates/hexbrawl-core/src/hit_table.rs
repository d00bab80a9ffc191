//! Hit location tables.

use hexfield::{Coords, MovementMode};
use serde::{Deserialize, Serialize};

use crate::dice::DiceRoller;
use crate::entity::{Entity, EntityTag, Location};

/// Which table an attack rolls on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HitTable {
    /// 1d6 upper-body table
    Punch,
    /// 1d6 leg table
    Kick,
    /// 2d6 full table
    Standard,
}

/// Side of the target the attack comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackSide {
    /// Front arc
    Front,
    /// Left side
    Left,
    /// Right side
    Right,
    /// Rear arc
    Rear,
}

/// Where a blow landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HitData {
    /// Location struck
    pub location: Location,
    /// Strikes rear armor
    pub rear: bool,
    /// Rolled a possible critical through armor
    pub through_armor_critical: bool,
    /// Side the attack came from
    pub side: AttackSide,
}

impl HitData {
    /// A plain hit on a location from the front.
    #[must_use]
    pub const fn front(location: Location) -> Self {
        Self {
            location,
            rear: false,
            through_armor_critical: false,
            side: AttackSide::Front,
        }
    }
}

/// Side of `target` an attacker standing in `from` strikes.
///
/// Same-hex attacks (thrash, brush-off) come from the front.
#[must_use]
pub fn side_of(target: &Entity, from: Coords) -> AttackSide {
    let Some(at) = target.position() else {
        return AttackSide::Front;
    };
    let Some(bearing) = at.direction_to(from) else {
        return AttackSide::Front;
    };
    match target.facing.relative_to(bearing) {
        0 => AttackSide::Front,
        1 | 2 => AttackSide::Right,
        3 => AttackSide::Rear,
        _ => AttackSide::Left,
    }
}

/// Rolls a hit location on `table` against `target`.
pub fn roll_location(
    table: HitTable,
    target: &Entity,
    side: AttackSide,
    dice: &mut dyn DiceRoller,
) -> HitData {
    match target.tag() {
        EntityTag::Mech => mech_location(table, side, dice),
        EntityTag::Vehicle => vehicle_location(target, side, dice),
        EntityTag::Aerospace | EntityTag::FighterSquadron => {
            let location = match side {
                AttackSide::Front => Location::Nose,
                AttackSide::Left => Location::LeftWing,
                AttackSide::Right => Location::RightWing,
                AttackSide::Rear => Location::Aft,
            };
            HitData {
                side,
                ..HitData::front(location)
            }
        }
        EntityTag::Infantry | EntityTag::BattleArmor | EntityTag::ProtoMech | EntityTag::Missile => {
            HitData {
                side,
                ..HitData::front(Location::Body)
            }
        }
    }
}

fn mech_location(table: HitTable, side: AttackSide, dice: &mut dyn DiceRoller) -> HitData {
    use Location::{
        CenterTorso as CT, Head, LeftArm as LA, LeftLeg as LL, LeftTorso as LT, RightArm as RA,
        RightLeg as RL, RightTorso as RT,
    };

    let rear = side == AttackSide::Rear;
    let mut through_armor_critical = false;
    let location = match table {
        HitTable::Punch => {
            let roll = usize::from(dice.d6().clamp(1, 6)) - 1;
            let column = match side {
                AttackSide::Front | AttackSide::Rear => [LA, LT, CT, RT, RA, Head],
                AttackSide::Left => [LT, LT, CT, LA, LA, Head],
                AttackSide::Right => [RT, RT, CT, RA, RA, Head],
            };
            column.get(roll).copied().unwrap_or(Head)
        }
        HitTable::Kick => {
            let roll = dice.d6();
            match side {
                AttackSide::Front | AttackSide::Rear => {
                    if roll <= 3 {
                        RL
                    } else {
                        LL
                    }
                }
                AttackSide::Left => LL,
                AttackSide::Right => RL,
            }
        }
        HitTable::Standard => {
            let roll = dice.roll_2d6().total;
            through_armor_critical = roll == 2;
            match side {
                AttackSide::Front | AttackSide::Rear => match roll {
                    2 | 7 => CT,
                    3 | 4 => RA,
                    5 => RL,
                    6 => RT,
                    8 => LT,
                    9 => LL,
                    10 | 11 => LA,
                    _ => Head,
                },
                AttackSide::Left => match roll {
                    2 | 7 => LT,
                    3 | 6 => LL,
                    4 | 5 => LA,
                    8 => CT,
                    9 => RT,
                    10 => RA,
                    11 => RL,
                    _ => Head,
                },
                AttackSide::Right => match roll {
                    2 | 7 => RT,
                    3 | 6 => RL,
                    4 | 5 => RA,
                    8 => CT,
                    9 => LT,
                    10 => LA,
                    11 => LL,
                    _ => Head,
                },
            }
        }
    };

    HitData {
        location,
        rear: rear && location.has_rear(),
        through_armor_critical,
        side,
    }
}

fn vehicle_location(target: &Entity, side: AttackSide, dice: &mut dyn DiceRoller) -> HitData {
    let side_location = match side {
        AttackSide::Front => Location::Front,
        AttackSide::Left => Location::Left,
        AttackSide::Right => Location::Right,
        AttackSide::Rear => Location::Rear,
    };
    let top = if target.location(Location::Rotor).is_some() {
        Some(Location::Rotor)
    } else if target.location(Location::Turret).is_some() {
        Some(Location::Turret)
    } else {
        None
    };
    let vtol = target.movement_mode == MovementMode::Vtol;

    let roll = dice.roll_2d6().total;
    let location = match (roll, top) {
        (12, Some(top)) => top,
        (11, Some(Location::Rotor)) if vtol => Location::Rotor,
        _ => side_location,
    };
    HitData {
        location,
        rear: false,
        through_armor_critical: roll == 2,
        side,
    }
}
