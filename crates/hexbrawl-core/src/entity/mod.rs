//! Entities: the units that fight on the board.
//!
//! - [`EntityId`] and [`PlayerId`]: identifiers
//! - [`EntityTag`]: unit type, used for attack eligibility and hit tables
//! - [`EntityInner`]: type-specific component storage
//! - [`Entity`]: the full unit record
//!
//! Every unit shares the same common state (position, armor, status flags,
//! relations). Only data that a single unit type has lives in
//! [`EntityInner`]. The tag and the inner variant always agree.
//!
//! # Example
//!
//! ```
//! use hexbrawl_core::entity::{Entity, EntityId, EntityTag, EntityInner, Location};
//! use hexbrawl_core::entity::components::MechComponents;
//!
//! let mech = Entity::new(
//!     EntityId::new(42),
//!     EntityTag::Mech,
//!     EntityInner::Mech(MechComponents::default()),
//! )
//! .with_tonnage(50)
//! .with_armor(10, 5);
//!
//! assert_eq!(mech.id().as_u64(), 42);
//! assert_eq!(mech.location(Location::LeftArm).map(|l| l.armor), Some(10));
//! assert!(mech.position().is_none());
//! ```

pub mod components;

use std::collections::BTreeMap;
use std::fmt;

use hexfield::{Coords, Direction, MovementMode};
use serde::{Deserialize, Serialize};

pub use components::{
    AerospaceComponents, BattleArmorComponents, ClubKind, GrappleSide, InfantryComponents,
    LimbActuators, Location, LocationState, MechComponents, MissileComponents, MoveStep,
    ProtoMechComponents, Relations, RemovalCondition, SquadronComponents, StatusFlags,
    VehicleComponents,
};

// =============================================================================
// Identifiers
// =============================================================================

/// Unique identifier for an entity.
///
/// Ordered by numeric value; every iteration over entities follows this order.
///
/// # Example
///
/// ```
/// use hexbrawl_core::entity::EntityId;
///
/// let a = EntityId::new(1);
/// let b = EntityId::new(2);
/// assert!(a < b);
/// assert_eq!(format!("{a:?}"), "EntityId(1)");
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct EntityId(u64);

impl EntityId {
    /// Creates a new `EntityId` from a raw `u64` value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw `u64` value of this identifier.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self::new(id)
    }
}

/// Identifier of a connected (or formerly connected) player.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new `PlayerId`.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

// =============================================================================
// Tag and Inner Storage
// =============================================================================

/// Unit type.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityTag {
    /// BattleMech (including land-air mechs)
    Mech,
    /// Tracked, wheeled, hover, naval or rotor vehicle
    Vehicle,
    /// Conventional infantry platoon
    Infantry,
    /// Battle armor squad
    BattleArmor,
    /// ProtoMech
    ProtoMech,
    /// Aerospace fighter or small craft
    Aerospace,
    /// Group of fighters acting as one unit
    FighterSquadron,
    /// Guided missile in flight
    Missile,
}

impl EntityTag {
    /// Movement mode a freshly spawned unit of this type starts with.
    #[must_use]
    pub const fn default_movement(self) -> MovementMode {
        match self {
            Self::Mech | Self::ProtoMech => MovementMode::Biped,
            Self::Vehicle => MovementMode::Tracked,
            Self::Infantry | Self::BattleArmor => MovementMode::Leg,
            Self::Aerospace | Self::FighterSquadron | Self::Missile => MovementMode::Aerodyne,
        }
    }

    /// Locations a unit of this type has.
    #[must_use]
    pub fn locations(self) -> &'static [Location] {
        const VEHICLE: [Location; 4] = [
            Location::Front,
            Location::Left,
            Location::Right,
            Location::Rear,
        ];
        const BODY: [Location; 1] = [Location::Body];
        match self {
            Self::Mech => &Location::MECH,
            Self::Vehicle => &VEHICLE,
            Self::Aerospace | Self::FighterSquadron => &Location::AEROSPACE,
            Self::Infantry | Self::BattleArmor | Self::ProtoMech | Self::Missile => &BODY,
        }
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Mech => "Mech",
            Self::Vehicle => "Vehicle",
            Self::Infantry => "Infantry",
            Self::BattleArmor => "BattleArmor",
            Self::ProtoMech => "ProtoMech",
            Self::Aerospace => "Aerospace",
            Self::FighterSquadron => "FighterSquadron",
            Self::Missile => "Missile",
        };
        f.write_str(name)
    }
}

/// Type-specific component storage. The variant always matches the entity's tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityInner {
    /// Mech components
    Mech(MechComponents),
    /// Vehicle components
    Vehicle(VehicleComponents),
    /// Infantry components
    Infantry(InfantryComponents),
    /// Battle armor components
    BattleArmor(BattleArmorComponents),
    /// ProtoMech components
    ProtoMech(ProtoMechComponents),
    /// Aerospace components
    Aerospace(AerospaceComponents),
    /// Fighter squadron components
    FighterSquadron(SquadronComponents),
    /// Missile components
    Missile(MissileComponents),
}

macro_rules! inner_accessors {
    ($($variant:ident => $ty:ty, $get:ident, $get_mut:ident;)*) => {
        impl EntityInner {
            /// Returns the corresponding `EntityTag` for this inner storage.
            #[must_use]
            pub const fn tag(&self) -> EntityTag {
                match self {
                    $(Self::$variant(_) => EntityTag::$variant,)*
                }
            }

            $(
                #[doc = concat!("Returns the ", stringify!($variant), " components, if present.")]
                #[must_use]
                pub const fn $get(&self) -> Option<&$ty> {
                    match self {
                        Self::$variant(components) => Some(components),
                        _ => None,
                    }
                }

                #[doc = concat!("Returns mutable ", stringify!($variant), " components, if present.")]
                #[must_use]
                pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                    match self {
                        Self::$variant(components) => Some(components),
                        _ => None,
                    }
                }
            )*
        }

        impl Entity {
            $(
                #[doc = concat!("Returns the ", stringify!($variant), " components, `None` for other unit types.")]
                #[must_use]
                pub const fn $get(&self) -> Option<&$ty> {
                    self.inner.$get()
                }

                #[doc = concat!("Returns mutable ", stringify!($variant), " components, `None` for other unit types.")]
                #[must_use]
                pub fn $get_mut(&mut self) -> Option<&mut $ty> {
                    self.inner.$get_mut()
                }
            )*
        }
    };
}

inner_accessors! {
    Mech => MechComponents, as_mech, as_mech_mut;
    Vehicle => VehicleComponents, as_vehicle, as_vehicle_mut;
    Infantry => InfantryComponents, as_infantry, as_infantry_mut;
    BattleArmor => BattleArmorComponents, as_battle_armor, as_battle_armor_mut;
    ProtoMech => ProtoMechComponents, as_protomech, as_protomech_mut;
    Aerospace => AerospaceComponents, as_aerospace, as_aerospace_mut;
    FighterSquadron => SquadronComponents, as_squadron, as_squadron_mut;
    Missile => MissileComponents, as_missile, as_missile_mut;
}

// =============================================================================
// Entity
// =============================================================================

/// A unit in play (or, once despawned, in the graveyard).
///
/// Identity and position are private: ids are assigned by the arena and
/// position changes go through [`crate::arena::Arena::set_position`] so the
/// position index stays in sync. Everything else is plain public state that
/// the engine and its collaborators mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    id: EntityId,
    tag: EntityTag,
    inner: EntityInner,
    position: Option<Coords>,

    /// Display name used in reports
    pub name: String,
    /// Controlling player
    pub owner: PlayerId,
    /// Facing direction
    pub facing: Direction,
    /// Elevation above the hex surface (altitude for aerospace units)
    pub elevation: i32,
    /// Mass in tons
    pub tonnage: u32,
    /// Piloting skill target number
    pub piloting: i32,
    /// How the unit moves
    pub movement_mode: MovementMode,
    /// Armor and structure by location
    pub locations: BTreeMap<Location, LocationState>,
    /// Lifecycle and round status
    pub status: StatusFlags,
    /// Links to other entities
    pub links: Relations,
    /// Detection range in hexes
    pub sensor_range: u32,
    /// ECM bubble radius in hexes (only while `ECM_ACTIVE`)
    pub ecm_radius: u32,
    /// To-hit modifier attackers take for this unit's movement this turn
    pub target_movement_modifier: i32,
    /// How this unit moved this turn
    pub attacker_movement: MoveStep,
    /// Attacker credited with this unit's destruction
    pub kill_credit: Option<EntityId>,
    /// Kill credit has been granted
    pub gave_kill_credit: bool,
    /// How the unit left play
    pub removal: Option<RemovalCondition>,
}

impl Entity {
    /// Creates a new entity with empty locations for its type and default state.
    ///
    /// The caller is responsible for `tag` and `inner` being consistent.
    #[must_use]
    pub fn new(id: EntityId, tag: EntityTag, inner: EntityInner) -> Self {
        let mut locations: BTreeMap<Location, LocationState> = tag
            .locations()
            .iter()
            .map(|&loc| (loc, LocationState::default()))
            .collect();
        if let EntityInner::Vehicle(vehicle) = &inner {
            if vehicle.turret {
                locations.insert(Location::Turret, LocationState::default());
            }
        }

        Self {
            id,
            tag,
            inner,
            position: None,
            name: format!("{tag} {id}"),
            owner: PlayerId::default(),
            facing: Direction::North,
            elevation: 0,
            tonnage: 0,
            piloting: 5,
            movement_mode: tag.default_movement(),
            locations,
            status: StatusFlags::empty(),
            links: Relations::default(),
            sensor_range: 0,
            ecm_radius: 0,
            target_movement_modifier: 0,
            attacker_movement: MoveStep::None,
            kill_credit: None,
            gave_kill_credit: false,
            removal: None,
        }
    }

    /// Builder: set the display name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Builder: set the owner.
    #[must_use]
    pub fn with_owner(mut self, owner: PlayerId) -> Self {
        self.owner = owner;
        self
    }

    /// Builder: set the tonnage.
    #[must_use]
    pub fn with_tonnage(mut self, tonnage: u32) -> Self {
        self.tonnage = tonnage;
        self
    }

    /// Builder: set the piloting skill.
    #[must_use]
    pub fn with_piloting(mut self, piloting: i32) -> Self {
        self.piloting = piloting;
        self
    }

    /// Builder: set the movement mode. Switching a vehicle to VTOL adds a rotor.
    #[must_use]
    pub fn with_movement(mut self, mode: MovementMode) -> Self {
        self.movement_mode = mode;
        if mode == MovementMode::Vtol && self.tag == EntityTag::Vehicle {
            self.locations
                .entry(Location::Rotor)
                .or_insert_with(LocationState::default);
        }
        self
    }

    /// Builder: give every location the same armor and structure.
    #[must_use]
    pub fn with_armor(mut self, armor: u32, structure: u32) -> Self {
        for (loc, state) in &mut self.locations {
            *state = LocationState::new(armor, structure);
            if loc.has_rear() {
                state.rear_armor = armor / 2;
            }
        }
        self
    }

    /// Returns the entity's unique identifier.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Returns the entity's type tag.
    #[must_use]
    pub const fn tag(&self) -> EntityTag {
        self.tag
    }

    /// Returns the inner component storage.
    #[must_use]
    pub const fn inner(&self) -> &EntityInner {
        &self.inner
    }

    /// Returns the inner component storage mutably.
    #[must_use]
    pub fn inner_mut(&mut self) -> &mut EntityInner {
        &mut self.inner
    }

    /// Board position, `None` while loaded in a carrier or off board.
    #[must_use]
    pub const fn position(&self) -> Option<Coords> {
        self.position
    }

    pub(crate) fn set_position_unindexed(&mut self, position: Option<Coords>) {
        self.position = position;
    }

    /// State of one location.
    #[must_use]
    pub fn location(&self, location: Location) -> Option<&LocationState> {
        self.locations.get(&location)
    }

    /// True if the location is missing or destroyed.
    #[must_use]
    pub fn is_location_destroyed(&self, location: Location) -> bool {
        self.locations.get(&location).map_or(true, |l| l.destroyed)
    }

    /// True for mechs.
    #[must_use]
    pub const fn is_mech(&self) -> bool {
        matches!(self.tag, EntityTag::Mech)
    }

    /// True for conventional infantry and battle armor.
    #[must_use]
    pub const fn is_infantry(&self) -> bool {
        matches!(self.tag, EntityTag::Infantry | EntityTag::BattleArmor)
    }

    /// Marked for destruction (or already destroyed).
    #[must_use]
    pub fn is_doomed(&self) -> bool {
        self.status
            .intersects(StatusFlags::DOOMED | StatusFlags::DESTROYED)
    }

    /// Not doomed, destroyed or removed.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        !self
            .status
            .intersects(StatusFlags::DOOMED | StatusFlags::DESTROYED | StatusFlags::REMOVED)
    }

    /// Alive and standing on the board.
    #[must_use]
    pub fn is_deployed(&self) -> bool {
        self.is_alive() && self.position.is_some()
    }

    /// Flying: an aerospace unit or VTOL above ground level.
    #[must_use]
    pub fn is_airborne(&self) -> bool {
        self.elevation > 0
            && (self.movement_mode == MovementMode::Vtol || self.movement_mode.is_aerospace())
    }

    /// Lying prone.
    #[must_use]
    pub fn is_prone(&self) -> bool {
        self.status.contains(StatusFlags::PRONE)
    }
}
