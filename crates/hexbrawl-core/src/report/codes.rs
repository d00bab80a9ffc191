//! Report template ids and the message catalog.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// Attack flow
/// Physical attacks header for a new attacker
pub const ATTACK_HEADER: u16 = 4005;
/// Attack line: attack name and target
pub const ATTACK: u16 = 4010;
/// Attack impossible
pub const ATTACK_IMPOSSIBLE: u16 = 4015;
/// Attack automatically succeeds
pub const ATTACK_AUTOMATIC: u16 = 4020;
/// Needed and rolled values
pub const ATTACK_ROLL: u16 = 4025;
/// Attack misses
pub const ATTACK_MISS: u16 = 4035;
/// Attack hits
pub const ATTACK_HIT: u16 = 4040;
/// Hit location
pub const HIT_LOCATION: u16 = 4045;
/// Damage applied to a location
pub const DAMAGE: u16 = 6065;

// Blow rules
/// Glancing blow
pub const GLANCING_BLOW: u16 = 3186;
/// Direct blow
pub const DIRECT_BLOW: u16 = 3189;

// Attack effects
/// Missed attack strikes the building instead
pub const MISS_STRIKES_BUILDING: u16 = 4050;
/// Unit displaced into a hex
pub const DISPLACED: u16 = 4055;
/// Mutual push cancels out
pub const MUTUAL_PUSH: u16 = 4060;
/// Grapple established
pub const GRAPPLED: u16 = 4065;
/// Grapple broken
pub const GRAPPLE_BROKEN: u16 = 4070;
/// Swarming unit brushed off
pub const BRUSHED_OFF: u16 = 4075;
/// Attacker damaged by its own attack
pub const SELF_DAMAGE: u16 = 4080;
/// Target entangled by a chain whip
pub const ENTANGLED: u16 = 4085;
/// Explosives laid in a building
pub const EXPLOSIVES_SET: u16 = 4465;
/// Searchlight illuminates a target
pub const SEARCHLIGHT: u16 = 3545;

// Piloting and falls
/// Piloting roll needed and rolled
pub const PSR_ROLL: u16 = 2180;
/// Piloting roll failed; unit falls
pub const PSR_FALL: u16 = 2185;
/// Piloting roll passed
pub const PSR_PASS: u16 = 2190;
/// Damage from a fall
pub const FALL_DAMAGE: u16 = 2200;

// Damage effects
/// Internal structure damaged
pub const STRUCTURE_DAMAGE: u16 = 6070;
/// Location destroyed
pub const LOCATION_DESTROYED: u16 = 6115;
/// Through-armor critical chance
pub const THROUGH_ARMOR_CRITICAL: u16 = 6010;
/// Critical hit applied
pub const CRITICAL_HIT: u16 = 6225;
/// Rotor destroyed
pub const ROTOR_DESTROYED: u16 = 6240;
/// Rotorcraft crashes
pub const CRASH: u16 = 6245;

// Destruction cascade
/// Unit destroyed
pub const DESTROYED: u16 = 6365;
/// Picked-up crew killed
pub const CREW_KILLED: u16 = 6370;
/// Controlled unit loses its controller
pub const CONTROL_LOST: u16 = 6375;
/// Passenger killed with the carrier
pub const PASSENGER_KILLED: u16 = 6380;
/// Passenger failed its escape roll
pub const ESCAPE_FAILED: u16 = 6385;
/// Passenger had nowhere to go
pub const ESCAPE_NO_ROOM: u16 = 6390;
/// Passenger escaped
pub const ESCAPED: u16 = 6395;
/// Destroyed unit unloaded from its carrier
pub const UNLOADED: u16 = 6400;
/// Fighter squadron has no members left
pub const SQUADRON_EMPTY: u16 = 6405;
/// Tow link severed
pub const TOW_SEVERED: u16 = 6410;
/// Grapple partner released
pub const GRAPPLE_RELEASED: u16 = 6415;
/// Swarm released
pub const SWARM_RELEASED: u16 = 6420;
/// Wreckage roughens the hex
pub const WRECKAGE: u16 = 6430;

// Buildings
/// Building absorbs part of the damage
pub const BUILDING_ABSORBS: u16 = 6425;
/// Building takes damage
pub const BUILDING_DAMAGE: u16 = 3435;
/// Building hex collapses
pub const BUILDING_COLLAPSE: u16 = 3440;
/// Fuel tank explodes
pub const FUEL_EXPLOSION: u16 = 3445;

// Kill credit
/// Attacker credited with a kill
pub const KILL_CREDIT: u16 = 6950;

/// Placeholder substituted by report parameters, in order.
pub const PLACEHOLDER: &str = "<data>";

/// Message templates by report id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportCatalog {
    templates: BTreeMap<u16, String>,
}

impl ReportCatalog {
    /// An empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The English templates for every report the engine emits.
    #[must_use]
    pub fn standard() -> Self {
        let entries: &[(u16, &str)] = &[
            (ATTACK_HEADER, "Physical attacks for <data>..."),
            (ATTACK, "<data> at <data>;"),
            (ATTACK_IMPOSSIBLE, "but the attack is impossible (<data>)."),
            (ATTACK_AUTOMATIC, "the attack automatically succeeds (<data>)"),
            (ATTACK_ROLL, "needs <data>, rolls <data> :"),
            (ATTACK_MISS, "misses."),
            (ATTACK_HIT, "hits."),
            (HIT_LOCATION, "<data> is struck in the <data>."),
            (DAMAGE, "<data> takes <data> damage to <data>."),
            (GLANCING_BLOW, "Glancing blow: damage halved to <data>."),
            (DIRECT_BLOW, "Direct blow: <data> extra damage."),
            (MISS_STRIKES_BUILDING, "The missed attack strikes <data> for <data> damage."),
            (DISPLACED, "<data> is displaced into hex <data>."),
            (MUTUAL_PUSH, "<data> and <data> push each other; neither moves."),
            (GRAPPLED, "<data> grapples <data>."),
            (GRAPPLE_BROKEN, "<data> breaks the grapple with <data>."),
            (BRUSHED_OFF, "<data> is brushed off <data>."),
            (SELF_DAMAGE, "<data> takes <data> damage from its own attack."),
            (ENTANGLED, "<data> is entangled by a chain whip."),
            (EXPLOSIVES_SET, "<data> sets explosives in <data> (total <data>)."),
            (SEARCHLIGHT, "<data> illuminates <data>."),
            (PSR_ROLL, "<data> must make a piloting roll (<data>), needs <data>, rolls <data> :"),
            (PSR_FALL, "<data> falls."),
            (PSR_PASS, "succeeds."),
            (FALL_DAMAGE, "<data> takes <data> damage from the fall."),
            (STRUCTURE_DAMAGE, "<data> structure reduced to <data>."),
            (LOCATION_DESTROYED, "<data> is destroyed."),
            (THROUGH_ARMOR_CRITICAL, "Possible critical hit through armor!"),
            (CRITICAL_HIT, "<data> suffers a critical hit: <data>."),
            (ROTOR_DESTROYED, "<data>'s rotor is destroyed."),
            (CRASH, "<data> crashes to the ground."),
            (DESTROYED, "*** <data> DESTROYED by <data>! ***"),
            (CREW_KILLED, "<data> is killed along with its rescuer."),
            (CONTROL_LOST, "<data> loses its controller."),
            (PASSENGER_KILLED, "<data> is killed inside the wreck."),
            (ESCAPE_FAILED, "<data> fails to escape (needs <data>, rolls <data>) and is destroyed."),
            (ESCAPE_NO_ROOM, "<data> has nowhere to go and is destroyed."),
            (ESCAPED, "<data> escapes (needs <data>, rolls <data>)."),
            (UNLOADED, "<data> is unloaded from <data>."),
            (SQUADRON_EMPTY, "<data> has no fighters left."),
            (TOW_SEVERED, "Tow link between <data> and <data> is severed."),
            (GRAPPLE_RELEASED, "<data> is released from the grapple."),
            (SWARM_RELEASED, "<data> is no longer swarming <data>."),
            (WRECKAGE, "Wreckage roughens hex <data>."),
            (BUILDING_ABSORBS, "<data> absorbs <data> damage."),
            (BUILDING_DAMAGE, "<data> takes <data> damage in hex <data> (CF <data>)."),
            (BUILDING_COLLAPSE, "<data> collapses in hex <data>!"),
            (FUEL_EXPLOSION, "<data> explodes for <data> damage!"),
            (KILL_CREDIT, "<data> is credited with the kill of <data>."),
        ];
        Self {
            templates: entries
                .iter()
                .map(|&(id, text)| (id, text.to_owned()))
                .collect(),
        }
    }

    /// Template for a report id.
    #[must_use]
    pub fn get(&self, id: u16) -> Option<&str> {
        self.templates.get(&id).map(String::as_str)
    }

    /// Adds or replaces a template.
    pub fn insert(&mut self, id: u16, template: impl Into<String>) {
        self.templates.insert(id, template.into());
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// True if the catalog has no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}
