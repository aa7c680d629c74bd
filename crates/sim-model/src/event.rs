// SPDX-License-Identifier: Apache-2.0
//! Per-tick simulation events, consumed by the session boundary to build
//! per-client deltas.

use hex_geom::Hex;
use serde::{Deserialize, Serialize};
use worldgen::Resource;

use crate::ids::{CombatId, FleetId, NpcFleetId, PlayerId, ShipId};
use balance::{BuildingType, ResearchTech, ShipClass};

/// One simulation occurrence, tagged with the tick it was produced on
/// (§5: "Events are tagged with the tick in which they were produced").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Tick this event was produced on.
    pub tick: u64,
    /// The occurrence itself.
    pub kind: EventKind,
}

/// The tagged union of everything the simulation can emit in a tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum EventKind {
    /// A fleet arrived at a new sector.
    SectorEntered {
        /// Fleet that moved.
        fleet_id: FleetId,
        /// Sector arrived at.
        hex: Hex,
        /// True if no player has any explored-edge record touching this
        /// hex yet.
        first_visit: bool,
    },
    /// A fleet extracted resources this tick.
    ResourceHarvested {
        /// Fleet that harvested.
        fleet_id: FleetId,
        /// Resource harvested.
        resource: Resource,
        /// Amount added to cargo this tick.
        amount: u64,
    },
    /// One shot fired during a combat round.
    CombatRoundFired {
        /// Combat this shot belongs to.
        combat_id: CombatId,
        /// Ship that fired.
        attacker_ship: ShipId,
        /// Ship that was targeted.
        defender_ship: ShipId,
        /// Damage applied after shield absorption.
        damage: u32,
        /// True if this shot destroyed the target.
        destroyed: bool,
    },
    /// A ship reached zero hull.
    ShipDestroyed {
        /// The ship that was destroyed.
        ship_id: ShipId,
        /// Fleet it belonged to (player fleet or NPC fleet; NPC fleet ids
        /// and player fleet ids never collide since they are distinct
        /// newtypes, but this event only fires for player-fleet ships —
        /// NPC losses are inferred from the combat's compaction).
        fleet_id: FleetId,
    },
    /// A combat concluded this tick.
    CombatEnded {
        /// The combat that ended.
        combat_id: CombatId,
        /// Sector the combat occupied.
        hex: Hex,
        /// True if the player side had surviving ships.
        player_victory: bool,
    },
    /// A building upgrade committed.
    BuildingCompleted {
        /// Owning player.
        player_id: PlayerId,
        /// Building that completed.
        building: BuildingType,
        /// Level reached.
        new_level: u32,
    },
    /// One ship finished production.
    ShipCompleted {
        /// Owning player.
        player_id: PlayerId,
        /// Class that completed.
        class: ShipClass,
    },
    /// A research upgrade committed.
    ResearchCompleted {
        /// Owning player.
        player_id: PlayerId,
        /// Tech that completed.
        tech: ResearchTech,
        /// Level reached.
        new_level: u32,
    },
    /// A fleet collected salvage at its sector.
    SalvageCollected {
        /// Fleet that collected.
        fleet_id: FleetId,
        /// Metal collected.
        metal: u64,
        /// Crystal collected.
        crystal: u64,
        /// Deuterium collected.
        deut: u64,
    },
    /// An NPC fleet was destroyed in combat (tracked separately from
    /// player `ShipDestroyed` since NPC fleets have no stable per-ship
    /// wire identity worth exposing).
    NpcFleetDestroyed {
        /// The NPC fleet that was destroyed.
        npc_fleet_id: NpcFleetId,
    },
}
