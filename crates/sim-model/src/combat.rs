// SPDX-License-Identifier: Apache-2.0
//! Sector-local engagements between player and NPC fleets.

use hex_geom::Hex;
use serde::{Deserialize, Serialize};
use worldgen::NpcShipClass;

use crate::ids::{CombatId, FleetId, NpcFleetId};

/// An active (or just-concluded, pending removal) combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Combat {
    /// Stable identity.
    pub id: CombatId,
    /// Sector this combat is taking place in.
    pub sector: Hex,
    /// Participating player fleets, in insertion (enrollment) order — the
    /// combat resolver's traversal order depends on this.
    pub player_fleets: Vec<FleetId>,
    /// Participating NPC fleets, in insertion order.
    pub npc_fleets: Vec<NpcFleetId>,
    /// Accumulated build-cost value of every NPC that has ever joined this
    /// combat, used for salvage sizing on victory.
    pub npc_value: balance::Resources,
    /// Snapshot of NPC ship class/count at the moment each NPC joined,
    /// used for loot-table weighting even after losses compact the live
    /// arrays.
    pub npc_snapshot: Vec<(NpcShipClass, u32)>,
    /// Number of resolver rounds completed so far.
    pub round: u32,
}

impl Combat {
    /// Records an NPC's class/count and adds its value to the running
    /// total when it joins (or re-joins) this combat.
    pub fn record_npc_value(&mut self, class: NpcShipClass, count: u32, value: balance::Resources) {
        self.npc_snapshot.push((class, count));
        self.npc_value = self.npc_value.add(value);
    }
}
