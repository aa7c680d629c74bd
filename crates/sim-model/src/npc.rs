// SPDX-License-Identifier: Apache-2.0
//! NPC fleets, spawned on first hostile contact in a sector or from a
//! template.

use hex_geom::Hex;
use serde::{Deserialize, Serialize};
use worldgen::{NpcBehavior, NpcShipClass};

use crate::ids::NpcFleetId;
use crate::ship::Ship;

/// A spawned NPC fleet. Destroyed on defeat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NpcFleet {
    /// Stable identity.
    pub id: NpcFleetId,
    /// Current location.
    pub location: Hex,
    /// Ships in this fleet; same live/garbage split convention as
    /// [`crate::Fleet`].
    pub ships: Vec<Ship>,
    /// Number of live ships at the front of `ships`.
    pub ship_count: usize,
    /// Hull class inherited from the template this fleet spawned from,
    /// kept alongside the ships' own [`balance::ShipClass`] so combat loot
    /// weighting can key off the original template class.
    pub class: NpcShipClass,
    /// Behavior inherited from the template this fleet spawned from.
    pub behavior: NpcBehavior,
    /// Sector this NPC originally spawned in; patrol wandering is
    /// unbounded but respawn bookkeeping keys off this.
    pub home_sector: Hex,
    /// Ticks remaining before this NPC may patrol-move again.
    pub patrol_cooldown: u32,
    /// True while enrolled in an active combat.
    pub in_combat: bool,
}

impl NpcFleet {
    /// Live ships, ignoring compaction garbage beyond `ship_count`.
    #[must_use]
    pub fn live_ships(&self) -> &[Ship] {
        &self.ships[..self.ship_count.min(self.ships.len())]
    }

    /// Mutable live ships.
    pub fn live_ships_mut(&mut self) -> &mut [Ship] {
        let n = self.ship_count.min(self.ships.len());
        &mut self.ships[..n]
    }

    /// True if this NPC fleet has at least one live ship.
    #[must_use]
    pub fn has_ships(&self) -> bool {
        self.ship_count > 0
    }

    /// Packs live ships to the front, updating `ship_count`.
    pub fn compact_ships(&mut self) {
        let n = self.ship_count.min(self.ships.len());
        self.ships.truncate(n);
        self.ships.retain(|s| !s.is_destroyed());
        self.ship_count = self.ships.len();
    }

    /// Total build-cost-equivalent value of this NPC's current ships, used
    /// for salvage sizing and combat-value accumulation.
    #[must_use]
    pub fn total_value(&self) -> balance::Resources {
        self.live_ships().iter().fold(balance::Resources::default(), |acc, ship| {
            acc.add(balance::ship_unit_cost(ship.class))
        })
    }
}
