// SPDX-License-Identifier: Apache-2.0
//! Player-owned fleets: movable groups of ships with cargo and fuel.

use balance::Resources;
use hex_geom::Hex;
use serde::{Deserialize, Serialize};

use crate::ids::{FleetId, PlayerId};
use crate::ship::Ship;
use worldgen::Resource;

/// Fleet status. Transitions are owned exclusively by the tick dispatcher
/// and command handlers (§4.4); every other component treats this as
/// read-only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FleetStatus {
    /// Not doing anything; eligible for any command.
    Idle,
    /// Under way toward `move_target`.
    Moving,
    /// Extracting resources at the current sector.
    Harvesting,
    /// Enrolled in an active combat.
    InCombat,
    /// Recalled, en route to the homeworld (teleport is immediate in this
    /// spec, so this state is transient within the same tick as the
    /// command).
    Returning,
    /// Docked at the homeworld, ships folded into the player's pool.
    Docked,
}

/// A player-owned fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Fleet {
    /// Stable identity.
    pub id: FleetId,
    /// Owning player.
    pub owner: PlayerId,
    /// Current location.
    pub location: Hex,
    /// Current status.
    pub status: FleetStatus,
    /// Ships in this fleet. Only the first `ship_count` entries are live;
    /// the rest are garbage left by compaction and must never be read.
    pub ships: Vec<Ship>,
    /// Number of live ships at the front of `ships`.
    pub ship_count: usize,
    /// Cargo currently held, never exceeding [`Fleet::cargo_capacity`].
    pub cargo: Resources,
    /// Current fuel.
    pub fuel: u32,
    /// Maximum fuel, recomputed whenever ship composition or the owner's
    /// fuel-depot level changes.
    pub fuel_max: u32,
    /// Ticks remaining before an in-progress move completes.
    pub move_cooldown: u32,
    /// Ticks remaining before another command may be issued.
    pub action_cooldown: u32,
    /// Destination of an in-progress move.
    pub move_target: Option<Hex>,
    /// Consecutive idle ticks, used to trigger shield regen.
    pub idle_ticks: u32,
}

impl Fleet {
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

    /// True if this fleet has at least one live ship.
    #[must_use]
    pub fn has_ships(&self) -> bool {
        self.ship_count > 0
    }

    /// Total cargo capacity across live ships.
    #[must_use]
    pub fn cargo_capacity(&self) -> u64 {
        self.live_ships()
            .iter()
            .map(|s| u64::from(balance::ship_stats(s.class).cargo_capacity))
            .sum()
    }

    /// Remaining cargo room for one resource, treating the capacity as a
    /// single shared pool across all three resources (the sum of cargo
    /// components never exceeds capacity, per the data-model invariant).
    #[must_use]
    pub fn remaining_cargo_room(&self) -> u64 {
        let used = self.cargo.metal + self.cargo.crystal + self.cargo.deut;
        self.cargo_capacity().saturating_sub(used)
    }

    /// Adds as much of `amount` of `resource` as remaining cargo room
    /// allows, returning the amount actually added.
    pub fn add_cargo_capped(&mut self, resource: Resource, amount: u64) -> u64 {
        let room = self.remaining_cargo_room();
        let added = amount.min(room);
        match resource {
            Resource::Metal => self.cargo.metal += added,
            Resource::Crystal => self.cargo.crystal += added,
            Resource::Deut => self.cargo.deut += added,
        }
        added
    }

    /// Packs live ships to the front of `ships`, updating `ship_count`.
    /// Preserves relative order (insertion order of surviving ships),
    /// which the combat resolver's tie-break rule depends on.
    pub fn compact_ships(&mut self) {
        let n = self.ship_count.min(self.ships.len());
        self.ships.truncate(n);
        self.ships.retain(|s| !s.is_destroyed());
        self.ship_count = self.ships.len();
    }
}
