// SPDX-License-Identifier: Apache-2.0
//! The authoritative in-memory world: every live entity, dirty-tracking
//! bookkeeping, and the per-tick pending event buffer.

use std::collections::{HashMap, HashSet};

use hex_geom::Hex;

use crate::combat::Combat;
use crate::dirty::{DirtyMut, DirtySet};
use crate::event::{Event, EventKind};
use crate::fleet::Fleet;
use crate::ids::{CombatId, FleetId, NpcFleetId, PlayerId, ShipId};
use crate::npc::NpcFleet;
use crate::player::Player;
use crate::sector::SectorOverride;

/// Owns every entity in the simulation. Sessions and the checkpoint store
/// only ever observe `World` through projections or load/flush snapshots;
/// nothing outside `sim-engine` mutates it directly.
#[derive(Debug, Default)]
pub struct World {
    /// All players, keyed by id.
    pub players: HashMap<PlayerId, Player>,
    /// All player fleets, keyed by id.
    pub fleets: HashMap<FleetId, Fleet>,
    /// All spawned NPC fleets, keyed by id.
    pub npc_fleets: HashMap<NpcFleetId, NpcFleet>,
    /// All active combats, keyed by id.
    pub combats: HashMap<CombatId, Combat>,
    /// Per-sector mutable overlays, keyed by hex.
    pub sectors: HashMap<Hex, SectorOverride>,
    /// Per-player discovered edges, canonicalized smaller-packed-key-first
    /// so `(a, b)` and `(b, a)` collide.
    pub explored_edges: HashSet<(PlayerId, Hex, Hex)>,
    /// The current tick number.
    pub current_tick: u64,
    /// Single monotonic counter shared by every id family.
    pub next_id: u64,
    /// The generation seed driving `worldgen`.
    pub world_seed: u64,
    /// Events produced so far this tick; cleared at the top of each tick.
    pub pending_events: Vec<Event>,

    /// Players whose persisted fields changed since the last flush.
    pub dirty_players: DirtySet<PlayerId>,
    /// Fleets whose persisted fields changed since the last flush.
    pub dirty_fleets: DirtySet<FleetId>,
    /// Sectors whose persisted fields changed since the last flush.
    pub dirty_sectors: DirtySet<Hex>,
    /// `(player, edge)` pairs newly discovered since the last flush.
    pub dirty_explored_edges: DirtySet<(PlayerId, Hex, Hex)>,
}

impl World {
    /// Constructs an empty world seeded for procedural generation.
    #[must_use]
    pub fn new(world_seed: u64) -> Self {
        Self {
            world_seed,
            ..Self::default()
        }
    }

    /// Allocates and returns the next id value, shared across all
    /// entity-id families.
    pub fn alloc_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// A dirtying handle to `id`'s player, or `None` if absent.
    pub fn dirty_player(&mut self, id: PlayerId) -> Option<DirtyMut<'_, PlayerId, Player>> {
        let Self {
            players,
            dirty_players,
            ..
        } = self;
        players
            .get_mut(&id)
            .map(|value| DirtyMut::new(id, value, dirty_players))
    }

    /// A dirtying handle to `id`'s fleet, or `None` if absent.
    pub fn dirty_fleet(&mut self, id: FleetId) -> Option<DirtyMut<'_, FleetId, Fleet>> {
        let Self {
            fleets,
            dirty_fleets,
            ..
        } = self;
        fleets
            .get_mut(&id)
            .map(|value| DirtyMut::new(id, value, dirty_fleets))
    }

    /// A dirtying handle to `hex`'s sector override, creating it lazily if
    /// absent (per §3: "created lazily when any modification occurs").
    pub fn dirty_sector(&mut self, hex: Hex) -> DirtyMut<'_, Hex, SectorOverride> {
        let Self {
            sectors,
            dirty_sectors,
            ..
        } = self;
        let value = sectors.entry(hex).or_default();
        DirtyMut::new(hex, value, dirty_sectors)
    }

    /// Records that `player` has discovered the edge between `a` and `b`,
    /// canonicalizing the pair so lookups are order-independent.
    pub fn record_explored_edge(&mut self, player: PlayerId, a: Hex, b: Hex) {
        let (lo, hi) = Hex::canonical_pair(a, b);
        let key = (player, lo, hi);
        if self.explored_edges.insert(key) {
            self.dirty_explored_edges.insert(key);
        }
    }

    /// True if `player` has no explored-edge record with `hex` as an
    /// endpoint — the spec's definition of "first visit" (§9, open
    /// question: explored-edge presence only, no parallel visited set).
    #[must_use]
    pub fn is_first_visit(&self, player: PlayerId, hex: Hex) -> bool {
        !self
            .explored_edges
            .iter()
            .any(|(p, a, b)| *p == player && (*a == hex || *b == hex))
    }

    /// Appends an event to the current tick's pending buffer.
    pub fn emit(&mut self, kind: EventKind) {
        let tick = self.current_tick;
        self.pending_events.push(Event { tick, kind });
    }

    /// Clears the pending event buffer, returning what had accumulated.
    /// Called once at the very start of each tick per §4.4.
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.pending_events)
    }

    /// Clears every dirty set, called only after a successful checkpoint
    /// flush.
    pub fn clear_dirty(&mut self) {
        self.dirty_players.clear();
        self.dirty_fleets.clear();
        self.dirty_sectors.clear();
        self.dirty_explored_edges.clear();
    }

    /// Allocates a fresh [`ShipId`] sharing the world's id counter.
    pub fn alloc_ship_id(&mut self) -> ShipId {
        ShipId(self.alloc_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_visit_is_true_until_an_edge_touches_the_hex() {
        let mut world = World::new(1);
        let player = PlayerId(1);
        let hex = Hex::new(3, 3);
        assert!(world.is_first_visit(player, hex));
        world.record_explored_edge(player, hex, Hex::new(4, 3));
        assert!(!world.is_first_visit(player, hex));
    }

    #[test]
    fn dirty_sector_creates_lazily() {
        let mut world = World::new(1);
        let hex = Hex::new(1, 1);
        assert!(!world.sectors.contains_key(&hex));
        {
            let mut guard = world.dirty_sector(hex);
            guard.harvest_accum[0] = 5;
        }
        assert!(world.dirty_sectors.contains(&hex));
        assert_eq!(world.sectors[&hex].harvest_accum[0], 5);
    }
}
