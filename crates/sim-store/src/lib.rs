// SPDX-License-Identifier: Apache-2.0
//! Checkpoint persistence for the simulation: a backend-agnostic port
//! ([`CheckpointStore`]) and a `rusqlite`-backed adapter ([`SqliteStore`]).
//!
//! Fixed-point (×1000) conversion between the world model's integer fields
//! and any future float-bearing wire representation happens only inside
//! `sqlite`'s row (de)serialization — this crate otherwise stores the same
//! integers [`sim_model`] uses.

mod port;
mod sqlite;

pub use port::{CheckpointStore, LoadedState, StoreError};
pub use sqlite::SqliteStore;

#[cfg(test)]
mod tests {
    use super::*;
    use balance::{BuildingType, ResearchTech, Resources, ShipClass};
    use hex_geom::Hex;
    use sim_model::{BuildQueue, Fleet, FleetId, FleetStatus, Player, PlayerId, Ship, ShipId};
    use std::collections::HashMap;

    fn sample_player(id: u64) -> Player {
        let mut buildings = HashMap::new();
        buildings.insert(BuildingType::MetalMine, 3);
        let mut research = HashMap::new();
        research.insert(ResearchTech::HullTech, 1);
        Player {
            id: PlayerId(id),
            name: format!("captain-{id}"),
            resources: Resources::new(1000, 500, 250),
            fragments: 4,
            homeworld: Hex { q: 2, r: -1 },
            buildings,
            research,
            building_queue: Some(BuildQueue {
                building: BuildingType::Shipyard,
                target_level: 1,
                start_tick: 10,
                end_tick: 40,
            }),
            research_queue: None,
            ship_queue: None,
            auth_digest: Some("digest".to_string()),
            created_at: 5,
            last_login_at: 12,
            docked_ships: vec![Ship::new_for_class(ShipId(1), ShipClass::Scout, 0, 0, 0)],
            components: HashMap::new(),
        }
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        store.bootstrap_schema().expect("first bootstrap");
        store.bootstrap_schema().expect("second bootstrap");
    }

    #[test]
    fn player_round_trips_through_upsert_and_load() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        store.bootstrap_schema().expect("bootstrap");
        let player = sample_player(7);

        store.begin_immediate().expect("begin");
        store.upsert_player(&player).expect("upsert player");
        store.upsert_buildings(&player).expect("upsert buildings");
        store.upsert_research(&player).expect("upsert research");
        store.upsert_ship_queue(&player).expect("upsert ship queue");
        store.upsert_docked_ships(&player).expect("upsert docked");
        store
            .upsert_server_state(3, 100, 0xCAFE)
            .expect("upsert server state");
        store.commit().expect("commit");

        let loaded = store.load_all().expect("load");
        assert_eq!(loaded.current_tick, 3);
        assert_eq!(loaded.next_id, 100);
        assert_eq!(loaded.world_seed, 0xCAFE);
        assert_eq!(loaded.players.len(), 1);

        let back = &loaded.players[0];
        assert_eq!(back.id, player.id);
        assert_eq!(back.name, player.name);
        assert_eq!(back.resources, player.resources);
        assert_eq!(back.building_level(BuildingType::MetalMine), 3);
        assert_eq!(back.research_level(ResearchTech::HullTech), 1);
        assert_eq!(back.building_queue, player.building_queue);
        assert_eq!(back.docked_ships.len(), 1);
    }

    #[test]
    fn fleet_round_trips_with_its_ships() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        store.bootstrap_schema().expect("bootstrap");

        let ship = Ship::new_for_class(ShipId(9), ShipClass::Corvette, 0, 0, 0);
        let fleet = Fleet {
            id: FleetId(1),
            owner: PlayerId(7),
            location: Hex { q: 5, r: 5 },
            status: FleetStatus::Moving,
            ships: vec![ship],
            ship_count: 1,
            cargo: Resources::new(10, 20, 30),
            fuel: 80,
            fuel_max: 100,
            move_cooldown: 2,
            action_cooldown: 0,
            move_target: Some(Hex { q: 6, r: 5 }),
            idle_ticks: 0,
        };

        store.upsert_fleet(&fleet).expect("upsert fleet");
        store.upsert_fleet_ships(&fleet).expect("upsert ships");

        let loaded = store.load_all().expect("load");
        assert_eq!(loaded.fleets.len(), 1);
        let back = &loaded.fleets[0];
        assert_eq!(back.id, fleet.id);
        assert_eq!(back.status, FleetStatus::Moving);
        assert_eq!(back.move_target, fleet.move_target);
        assert_eq!(back.live_ships().len(), 1);
        assert_eq!(back.live_ships()[0].class, ShipClass::Corvette);
    }

    #[test]
    fn explored_edge_upsert_is_order_independent() {
        let mut store = SqliteStore::open_in_memory().expect("open");
        store.bootstrap_schema().expect("bootstrap");
        let player = PlayerId(1);
        let a = Hex { q: 0, r: 0 };
        let b = Hex { q: 1, r: 0 };

        store
            .upsert_explored_edge(player, a, b, 5)
            .expect("first insert");
        store
            .upsert_explored_edge(player, b, a, 9)
            .expect("reversed upsert updates the same row");

        let loaded = store.load_all().expect("load");
        assert_eq!(loaded.explored_edges.len(), 1);
    }
}
