// SPDX-License-Identifier: Apache-2.0
//! Checkpoint flush: walks the world's dirty sets and upserts exactly the
//! rows that changed since the last flush, inside one transaction, then
//! clears the dirty sets on success.
//!
//! `World` does not retain a per-edge discovery tick (`record_explored_edge`
//! only tracks *that* an edge was discovered, not *when*, beyond the dirty
//! marker) — this flush stamps every newly dirty edge with the world's
//! current tick, so discovery-tick granularity is "this flush cycle", not
//! tick-exact. Documented in `DESIGN.md`.

use sim_model::World;
use sim_store::{CheckpointStore, StoreError};

/// Flushes every dirty record in `world` to `store` inside one transaction,
/// then clears the world's dirty sets. A failed flush rolls the transaction
/// back and leaves the dirty sets untouched, so the next attempt retries the
/// same rows.
pub fn flush(world: &mut World, store: &mut dyn CheckpointStore) -> Result<(), StoreError> {
    store.begin_immediate()?;

    if let Err(err) = flush_inner(world, store) {
        let _ = store.rollback();
        return Err(err);
    }

    store.commit()?;
    world.clear_dirty();
    Ok(())
}

fn flush_inner(world: &World, store: &mut dyn CheckpointStore) -> Result<(), StoreError> {
    store.upsert_server_state(world.current_tick, world.next_id, world.world_seed)?;

    for player_id in world.dirty_players.iter() {
        let Some(player) = world.players.get(player_id) else {
            continue;
        };
        store.upsert_player(player)?;
        store.upsert_buildings(player)?;
        store.upsert_research(player)?;
        store.upsert_ship_queue(player)?;
        store.upsert_docked_ships(player)?;
    }

    for fleet_id in world.dirty_fleets.iter() {
        let Some(fleet) = world.fleets.get(fleet_id) else {
            continue;
        };
        store.upsert_fleet(fleet)?;
        store.upsert_fleet_ships(fleet)?;
    }

    for hex in world.dirty_sectors.iter() {
        let Some(overlay) = world.sectors.get(hex) else {
            continue;
        };
        store.upsert_sector(*hex, overlay)?;
    }

    for (player, a, b) in world.dirty_explored_edges.iter() {
        store.upsert_explored_edge(*player, *a, *b, world.current_tick)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_store::SqliteStore;

    #[test]
    fn flush_persists_a_freshly_registered_player_and_clears_dirty_sets() {
        let mut world = World::new(1);
        let id = sim_engine::register(&mut world, "admiral", "digest".to_owned()).expect("register");
        assert!(world.dirty_players.contains(&id));

        let mut store = SqliteStore::open_in_memory().expect("open");
        store.bootstrap_schema().expect("bootstrap");
        flush(&mut world, &mut store).expect("flush");

        assert!(world.dirty_players.is_empty());
        let loaded = store.load_all().expect("load");
        assert_eq!(loaded.players.len(), 1);
        assert_eq!(loaded.players[0].name, "admiral");
    }
}
