// SPDX-License-Identifier: Apache-2.0
//! `rusqlite`-backed [`CheckpointStore`] implementation. Adopted from this
//! example pack (not the direct teacher, which has no relational-store
//! crate of its own — see `DESIGN.md`) with the `bundled` feature so the
//! binary needs no system `sqlite3`.
//!
//! SQLite integers are signed 64-bit; every id/tick/resource count here
//! fits in an `i64` in practice, so storage narrows with `as` at the
//! boundary rather than carrying `u64` through `rusqlite`, which has no
//! `ToSql`/`FromSql` impl for it.
#![allow(clippy::cast_possible_wrap)]

use std::collections::HashMap;
use std::path::Path;

use balance::{BuildingType, ResearchTech};
use hex_geom::Hex;
use rusqlite::{params, Connection, OptionalExtension};
use sim_model::{
    BuildQueue, Fleet, FleetStatus, Player, PlayerId, ResearchQueue, SectorOverride, Ship, ShipId,
    ShipQueue,
};

use crate::port::{CheckpointStore, LoadedState, StoreError};

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

/// A checkpoint store backed by a single local SQLite file.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (creating if absent) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Ok(Self { conn })
    }

    /// Opens a private in-memory database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self { conn })
    }
}

/// Serializes an enum (or any `Serialize` value) into the small JSON-text
/// form used for every enum-valued column in this schema, so one column
/// type works for `BuildingType`, `ResearchTech`, `ShipClass` and
/// `FleetStatus` alike without a bespoke `FromStr`/`Display` per type.
fn enum_to_text<T: serde::Serialize>(value: &T) -> Result<String, StoreError> {
    serde_json::to_string(value).map_err(|e| StoreError::CorruptRow {
        table: "enum",
        detail: e.to_string(),
    })
}

fn enum_from_text<T: serde::de::DeserializeOwned>(
    text: &str,
    table: &'static str,
) -> Result<T, StoreError> {
    serde_json::from_str(text).map_err(|e| StoreError::CorruptRow {
        table,
        detail: e.to_string(),
    })
}

/// Narrows a `u64` domain value to the `i64` SQLite actually stores.
const fn w(v: u64) -> i64 {
    v as i64
}

/// Widens a stored `i64` back to the `u64` domain type.
const fn uw(v: i64) -> u64 {
    v as u64
}

impl CheckpointStore for SqliteStore {
    fn bootstrap_schema(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS server_state (key TEXT PRIMARY KEY, value TEXT NOT NULL);
            CREATE TABLE IF NOT EXISTS players (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL UNIQUE,
                homeworld_q INTEGER NOT NULL,
                homeworld_r INTEGER NOT NULL,
                metal INTEGER NOT NULL,
                crystal INTEGER NOT NULL,
                deuterium INTEGER NOT NULL,
                fragments INTEGER NOT NULL,
                components_json TEXT NOT NULL,
                token_hash TEXT,
                created_at INTEGER NOT NULL,
                last_login_at INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS buildings (
                player_id INTEGER NOT NULL,
                building_type TEXT NOT NULL,
                level INTEGER NOT NULL,
                build_start_tick INTEGER,
                build_end_tick INTEGER,
                PRIMARY KEY (player_id, building_type)
            );
            CREATE TABLE IF NOT EXISTS research (
                player_id INTEGER NOT NULL,
                tech TEXT NOT NULL,
                level INTEGER NOT NULL,
                research_start_tick INTEGER,
                research_end_tick INTEGER,
                PRIMARY KEY (player_id, tech)
            );
            CREATE TABLE IF NOT EXISTS ship_queue (
                player_id INTEGER PRIMARY KEY,
                class TEXT NOT NULL,
                requested_count INTEGER NOT NULL,
                built INTEGER NOT NULL,
                start_tick INTEGER NOT NULL,
                end_tick INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS fleets (
                id INTEGER PRIMARY KEY,
                player_id INTEGER NOT NULL,
                q INTEGER NOT NULL,
                r INTEGER NOT NULL,
                state TEXT NOT NULL,
                fuel INTEGER NOT NULL,
                fuel_max INTEGER NOT NULL,
                cargo_metal INTEGER NOT NULL,
                cargo_crystal INTEGER NOT NULL,
                cargo_deuterium INTEGER NOT NULL,
                move_target_q INTEGER,
                move_target_r INTEGER,
                move_cooldown INTEGER NOT NULL,
                action_cooldown INTEGER NOT NULL,
                idle_ticks INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS ships (
                id INTEGER PRIMARY KEY,
                fleet_id INTEGER,
                player_id INTEGER NOT NULL,
                class TEXT NOT NULL,
                hull INTEGER NOT NULL,
                hull_max INTEGER NOT NULL,
                shield INTEGER NOT NULL,
                shield_max INTEGER NOT NULL,
                weapon_power INTEGER NOT NULL,
                speed INTEGER NOT NULL
            );
            CREATE TABLE IF NOT EXISTS sectors_modified (
                q INTEGER NOT NULL,
                r INTEGER NOT NULL,
                metal_density TEXT,
                crystal_density TEXT,
                deut_density TEXT,
                metal_harvested INTEGER NOT NULL,
                crystal_harvested INTEGER NOT NULL,
                deut_harvested INTEGER NOT NULL,
                npc_cleared_tick INTEGER,
                salvage_json TEXT,
                PRIMARY KEY (q, r)
            );
            CREATE TABLE IF NOT EXISTS explored_edges (
                player_id INTEGER NOT NULL,
                q1 INTEGER NOT NULL,
                r1 INTEGER NOT NULL,
                q2 INTEGER NOT NULL,
                r2 INTEGER NOT NULL,
                discovered_tick INTEGER NOT NULL,
                PRIMARY KEY (player_id, q1, r1, q2, r2)
            );
            CREATE INDEX IF NOT EXISTS idx_fleets_player ON fleets(player_id);
            CREATE INDEX IF NOT EXISTS idx_fleets_coord ON fleets(q, r);
            CREATE INDEX IF NOT EXISTS idx_ships_fleet ON ships(fleet_id);
            CREATE INDEX IF NOT EXISTS idx_explored_edges_player ON explored_edges(player_id);
            ",
        )?;
        Ok(())
    }

    fn begin_immediate(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("ROLLBACK")?;
        Ok(())
    }

    fn upsert_server_state(
        &mut self,
        current_tick: u64,
        next_id: u64,
        world_seed: u64,
    ) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for (key, value) in [
            ("current_tick", current_tick),
            ("next_id", next_id),
            ("world_seed", world_seed),
        ] {
            tx.execute(
                "INSERT INTO server_state(key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value",
                params![key, value.to_string()],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_player(&mut self, player: &Player) -> Result<(), StoreError> {
        let components = serde_json::to_string(&player.components).map_err(|e| {
            StoreError::CorruptRow {
                table: "players",
                detail: e.to_string(),
            }
        })?;
        self.conn.execute(
            "INSERT INTO players(
                id, name, homeworld_q, homeworld_r, metal, crystal, deuterium,
                fragments, components_json, token_hash, created_at, last_login_at
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                homeworld_q = excluded.homeworld_q,
                homeworld_r = excluded.homeworld_r,
                metal = excluded.metal,
                crystal = excluded.crystal,
                deuterium = excluded.deuterium,
                fragments = excluded.fragments,
                components_json = excluded.components_json,
                token_hash = excluded.token_hash,
                last_login_at = excluded.last_login_at",
            params![
                w(player.id.0),
                player.name,
                player.homeworld.q,
                player.homeworld.r,
                w(player.resources.metal),
                w(player.resources.crystal),
                w(player.resources.deut),
                player.fragments,
                components,
                player.auth_digest,
                w(player.created_at),
                w(player.last_login_at),
            ],
        )?;
        Ok(())
    }

    fn upsert_buildings(&mut self, player: &Player) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for building in balance::ALL_BUILDINGS {
            let level = player.buildings.get(&building).copied().unwrap_or(0);
            let (start, end) = match player.building_queue {
                Some(queue) if queue.building == building => {
                    (Some(w(queue.start_tick)), Some(w(queue.end_tick)))
                }
                _ => (None, None),
            };
            tx.execute(
                "INSERT INTO buildings(player_id, building_type, level, build_start_tick, build_end_tick)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(player_id, building_type) DO UPDATE SET
                    level = excluded.level,
                    build_start_tick = excluded.build_start_tick,
                    build_end_tick = excluded.build_end_tick",
                params![w(player.id.0), enum_to_text(&building)?, level, start, end],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_research(&mut self, player: &Player) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        for tech in balance::ALL_RESEARCH {
            let level = player.research.get(&tech).copied().unwrap_or(0);
            let (start, end) = match player.research_queue {
                Some(queue) if queue.tech == tech => {
                    (Some(w(queue.start_tick)), Some(w(queue.end_tick)))
                }
                _ => (None, None),
            };
            tx.execute(
                "INSERT INTO research(player_id, tech, level, research_start_tick, research_end_tick)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(player_id, tech) DO UPDATE SET
                    level = excluded.level,
                    research_start_tick = excluded.research_start_tick,
                    research_end_tick = excluded.research_end_tick",
                params![w(player.id.0), enum_to_text(&tech)?, level, start, end],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_ship_queue(&mut self, player: &Player) -> Result<(), StoreError> {
        match player.ship_queue {
            Some(queue) => {
                self.conn.execute(
                    "INSERT INTO ship_queue(player_id, class, requested_count, built, start_tick, end_tick)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                     ON CONFLICT(player_id) DO UPDATE SET
                        class = excluded.class,
                        requested_count = excluded.requested_count,
                        built = excluded.built,
                        start_tick = excluded.start_tick,
                        end_tick = excluded.end_tick",
                    params![
                        w(player.id.0),
                        enum_to_text(&queue.class)?,
                        queue.requested_count,
                        queue.built,
                        w(queue.start_tick),
                        w(queue.end_tick),
                    ],
                )?;
            }
            None => {
                self.conn.execute(
                    "DELETE FROM ship_queue WHERE player_id = ?1",
                    params![w(player.id.0)],
                )?;
            }
        }
        Ok(())
    }

    fn upsert_docked_ships(&mut self, player: &Player) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "DELETE FROM ships WHERE player_id = ?1 AND fleet_id IS NULL",
            params![w(player.id.0)],
        )?;
        for ship in &player.docked_ships {
            insert_ship(&tx, None, player.id, ship)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_fleet(&mut self, fleet: &Fleet) -> Result<(), StoreError> {
        let (target_q, target_r) = match fleet.move_target {
            Some(hex) => (Some(hex.q), Some(hex.r)),
            None => (None, None),
        };
        self.conn.execute(
            "INSERT INTO fleets(
                id, player_id, q, r, state, fuel, fuel_max,
                cargo_metal, cargo_crystal, cargo_deuterium,
                move_target_q, move_target_r, move_cooldown, action_cooldown, idle_ticks
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
             ON CONFLICT(id) DO UPDATE SET
                player_id = excluded.player_id,
                q = excluded.q,
                r = excluded.r,
                state = excluded.state,
                fuel = excluded.fuel,
                fuel_max = excluded.fuel_max,
                cargo_metal = excluded.cargo_metal,
                cargo_crystal = excluded.cargo_crystal,
                cargo_deuterium = excluded.cargo_deuterium,
                move_target_q = excluded.move_target_q,
                move_target_r = excluded.move_target_r,
                move_cooldown = excluded.move_cooldown,
                action_cooldown = excluded.action_cooldown,
                idle_ticks = excluded.idle_ticks",
            params![
                w(fleet.id.0),
                w(fleet.owner.0),
                fleet.location.q,
                fleet.location.r,
                enum_to_text(&fleet.status)?,
                fleet.fuel,
                fleet.fuel_max,
                w(fleet.cargo.metal),
                w(fleet.cargo.crystal),
                w(fleet.cargo.deut),
                target_q,
                target_r,
                fleet.move_cooldown,
                fleet.action_cooldown,
                fleet.idle_ticks,
            ],
        )?;
        Ok(())
    }

    fn upsert_fleet_ships(&mut self, fleet: &Fleet) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM ships WHERE fleet_id = ?1", params![w(fleet.id.0)])?;
        for ship in fleet.live_ships() {
            insert_ship(&tx, Some(fleet.id), fleet.owner, ship)?;
        }
        tx.commit()?;
        Ok(())
    }

    fn upsert_sector(&mut self, hex: Hex, overlay: &SectorOverride) -> Result<(), StoreError> {
        let densities: Vec<Option<String>> = overlay
            .densities
            .iter()
            .map(|d| d.map(|d| enum_to_text(&d)).transpose())
            .collect::<Result<_, _>>()?;
        let salvage_json = match &overlay.salvage {
            Some(salvage) => Some(serde_json::to_string(salvage).map_err(|e| StoreError::CorruptRow {
                table: "sectors_modified",
                detail: e.to_string(),
            })?),
            None => None,
        };
        self.conn.execute(
            "INSERT INTO sectors_modified(
                q, r, metal_density, crystal_density, deut_density,
                metal_harvested, crystal_harvested, deut_harvested,
                npc_cleared_tick, salvage_json
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
             ON CONFLICT(q, r) DO UPDATE SET
                metal_density = excluded.metal_density,
                crystal_density = excluded.crystal_density,
                deut_density = excluded.deut_density,
                metal_harvested = excluded.metal_harvested,
                crystal_harvested = excluded.crystal_harvested,
                deut_harvested = excluded.deut_harvested,
                npc_cleared_tick = excluded.npc_cleared_tick,
                salvage_json = excluded.salvage_json",
            params![
                hex.q,
                hex.r,
                densities[0],
                densities[1],
                densities[2],
                overlay.harvest_accum[0],
                overlay.harvest_accum[1],
                overlay.harvest_accum[2],
                overlay.npc_cleared_tick.map(w),
                salvage_json,
            ],
        )?;
        Ok(())
    }

    fn upsert_explored_edge(
        &mut self,
        player: PlayerId,
        a: Hex,
        b: Hex,
        discovered_tick: u64,
    ) -> Result<(), StoreError> {
        let (lo, hi) = Hex::canonical_pair(a, b);
        self.conn.execute(
            "INSERT INTO explored_edges(player_id, q1, r1, q2, r2, discovered_tick)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(player_id, q1, r1, q2, r2) DO UPDATE SET
                discovered_tick = excluded.discovered_tick",
            params![w(player.0), lo.q, lo.r, hi.q, hi.r, w(discovered_tick)],
        )?;
        Ok(())
    }

    fn load_all(&self) -> Result<LoadedState, StoreError> {
        let current_tick = self.load_server_state_value("current_tick")?.unwrap_or(0);
        let next_id = self.load_server_state_value("next_id")?.unwrap_or(1);
        let world_seed = self.load_server_state_value("world_seed")?.unwrap_or(0);

        let players = self.load_players()?;
        let fleets = self.load_fleets()?;
        let sectors = self.load_sectors()?;
        let explored_edges = self.load_explored_edges()?;

        Ok(LoadedState {
            current_tick,
            next_id,
            world_seed,
            players,
            fleets,
            sectors,
            explored_edges,
        })
    }
}

fn insert_ship(
    tx: &rusqlite::Transaction<'_>,
    fleet_id: Option<sim_model::FleetId>,
    player_id: PlayerId,
    ship: &Ship,
) -> Result<(), StoreError> {
    tx.execute(
        "INSERT INTO ships(id, fleet_id, player_id, class, hull, hull_max, shield, shield_max, weapon_power, speed)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(id) DO UPDATE SET
            fleet_id = excluded.fleet_id,
            player_id = excluded.player_id,
            class = excluded.class,
            hull = excluded.hull,
            hull_max = excluded.hull_max,
            shield = excluded.shield,
            shield_max = excluded.shield_max,
            weapon_power = excluded.weapon_power,
            speed = excluded.speed",
        params![
            w(ship.id.0),
            fleet_id.map(|id| w(id.0)),
            w(player_id.0),
            enum_to_text(&ship.class)?,
            ship.hull,
            ship.hull_max,
            ship.shield,
            ship.shield_max,
            ship.weapon_power,
            ship.speed,
        ],
    )?;
    Ok(())
}

impl SqliteStore {
    fn load_server_state_value(&self, key: &str) -> Result<Option<u64>, StoreError> {
        let raw: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM server_state WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        match raw {
            Some(text) => text
                .parse()
                .map(Some)
                .map_err(|_| StoreError::CorruptRow {
                    table: "server_state",
                    detail: format!("non-numeric value for {key}"),
                }),
            None => Ok(None),
        }
    }

    fn load_players(&self) -> Result<Vec<Player>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, homeworld_q, homeworld_r, metal, crystal, deuterium,
                    fragments, components_json, token_hash, created_at, last_login_at
             FROM players",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, i16>(2)?,
                row.get::<_, i16>(3)?,
                row.get::<_, i64>(4)?,
                row.get::<_, i64>(5)?,
                row.get::<_, i64>(6)?,
                row.get::<_, u32>(7)?,
                row.get::<_, String>(8)?,
                row.get::<_, Option<String>>(9)?,
                row.get::<_, i64>(10)?,
                row.get::<_, i64>(11)?,
            ))
        })?;

        let mut players = Vec::new();
        for row in rows {
            let (id, name, q, r, metal, crystal, deut, fragments, components_json, token, created_at, last_login_at) =
                row?;
            let id = PlayerId(uw(id));
            let (metal, crystal, deut) = (uw(metal), uw(crystal), uw(deut));
            let (created_at, last_login_at) = (uw(created_at), uw(last_login_at));
            let components: HashMap<String, u32> =
                serde_json::from_str(&components_json).map_err(|e| StoreError::CorruptRow {
                    table: "players",
                    detail: e.to_string(),
                })?;
            let buildings = self.load_building_levels(id)?;
            let building_queue = self.load_building_queue(id)?;
            let research = self.load_research_levels(id)?;
            let research_queue = self.load_research_queue(id)?;
            let ship_queue = self.load_ship_queue(id)?;
            let docked_ships = self.load_ships(None, Some(id))?;

            players.push(Player {
                id,
                name,
                resources: balance::Resources {
                    metal,
                    crystal,
                    deut,
                },
                fragments,
                homeworld: Hex { q, r },
                buildings,
                research,
                building_queue,
                research_queue,
                ship_queue,
                auth_digest: token,
                created_at,
                last_login_at,
                docked_ships,
                components,
            });
        }
        Ok(players)
    }

    fn load_building_levels(&self, player: PlayerId) -> Result<HashMap<BuildingType, u32>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT building_type, level FROM buildings WHERE player_id = ?1 AND level > 0")?;
        let rows = stmt.query_map(params![w(player.0)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (kind, level) = row?;
            map.insert(enum_from_text(&kind, "buildings")?, level);
        }
        Ok(map)
    }

    fn load_building_queue(&self, player: PlayerId) -> Result<Option<BuildQueue>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT building_type, level, build_start_tick, build_end_tick
             FROM buildings WHERE player_id = ?1 AND build_end_tick IS NOT NULL",
        )?;
        stmt.query_row(params![w(player.0)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .optional()?
        .map(|(kind, level, start, end)| {
            Ok(BuildQueue {
                building: enum_from_text(&kind, "buildings")?,
                target_level: level + 1,
                start_tick: uw(start),
                end_tick: uw(end),
            })
        })
        .transpose()
    }

    fn load_research_levels(&self, player: PlayerId) -> Result<HashMap<ResearchTech, u32>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT tech, level FROM research WHERE player_id = ?1 AND level > 0")?;
        let rows = stmt.query_map(params![w(player.0)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u32>(1)?))
        })?;
        let mut map = HashMap::new();
        for row in rows {
            let (tech, level) = row?;
            map.insert(enum_from_text(&tech, "research")?, level);
        }
        Ok(map)
    }

    fn load_research_queue(&self, player: PlayerId) -> Result<Option<ResearchQueue>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT tech, level, research_start_tick, research_end_tick
             FROM research WHERE player_id = ?1 AND research_end_tick IS NOT NULL",
        )?;
        stmt.query_row(params![w(player.0)], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, u32>(1)?,
                row.get::<_, i64>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })
        .optional()?
        .map(|(tech, level, start, end)| {
            Ok(ResearchQueue {
                tech: enum_from_text(&tech, "research")?,
                target_level: level + 1,
                start_tick: uw(start),
                end_tick: uw(end),
            })
        })
        .transpose()
    }

    fn load_ship_queue(&self, player: PlayerId) -> Result<Option<ShipQueue>, StoreError> {
        self.conn
            .query_row(
                "SELECT class, requested_count, built, start_tick, end_tick
                 FROM ship_queue WHERE player_id = ?1",
                params![w(player.0)],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, u32>(1)?,
                        row.get::<_, u32>(2)?,
                        row.get::<_, i64>(3)?,
                        row.get::<_, i64>(4)?,
                    ))
                },
            )
            .optional()?
            .map(|(class, requested_count, built, start_tick, end_tick)| {
                Ok(ShipQueue {
                    class: enum_from_text(&class, "ship_queue")?,
                    requested_count,
                    built,
                    start_tick: uw(start_tick),
                    end_tick: uw(end_tick),
                })
            })
            .transpose()
    }

    fn load_ships(
        &self,
        fleet_id: Option<sim_model::FleetId>,
        player_id: Option<PlayerId>,
    ) -> Result<Vec<Ship>, StoreError> {
        let mut stmt = match (fleet_id, player_id) {
            (Some(_), _) => self.conn.prepare(
                "SELECT id, class, hull, hull_max, shield, shield_max, weapon_power, speed
                 FROM ships WHERE fleet_id = ?1",
            )?,
            (None, Some(_)) => self.conn.prepare(
                "SELECT id, class, hull, hull_max, shield, shield_max, weapon_power, speed
                 FROM ships WHERE fleet_id IS NULL AND player_id = ?1",
            )?,
            (None, None) => {
                return Ok(Vec::new());
            }
        };
        let key = w(fleet_id.map_or_else(|| player_id.map_or(0, |p| p.0), |f| f.0));
        let rows = stmt.query_map(params![key], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, u32>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u32>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, u32>(7)?,
            ))
        })?;
        let mut ships = Vec::new();
        for row in rows {
            let (id, class, hull, hull_max, shield, shield_max, weapon_power, speed) = row?;
            ships.push(Ship {
                id: ShipId(id as u64),
                class: enum_from_text(&class, "ships")?,
                hull,
                hull_max,
                shield,
                shield_max,
                weapon_power,
                speed,
            });
        }
        Ok(ships)
    }

    fn load_fleets(&self) -> Result<Vec<Fleet>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, player_id, q, r, state, fuel, fuel_max,
                    cargo_metal, cargo_crystal, cargo_deuterium,
                    move_target_q, move_target_r, move_cooldown, action_cooldown, idle_ticks
             FROM fleets",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, i16>(2)?,
                row.get::<_, i16>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, i64>(7)?,
                row.get::<_, i64>(8)?,
                row.get::<_, i64>(9)?,
                row.get::<_, Option<i16>>(10)?,
                row.get::<_, Option<i16>>(11)?,
                row.get::<_, u32>(12)?,
                row.get::<_, u32>(13)?,
                row.get::<_, u32>(14)?,
            ))
        })?;

        let mut fleets = Vec::new();
        for row in rows {
            let (
                id,
                player_id,
                q,
                r,
                state,
                fuel,
                fuel_max,
                metal,
                crystal,
                deut,
                target_q,
                target_r,
                move_cooldown,
                action_cooldown,
                idle_ticks,
            ) = row?;
            let id = sim_model::FleetId(uw(id));
            let ships = self.load_ships(Some(id), None)?;
            let ship_count = ships.len();
            let move_target = match (target_q, target_r) {
                (Some(q), Some(r)) => Some(Hex { q, r }),
                _ => None,
            };
            fleets.push(Fleet {
                id,
                owner: PlayerId(uw(player_id)),
                location: Hex { q, r },
                status: enum_from_text::<FleetStatus>(&state, "fleets")?,
                ships,
                ship_count,
                cargo: balance::Resources {
                    metal: uw(metal),
                    crystal: uw(crystal),
                    deut: uw(deut),
                },
                fuel,
                fuel_max,
                move_cooldown,
                action_cooldown,
                move_target,
                idle_ticks,
            });
        }
        Ok(fleets)
    }

    fn load_sectors(&self) -> Result<Vec<(Hex, SectorOverride)>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT q, r, metal_density, crystal_density, deut_density,
                    metal_harvested, crystal_harvested, deut_harvested,
                    npc_cleared_tick, salvage_json
             FROM sectors_modified",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i16>(0)?,
                row.get::<_, i16>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, u32>(7)?,
                row.get::<_, Option<i64>>(8)?,
                row.get::<_, Option<String>>(9)?,
            ))
        })?;

        let mut sectors = Vec::new();
        for row in rows {
            let (q, r, md, cd, dd, mh, ch, dh, npc_cleared_tick, salvage_json) = row?;
            let npc_cleared_tick = npc_cleared_tick.map(uw);
            let density = |text: Option<String>| -> Result<Option<worldgen::Density>, StoreError> {
                text.map(|t| enum_from_text(&t, "sectors_modified")).transpose()
            };
            let salvage = salvage_json
                .map(|text| {
                    serde_json::from_str(&text).map_err(|e| StoreError::CorruptRow {
                        table: "sectors_modified",
                        detail: e.to_string(),
                    })
                })
                .transpose()?;
            let overlay = SectorOverride {
                densities: [density(md)?, density(cd)?, density(dd)?],
                harvest_accum: [mh, ch, dh],
                salvage,
                npc_cleared_tick,
            };
            sectors.push((Hex { q, r }, overlay));
        }
        Ok(sectors)
    }

    fn load_explored_edges(&self) -> Result<Vec<(PlayerId, Hex, Hex)>, StoreError> {
        let mut stmt = self
            .conn
            .prepare("SELECT player_id, q1, r1, q2, r2 FROM explored_edges")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i16>(1)?,
                row.get::<_, i16>(2)?,
                row.get::<_, i16>(3)?,
                row.get::<_, i16>(4)?,
            ))
        })?;
        let mut edges = Vec::new();
        for row in rows {
            let (player_id, q1, r1, q2, r2) = row?;
            edges.push((
                PlayerId(player_id as u64),
                Hex { q: q1, r: r1 },
                Hex { q: q2, r: r2 },
            ));
        }
        Ok(edges)
    }
}
