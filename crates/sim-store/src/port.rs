// SPDX-License-Identifier: Apache-2.0
//! The checkpoint store port: a trait every persistence backend implements,
//! and the snapshot type `load_all` returns. Grounded on this repository's
//! `echo_app_core::config::ConfigStore` port/adapter split — the trait owns
//! the storage contract, a concrete crate (here `sqlite`) owns the engine.

use hex_geom::Hex;
use sim_model::{Fleet, Player, PlayerId, SectorOverride};
use thiserror::Error;

/// Everything `bootstrap_schema` plus a `load_all` call hand back to
/// reconstruct a [`sim_model::World`] after a restart.
#[derive(Debug, Default, Clone)]
pub struct LoadedState {
    /// Last committed tick, 0 on a brand new database.
    pub current_tick: u64,
    /// Next id to allocate, 1 on a brand new database.
    pub next_id: u64,
    /// The world generation seed.
    pub world_seed: u64,
    /// Every persisted player, with buildings/research/queues/docked ships
    /// already merged in.
    pub players: Vec<Player>,
    /// Every persisted fleet, with its ship set already merged in.
    pub fleets: Vec<Fleet>,
    /// Every sector with a non-default override.
    pub sectors: Vec<(Hex, SectorOverride)>,
    /// Every discovered edge, as `(player, a, b)` with `a`/`b` already in
    /// canonical order.
    pub explored_edges: Vec<(PlayerId, Hex, Hex)>,
}

/// Errors a [`CheckpointStore`] implementation can surface. Every variant
/// wraps the underlying engine error rather than hiding it, per this
/// repository's existing `ConfigError` convention.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing engine reported an error.
    #[error("store backend error: {0}")]
    Backend(String),
    /// A row could not be decoded into its domain type.
    #[error("corrupt row in {table}: {detail}")]
    CorruptRow {
        /// Table the row came from.
        table: &'static str,
        /// What was wrong with it.
        detail: String,
    },
    /// A transaction method was called out of order (e.g. `commit` with no
    /// matching `begin_immediate`).
    #[error("transaction misuse: {0}")]
    TransactionState(&'static str),
}

/// The checkpoint persistence contract. One method per record family named
/// in the persisted-state schema, plus transaction bracketing and a full
/// snapshot load used once at startup.
///
/// Implementations upsert: calling an `upsert_*` method for a record that
/// already exists overwrites it; there is no separate insert path, matching
/// the "idempotent upsert per record family" requirement.
pub trait CheckpointStore {
    /// Creates every table and index if they do not already exist. Safe to
    /// call on every startup, including against an existing populated
    /// database.
    fn bootstrap_schema(&mut self) -> Result<(), StoreError>;

    /// Opens a new write transaction. Per tick, the engine wraps one
    /// `begin_immediate` / `commit` pair around every `upsert_*` call the
    /// tick produced, so a crash mid-flush leaves the previous checkpoint
    /// intact rather than a partially written one.
    fn begin_immediate(&mut self) -> Result<(), StoreError>;
    /// Commits the open transaction.
    fn commit(&mut self) -> Result<(), StoreError>;
    /// Abandons the open transaction, discarding any `upsert_*` calls made
    /// since `begin_immediate`.
    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Upserts `server_state`'s three scalar fields.
    fn upsert_server_state(
        &mut self,
        current_tick: u64,
        next_id: u64,
        world_seed: u64,
    ) -> Result<(), StoreError>;

    /// Upserts one player's wallet/identity row (not buildings, research,
    /// ship queue, or docked ships — those are separate record families,
    /// each with their own `upsert_*`).
    fn upsert_player(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Upserts one player's building levels and at most one in-progress
    /// build.
    fn upsert_buildings(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Upserts one player's research levels and at most one in-progress
    /// research.
    fn upsert_research(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Upserts one player's in-progress ship production run, if any, and
    /// clears it otherwise.
    fn upsert_ship_queue(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Replaces one player's docked-ship pool wholesale.
    fn upsert_docked_ships(&mut self, player: &Player) -> Result<(), StoreError>;

    /// Upserts one fleet's scalar row (location, status, cargo, fuel,
    /// cooldowns — not its ship set).
    fn upsert_fleet(&mut self, fleet: &Fleet) -> Result<(), StoreError>;

    /// Replaces one fleet's live ship set wholesale.
    fn upsert_fleet_ships(&mut self, fleet: &Fleet) -> Result<(), StoreError>;

    /// Upserts one sector's modified-from-template override.
    fn upsert_sector(&mut self, hex: Hex, overlay: &SectorOverride) -> Result<(), StoreError>;

    /// Upserts one discovered edge. `a` and `b` need not be pre-sorted;
    /// the implementation canonicalizes them.
    fn upsert_explored_edge(
        &mut self,
        player: PlayerId,
        a: Hex,
        b: Hex,
        discovered_tick: u64,
    ) -> Result<(), StoreError>;

    /// Loads the entire persisted world in one pass, used once at startup.
    fn load_all(&self) -> Result<LoadedState, StoreError>;
}
