// SPDX-License-Identifier: Apache-2.0
//! The authoritative data model: entities, strongly typed ids, per-family
//! dirty-tracking, and the simulation's event vocabulary.
//!
//! This crate owns types only — no tick logic, no command handling, no
//! I/O. `sim-engine` is the only crate that mutates a [`World`]; the
//! checkpoint store (`sim-store`) only reads snapshots of it.

mod combat;
mod dirty;
mod event;
mod fleet;
mod ids;
mod npc;
mod player;
mod queue;
mod sector;
mod ship;
mod world;

pub use combat::Combat;
pub use dirty::{DirtyMut, DirtySet};
pub use event::{Event, EventKind};
pub use fleet::{Fleet, FleetStatus};
pub use ids::{CombatId, FleetId, NpcFleetId, PlayerId, ShipId};
pub use npc::NpcFleet;
pub use player::Player;
pub use queue::{BuildQueue, ResearchQueue, ShipQueue};
pub use sector::{SectorOverride, Salvage};
pub use ship::Ship;
pub use world::World;
