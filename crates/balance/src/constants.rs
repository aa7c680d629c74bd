// SPDX-License-Identifier: Apache-2.0
//! Named constants so every magic number in spec.md §4.3/§4.4/§4.5 has one
//! canonical definition that other crates import instead of re-declaring.

use worldgen::Zone;

/// Server tick rate in Hz. The tick loop paces itself to this rate.
pub const TICK_RATE_HZ: f64 = 1.0;

/// Ticks between checkpoint flushes.
pub const PERSIST_EVERY_TICKS: u64 = 30;

/// Fraction (fixed-point ×1000) of remaining cost refunded on `CancelBuild`.
pub const CANCEL_REFUND_FRACTION_MILLI: u32 = 500;

/// Fraction (fixed-point ×1000) of a defeated NPC's total build cost left
/// behind as salvage.
pub const SALVAGE_FRACTION_MILLI: u32 = 300;

/// Ticks after a victorious combat before its salvage pile despawns.
pub const SALVAGE_DESPAWN_TICKS: u64 = 50;

/// Lower bound (fixed-point ×1000, e.g. 800 = 0.8×) of the per-shot damage
/// variance roll.
pub const DAMAGE_VARIANCE_MIN_MILLI: u32 = 800;

/// Upper bound (fixed-point ×1000) of the per-shot damage variance roll.
pub const DAMAGE_VARIANCE_MAX_MILLI: u32 = 1_200;

/// Fuel cost per hex of distance for a `Recall`, as a multiplier over the
/// ship's normal per-hex fuel burn.
pub const RECALL_FUEL_MULTIPLIER: u32 = 3;

/// Ticks a fleet stays on `action_cooldown` after issuing `Harvest`.
pub const HARVEST_COOLDOWN: u32 = 3;

/// Maximum fleets a single player may have open simultaneously.
pub const FLEET_LIMIT: usize = 8;

/// Maximum ships a player's docked pool may hold.
pub const DOCKED_POOL_CAP: usize = 64;

/// Ticks a fleet must be idle before shield regeneration begins.
pub const SHIELD_REGEN_IDLE_THRESHOLD: u32 = 5;

/// Fraction (fixed-point ×1000) of max shield restored per tick once the
/// idle threshold is reached.
pub const SHIELD_REGEN_FRACTION_MILLI: u32 = 100;

/// Minimum distance from the origin a homeworld may be placed at.
pub const HOMEWORLD_MIN_DIST: i32 = 3;

/// Maximum distance from the origin a homeworld may be placed at.
pub const HOMEWORLD_MAX_DIST: i32 = 15;

/// Minimum allowed distance between two players' homeworlds.
pub const HOMEWORLD_MIN_SEPARATION: i32 = 2;

/// Ship count in the starter fleet granted at registration.
pub const STARTER_SCOUT_COUNT: u32 = 2;

/// Starting resource wallet granted at registration.
pub const STARTING_RESOURCES: (u64, u64, u64) = (500, 300, 100);

/// Maximum level any building or research may reach.
pub const MAX_LEVEL: u32 = 30;

/// Per-hex recall damage chance (fixed-point ×1000) before emergency-jump
/// reduction, capped at `RECALL_DAMAGE_CHANCE_CAP_MILLI`.
pub const RECALL_DAMAGE_CHANCE_PER_HEX_MILLI: u32 = 20;

/// Cap on cumulative recall damage chance regardless of distance.
pub const RECALL_DAMAGE_CHANCE_CAP_MILLI: u32 = 600;

/// Lower bound (fixed-point ×1000) of the random hull-percentage damage a
/// `Recall` roll applies to a ship it hits.
pub const RECALL_HULL_DAMAGE_MIN_MILLI: u32 = 100;

/// Upper bound (fixed-point ×1000) of the random hull-percentage damage a
/// `Recall` roll applies to a ship it hits.
pub const RECALL_HULL_DAMAGE_MAX_MILLI: u32 = 500;

/// Ticks after `npc_cleared_tick` before a sector's NPC template may spawn
/// again, scaled by zone (deeper zones respawn slower).
#[must_use]
pub fn zone_respawn_delay(zone: Zone) -> u64 {
    match zone {
        Zone::CentralHub => 0,
        Zone::InnerRing => 40,
        Zone::OuterRing => 80,
        Zone::Wandering => 150,
    }
}

/// Small regen amount subtracted from a depleted resource's harvest
/// accumulator per tick while unattended.
pub const SECTOR_REGEN_PER_TICK: u32 = 50;

/// Numerator used to turn a ship's `speed` stat into a tick count for a
/// single-hex move: `ticks = SPEED_BASIS / speed`, then `Navigation`
/// reduction is subtracted, floored at 1.
pub const SPEED_BASIS: u32 = 60_000;

/// Fuel burned per hex of travel, per live ship in the fleet, before the
/// `FuelEfficiency` modifier is applied.
pub const FUEL_BURN_PER_HEX_PER_SHIP: u32 = 10;

/// Base per-tick harvest power contributed by one non-`Harvester` ship in a
/// harvesting fleet (a `Harvester` counts for three), before `HarvestTech`
/// and the sector's density multiplier are applied.
pub const HARVEST_BASE_PER_SHIP: u32 = 50;
