// SPDX-License-Identifier: Apache-2.0
//! Deterministic procedural world generation.
//!
//! Two pure functions over `(world_seed, coordinate)`: sector templates and
//! edge connectivity. No entity or simulation concepts live here — this
//! crate only answers "what does the generator say is at this hex" and
//! "what does the generator say connects these two hexes", both without
//! reading or writing any stored state.

mod prng;

pub use hex_geom::Zone;
pub use prng::Prng;

use hex_geom::{mask_has, ConnectivityMask, Direction, Hex};

/// Fixed resource order used everywhere a `[Density; 3]` or harvest-order
/// loop appears: metal, crystal, deuterium.
pub const RESOURCE_ORDER: [Resource; 3] = [Resource::Metal, Resource::Crystal, Resource::Deut];

/// One of the three harvestable resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Resource {
    /// Structural metal.
    Metal,
    /// Crystal, used for advanced construction and research.
    Crystal,
    /// Deuterium fuel.
    Deut,
}

impl Resource {
    /// Index into a fixed `[T; 3]` resource array, matching [`RESOURCE_ORDER`].
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Resource::Metal => 0,
            Resource::Crystal => 1,
            Resource::Deut => 2,
        }
    }
}

/// Coarse terrain kind rolled per sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Terrain {
    /// Barren rock, average density across resources.
    Rock,
    /// Ice world, deuterium-favoring.
    Ice,
    /// Gas giant, crystal-favoring.
    Gas,
    /// Asteroid field, metal-favoring.
    Asteroid,
    /// Nothing here. Always the central hub's terrain.
    Empty,
}

/// Resource abundance at a sector, with its harvest multiplier and the
/// accumulated-harvest threshold at which it downgrades one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub enum Density {
    /// Nothing to harvest.
    None,
    /// Thin deposit.
    Sparse,
    /// Workable deposit.
    Moderate,
    /// Generous deposit.
    Rich,
    /// Exceptional deposit, found only in deep zones.
    Pristine,
}

impl Density {
    /// Per-tick harvest multiplier for one unit of harvest power at this
    /// density.
    #[must_use]
    pub const fn multiplier(self) -> u32 {
        match self {
            Density::None => 0,
            Density::Sparse => 1,
            Density::Moderate => 2,
            Density::Rich => 4,
            Density::Pristine => 8,
        }
    }

    /// Accumulated-harvest threshold that triggers a one-step downgrade.
    #[must_use]
    pub const fn depletion_threshold(self) -> u32 {
        match self {
            Density::None => 0,
            Density::Sparse => 500,
            Density::Moderate => 2_000,
            Density::Rich => 6_000,
            Density::Pristine => 15_000,
        }
    }

    /// One step down toward `None`, saturating.
    #[must_use]
    pub const fn downgrade(self) -> Self {
        match self {
            Density::None | Density::Sparse => Density::None,
            Density::Moderate => Density::Sparse,
            Density::Rich => Density::Moderate,
            Density::Pristine => Density::Rich,
        }
    }

    /// One step up toward the template's density, saturating at `Pristine`.
    #[must_use]
    pub const fn upgrade(self) -> Self {
        match self {
            Density::None => Density::Sparse,
            Density::Sparse => Density::Moderate,
            Density::Moderate => Density::Rich,
            Density::Rich | Density::Pristine => Density::Pristine,
        }
    }
}

/// NPC behavior rolled onto a sector template.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NpcBehavior {
    /// Visible in the sector projection but never initiates combat.
    Passive,
    /// Initiates combat against any player fleet that arrives.
    Aggressive,
    /// Patrols connected neighbors and initiates combat on arrival at an
    /// occupied sector.
    Patrol,
}

/// NPC ship class, reused from `balance::ShipClass` by name but kept as a
/// plain string-free tag here so `worldgen` has no dependency on `balance`
/// (the generator only needs to name a class, not price it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum NpcShipClass {
    /// Light raider hull.
    Raider,
    /// Mid-weight hull.
    Marauder,
    /// Heavy hull, found only in deeper zones.
    Dreadnought,
}

/// A potential NPC presence at a sector: class, count range, behavior, and a
/// fixed-point (×1000) stat multiplier scaled by distance from origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NpcTemplate {
    /// Ship class the spawned NPC fleet is built from.
    pub class: NpcShipClass,
    /// Inclusive `(min, max)` ship count rolled at spawn time.
    pub count_range: (u16, u16),
    /// Behavior governing whether/how this NPC moves and initiates combat.
    pub behavior: NpcBehavior,
    /// ×1000 fixed-point multiplier applied to hull/shield/weapon at spawn.
    pub stat_multiplier_milli: u32,
}

/// The deterministic, generator-derived base content of a sector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SectorTemplate {
    /// Coarse terrain kind.
    pub terrain: Terrain,
    /// Resource densities in [`RESOURCE_ORDER`].
    pub densities: [Density; 3],
    /// Optional NPC presence.
    pub npc: Option<NpcTemplate>,
}

impl SectorTemplate {
    /// Density for a given resource, per [`RESOURCE_ORDER`].
    #[must_use]
    pub fn density(&self, resource: Resource) -> Density {
        self.densities[resource.index()]
    }
}

/// Derives the per-coordinate generation seed from the world seed and the
/// hex's packed key, streaming both as little-endian 64-bit words into
/// BLAKE3 and reducing the digest to a `u64` by taking its first 8 bytes
/// little-endian. Independent of host endianness.
#[must_use]
pub fn seed_for(world_seed: u64, hex: Hex) -> u64 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&world_seed.to_le_bytes());
    hasher.update(&u64::from(hex.to_key()).to_le_bytes());
    digest_to_u64(hasher.finalize().as_bytes())
}

/// Derives the symmetric edge seed for an unordered neighbor pair, ordering
/// by packed key (smaller first) before hashing so `edge_seed(s, a, b) ==
/// edge_seed(s, b, a)`.
#[must_use]
pub fn edge_seed(world_seed: u64, a: Hex, b: Hex) -> u64 {
    let (lo, hi) = Hex::canonical_pair(a, b);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&world_seed.to_le_bytes());
    hasher.update(&u64::from(lo.to_key()).to_le_bytes());
    hasher.update(&u64::from(hi.to_key()).to_le_bytes());
    digest_to_u64(hasher.finalize().as_bytes())
}

fn digest_to_u64(digest: &[u8; 32]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&digest[0..8]);
    u64::from_le_bytes(buf)
}

/// Picks one of `items` weighted by its paired `u32` weight. Panics (via
/// the RNG's own range assertion) only if `items` is empty or all weights
/// are zero, which would be a programmer error in a table, not user input.
fn weighted_pick<T: Copy>(rng: &mut Prng, items: &[(T, u32)]) -> T {
    let total: u32 = items.iter().map(|(_, w)| *w).sum();
    let mut roll = rng.next_int(0, total.max(1) as i32 - 1) as u32;
    for (item, weight) in items {
        if roll < *weight {
            return *item;
        }
        roll -= weight;
    }
    items[items.len() - 1].0
}

fn roll_terrain(rng: &mut Prng, zone: Zone) -> Terrain {
    let table: &[(Terrain, u32)] = match zone {
        Zone::CentralHub => return Terrain::Empty,
        Zone::InnerRing => &[
            (Terrain::Rock, 40),
            (Terrain::Asteroid, 30),
            (Terrain::Ice, 15),
            (Terrain::Gas, 10),
            (Terrain::Empty, 5),
        ],
        Zone::OuterRing => &[
            (Terrain::Rock, 25),
            (Terrain::Asteroid, 30),
            (Terrain::Ice, 20),
            (Terrain::Gas, 20),
            (Terrain::Empty, 5),
        ],
        Zone::Wandering => &[
            (Terrain::Rock, 15),
            (Terrain::Asteroid, 25),
            (Terrain::Ice, 25),
            (Terrain::Gas, 30),
            (Terrain::Empty, 5),
        ],
    };
    weighted_pick(rng, table)
}

fn density_ceiling(zone: Zone) -> Density {
    match zone {
        Zone::CentralHub => Density::None,
        Zone::InnerRing => Density::Moderate,
        Zone::OuterRing => Density::Rich,
        Zone::Wandering => Density::Pristine,
    }
}

fn roll_density(rng: &mut Prng, zone: Zone, terrain: Terrain, resource: Resource) -> Density {
    if terrain == Terrain::Empty {
        return Density::None;
    }
    let ceiling = density_ceiling(zone);
    let favored = matches!(
        (terrain, resource),
        (Terrain::Asteroid, Resource::Metal)
            | (Terrain::Gas, Resource::Crystal)
            | (Terrain::Ice, Resource::Deut)
    );
    let levels = match ceiling {
        Density::None => 0,
        Density::Sparse => 1,
        Density::Moderate => 2,
        Density::Rich => 3,
        Density::Pristine => 4,
    };
    let boost = u32::from(favored);
    let roll = rng.next_int(0, levels as i32 + boost as i32).max(0) as u32;
    let level = roll.min(levels + boost).min(4);
    match level {
        0 => Density::None,
        1 => Density::Sparse,
        2 => Density::Moderate,
        3 => Density::Rich,
        _ => Density::Pristine,
    }
}

fn roll_npc(rng: &mut Prng, zone: Zone, terrain: Terrain) -> Option<NpcTemplate> {
    if zone == Zone::CentralHub || terrain == Terrain::Empty {
        return None;
    }
    let spawn_chance = match zone {
        Zone::CentralHub => 0,
        Zone::InnerRing => 15,
        Zone::OuterRing => 30,
        Zone::Wandering => 45,
    };
    if rng.next_int(0, 99) >= spawn_chance {
        return None;
    }
    let class = match zone {
        Zone::CentralHub | Zone::InnerRing => weighted_pick(
            rng,
            &[(NpcShipClass::Raider, 80), (NpcShipClass::Marauder, 20)],
        ),
        Zone::OuterRing => weighted_pick(
            rng,
            &[
                (NpcShipClass::Raider, 40),
                (NpcShipClass::Marauder, 45),
                (NpcShipClass::Dreadnought, 15),
            ],
        ),
        Zone::Wandering => weighted_pick(
            rng,
            &[
                (NpcShipClass::Raider, 20),
                (NpcShipClass::Marauder, 40),
                (NpcShipClass::Dreadnought, 40),
            ],
        ),
    };
    let behavior = weighted_pick(
        rng,
        &[
            (NpcBehavior::Passive, 30),
            (NpcBehavior::Aggressive, 50),
            (NpcBehavior::Patrol, 20),
        ],
    );
    let min_count = 1 + rng.next_int(0, 2) as u16;
    let max_count = min_count + 1 + rng.next_int(0, 2) as u16;
    let distance_bonus = (zone as i32) * 150;
    let stat_multiplier_milli = 1000 + distance_bonus as u32;
    Some(NpcTemplate {
        class,
        count_range: (min_count, max_count),
        behavior,
        stat_multiplier_milli,
    })
}

/// Generates the deterministic sector template for `hex` under `world_seed`.
/// Pure: two calls with the same inputs always return equal templates.
#[must_use]
pub fn generate_sector(world_seed: u64, hex: Hex) -> SectorTemplate {
    let mut rng = Prng::from_seed_u64(seed_for(world_seed, hex));
    let zone = hex.zone();
    let terrain = roll_terrain(&mut rng, zone);
    let mut densities = [Density::None; 3];
    for resource in RESOURCE_ORDER {
        densities[resource.index()] = roll_density(&mut rng, zone, terrain, resource);
    }
    let npc = roll_npc(&mut rng, zone, terrain);
    SectorTemplate {
        terrain,
        densities,
        npc,
    }
}

/// Survival percentage (0..=100) for an edge whose controlling hex (the
/// farther-from-origin endpoint) falls in `zone`, additionally decaying in
/// `Wandering` by `extra_distance` past [`Zone::OUTER_RING_MAX_DIST`].
fn survival_percent(zone: Zone, distance_from_origin: i32) -> i32 {
    match zone {
        Zone::CentralHub | Zone::InnerRing => 100,
        Zone::OuterRing => 85,
        Zone::Wandering => {
            let extra = (distance_from_origin - Zone::OUTER_RING_MAX_DIST).max(0);
            (70 - extra).max(15)
        }
    }
}

/// The unforced survival roll for the edge `{a, b}`. Symmetric in its
/// arguments: both the controlling distance and `edge_seed` itself are
/// defined over the unordered pair, so `raw_edge_open(s, a, b) ==
/// raw_edge_open(s, b, a)`.
fn raw_edge_open(world_seed: u64, a: Hex, b: Hex) -> bool {
    let controlling_distance = a.distance_from_origin().max(b.distance_from_origin());
    let zone = Zone::classify(controlling_distance);
    let percent = survival_percent(zone, controlling_distance);
    let mut rng = Prng::from_seed_u64(edge_seed(world_seed, a, b));
    rng.next_int(0, 99) < percent
}

/// The bitmask of `hex`'s six edges using only the unforced roll, i.e.
/// before the no-isolation guarantee is applied. Used solely to decide
/// whether `hex` needs its forced edge.
fn raw_mask(world_seed: u64, hex: Hex) -> ConnectivityMask {
    let mut mask: ConnectivityMask = 0;
    for dir in Direction::ALL {
        if raw_edge_open(world_seed, hex, hex.neighbor(dir)) {
            mask |= 1 << dir.index();
        }
    }
    mask
}

/// Whether the edge `{a, b}` is open, after the no-isolation guarantee.
///
/// This is the single source of truth both endpoints read, so it is
/// symmetric by construction: the unforced roll is symmetric
/// ([`raw_edge_open`]), and the forced term is spelled out for both
/// directions of the pair rather than decided unilaterally by whichever
/// endpoint happens to be evaluated first. A hex is isolated (all six
/// unforced rolls failed) forces open its `Direction::SE` edge; checking
/// that condition from both `a`'s and `b`'s side is what keeps
/// `connectivity(a)[dir] == connectivity(b)[opposite(dir)]` true even when
/// exactly one endpoint needed forcing.
fn edge_open(world_seed: u64, a: Hex, b: Hex) -> bool {
    if raw_edge_open(world_seed, a, b) {
        return true;
    }
    let a_forces_this_edge = b == a.neighbor(Direction::SE) && raw_mask(world_seed, a) == 0;
    let b_forces_this_edge = a == b.neighbor(Direction::SE) && raw_mask(world_seed, b) == 0;
    a_forces_this_edge || b_forces_this_edge
}

/// Returns the bitmask of directions connected from `hex`, allocation-free.
///
/// Computed purely on demand from `world_seed` and the six candidate edges;
/// nothing about connectivity is stored. The origin is always fully
/// connected. If every edge would otherwise fail its roll, the
/// last-evaluated direction (`Direction::SE`) is forced to connect so no
/// hex is ever fully isolated — applied via [`edge_open`], which both
/// endpoints of an edge evaluate identically, so the guarantee never makes
/// an edge open from one side and closed from the other.
#[must_use]
pub fn connectivity(world_seed: u64, hex: Hex) -> ConnectivityMask {
    if hex == Hex::ORIGIN {
        return 0b0011_1111;
    }
    let mut mask: ConnectivityMask = 0;
    for dir in Direction::ALL {
        if edge_open(world_seed, hex, hex.neighbor(dir)) {
            mask |= 1 << dir.index();
        }
    }
    mask
}

/// Connected neighbor coordinates of `hex`, as an allocation-free fixed
/// array with `None` in unconnected direction slots.
#[must_use]
pub fn neighbors_connected(world_seed: u64, hex: Hex) -> [Option<Hex>; 6] {
    let mask = connectivity(world_seed, hex);
    let mut out = [None; 6];
    for dir in Direction::ALL {
        if mask_has(mask, dir) {
            out[dir.index() as usize] = Some(hex.neighbor(dir));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

    #[test]
    fn generator_is_deterministic() {
        let hex = Hex::new(12, -7);
        assert_eq!(generate_sector(SEED, hex), generate_sector(SEED, hex));
    }

    #[test]
    fn central_hub_is_always_empty() {
        let template = generate_sector(SEED, Hex::ORIGIN);
        assert_eq!(template.terrain, Terrain::Empty);
        assert!(template.densities.iter().all(|d| *d == Density::None));
        assert!(template.npc.is_none());
    }

    #[test]
    fn origin_is_fully_connected() {
        assert_eq!(connectivity(SEED, Hex::ORIGIN), 0b0011_1111);
    }

    #[test]
    fn connectivity_never_isolates_a_hex() {
        for q in -30..30 {
            for r in -30..30 {
                let hex = Hex::new(q, r);
                assert_ne!(connectivity(SEED, hex), 0, "isolated at {hex:?}");
            }
        }
    }

    #[test]
    fn edge_seed_is_symmetric() {
        let a = Hex::new(5, 5);
        let b = a.neighbor(Direction::E);
        assert_eq!(edge_seed(SEED, a, b), edge_seed(SEED, b, a));
    }

    #[test]
    fn connectivity_bit_is_reciprocal() {
        for q in -30..30 {
            for r in -30..30 {
                let a = Hex::new(q, r);
                let mask_a = connectivity(SEED, a);
                for dir in Direction::ALL {
                    let b = a.neighbor(dir);
                    let mask_b = connectivity(SEED, b);
                    assert_eq!(
                        mask_has(mask_a, dir),
                        mask_has(mask_b, dir.opposite()),
                        "edge {a:?}->{b:?} open from one side only"
                    );
                }
            }
        }
    }

    proptest! {
        #[test]
        fn prop_generator_deterministic(seed: u64, q in -3000i16..3000, r in -3000i16..3000) {
            let hex = Hex::new(q, r);
            prop_assert_eq!(generate_sector(seed, hex), generate_sector(seed, hex));
        }

        #[test]
        fn prop_no_isolation(seed: u64, q in -3000i16..3000, r in -3000i16..3000) {
            let hex = Hex::new(q, r);
            prop_assert_ne!(connectivity(seed, hex), 0);
        }

        #[test]
        fn prop_edge_symmetric(seed: u64, q in -3000i16..3000, r in -3000i16..3000) {
            let a = Hex::new(q, r);
            for dir in Direction::ALL {
                let b = a.neighbor(dir);
                prop_assert_eq!(edge_seed(seed, a, b), edge_seed(seed, b, a));
            }
        }

        #[test]
        fn prop_connectivity_bit_reciprocal(seed: u64, q in -3000i16..3000, r in -3000i16..3000) {
            let a = Hex::new(q, r);
            let mask_a = connectivity(seed, a);
            for dir in Direction::ALL {
                let b = a.neighbor(dir);
                let mask_b = connectivity(seed, b);
                prop_assert_eq!(mask_has(mask_a, dir), mask_has(mask_b, dir.opposite()));
            }
        }
    }
}
