// SPDX-License-Identifier: Apache-2.0
//! Pure scaling and balance tables: cost, time, production, prerequisites,
//! and modifier formulas for buildings, research, and ships.
//!
//! Every function here is a pure closed-form computation over an enum tag
//! and a level/count. Nothing in this crate touches entity state, the
//! clock, or randomness — `sim-engine` is the only caller that combines
//! these tables with live state.

pub mod constants;
mod prereq;
mod rapid_fire;
mod resources;

pub use prereq::{building_prereqs, research_prereqs, Prereq};
pub use rapid_fire::rapid_fire_count;
pub use resources::Resources;

use serde::{Deserialize, Serialize};

/// A constructible building on a player's homeworld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingType {
    /// Produces metal per tick.
    MetalMine,
    /// Produces crystal per tick.
    CrystalMine,
    /// Produces deuterium per tick.
    DeutSynthesizer,
    /// Unlocks and speeds up ship construction.
    Shipyard,
    /// Unlocks research and speeds it up.
    ResearchLab,
    /// Raises fleet fuel capacity for this player's fleets.
    FuelDepot,
}

/// All building types, in a stable declaration order.
pub const ALL_BUILDINGS: [BuildingType; 6] = [
    BuildingType::MetalMine,
    BuildingType::CrystalMine,
    BuildingType::DeutSynthesizer,
    BuildingType::Shipyard,
    BuildingType::ResearchLab,
    BuildingType::FuelDepot,
];

/// A research technology on a player's tech tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResearchTech {
    /// +10% ship hull per level.
    HullTech,
    /// +10% ship shield per level.
    ShieldTech,
    /// +10% ship weapon power per level.
    WeaponTech,
    /// -10% fuel consumption rate per level.
    FuelEfficiency,
    /// +15% fuel capacity per level.
    ExtendedTanks,
    /// +20% harvest rate per level.
    HarvestTech,
    /// -1 move-cooldown tick per level, saturating at 0.
    Navigation,
    /// -5% recall emergency-jump damage chance per level.
    EmergencyJump,
}

/// All research techs, in a stable declaration order.
pub const ALL_RESEARCH: [ResearchTech; 8] = [
    ResearchTech::HullTech,
    ResearchTech::ShieldTech,
    ResearchTech::WeaponTech,
    ResearchTech::FuelEfficiency,
    ResearchTech::ExtendedTanks,
    ResearchTech::HarvestTech,
    ResearchTech::Navigation,
    ResearchTech::EmergencyJump,
];

/// A ship hull class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShipClass {
    /// Always unlocked; the starter hull.
    Scout,
    /// Cargo-focused hull for harvesting.
    Harvester,
    /// Fast, lightly armed hull; strong vs. slow cargo hulls.
    Corvette,
    /// Balanced mid-weight combat hull.
    Frigate,
    /// Heavy combat hull.
    Cruiser,
    /// Capital combat hull.
    Battleship,
    /// Bulk cargo hull for colonization logistics.
    ColonyHauler,
}

/// All ship classes, in a stable declaration order.
pub const ALL_SHIP_CLASSES: [ShipClass; 7] = [
    ShipClass::Scout,
    ShipClass::Harvester,
    ShipClass::Corvette,
    ShipClass::Frigate,
    ShipClass::Cruiser,
    ShipClass::Battleship,
    ShipClass::ColonyHauler,
];

/// Base per-unit stats for a ship class before research modifiers.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ShipStats {
    /// Base maximum hull points.
    pub hull_max: u32,
    /// Base maximum shield points.
    pub shield_max: u32,
    /// Base weapon power (damage per shot before variance).
    pub weapon_power: u32,
    /// Base speed; higher is faster (lower move cooldown).
    pub speed: u32,
    /// Base fuel capacity contributed per ship.
    pub base_fuel: u32,
    /// Cargo capacity contributed per ship.
    pub cargo_capacity: u32,
    /// Base build time in ticks at shipyard level 0.
    pub build_time_base: u32,
}

const fn ship_stats_table(class: ShipClass) -> ShipStats {
    match class {
        ShipClass::Scout => ShipStats {
            hull_max: 400,
            shield_max: 10,
            weapon_power: 5,
            speed: 12_000,
            base_fuel: 500,
            cargo_capacity: 5_000,
            build_time_base: 20,
        },
        ShipClass::Harvester => ShipStats {
            hull_max: 1_200,
            shield_max: 20,
            weapon_power: 1,
            speed: 6_000,
            base_fuel: 800,
            cargo_capacity: 20_000,
            build_time_base: 60,
        },
        ShipClass::Corvette => ShipStats {
            hull_max: 800,
            shield_max: 25,
            weapon_power: 25,
            speed: 10_000,
            base_fuel: 400,
            cargo_capacity: 2_000,
            build_time_base: 80,
        },
        ShipClass::Frigate => ShipStats {
            hull_max: 2_200,
            shield_max: 60,
            weapon_power: 60,
            speed: 7_000,
            base_fuel: 700,
            cargo_capacity: 3_000,
            build_time_base: 180,
        },
        ShipClass::Cruiser => ShipStats {
            hull_max: 5_000,
            shield_max: 150,
            weapon_power: 140,
            speed: 5_000,
            base_fuel: 1_200,
            cargo_capacity: 4_000,
            build_time_base: 420,
        },
        ShipClass::Battleship => ShipStats {
            hull_max: 12_000,
            shield_max: 400,
            weapon_power: 350,
            speed: 3_000,
            base_fuel: 2_000,
            cargo_capacity: 5_000,
            build_time_base: 900,
        },
        ShipClass::ColonyHauler => ShipStats {
            hull_max: 1_500,
            shield_max: 15,
            weapon_power: 0,
            speed: 4_000,
            base_fuel: 1_000,
            cargo_capacity: 50_000,
            build_time_base: 300,
        },
    }
}

/// Base stats for `class`, before any research modifier is applied.
#[must_use]
pub fn ship_stats(class: ShipClass) -> ShipStats {
    ship_stats_table(class)
}

/// The research tech (and minimum level) required to unlock building
/// `class`, or `None` if it is always unlocked (only `Scout`, per spec).
#[must_use]
pub fn ship_unlock_requirement(class: ShipClass) -> Option<(ResearchTech, u32)> {
    match class {
        ShipClass::Scout => None,
        ShipClass::Harvester => Some((ResearchTech::HarvestTech, 1)),
        ShipClass::Corvette => Some((ResearchTech::WeaponTech, 1)),
        ShipClass::Frigate => Some((ResearchTech::WeaponTech, 3)),
        ShipClass::Cruiser => Some((ResearchTech::HullTech, 5)),
        ShipClass::Battleship => Some((ResearchTech::HullTech, 10)),
        ShipClass::ColonyHauler => Some((ResearchTech::ExtendedTanks, 2)),
    }
}

fn base_building_cost(building: BuildingType) -> Resources {
    match building {
        BuildingType::MetalMine => Resources::new(60, 15, 0),
        BuildingType::CrystalMine => Resources::new(48, 24, 0),
        BuildingType::DeutSynthesizer => Resources::new(225, 75, 0),
        BuildingType::Shipyard => Resources::new(400, 200, 100),
        BuildingType::ResearchLab => Resources::new(200, 400, 200),
        BuildingType::FuelDepot => Resources::new(1_000, 400, 0),
    }
}

fn base_building_time(building: BuildingType) -> u32 {
    match building {
        BuildingType::MetalMine => 20,
        BuildingType::CrystalMine => 25,
        BuildingType::DeutSynthesizer => 30,
        BuildingType::Shipyard => 60,
        BuildingType::ResearchLab => 90,
        BuildingType::FuelDepot => 45,
    }
}

fn base_building_production(building: BuildingType) -> u32 {
    match building {
        BuildingType::MetalMine => 30,
        BuildingType::CrystalMine => 18,
        BuildingType::DeutSynthesizer => 10,
        BuildingType::Shipyard | BuildingType::ResearchLab | BuildingType::FuelDepot => 0,
    }
}

/// Cost to reach `target_level` (the level being built toward, starting
/// from `target_level - 1`). Closed-form: `base × 1.5^(target_level - 1)`
/// per resource component, rounded to the nearest unit.
#[must_use]
pub fn building_cost(building: BuildingType, target_level: u32) -> Resources {
    let base = base_building_cost(building);
    base.scale(growth_factor(1.5, target_level.saturating_sub(1)))
}

/// Ticks required to construct `target_level`: `base × level × 1.5^level`.
#[must_use]
pub fn building_time(building: BuildingType, target_level: u32) -> u32 {
    let base = f64::from(base_building_time(building));
    let level = f64::from(target_level);
    round_to_u32(base * level * growth_factor(1.5, target_level))
}

/// Production of `building` at `level` for one tick: `base × level ×
/// 1.1^level`. Zero for buildings with no per-tick output (shipyard,
/// research lab, fuel depot).
#[must_use]
pub fn building_production_per_tick(building: BuildingType, level: u32) -> u32 {
    if level == 0 {
        return 0;
    }
    let base = f64::from(base_building_production(building));
    let level_f = f64::from(level);
    round_to_u32(base * level_f * growth_factor(1.1, level))
}

fn base_research_cost(tech: ResearchTech) -> Resources {
    match tech {
        ResearchTech::HullTech => Resources::new(800, 400, 200),
        ResearchTech::ShieldTech => Resources::new(600, 600, 200),
        ResearchTech::WeaponTech => Resources::new(700, 500, 150),
        ResearchTech::FuelEfficiency => Resources::new(400, 200, 600),
        ResearchTech::ExtendedTanks => Resources::new(500, 300, 400),
        ResearchTech::HarvestTech => Resources::new(350, 350, 100),
        ResearchTech::Navigation => Resources::new(300, 150, 300),
        ResearchTech::EmergencyJump => Resources::new(600, 400, 500),
    }
}

fn base_research_time(tech: ResearchTech) -> u32 {
    match tech {
        ResearchTech::HullTech | ResearchTech::ShieldTech | ResearchTech::WeaponTech => 60,
        ResearchTech::FuelEfficiency => 45,
        ResearchTech::ExtendedTanks => 50,
        ResearchTech::HarvestTech => 40,
        ResearchTech::Navigation => 35,
        ResearchTech::EmergencyJump => 55,
    }
}

/// Resource cost to reach `target_level`, same `1.5^(level-1)` closed form
/// as building cost.
#[must_use]
pub fn research_cost(tech: ResearchTech, target_level: u32) -> Resources {
    let base = base_research_cost(tech);
    base.scale(growth_factor(1.5, target_level.saturating_sub(1)))
}

/// Fragment cost (a currency separate from metal/crystal/deut, awarded by
/// combat loot) to reach `target_level`.
#[must_use]
pub fn research_fragment_cost(target_level: u32) -> u32 {
    5 * target_level
}

/// Ticks required to research `target_level`: `base × level × 1.5^level`.
#[must_use]
pub fn research_time(tech: ResearchTech, target_level: u32) -> u32 {
    let base = f64::from(base_research_time(tech));
    let level = f64::from(target_level);
    round_to_u32(base * level * growth_factor(1.5, target_level))
}

/// Per-unit build time for `class`, given the owner's shipyard level:
/// `base / (1 + 0.1 × shipyard_level)`.
#[must_use]
pub fn ship_build_time(class: ShipClass, shipyard_level: u32) -> u32 {
    let base = f64::from(ship_stats(class).build_time_base);
    let divisor = 1.0 + 0.1 * f64::from(shipyard_level);
    round_to_u32(base / divisor).max(1)
}

/// Resource cost for one unit of `class`, a flat multiple of its base stats.
#[must_use]
pub fn ship_unit_cost(class: ShipClass) -> Resources {
    match class {
        ShipClass::Scout => Resources::new(2_000, 1_000, 500),
        ShipClass::Harvester => Resources::new(3_500, 1_500, 500),
        ShipClass::Corvette => Resources::new(4_000, 2_000, 1_000),
        ShipClass::Frigate => Resources::new(9_000, 5_000, 2_500),
        ShipClass::Cruiser => Resources::new(20_000, 12_000, 6_000),
        ShipClass::Battleship => Resources::new(45_000, 30_000, 15_000),
        ShipClass::ColonyHauler => Resources::new(15_000, 8_000, 4_000),
    }
}

/// Per-level multiplicative modifier (fixed-point, ×1000) applied to hull,
/// shield, and weapon power: `+10%` per level of the matching tech.
#[must_use]
pub fn combat_stat_modifier_milli(level: u32) -> u32 {
    1_000 + 100 * level
}

/// `-10%` fuel consumption rate per level of `FuelEfficiency`, fixed-point
/// ×1000, floored at 100 (never free travel).
#[must_use]
pub fn fuel_rate_modifier_milli(level: u32) -> u32 {
    1_000u32.saturating_sub(100 * level).max(100)
}

/// `+15%` fuel capacity per level of `ExtendedTanks`, fixed-point ×1000.
#[must_use]
pub fn extended_tanks_modifier_milli(level: u32) -> u32 {
    1_000 + 150 * level
}

/// `+10%` fuel depot output per level of the fuel depot building itself
/// (distinct from `FuelDepotTech`, which additionally compounds).
#[must_use]
pub fn fuel_depot_modifier_milli(level: u32) -> u32 {
    1_000 + 100 * level
}

/// `+20%` harvest rate per level of `HarvestTech`, fixed-point ×1000.
#[must_use]
pub fn harvest_rate_modifier_milli(level: u32) -> u32 {
    1_000 + 200 * level
}

/// `-1` move-cooldown tick per level of `Navigation`, saturating at 0.
#[must_use]
pub fn navigation_cooldown_reduction(level: u32) -> u32 {
    level
}

/// `-5%` recall emergency-jump damage chance per level, fixed-point ×1000,
/// floored at 0.
#[must_use]
pub fn emergency_jump_reduction_milli(level: u32) -> u32 {
    (50 * level).min(1_000)
}

fn growth_factor(base: f64, exponent: u32) -> f64 {
    base.powi(exponent as i32)
}

fn round_to_u32(value: f64) -> u32 {
    value.round().clamp(0.0, f64::from(u32::MAX)) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn building_cost_increases_monotonically() {
        let mut prev = building_cost(BuildingType::MetalMine, 1);
        for level in 2..10 {
            let next = building_cost(BuildingType::MetalMine, level);
            assert!(next.metal > prev.metal);
            prev = next;
        }
    }

    #[test]
    fn scout_is_always_unlocked() {
        assert_eq!(ship_unlock_requirement(ShipClass::Scout), None);
    }

    #[test]
    fn other_classes_are_gated() {
        for class in ALL_SHIP_CLASSES {
            if class != ShipClass::Scout {
                assert!(ship_unlock_requirement(class).is_some());
            }
        }
    }

    #[test]
    fn ship_build_time_shrinks_with_shipyard_level() {
        let t0 = ship_build_time(ShipClass::Scout, 0);
        let t10 = ship_build_time(ShipClass::Scout, 10);
        assert!(t10 < t0);
    }

    #[test]
    fn navigation_reduction_saturates_conceptually_at_caller_side() {
        assert_eq!(navigation_cooldown_reduction(0), 0);
        assert_eq!(navigation_cooldown_reduction(5), 5);
    }

    #[test]
    fn fuel_rate_modifier_floors_at_100() {
        assert_eq!(fuel_rate_modifier_milli(20), 100);
    }
}
