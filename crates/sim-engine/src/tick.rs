// SPDX-License-Identifier: Apache-2.0
//! The tick dispatcher: the eight ordered phases run once per tick, plus the
//! `apply_command` entry point sessions call between ticks.

use hex_geom::{Direction, Hex};
use sim_model::{
    Event, EventKind, FleetId, FleetStatus, NpcFleetId, PlayerId, Ship, ShipQueue, World,
};
use worldgen::{NpcBehavior, Prng};

use crate::combat;
use crate::commands::{self, Command, CommandError};
use crate::projection;

const PATROL_MOVE_COOLDOWN: u32 = 2;
const NPC_SEED_SALT: u64 = 0xD1B5_4A32_D192_ED03;
const PATROL_SEED_SALT: u64 = 0x1656_67B1_9E37_79F9;

/// Owns the authoritative world and drives it one tick or one command at a
/// time.
#[derive(Debug, Default)]
pub struct Engine {
    world: World,
}

/// Everything a tick produced, handed back to the caller to broadcast.
#[derive(Debug, Clone)]
pub struct TickOutcome {
    /// The tick number that just completed.
    pub tick: u64,
    /// Every event emitted during this tick, in emission order.
    pub events: Vec<Event>,
}

impl Engine {
    /// Wraps an already-loaded world.
    #[must_use]
    pub fn new(world: World) -> Self {
        Self { world }
    }

    /// Read access to the world, for projections and checkpoint flushes.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Mutable access to the world, for checkpoint loading and dirty-set
    /// clearing after a flush.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Applies one session's command immediately, independent of the tick
    /// loop.
    pub fn apply_command(&mut self, player_id: PlayerId, command: Command) -> Result<(), CommandError> {
        commands::apply(&mut self.world, player_id, command)
    }

    /// Advances the simulation by exactly one tick, running all eight
    /// phases in order, and returns the tick's event batch.
    pub fn run_tick(&mut self) -> TickOutcome {
        self.world.drain_events();
        self.world.current_tick += 1;

        phase_movement(&mut self.world);
        phase_combat(&mut self.world);
        phase_harvesting(&mut self.world);
        phase_sector_regen(&mut self.world);
        phase_npc_behavior(&mut self.world);
        phase_homeworlds_and_queues(&mut self.world);
        phase_salvage_despawn(&mut self.world);
        phase_cooldowns(&mut self.world);

        TickOutcome {
            tick: self.world.current_tick,
            events: self.world.drain_events(),
        }
    }
}

// Phase 1: movement. -------------------------------------------------------

fn phase_movement(world: &mut World) {
    let moving: Vec<FleetId> = world
        .fleets
        .iter()
        .filter(|(_, f)| f.status == FleetStatus::Moving)
        .map(|(id, _)| *id)
        .collect();
    for fleet_id in moving {
        step_moving_fleet(world, fleet_id);
    }
}

fn step_moving_fleet(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else { return };
    if fleet.move_cooldown > 1 {
        if let Some(mut f) = world.dirty_fleet(fleet_id) {
            f.move_cooldown -= 1;
        }
        return;
    }
    let Some(target) = fleet.move_target else { return };
    let owner = fleet.owner;
    let first_visit = world.is_first_visit(owner, target);

    if let Some(mut f) = world.dirty_fleet(fleet_id) {
        f.location = target;
        f.move_target = None;
        f.move_cooldown = 0;
        f.status = FleetStatus::Idle;
        f.idle_ticks = 0;
    }

    let mask = worldgen::connectivity(world.world_seed, target);
    for dir in Direction::ALL {
        if hex_geom::mask_has(mask, dir) {
            world.record_explored_edge(owner, target, target.neighbor(dir));
        }
    }
    world.emit(EventKind::SectorEntered { fleet_id, hex: target, first_visit });

    let is_homeworld = world.players.get(&owner).is_some_and(|p| p.homeworld == target);
    if is_homeworld {
        dock_arriving_fleet(world, fleet_id);
    }

    ensure_npc_spawned(world, target);
    maybe_initiate_combat_for_fleet(world, fleet_id);
}

/// Folds as many of a newly-arrived fleet's ships as the docked pool has
/// room for into the owner's pool. Leaves the fleet (partially) active if
/// the pool fills before every ship is docked.
fn dock_arriving_fleet(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else { return };
    let owner = fleet.owner;
    let Some(player) = world.players.get(&owner) else { return };
    let room = balance::constants::DOCKED_POOL_CAP.saturating_sub(player.docked_ships.len());
    if room == 0 {
        return;
    }

    let moved: Vec<Ship> = {
        let Some(mut fleet) = world.dirty_fleet(fleet_id) else { return };
        let take_n = room.min(fleet.live_ships().len());
        if take_n == 0 {
            return;
        }
        let moved: Vec<Ship> = fleet.ships.drain(0..take_n).collect();
        fleet.ship_count -= take_n;
        if !fleet.has_ships() {
            fleet.status = FleetStatus::Docked;
        }
        moved
    };

    if let Some(mut player) = world.dirty_player(owner) {
        player.docked_ships.extend(moved);
    }
}

/// Materializes a template's NPC presence at `hex` into a live fleet, if
/// nothing is already spawned there and the zone's respawn delay has
/// elapsed since it was last cleared.
fn ensure_npc_spawned(world: &mut World, hex: Hex) {
    if world.npc_fleets.values().any(|n| n.location == hex) {
        return;
    }
    if let Some(overlay) = world.sectors.get(&hex) {
        if let Some(cleared_tick) = overlay.npc_cleared_tick {
            let delay = balance::constants::zone_respawn_delay(hex.zone());
            if world.current_tick.saturating_sub(cleared_tick) < delay {
                return;
            }
        }
    }
    let template = worldgen::generate_sector(world.world_seed, hex);
    let Some(npc_template) = template.npc else { return };

    let seed = worldgen::seed_for(world.world_seed, hex) ^ world.current_tick.wrapping_mul(NPC_SEED_SALT);
    let mut prng = Prng::from_seed_u64(seed);
    let count = prng
        .next_int(i32::from(npc_template.count_range.0), i32::from(npc_template.count_range.1))
        .max(1) as u32;
    let class = projection::ship_class_for_npc(npc_template.class);

    let mut ships = Vec::with_capacity(count as usize);
    for _ in 0..count {
        let ship_id = world.alloc_ship_id();
        let mut ship = Ship::new_for_class(ship_id, class, 0, 0, 0);
        scale_npc_ship(&mut ship, npc_template.stat_multiplier_milli);
        ships.push(ship);
    }
    let ship_count = ships.len();
    let npc_id = NpcFleetId::from(world.alloc_id());
    world.npc_fleets.insert(
        npc_id,
        sim_model::NpcFleet {
            id: npc_id,
            location: hex,
            ships,
            ship_count,
            class: npc_template.class,
            behavior: npc_template.behavior,
            home_sector: hex,
            patrol_cooldown: 0,
            in_combat: false,
        },
    );
}

fn scale_npc_ship(ship: &mut Ship, milli: u32) {
    ship.hull_max = (u64::from(ship.hull_max) * u64::from(milli) / 1000) as u32;
    ship.hull = ship.hull_max;
    ship.shield_max = (u64::from(ship.shield_max) * u64::from(milli) / 1000) as u32;
    ship.shield = ship.shield_max;
    ship.weapon_power = (u64::from(ship.weapon_power) * u64::from(milli) / 1000) as u32;
}

fn maybe_initiate_combat_for_fleet(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else { return };
    if fleet.status == FleetStatus::InCombat {
        return;
    }
    let hex = fleet.location;
    let target = world
        .npc_fleets
        .iter()
        .find(|(_, n)| n.location == hex && n.has_ships() && !n.in_combat && !matches!(n.behavior, NpcBehavior::Passive))
        .map(|(id, n)| (*id, n.class, n.live_ships().len() as u32, n.total_value()));
    if let Some((npc_id, class, count, value)) = target {
        let combat_id = combat::find_or_create_combat(world, hex);
        combat::enroll_player_fleet(world, combat_id, fleet_id);
        combat::enroll_npc_fleet(world, combat_id, npc_id, class, count, value);
    }
}

// Phase 2: combat. ----------------------------------------------------------

fn phase_combat(world: &mut World) {
    let combat_ids: Vec<_> = world.combats.keys().copied().collect();
    for id in combat_ids {
        if world.combats.contains_key(&id) {
            combat::resolve_round(world, id);
        }
    }
}

// Phase 3: harvesting. -------------------------------------------------------

fn phase_harvesting(world: &mut World) {
    let harvesting: Vec<FleetId> = world
        .fleets
        .iter()
        .filter(|(_, f)| f.status == FleetStatus::Harvesting)
        .map(|(id, _)| *id)
        .collect();
    for fleet_id in harvesting {
        harvest_one_fleet(world, fleet_id);
    }
}

fn harvest_one_fleet(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else { return };
    let owner = fleet.owner;
    let hex = fleet.location;
    let harvest_weight: u32 = fleet
        .live_ships()
        .iter()
        .map(|s| if s.class == balance::ShipClass::Harvester { 3 } else { 1 })
        .sum();
    let Some(player) = world.players.get(&owner) else { return };
    let harvest_level = player.research_level(balance::ResearchTech::HarvestTech);
    let power = u64::from(harvest_weight)
        * u64::from(balance::constants::HARVEST_BASE_PER_SHIP)
        * u64::from(balance::harvest_rate_modifier_milli(harvest_level))
        / 1000;
    let template = worldgen::generate_sector(world.world_seed, hex);

    let mut any_harvested = false;
    for (i, &resource) in worldgen::RESOURCE_ORDER.iter().enumerate() {
        let density = world
            .sectors
            .get(&hex)
            .and_then(|o| o.densities[i])
            .unwrap_or_else(|| template.density(resource));
        if density == worldgen::Density::None {
            continue;
        }
        let Some(fleet) = world.fleets.get(&fleet_id) else { return };
        let room = fleet.remaining_cargo_room();
        if room == 0 {
            break;
        }
        let amount = (power * u64::from(density.multiplier())).min(room);
        if amount == 0 {
            continue;
        }
        any_harvested = true;

        if let Some(mut f) = world.dirty_fleet(fleet_id) {
            f.add_cargo_capped(resource, amount);
            f.idle_ticks = 0;
        }

        let accum_delta = amount.min(u64::from(u32::MAX)) as u32;
        let mut sector = world.dirty_sector(hex);
        let threshold = density.depletion_threshold();
        let new_accum = sector.harvest_accum[i].saturating_add(accum_delta);
        if threshold > 0 && new_accum >= threshold {
            sector.densities[i] = Some(density.downgrade());
            sector.harvest_accum[i] = 0;
        } else {
            sector.harvest_accum[i] = new_accum;
        }
        drop(sector);

        world.emit(EventKind::ResourceHarvested { fleet_id, resource, amount });
    }

    if !any_harvested {
        if let Some(mut f) = world.dirty_fleet(fleet_id) {
            f.status = FleetStatus::Idle;
        }
    }
}

// Phase 4: sector regeneration. ----------------------------------------------

fn phase_sector_regen(world: &mut World) {
    let hexes: Vec<Hex> = world.sectors.keys().copied().collect();
    for hex in hexes {
        if world.fleets.values().any(|f| f.location == hex) {
            continue;
        }
        regen_one_sector(world, hex);
    }
}

fn regen_one_sector(world: &mut World, hex: Hex) {
    let template = worldgen::generate_sector(world.world_seed, hex);
    let mut guard = world.dirty_sector(hex);
    for (i, &resource) in worldgen::RESOURCE_ORDER.iter().enumerate() {
        if guard.harvest_accum[i] == 0 {
            continue;
        }
        let decremented = guard.harvest_accum[i].saturating_sub(balance::constants::SECTOR_REGEN_PER_TICK);
        guard.harvest_accum[i] = decremented;
        if decremented == 0 {
            let natural = template.density(resource);
            let current = guard.densities[i].unwrap_or(natural);
            let upgraded = current.upgrade();
            guard.densities[i] = if upgraded == natural { None } else { Some(upgraded) };
        }
    }
}

// Phase 5: NPC behavior. ------------------------------------------------------

fn phase_npc_behavior(world: &mut World) {
    clear_elapsed_npc_cleared_ticks(world);

    let npc_ids: Vec<NpcFleetId> = world.npc_fleets.keys().copied().collect();
    for npc_id in npc_ids {
        step_patrol_npc(world, npc_id);
        maybe_initiate_combat_for_npc(world, npc_id);
    }
}

fn clear_elapsed_npc_cleared_ticks(world: &mut World) {
    let now = world.current_tick;
    let hexes: Vec<Hex> = world
        .sectors
        .iter()
        .filter(|(hex, ov)| {
            ov.npc_cleared_tick
                .is_some_and(|cleared| now.saturating_sub(cleared) >= balance::constants::zone_respawn_delay(hex.zone()))
        })
        .map(|(hex, _)| *hex)
        .collect();
    for hex in hexes {
        let mut guard = world.dirty_sector(hex);
        guard.npc_cleared_tick = None;
    }
}

fn step_patrol_npc(world: &mut World, npc_id: NpcFleetId) {
    let Some(npc) = world.npc_fleets.get(&npc_id) else { return };
    if !matches!(npc.behavior, NpcBehavior::Patrol) || npc.in_combat {
        return;
    }
    if npc.patrol_cooldown > 0 {
        if let Some(n) = world.npc_fleets.get_mut(&npc_id) {
            n.patrol_cooldown -= 1;
        }
        return;
    }
    let location = npc.location;
    let options: Vec<Hex> = worldgen::neighbors_connected(world.world_seed, location)
        .into_iter()
        .flatten()
        .collect();
    if options.is_empty() {
        return;
    }
    let seed = worldgen::seed_for(world.world_seed, location)
        ^ world.current_tick.wrapping_mul(PATROL_SEED_SALT)
        ^ npc_id.get();
    let mut prng = Prng::from_seed_u64(seed);
    let idx = prng.next_int(0, options.len() as i32 - 1) as usize;
    if let Some(n) = world.npc_fleets.get_mut(&npc_id) {
        n.location = options[idx];
        n.patrol_cooldown = PATROL_MOVE_COOLDOWN;
    }
}

fn maybe_initiate_combat_for_npc(world: &mut World, npc_id: NpcFleetId) {
    let Some(npc) = world.npc_fleets.get(&npc_id) else { return };
    if npc.in_combat || matches!(npc.behavior, NpcBehavior::Passive) {
        return;
    }
    let hex = npc.location;
    let class = npc.class;
    let count = npc.live_ships().len() as u32;
    let value = npc.total_value();
    let Some(fleet_id) = world
        .fleets
        .values()
        .find(|f| f.location == hex && f.has_ships() && f.status != FleetStatus::InCombat)
        .map(|f| f.id)
    else {
        return;
    };
    let combat_id = combat::find_or_create_combat(world, hex);
    combat::enroll_player_fleet(world, combat_id, fleet_id);
    combat::enroll_npc_fleet(world, combat_id, npc_id, class, count, value);
}

// Phase 6: homeworlds and queues. ---------------------------------------------

fn phase_homeworlds_and_queues(world: &mut World) {
    let player_ids: Vec<PlayerId> = world.players.keys().copied().collect();
    for pid in player_ids {
        accrue_production(world, pid);
        complete_building_queue(world, pid);
        complete_research_queue(world, pid);
        complete_ship_queue(world, pid);
    }
}

fn accrue_production(world: &mut World, pid: PlayerId) {
    let Some(player) = world.players.get(&pid) else { return };
    let metal = balance::building_production_per_tick(
        balance::BuildingType::MetalMine,
        player.building_level(balance::BuildingType::MetalMine),
    );
    let crystal = balance::building_production_per_tick(
        balance::BuildingType::CrystalMine,
        player.building_level(balance::BuildingType::CrystalMine),
    );
    let deut = balance::building_production_per_tick(
        balance::BuildingType::DeutSynthesizer,
        player.building_level(balance::BuildingType::DeutSynthesizer),
    );
    if metal == 0 && crystal == 0 && deut == 0 {
        return;
    }
    if let Some(mut player) = world.dirty_player(pid) {
        player.resources = player
            .resources
            .add(balance::Resources::new(u64::from(metal), u64::from(crystal), u64::from(deut)));
    }
}

fn complete_building_queue(world: &mut World, pid: PlayerId) {
    let Some(player) = world.players.get(&pid) else { return };
    let Some(queue) = player.building_queue else { return };
    if world.current_tick < queue.end_tick {
        return;
    }
    let building = queue.building;
    let new_level = queue.target_level;
    if let Some(mut player) = world.dirty_player(pid) {
        player.buildings.insert(building, new_level);
        player.building_queue = None;
    }
    if building == balance::BuildingType::FuelDepot {
        recompute_owner_fuel_max(world, pid);
    }
    world.emit(EventKind::BuildingCompleted { player_id: pid, building, new_level });
}

fn complete_research_queue(world: &mut World, pid: PlayerId) {
    let Some(player) = world.players.get(&pid) else { return };
    let Some(queue) = player.research_queue else { return };
    if world.current_tick < queue.end_tick {
        return;
    }
    let tech = queue.tech;
    let new_level = queue.target_level;
    if let Some(mut player) = world.dirty_player(pid) {
        player.research.insert(tech, new_level);
        player.research_queue = None;
    }
    if tech == balance::ResearchTech::ExtendedTanks {
        recompute_owner_fuel_max(world, pid);
    }
    world.emit(EventKind::ResearchCompleted { player_id: pid, tech, new_level });
}

fn complete_ship_queue(world: &mut World, pid: PlayerId) {
    let Some(player) = world.players.get(&pid) else { return };
    let Some(queue) = player.ship_queue else { return };
    if world.current_tick < queue.end_tick {
        return;
    }
    if player.docked_ships.len() >= balance::constants::DOCKED_POOL_CAP {
        return;
    }
    let class = queue.class;
    let remaining = queue.remaining_after_current();
    let hull_level = player.research_level(balance::ResearchTech::HullTech);
    let shield_level = player.research_level(balance::ResearchTech::ShieldTech);
    let weapon_level = player.research_level(balance::ResearchTech::WeaponTech);
    let shipyard_level = player.building_level(balance::BuildingType::Shipyard);
    let now = world.current_tick;

    let ship_id = world.alloc_ship_id();
    let ship = Ship::new_for_class(ship_id, class, hull_level, shield_level, weapon_level);
    let next_queue = if remaining > 0 {
        let unit_time = balance::ship_build_time(class, shipyard_level);
        Some(ShipQueue {
            class,
            requested_count: queue.requested_count,
            built: queue.built + 1,
            start_tick: now,
            end_tick: now + u64::from(unit_time),
        })
    } else {
        None
    };

    if let Some(mut player) = world.dirty_player(pid) {
        player.docked_ships.push(ship);
        player.ship_queue = next_queue;
    }
    world.emit(EventKind::ShipCompleted { player_id: pid, class });
}

fn recompute_owner_fuel_max(world: &mut World, pid: PlayerId) {
    let fleet_ids: Vec<FleetId> = world
        .fleets
        .iter()
        .filter(|(_, f)| f.owner == pid)
        .map(|(id, _)| *id)
        .collect();
    for fleet_id in fleet_ids {
        commands::recompute_fuel_max(world, fleet_id);
    }
}

// Phase 7: salvage despawn. ---------------------------------------------------

fn phase_salvage_despawn(world: &mut World) {
    let now = world.current_tick;
    let hexes: Vec<Hex> = world
        .sectors
        .iter()
        .filter(|(_, ov)| ov.salvage.is_some_and(|s| s.despawn_tick <= now))
        .map(|(hex, _)| *hex)
        .collect();
    for hex in hexes {
        let mut guard = world.dirty_sector(hex);
        guard.salvage = None;
    }
}

// Phase 8: cooldowns. ----------------------------------------------------------

fn phase_cooldowns(world: &mut World) {
    let fleet_ids: Vec<FleetId> = world.fleets.keys().copied().collect();
    for fleet_id in fleet_ids {
        step_fleet_cooldowns(world, fleet_id);
    }
}

fn step_fleet_cooldowns(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else { return };
    if fleet.action_cooldown == 0 && fleet.status == FleetStatus::InCombat {
        return;
    }
    let Some(mut fleet) = world.dirty_fleet(fleet_id) else { return };
    if fleet.action_cooldown > 0 {
        fleet.action_cooldown -= 1;
    }
    if fleet.status != FleetStatus::InCombat {
        fleet.idle_ticks += 1;
        if fleet.idle_ticks >= balance::constants::SHIELD_REGEN_IDLE_THRESHOLD {
            for ship in fleet.live_ships_mut() {
                ship.regen_shield_milli(balance::constants::SHIELD_REGEN_FRACTION_MILLI);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_model::{Fleet, Player};
    use std::collections::HashMap;

    const SEED: u64 = 42;

    fn test_world() -> World {
        World::new(SEED)
    }

    fn insert_player(world: &mut World, homeworld: Hex) -> PlayerId {
        let id = PlayerId::from(world.alloc_id());
        world.players.insert(
            id,
            Player {
                id,
                name: "nav".to_owned(),
                resources: balance::Resources::default(),
                fragments: 0,
                homeworld,
                buildings: HashMap::new(),
                research: HashMap::new(),
                building_queue: None,
                research_queue: None,
                ship_queue: None,
                auth_digest: None,
                created_at: 0,
                last_login_at: 0,
                docked_ships: Vec::new(),
                components: HashMap::new(),
            },
        );
        id
    }

    fn insert_idle_fleet(world: &mut World, owner: PlayerId, location: Hex, class: balance::ShipClass) -> FleetId {
        let fleet_id = FleetId::from(world.alloc_id());
        let ship_id = world.alloc_ship_id();
        let ship = Ship::new_for_class(ship_id, class, 0, 0, 0);
        let fuel_max = balance::ship_stats(class).base_fuel;
        world.fleets.insert(
            fleet_id,
            Fleet {
                id: fleet_id,
                owner,
                location,
                status: FleetStatus::Idle,
                ships: vec![ship],
                ship_count: 1,
                cargo: balance::Resources::default(),
                fuel: fuel_max,
                fuel_max,
                move_cooldown: 0,
                action_cooldown: 0,
                move_target: None,
                idle_ticks: 0,
            },
        );
        fleet_id
    }

    #[test]
    fn run_tick_advances_the_tick_counter_and_reports_it_in_the_outcome() {
        let mut engine = Engine::new(test_world());
        let outcome = engine.run_tick();
        assert_eq!(outcome.tick, 1);
        assert_eq!(engine.world().current_tick, 1);
        let outcome = engine.run_tick();
        assert_eq!(outcome.tick, 2);
    }

    #[test]
    fn run_tick_with_one_remaining_cooldown_moves_a_fleet_to_its_target() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(20, 20));
        let fleet_id = insert_idle_fleet(&mut world, owner, Hex::ORIGIN, balance::ShipClass::Scout);
        let target = Hex::ORIGIN.neighbor(Direction::E);
        {
            let mut fleet = world.dirty_fleet(fleet_id).expect("fleet exists");
            fleet.status = FleetStatus::Moving;
            fleet.move_target = Some(target);
            fleet.move_cooldown = 1;
        }
        world.clear_dirty();

        let mut engine = Engine::new(world);
        let outcome = engine.run_tick();

        let fleet = &engine.world().fleets[&fleet_id];
        assert_eq!(fleet.location, target);
        assert_eq!(fleet.status, FleetStatus::Idle);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::SectorEntered { hex, .. } if hex == target)));
    }

    #[test]
    fn run_tick_with_cooldown_above_one_only_decrements_it() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(20, 20));
        let fleet_id = insert_idle_fleet(&mut world, owner, Hex::ORIGIN, balance::ShipClass::Scout);
        let target = Hex::ORIGIN.neighbor(Direction::E);
        {
            let mut fleet = world.dirty_fleet(fleet_id).expect("fleet exists");
            fleet.status = FleetStatus::Moving;
            fleet.move_target = Some(target);
            fleet.move_cooldown = 3;
        }
        world.clear_dirty();

        let mut engine = Engine::new(world);
        engine.run_tick();

        let fleet = &engine.world().fleets[&fleet_id];
        assert_eq!(fleet.move_cooldown, 2);
        assert_eq!(fleet.location, Hex::ORIGIN);
        assert_eq!(fleet.status, FleetStatus::Moving);
    }

    #[test]
    fn run_tick_harvests_cargo_from_an_overridden_rich_sector() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(20, 20));
        let hex = Hex::new(5, 5);
        let fleet_id = insert_idle_fleet(&mut world, owner, hex, balance::ShipClass::Harvester);
        {
            let mut fleet = world.dirty_fleet(fleet_id).expect("fleet exists");
            fleet.status = FleetStatus::Harvesting;
        }
        {
            let mut sector = world.dirty_sector(hex);
            sector.densities[0] = Some(worldgen::Density::Pristine);
        }
        world.clear_dirty();

        let mut engine = Engine::new(world);
        let outcome = engine.run_tick();

        let fleet = &engine.world().fleets[&fleet_id];
        assert!(fleet.cargo.metal > 0 || fleet.cargo.crystal > 0 || fleet.cargo.deut > 0);
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::ResourceHarvested { fleet_id: f, .. } if f == fleet_id)));
    }

    #[test]
    fn run_tick_completes_a_building_queue_whose_end_tick_has_passed() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(20, 20));
        {
            let mut player = world.dirty_player(owner).expect("player exists");
            player.building_queue = Some(sim_model::BuildQueue {
                building: balance::BuildingType::MetalMine,
                target_level: 1,
                start_tick: 0,
                end_tick: 0,
            });
        }
        world.clear_dirty();

        let mut engine = Engine::new(world);
        let outcome = engine.run_tick();

        let player = &engine.world().players[&owner];
        assert_eq!(player.building_queue, None);
        assert_eq!(player.buildings.get(&balance::BuildingType::MetalMine), Some(&1));
        assert!(outcome
            .events
            .iter()
            .any(|e| matches!(e.kind, EventKind::BuildingCompleted { player_id, .. } if player_id == owner)));
    }

    #[test]
    fn run_tick_restores_shield_once_a_fleet_has_been_idle_past_the_threshold() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(20, 20));
        let hex = Hex::new(8, 8);
        let fleet_id = insert_idle_fleet(&mut world, owner, hex, balance::ShipClass::Scout);
        {
            let mut fleet = world.dirty_fleet(fleet_id).expect("fleet exists");
            fleet.idle_ticks = balance::constants::SHIELD_REGEN_IDLE_THRESHOLD - 1;
            let ship = &mut fleet.ships[0];
            ship.shield = 0;
        }
        world.clear_dirty();

        let mut engine = Engine::new(world);
        engine.run_tick();

        let fleet = &engine.world().fleets[&fleet_id];
        assert!(fleet.ships[0].shield > 0);
    }
}
