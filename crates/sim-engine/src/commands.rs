// SPDX-License-Identifier: Apache-2.0
//! The internal command representation and its handlers.
//!
//! This mirrors the wire command set one-for-one in shape, but carries no
//! serde or wire dependency: `sim-engine` never depends on `session-proto`
//! (see `DESIGN.md`), so the `server` binary translates a decoded wire
//! command into one of these before calling [`crate::Engine::apply_command`].

use balance::{BuildingType, ResearchTech, ShipClass};
use hex_geom::Hex;
use sim_model::{FleetId, NpcFleetId, PlayerId, ShipId, World};
use worldgen::Resource;

use crate::combat;

/// A combat target: either another player's fleet or an NPC fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackTarget {
    /// Another player's fleet.
    Player(FleetId),
    /// An NPC fleet.
    Npc(NpcFleetId),
}

/// Which single-slot production queue a `CancelBuild` targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueKind {
    /// The building upgrade queue.
    Building,
    /// The research queue.
    Research,
    /// The ship production queue.
    Ship,
}

/// One command a session may submit against a player's state between ticks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Moves a fleet to an adjacent, connected sector.
    Move {
        /// Fleet to move.
        fleet_id: FleetId,
        /// Destination hex; must be a direct neighbor of the fleet's
        /// current location with a live connectivity edge.
        target: Hex,
    },
    /// Begins harvesting at the fleet's current sector. The tick-phase
    /// harvester always works all three resources in fixed order (§4.4
    /// phase 3), so there is no per-resource selection here — only
    /// whether the sector has anything to harvest at all.
    Harvest {
        /// Fleet to harvest with.
        fleet_id: FleetId,
    },
    /// Initiates or joins combat against a target at the fleet's sector.
    Attack {
        /// Attacking fleet.
        fleet_id: FleetId,
        /// Target to engage.
        target: AttackTarget,
    },
    /// Recalls a fleet immediately to the owner's homeworld.
    Recall {
        /// Fleet to recall.
        fleet_id: FleetId,
    },
    /// Collects salvage present at the fleet's current sector.
    CollectSalvage {
        /// Fleet collecting.
        fleet_id: FleetId,
    },
    /// Queues a building upgrade.
    Build {
        /// Building to upgrade.
        building: BuildingType,
    },
    /// Queues a research upgrade.
    Research {
        /// Tech to research.
        tech: ResearchTech,
    },
    /// Queues ship production.
    BuildShip {
        /// Class to build.
        class: ShipClass,
        /// Number of units requested.
        count: u32,
    },
    /// Cancels the named in-progress queue, refunding a fraction of the
    /// remaining cost.
    CancelBuild {
        /// Queue to cancel.
        queue: QueueKind,
    },
    /// Cancels an in-progress move or harvest.
    Stop {
        /// Fleet to stop.
        fleet_id: FleetId,
    },
    /// A no-op ownership check; the unconditional per-tick projection
    /// already exposes the sector view this command would otherwise carry.
    Scan {
        /// Fleet used to prove ownership/location for the scan.
        fleet_id: FleetId,
    },
    /// Splits ships out of the docked pool into a new fleet at the
    /// homeworld.
    CreateFleet {
        /// Ships to pull from the docked pool.
        ship_ids: Vec<ShipId>,
    },
    /// Dissolves an empty-of-purpose fleet at the homeworld back into the
    /// docked pool.
    DissolveFleet {
        /// Fleet to dissolve.
        fleet_id: FleetId,
    },
    /// Moves one ship between two of the player's fleets at the same
    /// sector.
    TransferShip {
        /// Ship to move.
        ship_id: ShipId,
        /// Fleet currently holding the ship.
        from_fleet: FleetId,
        /// Fleet to receive the ship.
        to_fleet: FleetId,
    },
    /// Docks one ship from a fleet at the homeworld into the docked pool.
    DockShip {
        /// Fleet the ship currently belongs to.
        fleet_id: FleetId,
        /// Ship to dock.
        ship_id: ShipId,
    },
}

/// Every way a command can be rejected. Maps one-for-one onto the
/// 1000-series wire error codes (`session_proto::ErrorCode`); the `server`
/// binary performs that translation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// No fleet exists with that id owned by this player.
    FleetNotFound,
    /// The fleet has no live ships.
    NoShips,
    /// The fleet is enrolled in an active combat.
    InCombat,
    /// The fleet or queue slot is on cooldown.
    OnCooldown,
    /// No connectivity edge exists to the requested target.
    NoConnection,
    /// Not enough fuel for this command.
    InsufficientFuel,
    /// Nothing left to harvest or collect at this sector.
    NoResources,
    /// The fleet's cargo hold is full.
    CargoFull,
    /// The named target is not valid for this command.
    InvalidTarget,
    /// No player exists for this id.
    PlayerNotFound,
    /// A queue of this kind is already occupied.
    QueueFull,
    /// The building or research is already at `MAX_LEVEL`.
    MaxLevelReached,
    /// A prerequisite building or research level is not met.
    PrerequisitesNotMet,
    /// The player cannot afford this command's resource cost.
    Resources,
    /// The player has no research lab.
    NoResearchLab,
    /// The player lacks the fragments this command costs.
    InsufficientFragments,
    /// The requested ship class is not yet unlocked.
    ShipLocked,
    /// The player has no shipyard.
    NoShipyard,
    /// The player is at the open-fleet limit.
    FleetLimit,
    /// The fleet must be at the homeworld for this command.
    NotAtHomeworld,
    /// No queue of this kind is in progress.
    NoQueue,
    /// No ship with that id was found.
    ShipNotFound,
    /// The docked-ship pool is full.
    DockFull,
}

fn owned_fleet<'a>(
    world: &'a World,
    player_id: PlayerId,
    fleet_id: FleetId,
) -> Result<&'a sim_model::Fleet, CommandError> {
    let fleet = world.fleets.get(&fleet_id).ok_or(CommandError::FleetNotFound)?;
    if fleet.owner != player_id {
        return Err(CommandError::FleetNotFound);
    }
    Ok(fleet)
}

fn require_player<'a>(world: &'a World, player_id: PlayerId) -> Result<&'a sim_model::Player, CommandError> {
    world.players.get(&player_id).ok_or(CommandError::PlayerNotFound)
}

/// Dispatches one decoded command against `world` on behalf of `player_id`.
pub fn apply(world: &mut World, player_id: PlayerId, command: Command) -> Result<(), CommandError> {
    match command {
        Command::Move { fleet_id, target } => handle_move(world, player_id, fleet_id, target),
        Command::Harvest { fleet_id } => handle_harvest(world, player_id, fleet_id),
        Command::Attack { fleet_id, target } => combat::handle_attack(world, player_id, fleet_id, target),
        Command::Recall { fleet_id } => handle_recall(world, player_id, fleet_id),
        Command::CollectSalvage { fleet_id } => handle_collect_salvage(world, player_id, fleet_id),
        Command::Build { building } => handle_build(world, player_id, building),
        Command::Research { tech } => handle_research(world, player_id, tech),
        Command::BuildShip { class, count } => handle_build_ship(world, player_id, class, count),
        Command::CancelBuild { queue } => handle_cancel_build(world, player_id, queue),
        Command::Stop { fleet_id } => handle_stop(world, player_id, fleet_id),
        Command::Scan { fleet_id } => handle_scan(world, player_id, fleet_id),
        Command::CreateFleet { ship_ids } => handle_create_fleet(world, player_id, ship_ids),
        Command::DissolveFleet { fleet_id } => handle_dissolve_fleet(world, player_id, fleet_id),
        Command::TransferShip { ship_id, from_fleet, to_fleet } => {
            handle_transfer_ship(world, player_id, ship_id, from_fleet, to_fleet)
        }
        Command::DockShip { fleet_id, ship_id } => handle_dock_ship(world, player_id, fleet_id, ship_id),
    }
}

fn handle_move(world: &mut World, player_id: PlayerId, fleet_id: FleetId, target: Hex) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    if !fleet.has_ships() {
        return Err(CommandError::NoShips);
    }
    if fleet.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    if fleet.move_cooldown > 0 || fleet.action_cooldown > 0 {
        return Err(CommandError::OnCooldown);
    }
    let from = fleet.location;
    let mask = worldgen::connectivity(world.world_seed, from);
    let direction = from
        .neighbors()
        .iter()
        .position(|&n| n == target)
        .and_then(|i| hex_geom::Direction::from_index(i as u8))
        .ok_or(CommandError::NoConnection)?;
    if !hex_geom::mask_has(mask, direction) {
        return Err(CommandError::NoConnection);
    }
    let ship_count = fleet.live_ships().len() as u32;
    let slowest_speed = fleet
        .live_ships()
        .iter()
        .map(|s| s.speed)
        .min()
        .ok_or(CommandError::NoShips)?;
    let navigation_level = require_player(world, player_id)?.research_level(ResearchTech::Navigation);
    let fuel_efficiency_level =
        require_player(world, player_id)?.research_level(ResearchTech::FuelEfficiency);
    let fuel_cost = u64::from(ship_count) * u64::from(balance::constants::FUEL_BURN_PER_HEX_PER_SHIP)
        * u64::from(balance::fuel_rate_modifier_milli(fuel_efficiency_level))
        / 1000;
    let fuel_cost = fuel_cost.min(u64::from(u32::MAX)) as u32;
    if fleet.fuel < fuel_cost {
        return Err(CommandError::InsufficientFuel);
    }
    let move_ticks = (balance::constants::SPEED_BASIS / slowest_speed.max(1))
        .saturating_sub(balance::navigation_cooldown_reduction(navigation_level))
        .max(1);

    let mut fleet = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
    fleet.move_target = Some(target);
    fleet.status = sim_model::FleetStatus::Moving;
    fleet.move_cooldown = move_ticks;
    fleet.fuel -= fuel_cost;
    fleet.idle_ticks = 0;
    Ok(())
}

fn handle_harvest(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    if !fleet.has_ships() {
        return Err(CommandError::NoShips);
    }
    if fleet.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    if fleet.move_target.is_some() {
        return Err(CommandError::OnCooldown);
    }
    if fleet.action_cooldown > 0 {
        return Err(CommandError::OnCooldown);
    }
    if fleet.remaining_cargo_room() == 0 {
        return Err(CommandError::CargoFull);
    }
    let template = worldgen::generate_sector(world.world_seed, fleet.location);
    let override_densities = world.sectors.get(&fleet.location);
    let has_any_resource = worldgen::RESOURCE_ORDER.iter().any(|&resource| {
        let density = override_densities
            .and_then(|o| o.densities[resource.index()])
            .unwrap_or_else(|| template.density(resource));
        density != worldgen::Density::None
    });
    if !has_any_resource {
        return Err(CommandError::NoResources);
    }

    let mut fleet = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
    fleet.status = sim_model::FleetStatus::Harvesting;
    fleet.action_cooldown = balance::constants::HARVEST_COOLDOWN;
    fleet.idle_ticks = 0;
    Ok(())
}

fn handle_recall(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    if !fleet.has_ships() {
        return Err(CommandError::NoShips);
    }
    if fleet.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    let homeworld = require_player(world, player_id)?.homeworld;
    let distance = fleet.location.distance(homeworld);
    let emergency_jump_level =
        require_player(world, player_id)?.research_level(ResearchTech::EmergencyJump);
    let fuel_efficiency_level =
        require_player(world, player_id)?.research_level(ResearchTech::FuelEfficiency);
    let ship_count = fleet.live_ships().len() as u64;
    let fuel_cost = ship_count
        * u64::from(balance::constants::FUEL_BURN_PER_HEX_PER_SHIP)
        * u64::from(distance.max(0) as u32)
        * u64::from(balance::constants::RECALL_FUEL_MULTIPLIER)
        * u64::from(balance::fuel_rate_modifier_milli(fuel_efficiency_level))
        / 1000;
    let damage_chance_milli = (u32::try_from(distance.max(0)).unwrap_or(u32::MAX))
        .saturating_mul(balance::constants::RECALL_DAMAGE_CHANCE_PER_HEX_MILLI)
        .min(balance::constants::RECALL_DAMAGE_CHANCE_CAP_MILLI)
        .saturating_sub(balance::emergency_jump_reduction_milli(emergency_jump_level));

    let tick = world.current_tick;
    let mut prng = worldgen::Prng::from_seed_u64(tick ^ (fleet_id.get().wrapping_mul(0x9E37_79B9_7F4A_7C15)));

    let mut destroyed = Vec::new();
    {
        let mut fleet = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
        let fuel_cost = fuel_cost.min(u64::from(fleet.fuel)) as u32;
        fleet.fuel = fleet.fuel.saturating_sub(fuel_cost);
        for ship in fleet.live_ships_mut() {
            if !prng.chance(damage_chance_milli, 1000) {
                continue;
            }
            let percent_milli = prng.next_int(
                balance::constants::RECALL_HULL_DAMAGE_MIN_MILLI as i32,
                balance::constants::RECALL_HULL_DAMAGE_MAX_MILLI as i32,
            ) as u32;
            let damage = (u64::from(ship.hull_max) * u64::from(percent_milli) / 1000) as u32;
            ship.apply_damage(damage);
            if ship.is_destroyed() {
                destroyed.push(ship.id);
            }
        }
        fleet.compact_ships();
        fleet.location = homeworld;
        fleet.move_target = None;
        fleet.move_cooldown = 0;
        fleet.status = sim_model::FleetStatus::Idle;
        fleet.idle_ticks = 0;
    }
    for ship_id in destroyed {
        world.emit(sim_model::EventKind::ShipDestroyed { ship_id, fleet_id });
    }
    Ok(())
}

fn handle_collect_salvage(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    if !fleet.has_ships() {
        return Err(CommandError::NoShips);
    }
    if fleet.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    let location = fleet.location;
    let has_salvage = world.sectors.get(&location).and_then(|o| o.salvage).is_some();
    if !has_salvage {
        return Err(CommandError::NoResources);
    }
    if fleet.remaining_cargo_room() == 0 {
        return Err(CommandError::CargoFull);
    }

    let mut fleet_guard = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
    let room = fleet_guard.remaining_cargo_room();
    let mut sector = world.dirty_sector(location);
    let Some(mut salvage) = sector.salvage else {
        return Err(CommandError::NoResources);
    };
    let mut remaining_room = room;
    let take = |amount: u64, room: &mut u64| {
        let taken = amount.min(*room);
        *room -= taken;
        taken
    };
    let metal = take(salvage.resources.metal, &mut remaining_room);
    let crystal = take(salvage.resources.crystal, &mut remaining_room);
    let deut = take(salvage.resources.deut, &mut remaining_room);
    salvage.resources.metal -= metal;
    salvage.resources.crystal -= crystal;
    salvage.resources.deut -= deut;
    fleet_guard.add_cargo_capped(worldgen::Resource::Metal, metal);
    fleet_guard.add_cargo_capped(worldgen::Resource::Crystal, crystal);
    fleet_guard.add_cargo_capped(worldgen::Resource::Deut, deut);
    fleet_guard.idle_ticks = 0;
    if salvage.resources == balance::Resources::default() {
        sector.salvage = None;
    } else {
        sector.salvage = Some(salvage);
    }
    world.emit(sim_model::EventKind::SalvageCollected {
        fleet_id,
        metal,
        crystal,
        deut,
    });
    Ok(())
}

fn handle_build(world: &mut World, player_id: PlayerId, building: BuildingType) -> Result<(), CommandError> {
    let player = require_player(world, player_id)?;
    if player.building_queue.is_some() {
        return Err(CommandError::QueueFull);
    }
    let current_level = player.building_level(building);
    if current_level >= balance::constants::MAX_LEVEL {
        return Err(CommandError::MaxLevelReached);
    }
    for prereq in balance::building_prereqs(building) {
        let met = match *prereq {
            balance::Prereq::Building(b, level) => player.building_level(b) >= level,
            balance::Prereq::Research(t, level) => player.research_level(t) >= level,
        };
        if !met {
            return Err(CommandError::PrerequisitesNotMet);
        }
    }
    let target_level = current_level + 1;
    let cost = balance::building_cost(building, target_level);
    if !player.resources.covers(cost) {
        return Err(CommandError::Resources);
    }
    let time = balance::building_time(building, target_level);
    let start_tick = world.current_tick;

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    player.resources = player.resources.saturating_sub(cost);
    player.building_queue = Some(sim_model::BuildQueue {
        building,
        target_level,
        start_tick,
        end_tick: start_tick + u64::from(time),
    });
    Ok(())
}

fn handle_research(world: &mut World, player_id: PlayerId, tech: ResearchTech) -> Result<(), CommandError> {
    let player = require_player(world, player_id)?;
    if player.research_queue.is_some() {
        return Err(CommandError::QueueFull);
    }
    if player.building_level(BuildingType::ResearchLab) == 0 {
        return Err(CommandError::NoResearchLab);
    }
    let current_level = player.research_level(tech);
    if current_level >= balance::constants::MAX_LEVEL {
        return Err(CommandError::MaxLevelReached);
    }
    for prereq in balance::research_prereqs(tech) {
        let met = match *prereq {
            balance::Prereq::Building(b, level) => player.building_level(b) >= level,
            balance::Prereq::Research(t, level) => player.research_level(t) >= level,
        };
        if !met {
            return Err(CommandError::PrerequisitesNotMet);
        }
    }
    let target_level = current_level + 1;
    let cost = balance::research_cost(tech, target_level);
    let fragment_cost = balance::research_fragment_cost(target_level);
    if !player.resources.covers(cost) {
        return Err(CommandError::Resources);
    }
    if player.fragments < fragment_cost {
        return Err(CommandError::InsufficientFragments);
    }
    let time = balance::research_time(tech, target_level);
    let start_tick = world.current_tick;

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    player.resources = player.resources.saturating_sub(cost);
    player.fragments -= fragment_cost;
    player.research_queue = Some(sim_model::ResearchQueue {
        tech,
        target_level,
        start_tick,
        end_tick: start_tick + u64::from(time),
    });
    Ok(())
}

fn handle_build_ship(
    world: &mut World,
    player_id: PlayerId,
    class: ShipClass,
    count: u32,
) -> Result<(), CommandError> {
    let player = require_player(world, player_id)?;
    if player.ship_queue.is_some() {
        return Err(CommandError::QueueFull);
    }
    let shipyard_level = player.building_level(BuildingType::Shipyard);
    if shipyard_level == 0 {
        return Err(CommandError::NoShipyard);
    }
    if let Some((tech, level)) = balance::ship_unlock_requirement(class) {
        if player.research_level(tech) < level {
            return Err(CommandError::ShipLocked);
        }
    }
    if count == 0 {
        return Err(CommandError::InvalidTarget);
    }
    let unit_cost = balance::ship_unit_cost(class);
    let total_cost = unit_cost.scale_count(count);
    if !player.resources.covers(total_cost) {
        return Err(CommandError::Resources);
    }
    let unit_time = balance::ship_build_time(class, shipyard_level);
    let start_tick = world.current_tick;

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    player.resources = player.resources.saturating_sub(total_cost);
    player.ship_queue = Some(sim_model::ShipQueue {
        class,
        requested_count: count,
        built: 0,
        start_tick,
        end_tick: start_tick + u64::from(unit_time),
    });
    Ok(())
}

fn handle_cancel_build(world: &mut World, player_id: PlayerId, queue: QueueKind) -> Result<(), CommandError> {
    let player = require_player(world, player_id)?;
    let refund = match queue {
        QueueKind::Building => {
            let q = player.building_queue.ok_or(CommandError::NoQueue)?;
            balance::building_cost(q.building, q.target_level)
        }
        QueueKind::Research => {
            let q = player.research_queue.ok_or(CommandError::NoQueue)?;
            balance::research_cost(q.tech, q.target_level)
        }
        QueueKind::Ship => {
            let q = player.ship_queue.ok_or(CommandError::NoQueue)?;
            let unit_cost = balance::ship_unit_cost(q.class);
            unit_cost.scale_count(q.requested_count - q.built)
        }
    };
    let refund = refund.fraction_milli(balance::constants::CANCEL_REFUND_FRACTION_MILLI);

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    match queue {
        QueueKind::Building => player.building_queue = None,
        QueueKind::Research => player.research_queue = None,
        QueueKind::Ship => player.ship_queue = None,
    }
    player.resources = player.resources.add(refund);
    Ok(())
}

fn handle_stop(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    match fleet.status {
        sim_model::FleetStatus::Moving | sim_model::FleetStatus::Harvesting => {
            let mut fleet = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
            fleet.move_target = None;
            fleet.move_cooldown = 0;
            fleet.action_cooldown = 0;
            fleet.status = sim_model::FleetStatus::Idle;
        }
        _ => {}
    }
    Ok(())
}

fn handle_scan(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    owned_fleet(world, player_id, fleet_id)?;
    Ok(())
}

fn handle_create_fleet(
    world: &mut World,
    player_id: PlayerId,
    ship_ids: Vec<ShipId>,
) -> Result<(), CommandError> {
    if ship_ids.is_empty() {
        return Err(CommandError::NoShips);
    }
    let player = require_player(world, player_id)?;
    let open_fleets = world.fleets.values().filter(|f| f.owner == player_id).count();
    if open_fleets >= balance::constants::FLEET_LIMIT {
        return Err(CommandError::FleetLimit);
    }
    for id in &ship_ids {
        if !player.docked_ships.iter().any(|s| s.id == *id) {
            return Err(CommandError::ShipNotFound);
        }
    }
    let homeworld = player.homeworld;

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    let mut ships = Vec::with_capacity(ship_ids.len());
    for id in &ship_ids {
        let idx = player
            .docked_ships
            .iter()
            .position(|s| s.id == *id)
            .ok_or(CommandError::ShipNotFound)?;
        ships.push(player.docked_ships.remove(idx));
    }
    drop(player);

    let fleet_id = FleetId::from(world.alloc_id());
    let ship_count = ships.len();
    world.fleets.insert(
        fleet_id,
        sim_model::Fleet {
            id: fleet_id,
            owner: player_id,
            location: homeworld,
            status: sim_model::FleetStatus::Idle,
            ships,
            ship_count,
            cargo: balance::Resources::default(),
            fuel: 0,
            fuel_max: 0,
            move_cooldown: 0,
            action_cooldown: 0,
            move_target: None,
            idle_ticks: 0,
        },
    );
    recompute_fuel_max(world, fleet_id);
    Ok(())
}

fn handle_dissolve_fleet(world: &mut World, player_id: PlayerId, fleet_id: FleetId) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    let player = require_player(world, player_id)?;
    if fleet.location != player.homeworld {
        return Err(CommandError::NotAtHomeworld);
    }
    if fleet.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    if player.docked_ships.len() + fleet.live_ships().len() > balance::constants::DOCKED_POOL_CAP {
        return Err(CommandError::DockFull);
    }

    let fleet = world.fleets.remove(&fleet_id).ok_or(CommandError::FleetNotFound)?;
    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    player.docked_ships.extend(fleet.ships.into_iter().take(fleet.ship_count));
    Ok(())
}

fn handle_transfer_ship(
    world: &mut World,
    player_id: PlayerId,
    ship_id: ShipId,
    from_fleet: FleetId,
    to_fleet: FleetId,
) -> Result<(), CommandError> {
    let from = owned_fleet(world, player_id, from_fleet)?;
    let to = owned_fleet(world, player_id, to_fleet)?;
    if from.status == sim_model::FleetStatus::InCombat || to.status == sim_model::FleetStatus::InCombat {
        return Err(CommandError::InCombat);
    }
    if from.location != to.location {
        return Err(CommandError::InvalidTarget);
    }
    if !from.live_ships().iter().any(|s| s.id == ship_id) {
        return Err(CommandError::ShipNotFound);
    }

    let mut from_guard = world.dirty_fleet(from_fleet).ok_or(CommandError::FleetNotFound)?;
    let idx = from_guard
        .live_ships()
        .iter()
        .position(|s| s.id == ship_id)
        .ok_or(CommandError::ShipNotFound)?;
    let ship = from_guard.ships.remove(idx);
    from_guard.ship_count -= 1;
    drop(from_guard);

    let mut to_guard = world.dirty_fleet(to_fleet).ok_or(CommandError::FleetNotFound)?;
    to_guard.ships.truncate(to_guard.ship_count);
    to_guard.ships.push(ship);
    to_guard.ship_count += 1;
    drop(to_guard);

    recompute_fuel_max(world, from_fleet);
    recompute_fuel_max(world, to_fleet);
    Ok(())
}

fn handle_dock_ship(
    world: &mut World,
    player_id: PlayerId,
    fleet_id: FleetId,
    ship_id: ShipId,
) -> Result<(), CommandError> {
    let fleet = owned_fleet(world, player_id, fleet_id)?;
    let player = require_player(world, player_id)?;
    if fleet.location != player.homeworld {
        return Err(CommandError::NotAtHomeworld);
    }
    if !fleet.live_ships().iter().any(|s| s.id == ship_id) {
        return Err(CommandError::ShipNotFound);
    }
    if player.docked_ships.len() >= balance::constants::DOCKED_POOL_CAP {
        return Err(CommandError::DockFull);
    }

    let mut fleet_guard = world.dirty_fleet(fleet_id).ok_or(CommandError::FleetNotFound)?;
    let idx = fleet_guard
        .live_ships()
        .iter()
        .position(|s| s.id == ship_id)
        .ok_or(CommandError::ShipNotFound)?;
    let ship = fleet_guard.ships.remove(idx);
    fleet_guard.ship_count -= 1;
    drop(fleet_guard);

    let mut player = world.dirty_player(player_id).ok_or(CommandError::PlayerNotFound)?;
    player.docked_ships.push(ship);
    drop(player);
    recompute_fuel_max(world, fleet_id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SEED: u64 = 0xDEAD_BEEF_CAFE_BABE;

    fn test_world() -> World {
        World::new(SEED)
    }

    fn insert_player(world: &mut World, homeworld: Hex) -> PlayerId {
        let id = PlayerId::from(world.alloc_id());
        world.players.insert(
            id,
            sim_model::Player {
                id,
                name: format!("player-{}", id.get()),
                resources: balance::Resources::new(10_000, 10_000, 10_000),
                fragments: 100,
                homeworld,
                buildings: HashMap::new(),
                research: HashMap::new(),
                building_queue: None,
                research_queue: None,
                ship_queue: None,
                auth_digest: Some("digest".to_owned()),
                created_at: 0,
                last_login_at: 0,
                docked_ships: Vec::new(),
                components: HashMap::new(),
            },
        );
        id
    }

    fn insert_fleet(world: &mut World, owner: PlayerId, location: Hex, classes: &[ShipClass]) -> FleetId {
        let id = FleetId::from(world.alloc_id());
        let ships: Vec<sim_model::Ship> = classes
            .iter()
            .map(|&c| {
                let ship_id = world.alloc_ship_id();
                sim_model::Ship::new_for_class(ship_id, c, 0, 0, 0)
            })
            .collect();
        let fuel_max: u32 = ships.iter().map(|s| balance::ship_stats(s.class).base_fuel).sum();
        let ship_count = ships.len();
        world.fleets.insert(
            id,
            sim_model::Fleet {
                id,
                owner,
                location,
                status: sim_model::FleetStatus::Idle,
                ships,
                ship_count,
                cargo: balance::Resources::default(),
                fuel: fuel_max,
                fuel_max,
                move_cooldown: 0,
                action_cooldown: 0,
                move_target: None,
                idle_ticks: 0,
            },
        );
        id
    }

    #[test]
    fn move_to_a_non_neighbor_is_rejected() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        let result = apply(&mut world, owner, Command::Move { fleet_id: fleet, target: Hex::ORIGIN });
        assert_eq!(result, Err(CommandError::NoConnection));
    }

    #[test]
    fn move_to_a_connected_neighbor_sets_moving_state_and_burns_fuel() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        let target = Hex::ORIGIN.neighbor(hex_geom::Direction::E);
        let fuel_before = world.fleets[&fleet].fuel;

        apply(&mut world, owner, Command::Move { fleet_id: fleet, target }).expect("move succeeds");

        let f = &world.fleets[&fleet];
        assert_eq!(f.status, sim_model::FleetStatus::Moving);
        assert_eq!(f.move_target, Some(target));
        assert!(f.move_cooldown >= 1);
        assert!(f.fuel < fuel_before);
    }

    #[test]
    fn move_without_enough_fuel_is_rejected() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        world.fleets.get_mut(&fleet).unwrap().fuel = 0;
        let target = Hex::ORIGIN.neighbor(hex_geom::Direction::E);
        let result = apply(&mut world, owner, Command::Move { fleet_id: fleet, target });
        assert_eq!(result, Err(CommandError::InsufficientFuel));
    }

    #[test]
    fn harvest_fails_at_a_sector_with_no_resources() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        let result = apply(&mut world, owner, Command::Harvest { fleet_id: fleet });
        assert_eq!(result, Err(CommandError::NoResources));
    }

    #[test]
    fn harvest_on_a_nonempty_sector_sets_cooldown() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let hex = (1..200)
            .map(|d| Hex::new(d, 0))
            .find(|&h| {
                let template = worldgen::generate_sector(SEED, h);
                worldgen::RESOURCE_ORDER
                    .iter()
                    .any(|&r| template.density(r) != worldgen::Density::None)
            })
            .expect("some hex within range has a nonzero density");
        let fleet = insert_fleet(&mut world, owner, hex, &[ShipClass::Harvester]);

        apply(&mut world, owner, Command::Harvest { fleet_id: fleet }).expect("harvest succeeds");

        let f = &world.fleets[&fleet];
        assert_eq!(f.status, sim_model::FleetStatus::Harvesting);
        assert_eq!(f.action_cooldown, balance::constants::HARVEST_COOLDOWN);
    }

    #[test]
    fn build_queues_and_deducts_cost_immediately() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let before = world.players[&owner].resources;

        apply(&mut world, owner, Command::Build { building: BuildingType::MetalMine }).expect("build succeeds");

        let player = &world.players[&owner];
        assert!(player.building_queue.is_some());
        assert!(player.resources.metal < before.metal || player.resources.crystal < before.crystal);
    }

    #[test]
    fn build_rejects_a_second_queue_entry() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        apply(&mut world, owner, Command::Build { building: BuildingType::MetalMine }).expect("first build");
        let result = apply(&mut world, owner, Command::Build { building: BuildingType::CrystalMine });
        assert_eq!(result, Err(CommandError::QueueFull));
    }

    #[test]
    fn build_rejects_past_max_level() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        world
            .players
            .get_mut(&owner)
            .unwrap()
            .buildings
            .insert(BuildingType::MetalMine, balance::constants::MAX_LEVEL);
        let result = apply(&mut world, owner, Command::Build { building: BuildingType::MetalMine });
        assert_eq!(result, Err(CommandError::MaxLevelReached));
    }

    #[test]
    fn cancel_build_refunds_a_fraction_of_cost() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        apply(&mut world, owner, Command::Build { building: BuildingType::MetalMine }).expect("build succeeds");
        let after_build = world.players[&owner].resources;

        apply(&mut world, owner, Command::CancelBuild { queue: QueueKind::Building }).expect("cancel succeeds");

        let player = &world.players[&owner];
        assert!(player.building_queue.is_none());
        assert!(player.resources.metal > after_build.metal);
    }

    #[test]
    fn create_fleet_moves_ships_out_of_the_docked_pool() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let ship_id = world.alloc_ship_id();
        let ship = sim_model::Ship::new_for_class(ship_id, ShipClass::Scout, 0, 0, 0);
        world.players.get_mut(&owner).unwrap().docked_ships.push(ship);

        apply(&mut world, owner, Command::CreateFleet { ship_ids: vec![ship_id] }).expect("create fleet succeeds");

        assert!(world.players[&owner].docked_ships.is_empty());
        let fleet = world.fleets.values().find(|f| f.owner == owner).expect("fleet created");
        assert_eq!(fleet.live_ships().len(), 1);
        assert_eq!(fleet.location, world.players[&owner].homeworld);
    }

    #[test]
    fn dissolve_fleet_returns_ships_to_the_docked_pool() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let homeworld = world.players[&owner].homeworld;
        let fleet = insert_fleet(&mut world, owner, homeworld, &[ShipClass::Scout, ShipClass::Scout]);

        apply(&mut world, owner, Command::DissolveFleet { fleet_id: fleet }).expect("dissolve succeeds");

        assert!(!world.fleets.contains_key(&fleet));
        assert_eq!(world.players[&owner].docked_ships.len(), 2);
    }

    #[test]
    fn dissolve_fleet_away_from_homeworld_is_rejected() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        let result = apply(&mut world, owner, Command::DissolveFleet { fleet_id: fleet });
        assert_eq!(result, Err(CommandError::NotAtHomeworld));
    }

    #[test]
    fn transfer_ship_moves_between_co_located_fleets() {
        let mut world = test_world();
        let owner = insert_player(&mut world, Hex::new(3, 3));
        let from_fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout, ShipClass::Scout]);
        let to_fleet = insert_fleet(&mut world, owner, Hex::ORIGIN, &[ShipClass::Scout]);
        let ship_id = world.fleets[&from_fleet].live_ships()[0].id;

        apply(
            &mut world,
            owner,
            Command::TransferShip { ship_id, from_fleet, to_fleet },
        )
        .expect("transfer succeeds");

        assert_eq!(world.fleets[&from_fleet].live_ships().len(), 1);
        assert_eq!(world.fleets[&to_fleet].live_ships().len(), 2);
        assert!(world.fleets[&to_fleet].live_ships().iter().any(|s| s.id == ship_id));
    }
}

/// Recomputes a fleet's `fuel_max` from its live ships' base fuel and the
/// owner's fuel-depot/`ExtendedTanks` modifiers, never shrinking current
/// fuel below the new cap.
pub(crate) fn recompute_fuel_max(world: &mut World, fleet_id: FleetId) {
    let Some(fleet) = world.fleets.get(&fleet_id) else {
        return;
    };
    let owner = fleet.owner;
    let base: u32 = fleet
        .live_ships()
        .iter()
        .map(|s| balance::ship_stats(s.class).base_fuel)
        .sum();
    let Some(player) = world.players.get(&owner) else {
        return;
    };
    let depot_level = player.building_level(BuildingType::FuelDepot);
    let tanks_level = player.research_level(ResearchTech::ExtendedTanks);
    let milli = u64::from(balance::fuel_depot_modifier_milli(depot_level))
        * u64::from(balance::extended_tanks_modifier_milli(tanks_level))
        / 1000;
    let fuel_max = (u64::from(base) * milli / 1000).min(u64::from(u32::MAX)) as u32;
    if let Some(mut fleet) = world.dirty_fleet(fleet_id) {
        fleet.fuel_max = fuel_max;
        fleet.fuel = fleet.fuel.min(fuel_max);
    }
}
