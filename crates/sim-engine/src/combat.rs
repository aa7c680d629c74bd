// SPDX-License-Identifier: Apache-2.0
//! Combat initiation, the per-tick round resolver, and victory salvage/loot.

use hex_geom::Hex;
use sim_model::{Combat, CombatId, EventKind, FleetId, FleetStatus, NpcFleetId, World};

use crate::commands::{AttackTarget, CommandError};

enum Side {
    Player,
    Npc,
}

struct Combatant {
    side: Side,
    fleet_idx: usize,
    ship_idx: usize,
}

pub(crate) fn handle_attack(
    world: &mut World,
    player_id: sim_model::PlayerId,
    fleet_id: FleetId,
    target: AttackTarget,
) -> Result<(), CommandError> {
    let fleet = world.fleets.get(&fleet_id).ok_or(CommandError::FleetNotFound)?;
    if fleet.owner != player_id {
        return Err(CommandError::FleetNotFound);
    }
    if !fleet.has_ships() {
        return Err(CommandError::NoShips);
    }
    if fleet.move_target.is_some() {
        return Err(CommandError::OnCooldown);
    }
    let sector = fleet.location;

    match target {
        AttackTarget::Player(target_id) => {
            let target_fleet = world.fleets.get(&target_id).ok_or(CommandError::InvalidTarget)?;
            if target_fleet.owner == player_id || target_fleet.location != sector || !target_fleet.has_ships() {
                return Err(CommandError::InvalidTarget);
            }
            let combat_id = find_or_create_combat(world, sector);
            enroll_player_fleet(world, combat_id, fleet_id);
            enroll_player_fleet(world, combat_id, target_id);
        }
        AttackTarget::Npc(npc_id) => {
            let npc = world.npc_fleets.get(&npc_id).ok_or(CommandError::InvalidTarget)?;
            if npc.location != sector || !npc.has_ships() {
                return Err(CommandError::InvalidTarget);
            }
            let class = npc.class;
            let count = npc.live_ships().len() as u32;
            let value = npc.total_value();
            let combat_id = find_or_create_combat(world, sector);
            enroll_player_fleet(world, combat_id, fleet_id);
            enroll_npc_fleet(world, combat_id, npc_id, class, count, value);
        }
    }
    Ok(())
}

pub(crate) fn find_or_create_combat(world: &mut World, sector: Hex) -> CombatId {
    if let Some((&id, _)) = world.combats.iter().find(|(_, c)| c.sector == sector) {
        return id;
    }
    let id = CombatId::from(world.alloc_id());
    world.combats.insert(
        id,
        Combat {
            id,
            sector,
            player_fleets: Vec::new(),
            npc_fleets: Vec::new(),
            npc_value: balance::Resources::default(),
            npc_snapshot: Vec::new(),
            round: 0,
        },
    );
    id
}

/// Enrolls a player fleet into a combat already at that fleet's sector and
/// flips its status, if it is not already enrolled.
pub(crate) fn enroll_player_fleet(world: &mut World, combat_id: CombatId, fleet_id: FleetId) {
    if let Some(combat) = world.combats.get_mut(&combat_id) {
        if !combat.player_fleets.contains(&fleet_id) {
            combat.player_fleets.push(fleet_id);
        }
    }
    if let Some(mut fleet) = world.dirty_fleet(fleet_id) {
        fleet.status = FleetStatus::InCombat;
        fleet.move_target = None;
    }
}

/// Enrolls an NPC fleet into a combat, recording its value/snapshot if this
/// is its first time joining.
pub(crate) fn enroll_npc_fleet(
    world: &mut World,
    combat_id: CombatId,
    npc_id: NpcFleetId,
    class: worldgen::NpcShipClass,
    count: u32,
    value: balance::Resources,
) {
    if let Some(combat) = world.combats.get_mut(&combat_id) {
        if !combat.npc_fleets.contains(&npc_id) {
            combat.npc_fleets.push(npc_id);
            combat.record_npc_value(class, count, value);
        }
    }
    if let Some(npc) = world.npc_fleets.get_mut(&npc_id) {
        npc.in_combat = true;
    }
}

/// Outcome of resolving one round of one combat.
pub(crate) struct RoundOutcome {
    pub concluded: bool,
}

/// Resolves exactly one round of `combat_id`: every living ship on both
/// sides fires once (plus a possible rapid-fire shot), then both sides are
/// compacted and the termination condition is checked.
pub(crate) fn resolve_round(world: &mut World, combat_id: CombatId) -> RoundOutcome {
    let Some(combat) = world.combats.get(&combat_id) else {
        return RoundOutcome { concluded: true };
    };
    let player_fleets = combat.player_fleets.clone();
    let npc_fleets = combat.npc_fleets.clone();
    let round = combat.round + 1;
    let tick = world.current_tick;

    let mut prng = worldgen::Prng::from_seed_u64(tick.wrapping_mul(0x9E37_79B9_7F4A_7C15) ^ u64::from(round));

    let mut combatants = Vec::new();
    for (i, &fid) in player_fleets.iter().enumerate() {
        if let Some(f) = world.fleets.get(&fid) {
            for j in 0..f.live_ships().len() {
                combatants.push(Combatant { side: Side::Player, fleet_idx: i, ship_idx: j });
            }
        }
    }
    for (i, &nid) in npc_fleets.iter().enumerate() {
        if let Some(f) = world.npc_fleets.get(&nid) {
            for j in 0..f.live_ships().len() {
                combatants.push(Combatant { side: Side::Npc, fleet_idx: i, ship_idx: j });
            }
        }
    }

    for combatant in &combatants {
        fire_shot(world, combat_id, &player_fleets, &npc_fleets, combatant, &mut prng);
        fire_rapid_shot(world, combat_id, &player_fleets, &npc_fleets, combatant, &mut prng);
    }

    for &fid in &player_fleets {
        if let Some(mut f) = world.dirty_fleet(fid) {
            f.compact_ships();
        }
    }
    for &nid in &npc_fleets {
        if let Some(f) = world.npc_fleets.get_mut(&nid) {
            f.compact_ships();
        }
    }

    if let Some(combat) = world.combats.get_mut(&combat_id) {
        combat.round = round;
    }

    let player_alive = player_fleets
        .iter()
        .any(|fid| world.fleets.get(fid).is_some_and(sim_model::Fleet::has_ships));
    let npc_alive = npc_fleets
        .iter()
        .any(|nid| world.npc_fleets.get(nid).is_some_and(sim_model::NpcFleet::has_ships));

    if !player_alive || !npc_alive {
        conclude_combat(world, combat_id, player_alive && !npc_alive);
        RoundOutcome { concluded: true }
    } else {
        RoundOutcome { concluded: false }
    }
}

fn fire_shot(
    world: &mut World,
    combat_id: CombatId,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    attacker: &Combatant,
    prng: &mut worldgen::Prng,
) {
    let Some((attacker_class, attacker_weapon, attacker_ship_id)) =
        attacker_stats(world, player_fleets, npc_fleets, attacker)
    else {
        return;
    };
    let Some((defender_side_is_player, defender_fleet_idx)) =
        pick_target_fleet(world, player_fleets, npc_fleets, &attacker.side, prng)
    else {
        return;
    };
    let Some((defender_ship_idx, defender_class)) = pick_target_ship(
        world,
        player_fleets,
        npc_fleets,
        defender_side_is_player,
        defender_fleet_idx,
        prng,
    ) else {
        return;
    };

    let variance = prng.next_int(
        balance::constants::DAMAGE_VARIANCE_MIN_MILLI as i32,
        balance::constants::DAMAGE_VARIANCE_MAX_MILLI as i32,
    ) as u32;
    let damage = (u64::from(attacker_weapon) * u64::from(variance) / 1000) as u32;

    let (destroyed, defender_ship_id) = apply_damage_to_target(
        world,
        player_fleets,
        npc_fleets,
        defender_side_is_player,
        defender_fleet_idx,
        defender_ship_idx,
        damage,
    );

    world.emit(EventKind::CombatRoundFired {
        combat_id,
        attacker_ship: attacker_ship_id,
        defender_ship: defender_ship_id,
        damage,
        destroyed,
    });
    if destroyed && defender_side_is_player {
        if let Some(&fid) = player_fleets.get(defender_fleet_idx) {
            world.emit(EventKind::ShipDestroyed { ship_id: defender_ship_id, fleet_id: fid });
        }
    }
    let _ = (attacker_class, defender_class);
}

fn fire_rapid_shot(
    world: &mut World,
    combat_id: CombatId,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    attacker: &Combatant,
    prng: &mut worldgen::Prng,
) {
    let Some((attacker_class, attacker_weapon, attacker_ship_id)) =
        attacker_stats(world, player_fleets, npc_fleets, attacker)
    else {
        return;
    };
    let Some((defender_side_is_player, defender_fleet_idx)) =
        pick_target_fleet(world, player_fleets, npc_fleets, &attacker.side, prng)
    else {
        return;
    };
    let Some((defender_ship_idx, defender_class)) = pick_target_ship(
        world,
        player_fleets,
        npc_fleets,
        defender_side_is_player,
        defender_fleet_idx,
        prng,
    ) else {
        return;
    };
    let count = balance::rapid_fire_count(attacker_class, defender_class);
    if count == 0 {
        return;
    }
    if !prng.chance(count - 1, count) {
        return;
    }
    let variance = prng.next_int(
        balance::constants::DAMAGE_VARIANCE_MIN_MILLI as i32,
        balance::constants::DAMAGE_VARIANCE_MAX_MILLI as i32,
    ) as u32;
    let damage = (u64::from(attacker_weapon) * u64::from(variance) / 1000) as u32;
    let (destroyed, defender_ship_id) = apply_damage_to_target(
        world,
        player_fleets,
        npc_fleets,
        defender_side_is_player,
        defender_fleet_idx,
        defender_ship_idx,
        damage,
    );
    world.emit(EventKind::CombatRoundFired {
        combat_id,
        attacker_ship: attacker_ship_id,
        defender_ship: defender_ship_id,
        damage,
        destroyed,
    });
    if destroyed && defender_side_is_player {
        if let Some(&fid) = player_fleets.get(defender_fleet_idx) {
            world.emit(EventKind::ShipDestroyed { ship_id: defender_ship_id, fleet_id: fid });
        }
    }
}

fn attacker_stats(
    world: &World,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    attacker: &Combatant,
) -> Option<(balance::ShipClass, u32, sim_model::ShipId)> {
    match attacker.side {
        Side::Player => {
            let fid = *player_fleets.get(attacker.fleet_idx)?;
            let f = world.fleets.get(&fid)?;
            let ship = f.live_ships().get(attacker.ship_idx)?;
            Some((ship.class, ship.weapon_power, ship.id))
        }
        Side::Npc => {
            let nid = *npc_fleets.get(attacker.fleet_idx)?;
            let f = world.npc_fleets.get(&nid)?;
            let ship = f.live_ships().get(attacker.ship_idx)?;
            Some((ship.class, ship.weapon_power, ship.id))
        }
    }
}

/// Picks an opposing fleet index weighted by its total living hull_max.
/// Returns `(defender_is_player_side, fleet_idx)`.
fn pick_target_fleet(
    world: &World,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    attacker_side: &Side,
    prng: &mut worldgen::Prng,
) -> Option<(bool, usize)> {
    let defender_is_player = matches!(attacker_side, Side::Npc);
    let weights: Vec<u32> = if defender_is_player {
        player_fleets
            .iter()
            .map(|fid| {
                world.fleets.get(fid).map_or(0, |f| {
                    f.live_ships().iter().filter(|s| !s.is_destroyed()).map(|s| s.hull_max).sum()
                })
            })
            .collect()
    } else {
        npc_fleets
            .iter()
            .map(|nid| {
                world.npc_fleets.get(nid).map_or(0, |f| {
                    f.live_ships().iter().filter(|s| !s.is_destroyed()).map(|s| s.hull_max).sum()
                })
            })
            .collect()
    };
    weighted_index(&weights, prng).map(|idx| (defender_is_player, idx))
}

fn pick_target_ship(
    world: &World,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    defender_is_player: bool,
    fleet_idx: usize,
    prng: &mut worldgen::Prng,
) -> Option<(usize, balance::ShipClass)> {
    let ships_hull_max: Vec<u32> = if defender_is_player {
        let fid = *player_fleets.get(fleet_idx)?;
        world
            .fleets
            .get(&fid)?
            .live_ships()
            .iter()
            .map(|s| if s.is_destroyed() { 0 } else { s.hull_max })
            .collect()
    } else {
        let nid = *npc_fleets.get(fleet_idx)?;
        world
            .npc_fleets
            .get(&nid)?
            .live_ships()
            .iter()
            .map(|s| if s.is_destroyed() { 0 } else { s.hull_max })
            .collect()
    };
    let idx = weighted_index(&ships_hull_max, prng)?;
    let class = if defender_is_player {
        let fid = *player_fleets.get(fleet_idx)?;
        world.fleets.get(&fid)?.live_ships().get(idx)?.class
    } else {
        let nid = *npc_fleets.get(fleet_idx)?;
        world.npc_fleets.get(&nid)?.live_ships().get(idx)?.class
    };
    Some((idx, class))
}

/// Picks an index weighted by `weights`, skipping zero-weight (dead) entries.
/// Falls back to the last nonzero-weight entry if the cumulative-weight walk
/// never lands on one (it shouldn't, but a `u64`-to-`i32` roll range never
/// gets to rely on that assumption holding).
fn weighted_index(weights: &[u32], prng: &mut worldgen::Prng) -> Option<usize> {
    let total: u64 = weights.iter().map(|&w| u64::from(w)).sum();
    if total == 0 {
        return None;
    }
    let roll = prng.next_int(0, (total - 1) as i32) as u64;
    let mut cumulative = 0u64;
    let mut last_living = None;
    for (i, &w) in weights.iter().enumerate() {
        if w > 0 {
            last_living = Some(i);
        }
        cumulative += u64::from(w);
        if roll < cumulative {
            return Some(i);
        }
    }
    last_living
}

#[allow(clippy::too_many_arguments)]
fn apply_damage_to_target(
    world: &mut World,
    player_fleets: &[FleetId],
    npc_fleets: &[NpcFleetId],
    defender_is_player: bool,
    fleet_idx: usize,
    ship_idx: usize,
    damage: u32,
) -> (bool, sim_model::ShipId) {
    if defender_is_player {
        let Some(&fid) = player_fleets.get(fleet_idx) else {
            return (false, sim_model::ShipId(0));
        };
        let Some(mut f) = world.dirty_fleet(fid) else {
            return (false, sim_model::ShipId(0));
        };
        let Some(ship) = f.live_ships_mut().get_mut(ship_idx) else {
            return (false, sim_model::ShipId(0));
        };
        let id = ship.id;
        ship.apply_damage(damage);
        (ship.is_destroyed(), id)
    } else {
        let Some(&nid) = npc_fleets.get(fleet_idx) else {
            return (false, sim_model::ShipId(0));
        };
        let Some(f) = world.npc_fleets.get_mut(&nid) else {
            return (false, sim_model::ShipId(0));
        };
        let Some(ship) = f.live_ships_mut().get_mut(ship_idx) else {
            return (false, sim_model::ShipId(0));
        };
        let id = ship.id;
        ship.apply_damage(damage);
        (ship.is_destroyed(), id)
    }
}

fn conclude_combat(world: &mut World, combat_id: CombatId, player_victory: bool) {
    let Some(combat) = world.combats.remove(&combat_id) else {
        return;
    };
    let sector = combat.sector;
    let tick = world.current_tick;

    for &fid in &combat.player_fleets {
        let still_has_ships = world.fleets.get(&fid).is_some_and(sim_model::Fleet::has_ships);
        if still_has_ships {
            if let Some(mut f) = world.dirty_fleet(fid) {
                if f.status == FleetStatus::InCombat {
                    f.status = FleetStatus::Idle;
                }
            }
        } else {
            world.fleets.remove(&fid);
        }
    }
    for &nid in &combat.npc_fleets {
        let still_has_ships = world.npc_fleets.get(&nid).is_some_and(sim_model::NpcFleet::has_ships);
        if still_has_ships {
            if let Some(f) = world.npc_fleets.get_mut(&nid) {
                f.in_combat = false;
            }
        } else if world.npc_fleets.contains_key(&nid) {
            world.npc_fleets.remove(&nid);
            world.emit(EventKind::NpcFleetDestroyed { npc_fleet_id: nid });
        }
    }

    if player_victory {
        let salvage_resources = combat.npc_value.fraction_milli(balance::constants::SALVAGE_FRACTION_MILLI);
        let mut sector_override = world.dirty_sector(sector);
        sector_override.salvage = Some(sim_model::Salvage {
            resources: salvage_resources,
            despawn_tick: tick + balance::constants::SALVAGE_DESPAWN_TICKS,
        });
        sector_override.npc_cleared_tick = Some(tick);
        drop(sector_override);
        award_loot(world, &combat, tick);
    }

    world.emit(EventKind::CombatEnded { combat_id, hex: sector, player_victory });
}

#[cfg(test)]
mod tests {
    use super::*;
    use sim_model::{FleetStatus, Player, PlayerId, Ship};
    use std::collections::HashMap;
    use worldgen::NpcShipClass;

    const SEED: u64 = 1;
    const HEX: Hex = Hex { q: 4, r: 4 };

    fn insert_player(world: &mut World) -> PlayerId {
        let id = PlayerId::from(world.alloc_id());
        world.players.insert(
            id,
            Player {
                id,
                name: "captain".to_owned(),
                resources: balance::Resources::default(),
                fragments: 0,
                homeworld: Hex::new(3, 3),
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

    /// Inserts a fleet at `HEX` with one ship whose hull/weapon are
    /// overridden so combat outcomes are deterministic regardless of the
    /// round's damage-variance roll.
    fn insert_overpowered_fleet(world: &mut World, owner: PlayerId) -> FleetId {
        let fleet_id = FleetId::from(world.alloc_id());
        let ship_id = world.alloc_ship_id();
        let mut ship = Ship::new_for_class(ship_id, balance::ShipClass::Battleship, 0, 0, 0);
        ship.weapon_power = 1_000_000;
        world.fleets.insert(
            fleet_id,
            sim_model::Fleet {
                id: fleet_id,
                owner,
                location: HEX,
                status: FleetStatus::Idle,
                ships: vec![ship],
                ship_count: 1,
                cargo: balance::Resources::default(),
                fuel: 100,
                fuel_max: 100,
                move_cooldown: 0,
                action_cooldown: 0,
                move_target: None,
                idle_ticks: 0,
            },
        );
        fleet_id
    }

    fn insert_frail_npc(world: &mut World) -> NpcFleetId {
        let npc_id = NpcFleetId::from(world.alloc_id());
        let ship_id = world.alloc_ship_id();
        let mut ship = Ship::new_for_class(ship_id, balance::ShipClass::Scout, 0, 0, 0);
        ship.hull = 1;
        ship.hull_max = 1;
        ship.shield = 0;
        ship.shield_max = 0;
        world.npc_fleets.insert(
            npc_id,
            sim_model::NpcFleet {
                id: npc_id,
                location: HEX,
                ships: vec![ship],
                ship_count: 1,
                class: NpcShipClass::Raider,
                behavior: worldgen::NpcBehavior::Aggressive,
                home_sector: HEX,
                patrol_cooldown: 0,
                in_combat: false,
            },
        );
        npc_id
    }

    #[test]
    fn find_or_create_combat_reuses_the_existing_combat_at_a_sector() {
        let mut world = World::new(SEED);
        let first = find_or_create_combat(&mut world, HEX);
        let second = find_or_create_combat(&mut world, HEX);
        assert_eq!(first, second);
        assert_eq!(world.combats.len(), 1);
    }

    #[test]
    fn find_or_create_combat_is_distinct_per_sector() {
        let mut world = World::new(SEED);
        let a = find_or_create_combat(&mut world, HEX);
        let b = find_or_create_combat(&mut world, Hex::new(9, 9));
        assert_ne!(a, b);
    }

    #[test]
    fn resolve_round_destroys_an_overwhelmed_defender_and_concludes_the_combat() {
        let mut world = World::new(SEED);
        let owner = insert_player(&mut world);
        let fleet_id = insert_overpowered_fleet(&mut world, owner);
        let npc_id = insert_frail_npc(&mut world);

        let combat_id = find_or_create_combat(&mut world, HEX);
        enroll_player_fleet(&mut world, combat_id, fleet_id);
        enroll_npc_fleet(
            &mut world,
            combat_id,
            npc_id,
            NpcShipClass::Raider,
            1,
            balance::Resources::new(100, 100, 100),
        );

        let outcome = resolve_round(&mut world, combat_id);

        assert!(outcome.concluded);
        assert!(!world.npc_fleets.contains_key(&npc_id));
        assert!(!world.combats.contains_key(&combat_id));
        assert_eq!(world.fleets[&fleet_id].status, FleetStatus::Idle);
    }

    #[test]
    fn player_victory_drops_salvage_and_stamps_npc_cleared_tick() {
        let mut world = World::new(SEED);
        world.current_tick = 7;
        let owner = insert_player(&mut world);
        let fleet_id = insert_overpowered_fleet(&mut world, owner);
        let npc_id = insert_frail_npc(&mut world);

        let combat_id = find_or_create_combat(&mut world, HEX);
        enroll_player_fleet(&mut world, combat_id, fleet_id);
        enroll_npc_fleet(
            &mut world,
            combat_id,
            npc_id,
            NpcShipClass::Raider,
            1,
            balance::Resources::new(100, 100, 100),
        );

        resolve_round(&mut world, combat_id);

        let overlay = world.sectors.get(&HEX).expect("sector override created");
        assert!(overlay.salvage.is_some());
        assert_eq!(overlay.npc_cleared_tick, Some(7));
        assert_eq!(overlay.salvage.unwrap().despawn_tick, 7 + balance::constants::SALVAGE_DESPAWN_TICKS);
    }

    #[test]
    fn combat_with_no_living_npc_ships_concludes_as_a_player_win_without_firing() {
        let mut world = World::new(SEED);
        let owner = insert_player(&mut world);
        let fleet_id = insert_overpowered_fleet(&mut world, owner);
        let npc_id = NpcFleetId::from(world.alloc_id());
        world.npc_fleets.insert(
            npc_id,
            sim_model::NpcFleet {
                id: npc_id,
                location: HEX,
                ships: Vec::new(),
                ship_count: 0,
                class: NpcShipClass::Raider,
                behavior: worldgen::NpcBehavior::Aggressive,
                home_sector: HEX,
                patrol_cooldown: 0,
                in_combat: false,
            },
        );

        let combat_id = find_or_create_combat(&mut world, HEX);
        enroll_player_fleet(&mut world, combat_id, fleet_id);
        enroll_npc_fleet(&mut world, combat_id, npc_id, NpcShipClass::Raider, 0, balance::Resources::default());

        let outcome = resolve_round(&mut world, combat_id);
        assert!(outcome.concluded);
        assert!(world.sectors[&HEX].salvage.is_some());
    }
}

fn award_loot(world: &mut World, combat: &Combat, tick: u64) {
    let mut owners: Vec<sim_model::PlayerId> = Vec::new();
    for &fid in &combat.player_fleets {
        if let Some(f) = world.fleets.get(&fid) {
            if !owners.contains(&f.owner) {
                owners.push(f.owner);
            }
        }
    }
    let fragment_award: u32 = combat.npc_snapshot.iter().map(|(_, count)| *count).sum();
    for owner in owners {
        let mut prng = worldgen::Prng::from_seed_u64(
            tick.wrapping_mul(0x2545_F491_4F6C_DD1D) ^ combat.id.get() ^ owner.get(),
        );
        if prng.chance(1, 2) {
            if let Some(mut player) = world.dirty_player(owner) {
                player.fragments = player.fragments.saturating_add(fragment_award);
            }
        }
    }
}
