// SPDX-License-Identifier: Apache-2.0
//! Account creation and login. Homeworld placement is the one place in the
//! engine that draws on wall-clock entropy instead of a deterministic seed
//! (per the registration rejection-sampling loop needing fresh randomness
//! every retry, not reproducibility).

use std::collections::HashMap;
use std::time::{SystemTime, UNIX_EPOCH};

use hex_geom::Hex;
use sim_model::{Fleet, FleetStatus, Player, PlayerId, World};
use worldgen::Prng;

/// A rejected registration or login attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// The name is already claimed by an account with a password set.
    NameTaken,
    /// The name fails basic validation (empty or too long).
    InvalidName,
    /// Login failed; deliberately the same variant for "no such name" and
    /// "wrong credential" so a client can never probe for name existence.
    AuthFailed,
}

const MAX_NAME_LEN: usize = 32;
const HOMEWORLD_PLACEMENT_ATTEMPTS: u32 = 256;

/// Creates a new account, or silently claims an existing "legacy" name that
/// has no credential attached yet (pre-auth save data). Returns the
/// player's id either way.
pub fn register(world: &mut World, name: &str, auth_digest: String) -> Result<PlayerId, AuthError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(AuthError::InvalidName);
    }
    if let Some(existing) = world.players.values().find(|p| p.name == name) {
        if existing.auth_digest.is_some() {
            return Err(AuthError::NameTaken);
        }
        let id = existing.id;
        if let Some(mut player) = world.dirty_player(id) {
            player.auth_digest = Some(auth_digest);
        }
        return Ok(id);
    }

    let homeworld = pick_homeworld(world);
    let player_id = PlayerId::from(world.alloc_id());

    let mut ships = Vec::with_capacity(balance::constants::STARTER_SCOUT_COUNT as usize);
    for _ in 0..balance::constants::STARTER_SCOUT_COUNT {
        let ship_id = world.alloc_ship_id();
        ships.push(sim_model::Ship::new_for_class(ship_id, balance::ShipClass::Scout, 0, 0, 0));
    }
    let fuel_max: u32 = ships.iter().map(|s| balance::ship_stats(s.class).base_fuel).sum();
    let ship_count = ships.len();
    let (metal, crystal, deut) = balance::constants::STARTING_RESOURCES;
    let now = world.current_tick;

    world.players.insert(
        player_id,
        Player {
            id: player_id,
            name: name.to_owned(),
            resources: balance::Resources::new(metal, crystal, deut),
            fragments: 0,
            homeworld,
            buildings: HashMap::new(),
            research: HashMap::new(),
            building_queue: None,
            research_queue: None,
            ship_queue: None,
            auth_digest: Some(auth_digest),
            created_at: now,
            last_login_at: now,
            docked_ships: Vec::new(),
            components: HashMap::new(),
        },
    );

    let fleet_id = sim_model::FleetId::from(world.alloc_id());
    world.fleets.insert(
        fleet_id,
        Fleet {
            id: fleet_id,
            owner: player_id,
            location: homeworld,
            status: FleetStatus::Idle,
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

    Ok(player_id)
}

/// Authenticates an existing account. Never distinguishes "no such name"
/// from "wrong credential" in its return value.
pub fn login(world: &mut World, name: &str, token_digest: &str) -> Result<PlayerId, AuthError> {
    let player = world
        .players
        .values()
        .find(|p| p.name == name)
        .ok_or(AuthError::AuthFailed)?;
    if player.auth_digest.as_deref() != Some(token_digest) {
        return Err(AuthError::AuthFailed);
    }
    let id = player.id;
    let now = world.current_tick;
    if let Some(mut player) = world.dirty_player(id) {
        player.last_login_at = now;
    }
    Ok(id)
}

/// Rejection-samples a homeworld: distance from origin within
/// `[HOMEWORLD_MIN_DIST, HOMEWORLD_MAX_DIST]` and at least
/// `HOMEWORLD_MIN_SEPARATION` from every existing homeworld. Seeded from
/// wall-clock time, the one place this crate departs from deterministic
/// RNG, since retries must not repeat the same rejected coordinate.
fn pick_homeworld(world: &World) -> Hex {
    let mut prng = Prng::from_seed_u64(wall_clock_seed());
    let min_dist = i32::from(balance::constants::HOMEWORLD_MIN_DIST);
    let max_dist = i32::from(balance::constants::HOMEWORLD_MAX_DIST);
    let min_separation = i32::from(balance::constants::HOMEWORLD_MIN_SEPARATION);

    let mut best = Hex::new(min_dist as i16, 0);
    for _ in 0..HOMEWORLD_PLACEMENT_ATTEMPTS {
        let q = prng.next_int(-(max_dist as i32), max_dist as i32) as i16;
        let r = prng.next_int(-(max_dist as i32), max_dist as i32) as i16;
        let candidate = Hex::new(q, r);
        let dist = candidate.distance_from_origin();
        if dist < min_dist || dist > max_dist {
            continue;
        }
        best = candidate;
        let clear = world
            .players
            .values()
            .all(|p| candidate.distance(p.homeworld) >= min_separation);
        if clear {
            return candidate;
        }
    }
    best
}

fn wall_clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_creates_a_homeworld_and_starter_fleet() {
        let mut world = World::new(1);
        let id = register(&mut world, "admiral", "digest-a".to_owned()).expect("registration succeeds");
        let player = world.players.get(&id).expect("player exists");
        assert_eq!(player.resources, balance::Resources::new(500, 300, 100));
        let dist = player.homeworld.distance_from_origin();
        assert!(dist >= i32::from(balance::constants::HOMEWORLD_MIN_DIST));
        assert!(dist <= i32::from(balance::constants::HOMEWORLD_MAX_DIST));
        let fleet = world.fleets.values().find(|f| f.owner == id).expect("starter fleet exists");
        assert_eq!(fleet.live_ships().len(), balance::constants::STARTER_SCOUT_COUNT as usize);
    }

    #[test]
    fn register_rejects_a_taken_name() {
        let mut world = World::new(1);
        register(&mut world, "admiral", "digest-a".to_owned()).expect("first registration succeeds");
        let result = register(&mut world, "admiral", "digest-b".to_owned());
        assert_eq!(result, Err(AuthError::NameTaken));
    }

    #[test]
    fn login_fails_the_same_way_for_unknown_name_and_bad_credential() {
        let mut world = World::new(1);
        register(&mut world, "admiral", "digest-a".to_owned()).expect("registration succeeds");
        assert_eq!(login(&mut world, "nobody", "digest-a"), Err(AuthError::AuthFailed));
        assert_eq!(login(&mut world, "admiral", "wrong"), Err(AuthError::AuthFailed));
    }

    #[test]
    fn login_succeeds_with_the_right_credential() {
        let mut world = World::new(1);
        let id = register(&mut world, "admiral", "digest-a".to_owned()).expect("registration succeeds");
        assert_eq!(login(&mut world, "admiral", "digest-a"), Ok(id));
    }
}
