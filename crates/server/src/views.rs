// SPDX-License-Identifier: Apache-2.0
//! Builds wire views out of simulation state, and decides which events are
//! relevant to which session.
//!
//! These conversions deliberately live here rather than in `session-proto`
//! (unlike `session_proto::ShipView`'s own `From<&sim_model::Ship>` impl):
//! a `SectorView` can only be built from `sim_engine::projection`'s merged
//! `SectorProjection`/`NpcPresence`, and `session-proto` is kept free of a
//! dependency on `sim-engine` so the wire schema never depends on the
//! simulation's internal phase/command machinery (the same acyclic-graph
//! reasoning `DESIGN.md` already applies to `Command` vs. `ClientCommand`).
//! The `server` binary is the one crate that depends on both, so it is the
//! natural home for the conversion.

use session_proto::{FleetView, NpcPresenceView, PlayerView, SalvageView, SectorView, ShipView};
use sim_engine::{NpcPresence, SectorProjection};
use sim_model::{Event, EventKind, Fleet, Player, PlayerId, World};

/// Builds the wire view of `player`.
#[must_use]
pub fn player_view(player: &Player) -> PlayerView {
    PlayerView {
        id: player.id,
        name: player.name.clone(),
        resources: player.resources,
        fragments: player.fragments,
        homeworld: player.homeworld,
        buildings: player.buildings.iter().map(|(k, v)| (*k, *v)).collect(),
        research: player.research.iter().map(|(k, v)| (*k, *v)).collect(),
        building_queue: player.building_queue,
        research_queue: player.research_queue,
        ship_queue: player.ship_queue,
        docked_ships: player.docked_ships.iter().map(ShipView::from).collect(),
    }
}

/// Builds the wire view of `fleet`.
#[must_use]
pub fn fleet_view(fleet: &Fleet) -> FleetView {
    FleetView {
        id: fleet.id,
        location: fleet.location,
        status: fleet.status,
        ships: fleet.live_ships().iter().map(ShipView::from).collect(),
        cargo: fleet.cargo,
        fuel: fleet.fuel,
        fuel_max: fleet.fuel_max,
        move_target: fleet.move_target,
    }
}

/// Builds the wire view of a merged sector projection.
#[must_use]
pub fn sector_view(projection: SectorProjection) -> SectorView {
    SectorView {
        hex: projection.hex,
        terrain: projection.terrain,
        densities: projection.densities,
        npc: projection.npc.map(npc_presence_view),
        salvage: projection.salvage.map(|s| SalvageView {
            resources: s.resources,
            despawn_tick: s.despawn_tick,
        }),
    }
}

fn npc_presence_view(npc: NpcPresence) -> NpcPresenceView {
    match npc {
        NpcPresence::Spawned {
            npc_fleet_id,
            ship_count,
            behavior,
            in_combat,
        } => NpcPresenceView::Spawned {
            npc_fleet_id,
            ship_count,
            behavior,
            in_combat,
        },
        NpcPresence::Template {
            class,
            count_range,
            behavior,
        } => NpcPresenceView::Template {
            class,
            count_range,
            behavior,
        },
    }
}

/// Decides whether `event` belongs in `player_id`'s session delta.
///
/// Most variants carry a fleet or player id directly and are resolved by an
/// ownership lookup against the post-tick world. Two variants need a
/// documented simplification because the data that would answer the
/// question exactly is no longer available by the time the session layer
/// sees the event:
///
/// - `CombatEnded` carries the combat's `hex` but not its `player_fleets`
///   (the `Combat` record is removed from `World::combats` in the same
///   phase that emits the event). Relevance falls back to "does this player
///   currently have a fleet at that hex", which covers the winner remaining
///   on the field and a defender returning to find the wreck, at the cost
///   of missing a fully wiped-out loser.
/// - `NpcFleetDestroyed` carries only an NPC fleet id with no ownership or
///   location data at all, so it is never attributed to a specific player
///   and is always filtered out. A scan/sector view already shows the NPC
///   gone on the next tick regardless.
#[must_use]
pub fn is_event_relevant(world: &World, event: &Event, player_id: PlayerId) -> bool {
    match &event.kind {
        EventKind::SectorEntered { fleet_id, .. }
        | EventKind::ResourceHarvested { fleet_id, .. }
        | EventKind::ShipDestroyed { fleet_id, .. }
        | EventKind::SalvageCollected { fleet_id, .. } => owns_fleet(world, player_id, *fleet_id),

        EventKind::CombatRoundFired { combat_id, .. } => world
            .combats
            .get(combat_id)
            .is_some_and(|combat| combat.player_fleets.iter().any(|fid| owns_fleet(world, player_id, *fid))),

        EventKind::CombatEnded { hex, .. } => world
            .fleets
            .values()
            .any(|fleet| fleet.owner == player_id && fleet.location == *hex),

        EventKind::BuildingCompleted { player_id: owner, .. }
        | EventKind::ShipCompleted { player_id: owner, .. }
        | EventKind::ResearchCompleted { player_id: owner, .. } => *owner == player_id,

        EventKind::NpcFleetDestroyed { .. } => false,
    }
}

fn owns_fleet(world: &World, player_id: PlayerId, fleet_id: sim_model::FleetId) -> bool {
    world.fleets.get(&fleet_id).is_some_and(|fleet| fleet.owner == player_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use balance::{BuildingType, Resources, ShipClass};
    use hex_geom::Hex;
    use sim_model::{FleetId, FleetStatus, Ship, ShipId};

    fn fleet_owned_by(owner: PlayerId, id: u64, at: Hex) -> Fleet {
        Fleet {
            id: FleetId(id),
            owner,
            location: at,
            status: FleetStatus::Idle,
            ships: vec![Ship::new_for_class(ShipId(id), ShipClass::Scout, 0, 0, 0)],
            ship_count: 1,
            cargo: Resources::new(0, 0, 0),
            fuel: 100,
            fuel_max: 100,
            move_cooldown: 0,
            action_cooldown: 0,
            move_target: None,
            idle_ticks: 0,
        }
    }

    #[test]
    fn sector_entered_is_relevant_only_to_the_owning_player() {
        let mut world = World::new(1);
        let owner = PlayerId(1);
        let fleet = fleet_owned_by(owner, 1, Hex::new(0, 0));
        world.fleets.insert(fleet.id, fleet);

        let event = Event {
            tick: 1,
            kind: EventKind::SectorEntered {
                fleet_id: FleetId(1),
                hex: Hex::new(0, 0),
                first_visit: true,
            },
        };
        assert!(is_event_relevant(&world, &event, owner));
        assert!(!is_event_relevant(&world, &event, PlayerId(2)));
    }

    #[test]
    fn building_completed_matches_on_player_id_directly() {
        let world = World::new(1);
        let event = Event {
            tick: 1,
            kind: EventKind::BuildingCompleted {
                player_id: PlayerId(9),
                building: BuildingType::MetalMine,
                new_level: 1,
            },
        };
        assert!(is_event_relevant(&world, &event, PlayerId(9)));
        assert!(!is_event_relevant(&world, &event, PlayerId(1)));
    }

    #[test]
    fn npc_fleet_destroyed_is_never_attributed() {
        let world = World::new(1);
        let event = Event {
            tick: 1,
            kind: EventKind::NpcFleetDestroyed {
                npc_fleet_id: sim_model::NpcFleetId(1),
            },
        };
        assert!(!is_event_relevant(&world, &event, PlayerId(1)));
    }

    #[test]
    fn combat_ended_falls_back_to_fleet_presence_at_the_hex() {
        let mut world = World::new(1);
        let owner = PlayerId(1);
        let fleet = fleet_owned_by(owner, 1, Hex::new(3, 3));
        world.fleets.insert(fleet.id, fleet);

        let event = Event {
            tick: 1,
            kind: EventKind::CombatEnded {
                combat_id: sim_model::CombatId(1),
                hex: Hex::new(3, 3),
                player_victory: true,
            },
        };
        assert!(is_event_relevant(&world, &event, owner));
        assert!(!is_event_relevant(&world, &event, PlayerId(2)));
    }
}
