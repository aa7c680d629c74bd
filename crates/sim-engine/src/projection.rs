// SPDX-License-Identifier: Apache-2.0
//! Read-only sector projection: merges the procedural template, any
//! persisted override, and live NPC presence into one view. Sector state is
//! never stored directly — this function is the only place it is computed.

use hex_geom::Hex;
use sim_model::{NpcFleetId, Salvage, World};
use worldgen::{Density, NpcBehavior, NpcShipClass, Terrain};

/// NPC presence at a sector: either an already-spawned fleet, or an
/// unspawned template the player can still see (and attack, once it
/// materializes on arrival).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NpcPresence {
    /// A materialized NPC fleet.
    Spawned {
        /// The spawned fleet's id.
        npc_fleet_id: NpcFleetId,
        /// Live ship count.
        ship_count: u32,
        /// Behavior, inherited from the template.
        behavior: NpcBehavior,
        /// True if currently enrolled in combat.
        in_combat: bool,
    },
    /// A template that has not yet spawned a fleet (or was cleared and is
    /// still within its zone's respawn delay).
    Template {
        /// Hull class the template would spawn.
        class: NpcShipClass,
        /// Ship count range the template would roll from.
        count_range: (u16, u16),
        /// Behavior the template would spawn with.
        behavior: NpcBehavior,
    },
}

/// A point-in-time view of one sector, computed from generator output plus
/// whatever override and live state currently exist.
#[derive(Debug, Clone, Copy)]
pub struct SectorProjection {
    /// The sector's coordinate.
    pub hex: Hex,
    /// Terrain, which a template never changes after generation.
    pub terrain: Terrain,
    /// Current per-resource density, template value unless overridden.
    pub densities: [Density; 3],
    /// Current NPC presence, if any.
    pub npc: Option<NpcPresence>,
    /// Active salvage pile, if any.
    pub salvage: Option<Salvage>,
}

/// Computes the current projection of `hex`.
#[must_use]
pub fn sector_view(world: &World, hex: Hex) -> SectorProjection {
    let template = worldgen::generate_sector(world.world_seed, hex);
    let overlay = world.sectors.get(&hex);

    let mut densities = template.densities;
    if let Some(ov) = overlay {
        for (i, density) in densities.iter_mut().enumerate() {
            if let Some(d) = ov.densities[i] {
                *density = d;
            }
        }
    }
    let salvage = overlay.and_then(|ov| ov.salvage);

    let npc = world
        .npc_fleets
        .values()
        .find(|n| n.location == hex && n.has_ships())
        .map(|n| NpcPresence::Spawned {
            npc_fleet_id: n.id,
            ship_count: n.live_ships().len() as u32,
            behavior: n.behavior,
            in_combat: n.in_combat,
        })
        .or_else(|| {
            let respawn_blocked = overlay
                .and_then(|ov| ov.npc_cleared_tick)
                .is_some_and(|cleared| {
                    world.current_tick.saturating_sub(cleared) < balance::constants::zone_respawn_delay(hex.zone())
                });
            if respawn_blocked {
                None
            } else {
                template.npc.map(|t| NpcPresence::Template {
                    class: t.class,
                    count_range: t.count_range,
                    behavior: t.behavior,
                })
            }
        });

    SectorProjection {
        hex,
        terrain: template.terrain,
        densities,
        npc,
        salvage,
    }
}

/// Maps a world-generator NPC hull class onto the combat/ship-stat class
/// used to build the fleet's actual ships.
#[must_use]
pub(crate) fn ship_class_for_npc(class: NpcShipClass) -> balance::ShipClass {
    match class {
        NpcShipClass::Raider => balance::ShipClass::Corvette,
        NpcShipClass::Marauder => balance::ShipClass::Frigate,
        NpcShipClass::Dreadnought => balance::ShipClass::Battleship,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ship_class_for_npc_maps_every_hull_to_a_distinct_combat_class() {
        assert_eq!(ship_class_for_npc(NpcShipClass::Raider), balance::ShipClass::Corvette);
        assert_eq!(ship_class_for_npc(NpcShipClass::Marauder), balance::ShipClass::Frigate);
        assert_eq!(ship_class_for_npc(NpcShipClass::Dreadnought), balance::ShipClass::Battleship);
    }

    #[test]
    fn sector_view_on_an_untouched_sector_carries_no_salvage() {
        let world = World::new(7);
        let hex = Hex::new(6, 6);
        let view = sector_view(&world, hex);
        assert_eq!(view.hex, hex);
        assert!(view.salvage.is_none());
    }

    #[test]
    fn sector_view_prefers_a_live_npc_fleet_over_the_generator_template() {
        let mut world = World::new(7);
        let hex = Hex::new(6, 6);
        let npc_id = NpcFleetId::from(world.alloc_id());
        let ship_id = world.alloc_ship_id();
        let ship = sim_model::Ship::new_for_class(ship_id, balance::ShipClass::Corvette, 0, 0, 0);
        world.npc_fleets.insert(
            npc_id,
            sim_model::NpcFleet {
                id: npc_id,
                location: hex,
                ships: vec![ship],
                ship_count: 1,
                class: NpcShipClass::Raider,
                behavior: NpcBehavior::Aggressive,
                home_sector: hex,
                patrol_cooldown: 0,
                in_combat: false,
            },
        );

        let view = sector_view(&world, hex);
        match view.npc {
            Some(NpcPresence::Spawned { npc_fleet_id, ship_count, .. }) => {
                assert_eq!(npc_fleet_id, npc_id);
                assert_eq!(ship_count, 1);
            }
            other => panic!("expected a spawned NPC presence, got {other:?}"),
        }
    }

    #[test]
    fn sector_view_applies_a_density_override() {
        let mut world = World::new(7);
        let hex = Hex::new(2, 2);
        {
            let mut overlay = world.dirty_sector(hex);
            overlay.densities[0] = Some(Density::Pristine);
        }
        let view = sector_view(&world, hex);
        assert_eq!(view.densities[0], Density::Pristine);
    }
}
