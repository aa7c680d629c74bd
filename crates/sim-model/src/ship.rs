// SPDX-License-Identifier: Apache-2.0
//! A single ship: the unit combat, cargo, and fuel math operates on.

use balance::ShipClass;
use serde::{Deserialize, Serialize};

use crate::ids::ShipId;

/// A single ship, living inside a fleet's ship array or a player's docked
/// pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ship {
    /// Stable identity, persisted and referenced in events.
    pub id: ShipId,
    /// Hull class, indexing [`balance::ship_stats`] for base numbers.
    pub class: ShipClass,
    /// Current hull points. Zero or below means destroyed.
    pub hull: u32,
    /// Maximum hull points after research modifiers.
    pub hull_max: u32,
    /// Current shield points.
    pub shield: u32,
    /// Maximum shield points after research modifiers.
    pub shield_max: u32,
    /// Weapon power after research modifiers.
    pub weapon_power: u32,
    /// Speed after research modifiers (higher is faster).
    pub speed: u32,
}

impl Ship {
    /// Builds a fresh ship of `class` at full hull/shield, with stats
    /// scaled by the owner's current research modifiers.
    #[must_use]
    pub fn new_for_class(
        id: ShipId,
        class: balance::ShipClass,
        hull_tech_level: u32,
        shield_tech_level: u32,
        weapon_tech_level: u32,
    ) -> Self {
        let base = balance::ship_stats(class);
        let hull_max = apply_milli(base.hull_max, balance::combat_stat_modifier_milli(hull_tech_level));
        let shield_max = apply_milli(
            base.shield_max,
            balance::combat_stat_modifier_milli(shield_tech_level),
        );
        let weapon_power = apply_milli(
            base.weapon_power,
            balance::combat_stat_modifier_milli(weapon_tech_level),
        );
        Self {
            id,
            class,
            hull: hull_max,
            hull_max,
            shield: shield_max,
            shield_max,
            weapon_power,
            speed: base.speed,
        }
    }

    /// True once hull has reached zero or below.
    #[must_use]
    pub const fn is_destroyed(&self) -> bool {
        self.hull == 0
    }

    /// Applies `amount` of damage: shield absorbs first, overflow reduces
    /// hull. Returns the overflow actually applied to hull.
    pub fn apply_damage(&mut self, amount: u32) -> u32 {
        let absorbed = amount.min(self.shield);
        self.shield -= absorbed;
        let overflow = amount - absorbed;
        let hull_loss = overflow.min(self.hull);
        self.hull -= hull_loss;
        hull_loss
    }

    /// Restores shield by a fraction (fixed-point ×1000) of max, capped at
    /// max.
    pub fn regen_shield_milli(&mut self, milli: u32) {
        let amount = (u64::from(self.shield_max) * u64::from(milli) / 1000) as u32;
        self.shield = (self.shield + amount).min(self.shield_max);
    }
}

fn apply_milli(base: u32, milli: u32) -> u32 {
    (u64::from(base) * u64::from(milli) / 1000) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damage_drains_shield_before_hull() {
        let mut ship = Ship::new_for_class(ShipId(1), balance::ShipClass::Scout, 0, 0, 0);
        let shield = ship.shield;
        ship.apply_damage(shield - 1);
        assert_eq!(ship.shield, 1);
        assert_eq!(ship.hull, ship.hull_max);
    }

    #[test]
    fn damage_overflow_reduces_hull() {
        let mut ship = Ship::new_for_class(ShipId(1), balance::ShipClass::Scout, 0, 0, 0);
        let total = ship.shield + 10;
        ship.apply_damage(total);
        assert_eq!(ship.shield, 0);
        assert_eq!(ship.hull, ship.hull_max - 10);
    }

    #[test]
    fn shield_regen_never_exceeds_max() {
        let mut ship = Ship::new_for_class(ShipId(1), balance::ShipClass::Scout, 0, 0, 0);
        ship.regen_shield_milli(1000);
        assert_eq!(ship.shield, ship.shield_max);
    }
}
