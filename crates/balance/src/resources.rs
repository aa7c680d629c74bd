// SPDX-License-Identifier: Apache-2.0
//! The three-resource bundle shared by costs, production, cargo, and wallets.

use serde::{Deserialize, Serialize};

/// A bundle of the three harvestable/spendable resources, in the fixed
/// order metal, crystal, deuterium used throughout the spec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Resources {
    /// Metal units.
    pub metal: u64,
    /// Crystal units.
    pub crystal: u64,
    /// Deuterium units.
    pub deut: u64,
}

impl Resources {
    /// Constructs a bundle.
    #[must_use]
    pub const fn new(metal: u64, crystal: u64, deut: u64) -> Self {
        Self {
            metal,
            crystal,
            deut,
        }
    }

    /// Scales every component by `factor`, rounding to the nearest unit.
    #[must_use]
    pub fn scale(self, factor: f64) -> Self {
        Self {
            metal: round_u64(self.metal as f64 * factor),
            crystal: round_u64(self.crystal as f64 * factor),
            deut: round_u64(self.deut as f64 * factor),
        }
    }

    /// Scales every component by `count` (for unit cost × count).
    #[must_use]
    pub fn scale_count(self, count: u32) -> Self {
        Self {
            metal: self.metal.saturating_mul(u64::from(count)),
            crystal: self.crystal.saturating_mul(u64::from(count)),
            deut: self.deut.saturating_mul(u64::from(count)),
        }
    }

    /// Component-wise sum.
    #[must_use]
    pub fn add(self, other: Self) -> Self {
        Self {
            metal: self.metal.saturating_add(other.metal),
            crystal: self.crystal.saturating_add(other.crystal),
            deut: self.deut.saturating_add(other.deut),
        }
    }

    /// Component-wise saturating subtraction.
    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self {
            metal: self.metal.saturating_sub(other.metal),
            crystal: self.crystal.saturating_sub(other.crystal),
            deut: self.deut.saturating_sub(other.deut),
        }
    }

    /// True if every component of `self` is at least the matching
    /// component of `other`.
    #[must_use]
    pub fn covers(self, other: Self) -> bool {
        self.metal >= other.metal && self.crystal >= other.crystal && self.deut >= other.deut
    }

    /// A fixed fraction (fixed-point ×1000) of this bundle, rounded down.
    #[must_use]
    pub fn fraction_milli(self, milli: u32) -> Self {
        Self {
            metal: self.metal * u64::from(milli) / 1000,
            crystal: self.crystal * u64::from(milli) / 1000,
            deut: self.deut * u64::from(milli) / 1000,
        }
    }
}

fn round_u64(value: f64) -> u64 {
    value.round().clamp(0.0, u64::MAX as f64) as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn covers_is_component_wise() {
        let have = Resources::new(10, 10, 10);
        assert!(have.covers(Resources::new(5, 5, 5)));
        assert!(!have.covers(Resources::new(11, 0, 0)));
    }

    #[test]
    fn fraction_milli_rounds_down() {
        let r = Resources::new(999, 0, 0);
        assert_eq!(r.fraction_milli(500).metal, 499);
    }
}
