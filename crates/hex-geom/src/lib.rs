// SPDX-License-Identifier: Apache-2.0
//! Axial hex-grid geometry.
//!
//! Pure and allocation-free: coordinates, cube distance, the six canonical
//! directions, a packed 32-bit key codec, and coarse radial zone
//! classification. No entity or world-generation concepts live here.

use serde::{Deserialize, Serialize};

/// Axial coordinate on a flat-top hex grid.
///
/// The cube coordinate `s = -q - r` is derived on demand via [`Hex::s`] and
/// is never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Hex {
    /// Axial column.
    pub q: i16,
    /// Axial row.
    pub r: i16,
}

impl Hex {
    /// The world origin.
    pub const ORIGIN: Hex = Hex { q: 0, r: 0 };

    /// Constructs a coordinate.
    #[must_use]
    pub const fn new(q: i16, r: i16) -> Self {
        Self { q, r }
    }

    /// The derived cube coordinate `-q - r`.
    #[must_use]
    pub fn s(self) -> i32 {
        -i32::from(self.q) - i32::from(self.r)
    }

    /// Packs this coordinate into a 32-bit key: `q` in the low 16 bits,
    /// `r` in the high 16 bits, both reinterpreted as unsigned.
    #[must_use]
    pub fn to_key(self) -> u32 {
        let q = u32::from(self.q as u16);
        let r = u32::from(self.r as u16);
        q | (r << 16)
    }

    /// Inverse of [`Hex::to_key`].
    #[must_use]
    pub fn from_key(key: u32) -> Self {
        let q = (key & 0xFFFF) as u16 as i16;
        let r = ((key >> 16) & 0xFFFF) as u16 as i16;
        Self { q, r }
    }

    /// Cube distance between two coordinates.
    #[must_use]
    pub fn distance(self, other: Self) -> i32 {
        let dq = i32::from(self.q) - i32::from(other.q);
        let dr = i32::from(self.r) - i32::from(other.r);
        let ds = self.s() - other.s();
        (dq.abs() + dr.abs() + ds.abs()) / 2
    }

    /// Distance from the world origin.
    #[must_use]
    pub fn distance_from_origin(self) -> i32 {
        self.distance(Self::ORIGIN)
    }

    /// The neighbor in the given direction.
    #[must_use]
    pub fn neighbor(self, dir: Direction) -> Self {
        let (dq, dr) = dir.offset();
        Self {
            q: self.q.wrapping_add(dq),
            r: self.r.wrapping_add(dr),
        }
    }

    /// All six neighbors in canonical direction order, allocation-free.
    #[must_use]
    pub fn neighbors(self) -> [Self; 6] {
        let mut out = [Self::ORIGIN; 6];
        for (i, dir) in Direction::ALL.iter().enumerate() {
            out[i] = self.neighbor(*dir);
        }
        out
    }

    /// Canonicalizes an unordered pair of coordinates by packed key, smaller
    /// key first. Used everywhere a symmetric pair needs a stable order:
    /// edge-seed hashing, explored-edge storage/lookup.
    #[must_use]
    pub fn canonical_pair(a: Self, b: Self) -> (Self, Self) {
        if a.to_key() <= b.to_key() {
            (a, b)
        } else {
            (b, a)
        }
    }

    /// Coarse radial zone this coordinate falls in.
    #[must_use]
    pub fn zone(self) -> Zone {
        Zone::classify(self.distance_from_origin())
    }
}

/// The six canonical hex directions, in the fixed order used by every
/// direction-taking API (connectivity masks, input mapping, edge tables).
/// The discriminant IS the public index contract — do not reorder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Direction {
    /// East.
    E = 0,
    /// North-east.
    NE = 1,
    /// North-west.
    NW = 2,
    /// West.
    W = 3,
    /// South-west.
    SW = 4,
    /// South-east.
    SE = 5,
}

impl Direction {
    /// All six directions in fixed order; index == discriminant.
    pub const ALL: [Direction; 6] = [
        Direction::E,
        Direction::NE,
        Direction::NW,
        Direction::W,
        Direction::SW,
        Direction::SE,
    ];

    /// Index `0..=5` matching the discriminant, used to build/read bitmasks.
    #[must_use]
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// The direction pointing the opposite way.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Direction::E => Direction::W,
            Direction::NE => Direction::SW,
            Direction::NW => Direction::SE,
            Direction::W => Direction::E,
            Direction::SW => Direction::NE,
            Direction::SE => Direction::NW,
        }
    }

    /// The `(dq, dr)` axial offset for this direction on a flat-top grid.
    #[must_use]
    pub const fn offset(self) -> (i16, i16) {
        match self {
            Direction::E => (1, 0),
            Direction::NE => (1, -1),
            Direction::NW => (0, -1),
            Direction::W => (-1, 0),
            Direction::SW => (-1, 1),
            Direction::SE => (0, 1),
        }
    }

    /// Builds a direction from its `0..=5` index, if valid.
    #[must_use]
    pub const fn from_index(index: u8) -> Option<Self> {
        match index {
            0 => Some(Direction::E),
            1 => Some(Direction::NE),
            2 => Some(Direction::NW),
            3 => Some(Direction::W),
            4 => Some(Direction::SW),
            5 => Some(Direction::SE),
            _ => None,
        }
    }
}

/// A bitmask of connected directions; bit `i` corresponds to `Direction::ALL[i]`.
pub type ConnectivityMask = u8;

/// Returns whether `mask` has `dir` set.
#[must_use]
pub const fn mask_has(mask: ConnectivityMask, dir: Direction) -> bool {
    (mask & (1 << dir.index())) != 0
}

/// Coarse radial band, used by world generation, balance scaling, and NPC
/// respawn delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Zone {
    /// The origin hex only.
    CentralHub,
    /// Distance `1..=8` from origin.
    InnerRing,
    /// Distance `9..=20` from origin.
    OuterRing,
    /// Distance `21..` from origin.
    Wandering,
}

impl Zone {
    /// Inner-ring outer radius.
    pub const INNER_RING_MAX_DIST: i32 = 8;
    /// Outer-ring outer radius.
    pub const OUTER_RING_MAX_DIST: i32 = 20;

    /// Classifies a distance-from-origin into a zone.
    #[must_use]
    pub fn classify(distance_from_origin: i32) -> Self {
        match distance_from_origin {
            0 => Zone::CentralHub,
            d if d <= Self::INNER_RING_MAX_DIST => Zone::InnerRing,
            d if d <= Self::OUTER_RING_MAX_DIST => Zone::OuterRing,
            _ => Zone::Wandering,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn key_roundtrip() {
        for q in [-32768i16, -1, 0, 1, 32767] {
            for r in [-32768i16, -1, 0, 1, 32767] {
                let h = Hex::new(q, r);
                assert_eq!(Hex::from_key(h.to_key()), h);
            }
        }
    }

    #[test]
    fn neighbors_are_distance_one() {
        let h = Hex::new(10, -3);
        for n in h.neighbors() {
            assert_eq!(h.distance(n), 1);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let a = Hex::new(3, -5);
        let b = Hex::new(-2, 7);
        assert_eq!(a.distance(b), b.distance(a));
    }

    #[test]
    fn distance_matches_sum_of_halves() {
        let a = Hex::new(3, -5);
        let b = Hex::new(-2, 7);
        let dq = (a.q as i32 - b.q as i32).abs();
        let dr = (a.r as i32 - b.r as i32).abs();
        let ds = (a.s() - b.s()).abs();
        assert_eq!(a.distance(b), (dq + dr + ds) / 2);
    }

    #[test]
    fn opposite_is_involutive() {
        for d in Direction::ALL {
            assert_eq!(d.opposite().opposite(), d);
        }
    }

    #[test]
    fn neighbor_then_opposite_returns_home() {
        let h = Hex::new(4, 4);
        for d in Direction::ALL {
            let n = h.neighbor(d);
            assert_eq!(n.neighbor(d.opposite()), h);
        }
    }

    #[test]
    fn canonical_pair_is_order_independent() {
        let a = Hex::new(1, 2);
        let b = Hex::new(-4, 9);
        assert_eq!(Hex::canonical_pair(a, b), Hex::canonical_pair(b, a));
    }

    #[test]
    fn zone_classification_boundaries() {
        assert_eq!(Zone::classify(0), Zone::CentralHub);
        assert_eq!(Zone::classify(1), Zone::InnerRing);
        assert_eq!(Zone::classify(8), Zone::InnerRing);
        assert_eq!(Zone::classify(9), Zone::OuterRing);
        assert_eq!(Zone::classify(20), Zone::OuterRing);
        assert_eq!(Zone::classify(21), Zone::Wandering);
    }

    proptest! {
        #[test]
        fn prop_distance_symmetric(q1 in -2000i16..2000, r1 in -2000i16..2000, q2 in -2000i16..2000, r2 in -2000i16..2000) {
            let a = Hex::new(q1, r1);
            let b = Hex::new(q2, r2);
            prop_assert_eq!(a.distance(b), b.distance(a));
        }

        #[test]
        fn prop_key_roundtrip(q in i16::MIN..i16::MAX, r in i16::MIN..i16::MAX) {
            let h = Hex::new(q, r);
            prop_assert_eq!(Hex::from_key(h.to_key()), h);
        }
    }
}
