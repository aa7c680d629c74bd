// SPDX-License-Identifier: Apache-2.0
//! Strongly typed entity identifiers.
//!
//! Every family shares one process-wide monotonic counter
//! ([`World::next_id`](crate::World::next_id)), per §6.5's single
//! `server_state.next_id`. Each wrapper exists only to prevent mixing ids
//! across families at the type level — there is no per-family numbering.

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub u64);

        impl $name {
            /// The raw numeric value.
            #[must_use]
            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(value: u64) -> Self {
                Self(value)
            }
        }
    };
}

entity_id!(PlayerId, "Identifies a player record.");
entity_id!(FleetId, "Identifies a player-owned fleet.");
entity_id!(ShipId, "Identifies a single ship.");
entity_id!(NpcFleetId, "Identifies an NPC fleet.");
entity_id!(CombatId, "Identifies an active or concluded combat.");
