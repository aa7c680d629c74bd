// SPDX-License-Identifier: Apache-2.0
//! The per-sector mutable overlay over the procedurally generated
//! template.

use balance::Resources;
use serde::{Deserialize, Serialize};
use worldgen::Density;

/// A time-limited resource pile left by a defeated NPC fleet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Salvage {
    /// Resources available to collect.
    pub resources: Resources,
    /// Tick at which this pile disappears.
    pub despawn_tick: u64,
}

/// Created lazily when any modification occurs at a sector; never
/// explicitly freed (fields may all revert to default, leaving a
/// logically-empty-but-present override).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SectorOverride {
    /// Per-resource density overrides; `None` means "use the template's
    /// density for this resource".
    pub densities: [Option<Density>; 3],
    /// Running harvest accumulators, one per resource, in
    /// [`worldgen::RESOURCE_ORDER`].
    pub harvest_accum: [u32; 3],
    /// Active salvage pile, if any.
    pub salvage: Option<Salvage>,
    /// Tick the sector's NPC presence was last cleared by player victory;
    /// the template may not respawn an NPC here until the zone's respawn
    /// delay has passed this tick.
    pub npc_cleared_tick: Option<u64>,
}

impl SectorOverride {
    /// True if every field is at its default — a caller may drop such an
    /// override, though the spec does not require it ("never explicitly
    /// freed").
    #[must_use]
    pub fn is_default(&self) -> bool {
        self.densities == [None, None, None]
            && self.harvest_accum == [0, 0, 0]
            && self.salvage.is_none()
            && self.npc_cleared_tick.is_none()
    }
}
