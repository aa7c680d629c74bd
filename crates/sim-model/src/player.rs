// SPDX-License-Identifier: Apache-2.0
//! Player records.

use std::collections::HashMap;

use balance::{BuildingType, ResearchTech, Resources};
use hex_geom::Hex;
use serde::{Deserialize, Serialize};

use crate::ids::PlayerId;
use crate::queue::{BuildQueue, ResearchQueue, ShipQueue};
use crate::ship::Ship;

/// A registered player. Created on first successful authentication;
/// mutated by tick and command processing; never deleted by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    /// Stable identity.
    pub id: PlayerId,
    /// Unique display name, also the login key.
    pub name: String,
    /// Current resource wallet.
    pub resources: Resources,
    /// Research fragments, a currency separate from metal/crystal/deut,
    /// awarded by combat loot and spent on research.
    pub fragments: u32,
    /// The hex this player's homeworld occupies.
    pub homeworld: Hex,
    /// Current level of each building, defaulting to 0 for unbuilt ones.
    pub buildings: HashMap<BuildingType, u32>,
    /// Current level of each research, defaulting to 0 for unresearched
    /// ones.
    pub research: HashMap<ResearchTech, u32>,
    /// At most one in-flight building upgrade.
    pub building_queue: Option<BuildQueue>,
    /// At most one in-flight research.
    pub research_queue: Option<ResearchQueue>,
    /// At most one in-flight ship production run.
    pub ship_queue: Option<ShipQueue>,
    /// Password/token digest. `None` marks a never-claimed legacy name
    /// eligible for idempotent registration-claim.
    pub auth_digest: Option<String>,
    /// Tick (or wall-clock derived value at registration) this player was
    /// created.
    pub created_at: u64,
    /// Tick of the most recent successful login.
    pub last_login_at: u64,
    /// Ships docked at the homeworld, outside any fleet.
    pub docked_ships: Vec<Ship>,
    /// Component upgrades won as combat loot, keyed by a stable component
    /// name (e.g. `"weapon_core"`), counted by how many have been
    /// awarded. Not yet consumable by any command in this spec; tracked
    /// so loot awards round-trip through persistence.
    pub components: HashMap<String, u32>,
}

impl Player {
    /// Current level of `building`, 0 if never built.
    #[must_use]
    pub fn building_level(&self, building: BuildingType) -> u32 {
        self.buildings.get(&building).copied().unwrap_or(0)
    }

    /// Current level of `tech`, 0 if never researched.
    #[must_use]
    pub fn research_level(&self, tech: ResearchTech) -> u32 {
        self.research.get(&tech).copied().unwrap_or(0)
    }
}
