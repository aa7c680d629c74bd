// SPDX-License-Identifier: Apache-2.0
//! Single-slot-per-kind build/research/ship queues.

use balance::{BuildingType, ResearchTech, ShipClass};
use serde::{Deserialize, Serialize};

/// A player's in-progress building upgrade. Cleared on completion or
/// cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildQueue {
    /// Building under construction.
    pub building: BuildingType,
    /// Level being built toward.
    pub target_level: u32,
    /// Tick the build started.
    pub start_tick: u64,
    /// Tick the build completes.
    pub end_tick: u64,
}

/// A player's in-progress research. Cleared on completion or cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchQueue {
    /// Tech under research.
    pub tech: ResearchTech,
    /// Level being researched toward.
    pub target_level: u32,
    /// Tick research started.
    pub start_tick: u64,
    /// Tick research completes.
    pub end_tick: u64,
}

/// A player's in-progress ship production run. Each completion appends one
/// ship to the docked pool; the queue advances to the next unit or clears
/// when `built == requested_count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShipQueue {
    /// Class under construction.
    pub class: ShipClass,
    /// Total ships originally requested.
    pub requested_count: u32,
    /// Ships completed so far.
    pub built: u32,
    /// Tick the current unit started.
    pub start_tick: u64,
    /// Tick the current unit completes.
    pub end_tick: u64,
}

impl ShipQueue {
    /// Ships still to be built after the current unit completes.
    #[must_use]
    pub fn remaining_after_current(&self) -> u32 {
        self.requested_count.saturating_sub(self.built + 1)
    }
}
