// SPDX-License-Identifier: Apache-2.0
//! Prerequisite graph for buildings and research, expressed as data so it
//! is evaluated by a single generic checker rather than hard-coded into
//! command-handler control flow.

use crate::{BuildingType, ResearchTech};

/// One edge of the prerequisite DAG: a minimum building or research level
/// that must already be held.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prereq {
    /// Requires the named building at or above the given level.
    Building(BuildingType, u32),
    /// Requires the named research at or above the given level.
    Research(ResearchTech, u32),
}

/// Prerequisites that must hold before building `target` can begin.
#[must_use]
pub fn building_prereqs(target: BuildingType) -> &'static [Prereq] {
    match target {
        BuildingType::MetalMine
        | BuildingType::CrystalMine
        | BuildingType::DeutSynthesizer => &[],
        BuildingType::Shipyard => &[Prereq::Building(BuildingType::MetalMine, 2)],
        BuildingType::ResearchLab => &[Prereq::Building(BuildingType::CrystalMine, 2)],
        BuildingType::FuelDepot => &[Prereq::Building(BuildingType::DeutSynthesizer, 3)],
    }
}

/// Prerequisites that must hold before research `target` can begin.
#[must_use]
pub fn research_prereqs(target: ResearchTech) -> &'static [Prereq] {
    match target {
        ResearchTech::HullTech | ResearchTech::ShieldTech | ResearchTech::WeaponTech => &[],
        ResearchTech::FuelEfficiency => &[Prereq::Research(ResearchTech::WeaponTech, 1)],
        ResearchTech::ExtendedTanks => &[Prereq::Research(ResearchTech::FuelEfficiency, 2)],
        ResearchTech::HarvestTech => &[],
        ResearchTech::Navigation => &[Prereq::Research(ResearchTech::FuelEfficiency, 1)],
        ResearchTech::EmergencyJump => &[Prereq::Research(ResearchTech::HullTech, 3)],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_mines_have_no_prereqs() {
        assert!(building_prereqs(BuildingType::MetalMine).is_empty());
    }

    #[test]
    fn shipyard_requires_metal_mine() {
        assert_eq!(
            building_prereqs(BuildingType::Shipyard),
            &[Prereq::Building(BuildingType::MetalMine, 2)]
        );
    }
}
