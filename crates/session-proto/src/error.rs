// SPDX-License-Identifier: Apache-2.0
//! The numeric error taxonomy carried on the wire (spec.md §6.4/§7):
//! 1000-series command errors, 2000-series auth errors, 5000 server error.

use serde::{Deserialize, Serialize};

/// One wire-visible error. `code` is the numeric discriminant clients key
/// off of; `message()` is the short human string that accompanies it.
///
/// Login failures never reveal name existence (§7): `AuthFailed` and the
/// "name not found" case share one code and one message on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // --- 2000-series: authentication ---
    /// Login credentials did not match, or the name does not exist.
    /// Deliberately identical on the wire to a nonexistent name so a
    /// failed login never confirms whether an account exists.
    AuthFailed,
    /// An already-authenticated session sent another `auth` message.
    AlreadyAuthenticated,
    /// The server has reached `--max-players` and registration is closed.
    RegistrationClosed,
    /// The requested player name is already claimed by an authenticated
    /// account.
    NameTaken,
    /// The player name failed basic validation (empty, too long, etc).
    InvalidPlayerName,
    /// Too many authentication attempts in a short window.
    RateLimited,

    // --- 1000-series: command validation ---
    /// The command payload did not parse into any known variant.
    InvalidCommand,
    /// The named target (sector, fleet) is not a valid target for this
    /// command.
    InvalidTarget,
    /// No connectivity edge exists between the fleet's sector and the
    /// requested target.
    NoConnection,
    /// The fleet does not have enough fuel for this command.
    InsufficientFuel,
    /// The fleet (or the player's building/research/ship slot) is on
    /// cooldown.
    OnCooldown,
    /// No fleet exists with the given id, or it is not owned by this
    /// session's player.
    FleetNotFound,
    /// The command requires the fleet to be at a specific sector (usually
    /// the homeworld) and it is not.
    NotInSector,
    /// The sector has nothing left to harvest or collect.
    NoResources,
    /// The fleet's cargo hold is full.
    CargoFull,
    /// A building or research prerequisite is not yet met.
    PrerequisitesNotMet,
    /// The building or research is already at its maximum level.
    MaxLevelReached,
    /// The player already has an in-progress item of this queue kind.
    QueueFull,
    /// The requested ship class is not yet unlocked by research.
    ShipLocked,
    /// The player has no shipyard (or level 0) and cannot queue ships.
    NoShipyard,
    /// The player has no research lab (or level 0) and cannot queue
    /// research.
    NoResearchLab,
    /// The fleet has no ships (an empty fleet cannot move, harvest, or
    /// fight).
    NoShips,
    /// The fleet is currently enrolled in an active combat.
    InCombat,
    /// The player is already at the open-fleet limit.
    FleetLimit,
    /// The command requires the fleet to be at the player's homeworld.
    NotAtHomeworld,
    /// No queued build/research/ship run exists to cancel.
    NoQueue,
    /// No ship with the given id exists in the docked pool or fleet.
    ShipNotFound,
    /// The docked-ship pool is full.
    DockFull,
    /// No player exists for this session (should not happen post-auth).
    PlayerNotFound,
    /// The player lacks the resources required for this command.
    Resources,
    /// The player lacks the research fragments required for this command.
    InsufficientFragments,

    // --- protocol ---
    /// The inbound frame was not valid JSON, or did not match any known
    /// envelope shape.
    ProtocolError,

    // --- 5000: internal ---
    /// An internal invariant was violated. Logged server-side; the
    /// session remains open unless the invariant is unrecoverable.
    ServerError,
}

impl ErrorCode {
    /// The numeric wire code for this error, per spec.md §6.4's
    /// partitioning (2000s auth, 1000s command, 5000 server).
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            ErrorCode::AuthFailed => 2000,
            ErrorCode::AlreadyAuthenticated => 2001,
            ErrorCode::RegistrationClosed => 2002,
            ErrorCode::NameTaken => 2003,
            ErrorCode::InvalidPlayerName => 2004,
            ErrorCode::RateLimited => 2005,

            ErrorCode::InvalidCommand => 1000,
            ErrorCode::InvalidTarget => 1001,
            ErrorCode::NoConnection => 1002,
            ErrorCode::InsufficientFuel => 1003,
            ErrorCode::OnCooldown => 1004,
            ErrorCode::FleetNotFound => 1005,
            ErrorCode::NotInSector => 1006,
            ErrorCode::NoResources => 1007,
            ErrorCode::CargoFull => 1008,
            ErrorCode::PrerequisitesNotMet => 1009,
            ErrorCode::MaxLevelReached => 1010,
            ErrorCode::QueueFull => 1011,
            ErrorCode::ShipLocked => 1012,
            ErrorCode::NoShipyard => 1013,
            ErrorCode::NoResearchLab => 1014,
            ErrorCode::NoShips => 1015,
            ErrorCode::InCombat => 1016,
            ErrorCode::FleetLimit => 1017,
            ErrorCode::NotAtHomeworld => 1018,
            ErrorCode::NoQueue => 1019,
            ErrorCode::ShipNotFound => 1020,
            ErrorCode::DockFull => 1021,
            ErrorCode::PlayerNotFound => 1022,
            ErrorCode::Resources => 1023,
            ErrorCode::InsufficientFragments => 1024,
            ErrorCode::ProtocolError => 1099,

            ErrorCode::ServerError => 5000,
        }
    }

    /// Short human-readable message for this code. Never reveals whether a
    /// player name exists (§7).
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            ErrorCode::AuthFailed => "invalid player name or token",
            ErrorCode::AlreadyAuthenticated => "session is already authenticated",
            ErrorCode::RegistrationClosed => "registration is closed",
            ErrorCode::NameTaken => "player name is already claimed",
            ErrorCode::InvalidPlayerName => "player name is invalid",
            ErrorCode::RateLimited => "too many attempts, slow down",

            ErrorCode::InvalidCommand => "command did not parse",
            ErrorCode::InvalidTarget => "invalid target",
            ErrorCode::NoConnection => "no connection to that sector",
            ErrorCode::InsufficientFuel => "insufficient fuel",
            ErrorCode::OnCooldown => "on cooldown",
            ErrorCode::FleetNotFound => "fleet not found",
            ErrorCode::NotInSector => "fleet is not at the required sector",
            ErrorCode::NoResources => "nothing to harvest or collect here",
            ErrorCode::CargoFull => "cargo hold is full",
            ErrorCode::PrerequisitesNotMet => "prerequisites not met",
            ErrorCode::MaxLevelReached => "already at maximum level",
            ErrorCode::QueueFull => "a build of this kind is already in progress",
            ErrorCode::ShipLocked => "ship class is not unlocked",
            ErrorCode::NoShipyard => "no shipyard",
            ErrorCode::NoResearchLab => "no research lab",
            ErrorCode::NoShips => "fleet has no ships",
            ErrorCode::InCombat => "fleet is in combat",
            ErrorCode::FleetLimit => "fleet limit reached",
            ErrorCode::NotAtHomeworld => "fleet is not at the homeworld",
            ErrorCode::NoQueue => "nothing queued to cancel",
            ErrorCode::ShipNotFound => "ship not found",
            ErrorCode::DockFull => "docked ship pool is full",
            ErrorCode::PlayerNotFound => "player not found",
            ErrorCode::Resources => "insufficient resources",
            ErrorCode::InsufficientFragments => "insufficient research fragments",
            ErrorCode::ProtocolError => "malformed or unknown message",

            ErrorCode::ServerError => "internal server error",
        }
    }
}

/// The `error` envelope payload: a numeric code plus its short message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    /// Numeric wire code.
    pub code: u32,
    /// Short human-readable message.
    pub message: &'static str,
}

impl From<ErrorCode> for ErrorPayload {
    fn from(code: ErrorCode) -> Self {
        Self {
            code: code.code(),
            message: code.message(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_failed_and_name_not_found_share_wire_identity() {
        // There is no separate "name not found" variant by design (§7): a
        // caller that would otherwise distinguish the two must map both to
        // `AuthFailed`.
        let a = ErrorPayload::from(ErrorCode::AuthFailed);
        assert_eq!(a.code, 2000);
    }

    #[test]
    fn codes_are_partitioned_by_domain() {
        assert!((2000..2100).contains(&ErrorCode::RateLimited.code()));
        assert!((1000..1100).contains(&ErrorCode::DockFull.code()));
        assert_eq!(ErrorCode::ServerError.code(), 5000);
    }
}
