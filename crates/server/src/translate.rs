// SPDX-License-Identifier: Apache-2.0
//! Wire ↔ engine translation: the boundary `DESIGN.md` draws between
//! `session-proto`'s wire types and `sim-engine`'s internal `Command` so
//! the simulation core never depends on the wire schema.
//!
//! Also owns reconnect-token minting. `sim_engine::register` takes a
//! pre-computed digest rather than a plaintext credential, so the `server`
//! binary is the one place that mints the plaintext token returned to the
//! client and derives the digest handed to the engine — grounded on
//! `sim_engine::registration`'s own wall-clock-seeded `pick_homeworld`,
//! since no `rand` crate is part of this workspace's dependency stack.

use std::time::{SystemTime, UNIX_EPOCH};

use session_proto::{AttackTarget as WireAttackTarget, ClientCommand, ErrorCode, QueueKind as WireQueueKind};
use sim_engine::{AttackTarget as EngineAttackTarget, Command, CommandError, QueueKind as EngineQueueKind};

/// Translates a decoded wire command into its engine-side equivalent. The
/// two enums are structurally identical one field at a time (see
/// `DESIGN.md`'s `session-proto` entry), so this is a pure reshuffle with no
/// validation of its own — validation happens inside `Engine::apply_command`.
#[must_use]
pub fn to_engine_command(command: ClientCommand) -> Command {
    match command {
        ClientCommand::Move { fleet_id, target } => Command::Move { fleet_id, target },
        // `resource` rides the wire per spec.md §6.2 but the tick-phase
        // harvester (§4.4 phase 3) always works all three resources in
        // fixed order regardless of which one the client named, so it is
        // dropped here rather than threaded into a validation path that
        // would only ever ignore it.
        ClientCommand::Harvest { fleet_id, resource: _ } => Command::Harvest { fleet_id },
        ClientCommand::Attack { fleet_id, target } => Command::Attack {
            fleet_id,
            target: to_engine_attack_target(target),
        },
        ClientCommand::Recall { fleet_id } => Command::Recall { fleet_id },
        ClientCommand::CollectSalvage { fleet_id } => Command::CollectSalvage { fleet_id },
        ClientCommand::Build { building } => Command::Build { building },
        ClientCommand::Research { tech } => Command::Research { tech },
        ClientCommand::BuildShip { class, count } => Command::BuildShip { class, count },
        ClientCommand::CancelBuild { queue } => Command::CancelBuild {
            queue: to_engine_queue_kind(queue),
        },
        ClientCommand::Stop { fleet_id } => Command::Stop { fleet_id },
        ClientCommand::Scan { fleet_id } => Command::Scan { fleet_id },
        ClientCommand::CreateFleet { ship_ids } => Command::CreateFleet { ship_ids },
        ClientCommand::DissolveFleet { fleet_id } => Command::DissolveFleet { fleet_id },
        ClientCommand::TransferShip {
            ship_id,
            from_fleet,
            to_fleet,
        } => Command::TransferShip {
            ship_id,
            from_fleet,
            to_fleet,
        },
        ClientCommand::DockShip { fleet_id, ship_id } => Command::DockShip { fleet_id, ship_id },
    }
}

fn to_engine_attack_target(target: WireAttackTarget) -> EngineAttackTarget {
    match target {
        WireAttackTarget::Player(fleet_id) => EngineAttackTarget::Player(fleet_id),
        WireAttackTarget::Npc(npc_fleet_id) => EngineAttackTarget::Npc(npc_fleet_id),
    }
}

fn to_engine_queue_kind(queue: WireQueueKind) -> EngineQueueKind {
    match queue {
        WireQueueKind::Building => EngineQueueKind::Building,
        WireQueueKind::Research => EngineQueueKind::Research,
        WireQueueKind::Ship => EngineQueueKind::Ship,
    }
}

/// Maps a rejected command onto its wire error code (the 1000-series).
#[must_use]
pub const fn command_error_code(error: CommandError) -> ErrorCode {
    match error {
        CommandError::FleetNotFound => ErrorCode::FleetNotFound,
        CommandError::NoShips => ErrorCode::NoShips,
        CommandError::InCombat => ErrorCode::InCombat,
        CommandError::OnCooldown => ErrorCode::OnCooldown,
        CommandError::NoConnection => ErrorCode::NoConnection,
        CommandError::InsufficientFuel => ErrorCode::InsufficientFuel,
        CommandError::NoResources => ErrorCode::NoResources,
        CommandError::CargoFull => ErrorCode::CargoFull,
        CommandError::InvalidTarget => ErrorCode::InvalidTarget,
        CommandError::PlayerNotFound => ErrorCode::PlayerNotFound,
        CommandError::QueueFull => ErrorCode::QueueFull,
        CommandError::MaxLevelReached => ErrorCode::MaxLevelReached,
        CommandError::PrerequisitesNotMet => ErrorCode::PrerequisitesNotMet,
        CommandError::Resources => ErrorCode::Resources,
        CommandError::NoResearchLab => ErrorCode::NoResearchLab,
        CommandError::InsufficientFragments => ErrorCode::InsufficientFragments,
        CommandError::ShipLocked => ErrorCode::ShipLocked,
        CommandError::NoShipyard => ErrorCode::NoShipyard,
        CommandError::FleetLimit => ErrorCode::FleetLimit,
        CommandError::NotAtHomeworld => ErrorCode::NotAtHomeworld,
        CommandError::NoQueue => ErrorCode::NoQueue,
        CommandError::ShipNotFound => ErrorCode::ShipNotFound,
        CommandError::DockFull => ErrorCode::DockFull,
    }
}

/// Maps a rejected auth attempt onto its wire error code (spec.md §7:
/// `AuthFailed` never distinguishes "unknown name" from "wrong token").
#[must_use]
pub const fn auth_error_code(error: sim_engine::AuthError) -> ErrorCode {
    match error {
        sim_engine::AuthError::NameTaken => ErrorCode::NameTaken,
        sim_engine::AuthError::InvalidName => ErrorCode::InvalidPlayerName,
        sim_engine::AuthError::AuthFailed => ErrorCode::AuthFailed,
    }
}

/// Mints a fresh reconnect token for a successful `register`, returning
/// `(plaintext_token, digest)`. The plaintext goes to the client once and is
/// never stored; only the digest is persisted (`Player::auth_digest`), and a
/// later `login` is checked by recomputing the digest with
/// [`digest_token`] and comparing.
///
/// Entropy comes from wall-clock nanoseconds combined with a caller-supplied
/// nonce (the hub's session counter), the same source
/// `sim_engine::registration`'s homeworld placement already relies on in
/// this dependency-stack — there is no `rand` crate in the workspace.
#[must_use]
pub fn mint_token(nonce: u64) -> (String, String) {
    let now_nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0);
    let mut hasher = blake3::Hasher::new();
    hasher.update(&now_nanos.to_le_bytes());
    hasher.update(&nonce.to_le_bytes());
    let token = hasher.finalize().to_hex().to_string();
    let digest = digest_token(&token);
    (token, digest)
}

/// Derives the stored digest for a client-presented token; `login` compares
/// this against `Player::auth_digest`.
#[must_use]
pub fn digest_token(token: &str) -> String {
    blake3::hash(token.as_bytes()).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minted_token_and_digest_are_distinct_but_linked() {
        let (token, digest) = mint_token(1);
        assert_ne!(token, digest);
        assert_eq!(digest_token(&token), digest);
    }

    #[test]
    fn distinct_nonces_mint_distinct_tokens() {
        let (a, _) = mint_token(1);
        let (b, _) = mint_token(2);
        assert_ne!(a, b);
    }

    #[test]
    fn command_error_maps_to_expected_wire_code() {
        assert_eq!(command_error_code(CommandError::FleetNotFound).code(), 1005);
        assert_eq!(command_error_code(CommandError::InCombat).code(), 1016);
        assert_eq!(command_error_code(CommandError::DockFull).code(), 1021);
    }

    #[test]
    fn auth_failed_never_distinguishes_unknown_name() {
        assert_eq!(
            auth_error_code(sim_engine::AuthError::AuthFailed).code(),
            ErrorCode::AuthFailed.code()
        );
    }
}
