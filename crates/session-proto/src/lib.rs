// SPDX-License-Identifier: Apache-2.0
//! Wire schema for the game's JSON-over-WebSocket session protocol.
//!
//! Every message is one JSON object carrying exactly one externally-tagged
//! key (`{"move": {...}}`, `{"tick_update": {...}}`, ...); the WebSocket
//! text frame is the only framing, so encoding is a direct `serde_json`
//! round trip (see [`wire`]). This crate owns the shapes only — dispatch
//! lives in `sim-engine`, transport in the `server` binary.

pub mod error;
pub mod wire;

use balance::{BuildingType, ResearchTech, ShipClass};
use hex_geom::Hex;
use serde::{Deserialize, Serialize};
use sim_model::{Event, FleetId, FleetStatus, NpcFleetId, PlayerId, ShipId};
use worldgen::{Density, NpcBehavior, NpcShipClass, Resource, Terrain};

pub use error::{ErrorCode, ErrorPayload};

/// A single inbound message from a client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientEnvelope {
    /// First message on a new connection: register a new player or resume
    /// an existing one.
    Auth(AuthPayload),
    /// A simulation command issued by an already-authenticated session.
    Command(ClientCommand),
    /// Updates a session's self-reported client metadata without touching
    /// simulation state.
    PolicyUpdate(PolicyUpdatePayload),
    /// Asks the server to resend this session's full state on the next
    /// tick, rather than waiting for the periodic resync (§6.3).
    RequestFullState {},
}

/// The `auth` envelope payload (spec.md §6.2): register a fresh player or
/// log back into an existing one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthPayload {
    /// The player's chosen or claimed name.
    pub player_name: String,
    /// Which of the two auth flows this message performs.
    #[serde(flatten)]
    pub action: AuthAction,
    /// Optional free-form client identification (not validated).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
}

/// Tagged by the `action` field, flattened into [`AuthPayload`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum AuthAction {
    /// Claim a new, never-before-seen player name.
    Register,
    /// Resume an existing player using its reconnect token.
    Login {
        /// The reconnect token issued at registration (or previous login).
        token: String,
    },
}

/// The `policy_update` envelope payload. Out of the simulation's concern
/// (spec.md §1 treats authentication/authorization policy as a surrounding,
/// externally-governed concept) — this is limited to the one self-reported
/// field a session may revise post-auth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyUpdatePayload {
    /// Updated free-form client identification.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_type: Option<String>,
}

/// Which in-flight queue a `cancel_build` command targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueKind {
    /// The player's building upgrade queue.
    Building,
    /// The player's research queue.
    Research,
    /// The player's ship production queue.
    Ship,
}

/// A simulation command, one variant per row of spec.md §4.4's command
/// table, extended additively with `stop`/`scan` (named but left
/// unspecified by §6.2) and the fleet-management rows §4.4 lists but §6.2's
/// wire prose omits (`create_fleet`/`dissolve_fleet`/`transfer_ship`/
/// `dock_ship`) — the protocol only exposes what the simulation exposes
/// (§1), so every handler in `sim-engine::commands` gets a wire command.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientCommand {
    /// Move a fleet toward an adjacent connected sector.
    Move {
        /// The fleet to move.
        fleet_id: FleetId,
        /// The destination hex; must be a connected neighbor of the
        /// fleet's current location.
        target: Hex,
    },
    /// Begin harvesting at the fleet's current sector. The engine always
    /// harvests all three resources in fixed order once harvesting starts
    /// (spec.md §4.4 phase 3); `resource` only labels the client's intent
    /// and does not restrict what gets harvested.
    Harvest {
        /// The fleet to harvest with.
        fleet_id: FleetId,
        /// The resource the client named when issuing the command.
        resource: Resource,
    },
    /// Attack another fleet (player or NPC) occupying the same sector.
    Attack {
        /// The attacking fleet.
        fleet_id: FleetId,
        /// The target fleet's id, as either a player or NPC fleet.
        target: AttackTarget,
    },
    /// Recall a fleet back toward its owner's homeworld.
    Recall {
        /// The fleet to recall.
        fleet_id: FleetId,
    },
    /// Collect a sector's salvage into the fleet's cargo hold.
    CollectSalvage {
        /// The fleet collecting salvage.
        fleet_id: FleetId,
    },
    /// Queue a building upgrade at the player's homeworld.
    Build {
        /// Which building to upgrade.
        building: BuildingType,
    },
    /// Queue a research upgrade.
    Research {
        /// Which technology to upgrade.
        tech: ResearchTech,
    },
    /// Queue ship production at the homeworld's shipyard.
    BuildShip {
        /// Which ship class to build.
        class: ShipClass,
        /// How many units to queue.
        count: u32,
    },
    /// Cancel an in-progress build, research, or ship production run.
    CancelBuild {
        /// Which queue to cancel.
        queue: QueueKind,
    },
    /// Cancel a fleet's current move or harvest order, if any, and leave
    /// it idle where it stands. No effect on a fleet already idle or in
    /// combat.
    Stop {
        /// The fleet to stop.
        fleet_id: FleetId,
    },
    /// Request a one-off ownership-checked read of a fleet; validates the
    /// fleet belongs to the caller but mutates nothing. The resulting view
    /// arrives on the next `tick_update` exactly as it would without the
    /// scan, since per-tick sector projection already runs unconditionally
    /// (§4.6 step 3) — `scan` exists to surface `FleetNotFound` promptly
    /// rather than to change what gets sent.
    Scan {
        /// The fleet to validate ownership of.
        fleet_id: FleetId,
    },
    /// Split off a new fleet from the homeworld's docked ship pool.
    CreateFleet {
        /// Ids of currently-docked ships to crew the new fleet with.
        ship_ids: Vec<ShipId>,
    },
    /// Dissolve an idle fleet at the homeworld back into the docked pool.
    DissolveFleet {
        /// The fleet to dissolve.
        fleet_id: FleetId,
    },
    /// Move a ship between two of the player's idle fleets at the same
    /// sector.
    TransferShip {
        /// The ship to move.
        ship_id: ShipId,
        /// The fleet to remove it from.
        from_fleet: FleetId,
        /// The fleet to add it to.
        to_fleet: FleetId,
    },
    /// Dock a ship from an idle fleet at the homeworld into the docked
    /// pool.
    DockShip {
        /// The fleet currently holding the ship.
        fleet_id: FleetId,
        /// The ship to dock.
        ship_id: ShipId,
    },
}

/// The target of an `attack` command: combat can be joined against either
/// a rival player's fleet or an NPC fleet.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttackTarget {
    /// A rival player's fleet.
    Player(FleetId),
    /// An NPC fleet.
    Npc(NpcFleetId),
}

/// A single outbound message to a client session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServerEnvelope {
    /// Reply to an `auth` message.
    AuthResult(AuthResultPayload),
    /// The periodic per-tick delta (§6.3).
    TickUpdate(TickUpdatePayload),
    /// A full resync of the caller's visible state, sent once right after
    /// a successful auth and again whenever `request_full_state` is asked
    /// for.
    FullState(FullStatePayload),
    /// A single simulation event relevant to this session.
    Event(Event),
    /// A command or auth attempt was rejected.
    Error(ErrorPayload),
}

/// The `auth_result` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResultPayload {
    /// Whether authentication succeeded.
    pub success: bool,
    /// The authenticated player's id, present only on success.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_id: Option<PlayerId>,
    /// The reconnect token to use on a future `login`, present only for a
    /// successful `register`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// The failure detail, present only on failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

/// The `tick_update` payload: the tick number plus whichever sub-updates
/// changed for this session's player this tick (§6.3). Every optional field
/// is omitted, not null, when nothing changed, to keep steady-state ticks
/// small.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickUpdatePayload {
    /// The tick this update describes.
    pub tick: u64,
    /// The caller's player record, present only if it became dirty this
    /// tick.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player: Option<PlayerView>,
    /// The caller's fleets that changed this tick.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fleets: Vec<FleetView>,
    /// Sector views for every hex one of the caller's fleets currently
    /// occupies, refreshed unconditionally each tick (§4.6 step 3).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub sectors: Vec<SectorView>,
    /// The homeworld's sector view, present only if it became dirty this
    /// tick and isn't already covered by `sectors`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub homeworld: Option<SectorView>,
    /// Events relevant to this session produced during this tick.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub events: Vec<Event>,
}

/// The `full_state` payload: everything a freshly (re)connected client
/// needs to render without waiting for incremental deltas.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullStatePayload {
    /// The tick this snapshot was taken at.
    pub tick: u64,
    /// The caller's player record.
    pub player: PlayerView,
    /// All of the caller's fleets.
    pub fleets: Vec<FleetView>,
    /// Sector views for the homeworld and every occupied fleet location.
    pub sectors: Vec<SectorView>,
}

/// A player-facing view of [`sim_model::Player`], omitting the
/// authentication digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    /// The player's id.
    pub id: PlayerId,
    /// The player's chosen name.
    pub name: String,
    /// Current metal/crystal/deuterium stockpile.
    pub resources: balance::Resources,
    /// Current research fragment count.
    pub fragments: u32,
    /// The player's homeworld hex.
    pub homeworld: Hex,
    /// Building levels, one entry per constructed building.
    pub buildings: Vec<(BuildingType, u32)>,
    /// Research levels, one entry per completed technology.
    pub research: Vec<(ResearchTech, u32)>,
    /// The in-progress building upgrade, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_queue: Option<sim_model::BuildQueue>,
    /// The in-progress research upgrade, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub research_queue: Option<sim_model::ResearchQueue>,
    /// The in-progress ship production run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ship_queue: Option<sim_model::ShipQueue>,
    /// Ships docked at the homeworld, not assigned to any fleet.
    pub docked_ships: Vec<ShipView>,
}

/// A wire view of a single ship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipView {
    /// The ship's id.
    pub id: ShipId,
    /// The ship's class.
    pub class: ShipClass,
    /// Current hull points.
    pub hull: u32,
    /// Maximum hull points.
    pub hull_max: u32,
    /// Current shield points.
    pub shield: u32,
    /// Maximum shield points.
    pub shield_max: u32,
}

impl From<&sim_model::Ship> for ShipView {
    fn from(ship: &sim_model::Ship) -> Self {
        Self {
            id: ship.id,
            class: ship.class,
            hull: ship.hull,
            hull_max: ship.hull_max,
            shield: ship.shield,
            shield_max: ship.shield_max,
        }
    }
}

/// A wire view of a single fleet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetView {
    /// The fleet's id.
    pub id: FleetId,
    /// The fleet's current sector.
    pub location: Hex,
    /// The fleet's current status.
    pub status: FleetStatus,
    /// The fleet's live ships.
    pub ships: Vec<ShipView>,
    /// Cargo currently held.
    pub cargo: balance::Resources,
    /// Current fuel.
    pub fuel: u32,
    /// Maximum fuel.
    pub fuel_max: u32,
    /// The fleet's move destination, if it is currently moving.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub move_target: Option<Hex>,
}

/// Which NPC presence occupies a sector, if any: a fleet that has actually
/// spawned and engaged, or just the sector's unspawned template (still
/// shown so scouting can warn of danger before a fleet is rolled).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NpcPresenceView {
    /// A concrete, spawned NPC fleet.
    Spawned {
        /// The spawned fleet's id.
        npc_fleet_id: NpcFleetId,
        /// How many ships remain in the fleet.
        ship_count: u32,
        /// The fleet's behavior mode.
        behavior: NpcBehavior,
        /// Whether the fleet is currently locked in combat.
        in_combat: bool,
    },
    /// The sector's generated template, with nothing spawned yet.
    Template {
        /// The NPC ship class this sector can spawn.
        class: NpcShipClass,
        /// The inclusive range of ship counts this sector can spawn.
        count_range: (u16, u16),
        /// The behavior mode the spawned fleet would use.
        behavior: NpcBehavior,
    },
}

/// Salvage left behind in a sector by a cleared combat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalvageView {
    /// The resources available to collect.
    pub resources: balance::Resources,
    /// The tick at which this salvage despawns if uncollected.
    pub despawn_tick: u64,
}

/// A sector's merged projection: generated template, persisted override,
/// and any NPC presence (spec.md §4.2's "template + override" composition,
/// built by `sim-engine::projection::sector_view`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectorView {
    /// The sector's hex.
    pub hex: Hex,
    /// The sector's terrain.
    pub terrain: Terrain,
    /// Current density per resource, in `worldgen::RESOURCE_ORDER` order,
    /// after any override downgrade/upgrade has been applied.
    pub densities: [Density; 3],
    /// The sector's NPC presence, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub npc: Option<NpcPresenceView>,
    /// Salvage available to collect, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub salvage: Option<SalvageView>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_envelope_carries_exactly_one_object_key() {
        let value = ClientEnvelope::RequestFullState {};
        let json = serde_json::to_value(&value).expect("serialize");
        let obj = json.as_object().expect("object");
        assert_eq!(obj.len(), 1);
        assert!(obj.contains_key("request_full_state"));
    }

    #[test]
    fn auth_register_round_trips() {
        let value = ClientEnvelope::Auth(AuthPayload {
            player_name: "nova".to_owned(),
            action: AuthAction::Register,
            client_type: None,
        });
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json["auth"]["player_name"], "nova");
        assert_eq!(json["auth"]["action"], "register");
        assert!(json["auth"].get("token").is_none());

        let back: ClientEnvelope = serde_json::from_value(json).expect("deserialize");
        match back {
            ClientEnvelope::Auth(payload) => {
                assert_eq!(payload.player_name, "nova");
                assert!(matches!(payload.action, AuthAction::Register));
            }
            other => panic!("expected Auth, got {other:?}"),
        }
    }

    #[test]
    fn auth_login_carries_token() {
        let value = ClientEnvelope::Auth(AuthPayload {
            player_name: "nova".to_owned(),
            action: AuthAction::Login {
                token: "tok-123".to_owned(),
            },
            client_type: Some("cli".to_owned()),
        });
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json["auth"]["action"], "login");
        assert_eq!(json["auth"]["token"], "tok-123");
    }

    #[test]
    fn move_command_round_trips() {
        let value = ClientEnvelope::Command(ClientCommand::Move {
            fleet_id: FleetId(7),
            target: Hex::new(1, -1),
        });
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json["command"]["move"]["fleet_id"], 7);
        let back: ClientEnvelope = serde_json::from_value(json).expect("deserialize");
        match back {
            ClientEnvelope::Command(ClientCommand::Move { fleet_id, target }) => {
                assert_eq!(fleet_id, FleetId(7));
                assert_eq!(target, Hex::new(1, -1));
            }
            other => panic!("expected Command(Move), got {other:?}"),
        }
    }

    #[test]
    fn attack_target_distinguishes_player_and_npc() {
        let against_npc = ClientCommand::Attack {
            fleet_id: FleetId(1),
            target: AttackTarget::Npc(NpcFleetId(9)),
        };
        let json = serde_json::to_value(&against_npc).expect("serialize");
        assert_eq!(json["attack"]["target"]["npc"], 9);
    }

    #[test]
    fn error_envelope_round_trips() {
        let value = ServerEnvelope::Error(ErrorPayload::from(ErrorCode::FleetNotFound));
        let json = serde_json::to_value(&value).expect("serialize");
        assert_eq!(json["error"]["code"], 1005);
        let back: ServerEnvelope = serde_json::from_value(json).expect("deserialize");
        assert!(matches!(back, ServerEnvelope::Error(_)));
    }
}
