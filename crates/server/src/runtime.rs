// SPDX-License-Identifier: Apache-2.0
//! The tick-loop task: the one place that owns a [`sim_engine::Engine`].
//!
//! Grounded on `echo-session-service::main`'s dispatch loop, generalized
//! from "one handler call per inbound line" to a fixed-rate tick: drain
//! whatever the hub queued since the last tick, apply it to the engine,
//! advance the simulation exactly once, then fan the tick's deltas out to
//! every session. Since this task is the engine's only caller, no mutex
//! guards it — the process's one mutex lives entirely in
//! [`crate::hub::Hub`].
//!
//! `World`'s dirty sets accumulate across an entire flush cycle
//! ([`balance::constants::PERSIST_EVERY_TICKS`] ticks), but a `tick_update`
//! must report only what changed *this* tick. Rather than adding a second
//! tracking mechanism to `sim-model`, this loop snapshots each dirty set
//! before calling `run_tick` and diffs it against the set after: the
//! difference is exactly this tick's newly dirty ids, and the underlying
//! sets are left untouched for the next flush.

use std::collections::HashSet;

use hex_geom::Hex;
use session_proto::{
    AuthAction, AuthResultPayload, ErrorCode, ErrorPayload, FullStatePayload, ServerEnvelope,
    TickUpdatePayload,
};
use sim_engine::Engine;
use sim_model::{FleetId, PlayerId};
use sim_store::CheckpointStore;
use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::Instrument;

use crate::hub::{Hub, Incoming, SessionSnapshot};
use crate::{persist, translate, views};

/// Runs the tick loop until `shutdown` reports `true`, then performs one
/// final flush before returning.
pub async fn run(
    mut engine: Engine,
    hub: Hub,
    mut store: Box<dyn CheckpointStore + Send>,
    max_players: u32,
    mut shutdown: watch::Receiver<bool>,
) {
    let period = Duration::from_secs_f64(1.0 / balance::constants::TICK_RATE_HZ);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let next_tick = engine.world().current_tick + 1;
                run_one_tick(&mut engine, &hub, max_players)
                    .instrument(tracing::info_span!("tick", n = next_tick))
                    .await;
                if engine.world().current_tick % balance::constants::PERSIST_EVERY_TICKS == 0 {
                    flush_and_log(&mut engine, store.as_mut());
                }
            }
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
        }
    }

    flush_and_log(&mut engine, store.as_mut());
}

fn flush_and_log(engine: &mut Engine, store: &mut dyn CheckpointStore) {
    if let Err(err) = persist::flush(engine.world_mut(), store) {
        tracing::error!(%err, "checkpoint flush failed");
    }
}

async fn run_one_tick(engine: &mut Engine, hub: &Hub, max_players: u32) {
    for message in hub.drain_incoming().await {
        apply_incoming(engine, hub, max_players, message).await;
    }

    let before_players: HashSet<PlayerId> = engine.world().dirty_players.clone();
    let before_fleets: HashSet<FleetId> = engine.world().dirty_fleets.clone();
    let before_sectors: HashSet<Hex> = engine.world().dirty_sectors.clone();

    let outcome = engine.run_tick();

    let newly_dirty_players: HashSet<PlayerId> = engine
        .world()
        .dirty_players
        .difference(&before_players)
        .copied()
        .collect();
    let newly_dirty_fleets: HashSet<FleetId> = engine
        .world()
        .dirty_fleets
        .difference(&before_fleets)
        .copied()
        .collect();
    let newly_dirty_sectors: HashSet<Hex> = engine
        .world()
        .dirty_sectors
        .difference(&before_sectors)
        .copied()
        .collect();

    for session in hub.snapshot_for_tick().await {
        dispatch_delta(
            engine,
            &session,
            outcome.tick,
            &outcome.events,
            &newly_dirty_players,
            &newly_dirty_fleets,
            &newly_dirty_sectors,
        );
    }
}

async fn apply_incoming(engine: &mut Engine, hub: &Hub, max_players: u32, message: Incoming) {
    match message {
        Incoming::Auth { session, payload } => handle_auth(engine, hub, max_players, session, payload).await,
        Incoming::Command { session, command } => handle_command(engine, hub, session, command).await,
        Incoming::PolicyUpdate { session, client_type } => hub.set_client_type(session, client_type).await,
        Incoming::RequestFullState { session } => hub.request_full_state(session).await,
        Incoming::ProtocolError { session } => {
            send_error(hub, session, ErrorCode::ProtocolError).await;
        }
    }
}

async fn handle_auth(
    engine: &mut Engine,
    hub: &Hub,
    max_players: u32,
    session: crate::hub::SessionId,
    payload: session_proto::AuthPayload,
) {
    if hub.is_authenticated(session).await {
        send_error(hub, session, ErrorCode::AlreadyAuthenticated).await;
        return;
    }

    let result = match payload.action {
        AuthAction::Register => {
            if engine.world().players.len() >= max_players as usize {
                Err(ErrorPayload::from(ErrorCode::RegistrationClosed))
            } else {
                let (token, digest) = translate::mint_token(session.0);
                match sim_engine::register(engine.world_mut(), &payload.player_name, digest) {
                    Ok(player_id) => {
                        hub.set_authenticated(session, player_id).await;
                        send_to(
                            hub,
                            session,
                            &ServerEnvelope::AuthResult(AuthResultPayload {
                                success: true,
                                player_id: Some(player_id),
                                token: Some(token),
                                error: None,
                            }),
                        )
                        .await;
                        return;
                    }
                    Err(err) => Err(ErrorPayload::from(translate::auth_error_code(err))),
                }
            }
        }
        AuthAction::Login { token } => {
            let digest = translate::digest_token(&token);
            match sim_engine::login(engine.world_mut(), &payload.player_name, &digest) {
                Ok(player_id) => {
                    hub.set_authenticated(session, player_id).await;
                    send_to(
                        hub,
                        session,
                        &ServerEnvelope::AuthResult(AuthResultPayload {
                            success: true,
                            player_id: Some(player_id),
                            token: None,
                            error: None,
                        }),
                    )
                    .await;
                    return;
                }
                Err(err) => Err(ErrorPayload::from(translate::auth_error_code(err))),
            }
        }
    };

    if let Err(error) = result {
        tracing::warn!(session = session.0, code = error.code, "auth attempt rejected");
        send_to(
            hub,
            session,
            &ServerEnvelope::AuthResult(AuthResultPayload {
                success: false,
                player_id: None,
                token: None,
                error: Some(error),
            }),
        )
        .await;
    }
}

async fn handle_command(
    engine: &mut Engine,
    hub: &Hub,
    session: crate::hub::SessionId,
    command: session_proto::ClientCommand,
) {
    let Some(player_id) = hub.player_of(session).await else {
        send_error(hub, session, ErrorCode::PlayerNotFound).await;
        return;
    };

    let engine_command = translate::to_engine_command(command);
    if let Err(err) = engine.apply_command(player_id, engine_command) {
        send_error(hub, session, translate::command_error_code(err)).await;
    }
}

fn dispatch_delta(
    engine: &Engine,
    session: &SessionSnapshot,
    tick: u64,
    events: &[sim_model::Event],
    newly_dirty_players: &HashSet<PlayerId>,
    newly_dirty_fleets: &HashSet<FleetId>,
    newly_dirty_sectors: &HashSet<Hex>,
) {
    let Some(player_id) = session.player_id else {
        return;
    };
    let world = engine.world();
    let Some(player) = world.players.get(&player_id) else {
        return;
    };

    let fleet_hexes: HashSet<Hex> = world
        .fleets
        .values()
        .filter(|fleet| fleet.owner == player_id)
        .map(|fleet| fleet.location)
        .collect();

    if session.wants_full_state {
        let mut sectors: Vec<_> = fleet_hexes
            .iter()
            .map(|hex| views::sector_view(sim_engine::sector_view(world, *hex)))
            .collect();
        if !fleet_hexes.contains(&player.homeworld) {
            sectors.push(views::sector_view(sim_engine::sector_view(world, player.homeworld)));
        }
        let payload = FullStatePayload {
            tick,
            player: views::player_view(player),
            fleets: world
                .fleets
                .values()
                .filter(|fleet| fleet.owner == player_id)
                .map(views::fleet_view)
                .collect(),
            sectors,
        };
        let outbox = session.outbox.clone();
        if let Ok(bytes) = session_proto::wire::encode(&ServerEnvelope::FullState(payload)) {
            let _ = outbox.try_send(bytes);
        }
        return;
    }

    let player_delta = newly_dirty_players
        .contains(&player_id)
        .then(|| views::player_view(player));

    let fleets: Vec<_> = world
        .fleets
        .values()
        .filter(|fleet| fleet.owner == player_id && newly_dirty_fleets.contains(&fleet.id))
        .map(views::fleet_view)
        .collect();

    let sectors: Vec<_> = fleet_hexes
        .iter()
        .map(|hex| views::sector_view(sim_engine::sector_view(world, *hex)))
        .collect();

    let homeworld = (newly_dirty_sectors.contains(&player.homeworld) && !fleet_hexes.contains(&player.homeworld))
        .then(|| views::sector_view(sim_engine::sector_view(world, player.homeworld)));

    let relevant_events: Vec<_> = events
        .iter()
        .filter(|event| views::is_event_relevant(world, event, player_id))
        .cloned()
        .collect();

    let payload = TickUpdatePayload {
        tick,
        player: player_delta,
        fleets,
        sectors,
        homeworld,
        events: relevant_events,
    };
    let outbox = session.outbox.clone();
    if let Ok(bytes) = session_proto::wire::encode(&ServerEnvelope::TickUpdate(payload)) {
        let _ = outbox.try_send(bytes);
    }
}

async fn send_error(hub: &Hub, session: crate::hub::SessionId, code: ErrorCode) {
    send_to(hub, session, &ServerEnvelope::Error(ErrorPayload::from(code))).await;
}

async fn send_to(hub: &Hub, session: crate::hub::SessionId, envelope: &ServerEnvelope) {
    match session_proto::wire::encode(envelope) {
        Ok(bytes) => hub.send_to(session, bytes).await,
        Err(err) => tracing::error!(%err, "failed to encode outbound envelope"),
    }
}
