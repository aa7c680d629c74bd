// SPDX-License-Identifier: Apache-2.0
//! Process entry point: loads configuration, opens the checkpoint store,
//! reconstructs the world, and wires the tick loop to the WebSocket
//! listener.

mod config;
mod hub;
mod persist;
mod runtime;
mod translate;
mod views;
mod ws;

use std::sync::Arc;

use anyhow::Context;
use axum::routing::get;
use axum::Router;
use sim_engine::Engine;
use sim_model::World;
use sim_store::{CheckpointStore, SqliteStore};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use config::Config;
use hub::Hub;
use ws::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let config = Config::parse_or_default(std::env::args());

    let mut store = SqliteStore::open(&config.db).context("open checkpoint database")?;
    store.bootstrap_schema().context("bootstrap checkpoint schema")?;
    let engine = Engine::new(load_world(&store, &config)?);

    let hub = Hub::new();
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runtime_handle = tokio::spawn(runtime::run(
        engine,
        hub.clone(),
        Box::new(store),
        config.max_players,
        shutdown_rx,
    ));

    let app_state = Arc::new(AppState {
        hub,
        allow_origins: None,
    });
    let app = Router::new().route("/ws", get(ws::ws_handler)).with_state(app_state);

    let listener = TcpListener::bind(("0.0.0.0", config.port))
        .await
        .with_context(|| format!("bind port {}", config.port))?;
    tracing::info!(port = config.port, db = %config.db.display(), "aethership server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown_tx))
        .await
        .context("websocket listener failed")?;

    runtime_handle.await.context("tick loop task panicked")?;
    Ok(())
}

/// Reconstructs a [`World`] from the checkpoint store, reconciling the
/// stored seed against `--seed`: an existing database's seed always wins,
/// so `--seed` only takes effect the first time a given database file is
/// created.
fn load_world(store: &SqliteStore, config: &Config) -> anyhow::Result<World> {
    let loaded = store.load_all().context("load checkpoint state")?;
    let is_fresh =
        loaded.current_tick == 0 && loaded.world_seed == 0 && loaded.players.is_empty() && loaded.fleets.is_empty();
    let world_seed = if is_fresh { config.seed } else { loaded.world_seed };

    let mut world = World::new(world_seed);
    world.current_tick = loaded.current_tick;
    world.next_id = if is_fresh { 1 } else { loaded.next_id };
    for player in loaded.players {
        world.players.insert(player.id, player);
    }
    for fleet in loaded.fleets {
        world.fleets.insert(fleet.id, fleet);
    }
    for (hex, overlay) in loaded.sectors {
        world.sectors.insert(hex, overlay);
    }
    for edge in loaded.explored_edges {
        world.explored_edges.insert(edge);
    }
    Ok(world)
}

async fn shutdown_signal(shutdown_tx: watch::Sender<bool>) {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                tracing::error!(%err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {}
        () = terminate => {}
    }
    tracing::info!("shutdown signal received, draining tick loop");
    let _ = shutdown_tx.send(true);
}
