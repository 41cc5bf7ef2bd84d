//! # homepilotd: homepilot daemon
//!
//! Composition root that wires all adapters together and starts the server.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Initialise `tracing` with the configured filter
//! - Initialize the `SQLite` connection pool and run migrations
//! - Construct repository implementations and the hub client (adapters)
//! - Construct application services, injecting them via port traits
//! - Build the axum router, injecting application services
//! - Bind to a TCP port and serve
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer; no domain logic belongs here.

mod config;

use anyhow::Context;
use chrono::TimeDelta;
use tracing_subscriber::EnvFilter;

use homepilot_adapter_http_axum::state::AppState;
use homepilot_adapter_hub_http::ReqwestHubClient;
use homepilot_adapter_storage_sqlite_sqlx::{
    Config as DatabaseConfig, SqliteDeviceRepository, SqliteRoomRepository,
    SqliteRoutineRepository, SqliteZoneRepository,
};
use homepilot_app::directive_router::DirectiveRouter;
use homepilot_app::outbound::OutboundDispatcher;
use homepilot_app::reconciliation::ReconciliationEngine;
use homepilot_app::routine_executor::RoutineExecutor;
use homepilot_app::services::device_service::DeviceService;
use homepilot_app::services::room_service::RoomService;
use homepilot_app::services::routine_service::RoutineService;

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load().context("loading configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();
    tracing::debug!(?config, "configuration loaded");

    // Database
    let db = DatabaseConfig {
        database_url: config.database_url().to_string(),
    }
    .build()
    .await
    .context("opening registry database")?;
    let pool = db.pool().clone();

    // Repositories
    let device_repo = SqliteDeviceRepository::new(pool.clone());
    let room_repo = SqliteRoomRepository::new(pool.clone());
    let zone_repo = SqliteZoneRepository::new(pool.clone());
    let routine_repo = SqliteRoutineRepository::new(pool);

    // Hub
    let hub = ReqwestHubClient::new(config.hub.clone()).context("building hub client")?;
    let grace = TimeDelta::try_seconds(config.sync.grace_period_secs)
        .context("grace period out of range")?;

    // Services
    let devices = DeviceService::new(device_repo, OutboundDispatcher::new(hub.clone()));
    let reconciliation =
        ReconciliationEngine::new(devices.clone(), hub.clone()).with_grace_period(grace);
    let rooms = RoomService::new(
        room_repo.clone(),
        zone_repo,
        devices.clone(),
        hub.clone(),
    );
    let executor = RoutineExecutor::new(hub);
    let routines = RoutineService::new(routine_repo.clone(), executor.clone());
    let directives = DirectiveRouter::new(
        devices.clone(),
        room_repo,
        routine_repo,
        executor,
        config.voice.manufacturer_name.clone(),
    );

    // HTTP
    let state = AppState::new(devices, reconciliation, rooms, routines, directives);
    let app = homepilot_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("binding {bind_addr}"))?;
    tracing::info!(%bind_addr, hub = %config.hub.url, "homepilotd listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("homepilotd stopped");
    Ok(())
}

/// Resolve on Ctrl+C or, on unix, SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        () = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}
