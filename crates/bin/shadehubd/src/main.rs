//! # shadehubd — shadehub daemon
//!
//! Composition root that wires all adapters together and starts the
//! server.
//!
//! ## Responsibilities
//! - Load and validate configuration (TOML + env overrides)
//! - Initialize tracing
//! - Initialize the `SQLite` pool and run migrations
//! - Build the registry, location and tunables (read-only after this point)
//! - Construct the planner, executor, schedule manager and command router
//! - Spawn the scheduling loop on its own task
//! - Build the axum router and serve until shutdown
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no domain logic belongs here.

mod config;

use std::sync::Arc;
use std::time::Duration;

use shadehub_adapter_http_axum::state::AppState;
use shadehub_adapter_hub_http::HttpShadeHub;
use shadehub_adapter_nlu_http::{HttpIntentInterpreter, NluConfig};
use shadehub_adapter_storage_sqlite_sqlx::{Config as DbConfig, SqliteScheduleRepository};
use shadehub_adapter_virtual::VirtualHub;
use shadehub_app::executor::DeviceExecutor;
use shadehub_app::planner::ExecutionPlanner;
use shadehub_app::ports::{HubCommandFailure, ShadeHub};
use shadehub_app::router::CommandRouter;
use shadehub_app::scheduler::ScheduleManager;
use shadehub_domain::id::BlindId;
use tracing_subscriber::EnvFilter;

use crate::config::{Config, HubMode};

/// Runtime hub selection without dynamic dispatch.
enum AnyHub {
    Http(HttpShadeHub),
    Virtual(VirtualHub),
}

impl ShadeHub for AnyHub {
    async fn set_position(&self, blind: &BlindId, position: u8) -> Result<(), HubCommandFailure> {
        match self {
            Self::Http(hub) => hub.set_position(blind, position).await,
            Self::Virtual(hub) => hub.set_position(blind, position).await,
        }
    }

    async fn get_position(&self, blind: &BlindId) -> Result<Option<u8>, HubCommandFailure> {
        match self {
            Self::Http(hub) => hub.get_position(blind).await,
            Self::Virtual(hub) => hub.get_position(blind).await,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::load()?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    // Database
    let db = DbConfig {
        database_url: config.database.url.clone(),
    }
    .build()
    .await?;
    let schedule_repo = SqliteScheduleRepository::new(db.pool().clone());

    // Read-only shared state
    let registry = Arc::new(config.build_registry()?);
    let location = config.build_location()?;
    let tunables = Arc::new(config.tunables.clone());

    // Collaborators
    let hub = match &config.hub {
        HubMode::Http(hub_config) => AnyHub::Http(HttpShadeHub::new(hub_config.clone())?),
        HubMode::Virtual => {
            tracing::info!("using the virtual hub (no hardware)");
            AnyHub::Virtual(VirtualHub::from_registry(&registry))
        }
    };
    let interpreter = HttpIntentInterpreter::new(config.nlu.clone().unwrap_or(NluConfig {
        url: "http://localhost:8090/interpret".to_string(),
        request_timeout_secs: 30,
    }))?;

    // Use-cases
    let planner = Arc::new(ExecutionPlanner::new(registry.clone(), tunables.clone()));
    let executor = Arc::new(DeviceExecutor::new(hub, registry.clone(), tunables.clone()));
    let schedules = Arc::new(ScheduleManager::new(
        schedule_repo,
        planner.clone(),
        executor.clone(),
        location,
        tunables.clone(),
    ));
    let command_router = Arc::new(CommandRouter::new(
        interpreter,
        registry.clone(),
        planner,
        executor.clone(),
        schedules.clone(),
        tunables.clone(),
        location,
    ));

    // Scheduling loop, independent of request traffic. Active schedules
    // get their next-fire times recomputed on the first tick — nothing
    // stale is ever read back from storage.
    let tick_period = Duration::from_secs(config.tunables.tick_period_secs);
    tokio::spawn(schedules.clone().run(tick_period));

    // HTTP
    let state = AppState::new(
        command_router,
        schedules,
        executor,
        registry,
        location,
        tunables,
    );
    let app = shadehub_adapter_http_axum::router::build(state);

    let bind_addr = config.bind_addr();
    tracing::info!(%bind_addr, "shadehubd listening");

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
    }
}
