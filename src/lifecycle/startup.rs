//! Startup orchestration.
//!
//! # Order
//! 1. Load and validate configuration (fatal on error)
//! 2. Install logging, then metrics when enabled
//! 3. Build the in-memory collaborators from `[seed]`
//! 4. Spawn the nonce sweeper
//! 5. Bind the listener and serve until a signal arrives

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::{load_config, ConfigError, GatewayConfig};
use crate::http::GatewayServer;
use crate::lifecycle::{signals, Shutdown};
use crate::observability::{logging, metrics};
use crate::services::InMemoryServices;

/// Fatal startup failure.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("failed to bind {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// Load configuration from `path`, or use defaults when none is given.
pub fn resolve_config(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => Ok(GatewayConfig::default()),
    }
}

/// Run the gateway until SIGINT or SIGTERM.
pub async fn run(config: GatewayConfig) -> Result<(), StartupError> {
    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gatekeeper starting");

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let services = InMemoryServices::from_seed(&config.seed);
    tracing::info!(
        users = services.identity.len(),
        interfaces = config.seed.interfaces.len(),
        grants = config.seed.grants.len(),
        "Collaborators seeded"
    );

    let shutdown = Shutdown::new();
    let sweeper = services.nonces.clone().spawn_sweeper(
        Duration::from_secs(config.security.nonce_sweep_interval_secs),
        shutdown.subscribe(),
    );

    let listener = TcpListener::bind(&config.listener.bind_address)
        .await
        .map_err(|source| StartupError::Bind {
            address: config.listener.bind_address.clone(),
            source,
        })?;
    tracing::info!(
        address = %config.listener.bind_address,
        upstream = %config.upstream.address,
        allowlist = ?config.security.ip_allowlist,
        request_timeout_secs = config.timeouts.request_secs,
        "Listening for connections"
    );

    let server = GatewayServer::new(&config, services.collaborators());
    let serving = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_signal().await;
    let notified = shutdown.trigger();
    tracing::info!(tasks = notified, "Shutdown triggered");

    let result = match serving.await {
        Ok(result) => result.map_err(StartupError::Serve),
        Err(e) => Err(StartupError::Serve(std::io::Error::other(e))),
    };
    if let Err(e) = sweeper.await {
        tracing::warn!(error = %e, "Nonce sweeper ended abnormally");
    }

    tracing::info!("Shutdown complete");
    result
}
