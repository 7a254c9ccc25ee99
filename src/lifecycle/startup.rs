//! Startup orchestration.
//!
//! # Responsibilities
//! - Connect every backend before anything is bound
//! - Register request instruments on the process telemetry
//! - Bind the listener and serve until shutdown
//!
//! # Design Decisions
//! - Fail fast: any startup error is returned, never panicked on
//! - Subsystems initialize in order, not concurrently
//! - Listeners start last (traffic only when ready)

use std::io;
use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::backends::{ConnectError, ConnectionManager};
use crate::config::{ConfigError, GatewayConfig};
use crate::http::{AppState, HttpServer, Storefront};
use crate::lifecycle::shutdown::Shutdown;
use crate::observability::{Telemetry, TelemetryError};

/// Fatal error before or while serving.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("telemetry error: {0}")]
    Telemetry(#[from] TelemetryError),

    #[error("backend connection error: {0}")]
    Connect(#[from] ConnectError),

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}

/// Connect backends, bind the listener and serve until `shutdown` triggers.
pub async fn launch<S: Storefront>(
    config: &GatewayConfig,
    telemetry: &Telemetry,
    storefront: S,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let backends = ConnectionManager::connect(&config.backends, config.timeouts.dial()).await?;
    tracing::info!("All backends connected");

    let listener = bind(config).await?;
    serve(config, listener, backends, telemetry, storefront, shutdown).await
}

/// Bind the configured listen address.
pub async fn bind(config: &GatewayConfig) -> Result<TcpListener, StartupError> {
    let host = config.listener.bind_host();
    let port = config.listener.port;

    TcpListener::bind((host, port))
        .await
        .map_err(|source| StartupError::Bind {
            addr: format!("{host}:{port}"),
            source,
        })
}

/// Serve on an already bound listener until `shutdown` triggers.
pub async fn serve<S: Storefront>(
    config: &GatewayConfig,
    listener: TcpListener,
    backends: ConnectionManager,
    telemetry: &Telemetry,
    storefront: S,
    shutdown: &Shutdown,
) -> Result<(), StartupError> {
    let state = AppState::new(Arc::new(backends), Arc::new(storefront));
    let server = HttpServer::new(
        state,
        telemetry.request_metrics(),
        &config.listener.static_dir,
    );

    tracing::info!(
        static_dir = %config.listener.static_dir.display(),
        telemetry = %telemetry.mode(),
        "Gateway ready"
    );

    server
        .run(listener, shutdown.wait())
        .await
        .map_err(StartupError::Serve)
}
