use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::layer::Identity;
use tracing_subscriber::Registry;

use storefront_gateway::config::{load_config, LogFormat, LoggingConfig};
use storefront_gateway::http::NotLinkedStorefront;
use storefront_gateway::lifecycle::{launch, spawn_signal_listener, Shutdown, StartupError};
use storefront_gateway::observability::{
    host_identity, init_logging, ExporterMode, Telemetry,
};

#[derive(Debug, Parser)]
#[command(name = "storefront-gateway", version, about = "Storefront edge gateway")]
struct Cli {
    /// TOML file layered under the environment.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Log output format (json or text). Overrides LOG_FORMAT.
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,
}

/// Plain logging for failures that happen before the real subscriber exists.
fn fallback_logging(format: Option<LogFormat>) {
    let config = LoggingConfig {
        format: format.unwrap_or_default(),
        ..LoggingConfig::default()
    };
    let _ = init_logging(&config, None::<Identity>);
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            fallback_logging(cli.log_format);
            tracing::error!(error = %StartupError::from(e), "Gateway failed to start");
            return ExitCode::FAILURE;
        }
    };
    if let Some(format) = cli.log_format {
        config.logging.format = format;
    }

    let host = host_identity();
    let telemetry = match Telemetry::init(&config.telemetry, &host).await {
        Ok(telemetry) => telemetry,
        Err(e) => {
            fallback_logging(Some(config.logging.format));
            tracing::error!(error = %StartupError::from(e), "Gateway failed to start");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging, telemetry.tracing_layer::<Registry>()) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    match telemetry.mode() {
        ExporterMode::Disabled => tracing::info!("Tracing disabled"),
        mode => tracing::info!(
            exporter = %mode,
            credential = config.telemetry.api_key.is_some(),
            "Tracing enabled"
        ),
    }
    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        host = %host,
        port = config.listener.port,
        "storefront-gateway starting"
    );

    let shutdown = Shutdown::new();
    let signals = spawn_signal_listener(shutdown.clone());

    let result = launch(&config, &telemetry, NotLinkedStorefront, &shutdown).await;
    signals.abort();

    if let Err(e) = telemetry.shutdown().await {
        tracing::warn!(error = %e, "Telemetry shutdown failed");
    }

    match result {
        Ok(()) => {
            tracing::info!("Shutdown complete");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "Gateway failed");
            ExitCode::FAILURE
        }
    }
}
