//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits so a TOML file can supply a base layer that
//! environment variables then override.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::backends::BackendService;

/// Root configuration for the storefront gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (port, bind host, static assets).
    pub listener: ListenerConfig,

    /// Addresses of the seven backend RPC services.
    pub backends: BackendAddresses,

    /// Tracing and metrics exporter settings.
    pub telemetry: TelemetryConfig,

    /// Log output settings.
    pub logging: LoggingConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// TCP port to listen on.
    pub port: u16,

    /// Host or IP to bind; empty means all interfaces.
    pub listen_addr: String,

    /// Directory served under `/static/`.
    pub static_dir: PathBuf,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            listen_addr: String::new(),
            static_dir: PathBuf::from("./static"),
        }
    }
}

impl ListenerConfig {
    /// Host part used for binding. An empty `listen_addr` binds every interface.
    pub fn bind_host(&self) -> &str {
        if self.listen_addr.is_empty() {
            "0.0.0.0"
        } else {
            &self.listen_addr
        }
    }
}

/// Backend service addresses (`host:port`).
///
/// Every field is required at startup; `None` here means "not yet resolved"
/// and is turned into a configuration error by the loader.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BackendAddresses {
    pub product_catalog: Option<String>,
    pub currency: Option<String>,
    pub cart: Option<String>,
    pub recommendation: Option<String>,
    pub checkout: Option<String>,
    pub shipping: Option<String>,
    pub ad: Option<String>,
}

impl BackendAddresses {
    fn slot(&self, service: BackendService) -> &Option<String> {
        match service {
            BackendService::ProductCatalog => &self.product_catalog,
            BackendService::Currency => &self.currency,
            BackendService::Cart => &self.cart,
            BackendService::Recommendation => &self.recommendation,
            BackendService::Checkout => &self.checkout,
            BackendService::Shipping => &self.shipping,
            BackendService::Ad => &self.ad,
        }
    }

    /// Resolved address for `service`, if configured and non-empty.
    pub fn address(&self, service: BackendService) -> Option<&str> {
        self.slot(service).as_deref().filter(|a| !a.is_empty())
    }

    pub fn set_address(&mut self, service: BackendService, address: impl Into<String>) {
        let slot = match service {
            BackendService::ProductCatalog => &mut self.product_catalog,
            BackendService::Currency => &mut self.currency,
            BackendService::Cart => &mut self.cart,
            BackendService::Recommendation => &mut self.recommendation,
            BackendService::Checkout => &mut self.checkout,
            BackendService::Shipping => &mut self.shipping,
            BackendService::Ad => &mut self.ad,
        };
        *slot = Some(address.into());
    }
}

/// Tracing and metrics exporter settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Skip exporter bootstrap entirely.
    pub disable_tracing: bool,

    /// Credential for the hosted telemetry platform.
    pub api_key: Option<String>,

    /// Override for the platform metric push endpoint.
    pub metric_url: Option<String>,

    /// Override for the platform trace export endpoint.
    pub trace_url: Option<String>,

    /// Service name attached to spans.
    pub service_name: String,

    /// Metric push interval in milliseconds.
    pub push_interval_ms: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            disable_tracing: false,
            api_key: None,
            metric_url: None,
            trace_url: None,
            service_name: "frontend".to_string(),
            push_interval_ms: 1000,
        }
    }
}

impl TelemetryConfig {
    pub fn push_interval(&self) -> Duration {
        Duration::from_millis(self.push_interval_ms)
    }
}

impl std::fmt::Debug for TelemetryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelemetryConfig")
            .field("disable_tracing", &self.disable_tracing)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("metric_url", &self.metric_url)
            .field("trace_url", &self.trace_url)
            .field("service_name", &self.service_name)
            .field("push_interval_ms", &self.push_interval_ms)
            .finish()
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable lines.
    Text,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "text" | "pretty" => Ok(LogFormat::Text),
            other => Err(format!("unknown log format '{other}'")),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive (trace, debug, info, warn, error).
    pub level: String,

    /// Output format.
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            format: LogFormat::Json,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Backend dial timeout in seconds.
    pub dial_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { dial_secs: 3 }
    }
}

impl TimeoutConfig {
    pub fn dial(&self) -> Duration {
        Duration::from_secs(self.dial_secs)
    }
}
