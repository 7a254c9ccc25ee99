//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde and the loader handle syntax and presence)
//! - Validate value ranges (port, push interval)
//! - Check backend addresses have a `host:port` shape
//! - Check exporter URL overrides parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use thiserror::Error;
use url::Url;

use crate::backends::BackendService;
use crate::config::schema::GatewayConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener port must be non-zero")]
    ZeroPort,

    #[error("{service} address '{address}' is not of the form host:port")]
    BackendAddress {
        service: BackendService,
        address: String,
    },

    #[error("{field} '{value}' is not a valid URL: {reason}")]
    Url {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("metric push interval must be greater than zero")]
    ZeroPushInterval,

    #[error("backend dial timeout must be greater than zero")]
    ZeroDialTimeout,
}

/// Validate a fully-resolved configuration.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.port == 0 {
        errors.push(ValidationError::ZeroPort);
    }

    for service in BackendService::ALL {
        if let Some(address) = config.backends.address(service) {
            if !is_host_port(address) {
                errors.push(ValidationError::BackendAddress {
                    service,
                    address: address.to_string(),
                });
            }
        }
    }

    let telemetry = &config.telemetry;
    for (field, value) in [
        ("metric_url", &telemetry.metric_url),
        ("trace_url", &telemetry.trace_url),
    ] {
        if let Some(value) = value {
            if let Err(e) = Url::parse(value) {
                errors.push(ValidationError::Url {
                    field,
                    value: value.clone(),
                    reason: e.to_string(),
                });
            }
        }
    }

    if telemetry.push_interval_ms == 0 {
        errors.push(ValidationError::ZeroPushInterval);
    }
    if config.timeouts.dial_secs == 0 {
        errors.push(ValidationError::ZeroDialTimeout);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn is_host_port(address: &str) -> bool {
    match address.rsplit_once(':') {
        Some((host, port)) => !host.is_empty() && port.parse::<u16>().is_ok_and(|p| p != 0),
        None => false,
    }
}
