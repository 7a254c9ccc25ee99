//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! built-in defaults
//!     → optional TOML file (--config)
//!     → environment variables (PORT, *_SERVICE_ADDR, DISABLE_TRACING, ...)
//!     → loader.rs (presence of required backends)
//!     → validation.rs (semantic checks)
//!     → GatewayConfig (validated, immutable)
//! ```
//!
//! # Design Decisions
//! - Config is read once at startup; there is no reload path
//! - All fields except backend addresses have defaults
//! - Validation separates presence (loader) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_with, ConfigError};
pub use schema::{
    BackendAddresses, GatewayConfig, ListenerConfig, LogFormat, LoggingConfig, TelemetryConfig,
    TimeoutConfig,
};
pub use validation::ValidationError;
