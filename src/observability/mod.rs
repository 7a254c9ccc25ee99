//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     TelemetryConfig → exporter.rs (Platform | LocalStdout | Disabled)
//!         → tracer provider → tracing layer → logging.rs (subscriber)
//!         → metrics recorder → metrics.rs (RequestMetrics) → pusher.rs
//!
//! Per request:
//!     inbound headers → propagation.rs → parent of the request span
//!     request span → backend interceptor → outbound gRPC metadata
//!     completion → RequestMetrics::observe
//! ```
//!
//! # Design Decisions
//! - Structured logging (JSON) for machine parsing
//! - No global providers: `Telemetry` owns them and is passed explicitly
//! - Metrics are cheap (atomic increments on pre-registered handles)
//! - Tracing can be switched off entirely with `DISABLE_TRACING`

pub mod exporter;
pub mod logging;
pub mod metrics;
pub mod propagation;
pub mod pusher;

pub use exporter::{ExporterConfig, ExporterMode, Telemetry, TelemetryError};
pub use logging::init_logging;
pub use self::metrics::{host_identity, MetricsSnapshot, RequestMetrics};
