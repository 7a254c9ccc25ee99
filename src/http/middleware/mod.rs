//! Request pipeline middleware.
//!
//! # Order (outermost first)
//! ```text
//! request span (tower-http TraceLayer, parent from W3C headers)
//!     → session.rs   (SessionId in extensions, Set-Cookie on new sessions)
//!     → logging.rs   (RequestId, one record per request)
//!     → telemetry.rs (count, latency, errors)
//!     → dispatcher
//! ```

pub mod logging;
pub mod session;
pub mod telemetry;

pub use logging::{log_requests, RequestId};
pub use session::{ensure_session, SessionId};
pub use telemetry::record_request_metrics;
