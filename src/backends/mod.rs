//! Backend RPC connection subsystem.
//!
//! # Data Flow
//! ```text
//! BackendAddresses (validated config)
//!     → manager.rs (dial each service, 3s bound, fail fast)
//!     → interceptor.rs (W3C trace context on every call)
//!     → ConnectionManager (shared, read-only for the process lifetime)
//!     → handlers clone a BackendChannel per call
//! ```
//!
//! # Design Decisions
//! - The service set is a closed enum, not a string map
//! - One channel per service; tonic multiplexes calls over it
//! - Startup dials sequentially so the first failure is the one reported

pub mod interceptor;
pub mod manager;
pub mod service;

pub use interceptor::TracePropagation;
pub use manager::{BackendChannel, BackendEndpoint, ConnectError, ConnectionManager};
pub use service::BackendService;
