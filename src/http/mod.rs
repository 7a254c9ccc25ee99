//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, request span)
//!     → middleware/ (session → logging → telemetry)
//!     → routes.rs (fixed dispatch table)
//!     → request.rs (RequestContext: session, currency, backends)
//!     → storefront.rs (page handlers) or gateway-owned routes
//!     → response.rs (errors rendered and marked)
//!     → Send to client
//! ```

pub mod cookies;
pub mod currency;
pub mod middleware;
pub mod request;
pub mod response;
pub mod routes;
pub mod server;
pub mod storefront;

pub use currency::CurrencyCode;
pub use middleware::{RequestId, SessionId};
pub use request::RequestContext;
pub use response::{HandlerError, HandlerFailure};
pub use server::{build_router, AppState, HttpServer};
pub use storefront::{FormFields, HandlerResult, NotLinkedStorefront, Storefront};
