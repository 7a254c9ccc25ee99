//! Per-request context handed to page handlers.
//!
//! # Responsibilities
//! - Collect what the middleware attached (session, request ID)
//! - Resolve the effective display currency from its cookie
//! - Give handlers the shared backend connections
//!
//! # Design Decisions
//! - Extraction fails only if the session middleware is missing, which is a
//!   wiring bug and answers 500
//! - An absent or unsupported currency cookie falls back to USD silently

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::backends::{BackendChannel, BackendService, ConnectionManager};
use crate::http::cookies::{self, CURRENCY_COOKIE};
use crate::http::currency::CurrencyCode;
use crate::http::middleware::{RequestId, SessionId};
use crate::http::response::HandlerError;
use crate::http::server::AppState;
use crate::http::storefront::Storefront;

#[derive(Debug, Clone)]
pub struct RequestContext {
    pub session: SessionId,
    pub request_id: Option<RequestId>,
    pub currency: CurrencyCode,
    pub backends: Arc<ConnectionManager>,
}

impl RequestContext {
    /// Shared channel to `service`.
    pub fn backend(&self, service: BackendService) -> BackendChannel {
        self.backends.connection(service)
    }
}

impl<S: Storefront> FromRequestParts<AppState<S>> for RequestContext {
    type Rejection = HandlerError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or_else(|| HandlerError::Internal("session middleware is not installed".into()))?;

        let currency = cookies::request_cookie(&parts.headers, CURRENCY_COOKIE)
            .and_then(|code| code.parse().ok())
            .unwrap_or_default();

        Ok(Self {
            session,
            request_id: parts.extensions.get::<RequestId>().cloned(),
            currency,
            backends: Arc::clone(&state.backends),
        })
    }
}
