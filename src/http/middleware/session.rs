//! Session assignment.
//!
//! Every request leaves this layer with a [`SessionId`] in its extensions.
//! A session cookie already on the request is reused as-is; otherwise a
//! UUID v4 is generated and set on the response exactly once.

use std::fmt;
use std::sync::Arc;

use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::http::cookies::{self, SESSION_COOKIE};

/// Opaque session identifier stored in request extensions.
///
/// Only the session middleware creates these; handlers read them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(Arc<str>);

impl SessionId {
    fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    fn generate() -> Self {
        Self::new(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ensure the request carries a session.
pub async fn ensure_session(mut req: Request, next: Next) -> Response {
    if let Some(existing) = cookies::request_cookie(req.headers(), SESSION_COOKIE) {
        req.extensions_mut().insert(SessionId::new(existing));
        return next.run(req).await;
    }

    let session = SessionId::generate();
    req.extensions_mut().insert(session.clone());

    let mut response = next.run(req).await;

    // Handlers that manage the cookie themselves (logout) take precedence.
    if !cookies::response_sets(response.headers(), SESSION_COOKIE) {
        cookies::append_set_cookie(
            response.headers_mut(),
            &cookies::persistent(SESSION_COOKIE, session.as_str()),
        );
    }
    response
}
