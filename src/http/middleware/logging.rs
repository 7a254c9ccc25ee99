//! Per-request log record.
//!
//! # Responsibilities
//! - Assign a request ID and expose it in request extensions
//! - Emit exactly one record per request once the response is ready
//! - Emit the record from a drop guard when the request is abandoned
//!
//! # Design Decisions
//! - Severity follows the status class: info (< 400), warn (4xx), error (5xx)
//! - A handler failure marker on the response is logged as `error`

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::http::Method;
use axum::middleware::Next;
use axum::response::Response;
use uuid::Uuid;

use crate::http::middleware::session::SessionId;
use crate::http::response::HandlerFailure;

/// Unique ID of one request, for correlating log lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(Arc<str>);

impl RequestId {
    fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Log every request on completion.
pub async fn log_requests(mut req: Request, next: Next) -> Response {
    let request_id = RequestId::generate();
    req.extensions_mut().insert(request_id.clone());

    let mut record = RequestRecord {
        start: Instant::now(),
        request_id,
        method: req.method().clone(),
        path: req.uri().path().to_string(),
        session: req.extensions().get::<SessionId>().cloned(),
        done: false,
    };

    let response = next.run(req).await;
    record.complete(&response);
    response
}

/// Emits the request's record exactly once: on completion, or on drop.
struct RequestRecord {
    start: Instant,
    request_id: RequestId,
    method: Method,
    path: String,
    session: Option<SessionId>,
    done: bool,
}

impl RequestRecord {
    fn session(&self) -> &str {
        self.session.as_ref().map_or("", SessionId::as_str)
    }

    fn complete(&mut self, response: &Response) {
        self.done = true;

        let status = response.status().as_u16();
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let error = response
            .extensions()
            .get::<HandlerFailure>()
            .map(|failure| failure.message.as_str());

        macro_rules! record {
            ($level:ident) => {
                tracing::$level!(
                    request_id = %self.request_id,
                    method = %self.method,
                    path = %self.path,
                    session = self.session(),
                    elapsed_ms,
                    status,
                    error,
                    "request complete"
                )
            };
        }

        if status >= 500 {
            record!(error)
        } else if status >= 400 {
            record!(warn)
        } else {
            record!(info)
        }
    }
}

impl Drop for RequestRecord {
    fn drop(&mut self) {
        if !self.done {
            tracing::warn!(
                request_id = %self.request_id,
                method = %self.method,
                path = %self.path,
                session = self.session(),
                elapsed_ms = self.start.elapsed().as_millis() as u64,
                "request aborted"
            );
        }
    }
}
