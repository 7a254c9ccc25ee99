//! Handler errors and their HTTP rendering.
//!
//! # Responsibilities
//! - Map handler and backend failures to HTTP status codes
//! - Mark failed responses so the logging and telemetry middleware see them
//!
//! # Design Decisions
//! - Backend `Unavailable` maps to 503 and `DeadlineExceeded` to 504
//! - The marker is a response extension; it never reaches the client

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;
use tonic::Code;

use crate::backends::BackendService;

/// Per-request handler failure.
#[derive(Debug, Error)]
pub enum HandlerError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} is not available")]
    NotImplemented(&'static str),

    #[error("{service} request failed: {}", .status.message())]
    Backend {
        service: BackendService,
        #[source]
        status: tonic::Status,
    },

    #[error("{0}")]
    Internal(String),
}

impl HandlerError {
    /// Adapter for `map_err` on backend calls.
    pub fn backend(service: BackendService) -> impl FnOnce(tonic::Status) -> Self {
        move |status| HandlerError::Backend { service, status }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            HandlerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            HandlerError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
            HandlerError::Backend { status, .. } => match status.code() {
                Code::InvalidArgument => StatusCode::BAD_REQUEST,
                Code::NotFound => StatusCode::NOT_FOUND,
                Code::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
                Code::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            },
            HandlerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Response extension recording that a handler failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub message: String,
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = self.to_string();

        let mut response = (status, message.clone()).into_response();
        response
            .extensions_mut()
            .insert(HandlerFailure { message });
        response
    }
}
