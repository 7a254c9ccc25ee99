//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the fixed route table
//! - Wire up middleware (request span, session, logging, telemetry)
//! - Serve static assets from the configured directory
//! - Bind server to listener and drain on shutdown

use std::future::Future;
use std::path::Path;
use std::sync::Arc;

use axum::body::Body;
use axum::http::Request;
use axum::routing::{get, post};
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::backends::ConnectionManager;
use crate::http::middleware::{ensure_session, log_requests, record_request_metrics};
use crate::http::routes;
use crate::http::storefront::Storefront;
use crate::observability::propagation;
use crate::observability::RequestMetrics;

/// Application state injected into handlers.
pub struct AppState<S> {
    pub backends: Arc<ConnectionManager>,
    pub storefront: Arc<S>,
}

impl<S> AppState<S> {
    pub fn new(backends: Arc<ConnectionManager>, storefront: Arc<S>) -> Self {
        Self {
            backends,
            storefront,
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            backends: Arc::clone(&self.backends),
            storefront: Arc::clone(&self.storefront),
        }
    }
}

/// Build the router: routes, static files, fallback and the middleware chain.
pub fn build_router<S: Storefront>(
    state: AppState<S>,
    metrics: RequestMetrics,
    static_dir: &Path,
) -> Router {
    Router::new()
        .route("/", get(routes::home::<S>))
        .route("/product/{id}", get(routes::product::<S>))
        .route(
            "/cart",
            get(routes::view_cart::<S>).post(routes::add_to_cart::<S>),
        )
        .route("/cart/empty", post(routes::empty_cart::<S>))
        .route("/cart/checkout", post(routes::place_order::<S>))
        .route("/setCurrency", post(routes::set_currency))
        .route("/logout", get(routes::logout))
        .route("/robots.txt", get(routes::robots))
        .route("/_healthz", get(routes::healthz))
        .nest_service("/static", ServeDir::new(static_dir))
        .fallback(routes::not_found)
        .with_state(state)
        // Applied bottom-up: the last layer sees the request first.
        .layer(middleware::from_fn_with_state(metrics, record_request_metrics))
        .layer(middleware::from_fn(log_requests))
        .layer(middleware::from_fn(ensure_session))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_request(())
                .on_response(())
                .on_failure(()),
        )
}

/// Span wrapping one request, parented on the caller's trace context when present.
fn request_span(request: &Request<Body>) -> tracing::Span {
    let span = tracing::info_span!(
        "http.request",
        method = %request.method(),
        path = %request.uri().path(),
    );
    let _ = span.set_parent(propagation::extract_context(request.headers()));
    span
}

/// HTTP server for the storefront gateway.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new<S: Storefront>(state: AppState<S>, metrics: RequestMetrics, static_dir: &Path) -> Self {
        Self {
            router: build_router(state, metrics, static_dir),
        }
    }

    /// Serve until `shutdown` resolves, then drain in-flight requests.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<(), std::io::Error>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
