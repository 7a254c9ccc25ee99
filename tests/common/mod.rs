//! Shared utilities for the gateway integration tests.
#![allow(dead_code)]

use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Router;
use tokio::net::TcpListener;
use tonic::service::Interceptor;
use tracing_subscriber::fmt::MakeWriter;

use storefront_gateway::backends::{BackendService, ConnectionManager, TracePropagation};
use storefront_gateway::config::BackendAddresses;
use storefront_gateway::http::{
    build_router, AppState, FormFields, HandlerError, HandlerResult, RequestContext, Storefront,
};
use storefront_gateway::observability::RequestMetrics;

/// Storefront that echoes what the pipeline handed it.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoStorefront;

impl Storefront for EchoStorefront {
    async fn home(&self, ctx: RequestContext) -> HandlerResult {
        Ok(format!("session={} currency={}", ctx.session, ctx.currency).into_response())
    }

    async fn product(&self, _ctx: RequestContext, id: String) -> HandlerResult {
        Err(HandlerError::backend(BackendService::ProductCatalog)(
            tonic::Status::not_found(format!("no product with id {id}")),
        ))
    }

    async fn view_cart(&self, _ctx: RequestContext) -> HandlerResult {
        // Never completes; used to exercise abandoned requests.
        std::future::pending().await
    }

    async fn place_order(&self, _ctx: RequestContext, _form: FormFields) -> HandlerResult {
        let request = TracePropagation
            .call(tonic::Request::new(()))
            .map_err(|status| HandlerError::Internal(status.to_string()))?;
        let traceparent = request
            .metadata()
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        Ok(traceparent.into_response())
    }
}

/// Backend addresses pointing at a port nothing listens on.
pub fn unreachable_addresses() -> BackendAddresses {
    let mut addresses = BackendAddresses::default();
    for service in BackendService::ALL {
        addresses.set_address(service, "127.0.0.1:1");
    }
    addresses
}

/// Connection manager whose channels are never dialed.
pub fn lazy_backends() -> ConnectionManager {
    ConnectionManager::connect_lazy(&unreachable_addresses()).unwrap()
}

pub fn static_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/static")
}

/// Full gateway router over lazy backends and the echo storefront.
pub fn gateway(metrics: RequestMetrics) -> Router {
    let state = AppState::new(Arc::new(lazy_backends()), Arc::new(EchoStorefront));
    build_router(state, metrics, &static_dir())
}

/// Serve `router` on an ephemeral local port.
pub async fn spawn_server(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// A port that was free a moment ago.
pub fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

pub async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// In-memory log sink usable as a `MakeWriter`.
#[derive(Clone, Default)]
pub struct LogCapture(Arc<Mutex<Vec<u8>>>);

impl LogCapture {
    /// Every JSON record written so far.
    pub fn records(&self) -> Vec<serde_json::Value> {
        let bytes = self.0.lock().unwrap().clone();
        String::from_utf8(bytes)
            .unwrap()
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    pub fn with_message(&self, message: &str) -> Vec<serde_json::Value> {
        self.records()
            .into_iter()
            .filter(|record| record["message"] == message)
            .collect()
    }
}

impl io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = LogCapture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// One request received by a [`CaptureServer`].
#[derive(Debug, Clone)]
pub struct Captured {
    pub path: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP sink recording every request it receives.
#[derive(Clone, Default)]
pub struct CaptureServer {
    requests: Arc<Mutex<Vec<Captured>>>,
}

impl CaptureServer {
    pub async fn start() -> (Self, SocketAddr) {
        let server = CaptureServer::default();
        let router = Router::new()
            .fallback(capture)
            .with_state(server.clone());
        let addr = spawn_server(router).await;
        (server, addr)
    }

    pub fn requests_to(&self, path: &str) -> Vec<Captured> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.path == path)
            .cloned()
            .collect()
    }
}

async fn capture(State(server): State<CaptureServer>, request: Request<Body>) -> StatusCode {
    let (parts, body) = request.into_parts();
    let body = axum::body::to_bytes(body, usize::MAX)
        .await
        .unwrap_or_default();
    server.requests.lock().unwrap().push(Captured {
        path: parts.uri.path().to_string(),
        headers: parts.headers,
        body,
    });
    StatusCode::OK
}
