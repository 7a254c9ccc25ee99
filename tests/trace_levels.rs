//! Trace export under the production subscriber.
//!
//! Installs the global subscriber, so this file holds a single test.

use axum::body::Body;
use axum::http::header::CONTENT_TYPE;
use axum::http::{Request, StatusCode};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_sdk::trace::SdkTracerProvider;
use tower::ServiceExt;

use storefront_gateway::config::{LogFormat, LoggingConfig};
use storefront_gateway::observability::{init_logging, RequestMetrics};

mod common;

const TRACE_ID: &str = "4bf92f3577b34da6a3ce929d0e0e4736";

#[tokio::test]
async fn test_warn_log_level_keeps_trace_propagation() {
    std::env::remove_var("RUST_LOG");

    let provider = SdkTracerProvider::builder().build();
    let otel = tracing_opentelemetry::layer().with_tracer(provider.tracer("test"));
    init_logging(
        &LoggingConfig {
            level: "warn".to_string(),
            format: LogFormat::Json,
        },
        Some(otel),
    )
    .unwrap();

    let app = common::gateway(RequestMetrics::noop());
    let response = app
        .oneshot(
            Request::post("/cart/checkout")
                .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
                .header("traceparent", format!("00-{TRACE_ID}-00f067aa0ba902b7-01"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let outbound = common::body_string(response).await;
    assert!(
        outbound.starts_with(&format!("00-{TRACE_ID}-")),
        "outbound traceparent continues the inbound trace: {outbound:?}"
    );
    assert!(outbound.ends_with("-01"), "still sampled: {outbound:?}");
}
