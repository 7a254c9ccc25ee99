//! Request count, latency and error instrumentation.
//!
//! Nothing is recorded until the downstream service has produced a response.
//! A request counts as an error when its status is >= 400 or the handler
//! marked the response as failed.

use std::time::Instant;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::response::HandlerFailure;
use crate::observability::RequestMetrics;

pub async fn record_request_metrics(
    State(metrics): State<RequestMetrics>,
    req: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(req).await;

    let failed = response.status().as_u16() >= 400
        || response.extensions().get::<HandlerFailure>().is_some();
    metrics.observe(start.elapsed(), failed);

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::response::IntoResponse;
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    use crate::observability::MetricsSnapshot;

    fn app(metrics: RequestMetrics) -> Router {
        Router::new()
            .route("/ok", get(|| async { "ok" }))
            .route("/fail", get(|| async { StatusCode::BAD_GATEWAY }))
            .route(
                "/marked",
                get(|| async {
                    let mut response = "partial".into_response();
                    response.extensions_mut().insert(HandlerFailure {
                        message: "ads unavailable".into(),
                    });
                    response
                }),
            )
            .layer(middleware::from_fn_with_state(metrics, record_request_metrics))
    }

    async fn hit(app: &Router, path: &str) {
        app.clone()
            .oneshot(HttpRequest::get(path).body(Body::empty()).unwrap())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn counts_successes_and_errors() {
        let metrics = RequestMetrics::noop();
        let app = app(metrics.clone());

        hit(&app, "/ok").await;
        hit(&app, "/ok").await;
        hit(&app, "/fail").await;
        hit(&app, "/missing").await;
        hit(&app, "/marked").await;

        assert_eq!(
            metrics.snapshot(),
            MetricsSnapshot {
                requests: 5,
                errors: 3
            }
        );
    }
}
