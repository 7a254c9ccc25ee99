//! Client interceptor carrying the current request's trace context to backends.
//!
//! tonic runs interceptors once per call before the request is encoded, for
//! unary and streaming methods alike, so one interceptor covers both.

use tonic::service::Interceptor;
use tonic::{Request, Status};
use tracing_opentelemetry::OpenTelemetrySpanExt;

use crate::observability::propagation;

/// Injects `traceparent`/`tracestate` from the current tracing span.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracePropagation;

impl Interceptor for TracePropagation {
    fn call(&mut self, mut request: Request<()>) -> Result<Request<()>, Status> {
        let cx = tracing::Span::current().context();
        propagation::inject_context(&cx, request.metadata_mut());
        Ok(request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use opentelemetry::trace::TracerProvider as _;
    use opentelemetry_sdk::trace::SdkTracerProvider;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn injects_traceparent_inside_a_span() {
        let provider = SdkTracerProvider::builder().build();
        let subscriber = tracing_subscriber::registry()
            .with(tracing_opentelemetry::layer().with_tracer(provider.tracer("test")));

        let request = tracing::subscriber::with_default(subscriber, || {
            let span = tracing::info_span!("http.request");
            let _entered = span.enter();
            TracePropagation.call(Request::new(())).unwrap()
        });

        let traceparent = request
            .metadata()
            .get("traceparent")
            .and_then(|v| v.to_str().ok())
            .map(str::to_owned)
            .expect("traceparent should be injected");
        assert!(traceparent.starts_with("00-"));
        assert!(traceparent.ends_with("-01"));
    }

    #[test]
    fn outside_any_span_nothing_is_added() {
        let request = TracePropagation.call(Request::new(())).unwrap();
        assert!(request.metadata().get("traceparent").is_none());
    }
}
