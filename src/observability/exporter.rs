//! Tracing and metrics exporter bootstrap.
//!
//! # Responsibilities
//! - Choose the exporter mode once at startup
//! - Build the tracer provider and the metrics recorder for that mode
//! - Hand out the tracing layer and the request instruments
//! - Flush and release everything on shutdown
//!
//! # Modes
//! - `Platform`: OTLP/HTTP spans (batched) and pushed Prometheus metrics,
//!   both authenticated with the `api-key` header
//! - `LocalStdout`: every span printed to stdout as it ends, metrics are no-ops
//! - `Disabled`: no tracer, metrics are no-ops
//!
//! # Design Decisions
//! - `Telemetry` owns the providers; nothing is installed globally
//! - The recorder exists before any instrument is registered on it
//! - Provider construction and shutdown run on the blocking pool because the
//!   platform span exporter uses a blocking HTTP client

use std::collections::HashMap;
use std::fmt;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusRecorder};
use opentelemetry::trace::TracerProvider as _;
use opentelemetry::KeyValue;
use opentelemetry_otlp::{WithExportConfig, WithHttpConfig};
use opentelemetry_sdk::error::OTelSdkError;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider, Tracer};
use opentelemetry_sdk::Resource;
use thiserror::Error;
use tracing::Subscriber;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::registry::LookupSpan;

use crate::config::TelemetryConfig;
use crate::observability::metrics::{self, RequestMetrics};
use crate::observability::pusher::{MetricsPusher, PushTarget};

/// Default platform endpoint for pushed metrics.
pub const DEFAULT_METRIC_URL: &str = "http://localhost:9091/metrics/job/frontend";

/// Default platform endpoint for OTLP/HTTP spans.
pub const DEFAULT_TRACE_URL: &str = "http://localhost:4318/v1/traces";

/// Summary quantiles for the latency histogram.
const QUANTILES: &[f64] = &[0.0, 0.5, 0.9, 0.99, 1.0];

/// Errors raised while building or shutting down exporters.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("failed to build span exporter: {0}")]
    ExporterBuild(#[from] opentelemetry_otlp::ExporterBuildError),

    #[error("failed to build metrics recorder: {0}")]
    Metrics(#[from] metrics_exporter_prometheus::BuildError),

    #[error("failed to build metrics push client: {0}")]
    PushClient(#[from] reqwest::Error),

    #[error("exporter task failed: {0}")]
    Task(#[from] tokio::task::JoinError),

    #[error("tracer provider shutdown failed: {0}")]
    Shutdown(#[from] OTelSdkError),
}

/// Which exporter to run, chosen from configuration.
#[derive(Clone, PartialEq, Eq)]
pub enum ExporterConfig {
    Platform {
        credential: String,
        metric_url: Option<String>,
        trace_url: Option<String>,
    },
    LocalStdout,
    Disabled,
}

impl ExporterConfig {
    /// Disabled wins over everything; a credential selects the platform.
    pub fn from_settings(settings: &TelemetryConfig) -> Self {
        if settings.disable_tracing {
            return ExporterConfig::Disabled;
        }
        match &settings.api_key {
            Some(credential) => ExporterConfig::Platform {
                credential: credential.clone(),
                metric_url: settings.metric_url.clone(),
                trace_url: settings.trace_url.clone(),
            },
            None => ExporterConfig::LocalStdout,
        }
    }

    pub fn mode(&self) -> ExporterMode {
        match self {
            ExporterConfig::Platform { .. } => ExporterMode::Platform,
            ExporterConfig::LocalStdout => ExporterMode::LocalStdout,
            ExporterConfig::Disabled => ExporterMode::Disabled,
        }
    }
}

impl fmt::Debug for ExporterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExporterConfig::Platform {
                metric_url,
                trace_url,
                ..
            } => f
                .debug_struct("Platform")
                .field("credential", &"<redacted>")
                .field("metric_url", metric_url)
                .field("trace_url", trace_url)
                .finish(),
            ExporterConfig::LocalStdout => f.write_str("LocalStdout"),
            ExporterConfig::Disabled => f.write_str("Disabled"),
        }
    }
}

/// Credential-free label for the active exporter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExporterMode {
    Platform,
    LocalStdout,
    Disabled,
}

impl fmt::Display for ExporterMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExporterMode::Platform => "platform",
            ExporterMode::LocalStdout => "stdout",
            ExporterMode::Disabled => "disabled",
        })
    }
}

struct MetricsPipeline {
    recorder: PrometheusRecorder,
    pusher: MetricsPusher,
}

/// Process telemetry: tracer provider, metrics recorder and their lifetimes.
pub struct Telemetry {
    mode: ExporterMode,
    service_name: String,
    host: String,
    tracer_provider: Option<SdkTracerProvider>,
    metrics: Option<MetricsPipeline>,
}

impl Telemetry {
    /// Build exporters for `settings`. Must be called inside a Tokio runtime.
    pub async fn init(settings: &TelemetryConfig, host: &str) -> Result<Self, TelemetryError> {
        let exporter = ExporterConfig::from_settings(settings);
        let mode = exporter.mode();
        let resource = Resource::builder()
            .with_service_name(settings.service_name.clone())
            .with_attribute(KeyValue::new("host.name", host.to_string()))
            .build();

        let (tracer_provider, metrics) = match exporter {
            ExporterConfig::Disabled => (None, None),
            ExporterConfig::LocalStdout => {
                let provider = SdkTracerProvider::builder()
                    .with_resource(resource)
                    .with_sampler(Sampler::AlwaysOn)
                    .with_simple_exporter(opentelemetry_stdout::SpanExporter::default())
                    .build();
                (Some(provider), None)
            }
            ExporterConfig::Platform {
                credential,
                metric_url,
                trace_url,
            } => {
                let trace_url = trace_url.unwrap_or_else(|| DEFAULT_TRACE_URL.to_string());
                let metric_url = metric_url.unwrap_or_else(|| DEFAULT_METRIC_URL.to_string());

                let recorder = PrometheusBuilder::new()
                    .set_quantiles(QUANTILES)?
                    .build_recorder();
                metrics::describe(&recorder);
                let pusher = MetricsPusher::spawn(
                    recorder.handle(),
                    PushTarget {
                        url: metric_url.clone(),
                        api_key: credential.clone(),
                        interval: settings.push_interval(),
                    },
                )?;

                let provider = tokio::task::spawn_blocking(move || {
                    platform_provider(resource, &trace_url, credential)
                })
                .await??;

                tracing::debug!(metric_url = %metric_url, "Platform exporters built");
                (Some(provider), Some(MetricsPipeline { recorder, pusher }))
            }
        };

        Ok(Self {
            mode,
            service_name: settings.service_name.clone(),
            host: host.to_string(),
            tracer_provider,
            metrics,
        })
    }

    pub fn mode(&self) -> ExporterMode {
        self.mode
    }

    /// `tracing` layer exporting spans to the active provider, if any.
    pub fn tracing_layer<S>(&self) -> Option<OpenTelemetryLayer<S, Tracer>>
    where
        S: Subscriber + for<'span> LookupSpan<'span>,
    {
        self.tracer_provider.as_ref().map(|provider| {
            tracing_opentelemetry::layer().with_tracer(provider.tracer(self.service_name.clone()))
        })
    }

    /// Request instruments for the HTTP pipeline. Call once at startup.
    pub fn request_metrics(&self) -> RequestMetrics {
        match &self.metrics {
            Some(pipeline) => RequestMetrics::register(&pipeline.recorder, &self.host),
            None => RequestMetrics::noop(),
        }
    }

    /// Push metrics one last time and flush pending spans.
    pub async fn shutdown(self) -> Result<(), TelemetryError> {
        if let Some(pipeline) = self.metrics {
            pipeline.pusher.shutdown().await;
        }
        if let Some(provider) = self.tracer_provider {
            tokio::task::spawn_blocking(move || provider.shutdown()).await??;
        }
        tracing::debug!(mode = %self.mode, "Telemetry shut down");
        Ok(())
    }
}

impl fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Telemetry")
            .field("mode", &self.mode)
            .field("service_name", &self.service_name)
            .field("host", &self.host)
            .finish_non_exhaustive()
    }
}

fn platform_provider(
    resource: Resource,
    trace_url: &str,
    credential: String,
) -> Result<SdkTracerProvider, TelemetryError> {
    let headers = HashMap::from([("api-key".to_string(), credential)]);
    let exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_http()
        .with_endpoint(trace_url)
        .with_headers(headers)
        .build()?;

    Ok(SdkTracerProvider::builder()
        .with_resource(resource)
        .with_batch_exporter(exporter)
        .build())
}
