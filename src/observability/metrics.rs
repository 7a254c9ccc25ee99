//! Request metrics.
//!
//! # Responsibilities
//! - Register the three per-request instruments on an explicit recorder
//! - Bind them once to the `host` label of this process
//! - Keep an exact in-process tally readable without an exporter
//!
//! # Metrics
//! - `http_request_count` (counter): every completed request
//! - `http_request_latency` (histogram, ms): time spent responding
//! - `http_error_count` (counter): status >= 400 or handler failure
//!
//! # Design Decisions
//! - No global recorder; instruments come from the recorder owned by `Telemetry`
//! - Handles are registered once at startup, the hot path only increments
//! - No per-path labels; cardinality stays at one series per process

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use metrics::{Counter, Histogram, Key, KeyName, Label, Level, Metadata, Recorder, Unit};

pub const REQUEST_COUNT: &str = "http_request_count";
pub const REQUEST_LATENCY: &str = "http_request_latency";
pub const ERROR_COUNT: &str = "http_error_count";

/// Attach names, units and help text to the request instruments.
pub fn describe<R: Recorder + ?Sized>(recorder: &R) {
    recorder.describe_counter(
        KeyName::from(REQUEST_COUNT),
        None,
        "Number of incoming requests".into(),
    );
    recorder.describe_histogram(
        KeyName::from(REQUEST_LATENCY),
        Some(Unit::Milliseconds),
        "Time spent responding to a request".into(),
    );
    recorder.describe_counter(
        KeyName::from(ERROR_COUNT),
        None,
        "Number of errored requests".into(),
    );
}

#[derive(Debug, Default)]
struct Tally {
    requests: AtomicU64,
    errors: AtomicU64,
}

/// Point-in-time view of the request tally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MetricsSnapshot {
    pub requests: u64,
    pub errors: u64,
}

/// Per-request instruments bound to this host.
#[derive(Clone)]
pub struct RequestMetrics {
    requests: Counter,
    latency: Histogram,
    errors: Counter,
    tally: Arc<Tally>,
}

impl RequestMetrics {
    /// Register the instruments on `recorder` labeled with `host`.
    pub fn register<R: Recorder + ?Sized>(recorder: &R, host: &str) -> Self {
        static METADATA: Metadata<'static> =
            Metadata::new(module_path!(), Level::INFO, Some(module_path!()));

        let key = |name: &'static str| Key::from_parts(name, vec![Label::new("host", host.to_string())]);

        Self {
            requests: recorder.register_counter(&key(REQUEST_COUNT), &METADATA),
            latency: recorder.register_histogram(&key(REQUEST_LATENCY), &METADATA),
            errors: recorder.register_counter(&key(ERROR_COUNT), &METADATA),
            tally: Arc::default(),
        }
    }

    /// Instruments that export nothing. The tally still counts.
    pub fn noop() -> Self {
        Self {
            requests: Counter::noop(),
            latency: Histogram::noop(),
            errors: Counter::noop(),
            tally: Arc::default(),
        }
    }

    /// Record one completed request.
    pub fn observe(&self, elapsed: Duration, failed: bool) {
        self.requests.increment(1);
        self.tally.requests.fetch_add(1, Ordering::Relaxed);

        self.latency.record(elapsed.as_millis() as f64);

        if failed {
            self.errors.increment(1);
            self.tally.errors.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            requests: self.tally.requests.load(Ordering::Relaxed),
            errors: self.tally.errors.load(Ordering::Relaxed),
        }
    }
}

impl fmt::Debug for RequestMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestMetrics")
            .field("tally", &self.snapshot())
            .finish_non_exhaustive()
    }
}

/// Host identity used as the `host` label.
pub fn host_identity() -> String {
    match hostname::get().map(|h| h.into_string()) {
        Ok(Ok(host)) if !host.is_empty() => host,
        Ok(_) => {
            tracing::warn!("Hostname is not valid UTF-8, using 'unknown'");
            "unknown".to_string()
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to read hostname, using 'unknown'");
            "unknown".to_string()
        }
    }
}
