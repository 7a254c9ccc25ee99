//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global `tracing` subscriber once
//! - Render events as one JSON object per line (default) or as text
//! - Attach the OpenTelemetry layer when an exporter is active
//!
//! # Design Decisions
//! - JSON records carry `timestamp`, `severity`, `message` and `target`
//!   followed by the event's own fields, flattened
//! - `RUST_LOG` overrides the configured level
//! - Noisy transport crates are capped at `warn` unless `RUST_LOG` says otherwise
//! - The level filter applies to the formatting layer only; the OpenTelemetry
//!   layer has its own fixed `INFO` filter so request spans are exported at
//!   any log level

use std::fmt;
use std::fmt::Write as _;

use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::format::{DefaultFields, Writer};
use tracing_subscriber::fmt::time::{FormatTime, SystemTime};
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, Registry};

use crate::config::{LogFormat, LoggingConfig};

/// Directives appended to the configured level.
const QUIET_DEPENDENCIES: &str =
    "h2=warn,hyper=warn,hyper_util=warn,tower=warn,reqwest=warn,opentelemetry=warn,opentelemetry_sdk=warn";

/// Install the global subscriber.
pub fn init_logging<L>(config: &LoggingConfig, otel: Option<L>) -> Result<(), TryInitError>
where
    L: Layer<Registry> + Send + Sync + 'static,
{
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},{QUIET_DEPENDENCIES}", config.level)));

    let (json, text) = match config.format {
        LogFormat::Json => (Some(json_layer(std::io::stdout).with_filter(filter)), None),
        LogFormat::Text => (None, Some(tracing_subscriber::fmt::layer().with_filter(filter))),
    };

    tracing_subscriber::registry()
        .with(otel.map(|layer| layer.with_filter(LevelFilter::INFO)))
        .with(json)
        .with(text)
        .try_init()
}

/// Formatting layer writing JSON lines to `writer`.
pub fn json_layer<S, W>(writer: W) -> tracing_subscriber::fmt::Layer<S, DefaultFields, JsonFormat, W>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    W: for<'w> MakeWriter<'w> + 'static,
{
    tracing_subscriber::fmt::layer()
        .event_format(JsonFormat)
        .with_writer(writer)
}

/// Event formatter producing one JSON object per line.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonFormat;

impl<S, N> FormatEvent<S, N> for JsonFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        let mut timestamp = String::new();
        SystemTime.format_time(&mut Writer::new(&mut timestamp))?;

        let mut fields = FieldVisitor::default();
        event.record(&mut fields);

        let mut record = Map::new();
        record.insert("timestamp".into(), timestamp.into());
        record.insert("severity".into(), severity(meta.level()).into());
        record.insert("message".into(), fields.message.unwrap_or_default().into());
        record.insert("target".into(), meta.target().into());
        if let Some(span) = ctx.lookup_current() {
            record.insert("span".into(), span.name().into());
        }
        for (name, value) in fields.fields {
            record.entry(name).or_insert(value);
        }

        let line = serde_json::to_string(&record).map_err(|_| fmt::Error)?;
        writeln!(writer, "{line}")
    }
}

/// Severity name written to the `severity` key.
pub fn severity(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warning",
        Level::INFO => "info",
        Level::DEBUG => "debug",
        Level::TRACE => "trace",
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: Option<String>,
    fields: Vec<(String, Value)>,
}

impl FieldVisitor {
    fn insert(&mut self, field: &Field, value: Value) {
        if field.name() == "message" {
            self.message = Some(match value {
                Value::String(s) => s,
                other => other.to_string(),
            });
        } else {
            self.fields.push((field.name().to_string(), value));
        }
    }
}

impl Visit for FieldVisitor {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.insert(field, value.into());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.insert(field, value.into());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.insert(field, value.into());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.insert(field, value.into());
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.insert(field, value.into());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.insert(field, format!("{value:?}").into());
    }
}
