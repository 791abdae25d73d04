//! OpenTelemetry setup
//!
//! Builds a tracer provider and a logger provider from [`TelemetryConfig`],
//! then installs a `tracing` subscriber that feeds both. The providers are
//! owned by the returned [`Telemetry`] handle; `shutdown` flushes them.

use std::collections::HashMap;

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_appender_tracing::layer::OpenTelemetryTracingBridge;
use opentelemetry_otlp::{Protocol, WithExportConfig, WithHttpConfig, WithTonicConfig};
use opentelemetry_sdk::Resource;
use opentelemetry_sdk::logs::SdkLoggerProvider;
use opentelemetry_sdk::trace::{Sampler, SdkTracerProvider};
use thiserror::Error;
use tonic::metadata::{MetadataMap, MetadataValue};
use tracing::{info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{Directive, EnvFilter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use super::exporter::{ExporterKind, ExporterSelection};
use super::sampler::{DEFAULT_RATIO, SamplerKind, parse_ratio};

/// Fallback for `OTEL_SERVICE_NAME`
pub const DEFAULT_SERVICE_NAME: &str = "unknown service name";
/// Fallback for `OTEL_SERVICE_VERSION`
pub const DEFAULT_SERVICE_VERSION: &str = "unknown service version";
/// Fallback for both exporter lists
pub const DEFAULT_EXPORTER: &str = "console";
/// Fallback for `OTEL_TRACES_SAMPLER`
pub const DEFAULT_SAMPLER: &str = "always";
/// Fallback for `RUST_LOG`
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Targets that never reach an exporter, so exporting cannot trace or log into itself
const EXPORT_SILENCED_TARGETS: &[&str] = &["hyper", "h2", "tonic", "tower", "reqwest", "opentelemetry"];

/// Telemetry errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    /// An exporter could not be built
    #[error("Failed to build {signal} exporter '{exporter}': {reason}")]
    Exporter {
        /// `traces` or `logs`
        signal: &'static str,
        /// Exporter name
        exporter: ExporterKind,
        /// Builder error
        reason: String,
    },

    /// `OTEL_EXPORTER_OTLP_HEADERS_AUTHORIZATION` is not a valid header value
    #[error("Invalid Authorization header value for OTLP exporter")]
    InvalidHeader,

    /// A global subscriber was already installed
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(String),

    /// A provider failed to flush or shut down
    #[error("Failed to shut down {signal} provider: {reason}")]
    Shutdown {
        /// `traces` or `logs`
        signal: &'static str,
        /// SDK error
        reason: String,
    },
}

/// Telemetry configuration
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryConfig {
    /// Resource `service.name`
    pub service_name: String,
    /// Resource `service.version`
    pub service_version: String,
    /// Comma-separated trace exporter names
    pub traces_exporter: String,
    /// Sampler name
    pub traces_sampler: String,
    /// Raw sampler argument
    pub traces_sampler_arg: Option<String>,
    /// Comma-separated log exporter names
    pub logs_exporter: String,
    /// OTLP collector base URL
    pub otlp_endpoint: Option<String>,
    /// Authorization header for OTLP exporters
    pub otlp_authorization: Option<String>,
    /// `tracing` filter directives
    pub log_filter: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: DEFAULT_SERVICE_VERSION.to_string(),
            traces_exporter: DEFAULT_EXPORTER.to_string(),
            traces_sampler: DEFAULT_SAMPLER.to_string(),
            traces_sampler_arg: None,
            logs_exporter: DEFAULT_EXPORTER.to_string(),
            otlp_endpoint: None,
            otlp_authorization: None,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

/// Messages produced while building providers
///
/// Providers are built before the subscriber exists, so these are held and
/// logged once logging is up.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SetupNotes {
    /// Informational messages
    pub info: Vec<String>,
    /// Misconfiguration that was worked around
    pub warnings: Vec<String>,
}

impl SetupNotes {
    fn info(&mut self, message: impl Into<String>) {
        self.info.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }

    /// Logs every held message
    pub fn emit(&self) {
        for message in &self.info {
            info!("{message}");
        }
        for message in &self.warnings {
            warn!("{message}");
        }
    }
}

/// Owned telemetry providers
#[derive(Debug)]
pub struct Telemetry {
    tracer_provider: SdkTracerProvider,
    logger_provider: SdkLoggerProvider,
}

impl Telemetry {
    /// Builds both providers and installs the global `tracing` subscriber
    ///
    /// Must be called within a Tokio runtime context when an `otlpgrpc`
    /// exporter is selected.
    ///
    /// # Errors
    ///
    /// Returns `TelemetryError::Subscriber` if a global subscriber is already set.
    pub fn init(config: &TelemetryConfig) -> Result<Self, TelemetryError> {
        let (telemetry, notes) = Self::build(config);

        let tracer = telemetry.tracer_provider.tracer(config.service_name.clone());
        let log_bridge = OpenTelemetryTracingBridge::new(&telemetry.logger_provider)
            .with_filter(export_filter(&config.log_filter));
        let trace_layer = tracing_opentelemetry::layer()
            .with_tracer(tracer)
            .with_filter(export_filter(&config.log_filter));

        tracing_subscriber::registry()
            .with(env_filter(&config.log_filter))
            .with(
                tracing_subscriber::fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(false),
            )
            .with(trace_layer)
            .with(log_bridge)
            .try_init()
            .map_err(|e| TelemetryError::Subscriber(e.to_string()))?;

        notes.emit();
        Ok(telemetry)
    }

    /// Builds both providers without touching global state
    #[must_use]
    pub fn build(config: &TelemetryConfig) -> (Self, SetupNotes) {
        let mut notes = SetupNotes::default();
        let resource = resource(config);

        let tracer_provider = build_tracer_provider(config, resource.clone(), &mut notes);
        let logger_provider = build_logger_provider(config, resource, &mut notes);

        (
            Self {
                tracer_provider,
                logger_provider,
            },
            notes,
        )
    }

    /// Flushes and shuts down both providers
    ///
    /// Both providers are shut down even if the first one fails.
    ///
    /// # Errors
    ///
    /// Returns the first provider failure.
    pub fn shutdown(self) -> Result<(), TelemetryError> {
        let traces = self
            .tracer_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown {
                signal: "traces",
                reason: e.to_string(),
            });
        let logs = self
            .logger_provider
            .shutdown()
            .map_err(|e| TelemetryError::Shutdown {
                signal: "logs",
                reason: e.to_string(),
            });
        traces.and(logs)
    }
}

#[derive(Debug, Clone, Copy)]
enum Signal {
    Traces,
    Logs,
}

impl Signal {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Logs => "logs",
        }
    }

    const fn http_path(self) -> &'static str {
        match self {
            Self::Traces => "/v1/traces",
            Self::Logs => "/v1/logs",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum OtlpTransport {
    Grpc,
    Http(Protocol),
}

const fn otlp_transport(kind: ExporterKind) -> Option<OtlpTransport> {
    match kind {
        ExporterKind::OtlpGrpc => Some(OtlpTransport::Grpc),
        ExporterKind::OtlpHttp => Some(OtlpTransport::Http(Protocol::HttpJson)),
        ExporterKind::OtlpProto => Some(OtlpTransport::Http(Protocol::HttpBinary)),
        ExporterKind::Console | ExporterKind::None => None,
    }
}

fn resource(config: &TelemetryConfig) -> Resource {
    Resource::builder()
        .with_service_name(config.service_name.clone())
        .with_attributes([
            KeyValue::new("service.version", config.service_version.clone()),
            KeyValue::new("process.pid", i64::from(std::process::id())),
        ])
        .build()
}

fn env_filter(directives: &str) -> EnvFilter {
    EnvFilter::try_new(directives).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

fn export_filter(directives: &str) -> EnvFilter {
    let mut filter = env_filter(directives);
    for target in EXPORT_SILENCED_TARGETS {
        if let Ok(directive) = format!("{target}=off").parse::<Directive>() {
            filter = filter.add_directive(directive);
        }
    }
    filter
}

fn sampler(config: &TelemetryConfig, notes: &mut SetupNotes) -> Sampler {
    let kind = SamplerKind::parse(&config.traces_sampler).unwrap_or_else(|| {
        notes.warn(format!(
            "Unknown OTEL_TRACES_SAMPLER value '{}', using always_on",
            config.traces_sampler
        ));
        SamplerKind::AlwaysOn
    });

    let ratio = if kind.uses_ratio() {
        parse_ratio(config.traces_sampler_arg.as_deref()).unwrap_or_else(|raw| {
            notes.warn(format!(
                "Invalid OTEL_TRACES_SAMPLER_ARG '{raw}', using {DEFAULT_RATIO}"
            ));
            DEFAULT_RATIO
        })
    } else {
        DEFAULT_RATIO
    };

    notes.info(format!("{} sampler configured", kind.as_str()));
    kind.build(ratio)
}

fn note_selection(signal: Signal, selection: &ExporterSelection, notes: &mut SetupNotes) {
    for name in &selection.unknown {
        notes.warn(format!(
            "\"{name}\" is not a valid {} exporter value, skipping",
            signal.as_str()
        ));
    }
}

fn note_registered(signal: Signal, registered: usize, selection: &ExporterSelection, notes: &mut SetupNotes) {
    if registered == 0 && !selection.disabled() {
        notes.warn(format!(
            "No valid {} exporter was provided, nothing will be exported",
            signal.as_str()
        ));
    }
}

fn build_tracer_provider(
    config: &TelemetryConfig,
    resource: Resource,
    notes: &mut SetupNotes,
) -> SdkTracerProvider {
    let selection = ExporterSelection::parse(&config.traces_exporter);
    note_selection(Signal::Traces, &selection, notes);

    let mut builder = SdkTracerProvider::builder()
        .with_resource(resource)
        .with_sampler(sampler(config, notes));
    let mut registered = 0;

    for &kind in &selection.kinds {
        if kind == ExporterKind::Console {
            builder = builder.with_batch_exporter(opentelemetry_stdout::SpanExporter::default());
        } else if let Some(transport) = otlp_transport(kind) {
            match otlp_span_exporter(kind, transport, config) {
                Ok(exporter) => builder = builder.with_batch_exporter(exporter),
                Err(e) => {
                    notes.warn(e.to_string());
                    continue;
                }
            }
        } else {
            continue;
        }
        registered += 1;
        notes.info(format!("Registered {kind} trace exporter"));
    }

    note_registered(Signal::Traces, registered, &selection, notes);
    builder.build()
}

fn build_logger_provider(
    config: &TelemetryConfig,
    resource: Resource,
    notes: &mut SetupNotes,
) -> SdkLoggerProvider {
    let selection = ExporterSelection::parse(&config.logs_exporter);
    note_selection(Signal::Logs, &selection, notes);

    let mut builder = SdkLoggerProvider::builder().with_resource(resource);
    let mut registered = 0;

    for &kind in &selection.kinds {
        if kind == ExporterKind::Console {
            builder = builder.with_batch_exporter(opentelemetry_stdout::LogExporter::default());
        } else if let Some(transport) = otlp_transport(kind) {
            match otlp_log_exporter(kind, transport, config) {
                Ok(exporter) => builder = builder.with_batch_exporter(exporter),
                Err(e) => {
                    notes.warn(e.to_string());
                    continue;
                }
            }
        } else {
            continue;
        }
        registered += 1;
        notes.info(format!("Registered {kind} log exporter"));
    }

    note_registered(Signal::Logs, registered, &selection, notes);
    builder.build()
}

fn build_error<E: std::fmt::Display>(
    signal: Signal,
    exporter: ExporterKind,
) -> impl FnOnce(E) -> TelemetryError {
    move |e| TelemetryError::Exporter {
        signal: signal.as_str(),
        exporter,
        reason: e.to_string(),
    }
}

fn authorization(config: &TelemetryConfig) -> Option<&str> {
    config
        .otlp_authorization
        .as_deref()
        .filter(|value| !value.is_empty())
}

fn grpc_metadata(config: &TelemetryConfig) -> Result<MetadataMap, TelemetryError> {
    let mut metadata = MetadataMap::new();
    if let Some(value) = authorization(config) {
        let value = MetadataValue::try_from(value).map_err(|_| TelemetryError::InvalidHeader)?;
        metadata.insert("authorization", value);
    }
    Ok(metadata)
}

fn http_headers(config: &TelemetryConfig) -> HashMap<String, String> {
    authorization(config)
        .map(|value| HashMap::from([("Authorization".to_string(), value.to_string())]))
        .unwrap_or_default()
}

/// Per-signal HTTP endpoint, `None` leaves the exporter default in place
fn http_endpoint(config: &TelemetryConfig, signal: Signal) -> Option<String> {
    config
        .otlp_endpoint
        .as_deref()
        .filter(|base| !base.is_empty())
        .map(|base| format!("{}{}", base.trim_end_matches('/'), signal.http_path()))
}

fn grpc_endpoint(config: &TelemetryConfig) -> Option<String> {
    config
        .otlp_endpoint
        .clone()
        .filter(|base| !base.is_empty())
}

fn otlp_span_exporter(
    kind: ExporterKind,
    transport: OtlpTransport,
    config: &TelemetryConfig,
) -> Result<opentelemetry_otlp::SpanExporter, TelemetryError> {
    let builder = opentelemetry_otlp::SpanExporter::builder();
    match transport {
        OtlpTransport::Grpc => {
            let mut builder = builder.with_tonic().with_metadata(grpc_metadata(config)?);
            if let Some(endpoint) = grpc_endpoint(config) {
                builder = builder.with_endpoint(endpoint);
            }
            builder.build().map_err(build_error(Signal::Traces, kind))
        }
        OtlpTransport::Http(protocol) => {
            let mut builder = builder
                .with_http()
                .with_protocol(protocol)
                .with_headers(http_headers(config));
            if let Some(endpoint) = http_endpoint(config, Signal::Traces) {
                builder = builder.with_endpoint(endpoint);
            }
            builder.build().map_err(build_error(Signal::Traces, kind))
        }
    }
}

fn otlp_log_exporter(
    kind: ExporterKind,
    transport: OtlpTransport,
    config: &TelemetryConfig,
) -> Result<opentelemetry_otlp::LogExporter, TelemetryError> {
    let builder = opentelemetry_otlp::LogExporter::builder();
    match transport {
        OtlpTransport::Grpc => {
            let mut builder = builder.with_tonic().with_metadata(grpc_metadata(config)?);
            if let Some(endpoint) = grpc_endpoint(config) {
                builder = builder.with_endpoint(endpoint);
            }
            builder.build().map_err(build_error(Signal::Logs, kind))
        }
        OtlpTransport::Http(protocol) => {
            let mut builder = builder
                .with_http()
                .with_protocol(protocol)
                .with_headers(http_headers(config));
            if let Some(endpoint) = http_endpoint(config, Signal::Logs) {
                builder = builder.with_endpoint(endpoint);
            }
            builder.build().map_err(build_error(Signal::Logs, kind))
        }
    }
}
