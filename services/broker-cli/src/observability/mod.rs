//! OpenTelemetry Observability Module
//!
//! Trace and log pipelines configured from the standard `OTEL_*` variables.

pub mod exporter;
pub mod sampler;
pub mod telemetry;

pub use exporter::{ExporterKind, ExporterSelection};
pub use sampler::SamplerKind;
pub use telemetry::{SetupNotes, Telemetry, TelemetryConfig, TelemetryError};
