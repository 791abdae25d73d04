//! Exporter selection
//!
//! `OTEL_TRACES_EXPORTER` and `OTEL_LOGS_EXPORTER` hold comma-separated
//! exporter names. Each name maps to one [`ExporterKind`]; unknown names are
//! kept aside so the caller can warn about them.

use std::fmt;
use std::str::FromStr;

/// A telemetry exporter the CLI knows how to build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExporterKind {
    /// Pretty-printed to stdout
    Console,
    /// OTLP over gRPC
    OtlpGrpc,
    /// OTLP/JSON over HTTP
    OtlpHttp,
    /// OTLP/protobuf over HTTP
    OtlpProto,
    /// Explicitly export nothing
    None,
}

impl ExporterKind {
    /// Name as written in the environment
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::OtlpGrpc => "otlpgrpc",
            Self::OtlpHttp => "otlphttp",
            Self::OtlpProto => "otlpproto",
            Self::None => "none",
        }
    }
}

impl fmt::Display for ExporterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExporterKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "console" => Ok(Self::Console),
            "otlpgrpc" => Ok(Self::OtlpGrpc),
            "otlphttp" => Ok(Self::OtlpHttp),
            "otlpproto" => Ok(Self::OtlpProto),
            "none" => Ok(Self::None),
            other => Err(other.to_string()),
        }
    }
}

/// Result of parsing an exporter list
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExporterSelection {
    /// Recognized exporters, in order, without duplicates
    pub kinds: Vec<ExporterKind>,
    /// Names that matched nothing
    pub unknown: Vec<String>,
}

impl ExporterSelection {
    /// Parses a comma-separated list; blank entries are ignored
    #[must_use]
    pub fn parse(list: &str) -> Self {
        let mut selection = Self::default();
        for name in list.split(',').map(str::trim).filter(|n| !n.is_empty()) {
            match name.parse::<ExporterKind>() {
                Ok(kind) if !selection.kinds.contains(&kind) => selection.kinds.push(kind),
                Ok(_) => {}
                Err(unknown) => selection.unknown.push(unknown),
            }
        }
        selection
    }

    /// Whether `none` was asked for explicitly
    #[must_use]
    pub fn disabled(&self) -> bool {
        self.kinds.contains(&ExporterKind::None)
    }
}
