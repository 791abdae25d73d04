//! Response rendering
//!
//! Broker responses are printed as pretty JSON through these records, so the
//! output shape is owned here rather than by the client library.

use std::io::Write;

use broker_client::{BenchmarkResponse, HashResponse, HealthResponse, SignResponse};
use serde::Serialize;
use serde_json::Value;

use crate::error::CliError;

/// Output of `hash`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HashReport {
    /// Algorithm the broker used
    pub hash_algorithm: String,
    /// Hash value
    pub hash_value: String,
}

impl From<&HashResponse> for HashReport {
    fn from(response: &HashResponse) -> Self {
        Self {
            hash_algorithm: response.hash_algorithm.clone(),
            hash_value: response.hash_value.clone(),
        }
    }
}

/// Output of `sign`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignReport {
    /// Certificate in the requested encoding
    pub signed_certificate: String,
}

impl From<&SignResponse> for SignReport {
    fn from(response: &SignResponse) -> Self {
        Self {
            signed_certificate: response.signed_certificate.clone(),
        }
    }
}

/// Output of `health`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    /// Serving status label
    pub status: &'static str,
}

impl From<&HealthResponse> for HealthReport {
    fn from(response: &HealthResponse) -> Self {
        Self {
            status: response.status.label(),
        }
    }
}

/// Output of `benchmark`
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BenchmarkReport {
    /// Broker results, embedded as JSON when they parse, as text otherwise
    pub benchmark_results: Value,
}

impl From<&BenchmarkResponse> for BenchmarkReport {
    fn from(response: &BenchmarkResponse) -> Self {
        let benchmark_results = serde_json::from_str(&response.benchmark_results)
            .unwrap_or_else(|_| Value::String(response.benchmark_results.clone()));
        Self { benchmark_results }
    }
}

/// Writes `report` as pretty JSON followed by a newline
///
/// # Errors
///
/// Returns `CliError::Render` or `CliError::Output`.
pub fn write_json<W: Write, T: Serialize>(out: &mut W, report: &T) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(report)?;
    writeln!(out, "{json}")?;
    out.flush()?;
    Ok(())
}

/// Writes a single line of text
///
/// # Errors
///
/// Returns `CliError::Output`.
pub fn write_line<W: Write>(out: &mut W, line: &str) -> Result<(), CliError> {
    writeln!(out, "{line}")?;
    out.flush()?;
    Ok(())
}
