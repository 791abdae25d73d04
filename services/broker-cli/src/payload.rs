//! Request payload assembly
//!
//! Every payload carries fresh correlation metadata. When the current span is
//! known to OpenTelemetry its context is copied in, so the broker can join the
//! trace.

use std::fs;
use std::path::Path;

use broker_client::{BenchmarkPayload, HashPayload, Metadata, SignPayload, TraceContext};
use chrono::Utc;
use opentelemetry::trace::TraceContextExt;
use tracing::Span;
use tracing_opentelemetry::OpenTelemetrySpanExt;
use uuid::Uuid;

use crate::cli::SignCommand;
use crate::error::CliError;

/// Builds metadata with a new correlation id and the span's trace context
#[must_use]
pub fn new_metadata(span: &Span) -> Metadata {
    Metadata {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now().to_rfc3339(),
        trace_context: trace_context(span),
    }
}

/// Trace context of `span`, if it has a valid OpenTelemetry span context
#[must_use]
pub fn trace_context(span: &Span) -> Option<TraceContext> {
    let context = span.context();
    let otel_span = context.span();
    let span_context = otel_span.span_context();
    if !span_context.is_valid() {
        return None;
    }

    Some(TraceContext {
        trace_id: span_context.trace_id().to_string(),
        span_id: span_context.span_id().to_string(),
        trace_flags: span_context.trace_flags().to_u8().to_string(),
        trace_state: span_context.trace_state().header(),
    })
}

/// Payload for `hash`
#[must_use]
pub fn hash_payload(profile: &str, data: &str, metadata: Metadata) -> HashPayload {
    HashPayload {
        profile: profile.to_string(),
        input: data.as_bytes().to_vec(),
        metadata,
    }
}

/// Payload for `benchmark`
#[must_use]
pub const fn benchmark_payload(metadata: Metadata) -> BenchmarkPayload {
    BenchmarkPayload { metadata }
}

/// File contents a sign request is built from
#[derive(Clone, PartialEq, Eq)]
pub struct SignMaterial {
    /// CSR text
    pub csr: String,
    /// CA certificate text
    pub ca_cert: String,
    /// CA private key text
    pub ca_key: String,
}

impl std::fmt::Debug for SignMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SignMaterial")
            .field("csr_len", &self.csr.len())
            .field("ca_cert_len", &self.ca_cert.len())
            .field("ca_key", &"[REDACTED]")
            .finish()
    }
}

impl SignMaterial {
    /// Reads the three files named by `command`, verbatim
    ///
    /// # Errors
    ///
    /// Returns `CliError::ReadInput` for the first file that cannot be read.
    pub fn read(command: &SignCommand) -> Result<Self, CliError> {
        Ok(Self {
            csr: read_input("CSR", &command.csr)?,
            ca_cert: read_input("CA certificate", &command.ca_cert)?,
            ca_key: read_input("CA private key", &command.ca_key)?,
        })
    }
}

fn read_input(what: &'static str, path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::ReadInput {
        what,
        path: path.to_path_buf(),
        source,
    })
}

/// Payload for `sign`
#[must_use]
pub fn sign_payload(
    profile: &str,
    command: &SignCommand,
    material: SignMaterial,
    metadata: Metadata,
) -> SignPayload {
    SignPayload {
        profile: profile.to_string(),
        csr: material.csr,
        ca_cert: material.ca_cert,
        ca_private_key: material.ca_key,
        subject: command.subject.clone(),
        crl_distribution_points: command.crl_distribution_points.clone(),
        metadata,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use broker_client::CertEncoding;

    fn sign_command(dir: &Path) -> SignCommand {
        SignCommand {
            csr: dir.join("request.csr"),
            ca_cert: dir.join("ca.crt"),
            ca_key: dir.join("ca.key"),
            encoding: CertEncoding::Pem,
            subject: Some("CN=override".to_string()),
            crl_distribution_points: vec!["http://crl.test/a.crl".to_string()],
        }
    }

    #[test]
    fn test_metadata_without_otel_span() {
        let metadata = new_metadata(&Span::none());
        assert!(Uuid::parse_str(&metadata.id).is_ok());
        assert!(chrono::DateTime::parse_from_rfc3339(&metadata.created_at).is_ok());
        assert_eq!(metadata.trace_context, None);
    }

    #[test]
    fn test_metadata_ids_are_unique() {
        let a = new_metadata(&Span::none());
        let b = new_metadata(&Span::none());
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_hash_payload_uses_utf8_bytes() {
        let payload = hash_payload("Default", "hello", new_metadata(&Span::none()));
        assert_eq!(payload.profile, "Default");
        assert_eq!(payload.input, b"hello".to_vec());
    }

    #[test]
    fn test_sign_material_read() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("request.csr"), "csr-text\n").unwrap();
        fs::write(dir.path().join("ca.crt"), "cert-text").unwrap();
        fs::write(dir.path().join("ca.key"), "key-text").unwrap();

        let command = sign_command(dir.path());
        let material = SignMaterial::read(&command).unwrap();
        assert_eq!(material.csr, "csr-text\n");
        assert!(!format!("{material:?}").contains("key-text"));

        let payload = sign_payload("Default", &command, material, new_metadata(&Span::none()));
        assert_eq!(payload.ca_private_key, "key-text");
        assert_eq!(payload.subject.as_deref(), Some("CN=override"));
        assert_eq!(payload.crl_distribution_points, vec!["http://crl.test/a.crl"]);
    }

    #[test]
    fn test_sign_material_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("request.csr"), "csr").unwrap();

        let err = SignMaterial::read(&sign_command(dir.path())).unwrap_err();
        match err {
            CliError::ReadInput { what, path, .. } => {
                assert_eq!(what, "CA certificate");
                assert_eq!(path, dir.path().join("ca.crt"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
