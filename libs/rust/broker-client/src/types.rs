//! Request and response types exposed to broker callers
//!
//! These are the shapes callers populate and read. Conversion to and from the
//! wire messages in [`crate::proto`] happens here.

use std::fmt;

use crate::encoding::CertEncoding;
use crate::error::BrokerError;
use crate::proto;

/// Trace context of the span that issued a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceContext {
    /// 32 hex chars
    pub trace_id: String,
    /// 16 hex chars
    pub span_id: String,
    /// Trace flags as a decimal string
    pub trace_flags: String,
    /// W3C `tracestate` header value, possibly empty
    pub trace_state: String,
}

/// Correlation metadata attached to every broker request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Random correlation id
    pub id: String,
    /// Creation timestamp, RFC 3339
    pub created_at: String,
    /// Present when the request was issued inside a recorded span
    pub trace_context: Option<TraceContext>,
}

/// Input for the Hash RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashPayload {
    /// Server-side profile selecting the algorithm
    pub profile: String,
    /// Raw bytes to hash
    pub input: Vec<u8>,
    /// Correlation metadata
    pub metadata: Metadata,
}

/// Result of the Hash RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashResponse {
    /// Algorithm the broker used
    pub hash_algorithm: String,
    /// Hash output as reported by the broker
    pub hash_value: String,
}

/// Input for the Sign RPC
#[derive(Clone, PartialEq, Eq)]
pub struct SignPayload {
    /// Server-side profile selecting signing parameters
    pub profile: String,
    /// PEM certificate signing request
    pub csr: String,
    /// PEM CA certificate
    pub ca_cert: String,
    /// PEM CA private key
    pub ca_private_key: String,
    /// Overrides the subject in the CSR
    pub subject: Option<String>,
    /// CRL distribution point URLs to embed
    pub crl_distribution_points: Vec<String>,
    /// Correlation metadata
    pub metadata: Metadata,
}

impl fmt::Debug for SignPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignPayload")
            .field("profile", &self.profile)
            .field("csr_len", &self.csr.len())
            .field("ca_cert_len", &self.ca_cert.len())
            .field("ca_private_key", &"[REDACTED]")
            .field("subject", &self.subject)
            .field("crl_distribution_points", &self.crl_distribution_points)
            .field("metadata", &self.metadata)
            .finish()
    }
}

/// Client-side options for the Sign RPC
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SignOptions {
    /// Encoding of the returned certificate
    pub encoding: CertEncoding,
}

/// Result of the Sign RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignResponse {
    /// Signed certificate in the requested encoding
    pub signed_certificate: String,
}

/// Serving status reported by the health service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServingStatus {
    /// Status not known
    Unknown,
    /// Broker accepts requests
    Serving,
    /// Broker is up but not accepting requests
    NotServing,
    /// Health service does not know the queried service
    ServiceUnknown,
}

impl ServingStatus {
    /// Label as defined by `grpc.health.v1`
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::Serving => "SERVING",
            Self::NotServing => "NOT_SERVING",
            Self::ServiceUnknown => "SERVICE_UNKNOWN",
        }
    }

    /// Decodes the wire value
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::UnknownStatus` for values outside the enum.
    pub fn from_code(code: i32) -> Result<Self, BrokerError> {
        use proto::health_check_response::ServingStatus as Wire;

        match Wire::try_from(code) {
            Ok(Wire::Unknown) => Ok(Self::Unknown),
            Ok(Wire::Serving) => Ok(Self::Serving),
            Ok(Wire::NotServing) => Ok(Self::NotServing),
            Ok(Wire::ServiceUnknown) => Ok(Self::ServiceUnknown),
            Err(_) => Err(BrokerError::UnknownStatus(code)),
        }
    }
}

impl fmt::Display for ServingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Result of the health check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HealthResponse {
    /// Decoded serving status
    pub status: ServingStatus,
}

/// Input for the Benchmark RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkPayload {
    /// Correlation metadata
    pub metadata: Metadata,
}

/// Result of the Benchmark RPC
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchmarkResponse {
    /// Benchmark results as produced by the broker, usually JSON
    pub benchmark_results: String,
}

impl From<TraceContext> for proto::TraceContext {
    fn from(tc: TraceContext) -> Self {
        Self {
            trace_id: tc.trace_id,
            span_id: tc.span_id,
            trace_flags: tc.trace_flags,
            trace_state: tc.trace_state,
        }
    }
}

impl From<Metadata> for proto::Metadata {
    fn from(metadata: Metadata) -> Self {
        Self {
            id: metadata.id,
            created_at: metadata.created_at,
            trace_context: metadata.trace_context.map(Into::into),
        }
    }
}

impl From<HashPayload> for proto::HashRequest {
    fn from(payload: HashPayload) -> Self {
        Self {
            profile: payload.profile,
            input: payload.input,
            metadata: Some(payload.metadata.into()),
        }
    }
}

impl From<proto::HashResponse> for HashResponse {
    fn from(response: proto::HashResponse) -> Self {
        Self {
            hash_algorithm: response.hash_algorithm,
            hash_value: response.hash_value,
        }
    }
}

impl From<SignPayload> for proto::SignRequest {
    fn from(payload: SignPayload) -> Self {
        Self {
            profile: payload.profile,
            csr: payload.csr,
            ca_private_key: payload.ca_private_key,
            ca_cert: payload.ca_cert,
            subject: payload.subject,
            crl_distribution_points: payload.crl_distribution_points,
            metadata: Some(payload.metadata.into()),
        }
    }
}

impl From<BenchmarkPayload> for proto::BenchmarkRequest {
    fn from(payload: BenchmarkPayload) -> Self {
        Self {
            metadata: Some(payload.metadata.into()),
        }
    }
}

impl From<proto::BenchmarkResponse> for BenchmarkResponse {
    fn from(response: proto::BenchmarkResponse) -> Self {
        Self {
            benchmark_results: response.benchmark_results,
        }
    }
}
