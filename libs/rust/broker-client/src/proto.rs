//! Protobuf messages for the crypto broker and gRPC health services
//!
//! Kept in source rather than generated at build time so the workspace builds
//! without `protoc`. Equivalent schema:
//!
//! ```proto
//! package cryptobroker;
//!
//! service CryptoBroker {
//!   rpc Hash(HashRequest) returns (HashResponse);
//!   rpc Sign(SignRequest) returns (SignResponse);
//!   rpc Benchmark(BenchmarkRequest) returns (BenchmarkResponse);
//! }
//!
//! message TraceContext { string trace_id = 1; string span_id = 2; string trace_flags = 3; string trace_state = 4; }
//! message Metadata { string id = 1; string created_at = 2; TraceContext trace_context = 3; }
//! message HashRequest { string profile = 1; bytes input = 2; Metadata metadata = 3; }
//! message HashResponse { string hash_value = 1; string hash_algorithm = 2; Metadata metadata = 3; }
//! message SignRequest {
//!   string profile = 1; string csr = 2; string ca_private_key = 3; string ca_cert = 4;
//!   optional string subject = 5; repeated string crl_distribution_points = 6; Metadata metadata = 7;
//! }
//! message SignResponse { bytes signed_certificate = 1; Metadata metadata = 2; }
//! message BenchmarkRequest { Metadata metadata = 1; }
//! message BenchmarkResponse { string benchmark_results = 1; }
//! ```
//!
//! The health messages follow `grpc.health.v1`.

#![allow(missing_docs)]

/// Fully qualified broker service name
pub const BROKER_SERVICE: &str = "cryptobroker.CryptoBroker";

/// Fully qualified health service name
pub const HEALTH_SERVICE: &str = "grpc.health.v1.Health";

/// W3C trace context forwarded to the broker
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TraceContext {
    #[prost(string, tag = "1")]
    pub trace_id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub span_id: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub trace_flags: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub trace_state: ::prost::alloc::string::String,
}

/// Per-request correlation metadata
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Metadata {
    #[prost(string, tag = "1")]
    pub id: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub created_at: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub trace_context: ::core::option::Option<TraceContext>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashRequest {
    #[prost(string, tag = "1")]
    pub profile: ::prost::alloc::string::String,
    #[prost(bytes = "vec", tag = "2")]
    pub input: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "3")]
    pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashResponse {
    #[prost(string, tag = "1")]
    pub hash_value: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub hash_algorithm: ::prost::alloc::string::String,
    #[prost(message, optional, tag = "3")]
    pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignRequest {
    #[prost(string, tag = "1")]
    pub profile: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub csr: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub ca_private_key: ::prost::alloc::string::String,
    #[prost(string, tag = "4")]
    pub ca_cert: ::prost::alloc::string::String,
    #[prost(string, optional, tag = "5")]
    pub subject: ::core::option::Option<::prost::alloc::string::String>,
    #[prost(string, repeated, tag = "6")]
    pub crl_distribution_points: ::prost::alloc::vec::Vec<::prost::alloc::string::String>,
    #[prost(message, optional, tag = "7")]
    pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SignResponse {
    #[prost(bytes = "vec", tag = "1")]
    pub signed_certificate: ::prost::alloc::vec::Vec<u8>,
    #[prost(message, optional, tag = "2")]
    pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BenchmarkRequest {
    #[prost(message, optional, tag = "1")]
    pub metadata: ::core::option::Option<Metadata>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BenchmarkResponse {
    #[prost(string, tag = "1")]
    pub benchmark_results: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckRequest {
    #[prost(string, tag = "1")]
    pub service: ::prost::alloc::string::String,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HealthCheckResponse {
    #[prost(enumeration = "health_check_response::ServingStatus", tag = "1")]
    pub status: i32,
}

/// Nested types for `HealthCheckResponse`
pub mod health_check_response {
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
    #[repr(i32)]
    pub enum ServingStatus {
        Unknown = 0,
        Serving = 1,
        NotServing = 2,
        ServiceUnknown = 3,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use prost::Message;

    #[test]
    fn test_sign_request_subject_absent_when_none() {
        let request = SignRequest {
            profile: "Default".to_string(),
            subject: None,
            ..Default::default()
        };
        let decoded = SignRequest::decode(request.encode_to_vec().as_slice()).unwrap();
        assert_eq!(decoded.subject, None);
    }

    #[test]
    fn test_health_status_from_wire() {
        let response = HealthCheckResponse { status: 2 };
        assert_eq!(
            health_check_response::ServingStatus::try_from(response.status),
            Ok(health_check_response::ServingStatus::NotServing)
        );
    }
}
