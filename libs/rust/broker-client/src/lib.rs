//! Client library for the crypto broker service.
//!
//! The broker performs hashing, certificate signing and self-benchmarks on
//! behalf of its callers. This crate provides:
//! - The [`CryptoBroker`] trait that callers program against
//! - A gRPC implementation, [`CryptoBrokerClient`], over Unix sockets or HTTP/2
//! - Request/response types and certificate output encodings

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod client;
pub mod config;
pub mod encoding;
pub mod error;
pub mod proto;
pub mod types;

pub use client::{CryptoBroker, CryptoBrokerClient};
#[cfg(feature = "mock")]
pub use client::MockCryptoBroker;
pub use config::{BrokerAddress, CryptoBrokerConfig};
pub use encoding::CertEncoding;
pub use error::BrokerError;
pub use types::{
    BenchmarkPayload, BenchmarkResponse, HashPayload, HashResponse, HealthResponse, Metadata,
    ServingStatus, SignOptions, SignPayload, SignResponse, TraceContext,
};
