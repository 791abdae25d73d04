//! Broker test double.
//!
//! `ScriptedBroker` answers every operation with a canned response, records
//! each call, and can be told to start failing after a number of successful
//! operations.

use std::sync::Arc;

use async_trait::async_trait;
use broker_client::{
    BenchmarkPayload, BenchmarkResponse, BrokerError, CryptoBroker, HashPayload, HashResponse,
    HealthResponse, ServingStatus, SignOptions, SignPayload, SignResponse,
};
use parking_lot::Mutex;

/// SHA3-256 of `"hello"`, hex encoded.
pub const HELLO_SHA3_256: &str =
    "3338be694f50c5f338814986cdf0686453a888b84f424d792af4b9202398f392";

/// Signed certificate returned by the default script.
pub const SIGNED_CERT_PEM: &str = "-----BEGIN CERTIFICATE-----\nMIIBszCCAVmgAwIBAgIUScripted\n-----END CERTIFICATE-----\n";

/// A recorded broker call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerCall {
    /// `ready()`
    Ready,
    /// `hash_data()`
    Hash(HashPayload),
    /// `sign_certificate()`
    Sign(SignPayload, SignOptions),
    /// `health_data()`
    Health,
    /// `benchmark_data()`
    Benchmark(BenchmarkPayload),
}

impl BrokerCall {
    /// Whether this call is a remote operation (anything but `ready()`).
    #[must_use]
    pub const fn is_operation(&self) -> bool {
        !matches!(self, Self::Ready)
    }
}

/// Scripted broker for integration tests.
///
/// Clones share the call log, so a test can keep one handle and give the
/// other to the code under test.
#[derive(Debug, Clone)]
pub struct ScriptedBroker {
    calls: Arc<Mutex<Vec<BrokerCall>>>,
    fail_after: Option<usize>,
    hash_response: HashResponse,
    signed_certificate: String,
    status: ServingStatus,
    benchmark_results: String,
}

impl Default for ScriptedBroker {
    fn default() -> Self {
        Self {
            calls: Arc::new(Mutex::new(Vec::new())),
            fail_after: None,
            hash_response: HashResponse {
                hash_algorithm: "SHA3-256".to_string(),
                hash_value: HELLO_SHA3_256.to_string(),
            },
            signed_certificate: SIGNED_CERT_PEM.to_string(),
            status: ServingStatus::Serving,
            benchmark_results: r#"{"results":[{"name":"SHA3-256","ops":120000}]}"#.to_string(),
        }
    }
}

impl ScriptedBroker {
    /// Create a broker that always succeeds.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Succeed for `successes` operations, then fail every later one.
    #[must_use]
    pub const fn failing_after(mut self, successes: usize) -> Self {
        self.fail_after = Some(successes);
        self
    }

    /// Set the hash response.
    #[must_use]
    pub fn with_hash_response(mut self, algorithm: &str, value: &str) -> Self {
        self.hash_response = HashResponse {
            hash_algorithm: algorithm.to_string(),
            hash_value: value.to_string(),
        };
        self
    }

    /// Set the serving status returned by `health_data()`.
    #[must_use]
    pub const fn with_status(mut self, status: ServingStatus) -> Self {
        self.status = status;
        self
    }

    /// Set the benchmark results text.
    #[must_use]
    pub fn with_benchmark_results(mut self, results: &str) -> Self {
        self.benchmark_results = results.to_string();
        self
    }

    /// All recorded calls, in order.
    #[must_use]
    pub fn calls(&self) -> Vec<BrokerCall> {
        self.calls.lock().clone()
    }

    /// Number of remote operations issued (excludes `ready()`).
    #[must_use]
    pub fn operation_count(&self) -> usize {
        self.calls.lock().iter().filter(|c| c.is_operation()).count()
    }

    /// Records the call and decides whether it should fail.
    fn record(&self, call: BrokerCall) -> Result<(), BrokerError> {
        let mut calls = self.calls.lock();
        calls.push(call);
        let operations = calls.iter().filter(|c| c.is_operation()).count();
        match self.fail_after {
            Some(successes) if operations > successes => {
                Err(BrokerError::unavailable("scripted failure"))
            }
            _ => Ok(()),
        }
    }
}

#[async_trait]
impl CryptoBroker for ScriptedBroker {
    async fn ready(&self) -> Result<(), BrokerError> {
        self.calls.lock().push(BrokerCall::Ready);
        Ok(())
    }

    async fn hash_data(&self, payload: HashPayload) -> Result<HashResponse, BrokerError> {
        self.record(BrokerCall::Hash(payload))?;
        Ok(self.hash_response.clone())
    }

    async fn sign_certificate(
        &self,
        payload: SignPayload,
        options: SignOptions,
    ) -> Result<SignResponse, BrokerError> {
        self.record(BrokerCall::Sign(payload, options))?;
        Ok(SignResponse {
            signed_certificate: self.signed_certificate.clone(),
        })
    }

    async fn health_data(&self) -> Result<HealthResponse, BrokerError> {
        self.record(BrokerCall::Health)?;
        Ok(HealthResponse {
            status: self.status,
        })
    }

    async fn benchmark_data(
        &self,
        payload: BenchmarkPayload,
    ) -> Result<BenchmarkResponse, BrokerError> {
        self.record(BrokerCall::Benchmark(payload))?;
        Ok(BenchmarkResponse {
            benchmark_results: self.benchmark_results.clone(),
        })
    }
}
