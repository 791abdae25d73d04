//! Request executor
//!
//! One method per command. Each runs inside a client span named after the
//! RPC, builds its payload, makes exactly one broker call and writes the
//! response to the output. Failures are recorded on the span and returned
//! unchanged.

use std::io::Write;
use std::time::Instant;

use broker_client::{CryptoBroker, SignOptions};
use tracing::field::{Empty, display};
use tracing::{Instrument, Span, error, info, info_span};

use crate::cli::{Command, Invocation, SignCommand};
use crate::error::CliError;
use crate::payload::{self, SignMaterial};
use crate::render::{self, BenchmarkReport, HashReport, HealthReport, SignReport};

/// Runs commands against a broker, writing reports to `out`
#[derive(Debug)]
pub struct RequestExecutor<B, W> {
    broker: B,
    out: W,
}

impl<B, W> RequestExecutor<B, W>
where
    B: CryptoBroker,
    W: Write + Send,
{
    /// Creates an executor
    pub const fn new(broker: B, out: W) -> Self {
        Self { broker, out }
    }

    /// Consumes the executor, returning its output sink
    pub fn into_output(self) -> W {
        self.out
    }

    /// Waits for the broker connection
    ///
    /// # Errors
    ///
    /// Returns the broker error if the connection cannot be established.
    pub async fn ready(&self) -> Result<(), CliError> {
        self.broker.ready().await.map_err(CliError::from)
    }

    /// Runs the command of `invocation` once
    ///
    /// # Errors
    ///
    /// Returns the error of the failed step; nothing is retried.
    pub async fn execute(&mut self, invocation: &Invocation) -> Result<(), CliError> {
        let profile = invocation.profile.as_str();
        match &invocation.command {
            Command::Hash { data, data_only } => self.hash(profile, data, *data_only).await,
            Command::Sign(command) => self.sign(profile, command).await,
            Command::Health => self.health().await,
            Command::Benchmark => self.benchmark().await,
        }
    }

    /// Hashes `data` with the profile's algorithm
    ///
    /// # Errors
    ///
    /// Returns `CliError::Broker` if the call fails.
    pub async fn hash(&mut self, profile: &str, data: &str, data_only: bool) -> Result<(), CliError> {
        let span = info_span!(
            "CLI.Hash",
            otel.kind = "client",
            rpc.method = "Hash",
            crypto.profile = %profile,
            crypto.input.size = attr_size(data.len()),
            crypto.hash.algorithm = Empty,
            crypto.hash.output.size = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty
        );

        let result = async {
            info!("Hashing '{data}' using \"{profile}\" profile...");
            let payload = payload::hash_payload(profile, data, payload::new_metadata(&Span::current()));

            let started = Instant::now();
            let response = self.broker.hash_data(payload).await;
            log_duration("Data Hashing", started);
            let response = response?;

            let span = Span::current();
            span.record("crypto.hash.algorithm", response.hash_algorithm.as_str());
            span.record("crypto.hash.output.size", attr_size(response.hash_value.len()));

            if data_only {
                render::write_line(&mut self.out, &response.hash_value)
            } else {
                render::write_json(&mut self.out, &HashReport::from(&response))
            }
        }
        .instrument(span.clone())
        .await;

        record_outcome(&span, result)
    }

    /// Signs the CSR named by `command`
    ///
    /// # Errors
    ///
    /// Returns `CliError::ReadInput` if an input file cannot be read, or
    /// `CliError::Broker` if the call fails.
    pub async fn sign(&mut self, profile: &str, command: &SignCommand) -> Result<(), CliError> {
        let span = info_span!(
            "CLI.Sign",
            otel.kind = "client",
            rpc.method = "Sign",
            crypto.profile = %profile,
            crypto.csr.size = Empty,
            crypto.ca_cert.size = Empty,
            crypto.ca_key.size = Empty,
            crypto.signed_cert.size = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty
        );

        let result = async {
            info!("Signing certificate using \"{profile}\" profile...");
            let material = SignMaterial::read(command)?;

            let span = Span::current();
            span.record("crypto.csr.size", attr_size(material.csr.len()));
            span.record("crypto.ca_cert.size", attr_size(material.ca_cert.len()));
            span.record("crypto.ca_key.size", attr_size(material.ca_key.len()));

            if let Some(subject) = &command.subject {
                info!("Note: The CSR subject will be overwritten by \"{subject}\".");
            }

            let payload = payload::sign_payload(profile, command, material, payload::new_metadata(&span));
            let options = SignOptions {
                encoding: command.encoding,
            };

            let started = Instant::now();
            let response = self.broker.sign_certificate(payload, options).await;
            log_duration("Certificate Signing", started);
            let response = response?;

            span.record(
                "crypto.signed_cert.size",
                attr_size(response.signed_certificate.len()),
            );
            render::write_json(&mut self.out, &SignReport::from(&response))
        }
        .instrument(span.clone())
        .await;

        record_outcome(&span, result)
    }

    /// Queries the broker's serving status
    ///
    /// # Errors
    ///
    /// Returns `CliError::Broker` if the call fails.
    pub async fn health(&mut self) -> Result<(), CliError> {
        let span = info_span!(
            "CLI.Health",
            otel.kind = "client",
            rpc.method = "Health",
            crypto.health.status = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty
        );

        let result = async {
            info!("Requesting server health status...");

            let started = Instant::now();
            let response = self.broker.health_data().await;
            log_duration("Health Check", started);
            let response = response?;

            let status = response.status.label();
            Span::current().record("crypto.health.status", status);
            info!("Status: {status}");
            render::write_json(&mut self.out, &HealthReport::from(&response))
        }
        .instrument(span.clone())
        .await;

        record_outcome(&span, result)
    }

    /// Runs the broker's benchmarks
    ///
    /// # Errors
    ///
    /// Returns `CliError::Broker` if the call fails.
    pub async fn benchmark(&mut self) -> Result<(), CliError> {
        let span = info_span!(
            "CLI.Benchmark",
            otel.kind = "client",
            rpc.method = "Benchmark",
            crypto.benchmark.results.size = Empty,
            otel.status_code = Empty,
            otel.status_message = Empty
        );

        let result = async {
            info!("Running server-side benchmarks...");
            let payload = payload::benchmark_payload(payload::new_metadata(&Span::current()));

            let started = Instant::now();
            let response = self.broker.benchmark_data(payload).await;
            log_duration("Benchmark", started);
            let response = response?;

            Span::current().record(
                "crypto.benchmark.results.size",
                attr_size(response.benchmark_results.len()),
            );
            render::write_json(&mut self.out, &BenchmarkReport::from(&response))
        }
        .instrument(span.clone())
        .await;

        record_outcome(&span, result)
    }
}

/// Sizes as `i64` so span exporters see integers
fn attr_size(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}

fn log_duration(label: &str, started: Instant) {
    info!("{label} took {} µs", started.elapsed().as_micros());
}

/// Sets the span status and records failures as an exception event
fn record_outcome(span: &Span, result: Result<(), CliError>) -> Result<(), CliError> {
    match &result {
        Ok(()) => {
            span.record("otel.status_code", "OK");
        }
        Err(err) => {
            span.record("otel.status_code", "ERROR");
            span.record("otel.status_message", display(err));
            span.in_scope(|| {
                error!(
                    exception.message = %err,
                    "exception.type" = err.kind(),
                    error.transient = err.is_transient(),
                    "exception"
                );
            });
        }
    }
    result
}
