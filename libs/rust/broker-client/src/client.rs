//! CryptoBroker client
//!
//! Unary gRPC calls against the crypto broker over a Unix domain socket or
//! HTTP/2. The connection is established once, on `ready()` or on first use.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tonic::codegen::http::uri::PathAndQuery;
use tonic::transport::{Channel, ClientTlsConfig, Endpoint};
use tracing::{debug, info};

use crate::config::{BrokerAddress, CryptoBrokerConfig};
use crate::error::BrokerError;
use crate::proto;
use crate::types::{
    BenchmarkPayload, BenchmarkResponse, HashPayload, HashResponse, HealthResponse,
    ServingStatus, SignOptions, SignPayload, SignResponse,
};

const HASH_PATH: &str = "/cryptobroker.CryptoBroker/Hash";
const SIGN_PATH: &str = "/cryptobroker.CryptoBroker/Sign";
const BENCHMARK_PATH: &str = "/cryptobroker.CryptoBroker/Benchmark";
const HEALTH_CHECK_PATH: &str = "/grpc.health.v1.Health/Check";

/// Operations offered by the crypto broker
///
/// Callers depend on this trait rather than on `CryptoBrokerClient`, so tests
/// can substitute a scripted implementation.
#[cfg_attr(feature = "mock", mockall::automock)]
#[async_trait]
pub trait CryptoBroker: Send + Sync {
    /// Resolves once the connection to the broker is usable
    async fn ready(&self) -> Result<(), BrokerError>;

    /// Hashes the payload input with the profile's algorithm
    async fn hash_data(&self, payload: HashPayload) -> Result<HashResponse, BrokerError>;

    /// Signs a CSR with the given CA material
    async fn sign_certificate(
        &self,
        payload: SignPayload,
        options: SignOptions,
    ) -> Result<SignResponse, BrokerError>;

    /// Queries the broker's serving status
    async fn health_data(&self) -> Result<HealthResponse, BrokerError>;

    /// Runs the broker's built-in benchmarks
    async fn benchmark_data(
        &self,
        payload: BenchmarkPayload,
    ) -> Result<BenchmarkResponse, BrokerError>;
}

/// gRPC implementation of [`CryptoBroker`]
#[derive(Debug)]
pub struct CryptoBrokerClient {
    config: CryptoBrokerConfig,
    channel: OnceCell<Channel>,
}

impl CryptoBrokerClient {
    /// Creates a client; no connection is made until `ready()` or the first call
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::InvalidConfig` if the configuration is invalid.
    pub fn new(config: CryptoBrokerConfig) -> Result<Self, BrokerError> {
        config.validate()?;
        Ok(Self {
            config,
            channel: OnceCell::new(),
        })
    }

    async fn channel(&self) -> Result<Channel, BrokerError> {
        self.channel
            .get_or_try_init(|| self.connect())
            .await
            .cloned()
    }

    async fn connect(&self) -> Result<Channel, BrokerError> {
        let endpoint_str = self.config.endpoint_str().to_string();
        debug!(endpoint = %endpoint_str, "Connecting to crypto broker");

        let channel = match self.config.address()? {
            BrokerAddress::Unix(path) => {
                connect_unix(path, self.config.connect_timeout, &endpoint_str).await?
            }
            BrokerAddress::Tcp(url) => {
                let mut endpoint = Endpoint::from_shared(url.to_string())
                    .map_err(|e| BrokerError::invalid_config(format!("Invalid URL: {e}")))?
                    .connect_timeout(self.config.connect_timeout);
                if url.scheme() == "https" {
                    endpoint = endpoint
                        .tls_config(ClientTlsConfig::new().with_native_roots())
                        .map_err(|e| BrokerError::invalid_config(format!("TLS setup failed: {e}")))?;
                }
                endpoint
                    .connect()
                    .await
                    .map_err(|e| BrokerError::connect(&endpoint_str, e.to_string()))?
            }
        };

        info!(endpoint = %endpoint_str, "Connected to crypto broker");
        Ok(channel)
    }

    async fn unary<Req, Resp>(&self, path: &'static str, request: Req) -> Result<Resp, BrokerError>
    where
        Req: prost::Message + Send + Sync + 'static,
        Resp: prost::Message + Default + Send + Sync + 'static,
    {
        let mut grpc = tonic::client::Grpc::new(self.channel().await?);
        grpc.ready()
            .await
            .map_err(|e| BrokerError::unavailable(format!("Service was not ready: {e}")))?;

        let codec = tonic_prost::ProstCodec::<Req, Resp>::default();
        let response = grpc
            .unary(
                tonic::Request::new(request),
                PathAndQuery::from_static(path),
                codec,
            )
            .await?;

        Ok(response.into_inner())
    }
}

/// Opens a channel over a Unix domain socket
#[cfg(unix)]
async fn connect_unix(
    path: PathBuf,
    timeout: Duration,
    endpoint_str: &str,
) -> Result<Channel, BrokerError> {
    use hyper_util::rt::TokioIo;
    use tokio::net::UnixStream;
    use tonic::transport::Uri;
    use tower::service_fn;

    // The URI is required by tonic but ignored by the connector
    Endpoint::from_static("http://[::]:50051")
        .connect_timeout(timeout)
        .connect_with_connector(service_fn(move |_: Uri| {
            let path = path.clone();
            async move { Ok::<_, std::io::Error>(TokioIo::new(UnixStream::connect(path).await?)) }
        }))
        .await
        .map_err(|e| BrokerError::connect(endpoint_str, e.to_string()))
}

/// Unix domain sockets need a Unix host
#[cfg(not(unix))]
async fn connect_unix(
    path: PathBuf,
    _timeout: Duration,
    endpoint_str: &str,
) -> Result<Channel, BrokerError> {
    Err(BrokerError::connect(
        endpoint_str,
        format!(
            "Unix domain sockets are not supported on this platform ({})",
            path.display()
        ),
    ))
}

#[async_trait]
impl CryptoBroker for CryptoBrokerClient {
    async fn ready(&self) -> Result<(), BrokerError> {
        self.channel().await.map(|_| ())
    }

    async fn hash_data(&self, payload: HashPayload) -> Result<HashResponse, BrokerError> {
        let response: proto::HashResponse = self
            .unary(HASH_PATH, proto::HashRequest::from(payload))
            .await?;
        Ok(response.into())
    }

    async fn sign_certificate(
        &self,
        payload: SignPayload,
        options: SignOptions,
    ) -> Result<SignResponse, BrokerError> {
        let response: proto::SignResponse = self
            .unary(SIGN_PATH, proto::SignRequest::from(payload))
            .await?;

        if response.signed_certificate.is_empty() {
            return Err(BrokerError::MissingField {
                field: "signed_certificate",
            });
        }

        Ok(SignResponse {
            signed_certificate: options.encoding.encode(&response.signed_certificate),
        })
    }

    async fn health_data(&self) -> Result<HealthResponse, BrokerError> {
        let response: proto::HealthCheckResponse = self
            .unary(
                HEALTH_CHECK_PATH,
                proto::HealthCheckRequest {
                    service: String::new(),
                },
            )
            .await?;

        Ok(HealthResponse {
            status: ServingStatus::from_code(response.status)?,
        })
    }

    async fn benchmark_data(
        &self,
        payload: BenchmarkPayload,
    ) -> Result<BenchmarkResponse, BrokerError> {
        let response: proto::BenchmarkResponse = self
            .unary(BENCHMARK_PATH, proto::BenchmarkRequest::from(payload))
            .await?;
        Ok(response.into())
    }
}
