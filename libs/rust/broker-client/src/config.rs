//! Broker client configuration
//!
//! Type-safe configuration for the crypto broker connection with validation.

use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::BrokerError;

/// Default broker address, a Unix domain socket next to the broker process
pub const DEFAULT_ENDPOINT: &str = "unix:///tmp/cryptobroker.sock";

/// Where the broker listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerAddress {
    /// Unix domain socket path
    Unix(PathBuf),
    /// HTTP/2 endpoint, optionally with TLS
    Tcp(Url),
}

/// Configuration for `CryptoBrokerClient`
#[derive(Debug, Clone)]
pub struct CryptoBrokerConfig {
    /// Broker endpoint, `unix:///path` or `http(s)://host:port`
    pub endpoint: Url,
    /// Timeout for establishing the connection
    pub connect_timeout: Duration,
}

impl Default for CryptoBrokerConfig {
    fn default() -> Self {
        Self {
            endpoint: Url::parse(DEFAULT_ENDPOINT).expect("valid default URL"),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

impl CryptoBrokerConfig {
    /// Creates a new config with the given endpoint
    #[must_use]
    pub fn with_endpoint(mut self, endpoint: Url) -> Self {
        self.endpoint = endpoint;
        self
    }

    /// Creates a new config with the given connect timeout
    #[must_use]
    pub const fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::InvalidConfig` if:
    /// - Endpoint scheme is not unix, http or https
    /// - A unix endpoint has an empty path
    /// - Connect timeout is zero
    pub fn validate(&self) -> Result<(), BrokerError> {
        self.address()?;

        if self.connect_timeout.is_zero() {
            return Err(BrokerError::invalid_config(
                "Connect timeout must be greater than zero",
            ));
        }

        Ok(())
    }

    /// Resolves the endpoint into a dialable address
    ///
    /// # Errors
    ///
    /// Returns `BrokerError::InvalidConfig` for unsupported schemes or an empty
    /// socket path.
    pub fn address(&self) -> Result<BrokerAddress, BrokerError> {
        match self.endpoint.scheme() {
            "unix" => {
                let path = self.endpoint.path();
                if path.is_empty() || path == "/" {
                    return Err(BrokerError::invalid_config(
                        "Unix endpoint must name a socket path",
                    ));
                }
                Ok(BrokerAddress::Unix(PathBuf::from(path)))
            }
            "http" | "https" => Ok(BrokerAddress::Tcp(self.endpoint.clone())),
            scheme => Err(BrokerError::invalid_config(format!(
                "Invalid endpoint scheme '{scheme}': must be unix, http or https"
            ))),
        }
    }

    /// Returns the endpoint as a string
    #[must_use]
    pub fn endpoint_str(&self) -> &str {
        self.endpoint.as_str()
    }
}
