//! Environment configuration
//!
//! Everything the CLI reads from the environment is read once, here, at
//! process start. An optional `.env` file is loaded first.

use std::env;
use std::time::Duration;

use broker_client::CryptoBrokerConfig;
use broker_client::config::DEFAULT_ENDPOINT;
use thiserror::Error;
use url::Url;

use crate::observability::TelemetryConfig;
use crate::observability::telemetry::{
    DEFAULT_EXPORTER, DEFAULT_LOG_FILTER, DEFAULT_SAMPLER, DEFAULT_SERVICE_NAME,
    DEFAULT_SERVICE_VERSION,
};

/// Default broker connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable name
        field: String,
        /// Parser message
        reason: String,
    },

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Broker client settings rejected
    #[error("Invalid broker settings: {0}")]
    Broker(String),
}

/// Process configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Telemetry pipelines
    pub telemetry: TelemetryConfig,
    /// Broker connection
    pub broker: CryptoBrokerConfig,
}

impl AppConfig {
    /// Loads configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration through `lookup`, which returns a variable's value.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for malformed values.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let telemetry = TelemetryConfig {
            service_name: string_env(&lookup, "OTEL_SERVICE_NAME", DEFAULT_SERVICE_NAME),
            service_version: string_env(&lookup, "OTEL_SERVICE_VERSION", DEFAULT_SERVICE_VERSION),
            traces_exporter: string_env(&lookup, "OTEL_TRACES_EXPORTER", DEFAULT_EXPORTER),
            traces_sampler: string_env(&lookup, "OTEL_TRACES_SAMPLER", DEFAULT_SAMPLER),
            traces_sampler_arg: optional_env(&lookup, "OTEL_TRACES_SAMPLER_ARG"),
            logs_exporter: string_env(&lookup, "OTEL_LOGS_EXPORTER", DEFAULT_EXPORTER),
            otlp_endpoint: optional_env(&lookup, "OTEL_EXPORTER_OTLP_ENDPOINT"),
            otlp_authorization: optional_env(&lookup, "OTEL_EXPORTER_OTLP_HEADERS_AUTHORIZATION"),
            log_filter: string_env(&lookup, "RUST_LOG", DEFAULT_LOG_FILTER),
        };

        let endpoint = parse_url_env(&lookup, "CRYPTO_BROKER_ENDPOINT", DEFAULT_ENDPOINT)?;
        let timeout_ms = parse_env(&lookup, "CRYPTO_BROKER_CONNECT_TIMEOUT_MS", DEFAULT_CONNECT_TIMEOUT_MS)?;

        let broker = CryptoBrokerConfig::default()
            .with_endpoint(endpoint)
            .with_connect_timeout(Duration::from_millis(timeout_ms));
        broker
            .validate()
            .map_err(|e| ConfigError::Broker(e.to_string()))?;

        Ok(Self { telemetry, broker })
    }
}

/// Value of a variable, treating empty as unset
fn optional_env<F>(lookup: &F, name: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).filter(|v| !v.trim().is_empty())
}

fn string_env<F>(lookup: &F, name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    optional_env(lookup, name).unwrap_or_else(|| default.to_string())
}

/// Parse an environment variable with a default value.
fn parse_env<F, T>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(lookup, name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a URL environment variable with a default value.
fn parse_url_env<F>(lookup: &F, name: &str, default: &str) -> Result<Url, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let url_str = string_env(lookup, name, default);
    Url::parse(&url_str).map_err(|e| ConfigError::InvalidUrl {
        field: name.to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |name| vars.get(name).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.telemetry, TelemetryConfig::default());
        assert_eq!(config.broker.endpoint.as_str(), DEFAULT_ENDPOINT);
        assert_eq!(config.broker.connect_timeout, Duration::from_millis(5000));
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OTEL_SERVICE_NAME", "broker-cli"),
            ("OTEL_TRACES_EXPORTER", "otlpgrpc,console"),
            ("OTEL_TRACES_SAMPLER", "ratio"),
            ("OTEL_TRACES_SAMPLER_ARG", "0.1"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
            ("OTEL_EXPORTER_OTLP_HEADERS_AUTHORIZATION", "Bearer t"),
            ("CRYPTO_BROKER_ENDPOINT", "http://broker.internal:50051"),
            ("CRYPTO_BROKER_CONNECT_TIMEOUT_MS", "750"),
        ]))
        .unwrap();

        assert_eq!(config.telemetry.service_name, "broker-cli");
        assert_eq!(config.telemetry.traces_exporter, "otlpgrpc,console");
        assert_eq!(config.telemetry.traces_sampler_arg.as_deref(), Some("0.1"));
        assert_eq!(config.telemetry.otlp_authorization.as_deref(), Some("Bearer t"));
        assert_eq!(config.broker.endpoint.as_str(), "http://broker.internal:50051/");
        assert_eq!(config.broker.connect_timeout, Duration::from_millis(750));
    }

    #[test]
    fn test_empty_values_fall_back() {
        let config = AppConfig::from_lookup(lookup(&[
            ("OTEL_TRACES_EXPORTER", ""),
            ("OTEL_EXPORTER_OTLP_HEADERS_AUTHORIZATION", ""),
        ]))
        .unwrap();
        assert_eq!(config.telemetry.traces_exporter, "console");
        assert_eq!(config.telemetry.otlp_authorization, None);
    }

    #[test]
    fn test_bad_timeout() {
        let result = AppConfig::from_lookup(lookup(&[("CRYPTO_BROKER_CONNECT_TIMEOUT_MS", "soon")]));
        assert!(matches!(result, Err(ConfigError::ParseError { ref name, .. }) if name == "CRYPTO_BROKER_CONNECT_TIMEOUT_MS"));

        let result = AppConfig::from_lookup(lookup(&[("CRYPTO_BROKER_CONNECT_TIMEOUT_MS", "0")]));
        assert!(matches!(result, Err(ConfigError::Broker(_))));
    }

    #[test]
    fn test_bad_endpoint() {
        let result = AppConfig::from_lookup(lookup(&[("CRYPTO_BROKER_ENDPOINT", "not a url")]));
        assert!(matches!(result, Err(ConfigError::InvalidUrl { .. })));

        let result = AppConfig::from_lookup(lookup(&[("CRYPTO_BROKER_ENDPOINT", "ftp://broker")]));
        assert!(matches!(result, Err(ConfigError::Broker(_))));
    }
}
