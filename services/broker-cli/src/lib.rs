//! Crypto broker CLI library.
//!
//! Provides:
//! - Command line parsing into an [`Invocation`]
//! - A [`RequestExecutor`] that runs one command per call against any
//!   [`broker_client::CryptoBroker`]
//! - The loop driver and shutdown signalling
//! - OpenTelemetry trace and log pipelines

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod config;
pub mod error;
pub mod executor;
pub mod observability;
pub mod payload;
pub mod render;
pub mod runner;
pub mod shutdown;

pub use cli::{Cli, Command, Invocation, SignCommand};
pub use config::{AppConfig, ConfigError};
pub use error::CliError;
pub use executor::RequestExecutor;
pub use observability::{Telemetry, TelemetryConfig, TelemetryError};
pub use runner::{RunOutcome, RunReport};
pub use shutdown::{ShutdownCoordinator, ShutdownSignal};
