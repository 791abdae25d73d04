//! CLI error types

use std::path::PathBuf;

use broker_client::BrokerError;
use thiserror::Error;

/// Errors that end a CLI run
#[derive(Error, Debug)]
pub enum CliError {
    /// A CSR, CA certificate or CA key file could not be read
    #[error("Failed to read {what} from {}: {source}", path.display())]
    ReadInput {
        /// Which input was being read
        what: &'static str,
        /// Path given on the command line
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The broker call failed
    #[error(transparent)]
    Broker(#[from] BrokerError),

    /// Writing the response to stdout failed
    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),

    /// The response could not be serialized
    #[error("Failed to render response: {0}")]
    Render(#[from] serde_json::Error),
}

impl CliError {
    /// Short name of the error, used as `exception.type`
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ReadInput { .. } => "read_input",
            Self::Broker(err) => err.kind(),
            Self::Output(_) => "output",
            Self::Render(_) => "render",
        }
    }

    /// Whether a later attempt could succeed (broker unreachable or busy)
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Broker(err) => err.is_retryable(),
            Self::ReadInput { .. } | Self::Output(_) | Self::Render(_) => false,
        }
    }
}
