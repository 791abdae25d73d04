//! Command line surface
//!
//! `Cli` is the clap definition; it is converted once into an [`Invocation`],
//! the immutable description of what the run should do.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use broker_client::CertEncoding;
use clap::{Args, Parser, Subcommand, ValueEnum};

/// Profile used when `--profile` is not given
pub const DEFAULT_PROFILE: &str = "Default";

/// CRL distribution points embedded when no `--crl` is given
pub const DEFAULT_CRL_DISTRIBUTION_POINTS: [&str; 2] = [
    "http://example.com/crls/list1.crl",
    "http://example.com/crls/list2.crl",
];

/// Command line client for the crypto broker
#[derive(Debug, Parser)]
#[command(name = "broker-cli", version, about = "Command line client for the crypto broker")]
pub struct Cli {
    /// Profile Selection
    #[arg(long, default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// Loops the request with the specified delay (in ms, 1-1000)
    #[arg(
        long = "loop",
        value_name = "DELAY_MS",
        value_parser = clap::value_parser!(u64).range(1..=1000)
    )]
    pub delay: Option<u64>,

    /// Command Selection
    #[command(subcommand)]
    pub command: Commands,
}

/// Broker subcommands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create a hash
    Hash {
        /// Print only the hash value
        #[arg(long)]
        data_only: bool,

        /// Data to hash
        data: String,
    },

    /// Sign a CSR with a CA certificate and key
    Sign(SignArgs),

    /// Request server health status
    Health,

    /// Request server-side benchmark
    Benchmark,
}

/// Arguments of the `sign` subcommand
#[derive(Debug, Args)]
pub struct SignArgs {
    /// Path to CSR file
    #[arg(long)]
    pub csr: PathBuf,

    /// Path to CA certificate file
    #[arg(long = "caCert", value_name = "PATH")]
    pub ca_cert: PathBuf,

    /// Path to CA private key file
    #[arg(long = "caKey", value_name = "PATH")]
    pub ca_key: PathBuf,

    /// Encoding of the signed certificate
    #[arg(long, value_enum, default_value_t = Encoding::Pem)]
    pub encoding: Encoding,

    /// Subject for the signing request (overwrites the subject in the CSR)
    #[arg(long)]
    pub subject: Option<String>,

    /// CRL distribution point URL, may be repeated
    #[arg(long = "crl", value_name = "URL")]
    pub crl: Vec<String>,
}

/// `--encoding` values
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Encoding {
    /// PEM armoured certificate
    #[value(name = "PEM")]
    Pem,
    /// Single-line base64 DER
    #[value(name = "B64")]
    B64,
}

impl From<Encoding> for CertEncoding {
    fn from(encoding: Encoding) -> Self {
        match encoding {
            Encoding::Pem => Self::Pem,
            Encoding::B64 => Self::B64,
        }
    }
}

/// A parsed, validated command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// What to request from the broker
    pub command: Command,
    /// Broker profile
    pub profile: String,
    /// Repeat delay; `None` runs once
    pub delay: Option<Duration>,
}

/// A broker request with its arguments
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Hash `data`
    Hash {
        /// Data to hash, sent as UTF-8 bytes
        data: String,
        /// Print only the hash value
        data_only: bool,
    },
    /// Sign a CSR
    Sign(SignCommand),
    /// Query serving status
    Health,
    /// Run server-side benchmarks
    Benchmark,
}

impl Command {
    /// Subcommand name
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Hash { .. } => "hash",
            Self::Sign(_) => "sign",
            Self::Health => "health",
            Self::Benchmark => "benchmark",
        }
    }
}

/// Inputs of a sign request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignCommand {
    /// CSR file
    pub csr: PathBuf,
    /// CA certificate file
    pub ca_cert: PathBuf,
    /// CA private key file
    pub ca_key: PathBuf,
    /// Output encoding
    pub encoding: CertEncoding,
    /// Subject override, never empty
    pub subject: Option<String>,
    /// CRL distribution points to embed
    pub crl_distribution_points: Vec<String>,
}

impl From<SignArgs> for SignCommand {
    fn from(args: SignArgs) -> Self {
        let crl_distribution_points = if args.crl.is_empty() {
            DEFAULT_CRL_DISTRIBUTION_POINTS
                .iter()
                .map(ToString::to_string)
                .collect()
        } else {
            args.crl
        };

        Self {
            csr: args.csr,
            ca_cert: args.ca_cert,
            ca_key: args.ca_key,
            encoding: args.encoding.into(),
            subject: args.subject.filter(|s| !s.is_empty()),
            crl_distribution_points,
        }
    }
}

impl From<Cli> for Invocation {
    fn from(cli: Cli) -> Self {
        let command = match cli.command {
            Commands::Hash { data_only, data } => Command::Hash { data, data_only },
            Commands::Sign(args) => Command::Sign(args.into()),
            Commands::Health => Command::Health,
            Commands::Benchmark => Command::Benchmark,
        };

        Self {
            command,
            profile: cli.profile,
            delay: cli.delay.map(Duration::from_millis),
        }
    }
}

impl Invocation {
    /// Parses process-style arguments (the first item is the program name)
    ///
    /// # Errors
    ///
    /// Returns the clap error for any usage problem; `exit_code()` on it is 2.
    pub fn try_parse_from<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Cli::try_parse_from(args).map(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use clap::error::ErrorKind;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_hash_defaults() {
        let invocation = Invocation::try_parse_from(["broker-cli", "hash", "hello"]).unwrap();
        assert_eq!(invocation.profile, DEFAULT_PROFILE);
        assert_eq!(invocation.delay, None);
        assert_eq!(
            invocation.command,
            Command::Hash {
                data: "hello".to_string(),
                data_only: false
            }
        );
    }

    #[test]
    fn test_global_options() {
        let invocation =
            Invocation::try_parse_from(["broker-cli", "--profile", "Strict", "--loop", "250", "health"])
                .unwrap();
        assert_eq!(invocation.profile, "Strict");
        assert_eq!(invocation.delay, Some(Duration::from_millis(250)));
        assert_eq!(invocation.command.name(), "health");
    }

    #[test]
    fn test_loop_bounds() {
        assert!(Invocation::try_parse_from(["broker-cli", "--loop", "1", "health"]).is_ok());
        assert!(Invocation::try_parse_from(["broker-cli", "--loop", "1000", "health"]).is_ok());

        let err = Invocation::try_parse_from(["broker-cli", "--loop", "0", "health"]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ValueValidation);
        assert_eq!(err.exit_code(), 2);

        assert!(Invocation::try_parse_from(["broker-cli", "--loop", "1001", "health"]).is_err());
        assert!(Invocation::try_parse_from(["broker-cli", "--loop", "fast", "health"]).is_err());
    }

    #[test]
    fn test_missing_subcommand() {
        let err = Invocation::try_parse_from(["broker-cli"]).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_sign_defaults() {
        let invocation = Invocation::try_parse_from([
            "broker-cli", "sign", "--csr", "r.csr", "--caCert", "ca.crt", "--caKey", "ca.key",
        ])
        .unwrap();

        let Command::Sign(sign) = invocation.command else {
            panic!("expected sign command");
        };
        assert_eq!(sign.encoding, CertEncoding::Pem);
        assert_eq!(sign.subject, None);
        assert_eq!(sign.crl_distribution_points, DEFAULT_CRL_DISTRIBUTION_POINTS);
    }

    #[test]
    fn test_sign_options() {
        let invocation = Invocation::try_parse_from([
            "broker-cli", "sign", "--csr", "r.csr", "--caCert", "ca.crt", "--caKey", "ca.key",
            "--encoding", "B64", "--subject", "CN=override", "--crl", "http://crl.test/a.crl",
        ])
        .unwrap();

        let Command::Sign(sign) = invocation.command else {
            panic!("expected sign command");
        };
        assert_eq!(sign.encoding, CertEncoding::B64);
        assert_eq!(sign.subject.as_deref(), Some("CN=override"));
        assert_eq!(sign.crl_distribution_points, vec!["http://crl.test/a.crl"]);
    }

    #[test]
    fn test_empty_subject_is_absent() {
        let invocation = Invocation::try_parse_from([
            "broker-cli", "sign", "--csr", "r.csr", "--caCert", "ca.crt", "--caKey", "ca.key",
            "--subject=",
        ])
        .unwrap();

        let Command::Sign(sign) = invocation.command else {
            panic!("expected sign command");
        };
        assert_eq!(sign.subject, None);
    }

    #[test]
    fn test_unknown_encoding_rejected() {
        let err = Invocation::try_parse_from([
            "broker-cli", "sign", "--csr", "r.csr", "--caCert", "ca.crt", "--caKey", "ca.key",
            "--encoding", "DER",
        ])
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidValue);
    }
}
