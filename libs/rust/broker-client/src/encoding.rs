//! Signed certificate output encodings

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::fmt;
use std::str::FromStr;

/// Encoding applied to the DER certificate returned by the broker
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CertEncoding {
    /// PEM armour around 64-column base64
    #[default]
    Pem,
    /// Single-line standard base64 of the DER bytes
    B64,
}

const PEM_LINE_WIDTH: usize = 64;

impl CertEncoding {
    /// Canonical name, as accepted on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pem => "PEM",
            Self::B64 => "B64",
        }
    }

    /// Renders DER bytes in this encoding
    #[must_use]
    pub fn encode(self, der: &[u8]) -> String {
        let b64 = STANDARD.encode(der);
        match self {
            Self::B64 => b64,
            Self::Pem => {
                let mut pem = String::with_capacity(b64.len() + b64.len() / PEM_LINE_WIDTH + 64);
                pem.push_str("-----BEGIN CERTIFICATE-----\n");
                // base64 output is ASCII, so byte chunks are valid str slices
                for line in b64.as_bytes().chunks(PEM_LINE_WIDTH) {
                    pem.push_str(&String::from_utf8_lossy(line));
                    pem.push('\n');
                }
                pem.push_str("-----END CERTIFICATE-----\n");
                pem
            }
        }
    }
}

impl fmt::Display for CertEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CertEncoding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PEM" => Ok(Self::Pem),
            "B64" => Ok(Self::B64),
            other => Err(format!("unknown certificate encoding '{other}'")),
        }
    }
}
