//! Shared test utilities for the crypto broker CLI.
//!
//! This crate provides:
//! - A scripted, call-recording [`CryptoBroker`](broker_client::CryptoBroker) double
//! - Proptest generators for CLI inputs
//! - CSR / CA fixtures written to temporary files

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod mocks;

pub use fixtures::SignFixture;
pub use generators::*;
pub use mocks::{BrokerCall, ScriptedBroker};
