//! Executor tests against the scripted broker

use broker_cli::cli::DEFAULT_CRL_DISTRIBUTION_POINTS;
use broker_cli::{CliError, Command, Invocation, RequestExecutor, SignCommand};
use broker_client::{CertEncoding, ServingStatus};
use test_utils::fixtures::{SAMPLE_CA_CERT, SAMPLE_CA_KEY, SAMPLE_CSR};
use test_utils::mocks::{HELLO_SHA3_256, SIGNED_CERT_PEM};
use test_utils::{BrokerCall, ScriptedBroker, SignFixture};
use tokio_test::{assert_err, assert_ok};

fn invocation(command: Command) -> Invocation {
    Invocation {
        command,
        profile: "Default".to_string(),
        delay: None,
    }
}

fn sign_command(fixture: &SignFixture, encoding: CertEncoding) -> SignCommand {
    SignCommand {
        csr: fixture.csr.clone(),
        ca_cert: fixture.ca_cert.clone(),
        ca_key: fixture.ca_key.clone(),
        encoding,
        subject: None,
        crl_distribution_points: DEFAULT_CRL_DISTRIBUTION_POINTS
            .iter()
            .map(ToString::to_string)
            .collect(),
    }
}

fn output(executor: RequestExecutor<ScriptedBroker, Vec<u8>>) -> serde_json::Value {
    serde_json::from_slice(&executor.into_output()).unwrap()
}

/// Hash sends profile, input bytes and metadata, and prints JSON
#[tokio::test]
async fn test_hash_sends_profile_and_bytes() {
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    let command = Command::Hash {
        data: "hello".to_string(),
        data_only: false,
    };
    assert_ok!(executor.execute(&invocation(command)).await);

    let calls = broker.calls();
    assert_eq!(calls.len(), 1);
    let BrokerCall::Hash(payload) = &calls[0] else {
        panic!("expected hash call, got {:?}", calls[0]);
    };
    assert_eq!(payload.profile, "Default");
    assert_eq!(payload.input, b"hello");
    assert!(!payload.metadata.id.is_empty());
    assert!(chrono::DateTime::parse_from_rfc3339(&payload.metadata.created_at).is_ok());

    let json = output(executor);
    assert_eq!(json["hashAlgorithm"], "SHA3-256");
    assert_eq!(json["hashValue"], HELLO_SHA3_256);
}

/// Every request carries a new correlation id
#[tokio::test]
async fn test_each_request_gets_a_fresh_id() {
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    assert_ok!(executor.hash("Default", "a", true).await);
    assert_ok!(executor.hash("Default", "b", true).await);

    let ids: Vec<String> = broker
        .calls()
        .into_iter()
        .filter_map(|call| match call {
            BrokerCall::Hash(payload) => Some(payload.metadata.id),
            _ => None,
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
}

/// Sign sends the file contents verbatim with the chosen encoding
#[tokio::test]
async fn test_sign_sends_file_contents() {
    let fixture = SignFixture::write().unwrap();
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    let mut command = sign_command(&fixture, CertEncoding::B64);
    command.subject = Some("CN=test.example.com".to_string());
    assert_ok!(executor.sign("Strict", &command).await);

    let calls = broker.calls();
    let BrokerCall::Sign(payload, options) = &calls[0] else {
        panic!("expected sign call, got {:?}", calls[0]);
    };
    assert_eq!(payload.profile, "Strict");
    assert_eq!(payload.csr, SAMPLE_CSR);
    assert_eq!(payload.ca_cert, SAMPLE_CA_CERT);
    assert_eq!(payload.ca_private_key, SAMPLE_CA_KEY);
    assert_eq!(payload.subject.as_deref(), Some("CN=test.example.com"));
    assert_eq!(payload.crl_distribution_points.len(), 2);
    assert_eq!(options.encoding, CertEncoding::B64);

    assert_eq!(output(executor)["signedCertificate"], SIGNED_CERT_PEM);
}

/// An unreadable key file fails before any broker call
#[tokio::test]
async fn test_sign_with_missing_key_makes_no_call() {
    let fixture = SignFixture::write().unwrap();
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    let mut command = sign_command(&fixture, CertEncoding::Pem);
    command.ca_key = fixture.missing_path();
    let err = assert_err!(executor.sign("Default", &command).await);

    assert!(matches!(
        err,
        CliError::ReadInput { what: "CA private key", ref path, .. } if *path == fixture.missing_path()
    ));
    assert_eq!(broker.operation_count(), 0);
    assert!(executor.into_output().is_empty());
}

/// Health prints the status label
#[tokio::test]
async fn test_health_reports_status() {
    let broker = ScriptedBroker::new().with_status(ServingStatus::NotServing);
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    assert_ok!(executor.execute(&invocation(Command::Health)).await);
    assert_eq!(broker.calls(), vec![BrokerCall::Health]);
    assert_eq!(output(executor)["status"], "NOT_SERVING");
}

/// JSON benchmark results are embedded as JSON
#[tokio::test]
async fn test_benchmark_results_are_embedded_as_json() {
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    assert_ok!(executor.execute(&invocation(Command::Benchmark)).await);
    let json = output(executor);
    assert_eq!(json["benchmarkResults"]["results"][0]["name"], "SHA3-256");
    assert_eq!(json["benchmarkResults"]["results"][0]["ops"], 120_000);
}

/// Other benchmark results are printed as a string
#[tokio::test]
async fn test_non_json_benchmark_results_are_kept_as_text() {
    let broker = ScriptedBroker::new().with_benchmark_results("not json");
    let mut executor = RequestExecutor::new(broker, Vec::new());

    assert_ok!(executor.benchmark().await);
    assert_eq!(output(executor)["benchmarkResults"], "not json");
}

/// Broker failures are returned to the caller
#[tokio::test]
async fn test_broker_failure_is_returned() {
    let broker = ScriptedBroker::new().failing_after(0);
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());

    let err = assert_err!(executor.health().await);
    assert!(matches!(err, CliError::Broker(_)));
    assert_eq!(broker.operation_count(), 1);
}
