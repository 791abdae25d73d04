//! Loop driver tests

use std::time::Duration;

use broker_cli::runner::{self, RunOutcome};
use broker_cli::{CliError, Invocation, RequestExecutor, ShutdownCoordinator};
use test_utils::{BrokerCall, ScriptedBroker};
use tokio_test::{assert_err, assert_ok};

fn parse(args: &[&str]) -> Invocation {
    Invocation::try_parse_from(args).unwrap()
}

/// Without --loop the command runs once after readiness
#[tokio::test]
async fn test_single_shot_runs_exactly_once() {
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());
    let coordinator = ShutdownCoordinator::new();

    let invocation = parse(&["broker-cli", "hash", "hello"]);
    let report = assert_ok!(runner::run(&mut executor, &invocation, coordinator.subscribe()).await);

    assert_eq!(report.cycles, 1);
    assert_eq!(report.outcome, RunOutcome::Completed);
    assert_eq!(broker.calls()[0], BrokerCall::Ready);
    assert_eq!(broker.operation_count(), 1);
}

/// A failing cycle ends the loop
#[tokio::test]
async fn test_loop_stops_at_first_failure() {
    let broker = ScriptedBroker::new().failing_after(3);
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());
    let coordinator = ShutdownCoordinator::new();

    let invocation = parse(&["broker-cli", "--loop", "5", "hash", "hello"]);
    let err = assert_err!(runner::run(&mut executor, &invocation, coordinator.subscribe()).await);

    assert!(matches!(err, CliError::Broker(_)));
    assert_eq!(broker.operation_count(), 4);
    let reports = String::from_utf8(executor.into_output()).unwrap();
    assert_eq!(reports.matches("hashValue").count(), 3);
}

/// Shutdown ends the loop cleanly
#[tokio::test]
async fn test_shutdown_interrupts_the_loop() {
    let broker = ScriptedBroker::new();
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());
    let coordinator = ShutdownCoordinator::new();
    let signal = coordinator.subscribe();

    let trigger = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(30)).await;
        coordinator.trigger();
    });

    let invocation = parse(&["broker-cli", "--loop", "5", "health"]);
    let report = tokio::time::timeout(
        Duration::from_secs(5),
        runner::run(&mut executor, &invocation, signal),
    )
    .await
    .expect("loop should stop after shutdown")
    .unwrap();
    trigger.await.unwrap();

    assert_eq!(report.outcome, RunOutcome::Interrupted);
    assert!(report.cycles >= 1);
    assert_eq!(broker.operation_count() as u64, report.cycles);
}

/// A failed single run prints nothing
#[tokio::test]
async fn test_failed_single_shot_writes_nothing() {
    let broker = ScriptedBroker::new().failing_after(0);
    let mut executor = RequestExecutor::new(broker.clone(), Vec::new());
    let coordinator = ShutdownCoordinator::new();

    let invocation = parse(&["broker-cli", "benchmark"]);
    assert_err!(runner::run(&mut executor, &invocation, coordinator.subscribe()).await);
    assert_eq!(broker.operation_count(), 1);
    assert!(executor.into_output().is_empty());
}
