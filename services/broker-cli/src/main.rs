//! Crypto Broker CLI - Main Entry Point
//!
//! Parses the command line, sets up telemetry, runs the requested command
//! against the broker and flushes telemetry before exiting.

use std::process::ExitCode;

use anyhow::Context;
use broker_client::{CryptoBrokerClient, CryptoBrokerConfig};
use clap::Parser;
use tracing::{error, info};

use broker_cli::runner::{self, RunReport};
use broker_cli::shutdown::{self, ShutdownCoordinator};
use broker_cli::{AppConfig, Cli, Invocation, RequestExecutor, Telemetry};

fn main() -> ExitCode {
    // Usage errors exit with status 2 here
    let invocation = Invocation::from(Cli::parse());

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // The OTLP gRPC exporters create their channels on this runtime
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("Error: failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    let telemetry = {
        let _guard = runtime.enter();
        match Telemetry::init(&config.telemetry) {
            Ok(telemetry) => telemetry,
            Err(e) => {
                eprintln!("Error: {e}");
                return ExitCode::FAILURE;
            }
        }
    };

    let result = runtime.block_on(async {
        let result = run(invocation, config.broker).await;
        match &result {
            Ok(report) => info!(cycles = report.cycles, outcome = ?report.outcome, "Run finished"),
            Err(e) => error!("Error: {e:#}"),
        }
        result
    });

    if let Err(e) = telemetry.shutdown() {
        eprintln!("Error: {e}");
    }

    // Interrupted runs still exit cleanly
    if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

async fn run(invocation: Invocation, broker: CryptoBrokerConfig) -> anyhow::Result<RunReport> {
    let coordinator = ShutdownCoordinator::new();
    let signal = coordinator.subscribe();
    let listener = shutdown::spawn_signal_listener(coordinator);

    let client = CryptoBrokerClient::new(broker).context("Invalid broker configuration")?;
    let mut executor = RequestExecutor::new(client, std::io::stdout());

    let report = runner::run(&mut executor, &invocation, signal)
        .await
        .with_context(|| format!("{} failed", invocation.command.name()));

    listener.abort();
    report
}
