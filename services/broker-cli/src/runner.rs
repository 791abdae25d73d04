//! Loop driver
//!
//! Runs the executor once, or repeatedly with a fixed delay when `--loop` was
//! given. Every wait (readiness, request, sleep) is raced against the
//! shutdown signal.

use std::io::Write;

use broker_client::CryptoBroker;
use tracing::{debug, info};

use crate::cli::Invocation;
use crate::error::CliError;
use crate::executor::RequestExecutor;
use crate::shutdown::ShutdownSignal;

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// Single-shot run finished
    Completed,
    /// A shutdown signal ended the run
    Interrupted,
}

/// Summary of a run that did not fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    /// Successful executions
    pub cycles: u64,
    /// How the run ended
    pub outcome: RunOutcome,
}

impl RunReport {
    const fn completed(cycles: u64) -> Self {
        Self {
            cycles,
            outcome: RunOutcome::Completed,
        }
    }

    const fn interrupted(cycles: u64) -> Self {
        Self {
            cycles,
            outcome: RunOutcome::Interrupted,
        }
    }
}

/// Waits for the broker, then executes `invocation` until done
///
/// # Errors
///
/// Returns the first readiness or execution error; the loop stops there.
pub async fn run<B, W>(
    executor: &mut RequestExecutor<B, W>,
    invocation: &Invocation,
    mut shutdown: ShutdownSignal,
) -> Result<RunReport, CliError>
where
    B: CryptoBroker,
    W: Write + Send,
{
    tokio::select! {
        biased;
        () = shutdown.recv() => return Ok(RunReport::interrupted(0)),
        ready = executor.ready() => ready?,
    }

    let mut cycles = 0u64;
    loop {
        tokio::select! {
            biased;
            () = shutdown.recv() => return Ok(RunReport::interrupted(cycles)),
            result = executor.execute(invocation) => result?,
        }
        cycles += 1;

        let Some(delay) = invocation.delay else {
            return Ok(RunReport::completed(cycles));
        };

        debug!(cycles, delay_ms = delay.as_millis(), "Waiting before next request");
        tokio::select! {
            biased;
            () = shutdown.recv() => {
                info!(cycles, "Loop interrupted");
                return Ok(RunReport::interrupted(cycles));
            }
            () = tokio::time::sleep(delay) => {}
        }
    }
}
