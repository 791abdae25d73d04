//! Shutdown signalling
//!
//! SIGINT and SIGTERM are turned into a watch-channel flag that the loop
//! driver races against every request and every sleep.

use tokio::signal;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Owns the sending side of the shutdown flag
#[derive(Debug)]
pub struct ShutdownCoordinator {
    shutdown_tx: watch::Sender<bool>,
}

impl ShutdownCoordinator {
    /// Creates a coordinator with the flag cleared
    #[must_use]
    pub fn new() -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self { shutdown_tx }
    }

    /// Gets a shutdown receiver
    #[must_use]
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            receiver: self.shutdown_tx.subscribe(),
        }
    }

    /// Sets the flag; every receiver observes it
    pub fn trigger(&self) {
        self.shutdown_tx.send_replace(true);
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Shutdown signal receiver
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    /// Waits until shutdown is triggered
    ///
    /// Never resolves if the coordinator is dropped without triggering.
    pub async fn recv(&mut self) {
        if self.receiver.wait_for(|triggered| *triggered).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Checks if shutdown has been signaled (non-blocking)
    #[must_use]
    pub fn is_shutdown(&self) -> bool {
        *self.receiver.borrow()
    }
}

/// Waits for SIGTERM or SIGINT and returns its name
///
/// # Errors
///
/// Returns an error if a signal handler cannot be installed.
#[cfg(unix)]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    let mut terminate = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    tokio::select! {
        result = signal::ctrl_c() => result.map(|()| "SIGINT"),
        _ = terminate.recv() => Ok("SIGTERM"),
    }
}

/// Waits for Ctrl+C and returns its name
///
/// # Errors
///
/// Returns an error if the handler cannot be installed.
#[cfg(not(unix))]
pub async fn wait_for_signal() -> std::io::Result<&'static str> {
    signal::ctrl_c().await.map(|()| "SIGINT")
}

/// Spawns a task that triggers `coordinator` on the first termination signal
pub fn spawn_signal_listener(coordinator: ShutdownCoordinator) -> JoinHandle<()> {
    tokio::spawn(async move {
        match wait_for_signal().await {
            Ok(name) => {
                info!("Received {name}, exiting...");
                coordinator.trigger();
            }
            Err(e) => warn!(error = %e, "Failed to install signal handlers"),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_trigger_wakes_receivers() {
        let coordinator = ShutdownCoordinator::new();
        let mut first = coordinator.subscribe();
        let mut second = first.clone();
        assert!(!first.is_shutdown());

        coordinator.trigger();
        tokio::time::timeout(Duration::from_secs(1), first.recv())
            .await
            .unwrap();
        tokio::time::timeout(Duration::from_secs(1), second.recv())
            .await
            .unwrap();
        assert!(first.is_shutdown());
    }

    #[tokio::test]
    async fn test_late_subscriber_sees_trigger() {
        let coordinator = ShutdownCoordinator::new();
        coordinator.trigger();
        let mut signal = coordinator.subscribe();
        tokio::time::timeout(Duration::from_secs(1), signal.recv())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_coordinator_never_signals() {
        let coordinator = ShutdownCoordinator::new();
        let mut signal = coordinator.subscribe();
        drop(coordinator);

        let result = tokio::time::timeout(Duration::from_millis(50), signal.recv()).await;
        assert!(result.is_err());
    }
}
