//! Repeating an operation in the background until told to stop.

use std::future::Future;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, info, warn};

/// Handle to an operation repeating on a background task.
///
/// Dropping the handle cancels the task without waiting for it.
#[derive(Debug)]
pub struct BackgroundTask {
    description: String,
    guard: DropGuard,
    handle: JoinHandle<u64>,
}

impl BackgroundTask {
    /// Description of the repeated operation.
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Check if the task has already finished.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Stop the task and wait for it to exit.
    ///
    /// An iteration already in progress runs to completion first. Returns the
    /// number of iterations that ran.
    pub async fn stop(self) -> u64 {
        let Self {
            description,
            guard,
            handle,
        } = self;
        guard.disarm().cancel();
        match handle.await {
            Ok(iterations) => {
                info!(%description, iterations, "Background task stopped");
                iterations
            }
            Err(err) => {
                warn!(%description, error = %err, "Background task did not exit cleanly");
                0
            }
        }
    }
}

/// Run `operation` every `interval` on a background task until stopped.
///
/// The first iteration starts immediately. Must be called from within a
/// tokio runtime.
pub fn do_in_background_until_stopped<F, Fut>(
    description: impl Into<String>,
    interval: Duration,
    mut operation: F,
) -> BackgroundTask
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let description = description.into();
    let token = CancellationToken::new();
    let child = token.clone();
    let label = description.clone();

    let handle = tokio::spawn(async move {
        let mut iterations = 0u64;
        loop {
            if child.is_cancelled() {
                break;
            }
            operation().await;
            iterations += 1;
            debug!(description = %label, iterations, "Background iteration finished");

            tokio::select! {
                _ = child.cancelled() => break,
                _ = tokio::time::sleep(interval) => {}
            }
        }
        iterations
    });

    BackgroundTask {
        description,
        guard: token.drop_guard(),
        handle,
    }
}
