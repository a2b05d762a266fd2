//! Time-bounded execution of a single operation.

use crate::error::{RetryError, RetryResult};
use crate::report::or_fail;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Run an operation once, giving up after `timeout`.
///
/// Errors from the operation are returned as [`RetryError::Operation`]. If
/// the deadline passes first the operation is dropped and
/// [`RetryError::TimeoutExceeded`] is returned.
pub async fn with_timeout<Fut, T, E>(
    description: &str,
    timeout: Duration,
    operation: Fut,
) -> RetryResult<T>
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    info!(description, timeout_ms = timeout.as_millis() as u64, "Running with timeout");

    match tokio::time::timeout(timeout, operation).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(RetryError::Operation(err.into())),
        Err(_) => {
            warn!(description, timeout_ms = timeout.as_millis() as u64, "Timed out");
            Err(RetryError::TimeoutExceeded {
                description: description.to_owned(),
                timeout,
            })
        }
    }
}

/// Like [`with_timeout`], but fails the calling test on error.
pub async fn with_timeout_or_fail<Fut, T, E>(
    description: &str,
    timeout: Duration,
    operation: Fut,
) -> T
where
    Fut: Future<Output = Result<T, E>>,
    E: Into<anyhow::Error>,
{
    or_fail(with_timeout(description, timeout, operation).await)
}
