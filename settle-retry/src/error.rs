//! Retry error types and the fatal error marker.

use std::time::Duration;
use thiserror::Error;

/// An error that must never be retried.
///
/// Returning a `FatalError` from an operation stops the retry loop at once;
/// no further attempts are made and no sleep follows.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct FatalError(anyhow::Error);

impl FatalError {
    /// Mark an error as fatal.
    pub fn new(err: impl Into<anyhow::Error>) -> Self {
        Self(err.into())
    }

    /// Create a fatal error from a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::Error::msg(message.into()))
    }

    /// Check whether an opaque error carries the fatal marker.
    pub fn is_fatal(err: &anyhow::Error) -> bool {
        err.downcast_ref::<FatalError>().is_some()
    }

    /// Get a reference to the underlying error.
    pub fn inner(&self) -> &anyhow::Error {
        &self.0
    }

    /// Unwrap into the underlying error.
    pub fn into_inner(self) -> anyhow::Error {
        self.0
    }
}

/// Outcome of a single failed attempt.
#[derive(Debug)]
pub enum AttemptError {
    /// A later attempt may succeed.
    Retryable(anyhow::Error),
    /// Stop immediately.
    Fatal(FatalError),
}

impl AttemptError {
    /// Create a retryable attempt error.
    pub fn retryable(err: impl Into<anyhow::Error>) -> Self {
        Self::Retryable(err.into())
    }

    /// Create a fatal attempt error.
    pub fn fatal(err: impl Into<anyhow::Error>) -> Self {
        Self::Fatal(FatalError::new(err))
    }

    /// Check if this error is fatal.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Check if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
    }

    /// Unwrap into the underlying error, dropping the classification.
    pub fn into_inner(self) -> anyhow::Error {
        match self {
            Self::Retryable(err) => err,
            Self::Fatal(fatal) => fatal.into_inner(),
        }
    }
}

impl std::fmt::Display for AttemptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Retryable(err) => write!(f, "{err}"),
            Self::Fatal(fatal) => write!(f, "{fatal}"),
        }
    }
}

impl From<FatalError> for AttemptError {
    fn from(fatal: FatalError) -> Self {
        Self::Fatal(fatal)
    }
}

impl From<anyhow::Error> for AttemptError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<FatalError>() {
            Ok(fatal) => Self::Fatal(fatal),
            Err(err) => Self::Retryable(err),
        }
    }
}

/// Errors surfaced by the retry engine.
#[derive(Debug, Error)]
pub enum RetryError {
    /// The operation returned a fatal error; this is the unwrapped cause.
    #[error(transparent)]
    Fatal(anyhow::Error),

    /// Every attempt failed with a retryable error.
    #[error("'{description}' unsuccessful after {retries} retries: {last_error}")]
    MaxRetriesExceeded {
        /// Description of the operation.
        description: String,
        /// Number of retries made after the first attempt.
        retries: u32,
        /// Error from the final attempt.
        last_error: anyhow::Error,
    },

    /// The operation did not finish within its time bound.
    #[error("'{description}' did not complete before timeout of {timeout:?}")]
    TimeoutExceeded {
        /// Description of the operation.
        description: String,
        /// The time bound.
        timeout: Duration,
    },

    /// A non-retried operation failed.
    #[error(transparent)]
    Operation(anyhow::Error),
}

impl RetryError {
    /// Check if the loop stopped on a fatal error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_))
    }

    /// Check if the loop ran out of retries.
    pub fn is_exhausted(&self) -> bool {
        matches!(self, Self::MaxRetriesExceeded { .. })
    }

    /// Check if the operation hit its time bound.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimeoutExceeded { .. })
    }

    /// The underlying error, if there is one.
    pub fn cause(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Fatal(err) | Self::Operation(err) => Some(err),
            Self::MaxRetriesExceeded { last_error, .. } => Some(last_error),
            Self::TimeoutExceeded { .. } => None,
        }
    }
}

/// Result type for retry operations.
pub type RetryResult<T> = Result<T, RetryError>;
