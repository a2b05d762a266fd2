//! # settle-retry
//!
//! Retry engine for tests that validate eventually-consistent infrastructure.
//!
//! DNS propagation, instance boot and load-balancer health do not complete
//! synchronously. This crate polls an operation until it succeeds, returns a
//! fatal error, or runs out of attempts.
//!
//! ## Core Concepts
//!
//! - **[`RetryConfig`]**: Description, retry budget and wait strategy
//! - **[`AttemptError`]**: Outcome of one failed attempt, retryable or fatal
//! - **[`FatalError`]**: Marks an error as never worth retrying
//! - **[`with_retry`]**: Execute operations with automatic retries
//! - **[`RetryableErrors`]**: Retry only errors matching known patterns
//!
//! ## Error-returning and fail-fast variants
//!
//! Every function that returns a `Result` has an `*_or_fail` sibling that
//! panics with the error message instead, failing the calling test.
//!
//! ## Example
//!
//! ```ignore
//! use settle_retry::{with_retry, AttemptError, RetryConfig};
//! use std::time::Duration;
//!
//! let config = RetryConfig::new("Wait for instance to boot")
//!     .max_retries(30)
//!     .fixed(Duration::from_secs(5));
//!
//! let ip = with_retry(&config, || async {
//!     match lookup_instance_ip().await {
//!         Ok(Some(ip)) => Ok(ip),
//!         Ok(None) => Err(AttemptError::retryable(anyhow::anyhow!("no IP yet"))),
//!         Err(e) => Err(AttemptError::fatal(e)),
//!     }
//! }).await?;
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod background;
pub mod config;
pub mod error;
pub mod executor;
pub mod policy;
pub mod report;
pub mod sleep;
pub mod timeout;

// Re-exports
pub use background::{do_in_background_until_stopped, BackgroundTask};
pub use config::{RetryConfig, WaitStrategy};
pub use error::{AttemptError, FatalError, RetryError, RetryResult};
pub use executor::{
    with_retry, with_retry_or_fail, with_retry_state, AttemptInfo, Retry, RetryState,
};
pub use policy::{
    with_classifier, with_retryable_errors, with_retryable_errors_or_fail, ErrorClassifier,
    RetryableErrors,
};
pub use report::{fail_now, or_fail};
pub use sleep::{Sleeper, TokioSleeper};
pub use timeout::{with_timeout, with_timeout_or_fail};

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        with_retry, with_retry_or_fail, AttemptError, FatalError, Retry, RetryConfig, RetryError,
        RetryResult, WaitStrategy,
    };
}
