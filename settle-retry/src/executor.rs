//! Retry executor for running operations with retries.

use crate::config::RetryConfig;
use crate::error::{AttemptError, RetryError, RetryResult};
use crate::report::or_fail;
use crate::sleep::{Sleeper, TokioSleeper};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// State of a retry call.
#[derive(Debug, Clone, Default)]
pub struct RetryState {
    /// Number of attempts made (1-indexed).
    pub attempt: u32,
    /// Last error message.
    pub last_error: Option<String>,
    /// Total time spent waiting.
    pub total_wait_time: Duration,
    /// History of attempts.
    pub history: Vec<AttemptInfo>,
}

impl RetryState {
    /// Number of times the engine slept.
    pub fn sleeps(&self) -> usize {
        self.history.iter().filter(|a| a.wait_after.is_some()).count()
    }

    fn record(&mut self, success: bool, error: Option<String>, wait_after: Option<Duration>) {
        if let Some(wait) = wait_after {
            self.total_wait_time += wait;
        }
        if error.is_some() {
            self.last_error.clone_from(&error);
        }
        self.history.push(AttemptInfo {
            attempt: self.attempt,
            success,
            error,
            wait_after,
        });
    }
}

/// Information about a single attempt.
#[derive(Debug, Clone)]
pub struct AttemptInfo {
    /// Attempt number.
    pub attempt: u32,
    /// Whether it succeeded.
    pub success: bool,
    /// Error message if failed.
    pub error: Option<String>,
    /// Time slept after this attempt, if another attempt followed.
    pub wait_after: Option<Duration>,
}

/// Builder for retry calls.
pub struct Retry<'a> {
    config: &'a RetryConfig,
    sleeper: &'a dyn Sleeper,
}

impl std::fmt::Debug for Retry<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Retry")
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

impl<'a> Retry<'a> {
    /// Create a new retry builder sleeping on the tokio timer.
    pub fn new(config: &'a RetryConfig) -> Self {
        Self {
            config,
            sleeper: &TokioSleeper,
        }
    }

    /// Use a different sleep implementation.
    pub fn sleeper(mut self, sleeper: &'a dyn Sleeper) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Run the operation with retries.
    pub async fn run<F, Fut, T, E>(self, operation: F) -> RetryResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<AttemptError>,
    {
        self.run_with_state(operation).await.0
    }

    /// Run and get state.
    pub async fn run_with_state<F, Fut, T, E>(
        self,
        mut operation: F,
    ) -> (RetryResult<T>, RetryState)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Into<AttemptError>,
    {
        let config = self.config;
        let description = config.description.as_str();
        let max_attempts = config.max_attempts();
        let mut state = RetryState::default();

        loop {
            state.attempt += 1;
            info!(
                description,
                attempt = state.attempt,
                max_attempts,
                "{}, attempt {} of {}",
                description,
                state.attempt,
                max_attempts
            );

            let error: AttemptError = match operation().await {
                Ok(value) => {
                    debug!(description, attempt = state.attempt, "Attempt succeeded");
                    state.record(true, None, None);
                    return (Ok(value), state);
                }
                Err(error) => error.into(),
            };

            match error {
                AttemptError::Fatal(fatal) => {
                    warn!(
                        description,
                        attempt = state.attempt,
                        error = %fatal,
                        "Returning due to fatal error"
                    );
                    state.record(false, Some(fatal.to_string()), None);
                    return (Err(RetryError::Fatal(fatal.into_inner())), state);
                }
                AttemptError::Retryable(error) => {
                    if state.attempt >= max_attempts {
                        warn!(
                            description,
                            attempt = state.attempt,
                            error = %error,
                            "Retries exhausted"
                        );
                        state.record(false, Some(error.to_string()), None);
                        return (
                            Err(RetryError::MaxRetriesExceeded {
                                description: description.to_owned(),
                                retries: config.max_retries,
                                last_error: error,
                            }),
                            state,
                        );
                    }

                    let wait = config.wait.calculate(state.attempt);
                    warn!(
                        description,
                        attempt = state.attempt,
                        wait_ms = wait.as_millis() as u64,
                        error = %error,
                        "{} returned an error: {}. Sleeping for {:?} and will try again.",
                        description,
                        error,
                        wait
                    );
                    state.record(false, Some(error.to_string()), Some(wait));
                    self.sleeper.sleep(wait).await;
                }
            }
        }
    }
}

/// Execute an operation with retries.
///
/// The operation runs until it succeeds, returns a fatal error, or has failed
/// `config.max_retries + 1` times.
///
/// # Example
///
/// ```ignore
/// use settle_retry::{with_retry, RetryConfig};
/// use std::time::Duration;
///
/// let config = RetryConfig::new("SSH to public host")
///     .max_retries(30)
///     .fixed(Duration::from_secs(5));
///
/// let output = with_retry(&config, || async {
///     run_ssh_command("echo -n 'Hello, World'").await
/// }).await?;
/// ```
pub async fn with_retry<F, Fut, T, E>(config: &RetryConfig, operation: F) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<AttemptError>,
{
    Retry::new(config).run(operation).await
}

/// Execute with retries and get state information.
pub async fn with_retry_state<F, Fut, T, E>(
    config: &RetryConfig,
    operation: F,
) -> (RetryResult<T>, RetryState)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<AttemptError>,
{
    Retry::new(config).run_with_state(operation).await
}

/// Like [`with_retry`], but fails the calling test on error.
pub async fn with_retry_or_fail<F, Fut, T, E>(config: &RetryConfig, operation: F) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Into<AttemptError>,
{
    or_fail(with_retry(config, operation).await)
}
