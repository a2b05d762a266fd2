//! Retry policies for deciding which errors are worth retrying.

use crate::config::RetryConfig;
use crate::error::{AttemptError, RetryResult};
use crate::executor::with_retry;
use crate::report::or_fail;
use regex::Regex;
use std::future::Future;
use tracing::debug;

/// Decides whether an opaque error is retryable.
pub trait ErrorClassifier: Send + Sync {
    /// Check if the error should be retried.
    fn is_retryable(&self, error: &anyhow::Error) -> bool;

    /// Classify the error as retryable or fatal.
    ///
    /// Errors that already carry the fatal marker stay fatal.
    fn classify(&self, error: anyhow::Error) -> AttemptError {
        match AttemptError::from(error) {
            AttemptError::Retryable(error) if !self.is_retryable(&error) => {
                AttemptError::fatal(error)
            }
            other => other,
        }
    }
}

impl<F> ErrorClassifier for F
where
    F: Fn(&anyhow::Error) -> bool + Send + Sync,
{
    fn is_retryable(&self, error: &anyhow::Error) -> bool {
        self(error)
    }
}

/// Table of known-transient error messages.
///
/// Each entry maps a pattern to a description of why the error is transient.
/// An error is retryable when its full message, including the context chain,
/// matches at least one pattern.
#[derive(Debug, Clone, Default)]
pub struct RetryableErrors {
    patterns: Vec<(Regex, String)>,
}

impl RetryableErrors {
    /// Create an empty table, which treats every error as fatal.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a pattern.
    pub fn add(
        mut self,
        pattern: &str,
        description: impl Into<String>,
    ) -> Result<Self, regex::Error> {
        self.patterns.push((Regex::new(pattern)?, description.into()));
        Ok(self)
    }

    /// Build a table from `(pattern, description)` pairs.
    pub fn from_pairs<'a, I, D>(pairs: I) -> Result<Self, regex::Error>
    where
        I: IntoIterator<Item = (&'a str, D)>,
        D: Into<String>,
    {
        pairs
            .into_iter()
            .try_fold(Self::new(), |table, (pattern, description)| table.add(pattern, description))
    }

    /// Number of patterns.
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Check if the table is empty.
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Find the description of the first pattern that matches the error.
    pub fn matching(&self, error: &anyhow::Error) -> Option<&str> {
        let message = format!("{error:#}");
        self.patterns
            .iter()
            .find(|(pattern, _)| pattern.is_match(&message))
            .map(|(_, description)| description.as_str())
    }
}

impl ErrorClassifier for RetryableErrors {
    fn is_retryable(&self, error: &anyhow::Error) -> bool {
        match self.matching(error) {
            Some(reason) => {
                debug!(error = %error, reason, "Error matched a retryable pattern");
                true
            }
            None => false,
        }
    }
}

/// Execute with retries, retrying only errors the classifier accepts.
pub async fn with_classifier<C, F, Fut, T>(
    config: &RetryConfig,
    classifier: &C,
    mut operation: F,
) -> RetryResult<T>
where
    C: ErrorClassifier + ?Sized,
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    with_retry(config, || {
        let attempt = operation();
        async move { attempt.await.map_err(|error| classifier.classify(error)) }
    })
    .await
}

/// Execute with retries, retrying only errors that match the table.
///
/// Any error that matches no pattern stops the loop immediately.
pub async fn with_retryable_errors<F, Fut, T>(
    config: &RetryConfig,
    retryable: &RetryableErrors,
    operation: F,
) -> RetryResult<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    with_classifier(config, retryable, operation).await
}

/// Like [`with_retryable_errors`], but fails the calling test on error.
pub async fn with_retryable_errors_or_fail<F, Fut, T>(
    config: &RetryConfig,
    retryable: &RetryableErrors,
    operation: F,
) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    or_fail(with_retryable_errors(config, retryable, operation).await)
}
