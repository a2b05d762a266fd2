//! HTTP error types.

use reqwest::Method;
use settle_retry::AttemptError;
use std::time::Duration;
use thiserror::Error;

/// Marker present in the message of every request timeout.
pub const TIMEOUT_MARKER: &str = "request canceled";

/// Errors from executing or validating an HTTP request.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The URL could not be parsed.
    #[error("invalid URL {url:?}: {reason}")]
    InvalidUrl {
        /// The URL as given.
        url: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A header name or value is malformed.
    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader {
        /// Header name as given.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// The HTTP client could not be built, e.g. due to TLS configuration.
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    /// The request did not complete within its timeout.
    #[error("{method} {url}: request canceled after {timeout:?} (timeout exceeded)")]
    Timeout {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Configured timeout.
        timeout: Duration,
    },

    /// The request could not be built from its parts.
    #[error("{method} {url}: invalid request: {source}")]
    InvalidRequest {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Builder failure.
        source: reqwest::Error,
    },

    /// The connection could not be established.
    #[error("{method} {url}: connection failed: {source}")]
    Connect {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Transport failure.
        source: reqwest::Error,
    },

    /// Any other failure while sending the request.
    #[error("{method} {url}: {source}")]
    Transport {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Transport failure.
        source: reqwest::Error,
    },

    /// The response body could not be read.
    #[error("{method} {url}: failed to read response body: {source}")]
    Body {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Read failure.
        source: reqwest::Error,
    },

    /// Status or body did not match what was expected.
    #[error(
        "validation failed for {method} {url}: expected status code {expected_status} \
         and body {expected_body:?}, got status code {status} and body {body:?}"
    )]
    UnexpectedResponse {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Expected status code.
        expected_status: u16,
        /// Expected body.
        expected_body: String,
        /// Actual status code.
        status: u16,
        /// Actual body.
        body: String,
    },

    /// Only the status code was checked and it did not match.
    #[error(
        "validation failed for {method} {url}: expected status code {expected_status}, \
         got {status} and body {body:?}"
    )]
    UnexpectedStatus {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Expected status code.
        expected_status: u16,
        /// Actual status code.
        status: u16,
        /// Actual body.
        body: String,
    },

    /// A custom validator rejected the response.
    #[error(
        "validation failed for {method} {url}: custom validator rejected status code {status} \
         and body {body:?}"
    )]
    ValidationFailed {
        /// Request method.
        method: Method,
        /// Request URL.
        url: String,
        /// Actual status code.
        status: u16,
        /// Actual body.
        body: String,
    },
}

impl HttpError {
    /// Check if this error is a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Check if the request itself is malformed, so retrying cannot help.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::InvalidUrl { .. }
                | Self::InvalidHeader { .. }
                | Self::InvalidRequest { .. }
                | Self::Client(_)
        )
    }

    /// Check if a later attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
    }

    /// Check if this is a validation mismatch rather than a transport failure.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedResponse { .. }
                | Self::UnexpectedStatus { .. }
                | Self::ValidationFailed { .. }
        )
    }

    /// The response status code, for validation failures.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::UnexpectedResponse { status, .. }
            | Self::UnexpectedStatus { status, .. }
            | Self::ValidationFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn from_transport(
        method: Method,
        url: String,
        timeout: Duration,
        err: reqwest::Error,
    ) -> Self {
        if err.is_timeout() {
            HttpError::Timeout {
                method,
                url,
                timeout,
            }
        } else if err.is_connect() {
            HttpError::Connect {
                method,
                url,
                source: err,
            }
        } else if err.is_builder() {
            HttpError::InvalidRequest {
                method,
                url,
                source: err,
            }
        } else {
            HttpError::Transport {
                method,
                url,
                source: err,
            }
        }
    }
}

impl From<HttpError> for AttemptError {
    fn from(err: HttpError) -> Self {
        if err.is_fatal() {
            AttemptError::fatal(err)
        } else {
            AttemptError::retryable(err)
        }
    }
}

/// Result type for HTTP operations.
pub type HttpResult<T> = Result<T, HttpError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn mismatch() -> HttpError {
        HttpError::UnexpectedResponse {
            method: Method::POST,
            url: "http://localhost/".into(),
            expected_status: 200,
            expected_body: "Wrong".into(),
            status: 200,
            body: "Hello, Terratest!".into(),
        }
    }

    #[test]
    fn test_timeout_carries_marker() {
        let err = HttpError::Timeout {
            method: Method::DELETE,
            url: "http://localhost/".into(),
            timeout: Duration::from_secs(10),
        };
        assert!(err.is_timeout());
        assert!(err.is_retryable());
        assert!(err.to_string().contains(TIMEOUT_MARKER));
    }

    #[test]
    fn test_mismatch_is_retryable() {
        let err = mismatch();
        assert!(err.is_validation());
        assert!(err.is_retryable());
        assert_eq!(err.status(), Some(200));
        assert!(AttemptError::from(err).is_retryable());
    }

    #[test]
    fn test_mismatch_message_names_both_sides() {
        let message = mismatch().to_string();
        assert!(message.contains("expected status code 200 and body \"Wrong\""));
        assert!(message.contains("got status code 200 and body \"Hello, Terratest!\""));
    }

    #[test]
    fn test_invalid_url_is_fatal() {
        let err = HttpError::InvalidUrl {
            url: "not a url".into(),
            reason: url::Url::parse("not a url").unwrap_err().to_string(),
        };
        assert!(err.is_fatal());
        assert!(!err.is_timeout());
        assert!(AttemptError::from(err).is_fatal());
    }
}
