//! # settle-http
//!
//! HTTP checks for tests that wait on eventually-consistent endpoints.
//!
//! ## Layers
//!
//! - **[`http_do`]**: One request with a timeout, returning status and body
//! - **[`http_do_with_validation`]**: Require an exact status and body
//! - **[`http_do_with_custom_validation`]**: Let a predicate decide
//! - **[`http_do_with_retry`]**: Poll with the retry engine until validation passes
//! - **[`continuously_check_url`]**: Keep checking in the background
//!
//! Non-2xx responses are never transport errors; a validation layer decides
//! whether they count as success. Timeouts carry [`TIMEOUT_MARKER`] in their
//! message and answer [`HttpError::is_timeout`].
//!
//! ## Example
//!
//! ```ignore
//! use settle_http::{http_do_with_retry, HttpRequest};
//! use std::time::Duration;
//!
//! let request = HttpRequest::get(format!("http://{}:8080", instance_ip));
//! let body = http_do_with_retry(&request, 200, 30, Duration::from_secs(5)).await?;
//! assert_eq!(body, "Hello, World!");
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
pub mod monitor;
pub mod poller;
pub mod request;
pub mod validation;

// Re-exports
pub use client::{http_do, http_do_or_fail, HttpResponse};
pub use error::{HttpError, HttpResult, TIMEOUT_MARKER};
pub use monitor::{continuously_check_url, UrlMonitor};
pub use poller::{
    http_do_with_custom_validation_retry, http_do_with_custom_validation_retry_or_fail,
    http_do_with_retry, http_do_with_retry_or_fail, http_do_with_validation_retry,
    http_do_with_validation_retry_or_fail, http_error,
};
pub use request::{ClientHook, HttpRequest, RequestCustomizer, RequestHook, DEFAULT_TIMEOUT};
pub use validation::{
    http_do_with_custom_validation, http_do_with_custom_validation_or_fail,
    http_do_with_status_validation, http_do_with_validation, http_do_with_validation_or_fail,
};

/// Re-exported so callers can name methods without a direct reqwest dependency.
pub use reqwest::Method;

/// Prelude for common imports.
pub mod prelude {
    pub use crate::{
        http_do, http_do_with_custom_validation, http_do_with_retry, http_do_with_validation,
        HttpError, HttpRequest, HttpResponse, Method,
    };
}
