//! # settle
//!
//! Wait for infrastructure to settle before asserting on it.
//!
//! Infrastructure operations do not complete synchronously: DNS takes time
//! to propagate, instances take time to boot, load balancers take time to
//! mark targets healthy. `settle` gives tests a bounded retry loop that tells
//! "try again" failures apart from "stop now" failures, plus HTTP helpers
//! built on it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use settle::prelude::*;
//! use std::time::Duration;
//!
//! #[tokio::test]
//! async fn load_balancer_serves_traffic() {
//!     let request = HttpRequest::get(format!("http://{}", lb_dns_name()));
//!     let body = http_do_with_retry_or_fail(&request, 200, 30, Duration::from_secs(10)).await;
//!     assert!(body.contains("Hello, World"));
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description | Default |
//! |---------|-------------|--------|
//! | `http` | HTTP execution, validation and polling | ✅ |
//!
//! ## Architecture
//!
//! - [`settle_retry`] - Retry engine, fatal errors, wait strategies
//! - [`settle_http`] - HTTP execution, validation and polling (optional)

#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![deny(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

/// Retry engine.
pub use settle_retry as retry;

/// HTTP helpers.
#[cfg(feature = "http")]
#[cfg_attr(docsrs, doc(cfg(feature = "http")))]
pub use settle_http as http;

pub use settle_retry::{
    do_in_background_until_stopped, fail_now, with_retry, with_retry_or_fail, with_retryable_errors,
    with_timeout, AttemptError, FatalError, Retry, RetryConfig, RetryError, RetryResult,
    RetryableErrors, WaitStrategy,
};

#[cfg(feature = "http")]
pub use settle_http::{
    continuously_check_url, http_do, http_do_with_custom_validation,
    http_do_with_custom_validation_retry, http_do_with_retry, http_do_with_validation,
    http_do_with_validation_retry, HttpError, HttpRequest, HttpResponse,
};

/// Prelude for common imports.
pub mod prelude {
    pub use settle_retry::prelude::*;

    #[cfg(feature = "http")]
    pub use settle_http::prelude::*;

    #[cfg(feature = "http")]
    pub use settle_http::{
        http_do_or_fail, http_do_with_custom_validation_retry_or_fail, http_do_with_retry_or_fail,
        http_do_with_validation_retry_or_fail,
    };
}

#[cfg(all(test, feature = "http"))]
mod tests {
    use super::prelude::*;
    use std::time::Duration;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_retry_wraps_http_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("instance-1"))
            .mount(&server)
            .await;

        let config = RetryConfig::new("wait for instance id")
            .max_retries(5)
            .fixed(Duration::from_millis(10));
        let uri = server.uri();

        let id = with_retry(&config, || {
            let request = HttpRequest::get(uri.clone());
            async move {
                let response = http_do(request).await?;
                if response.status != 200 {
                    return Err(AttemptError::retryable(anyhow::anyhow!(
                        "status {}",
                        response.status
                    )));
                }
                Ok::<_, AttemptError>(response.body)
            }
        })
        .await
        .unwrap();

        assert_eq!(id, "instance-1");
    }

    #[tokio::test]
    async fn test_fatal_from_caller_stops_poll() {
        let mut calls = 0;
        let config = RetryConfig::new("terraform output").max_retries(10);

        let err = with_retry(&config, || {
            calls += 1;
            async { Err::<(), _>(FatalError::msg("output \"public_ip\" not found")) }
        })
        .await
        .unwrap_err();

        assert!(err.is_fatal());
        assert_eq!(calls, 1);
    }
}
