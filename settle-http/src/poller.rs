//! Polling an endpoint until its response passes validation.
//!
//! Each function clones the template request for every attempt, runs one
//! validation call and hands the outcome to the retry engine. Validation
//! mismatches and transport failures are retried; malformed requests stop the
//! loop on the first attempt.

use crate::error::HttpError;
use crate::request::HttpRequest;
use crate::validation::{
    http_do_with_custom_validation, http_do_with_status_validation, http_do_with_validation,
};
use settle_retry::{or_fail, with_retry, AttemptError, RetryConfig, RetryResult};
use std::time::Duration;

fn poll_config(request: &HttpRequest, retries: u32, sleep_between: Duration) -> RetryConfig {
    RetryConfig::new(request.label())
        .max_retries(retries)
        .fixed(sleep_between)
}

/// Poll until the endpoint returns `expected_status`, then return the body.
pub async fn http_do_with_retry(
    request: &HttpRequest,
    expected_status: u16,
    retries: u32,
    sleep_between: Duration,
) -> RetryResult<String> {
    let config = poll_config(request, retries, sleep_between);
    with_retry(&config, || {
        let attempt = request.clone();
        async move {
            http_do_with_status_validation(attempt, expected_status)
                .await
                .map(|response| response.body)
                .map_err(AttemptError::from)
        }
    })
    .await
}

/// Poll until the endpoint returns exactly `expected_status` and `expected_body`.
pub async fn http_do_with_validation_retry(
    request: &HttpRequest,
    expected_status: u16,
    expected_body: &str,
    retries: u32,
    sleep_between: Duration,
) -> RetryResult<String> {
    let config = poll_config(request, retries, sleep_between);
    with_retry(&config, || {
        let attempt = request.clone();
        async move {
            http_do_with_validation(attempt, expected_status, expected_body)
                .await
                .map(|response| response.body)
                .map_err(AttemptError::from)
        }
    })
    .await
}

/// Poll until `validator` accepts the response, then return the body.
pub async fn http_do_with_custom_validation_retry<V>(
    request: &HttpRequest,
    validator: V,
    retries: u32,
    sleep_between: Duration,
) -> RetryResult<String>
where
    V: Fn(u16, &str) -> bool,
{
    let config = poll_config(request, retries, sleep_between);
    let validator = &validator;
    with_retry(&config, || {
        let attempt = request.clone();
        async move {
            http_do_with_custom_validation(attempt, validator)
                .await
                .map(|response| response.body)
                .map_err(AttemptError::from)
        }
    })
    .await
}

/// Like [`http_do_with_retry`], but fails the calling test on error.
pub async fn http_do_with_retry_or_fail(
    request: &HttpRequest,
    expected_status: u16,
    retries: u32,
    sleep_between: Duration,
) -> String {
    or_fail(http_do_with_retry(request, expected_status, retries, sleep_between).await)
}

/// Like [`http_do_with_validation_retry`], but fails the calling test on error.
pub async fn http_do_with_validation_retry_or_fail(
    request: &HttpRequest,
    expected_status: u16,
    expected_body: &str,
    retries: u32,
    sleep_between: Duration,
) -> String {
    let result = http_do_with_validation_retry(
        request,
        expected_status,
        expected_body,
        retries,
        sleep_between,
    )
    .await;
    or_fail(result)
}

/// Like [`http_do_with_custom_validation_retry`], but fails the calling test on error.
pub async fn http_do_with_custom_validation_retry_or_fail<V>(
    request: &HttpRequest,
    validator: V,
    retries: u32,
    sleep_between: Duration,
) -> String
where
    V: Fn(u16, &str) -> bool,
{
    or_fail(http_do_with_custom_validation_retry(request, validator, retries, sleep_between).await)
}

/// Extract the HTTP error behind a poller failure, if there is one.
pub fn http_error(err: &settle_retry::RetryError) -> Option<&HttpError> {
    err.cause().and_then(|cause| cause.downcast_ref::<HttpError>())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::testing::EchoBody;
    use rstest::rstest;
    use tokio::time::Instant;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SLEEP: Duration = Duration::from_millis(10);

    /// Server that answers 503 for the first `failures` requests, then echoes.
    async fn flaky_server(failures: u64) -> MockServer {
        let server = MockServer::start().await;
        if failures > 0 {
            Mock::given(method("POST"))
                .respond_with(ResponseTemplate::new(503))
                .up_to_n_times(failures)
                .with_priority(1)
                .mount(&server)
                .await;
        }
        Mock::given(method("POST")).respond_with(EchoBody).mount(&server).await;
        server
    }

    async fn request_count(server: &MockServer) -> usize {
        server.received_requests().await.map(|r| r.len()).unwrap_or_default()
    }

    #[tokio::test]
    async fn test_ok_with_retry() {
        let server = flaky_server(3).await;
        let request = HttpRequest::post(server.uri()).body("TEST_CONTENT");

        let body = http_do_with_retry(&request, 200, 10, SLEEP).await.unwrap();

        assert_eq!(body, "TEST_CONTENT");
        assert_eq!(request_count(&server).await, 4);
    }

    #[tokio::test]
    async fn test_error_with_retry() {
        let server = flaky_server(3).await;
        let request = HttpRequest::post(server.uri());

        let err = http_do_with_retry(&request, 200, 2, SLEEP).await.unwrap_err();

        assert!(err.is_exhausted());
        assert!(
            err.to_string().contains("unsuccessful after 2 retries"),
            "unexpected error: {err}"
        );
        assert_eq!(http_error(&err).and_then(HttpError::status), Some(503));
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_description_names_request() {
        let server = flaky_server(10).await;
        let request = HttpRequest::post(server.uri());

        let err = http_do_with_retry(&request, 200, 0, SLEEP).await.unwrap_err();

        assert!(err
            .to_string()
            .starts_with(&format!("'HTTP POST {}' unsuccessful after 0 retries", server.uri())));
    }

    #[tokio::test]
    async fn test_validation_retry_waits_for_body() {
        let server = flaky_server(2).await;
        let request = HttpRequest::post(server.uri()).body("ready");

        let body = http_do_with_validation_retry(&request, 200, "ready", 5, SLEEP)
            .await
            .unwrap();

        assert_eq!(body, "ready");
        assert_eq!(request_count(&server).await, 3);
    }

    #[tokio::test]
    async fn test_validation_retry_exhausts_on_wrong_body() {
        let server = flaky_server(0).await;
        let request = HttpRequest::post(server.uri()).body("actual");

        let err = http_do_with_validation_retry(&request, 200, "expected", 1, SLEEP)
            .await
            .unwrap_err();

        assert!(err.is_exhausted());
        assert!(matches!(
            http_error(&err),
            Some(HttpError::UnexpectedResponse { .. })
        ));
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_custom_validation_retry() {
        let server = flaky_server(1).await;
        let request = HttpRequest::post(server.uri()).body("X");

        let validator = |status: u16, body: &str| status == 200 && body == "X";
        let body = http_do_with_custom_validation_retry(&request, validator, 3, SLEEP)
            .await
            .unwrap();

        assert_eq!(body, "X");
        assert_eq!(request_count(&server).await, 2);
    }

    #[rstest]
    #[case::bad_url(HttpRequest::post("not a url"))]
    #[case::bad_scheme(HttpRequest::post("localhost:8080"))]
    #[case::bad_header(HttpRequest::post("http://127.0.0.1:1/").header("bad header", "x"))]
    #[tokio::test(start_paused = true)]
    async fn test_malformed_request_is_fatal(#[case] request: HttpRequest) {
        let start = Instant::now();

        let err = http_do_with_retry(&request, 200, 5, Duration::from_secs(60))
            .await
            .unwrap_err();

        // A second attempt would first sleep a full minute of paused time.
        assert!(start.elapsed() < Duration::from_secs(60));
        assert!(err.is_fatal());
        assert!(http_error(&err).is_some_and(HttpError::is_fatal));
    }

    #[tokio::test]
    async fn test_timeouts_are_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(15)))
            .mount(&server)
            .await;
        let request = HttpRequest::get(server.uri()).timeout(Duration::from_millis(100));

        let err = http_do_with_retry(&request, 200, 1, SLEEP).await.unwrap_err();

        assert!(err.is_exhausted());
        assert!(http_error(&err).is_some_and(HttpError::is_timeout));
        assert_eq!(request_count(&server).await, 2);
    }

    #[tokio::test]
    async fn test_or_fail_returns_body() {
        let server = flaky_server(1).await;
        let request = HttpRequest::post(server.uri()).body("TEST_CONTENT");

        assert_eq!(http_do_with_retry_or_fail(&request, 200, 3, SLEEP).await, "TEST_CONTENT");
        assert_eq!(
            http_do_with_validation_retry_or_fail(&request, 200, "TEST_CONTENT", 3, SLEEP).await,
            "TEST_CONTENT"
        );
        let validator = |status: u16, _: &str| status == 200;
        let body =
            http_do_with_custom_validation_retry_or_fail(&request, validator, 3, SLEEP).await;
        assert_eq!(body, "TEST_CONTENT");
    }

    #[tokio::test]
    #[should_panic(expected = "unsuccessful after 1 retries")]
    async fn test_or_fail_panics_when_exhausted() {
        let server = flaky_server(5).await;
        http_do_with_retry_or_fail(&HttpRequest::post(server.uri()), 200, 1, SLEEP).await;
    }
}
