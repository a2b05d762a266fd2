//! Validating a response against an expected status and body.

use crate::client::{http_do, HttpResponse};
use crate::error::{HttpError, HttpResult};
use crate::request::HttpRequest;
use settle_retry::or_fail;
use tracing::debug;

/// Perform a request and require an exact status code and body.
///
/// A mismatch is returned as [`HttpError::UnexpectedResponse`], which is
/// retryable. Transport errors pass through unchanged.
pub async fn http_do_with_validation(
    request: HttpRequest,
    expected_status: u16,
    expected_body: &str,
) -> HttpResult<HttpResponse> {
    let method = request.method.clone();
    let url = request.url.clone();
    let response = http_do(request).await?;

    if response.status == expected_status && response.body == expected_body {
        return Ok(response);
    }

    debug!(
        method = %method,
        url = %url,
        expected_status,
        status = response.status,
        "Response did not match expectation"
    );
    Err(HttpError::UnexpectedResponse {
        method,
        url,
        expected_status,
        expected_body: expected_body.to_owned(),
        status: response.status,
        body: response.body,
    })
}

/// Perform a request and require only an exact status code.
pub async fn http_do_with_status_validation(
    request: HttpRequest,
    expected_status: u16,
) -> HttpResult<HttpResponse> {
    let method = request.method.clone();
    let url = request.url.clone();
    let response = http_do(request).await?;

    if response.status == expected_status {
        return Ok(response);
    }

    Err(HttpError::UnexpectedStatus {
        method,
        url,
        expected_status,
        status: response.status,
        body: response.body,
    })
}

/// Perform a request and let `validator` decide whether the response passes.
///
/// The validator receives the status code and the body.
pub async fn http_do_with_custom_validation<V>(
    request: HttpRequest,
    validator: V,
) -> HttpResult<HttpResponse>
where
    V: Fn(u16, &str) -> bool,
{
    let method = request.method.clone();
    let url = request.url.clone();
    let response = http_do(request).await?;

    if validator(response.status, &response.body) {
        return Ok(response);
    }

    Err(HttpError::ValidationFailed {
        method,
        url,
        status: response.status,
        body: response.body,
    })
}

/// Like [`http_do_with_validation`], but fails the calling test on error.
pub async fn http_do_with_validation_or_fail(
    request: HttpRequest,
    expected_status: u16,
    expected_body: &str,
) -> HttpResponse {
    or_fail(http_do_with_validation(request, expected_status, expected_body).await)
}

/// Like [`http_do_with_custom_validation`], but fails the calling test on error.
pub async fn http_do_with_custom_validation_or_fail<V>(
    request: HttpRequest,
    validator: V,
) -> HttpResponse
where
    V: Fn(u16, &str) -> bool,
{
    or_fail(http_do_with_custom_validation(request, validator).await)
}
