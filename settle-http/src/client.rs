//! Executing a single HTTP request.

use crate::error::{HttpError, HttpResult};
use crate::request::HttpRequest;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, RequestBuilder};
use settle_retry::or_fail;
use tracing::debug;
use url::Url;

/// Status code and body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl HttpResponse {
    /// Check if the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

fn parse_url(url: &str) -> HttpResult<Url> {
    let invalid = |reason: String| HttpError::InvalidUrl {
        url: url.to_owned(),
        reason,
    };
    let parsed = Url::parse(url).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        other => Err(invalid(format!("unsupported scheme {other:?}"))),
    }
}

fn header_map(request: &HttpRequest) -> HttpResult<HeaderMap> {
    let mut headers = HeaderMap::with_capacity(request.headers.len());
    for (name, value) in &request.headers {
        let invalid = |reason: String| HttpError::InvalidHeader {
            name: name.clone(),
            reason,
        };
        let header_name =
            HeaderName::from_bytes(name.as_bytes()).map_err(|e| invalid(e.to_string()))?;
        let header_value = HeaderValue::from_str(value).map_err(|e| invalid(e.to_string()))?;
        headers.insert(header_name, header_value);
    }
    Ok(headers)
}

enum RoundTripError {
    Send(reqwest::Error),
    Read(reqwest::Error),
}

/// Send the request and read the full body; the response is dropped on return.
async fn round_trip(builder: RequestBuilder) -> Result<(u16, String), RoundTripError> {
    let response = builder.send().await.map_err(RoundTripError::Send)?;
    let status = response.status().as_u16();
    let bytes = response.bytes().await.map_err(RoundTripError::Read)?;
    Ok((status, String::from_utf8_lossy(&bytes).into_owned()))
}

/// Perform one HTTP request and return its status code and body.
///
/// Non-2xx responses are not errors here; only transport failures are. The
/// round trip, including reading the full body, is bounded by
/// `request.timeout`, and expiry yields [`HttpError::Timeout`].
pub async fn http_do(request: HttpRequest) -> HttpResult<HttpResponse> {
    let target = parse_url(&request.url)?;
    let headers = header_map(&request)?;

    let HttpRequest {
        method,
        url,
        body,
        timeout,
        customize,
        ..
    } = request;

    let client = customize
        .customize_client(Client::builder().timeout(timeout))
        .build()
        .map_err(HttpError::Client)?;

    let mut builder = client.request(method.clone(), target).headers(headers);
    if let Some(body) = body {
        builder = builder.body(body);
    }
    let builder = customize.customize_request(builder);

    let timeout_ms = timeout.as_millis() as u64;
    debug!(method = %method, url = %url, timeout_ms, "Making HTTP request");

    let outcome = match tokio::time::timeout(timeout, round_trip(builder)).await {
        Ok(outcome) => outcome,
        Err(_) => {
            return Err(HttpError::Timeout {
                method,
                url,
                timeout,
            })
        }
    };

    match outcome {
        Ok((status, body)) => {
            debug!(method = %method, url = %url, status, "Received HTTP response");
            Ok(HttpResponse { status, body })
        }
        Err(RoundTripError::Send(err)) => Err(HttpError::from_transport(method, url, timeout, err)),
        Err(RoundTripError::Read(err)) if err.is_timeout() => Err(HttpError::Timeout {
            method,
            url,
            timeout,
        }),
        Err(RoundTripError::Read(source)) => Err(HttpError::Body { method, url, source }),
    }
}

/// Like [`http_do`], but fails the calling test on error.
pub async fn http_do_or_fail(request: HttpRequest) -> HttpResponse {
    or_fail(http_do(request).await)
}
