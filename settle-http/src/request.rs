//! HTTP request descriptor.

use bytes::Bytes;
use indexmap::IndexMap;
use reqwest::{ClientBuilder, Method, RequestBuilder};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for a single request.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Hook applied to the client builder before the client is built.
pub type ClientHook = Arc<dyn Fn(ClientBuilder) -> ClientBuilder + Send + Sync>;

/// Hook applied to the request builder just before the request is sent.
pub type RequestHook = Arc<dyn Fn(RequestBuilder) -> RequestBuilder + Send + Sync>;

/// Optional customization of the transport and the outgoing request.
///
/// The default applies no changes.
#[derive(Clone, Default)]
pub struct RequestCustomizer {
    /// Applied to the [`ClientBuilder`], e.g. to change TLS settings.
    pub client: Option<ClientHook>,
    /// Applied to the [`RequestBuilder`].
    pub request: Option<RequestHook>,
}

impl RequestCustomizer {
    pub(crate) fn customize_client(&self, builder: ClientBuilder) -> ClientBuilder {
        match &self.client {
            Some(hook) => hook(builder),
            None => builder,
        }
    }

    pub(crate) fn customize_request(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.request {
            Some(hook) => hook(builder),
            None => builder,
        }
    }
}

impl fmt::Debug for RequestCustomizer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestCustomizer")
            .field("client", &self.client.is_some())
            .field("request", &self.request.is_some())
            .finish()
    }
}

/// Description of one HTTP request.
///
/// The body is held as [`Bytes`], so cloning a request to send it again shares
/// the buffer instead of copying it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Request method.
    pub method: Method,
    /// Target URL.
    pub url: String,
    /// Request body.
    pub body: Option<Bytes>,
    /// Request headers.
    pub headers: IndexMap<String, String>,
    /// Timeout for the full round trip, including reading the body.
    pub timeout: Duration,
    /// Transport and request hooks.
    pub customize: RequestCustomizer,
}

impl HttpRequest {
    /// Create a request with no body, no headers and the default timeout.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: None,
            headers: IndexMap::new(),
            timeout: DEFAULT_TIMEOUT,
            customize: RequestCustomizer::default(),
        }
    }

    /// Create a GET request.
    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    /// Create a POST request.
    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    /// Create a PUT request.
    pub fn put(url: impl Into<String>) -> Self {
        Self::new(Method::PUT, url)
    }

    /// Create a DELETE request.
    pub fn delete(url: impl Into<String>) -> Self {
        Self::new(Method::DELETE, url)
    }

    /// Set the body.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Add a header, replacing any earlier value for the same name.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Add several headers.
    pub fn headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.headers
            .extend(headers.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Set the timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Customize the client builder, e.g. to supply TLS settings.
    pub fn client_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(ClientBuilder) -> ClientBuilder + Send + Sync + 'static,
    {
        self.customize.client = Some(Arc::new(hook));
        self
    }

    /// Customize the request builder before sending.
    pub fn request_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(RequestBuilder) -> RequestBuilder + Send + Sync + 'static,
    {
        self.customize.request = Some(Arc::new(hook));
        self
    }

    /// Skip TLS certificate verification.
    ///
    /// Replaces any client hook set earlier.
    pub fn accept_invalid_certs(self) -> Self {
        self.client_hook(|builder| builder.danger_accept_invalid_certs(true))
    }

    /// Short label used in logs and retry descriptions.
    pub fn label(&self) -> String {
        format!("HTTP {} {}", self.method, self.url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let request = HttpRequest::get("http://localhost:8080");
        assert_eq!(request.method, Method::GET);
        assert!(request.body.is_none());
        assert!(request.headers.is_empty());
        assert_eq!(request.timeout, DEFAULT_TIMEOUT);
        assert!(request.customize.client.is_none());
        assert!(request.customize.request.is_none());
    }

    #[test]
    fn test_builder() {
        let request = HttpRequest::post("http://localhost/items")
            .body("payload")
            .header("Authorization", "Bearer 1a2b3c99ff")
            .headers([("X-One", "1"), ("X-Two", "2")])
            .header("X-One", "one")
            .timeout(Duration::from_secs(2))
            .accept_invalid_certs();

        assert_eq!(request.body.as_deref(), Some(&b"payload"[..]));
        assert_eq!(request.headers.len(), 3);
        assert_eq!(request.headers["X-One"], "one");
        assert_eq!(request.timeout, Duration::from_secs(2));
        assert!(request.customize.client.is_some());
    }

    #[test]
    fn test_clone_shares_body() {
        let request = HttpRequest::put("http://localhost").body(vec![1u8, 2, 3]);
        let copy = request.clone();
        assert_eq!(request.body, copy.body);
    }

    #[test]
    fn test_label() {
        assert_eq!(
            HttpRequest::delete("http://localhost/x").label(),
            "HTTP DELETE http://localhost/x"
        );
    }
}
