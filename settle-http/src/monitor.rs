//! Checking a URL continuously in the background.

use crate::client::{http_do, HttpResponse};
use crate::error::HttpResult;
use crate::request::HttpRequest;
use settle_retry::{do_in_background_until_stopped, BackgroundTask};
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

/// Unread results buffered before new ones are dropped.
pub const RESPONSE_BUFFER: usize = 1000;

/// Handle to a background URL check.
///
/// Dropping the monitor stops the checks.
#[derive(Debug)]
pub struct UrlMonitor {
    task: BackgroundTask,
    responses: mpsc::Receiver<HttpResult<HttpResponse>>,
}

impl UrlMonitor {
    /// Wait for the next check result.
    ///
    /// Returns `None` once the monitor has stopped and every buffered result
    /// has been read.
    pub async fn next(&mut self) -> Option<HttpResult<HttpResponse>> {
        self.responses.recv().await
    }

    /// Take a buffered result without waiting.
    pub fn try_next(&mut self) -> Option<HttpResult<HttpResponse>> {
        self.responses.try_recv().ok()
    }

    /// Stop checking and return the results not yet read.
    pub async fn stop(mut self) -> Vec<HttpResult<HttpResponse>> {
        self.task.stop().await;
        let mut remaining = Vec::new();
        while let Ok(result) = self.responses.try_recv() {
            remaining.push(result);
        }
        remaining
    }
}

/// Send `request` every `interval` until the returned monitor is stopped or dropped.
///
/// Every result, success or failure, is pushed to the monitor. While
/// [`RESPONSE_BUFFER`] results are unread, each new result is dropped.
pub fn continuously_check_url(request: HttpRequest, interval: Duration) -> UrlMonitor {
    let (tx, responses) = mpsc::channel(RESPONSE_BUFFER);
    let description = format!("Continuously check {}", request.label());

    let task = do_in_background_until_stopped(description, interval, move || {
        let request = request.clone();
        let tx = tx.clone();
        async move {
            let result = http_do(request).await;
            match tx.try_send(result) {
                Ok(()) => {}
                Err(TrySendError::Full(_)) => {
                    warn!(capacity = RESPONSE_BUFFER, "Dropping URL check result, buffer full");
                }
                Err(TrySendError::Closed(_)) => debug!("URL monitor dropped, discarding result"),
            }
        }
    });

    UrlMonitor { task, responses }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_reports_each_check() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("healthy"))
            .mount(&server)
            .await;

        let request = HttpRequest::get(server.uri());
        let mut monitor = continuously_check_url(request, Duration::from_millis(10));
        for _ in 0..3 {
            let response = monitor.next().await.unwrap().unwrap();
            assert_eq!(response.status, 200);
            assert_eq!(response.body, "healthy");
        }
        monitor.stop().await;

        assert!(server.received_requests().await.unwrap().len() >= 3);
    }

    #[tokio::test]
    async fn test_reports_failures() {
        let monitor_target = "http://127.0.0.1:1/";
        let mut monitor = continuously_check_url(
            HttpRequest::get(monitor_target).timeout(Duration::from_millis(200)),
            Duration::from_millis(10),
        );

        let result = monitor.next().await.unwrap();
        assert!(result.unwrap_err().is_retryable());
        monitor.stop().await;
    }

    #[tokio::test]
    async fn test_stop_drains_and_closes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&server)
            .await;

        let request = HttpRequest::get(server.uri());
        let mut monitor = continuously_check_url(request, Duration::from_secs(60));
        let first = monitor.next().await.unwrap().unwrap();
        assert_eq!(first.status, 204);

        let remaining = monitor.stop().await;
        assert!(remaining.is_empty());
    }

    #[tokio::test]
    async fn test_drop_stops_checks() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let request = HttpRequest::get(server.uri());
        let mut monitor = continuously_check_url(request, Duration::from_millis(20));
        monitor.next().await.unwrap().unwrap();
        drop(monitor);

        tokio::time::sleep(Duration::from_millis(50)).await;
        let at_drop = server.received_requests().await.unwrap().len();
        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(server.received_requests().await.unwrap().len(), at_drop);
    }
}
