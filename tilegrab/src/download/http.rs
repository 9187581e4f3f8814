//! HTTP client abstraction for tile fetches.
//!
//! [`HttpClient`] is the seam the engine fetches through; [`ReqwestClient`]
//! is the real implementation. Retry with backoff lives in
//! [`fetch_with_retry`] so every client gets the same policy.

use super::DownloadConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, USER_AGENT};
use std::collections::BTreeMap;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

/// Default user agent sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 QGIS/34202/Windows 11 Version 2009";

/// HTTP statuses worth retrying.
pub const RETRY_STATUSES: [u16; 5] = [429, 500, 502, 503, 504];

/// A completed HTTP exchange, whatever its status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// True if the content type names an `image/*` media type.
    pub fn is_image(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.trim_start().to_ascii_lowercase().starts_with("image/"))
    }

    fn is_retriable(&self) -> bool {
        RETRY_STATUSES.contains(&self.status)
    }
}

/// Errors that prevented a response from being received.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HttpError {
    #[error("request to {url} failed: {reason}")]
    Transport {
        url: String,
        reason: String,
        /// Connect, timeout and body-read failures are retried.
        retriable: bool,
    },

    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

impl HttpError {
    fn is_retriable(&self) -> bool {
        matches!(self, HttpError::Transport { retriable: true, .. })
    }
}

/// Trait for HTTP client operations.
///
/// Allows the download engine to run against a mock in tests.
pub trait HttpClient: Send + Sync {
    /// Performs one GET with extra request headers. Does not retry.
    fn get(&self, url: &str, headers: &BTreeMap<String, String>)
        -> Result<HttpResponse, HttpError>;
}

/// Blocking reqwest client shared by all workers.
///
/// Redirects are not followed; a 3xx reaches the caller as a non-2xx status.
#[derive(Debug, Clone)]
pub struct ReqwestClient {
    client: reqwest::blocking::Client,
}

impl ReqwestClient {
    pub fn new(timeout: Duration) -> Result<Self, HttpError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,*"));

        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .default_headers(headers)
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client })
    }

    pub fn from_config(config: &DownloadConfig) -> Result<Self, HttpError> {
        Self::new(config.timeout())
    }
}

impl HttpClient for ReqwestClient {
    fn get(
        &self,
        url: &str,
        headers: &BTreeMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        let transport = |e: reqwest::Error| HttpError::Transport {
            url: url.to_string(),
            retriable: e.is_connect() || e.is_timeout() || e.is_body(),
            reason: e.to_string(),
        };

        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        let response = request.send().map_err(transport)?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().map_err(transport)?.to_vec();

        Ok(HttpResponse {
            status,
            content_type,
            body,
        })
    }
}

/// GETs `url`, retrying transient failures.
///
/// Makes at most `max_retries + 1` attempts. Returns the last response if
/// retriable statuses persist, so the caller can classify it.
pub fn fetch_with_retry(
    client: &dyn HttpClient,
    url: &str,
    headers: &BTreeMap<String, String>,
    config: &DownloadConfig,
) -> Result<HttpResponse, HttpError> {
    let mut attempt = 0;
    loop {
        let result = client.get(url, headers);
        let retry = match &result {
            Ok(response) => response.is_retriable(),
            Err(e) => e.is_retriable(),
        };
        if !retry || attempt >= config.max_retries() {
            return result;
        }

        let delay = config.backoff(attempt);
        match &result {
            Ok(response) => debug!(url, status = response.status, attempt, "Retrying"),
            Err(e) => warn!(url, attempt, error = %e, "Retrying after transport error"),
        }
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        attempt += 1;
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    type Handler = Box<dyn Fn(&str) -> Result<HttpResponse, HttpError> + Send + Sync>;

    /// Mock HTTP client for testing.
    ///
    /// Serves queued responses first, then falls back to the handler.
    pub struct MockHttpClient {
        queue: Mutex<VecDeque<Result<HttpResponse, HttpError>>>,
        handler: Handler,
        requests: AtomicUsize,
        urls: Mutex<Vec<String>>,
    }

    impl MockHttpClient {
        pub fn with_handler<F>(handler: F) -> Self
        where
            F: Fn(&str) -> Result<HttpResponse, HttpError> + Send + Sync + 'static,
        {
            Self {
                queue: Mutex::new(VecDeque::new()),
                handler: Box::new(handler),
                requests: AtomicUsize::new(0),
                urls: Mutex::new(Vec::new()),
            }
        }

        pub fn always(response: Result<HttpResponse, HttpError>) -> Self {
            Self::with_handler(move |_| response.clone())
        }

        /// Serves `responses` in order, then repeats the last one.
        pub fn sequence(responses: Vec<Result<HttpResponse, HttpError>>) -> Self {
            let last = responses
                .last()
                .cloned()
                .unwrap_or_else(|| Ok(response(404, None, Vec::new())));
            let mock = Self::always(last);
            *mock.queue.lock().unwrap() = responses.into();
            mock
        }

        pub fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }

        pub fn requested_urls(&self) -> Vec<String> {
            self.urls.lock().unwrap().clone()
        }
    }

    impl HttpClient for MockHttpClient {
        fn get(
            &self,
            url: &str,
            _headers: &BTreeMap<String, String>,
        ) -> Result<HttpResponse, HttpError> {
            self.requests.fetch_add(1, Ordering::SeqCst);
            self.urls.lock().unwrap().push(url.to_string());
            if let Some(next) = self.queue.lock().unwrap().pop_front() {
                return next;
            }
            (self.handler)(url)
        }
    }

    pub fn response(status: u16, content_type: Option<&str>, body: Vec<u8>) -> HttpResponse {
        HttpResponse {
            status,
            content_type: content_type.map(str::to_string),
            body,
        }
    }

    pub fn png_response(body: Vec<u8>) -> HttpResponse {
        response(200, Some("image/png"), body)
    }

    fn timeout_error(url: &str) -> HttpError {
        HttpError::Transport {
            url: url.to_string(),
            reason: "timed out".to_string(),
            retriable: true,
        }
    }

    fn quick_config(retries: u32) -> DownloadConfig {
        DownloadConfig::new()
            .with_max_retries(retries)
            .with_backoff_factor(0.0)
    }

    #[test]
    fn test_mock_client_counts_requests() {
        let mock = MockHttpClient::always(Ok(png_response(vec![1, 2, 3])));
        let result = mock.get("http://example.com", &BTreeMap::new()).unwrap();
        assert_eq!(result.body, vec![1, 2, 3]);
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_image_content_type_detection() {
        assert!(png_response(vec![]).is_image());
        assert!(response(200, Some("Image/JPEG; q=1"), vec![]).is_image());
        assert!(!response(200, Some("text/html"), vec![]).is_image());
        assert!(!response(200, None, vec![]).is_image());
    }

    #[test]
    fn test_retries_retriable_status_then_succeeds() {
        let mock = MockHttpClient::sequence(vec![
            Ok(response(503, None, vec![])),
            Ok(response(429, None, vec![])),
            Ok(png_response(vec![9])),
        ]);
        let result = fetch_with_retry(&mock, "http://t/1", &BTreeMap::new(), &quick_config(5));
        assert_eq!(result.unwrap().status, 200);
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_gives_up_after_retry_budget() {
        let mock = MockHttpClient::always(Ok(response(500, None, vec![])));
        let result = fetch_with_retry(&mock, "http://t/1", &BTreeMap::new(), &quick_config(2));
        assert_eq!(result.unwrap().status, 500);
        assert_eq!(mock.request_count(), 3);
    }

    #[test]
    fn test_does_not_retry_client_errors() {
        let mock = MockHttpClient::always(Ok(response(404, None, vec![])));
        let result = fetch_with_retry(&mock, "http://t/1", &BTreeMap::new(), &quick_config(5));
        assert_eq!(result.unwrap().status, 404);
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_retries_transport_errors() {
        let mock = MockHttpClient::always(Err(timeout_error("http://t/1")));
        let result = fetch_with_retry(&mock, "http://t/1", &BTreeMap::new(), &quick_config(1));
        assert!(result.is_err());
        assert_eq!(mock.request_count(), 2);
    }

    #[test]
    fn test_non_retriable_transport_error_fails_once() {
        let mock = MockHttpClient::always(Err(HttpError::Transport {
            url: "http://t/1".to_string(),
            reason: "bad url".to_string(),
            retriable: false,
        }));
        let result = fetch_with_retry(&mock, "http://t/1", &BTreeMap::new(), &quick_config(4));
        assert!(result.is_err());
        assert_eq!(mock.request_count(), 1);
    }

    #[test]
    fn test_reqwest_client_builds() {
        assert!(ReqwestClient::new(Duration::from_secs(1)).is_ok());
    }
}
