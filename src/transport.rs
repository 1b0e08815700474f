//! Generic HTTP transport shared by all supplier adapters: response
//! classification, sliding-window rate limiting, retry with exponential
//! backoff, and a pluggable authorization seam.

use crate::api::RetryConfig;
use crate::error::{EnrichmentError, Result};
use async_trait::async_trait;
use reqwest::{Client, Method};
use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};

/// Classified HTTP response envelope returned by [`HttpTransport`].
///
/// `success` is derived from the status code (2xx/3xx) and is never set
/// independently by callers.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code of the final attempt.
    pub status_code: u16,
    /// Parsed JSON body, when the body was valid JSON.
    pub data: Option<serde_json::Value>,
    /// Response headers, lowercase keys.
    pub headers: BTreeMap<String, String>,
    /// The raw response body.
    pub raw_content: String,
    /// Derived from `status_code`: true for 2xx/3xx.
    pub success: bool,
    /// Short diagnostic when `success` is false.
    pub error_message: Option<String>,
}

impl ApiResponse {
    pub(crate) fn from_parts(
        status_code: u16,
        headers: BTreeMap<String, String>,
        raw_content: String,
    ) -> Self {
        let success = (200..400).contains(&status_code);
        let data = serde_json::from_str(&raw_content).ok();
        let error_message = if success {
            None
        } else {
            Some(format!("HTTP {}", status_code))
        };
        Self {
            status_code,
            data,
            headers,
            raw_content,
            success,
            error_message,
        }
    }

    /// The parsed JSON body, or [`EnrichmentError::InvalidResponse`] when the
    /// body was not JSON.
    pub fn json(&self) -> Result<&serde_json::Value> {
        self.data
            .as_ref()
            .ok_or_else(|| EnrichmentError::InvalidResponse("Response body is not JSON".to_string()))
    }
}

/// Sliding-window rate limiter: keeps the timestamps of the last requests and
/// delays callers once the per-minute cap is reached.
///
/// The window lives behind a `tokio::sync::Mutex`, so concurrent callers
/// sharing one transport cannot corrupt it. Cancelling a caller mid-sleep
/// leaves the window untouched (the new stamp is only recorded once the wait
/// has completed and the lock is re-taken).
pub struct RateLimiter {
    max_per_minute: u32,
    window: Mutex<VecDeque<Instant>>,
}

const WINDOW: Duration = Duration::from_secs(60);

impl RateLimiter {
    /// A limiter allowing `max_per_minute` requests per rolling 60 s window.
    pub fn new(max_per_minute: u32) -> Self {
        Self {
            max_per_minute,
            window: Mutex::new(VecDeque::new()),
        }
    }

    /// Wait until a request slot is free, then record the request time.
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut stamps = self.window.lock().await;
                let now = Instant::now();
                while let Some(front) = stamps.front() {
                    if now.duration_since(*front) >= WINDOW {
                        stamps.pop_front();
                    } else {
                        break;
                    }
                }
                if (stamps.len() as u32) < self.max_per_minute {
                    stamps.push_back(now);
                    return;
                }
                // Sleep until the oldest stamp leaves the window, then re-check.
                WINDOW - now.duration_since(*stamps.front().expect("window is non-empty"))
            };
            tracing::debug!(
                wait_ms = wait.as_millis() as u64,
                "Rate limit window full; waiting"
            );
            sleep(wait).await;
        }
    }

    #[cfg(test)]
    pub(crate) async fn in_flight(&self) -> usize {
        self.window.lock().await.len()
    }
}

/// Supplier-specific request authorization seam.
///
/// [`apply`](Authorizer::apply) decorates an outgoing request (header token,
/// query-string key, ...). [`handle_unauthorized`](Authorizer::handle_unauthorized)
/// is invoked once per request when the server answers 401/403, giving
/// OAuth-style authorizers a chance to refresh credentials before the retry.
#[async_trait]
pub trait Authorizer: Send + Sync {
    /// Decorate an outgoing request with credentials.
    async fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder>;

    /// React to a 401/403. Returning `Ok(())` means the request may be
    /// retried with refreshed credentials; the default declines.
    async fn handle_unauthorized(&self) -> Result<()> {
        Err(EnrichmentError::Unauthorized)
    }
}

/// Authorizer that passes a static API key as a URL query parameter
/// (the Mouser scheme).
pub struct QueryKeyAuthorizer {
    param: &'static str,
    key: String,
}

impl QueryKeyAuthorizer {
    pub fn new(param: &'static str, key: impl Into<String>) -> Self {
        Self {
            param,
            key: key.into(),
        }
    }
}

#[async_trait]
impl Authorizer for QueryKeyAuthorizer {
    async fn apply(&self, request: reqwest::RequestBuilder) -> Result<reqwest::RequestBuilder> {
        Ok(request.query(&[(self.param, self.key.as_str())]))
    }
}

/// HTTP client used by every adapter: one base URL, a timeout, a retry
/// budget, an optional rate limiter, and an optional [`Authorizer`].
pub struct HttpTransport {
    client: Client,
    base_url: reqwest::Url,
    max_retries: u32,
    retry: RetryConfig,
    limiter: Option<RateLimiter>,
    authorizer: Option<Arc<dyn Authorizer>>,
}

impl HttpTransport {
    /// Build a transport for `base_url`. Fails with
    /// [`EnrichmentError::Config`] when the URL is not absolute or the
    /// timeout is zero.
    pub fn new(base_url: &str, timeout: Duration, max_retries: u32) -> Result<Self> {
        if timeout.is_zero() {
            return Err(EnrichmentError::Config(
                "Request timeout must be greater than 0".to_string(),
            ));
        }
        let mut url = reqwest::Url::parse(base_url)
            .map_err(|e| EnrichmentError::Config(format!("Invalid base URL '{}': {}", base_url, e)))?;
        if url.cannot_be_a_base() {
            return Err(EnrichmentError::Config(format!(
                "Base URL '{}' is not an absolute HTTP URL",
                base_url
            )));
        }
        // Normalize so join() treats the last segment as a directory.
        if !url.path().ends_with('/') {
            url.set_path(&format!("{}/", url.path()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| EnrichmentError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: url,
            max_retries,
            retry: RetryConfig::default(),
            limiter: None,
            authorizer: None,
        })
    }

    /// Cap requests at `max_per_minute` over a rolling 60 s window. Zero is a
    /// configuration error.
    pub fn with_rate_limit(mut self, max_per_minute: u32) -> Result<Self> {
        if max_per_minute == 0 {
            return Err(EnrichmentError::Config(
                "Rate limit must be greater than 0".to_string(),
            ));
        }
        self.limiter = Some(RateLimiter::new(max_per_minute));
        Ok(self)
    }

    /// Attach an [`Authorizer`] applied to every outgoing request.
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = Some(authorizer);
        self
    }

    /// Override the default retry backoff tuning.
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// The normalized base URL this transport targets.
    pub fn base_url(&self) -> &reqwest::Url {
        &self.base_url
    }

    fn endpoint_url(&self, path: &str) -> Result<reqwest::Url> {
        self.base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| EnrichmentError::Config(format!("Invalid endpoint '{}': {}", path, e)))
    }

    /// Issue a request against `path` (relative to the base URL) with the
    /// full retry / rate-limit / re-auth machinery.
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        query: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse> {
        let url = self.endpoint_url(path)?;
        self.request_url(method, url, query, body, headers).await
    }

    /// GET a relative endpoint.
    pub async fn get(&self, path: &str, query: Option<&[(&str, &str)]>) -> Result<ApiResponse> {
        self.request(Method::GET, path, query, None, None).await
    }

    /// POST a JSON body to a relative endpoint.
    pub async fn post(&self, path: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        self.request(Method::POST, path, None, Some(body), None)
            .await
    }

    /// PUT a JSON body to a relative endpoint.
    pub async fn put(&self, path: &str, body: &serde_json::Value) -> Result<ApiResponse> {
        self.request(Method::PUT, path, None, Some(body), None).await
    }

    /// DELETE a relative endpoint.
    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.request(Method::DELETE, path, None, None, None).await
    }

    /// GET an absolute URL (used for scraping pages that live outside the
    /// API base) and return the body text. Rate limiting and retries apply
    /// as for API calls.
    pub async fn get_absolute_text(&self, url: &str) -> Result<String> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| EnrichmentError::Config(format!("Invalid URL '{}': {}", url, e)))?;
        let response = self.request_url(Method::GET, url, None, None, None).await?;
        Ok(response.raw_content)
    }

    async fn request_url(
        &self,
        method: Method,
        url: reqwest::Url,
        query: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse> {
        let start = std::time::Instant::now();
        let host = url.host_str().unwrap_or("unknown").to_string();

        let mut attempt: u32 = 0;
        let mut reauthed = false;
        let result = loop {
            if let Some(limiter) = &self.limiter {
                limiter.acquire().await;
            }

            let outcome = self
                .execute_once(method.clone(), url.clone(), query, body, headers)
                .await;

            match outcome {
                Ok(response) => break Ok(response),
                Err(EnrichmentError::Unauthorized)
                    if !reauthed && self.authorizer.is_some() && attempt < self.max_retries =>
                {
                    // One reactive re-auth per request; it consumes a retry slot.
                    reauthed = true;
                    attempt += 1;
                    tracing::warn!(%host, "Unauthorized; re-authenticating and retrying");
                    if let Some(authorizer) = &self.authorizer {
                        authorizer.handle_unauthorized().await?;
                    }
                    continue;
                }
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    let backoff = match &e {
                        EnrichmentError::RateLimited {
                            retry_after_secs: Some(secs),
                        } => Duration::from_secs(*secs),
                        _ => self.retry.backoff_for_attempt(attempt),
                    };
                    tracing::warn!(
                        %host,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %e,
                        "Request failed; retrying"
                    );
                    attempt += 1;
                    sleep(backoff).await;
                    continue;
                }
                Err(e) => {
                    tracing::error!(%host, attempt, error = %e, "Request failed terminally");
                    break Err(e);
                }
            }
        };

        let status = if result.is_ok() { "success" } else { "failure" };
        metrics::histogram!("supplier_request.duration_seconds", "host" => host.clone())
            .record(start.elapsed().as_secs_f64());
        metrics::counter!("supplier_request.total", "host" => host, "status" => status)
            .increment(1);

        result
    }

    async fn execute_once(
        &self,
        method: Method,
        url: reqwest::Url,
        query: Option<&[(&str, &str)]>,
        body: Option<&serde_json::Value>,
        headers: Option<&[(&str, &str)]>,
    ) -> Result<ApiResponse> {
        let mut request = self.client.request(method, url);
        if let Some(query) = query {
            request = request.query(query);
        }
        if let Some(body) = body {
            request = request.json(body);
        }
        if let Some(headers) = headers {
            for (name, value) in headers {
                request = request.header(*name, *value);
            }
        }
        if let Some(authorizer) = &self.authorizer {
            request = authorizer.apply(request).await?;
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                EnrichmentError::Timeout
            } else {
                EnrichmentError::Network(e.to_string())
            }
        })?;

        classify_response(response).await
    }
}

/// Map a raw HTTP response to the envelope or a typed error.
///
/// 2xx/3xx succeed; 401/403 become [`EnrichmentError::Unauthorized`]; 429
/// becomes [`EnrichmentError::RateLimited`] with the `Retry-After` hint; 5xx
/// becomes [`EnrichmentError::Unavailable`]; remaining 4xx are terminal
/// [`EnrichmentError::ApiError`]s.
async fn classify_response(response: reqwest::Response) -> Result<ApiResponse> {
    let status = response.status().as_u16();
    let headers: BTreeMap<String, String> = response
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let raw_content = response
        .text()
        .await
        .map_err(|e| EnrichmentError::Network(e.to_string()))?;

    match status {
        200..=399 => Ok(ApiResponse::from_parts(status, headers, raw_content)),
        401 | 403 => Err(EnrichmentError::Unauthorized),
        429 => Err(EnrichmentError::RateLimited {
            retry_after_secs: headers
                .get("retry-after")
                .and_then(|v| v.trim().parse().ok()),
        }),
        500..=599 => Err(EnrichmentError::Unavailable),
        _ => {
            let snippet: String = raw_content.chars().take(200).collect();
            Err(EnrichmentError::ApiError(format!(
                "HTTP {}: {}",
                status, snippet
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_success_derived_from_status() {
        let ok = ApiResponse::from_parts(200, BTreeMap::new(), "{\"a\":1}".to_string());
        assert!(ok.success);
        assert!(ok.error_message.is_none());
        assert_eq!(ok.data.as_ref().unwrap()["a"], 1);

        let redirect = ApiResponse::from_parts(302, BTreeMap::new(), String::new());
        assert!(redirect.success);

        let missing = ApiResponse::from_parts(404, BTreeMap::new(), "gone".to_string());
        assert!(!missing.success);
        assert_eq!(missing.error_message.as_deref(), Some("HTTP 404"));
        assert!(missing.data.is_none());
    }

    #[test]
    fn envelope_json_accessor_rejects_non_json() {
        let resp = ApiResponse::from_parts(200, BTreeMap::new(), "<html></html>".to_string());
        assert!(matches!(
            resp.json(),
            Err(EnrichmentError::InvalidResponse(_))
        ));
    }

    #[test]
    fn transport_rejects_invalid_config() {
        assert!(HttpTransport::new("not a url", Duration::from_secs(5), 0).is_err());
        assert!(HttpTransport::new("https://api.example.com", Duration::ZERO, 0).is_err());
        assert!(
            HttpTransport::new("https://api.example.com", Duration::from_secs(5), 0)
                .unwrap()
                .with_rate_limit(0)
                .is_err()
        );
    }

    #[test]
    fn endpoint_join_keeps_base_path() {
        let transport =
            HttpTransport::new("https://api.example.com/api/v1", Duration::from_secs(5), 0)
                .unwrap();
        let url = transport.endpoint_url("/search/keyword").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/api/v1/search/keyword");
    }

    #[tokio::test(start_paused = true)]
    async fn sliding_window_delays_request_over_limit() {
        let limiter = RateLimiter::new(2);
        let start = Instant::now();

        limiter.acquire().await;
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);

        // Third request in the same window must wait the window out.
        limiter.acquire().await;
        assert!(start.elapsed() >= Duration::from_secs(60));
        assert_eq!(limiter.in_flight().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn sliding_window_expires_old_stamps() {
        let limiter = RateLimiter::new(2);
        limiter.acquire().await;
        limiter.acquire().await;

        sleep(Duration::from_secs(61)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert_eq!(start.elapsed(), Duration::ZERO);
    }
}
