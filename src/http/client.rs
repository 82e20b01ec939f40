//! Request pipeline with rate limiting, retries and error classification.

use log::{debug, error, warn};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method};
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::classify::{RequestInfo, classify};
use super::rate_limiter::RateLimiter;
use super::retry::{AttemptOutcome, RetryPolicy, Sleeper, TokioSleeper, TransportFailure};
use crate::auth::Auth;
use crate::config::ConnectorConfig;
use crate::error::{ApiError, Details};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_IDLE_CONNECTIONS: usize = 20;
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the ResolvePay API.
///
/// Every call waits on the rate limiter once, then retries 429/5xx
/// responses and timeouts/connection errors with exponential backoff.
/// The final response is classified into JSON or an [`ApiError`].
///
/// Pooled connections are released when the client is closed or dropped.
pub struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    auth: Arc<Auth>,
    rate_limiter: Arc<RateLimiter>,
    retry: RetryPolicy,
    sleeper: Arc<dyn Sleeper>,
}

impl HttpClient {
    /// Client for `config.base_url` sharing `auth` and `rate_limiter`.
    pub fn new(
        config: &ConnectorConfig,
        auth: Arc<Auth>,
        rate_limiter: Arc<RateLimiter>,
    ) -> Result<Self, ApiError> {
        let timeout = config.timeout_duration();
        let client = Client::builder()
            .user_agent(concat!("resolvepay-mcp/", env!("RESOLVEPAY_MCP_VERSION")))
            .timeout(timeout)
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(timeout)
            .pool_max_idle_per_host(MAX_IDLE_CONNECTIONS)
            .pool_idle_timeout(POOL_IDLE_TIMEOUT)
            .build()
            .map_err(|e| ApiError::configuration(format!("Failed to build HTTP client: {}", e)))?;

        debug!(
            "HTTP client created with timeout={}s, max_retries={}",
            config.timeout, config.max_retries
        );

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout,
            auth,
            rate_limiter,
            retry: RetryPolicy::new(config.max_retries),
            sleeper: Arc::new(TokioSleeper),
        })
    }

    /// Replaces how the client waits between attempts.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Base URL without a trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Resolves an endpoint against the base URL.
    pub fn url(&self, endpoint: &str) -> String {
        format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'))
    }

    /// Caller headers first, then auth and content headers on top.
    fn merge_headers(&self, extra: Option<&HeaderMap>) -> Result<HeaderMap, ApiError> {
        let mut headers = extra.cloned().unwrap_or_default();
        for (name, value) in self.auth.headers()? {
            if let Some(name) = name {
                headers.insert(name, value);
            }
        }
        Ok(headers)
    }

    #[tracing::instrument(skip(self, query))]
    pub async fn get(
        &self,
        endpoint: &str,
        query: Option<&[(String, String)]>,
    ) -> Result<Value, ApiError> {
        self.execute(Method::GET, endpoint, None, query, None).await
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn post(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::POST, endpoint, Some(body), None, None)
            .await
    }

    #[tracing::instrument(skip(self, body))]
    pub async fn put(&self, endpoint: &str, body: &Value) -> Result<Value, ApiError> {
        self.execute(Method::PUT, endpoint, Some(body), None, None)
            .await
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, endpoint: &str) -> Result<Value, ApiError> {
        self.execute(Method::DELETE, endpoint, None, None, None).await
    }

    /// Issues a request and returns the decoded JSON body.
    ///
    /// Retried requests re-send the same body; the caller decides whether
    /// that is safe for non-idempotent methods.
    #[tracing::instrument(skip(self, body, query, headers))]
    pub async fn execute(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&Value>,
        query: Option<&[(String, String)]>,
        headers: Option<&HeaderMap>,
    ) -> Result<Value, ApiError> {
        self.rate_limiter.acquire().await;

        let url = self.url(endpoint);
        let headers = self.merge_headers(headers)?;

        debug!("Making {} request to {}", method, url);
        let start = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            let mut request = self
                .client
                .request(method.clone(), &url)
                .headers(headers.clone());
            if let Some(query) = query.filter(|q| !q.is_empty()) {
                request = request.query(query);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            let error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    debug!(
                        "{} {} completed in {:.2}s with status {}",
                        method,
                        url,
                        start.elapsed().as_secs_f64(),
                        status.as_u16()
                    );

                    if self.retry.outcome(status, attempt) == AttemptOutcome::Retry {
                        let delay = self.retry.backoff(attempt);
                        warn!(
                            "Request failed with status {}, retrying in {:?} (attempt {}/{})",
                            status.as_u16(),
                            delay,
                            attempt + 1,
                            self.retry.max_retries
                        );
                        self.sleeper.sleep(delay).await;
                        attempt += 1;
                        continue;
                    }

                    let response_headers = response.headers().clone();
                    match response.text().await {
                        Ok(text) => {
                            return classify(
                                status,
                                &response_headers,
                                &text,
                                RequestInfo {
                                    method: &method,
                                    url: &url,
                                },
                            );
                        }
                        // A body that cannot be read is a transport failure, not an empty body.
                        Err(e) => {
                            warn!("Failed to read response body from {}: {}", url, e);
                            e
                        }
                    }
                }
                Err(e) => e,
            };

            let failure = TransportFailure::of(&error);
            if self.retry.should_retry_transport(failure, attempt) {
                let delay = self.retry.backoff(attempt);
                warn!(
                    "{:?} error on {} {}, retrying in {:?} (attempt {}/{})",
                    failure,
                    method,
                    url,
                    delay,
                    attempt + 1,
                    self.retry.max_retries
                );
                self.sleeper.sleep(delay).await;
                attempt += 1;
                continue;
            }

            return Err(self.transport_error(failure, &error, attempt + 1, &method, &url));
        }
    }

    /// Failure for a request that never produced a response.
    fn transport_error(
        &self,
        failure: TransportFailure,
        error: &reqwest::Error,
        attempts: u32,
        method: &Method,
        url: &str,
    ) -> ApiError {
        let (status, message) = match failure {
            TransportFailure::Timeout => (
                408,
                format!(
                    "Request timeout after {} seconds ({} attempts)",
                    self.timeout.as_secs(),
                    attempts
                ),
            ),
            TransportFailure::Connect => (
                503,
                format!("Connection error after {} attempts: {}", attempts, error),
            ),
            TransportFailure::Other => (500, format!("Request error: {}", error)),
        };
        error!("{} {} failed: {}", method, url, message);

        let details: Details = [
            ("method".to_string(), json!(method.as_str())),
            ("url".to_string(), json!(url)),
            ("attempts".to_string(), json!(attempts)),
        ]
        .into_iter()
        .collect();

        ApiError::Api {
            status,
            message,
            body: Value::Null,
            details,
        }
    }

    /// Releases pooled connections.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for HttpClient {
    fn drop(&mut self) {
        debug!("HTTP client for {} closed", self.base_url);
    }
}
