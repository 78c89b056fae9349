use governor::{
    Quota, RateLimiter, clock::DefaultClock, middleware::NoOpMiddleware, state::InMemoryState,
    state::NotKeyed,
};
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, RETRY_AFTER, USER_AGENT};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::cache::{Cache, CacheStats, cache_key};
use super::config::{EdgarConfig, RetryPolicy};
use super::error::{EdgarError, Result};

/// Longest error body kept on `EdgarError::Request`.
const MAX_ERROR_BODY: usize = 500;

type Governor = RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>;

/// A successful response body as it is kept in the cache.
#[derive(Debug, Clone)]
enum CachedBody {
    Json(Arc<Value>),
    Text(Arc<str>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    Json,
    Text,
}

impl BodyKind {
    fn as_str(self) -> &'static str {
        match self {
            BodyKind::Json => "json",
            BodyKind::Text => "text",
        }
    }
}

/// Per-request options for the fetch methods.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Skip the cache lookup. A successful response still refreshes the cache.
    pub bypass_cache: bool,
    /// Query string parameters, part of the cache key.
    pub query: Vec<(String, String)>,
}

impl FetchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bypass_cache(mut self) -> Self {
        self.bypass_cache = true;
        self
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }
}

#[derive(Debug, Clone)]
pub struct Edgar {
    /// HTTP client for making requests
    pub(crate) client: reqwest::Client,

    /// Minimum-spacing gate shared by every clone of this client
    rate_limiter: Option<Arc<Governor>>,

    /// Response cache shared by every clone of this client
    cache: Option<Arc<Cache<CachedBody>>>,

    retry: RetryPolicy,

    /// Base URL for EDGAR archives
    pub(crate) edgar_archives_url: String,

    /// Base URL for EDGAR data API
    pub(crate) edgar_data_url: String,

    /// Base URL for EDGAR files
    pub(crate) edgar_files_url: String,
}

/// HTTP client for the SEC EDGAR API with rate limiting, caching and retries.
///
/// `Edgar` is the entry point for every network operation in this crate. It enforces SEC.gov's
/// fair access rules by spacing outbound requests at least `request_delay` apart, memoizes
/// successful responses in an LRU/TTL cache, and retries transient failures with exponential
/// backoff. Clones share the same rate gate and cache, so a cloned client handed to another
/// task still counts against the same request budget.
///
/// # Rate Limiting
///
/// A one-cell `governor` quota replenished every `request_delay` acts as a global gate:
///
/// ```text
/// request A ──┐                 request B ──┐
///             ▼                             ▼
///  ───────────●─────── ≥ request_delay ─────●──────▶ time
/// ```
///
/// Dispatches exactly `request_delay` apart pass without waiting. The gate orders dispatch only;
/// a later request may finish before an earlier one that is being retried.
///
/// # Error Handling
///
/// Non-2xx responses map onto typed errors: 401 `Authentication`, 404 `NotFound`,
/// 429 `RateLimited`, anything else `Request` with status and body. Timeouts, transport
/// failures, 429s, 5xx and 408 are retried up to `max_retries` times; everything else is
/// returned on first occurrence. Empty or undecodable bodies become `MalformedResponse`.
///
/// # Examples
///
/// ```rust
/// # use edgar_toolkit::Edgar;
/// let edgar = Edgar::new("my_app/1.0 (my@email.com)")?;
/// # Ok::<(), edgar_toolkit::EdgarError>(())
/// ```
///
/// With custom configuration:
///
/// ```rust
/// # use edgar_toolkit::{Edgar, EdgarConfig};
/// # use std::time::Duration;
/// let config = EdgarConfig::new("custom_app/2.0 ops@example.com")
///     .with_timeout(Duration::from_secs(60))
///     .with_max_retries(5);
/// let edgar = Edgar::with_config(config)?;
/// # Ok::<(), edgar_toolkit::EdgarError>(())
/// ```
impl Edgar {
    /// Creates a new Edgar client with default settings.
    ///
    /// Requests are spaced 100 ms apart (10 per second, the SEC.gov ceiling), time out after
    /// 30 seconds, are retried up to 3 times, and successful responses are cached for 5 minutes.
    ///
    /// # Arguments
    ///
    /// * `user_agent` - Identifies your application to the SEC, e.g.
    ///   "AppName/Version (contact@email.com)". Must be at least 10 characters.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::Config` if the user agent is missing, too short, or not a valid
    /// header value. No request is made in that case.
    pub fn new(user_agent: &str) -> Result<Self> {
        Self::with_config(EdgarConfig::new(user_agent))
    }

    /// Creates an Edgar client with custom configuration settings.
    ///
    /// Use this to tune the request delay, retry policy, cache, timeout, or to point the client
    /// at a different host (for example a local test server).
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::Config` if the configuration fails validation or the HTTP client
    /// cannot be built.
    pub fn with_config(config: EdgarConfig) -> Result<Self> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(config.user_agent.trim())
                .map_err(|e| EdgarError::Config(format!("Invalid user agent: {}", e)))?,
        );
        headers.insert(
            ACCEPT,
            HeaderValue::from_static("application/json, text/html, */*"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .build()
            .map_err(|e| EdgarError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let rate_limiter =
            Quota::with_period(config.request_delay).map(|quota| Arc::new(RateLimiter::direct(quota)));

        let cache = config
            .cache
            .enabled
            .then(|| Arc::new(Cache::new(config.cache.max_size, config.cache.ttl)));

        Ok(Edgar {
            client,
            rate_limiter,
            cache,
            retry: config.retry,
            edgar_archives_url: config.base_urls.archives,
            edgar_data_url: config.base_urls.data,
            edgar_files_url: config.base_urls.files,
        })
    }

    /// Fetches a URL and parses the body as JSON, going through the cache.
    ///
    /// # Errors
    ///
    /// * `EdgarError::Authentication` / `NotFound` - HTTP 401 / 404, not retried
    /// * `EdgarError::RateLimited` - HTTP 429 persisted after all retries
    /// * `EdgarError::Timeout` / `Network` - transport failure after all retries
    /// * `EdgarError::Request` - any other non-2xx status
    /// * `EdgarError::MalformedResponse` - empty body or invalid JSON
    pub async fn fetch_json(&self, url: &str) -> Result<Value> {
        self.fetch_json_with(url, &FetchOptions::default()).await
    }

    /// Like [`Edgar::fetch_json`], with per-request options.
    pub async fn fetch_json_with(&self, url: &str, options: &FetchOptions) -> Result<Value> {
        match self.fetch(url, options, BodyKind::Json).await? {
            CachedBody::Json(value) => Ok(Arc::unwrap_or_clone(value)),
            CachedBody::Text(_) => Err(EdgarError::MalformedResponse {
                url: url.to_string(),
                reason: "cached body is not JSON".to_string(),
            }),
        }
    }

    /// Fetches a URL and returns the body as text, going through the cache.
    ///
    /// Used for filing documents (HTML, XML, full-submission `.txt`). Errors are the same as
    /// for [`Edgar::fetch_json`]; only an empty body counts as malformed.
    pub async fn fetch_text(&self, url: &str) -> Result<String> {
        self.fetch_text_with(url, &FetchOptions::default()).await
    }

    /// Like [`Edgar::fetch_text`], with per-request options.
    pub async fn fetch_text_with(&self, url: &str, options: &FetchOptions) -> Result<String> {
        match self.fetch(url, options, BodyKind::Text).await? {
            CachedBody::Text(text) => Ok(text.to_string()),
            CachedBody::Json(value) => Ok(value.to_string()),
        }
    }

    /// Fetches JSON and decodes it into `T`.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let body = match self.fetch(url, &FetchOptions::default(), BodyKind::Json).await? {
            CachedBody::Json(value) => value,
            CachedBody::Text(text) => Arc::new(decode_json(url, &text)?),
        };
        Ok(T::deserialize(body.as_ref())?)
    }

    /// Cache counters, or `None` when caching is disabled.
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(|cache| cache.stats())
    }

    /// Drops every cached response.
    pub fn clear_cache(&self) {
        if let Some(cache) = &self.cache {
            cache.clear();
        }
    }

    async fn fetch(&self, url: &str, options: &FetchOptions, kind: BodyKind) -> Result<CachedBody> {
        let key = cache_key(&json!({
            "kind": kind.as_str(),
            "url": url,
            "query": options.query,
        }));

        if let Some(cache) = &self.cache {
            if !options.bypass_cache {
                if let Some(body) = cache.get(&key) {
                    tracing::debug!(url, "cache hit");
                    return Ok(body);
                }
            }
        }

        let body = self.send_with_retry(url, options, kind).await?;

        if let Some(cache) = &self.cache {
            cache.set(key, body.clone(), None);
        }
        Ok(body)
    }

    async fn send_with_retry(
        &self,
        url: &str,
        options: &FetchOptions,
        kind: BodyKind,
    ) -> Result<CachedBody> {
        let mut attempt = 0;

        loop {
            match self.send_once(url, options, kind).await {
                Ok(body) => return Ok(body),
                Err(err) if err.is_retryable() && attempt < self.retry.max_retries => {
                    attempt += 1;
                    let delay = backoff_delay(&self.retry, &err, attempt);
                    tracing::warn!(
                        "Request to {} failed: {}. Retry {}/{} in {:?}.",
                        url,
                        err,
                        attempt,
                        self.retry.max_retries,
                        delay
                    );
                    sleep(delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }

    async fn send_once(
        &self,
        url: &str,
        options: &FetchOptions,
        kind: BodyKind,
    ) -> Result<CachedBody> {
        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }
        tracing::debug!(url, "dispatching request");

        let mut request = self.client.get(url);
        if !options.query.is_empty() {
            request = request.query(&options.query);
        }
        let response = request.send().await.map_err(|e| transport_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|h| h.to_str().ok())
                .and_then(|s| s.trim().parse::<u64>().ok())
                .map(Duration::from_secs);
            let body = response.text().await.unwrap_or_default();
            return Err(classify_status(url, status, body, retry_after));
        }

        let text = response.text().await.map_err(|e| transport_error(url, e))?;
        if text.trim().is_empty() {
            return Err(EdgarError::MalformedResponse {
                url: url.to_string(),
                reason: "empty response body".to_string(),
            });
        }

        match kind {
            BodyKind::Json => Ok(CachedBody::Json(Arc::new(decode_json(url, &text)?))),
            BodyKind::Text => Ok(CachedBody::Text(Arc::from(text))),
        }
    }

    /// Returns the base URL for EDGAR archives.
    pub fn archives_url(&self) -> &str {
        &self.edgar_archives_url
    }

    /// Returns the base URL for the EDGAR data API.
    pub fn data_url(&self) -> &str {
        &self.edgar_data_url
    }

    /// Returns the base URL for EDGAR files.
    pub fn files_url(&self) -> &str {
        &self.edgar_files_url
    }
}

fn decode_json(url: &str, text: &str) -> Result<Value> {
    serde_json::from_str(text).map_err(|e| {
        let reason = if text.trim_start().starts_with('<') {
            format!(
                "expected JSON but received markup: {}",
                text.chars().take(200).collect::<String>()
            )
        } else {
            format!("invalid JSON: {}", e)
        };
        EdgarError::MalformedResponse {
            url: url.to_string(),
            reason,
        }
    })
}

fn transport_error(url: &str, error: reqwest::Error) -> EdgarError {
    if error.is_timeout() {
        EdgarError::Timeout {
            url: url.to_string(),
        }
    } else {
        EdgarError::Network {
            url: url.to_string(),
            source: error,
        }
    }
}

/// Maps a non-2xx status onto the error taxonomy.
pub(crate) fn classify_status(
    url: &str,
    status: StatusCode,
    body: String,
    retry_after: Option<Duration>,
) -> EdgarError {
    let url = url.to_string();
    match status {
        StatusCode::UNAUTHORIZED => EdgarError::Authentication { url },
        StatusCode::NOT_FOUND => EdgarError::NotFound { url },
        StatusCode::TOO_MANY_REQUESTS => EdgarError::RateLimited { url, retry_after },
        other => EdgarError::Request {
            url,
            status: other.as_u16(),
            body: body.chars().take(MAX_ERROR_BODY).collect(),
        },
    }
}

/// Wait before retry number `attempt` (1-based).
///
/// Generic failures wait `base * 2^(attempt-1)`, rate limits wait `rl_base * 2^attempt`, each
/// with ±10% jitter and then capped. A `Retry-After` on a 429 raises the wait to at least
/// that value, still under the cap. The arithmetic saturates, so any policy is safe.
pub(crate) fn backoff_delay(policy: &RetryPolicy, error: &EdgarError, attempt: u32) -> Duration {
    match error {
        EdgarError::RateLimited { retry_after, .. } => {
            let cap = policy.rate_limit_max_delay;
            let delay = with_jitter(exponential(policy.rate_limit_base_delay, attempt));
            let delay = retry_after.map_or(delay, |after| delay.max(after));
            delay.min(cap)
        }
        _ => {
            let cap = policy.max_delay;
            let delay = exponential(policy.base_delay, attempt.saturating_sub(1));
            with_jitter(delay).min(cap)
        }
    }
}

fn exponential(base: Duration, exponent: u32) -> Duration {
    base.saturating_mul(2_u32.checked_pow(exponent).unwrap_or(u32::MAX))
}

fn with_jitter(delay: Duration) -> Duration {
    let factor = 1.0 + 0.2 * (fastrand::f64() - 0.5);
    Duration::try_from_secs_f64(delay.as_secs_f64() * factor).unwrap_or(Duration::MAX)
}
