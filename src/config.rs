use std::time::Duration;

use super::error::{EdgarError, Result};

/// Shortest user agent the client accepts. SEC.gov expects an application
/// name plus a contact address, so anything shorter is almost certainly wrong.
pub const MIN_USER_AGENT_LEN: usize = 10;

/// Configuration for the Edgar client
#[derive(Debug, Clone)]
pub struct EdgarConfig {
    /// User agent string for HTTP requests
    pub user_agent: String,
    /// Minimum delay between two outbound requests; zero disables the gate
    pub request_delay: Duration,
    /// HTTP request timeout, applied per attempt
    pub timeout: Duration,
    /// Retry and backoff policy
    pub retry: RetryPolicy,
    /// Response cache settings
    pub cache: CacheConfig,
    /// Base URLs for different EDGAR services
    pub base_urls: EdgarUrls,
}

/// Retry budget and backoff schedule for transient failures.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Additional attempts after the first one
    pub max_retries: u32,
    /// First backoff for timeouts, transport errors, 5xx and 408
    pub base_delay: Duration,
    /// Upper bound for the generic backoff
    pub max_delay: Duration,
    /// First backoff after an HTTP 429
    pub rate_limit_base_delay: Duration,
    /// Upper bound for the rate-limit backoff
    pub rate_limit_max_delay: Duration,
}

/// Response cache settings.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub enabled: bool,
    /// Maximum number of cached responses
    pub max_size: usize,
    /// Time to live for cached responses; zero means entries never expire
    pub ttl: Duration,
}

/// Base URLs for different EDGAR services
#[derive(Debug, Clone)]
pub struct EdgarUrls {
    /// Base URL for EDGAR archives
    pub archives: String,
    /// Base URL for EDGAR data
    pub data: String,
    /// Base URL for EDGAR files
    pub files: String,
}

impl Default for EdgarConfig {
    fn default() -> Self {
        Self {
            user_agent: "edgar_toolkit/0.1.0".to_string(),
            request_delay: Duration::from_millis(100),
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            cache: CacheConfig::default(),
            base_urls: EdgarUrls::default(),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            rate_limit_base_delay: Duration::from_secs(5),
            rate_limit_max_delay: Duration::from_secs(60),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_size: 1000,
            ttl: Duration::from_secs(300),
        }
    }
}

impl Default for EdgarUrls {
    fn default() -> Self {
        Self {
            archives: "https://www.sec.gov/Archives/edgar".to_string(),
            data: "https://data.sec.gov".to_string(),
            files: "https://www.sec.gov/files".to_string(),
        }
    }
}

impl EdgarUrls {
    /// Points every service at one host, e.g. a local test server.
    pub fn single_host(base: impl Into<String>) -> Self {
        let base = base.into();
        let base = base.trim_end_matches('/');
        Self {
            archives: format!("{base}/Archives/edgar"),
            data: base.to_string(),
            files: format!("{base}/files"),
        }
    }
}

impl EdgarConfig {
    /// Creates a configuration with default settings and the given user agent.
    ///
    /// # Basic usage
    ///
    /// ```rust
    /// use edgar_toolkit::{Edgar, EdgarConfig};
    /// use std::time::Duration;
    ///
    /// let config = EdgarConfig::new("YourAppName contact@example.com")
    ///     .with_request_delay(Duration::from_millis(200))
    ///     .with_max_retries(5);
    /// let edgar = Edgar::with_config(config)?;
    /// # Ok::<(), edgar_toolkit::EdgarError>(())
    /// ```
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
            ..Self::default()
        }
    }

    pub fn with_request_delay(mut self, delay: Duration) -> Self {
        self.request_delay = delay;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.retry.max_retries = max_retries;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn with_cache(mut self, cache: CacheConfig) -> Self {
        self.cache = cache;
        self
    }

    /// Turns response caching off entirely.
    pub fn without_cache(mut self) -> Self {
        self.cache.enabled = false;
        self
    }

    pub fn with_base_urls(mut self, base_urls: EdgarUrls) -> Self {
        self.base_urls = base_urls;
        self
    }

    /// Checks the parts of the configuration that must hold before any request.
    ///
    /// # Errors
    ///
    /// Returns `EdgarError::Config` if the user agent is shorter than
    /// [`MIN_USER_AGENT_LEN`] characters after trimming, or if the timeout is zero.
    pub fn validate(&self) -> Result<()> {
        let agent = self.user_agent.trim();
        if agent.chars().count() < MIN_USER_AGENT_LEN {
            return Err(EdgarError::Config(format!(
                "User agent must be at least {MIN_USER_AGENT_LEN} characters and identify you, \
                 e.g. \"AppName contact@example.com\" (got {agent:?})"
            )));
        }
        if self.timeout.is_zero() {
            return Err(EdgarError::Config(
                "Timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
