//! Configuration for the conversion relay.
//!
//! All behaviour is controlled through [`RelayConfig`], built via its
//! [`RelayConfigBuilder`]. Credentials are injected here explicitly and
//! handed to [`crate::client::ApiClient`] at construction; nothing in the
//! crate reads or writes process-wide state after startup.
//!
//! The poll bound (`max_poll_attempts`) is deliberately not optional: an
//! unbounded poll loop against a job whose convert stage silently died
//! would spin forever. Callers that genuinely want "poll for a very long
//! time" set a large bound.

use crate::error::RelayError;
use crate::progress::ConversionObserver;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default provider endpoint (CloudConvert v2 API).
pub const DEFAULT_API_BASE: &str = "https://api.cloudconvert.com/v2";

/// Environment variable holding the provider bearer token.
pub const API_KEY_ENV: &str = "DOCSHIFT_API_KEY";

/// Legacy environment variable from the original deployment, honoured as a
/// fallback so existing `.env` files keep working.
pub const API_KEY_ENV_FALLBACK: &str = "CONVERT_TOKEN";

/// Environment variable overriding the provider endpoint.
pub const API_BASE_ENV: &str = "DOCSHIFT_API_BASE";

/// Configuration for one or more conversion calls.
///
/// Built via [`RelayConfig::builder()`] or [`RelayConfig::from_env()`].
///
/// # Example
/// ```rust
/// use docshift::RelayConfig;
///
/// let config = RelayConfig::builder()
///     .api_key("ey...")
///     .poll_interval_secs(5)
///     .max_poll_attempts(60)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RelayConfig {
    /// Provider API base URL, without a trailing slash. Default:
    /// [`DEFAULT_API_BASE`].
    pub api_base: String,

    /// Bearer token for the provider API. Required, non-empty.
    pub api_key: String,

    /// Fixed wait between status checks while the job is processing.
    /// Default: 5 s (the interval the provider documents as polite).
    pub poll_interval: Duration,

    /// Upper bound on status checks before giving up with
    /// [`RelayError::DeadlineExceeded`]. Default: 60 (five minutes at the
    /// default interval).
    pub max_poll_attempts: u32,

    /// Retries of a *failed* status request before the transport error is
    /// treated as definitive. Provider-reported task failures are never
    /// retried. Default: 3.
    pub max_transient_retries: u32,

    /// Initial transient-retry delay in milliseconds, doubling per attempt
    /// (500 ms, 1 s, 2 s). Default: 500.
    pub retry_backoff_ms: u64,

    /// Per-request timeout for submit and status calls. Default: 30 s.
    pub request_timeout: Duration,

    /// Timeout for the artifact download. Default: 120 s.
    pub download_timeout: Duration,

    /// Optional observer receiving lifecycle events.
    pub observer: Option<Arc<dyn ConversionObserver>>,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            api_key: String::new(),
            poll_interval: Duration::from_secs(5),
            max_poll_attempts: 60,
            max_transient_retries: 3,
            retry_backoff_ms: 500,
            request_timeout: Duration::from_secs(30),
            download_timeout: Duration::from_secs(120),
            observer: None,
        }
    }
}

impl fmt::Debug for RelayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RelayConfig")
            .field("api_base", &self.api_base)
            .field("api_key", &"<redacted>")
            .field("poll_interval", &self.poll_interval)
            .field("max_poll_attempts", &self.max_poll_attempts)
            .field("max_transient_retries", &self.max_transient_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("request_timeout", &self.request_timeout)
            .field("download_timeout", &self.download_timeout)
            .field("observer", &self.observer.as_ref().map(|_| "<dyn ConversionObserver>"))
            .finish()
    }
}

impl RelayConfig {
    /// Create a new builder for `RelayConfig`.
    pub fn builder() -> RelayConfigBuilder {
        RelayConfigBuilder {
            config: Self::default(),
        }
    }

    /// Build a config from the process environment, failing fast when the
    /// API key is absent.
    ///
    /// Reads [`API_KEY_ENV`] (falling back to [`API_KEY_ENV_FALLBACK`]) and
    /// [`API_BASE_ENV`]. All other knobs take their defaults; use
    /// [`RelayConfig::builder`] when they need tuning.
    pub fn from_env() -> Result<Self, RelayError> {
        let key = std::env::var(API_KEY_ENV)
            .or_else(|_| std::env::var(API_KEY_ENV_FALLBACK))
            .ok()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| RelayError::Auth {
                detail: format!("{API_KEY_ENV} is not set in the environment"),
            })?;

        let mut builder = Self::builder().api_key(key);
        if let Ok(base) = std::env::var(API_BASE_ENV) {
            if !base.is_empty() {
                builder = builder.api_base(base);
            }
        }
        builder.build()
    }
}

/// Builder for [`RelayConfig`].
#[derive(Debug)]
pub struct RelayConfigBuilder {
    config: RelayConfig,
}

impl RelayConfigBuilder {
    pub fn api_base(mut self, base: impl Into<String>) -> Self {
        self.config.api_base = base.into();
        self
    }

    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.config.poll_interval = interval;
        self
    }

    pub fn poll_interval_secs(self, secs: u64) -> Self {
        self.poll_interval(Duration::from_secs(secs))
    }

    pub fn max_poll_attempts(mut self, n: u32) -> Self {
        self.config.max_poll_attempts = n.max(1);
        self
    }

    pub fn max_transient_retries(mut self, n: u32) -> Self {
        self.config.max_transient_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout = timeout;
        self
    }

    pub fn download_timeout(mut self, timeout: Duration) -> Self {
        self.config.download_timeout = timeout;
        self
    }

    pub fn observer(mut self, observer: Arc<dyn ConversionObserver>) -> Self {
        self.config.observer = Some(observer);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RelayConfig, RelayError> {
        let c = &self.config;
        if c.api_key.trim().is_empty() {
            return Err(RelayError::InvalidConfig(
                "api_key must be set (see RelayConfig::from_env)".into(),
            ));
        }
        if c.api_base.trim().is_empty() {
            return Err(RelayError::InvalidConfig("api_base must not be empty".into()));
        }
        if c.poll_interval.is_zero() {
            return Err(RelayError::InvalidConfig(
                "poll_interval must be greater than zero".into(),
            ));
        }
        if c.max_poll_attempts == 0 {
            return Err(RelayError::InvalidConfig(
                "max_poll_attempts must be at least 1".into(),
            ));
        }
        Ok(self.config)
    }
}
