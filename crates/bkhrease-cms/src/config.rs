//! Configuration structures for the CMS client and query cache

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::retry::RetryPolicy;

/// CMS base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "http://localhost:1337";

/// Per-attempt request timeout used when none is configured
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CmsConfig {
    /// CMS origin, without the `/api` prefix
    pub base_url: String,

    /// Bearer token sent with every request
    #[serde(skip_serializing)]
    pub token: Option<String>,

    /// Timeout applied to each attempt
    pub request_timeout: Duration,

    /// Retry policy for failed requests
    pub retry_policy: RetryPolicy,
}

impl Default for CmsConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            token: None,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            retry_policy: RetryPolicy::default(),
        }
    }
}

impl CmsConfig {
    /// Configuration pointing at `base_url` with defaults for everything else
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Set the bearer token
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the per-attempt timeout
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the retry policy
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry_policy = policy;
        self
    }

    /// Create configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        Self {
            base_url: lookup("NEXT_PUBLIC_STRAPI_URL")
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            token: lookup("STRAPI_API_TOKEN").filter(|t| !t.is_empty()),
            request_timeout: Duration::from_millis(
                lookup("BKHREASE_CMS_TIMEOUT_MS")
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(10_000),
            ),
            retry_policy: RetryPolicy::from_lookup(&lookup),
        }
    }

    /// Report settings the CMS client cannot work without.
    pub fn validate(&self) -> ConfigValidation {
        let mut errors = Vec::new();

        let base_url = self.base_url.trim().trim_end_matches('/');
        if base_url.is_empty() || base_url == DEFAULT_BASE_URL {
            errors.push(
                "NEXT_PUBLIC_STRAPI_URL is not configured or uses the localhost default".to_string(),
            );
        } else if url::Url::parse(&self.base_url).is_err() {
            errors.push(format!("CMS base URL is not a valid URL: {}", self.base_url));
        }

        if self.token.as_deref().is_none_or(str::is_empty) {
            errors.push("STRAPI_API_TOKEN is not configured".to_string());
        }

        ConfigValidation {
            is_valid: errors.is_empty(),
            errors,
        }
    }
}

/// Outcome of [`CmsConfig::validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigValidation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

/// Staleness windows and retry knobs for the query cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub homepage: Duration,
    pub team_members: Duration,
    pub blog_listing: Duration,
    pub blog_post: Duration,
    pub categories: Duration,
    pub search: Duration,
    pub news_listing: Duration,
    pub news_item: Duration,
    pub upcoming_events: Duration,
    pub services: Duration,

    /// Period of the background upcoming-events refresh
    pub upcoming_refresh_interval: Duration,

    /// Retries after the first failed fetch; client errors are never retried
    pub query_retries: u32,

    /// First retry delay, doubled per failure
    pub query_retry_base_delay: Duration,

    /// Upper bound for the retry delay
    pub query_retry_max_delay: Duration,

    /// Entry cap; the oldest entries go first once it is reached
    pub max_entries: usize,

    /// Period of the background sweep of expired entries
    pub sweep_interval: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        const MINUTE: u64 = 60;
        Self {
            homepage: Duration::from_secs(10 * MINUTE),
            team_members: Duration::from_secs(15 * MINUTE),
            blog_listing: Duration::from_secs(5 * MINUTE),
            blog_post: Duration::from_secs(10 * MINUTE),
            categories: Duration::from_secs(30 * MINUTE),
            search: Duration::from_secs(2 * MINUTE),
            news_listing: Duration::from_secs(5 * MINUTE),
            news_item: Duration::from_secs(10 * MINUTE),
            upcoming_events: Duration::from_secs(2 * MINUTE),
            services: Duration::from_secs(15 * MINUTE),
            upcoming_refresh_interval: Duration::from_secs(5 * MINUTE),
            query_retries: 3,
            query_retry_base_delay: Duration::from_secs(1),
            query_retry_max_delay: Duration::from_secs(30),
            max_entries: 512,
            sweep_interval: Duration::from_secs(MINUTE),
        }
    }
}

impl CacheConfig {
    /// Same staleness window for every resource
    pub fn uniform(window: Duration) -> Self {
        Self {
            homepage: window,
            team_members: window,
            blog_listing: window,
            blog_post: window,
            categories: window,
            search: window,
            news_listing: window,
            news_item: window,
            upcoming_events: window,
            services: window,
            ..Self::default()
        }
    }

    /// Set the query-level retry knobs
    #[must_use]
    pub fn with_query_retries(mut self, retries: u32, base_delay: Duration) -> Self {
        self.query_retries = retries;
        self.query_retry_base_delay = base_delay;
        self
    }

    /// Set the entry cap
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries.max(1);
        self
    }
}
