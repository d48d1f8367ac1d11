//! Configuration for the upstream client and polling.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::ConfigError;

/// Default Firecrawl API base.
pub const DEFAULT_API_URL: &str = "https://api.firecrawl.dev/v1";

/// Bounded-retry polling settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Status checks before giving up (at least one is always made)
    pub max_attempts: u32,

    /// Wait between status checks
    pub delay: Duration,
}

impl PollConfig {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }

    /// Attempts actually made, never zero.
    pub fn attempts(&self) -> u32 {
        self.max_attempts.max(1)
    }

    /// Upper bound on time spent sleeping between checks.
    pub fn max_wait(&self) -> Duration {
        self.delay * self.attempts().saturating_sub(1)
    }
}

/// Configuration for the Firecrawl HTTP client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FirecrawlConfig {
    /// API base URL, without trailing slash.
    ///
    /// Default: `https://api.firecrawl.dev/v1`.
    pub base_url: String,

    /// Per-request timeout for submissions and status checks.
    ///
    /// Default: 30s.
    pub request_timeout: Duration,

    /// Timeout for the credential check.
    ///
    /// Default: 10s.
    pub validation_timeout: Duration,

    /// Formats requested from upstream.
    pub formats: Vec<String>,

    /// Polling for deferred single-page scrapes.
    pub scrape_poll: PollConfig,

    /// Polling for multi-page crawls.
    pub crawl_poll: PollConfig,
}

impl Default for FirecrawlConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            request_timeout: Duration::from_secs(30),
            validation_timeout: Duration::from_secs(10),
            formats: vec!["markdown".to_string(), "html".to_string()],
            scrape_poll: PollConfig::new(30, Duration::from_secs(2)),
            crawl_poll: PollConfig::new(60, Duration::from_secs(5)),
        }
    }
}

impl FirecrawlConfig {
    /// Create a new config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load overrides from the environment.
    ///
    /// Reads `FIRECRAWL_API_URL`, `FIRECRAWL_TIMEOUT_SECS`,
    /// `FIRECRAWL_POLL_ATTEMPTS` and `FIRECRAWL_POLL_INTERVAL_MS`. The poll
    /// settings apply to crawls; unset variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(url) = std::env::var("FIRECRAWL_API_URL") {
            config = config.with_base_url(url);
        }
        if let Some(secs) = env_parse::<u64>("FIRECRAWL_TIMEOUT_SECS")? {
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(attempts) = env_parse::<u32>("FIRECRAWL_POLL_ATTEMPTS")? {
            config.crawl_poll.max_attempts = attempts;
        }
        if let Some(ms) = env_parse::<u64>("FIRECRAWL_POLL_INTERVAL_MS")? {
            config.crawl_poll.delay = Duration::from_millis(ms);
        }

        Ok(config)
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the per-request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set scrape polling.
    pub fn with_scrape_poll(mut self, poll: PollConfig) -> Self {
        self.scrape_poll = poll;
        self
    }

    /// Set crawl polling.
    pub fn with_crawl_poll(mut self, poll: PollConfig) -> Self {
        self.crawl_poll = poll;
        self
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
            }),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = FirecrawlConfig::default();
        assert_eq!(config.base_url, DEFAULT_API_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.validation_timeout, Duration::from_secs(10));
        assert_eq!(config.formats, vec!["markdown", "html"]);
    }

    #[test]
    fn test_base_url_trailing_slash_trimmed() {
        let config = FirecrawlConfig::new().with_base_url("http://localhost:3002/v1/");
        assert_eq!(config.base_url, "http://localhost:3002/v1");
    }

    #[test]
    fn test_poll_attempts_never_zero() {
        let poll = PollConfig::new(0, Duration::from_millis(10));
        assert_eq!(poll.attempts(), 1);
        assert_eq!(poll.max_wait(), Duration::ZERO);

        let poll = PollConfig::new(5, Duration::from_millis(10));
        assert_eq!(poll.max_wait(), Duration::from_millis(40));
    }
}
