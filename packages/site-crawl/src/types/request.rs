//! Crawl request types.

use serde::{Deserialize, Serialize};

use crate::error::{CrawlError, CrawlResult};

/// Which URL of an owner a crawl is about.
///
/// Used to partition stored results: an owner typically has one primary
/// site and any number of referenced (product, competitor, ...) URLs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlRole {
    #[default]
    Primary,
    Referenced,
}

impl UrlRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Referenced => "referenced",
        }
    }
}

impl std::fmt::Display for UrlRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for UrlRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "primary" => Ok(Self::Primary),
            "referenced" => Ok(Self::Referenced),
            other => Err(format!("unknown url role: {other}")),
        }
    }
}

/// Traversal options for multi-page crawls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlOptions {
    /// How many links deep to follow from the start URL (0 = start page only)
    pub max_depth: u32,

    /// Upper bound on pages returned
    pub max_pages: u32,

    /// Follow links that leave the start URL's site
    pub include_external_links: bool,

    /// CSS selectors to scope extraction to
    #[serde(default)]
    pub selectors: Vec<String>,
}

impl Default for CrawlOptions {
    fn default() -> Self {
        Self {
            max_depth: 2,
            max_pages: 50,
            include_external_links: false,
            selectors: Vec::new(),
        }
    }
}

impl CrawlOptions {
    pub fn with_max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_max_pages(mut self, pages: u32) -> Self {
        self.max_pages = pages;
        self
    }

    pub fn with_external_links(mut self, include: bool) -> Self {
        self.include_external_links = include;
        self
    }

    pub fn with_selector(mut self, selector: impl Into<String>) -> Self {
        self.selectors.push(selector.into());
        self
    }
}

/// A page (or site) to submit upstream.
///
/// Built by the caller and only ever read after submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlRequest {
    /// Target URL
    pub url: String,

    /// How the result is categorized when stored
    #[serde(default)]
    pub role: UrlRole,

    /// Traversal options (only used by multi-page crawls)
    #[serde(default)]
    pub options: CrawlOptions,
}

impl CrawlRequest {
    /// Create a request for a primary URL with default options.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            role: UrlRole::Primary,
            options: CrawlOptions::default(),
        }
    }

    /// Set the URL role.
    pub fn with_role(mut self, role: UrlRole) -> Self {
        self.role = role;
        self
    }

    /// Set traversal options.
    pub fn with_options(mut self, options: CrawlOptions) -> Self {
        self.options = options;
        self
    }

    /// Check the request before anything goes upstream.
    ///
    /// Only type/range sanity is checked here; upstream-specific limits
    /// (e.g. plan caps on `max_pages`) are left to upstream.
    pub fn validate(&self) -> CrawlResult<()> {
        let url = self.url.trim();
        if url.is_empty() {
            return Err(CrawlError::InvalidRequest {
                reason: "url must not be empty".into(),
            });
        }

        let parsed = url::Url::parse(url).map_err(|e| CrawlError::InvalidRequest {
            reason: format!("invalid url {url}: {e}"),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(CrawlError::InvalidRequest {
                reason: format!("unsupported url scheme: {}", parsed.scheme()),
            });
        }

        if self.options.max_pages == 0 {
            return Err(CrawlError::InvalidRequest {
                reason: "max_pages must be at least 1".into(),
            });
        }

        Ok(())
    }
}
