//! Website Scrape and Crawl Orchestration
//!
//! Submits single-page scrapes and multi-page crawls to an upstream crawling
//! service (Firecrawl), waits for asynchronous jobs with bounded polling,
//! normalizes every response shape into one [`CanonicalCrawlResult`], and
//! keeps an append-only history of results per owner.
//!
//! # Design Philosophy
//!
//! - Failures are data: public operations return results, not errors
//! - Polling is bounded and always resolves, partial data included
//! - Credentials are passed explicitly and never logged
//! - Storage and upstream sit behind traits
//!
//! # Usage
//!
//! ```rust,ignore
//! use site_crawl::{CrawlRequest, CrawlService, CredentialStore, FirecrawlClient, MemoryStore, UrlRole};
//!
//! let service = CrawlService::new(FirecrawlClient::new()?, MemoryStore::new());
//! let credentials = CredentialStore::with_credential(std::env::var("FIRECRAWL_API_KEY")?)?;
//!
//! let result = service
//!     .crawl_site(&CrawlRequest::new("https://example.com"), &credentials, Some("strategy-1"))
//!     .await;
//! println!("{} pages, summary: {}", result.pages_crawled, result.summary);
//!
//! let latest = service.latest("strategy-1", UrlRole::Primary).await;
//! ```
//!
//! # Modules
//!
//! - [`security`] - Credential store and redacted secrets
//! - [`polling`] - Bounded-retry polling engine
//! - [`clients`] - Upstream HTTP clients
//! - [`processor`] - Content normalization, summaries, keywords, technology signals
//! - [`stores`] - Result persistence (memory, SQLite, PostgreSQL)
//! - [`service`] - The orchestrator
//! - [`testing`] - Mock implementations for testing

pub mod clients;
pub mod error;
pub mod polling;
pub mod processor;
pub mod security;
pub mod service;
pub mod stores;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use clients::FirecrawlClient;
pub use error::{
    ConfigError, CrawlError, CrawlResult, CredentialError, FailureKind, StoreError, StoreResult,
};
pub use polling::{poll_until_terminal, resolve_job_status, PollOutcome, Sleeper, TokioSleeper};
pub use processor::normalize;
pub use security::{CredentialStore, SecretString};
pub use service::CrawlService;
pub use stores::{MemoryStore, ResultStore};
pub use traits::{CrawlBackend, RecordStore};
pub use types::{
    config::{FirecrawlConfig, PollConfig, DEFAULT_API_URL},
    raw::{RawPayload, RawUpstreamResponse, Submission},
    record::{ExtractedContent, StoredCrawlRecord},
    request::{CrawlOptions, CrawlRequest, UrlRole},
    result::{CanonicalCrawlResult, KeywordField, PageMetadata, PageRecord},
    status::{CrawlJobHandle, CrawlStatus, JobKind, JobStatus},
};

#[cfg(feature = "sqlite")]
pub use stores::SqliteStore;

#[cfg(feature = "postgres")]
pub use stores::PostgresStore;
