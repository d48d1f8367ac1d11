//! Upstream crawl service abstraction.

use async_trait::async_trait;

use crate::error::CrawlResult;
use crate::security::SecretString;
use crate::types::raw::Submission;
use crate::types::request::CrawlRequest;
use crate::types::status::{CrawlJobHandle, JobStatus};

/// A crawling/scraping service that runs jobs on our behalf.
///
/// Implementations only move bytes: they submit work, report job status,
/// and translate transport or HTTP problems into [`CrawlError`]s. Polling,
/// normalization and persistence happen above this trait.
///
/// [`CrawlError`]: crate::error::CrawlError
#[async_trait]
pub trait CrawlBackend: Send + Sync {
    /// Submit a single-page scrape.
    ///
    /// An upstream rejection comes back as `Ok(Submission::Immediate(..))`
    /// with `success = false`; only transport problems are `Err`.
    async fn scrape(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<Submission>;

    /// Submit a multi-page crawl. Always asynchronous.
    async fn start_crawl(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<CrawlJobHandle>;

    /// One status check for a submitted job.
    async fn check_status(
        &self,
        handle: &CrawlJobHandle,
        credential: &SecretString,
    ) -> CrawlResult<JobStatus>;

    /// Whether upstream accepts this credential. Never errors.
    async fn validate_credential(&self, credential: &SecretString) -> bool;

    /// Backend name for logs.
    fn name(&self) -> &str;
}
