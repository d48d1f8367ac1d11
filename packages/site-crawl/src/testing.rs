//! Testing utilities including mock implementations.
//!
//! These let applications exercise the crawl orchestration without network
//! calls or real waiting.

use async_trait::async_trait;
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{CrawlError, CrawlResult};
use crate::polling::Sleeper;
use crate::security::SecretString;
use crate::traits::backend::CrawlBackend;
use crate::types::raw::{RawPayload, RawUpstreamResponse, Submission};
use crate::types::request::CrawlRequest;
use crate::types::status::{CrawlJobHandle, CrawlStatus, JobKind, JobStatus};

/// A scripted upstream for tests.
///
/// Responses are queued and handed out in order. When the status queue runs
/// dry, the fallback status (default `in_progress`) repeats forever, which
/// is how a job that never finishes is simulated.
///
/// # Example
///
/// ```rust
/// use site_crawl::testing::MockBackend;
/// use site_crawl::{CrawlStatus, JobStatus};
///
/// let backend = MockBackend::new()
///     .with_crawl_job("job-1")
///     .with_status(JobStatus::new(CrawlStatus::InProgress))
///     .with_status(JobStatus::new(CrawlStatus::Completed));
/// assert_eq!(backend.status_check_count(), 0);
/// ```
#[derive(Clone)]
pub struct MockBackend {
    scrapes: Arc<RwLock<VecDeque<CrawlResult<Submission>>>>,
    crawl_jobs: Arc<RwLock<VecDeque<CrawlResult<String>>>>,
    statuses: Arc<RwLock<VecDeque<CrawlResult<JobStatus>>>>,
    fallback_status: Arc<RwLock<JobStatus>>,
    valid_credentials: Arc<RwLock<HashSet<String>>>,

    /// Call tracking for assertions
    scrape_calls: Arc<RwLock<Vec<String>>>,
    crawl_calls: Arc<RwLock<Vec<CrawlRequest>>>,
    status_calls: Arc<RwLock<Vec<String>>>,
    credentials_seen: Arc<RwLock<Vec<String>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self {
            scrapes: Arc::default(),
            crawl_jobs: Arc::default(),
            statuses: Arc::default(),
            fallback_status: Arc::new(RwLock::new(JobStatus::new(CrawlStatus::InProgress))),
            valid_credentials: Arc::default(),
            scrape_calls: Arc::default(),
            crawl_calls: Arc::default(),
            status_calls: Arc::default(),
            credentials_seen: Arc::default(),
        }
    }
}

impl MockBackend {
    /// Create a new mock with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an inline scrape result.
    pub fn with_immediate_scrape(self, data: RawPayload) -> Self {
        self.push_scrape(Ok(Submission::Immediate(RawUpstreamResponse::immediate(data))));
        self
    }

    /// Queue a scrape that comes back as a job id.
    pub fn with_deferred_scrape(self, job_id: impl Into<String>) -> Self {
        let handle = CrawlJobHandle::new(job_id, JobKind::Scrape, "");
        self.push_scrape(Ok(Submission::Deferred(handle)));
        self
    }

    /// Queue an upstream rejection for the next scrape.
    pub fn with_rejected_scrape(self, message: impl Into<String>) -> Self {
        self.push_scrape(Ok(Submission::Immediate(RawUpstreamResponse::rejected(message))));
        self
    }

    /// Queue an error for the next scrape.
    pub fn with_scrape_error(self, error: CrawlError) -> Self {
        self.push_scrape(Err(error));
        self
    }

    /// Queue a job id for the next crawl.
    pub fn with_crawl_job(self, job_id: impl Into<String>) -> Self {
        self.crawl_jobs.write().unwrap().push_back(Ok(job_id.into()));
        self
    }

    /// Queue an error for the next crawl submission.
    pub fn with_crawl_error(self, error: CrawlError) -> Self {
        self.crawl_jobs.write().unwrap().push_back(Err(error));
        self
    }

    /// Queue a status-check answer.
    pub fn with_status(self, status: JobStatus) -> Self {
        self.statuses.write().unwrap().push_back(Ok(status));
        self
    }

    /// Queue a failing status check.
    pub fn with_status_error(self, error: CrawlError) -> Self {
        self.statuses.write().unwrap().push_back(Err(error));
        self
    }

    /// Answer given once the status queue is empty.
    pub fn with_fallback_status(self, status: JobStatus) -> Self {
        *self.fallback_status.write().unwrap() = status;
        self
    }

    /// Accept this credential in `validate_credential`.
    pub fn with_valid_credential(self, credential: impl Into<String>) -> Self {
        self.valid_credentials.write().unwrap().insert(credential.into());
        self
    }

    fn push_scrape(&self, submission: CrawlResult<Submission>) {
        self.scrapes.write().unwrap().push_back(submission);
    }

    /// URLs passed to `scrape`.
    pub fn scrape_calls(&self) -> Vec<String> {
        self.scrape_calls.read().unwrap().clone()
    }

    /// Requests passed to `start_crawl`.
    pub fn crawl_calls(&self) -> Vec<CrawlRequest> {
        self.crawl_calls.read().unwrap().clone()
    }

    /// Job ids passed to `check_status`, one per check.
    pub fn status_calls(&self) -> Vec<String> {
        self.status_calls.read().unwrap().clone()
    }

    pub fn status_check_count(&self) -> usize {
        self.status_calls.read().unwrap().len()
    }

    /// Every credential value the mock was called with.
    pub fn credentials_seen(&self) -> Vec<String> {
        self.credentials_seen.read().unwrap().clone()
    }

    fn record_credential(&self, credential: &SecretString) {
        self.credentials_seen
            .write()
            .unwrap()
            .push(credential.expose().to_string());
    }
}

#[async_trait]
impl CrawlBackend for MockBackend {
    async fn scrape(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<Submission> {
        self.record_credential(credential);
        self.scrape_calls.write().unwrap().push(request.url.clone());

        let next = self.scrapes.write().unwrap().pop_front();
        match next {
            Some(Ok(Submission::Deferred(handle))) => Ok(Submission::Deferred(CrawlJobHandle::new(
                handle.id,
                JobKind::Scrape,
                &request.url,
            ))),
            Some(other) => other,
            None => Ok(Submission::Immediate(RawUpstreamResponse::rejected(
                "no scripted scrape response",
            ))),
        }
    }

    async fn start_crawl(
        &self,
        request: &CrawlRequest,
        credential: &SecretString,
    ) -> CrawlResult<CrawlJobHandle> {
        self.record_credential(credential);
        self.crawl_calls.write().unwrap().push(request.clone());

        let next = self.crawl_jobs.write().unwrap().pop_front();
        let job_id = match next {
            Some(result) => result?,
            None => format!("mock-crawl-{}", self.crawl_calls.read().unwrap().len()),
        };
        Ok(CrawlJobHandle::new(job_id, JobKind::Crawl, &request.url))
    }

    async fn check_status(
        &self,
        handle: &CrawlJobHandle,
        credential: &SecretString,
    ) -> CrawlResult<JobStatus> {
        self.record_credential(credential);
        self.status_calls.write().unwrap().push(handle.id.clone());

        let next = self.statuses.write().unwrap().pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.fallback_status.read().unwrap().clone()),
        }
    }

    async fn validate_credential(&self, credential: &SecretString) -> bool {
        self.record_credential(credential);
        self.valid_credentials
            .read()
            .unwrap()
            .contains(credential.expose())
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// A [`Sleeper`] that records requested waits and returns immediately.
#[derive(Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<RwLock<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration passed to `sleep`, in order.
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.read().unwrap().clone()
    }

    /// Sum of all requested waits.
    pub fn total(&self) -> Duration {
        self.sleeps.read().unwrap().iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.sleeps.write().unwrap().push(duration);
        tokio::task::yield_now().await;
    }
}
