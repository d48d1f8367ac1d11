//! Crawl orchestration.
//!
//! [`CrawlService`] ties the pieces together: validate the request, submit
//! it upstream, poll deferred jobs, normalize, and persist successful
//! results when an owner is given. Every public method returns a value;
//! failures come back as failure-shaped results.

use std::sync::Arc;
use tracing::{info, info_span, warn, Instrument};

use crate::error::{CrawlError, FailureKind};
use crate::polling::{poll_until_terminal, resolve_job_status, Sleeper, TokioSleeper};
use crate::processor::normalize;
use crate::security::{CredentialStore, SecretString};
use crate::stores::ResultStore;
use crate::traits::backend::CrawlBackend;
use crate::traits::store::RecordStore;
use crate::types::config::{FirecrawlConfig, PollConfig};
use crate::types::raw::{RawUpstreamResponse, Submission};
use crate::types::request::{CrawlRequest, UrlRole};
use crate::types::result::CanonicalCrawlResult;
use crate::types::status::{CrawlJobHandle, JobStatus};

/// Scrape and crawl orchestrator over a backend and a record store.
///
/// # Example
///
/// ```rust,ignore
/// use site_crawl::{CrawlService, CrawlRequest, CredentialStore, FirecrawlClient, MemoryStore};
///
/// let service = CrawlService::new(FirecrawlClient::new()?, MemoryStore::new());
/// let credentials = CredentialStore::with_credential("fc-...")?;
/// let result = service
///     .scrape_page(&CrawlRequest::new("https://example.com"), &credentials, Some("s1"))
///     .await;
/// ```
pub struct CrawlService<B, S> {
    backend: B,
    results: ResultStore<S>,
    sleeper: Arc<dyn Sleeper>,
    scrape_poll: PollConfig,
    crawl_poll: PollConfig,
}

impl<B: CrawlBackend, S: RecordStore> CrawlService<B, S> {
    /// Create a service with default polling and a real timer.
    pub fn new(backend: B, store: S) -> Self {
        let defaults = FirecrawlConfig::default();
        Self {
            backend,
            results: ResultStore::new(store),
            sleeper: Arc::new(TokioSleeper),
            scrape_poll: defaults.scrape_poll,
            crawl_poll: defaults.crawl_poll,
        }
    }

    /// Take polling settings from a client config.
    pub fn with_poll_config(mut self, config: &FirecrawlConfig) -> Self {
        self.scrape_poll = config.scrape_poll;
        self.crawl_poll = config.crawl_poll;
        self
    }

    pub fn with_scrape_poll(mut self, poll: PollConfig) -> Self {
        self.scrape_poll = poll;
        self
    }

    pub fn with_crawl_poll(mut self, poll: PollConfig) -> Self {
        self.crawl_poll = poll;
        self
    }

    /// Replace the wait primitive used between status checks.
    pub fn with_sleeper(mut self, sleeper: impl Sleeper + 'static) -> Self {
        self.sleeper = Arc::new(sleeper);
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn results(&self) -> &ResultStore<S> {
        &self.results
    }

    /// Scrape one page.
    ///
    /// Inline results are normalized directly; a job id is polled with the
    /// scrape polling budget. Successful results are saved under `owner_id`
    /// when one is given.
    pub async fn scrape_page(
        &self,
        request: &CrawlRequest,
        credentials: &CredentialStore,
        owner_id: Option<&str>,
    ) -> CanonicalCrawlResult {
        let credential = match self.prepare(request, credentials) {
            Ok(credential) => credential,
            Err(e) => return self.rejected(request, e),
        };

        let submission = match self.backend.scrape(request, &credential).await {
            Ok(submission) => submission,
            Err(e) => return self.rejected(request, e),
        };

        let raw = match submission {
            Submission::Immediate(raw) => raw,
            Submission::Deferred(handle) => {
                self.await_job(&handle, &credential, self.scrape_poll).await
            }
        };

        self.finish(request, normalize(Some(&raw), &request.url), owner_id)
            .await
    }

    /// Crawl a site starting from `request.url`.
    ///
    /// Always asynchronous upstream: submit, then poll with the crawl
    /// polling budget. A crawl that never finishes comes back with status
    /// `timeout` and whatever pages had arrived.
    pub async fn crawl_site(
        &self,
        request: &CrawlRequest,
        credentials: &CredentialStore,
        owner_id: Option<&str>,
    ) -> CanonicalCrawlResult {
        let credential = match self.prepare(request, credentials) {
            Ok(credential) => credential,
            Err(e) => return self.rejected(request, e),
        };

        let handle = match self.backend.start_crawl(request, &credential).await {
            Ok(handle) => handle,
            Err(e) => return self.rejected(request, e),
        };

        let raw = self.await_job(&handle, &credential, self.crawl_poll).await;
        self.finish(request, normalize(Some(&raw), &request.url), owner_id)
            .await
    }

    /// Whether the stored credential is accepted upstream.
    pub async fn test_connection(&self, credentials: &CredentialStore) -> bool {
        let Some(credential) = credentials.get() else {
            warn!(backend = self.backend.name(), "No credential to test");
            return false;
        };

        let valid = self.backend.validate_credential(&credential).await;
        info!(backend = self.backend.name(), valid, "Tested upstream connection");
        valid
    }

    /// Most recent saved result for an owner and role.
    pub async fn latest(&self, owner_id: &str, role: UrlRole) -> Option<CanonicalCrawlResult> {
        self.results.get_latest(owner_id, role).await
    }

    /// All saved results for an owner and role, most recent first.
    pub async fn history(&self, owner_id: &str, role: UrlRole) -> Vec<CanonicalCrawlResult> {
        self.results.get_all(owner_id, role).await
    }

    fn prepare(
        &self,
        request: &CrawlRequest,
        credentials: &CredentialStore,
    ) -> Result<SecretString, CrawlError> {
        request.validate()?;
        credentials.require()
    }

    async fn await_job(
        &self,
        handle: &CrawlJobHandle,
        credential: &SecretString,
        poll: PollConfig,
    ) -> RawUpstreamResponse {
        let span = info_span!("poll_job", job_id = %handle.id, kind = handle.kind.endpoint());

        let outcome = poll_until_terminal(
            || self.backend.check_status(handle, credential),
            |status: &JobStatus| status.status.is_upstream_terminal(),
            poll,
            self.sleeper.as_ref(),
        )
        .instrument(span)
        .await;

        let attempts = outcome.attempts();
        let status = resolve_job_status(outcome);
        info!(
            job_id = %handle.id,
            url = %handle.url,
            status = %status.status,
            attempts,
            "Job reached terminal status"
        );

        RawUpstreamResponse::from_job(handle, status)
    }

    fn rejected(&self, request: &CrawlRequest, error: CrawlError) -> CanonicalCrawlResult {
        let result =
            CanonicalCrawlResult::failure(&request.url, error.to_string(), error.failure_kind());
        log_failure(&result);
        result
    }

    async fn finish(
        &self,
        request: &CrawlRequest,
        result: CanonicalCrawlResult,
        owner_id: Option<&str>,
    ) -> CanonicalCrawlResult {
        if !result.success {
            log_failure(&result);
            return result;
        }

        info!(
            url = %result.url,
            pages = result.pages_crawled,
            content_extracted = result.content_extracted,
            status = %result.effective_status(),
            "Crawl finished"
        );

        if let Some(owner_id) = owner_id {
            // Persistence is best effort; the result is returned either way
            if !self.results.save(owner_id, &result, request.role).await {
                warn!(owner_id, url = %result.url, "Crawl result was not persisted");
            }
        }

        result
    }
}

fn log_failure(result: &CanonicalCrawlResult) {
    let error = result.error.as_deref().unwrap_or("unknown error");
    match result.failure {
        Some(FailureKind::TransportFailure) => warn!(
            url = %result.url,
            failure_kind = %FailureKind::TransportFailure,
            error,
            "Could not reach upstream"
        ),
        Some(FailureKind::UpstreamRejected) => warn!(
            url = %result.url,
            failure_kind = %FailureKind::UpstreamRejected,
            error,
            "Upstream rejected request"
        ),
        Some(kind) => warn!(url = %result.url, failure_kind = %kind, error, "Crawl failed"),
        None => info!(
            url = %result.url,
            status = %result.effective_status(),
            error,
            "Crawl ended without data"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::MemoryStore;
    use crate::testing::{MockBackend, RecordingSleeper};
    use crate::types::raw::RawPayload;
    use crate::types::status::CrawlStatus;
    use serde_json::json;
    use std::time::Duration;

    fn service(backend: MockBackend) -> CrawlService<MockBackend, MemoryStore> {
        CrawlService::new(backend, MemoryStore::new())
            .with_sleeper(RecordingSleeper::new())
            .with_scrape_poll(PollConfig::new(3, Duration::from_secs(1)))
            .with_crawl_poll(PollConfig::new(3, Duration::from_secs(1)))
    }

    fn credentials() -> CredentialStore {
        CredentialStore::with_credential("fc-test").unwrap()
    }

    #[tokio::test]
    async fn test_missing_credential_is_failure_result() {
        let service = service(MockBackend::new());
        let result = service
            .scrape_page(&CrawlRequest::new("https://example.com"), &CredentialStore::new(), None)
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::MissingCredential));
        assert!(service.backend().scrape_calls().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_upstream() {
        let service = service(MockBackend::new());
        let result = service
            .crawl_site(&CrawlRequest::new("ftp://example.com"), &credentials(), Some("s1"))
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::InvalidRequest));
        assert!(service.backend().crawl_calls().is_empty());
        assert!(service.results().inner().is_empty());
    }

    #[tokio::test]
    async fn test_transport_error_is_distinct_from_rejection() {
        let backend = MockBackend::new()
            .with_scrape_error(CrawlError::Transport("connection refused".into()))
            .with_rejected_scrape("Payment required");
        let service = service(backend);
        let request = CrawlRequest::new("https://example.com");

        let unreachable = service.scrape_page(&request, &credentials(), None).await;
        assert_eq!(unreachable.failure, Some(FailureKind::TransportFailure));

        let rejected = service.scrape_page(&request, &credentials(), None).await;
        assert_eq!(rejected.failure, Some(FailureKind::UpstreamRejected));
        assert_eq!(rejected.error.as_deref(), Some("Payment required"));
    }

    #[tokio::test]
    async fn test_persists_only_successes_with_owner() {
        let backend = MockBackend::new()
            .with_immediate_scrape(RawPayload::Single(json!({"markdown": "# Hi\n\nThere"})))
            .with_immediate_scrape(RawPayload::Single(json!({"markdown": "# Hi\n\nAgain"})))
            .with_rejected_scrape("nope");
        let service = service(backend);
        let request = CrawlRequest::new("https://example.com");

        assert!(service.scrape_page(&request, &credentials(), None).await.success);
        assert!(service.scrape_page(&request, &credentials(), Some("s1")).await.success);
        assert!(!service.scrape_page(&request, &credentials(), Some("s1")).await.success);

        assert_eq!(service.history("s1", UrlRole::Primary).await.len(), 1);
    }

    #[tokio::test]
    async fn test_deferred_scrape_is_polled() {
        let backend = MockBackend::new()
            .with_deferred_scrape("scrape-7")
            .with_status(JobStatus::new(CrawlStatus::InProgress))
            .with_status(
                JobStatus::new(CrawlStatus::Completed)
                    .with_data(RawPayload::Single(json!({"markdown": "Deferred body"}))),
            );
        let service = service(backend);

        let result = service
            .scrape_page(&CrawlRequest::new("https://example.com"), &credentials(), None)
            .await;

        assert!(result.success);
        assert_eq!(result.job_id.as_deref(), Some("scrape-7"));
        assert_eq!(service.backend().status_calls(), vec!["scrape-7", "scrape-7"]);
    }

    #[tokio::test]
    async fn test_failed_crawl_job() {
        let backend = MockBackend::new()
            .with_crawl_job("job-f")
            .with_status(JobStatus::new(CrawlStatus::Failed).with_error("blocked by robots.txt"));
        let service = service(backend);

        let result = service
            .crawl_site(&CrawlRequest::new("https://example.com"), &credentials(), Some("s1"))
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::UpstreamRejected));
        assert_eq!(result.error.as_deref(), Some("blocked by robots.txt"));
        assert!(service.latest("s1", UrlRole::Primary).await.is_none());
    }

    #[tokio::test]
    async fn test_crawl_submission_transport_error() {
        let backend =
            MockBackend::new().with_crawl_error(CrawlError::Transport("connection reset".into()));
        let service = service(backend);

        let result = service
            .crawl_site(&CrawlRequest::new("https://example.com"), &credentials(), Some("s1"))
            .await;

        assert!(!result.success);
        assert_eq!(result.failure, Some(FailureKind::TransportFailure));
        assert_eq!(result.status, Some(CrawlStatus::Failed));
        assert_eq!(service.backend().status_check_count(), 0);
        assert!(service.latest("s1", UrlRole::Primary).await.is_none());
    }

    #[tokio::test]
    async fn test_status_error_mid_poll_is_retried() {
        let backend = MockBackend::new()
            .with_crawl_job("job-r")
            .with_status_error(CrawlError::Transport("timed out".into()))
            .with_status(
                JobStatus::new(CrawlStatus::Completed)
                    .with_data(RawPayload::Pages(vec![json!({"markdown": "Recovered"})])),
            );
        let service = service(backend);

        let result = service
            .crawl_site(&CrawlRequest::new("https://example.com"), &credentials(), None)
            .await;

        assert!(result.success);
        assert_eq!(result.status, Some(CrawlStatus::Completed));
        assert_eq!(result.pages_crawled, 1);
        assert_eq!(service.backend().status_check_count(), 2);
    }

    #[tokio::test]
    async fn test_connection_check() {
        let service = service(MockBackend::new().with_valid_credential("fc-good"));

        assert!(!service.test_connection(&CredentialStore::new()).await);
        assert!(!service.test_connection(&credentials()).await);
        let good = CredentialStore::with_credential("fc-good").unwrap();
        assert!(service.test_connection(&good).await);
    }
}
